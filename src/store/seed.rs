use crate::models::{Category, EntryType};

/// (id, name, icon, color, type) for the categories installed on first run.
const DEFAULT_CATEGORIES: [(&str, &str, &str, &str, EntryType); 10] = [
    ("1", "Salary", "work", "#4CAF50", EntryType::Income),
    ("2", "Freelance", "laptop", "#8BC34A", EntryType::Income),
    ("3", "Investment", "trending-up", "#CDDC39", EntryType::Income),
    ("4", "Food", "restaurant", "#F44336", EntryType::Expense),
    ("5", "Transport", "directions-car", "#E91E63", EntryType::Expense),
    ("6", "Shopping", "shopping-cart", "#9C27B0", EntryType::Expense),
    ("7", "Entertainment", "local-movies", "#3F51B5", EntryType::Expense),
    ("8", "Utilities", "flash-on", "#2196F3", EntryType::Expense),
    ("9", "Health", "local-hospital", "#03A9F4", EntryType::Expense),
    ("10", "Education", "school", "#00BCD4", EntryType::Expense),
];

pub(crate) fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|&(id, name, icon, color, kind)| Category {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            kind,
        })
        .collect()
}
