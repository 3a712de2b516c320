use serde::{Deserialize, Serialize};

use super::{EntryType, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Glyph name for the front end. Not interpreted here.
    pub icon: String,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: EntryType,
}

const DEFAULT_ICON: &str = "label";
const DEFAULT_COLOR: &str = "#9E9E9E";

impl Category {
    pub fn new(id: String, name: &str, kind: EntryType) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            id,
            name: name.to_string(),
            icon: DEFAULT_ICON.to_string(),
            color: DEFAULT_COLOR.to_string(),
            kind,
        })
    }

    /// Find a category by name (case-insensitive) in a slice.
    pub fn find_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
        let lower = name.to_lowercase();
        categories.iter().find(|c| c.name.to_lowercase() == lower)
    }

    /// Categories of one direction, in their stored order.
    pub fn of_type(categories: &[Category], kind: EntryType) -> Vec<&Category> {
        categories.iter().filter(|c| c.kind == kind).collect()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
