mod budget;
mod category;
mod entry_type;
mod transaction;

use rust_decimal::Decimal;

pub use budget::{Budget, NewBudget};
pub use category::Category;
pub use entry_type::EntryType;
pub use transaction::{NewTransaction, Transaction};

/// Largest amount, limit or spent value a record may carry: one trillion.
/// Sums over many such records stay far inside `Decimal`'s range.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Rejections raised before a record reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("description cannot be empty")]
    EmptyDescription,
    #[error("name cannot be empty")]
    EmptyName,
    #[error("a category is required")]
    MissingCategory,
    #[error("amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("limit must be greater than zero, got {0}")]
    NonPositiveLimit(Decimal),
    #[error("spent cannot be negative, got {0}")]
    NegativeSpent(Decimal),
    #[error("{0} exceeds the largest supported amount ({max})", max = MAX_AMOUNT)]
    TooLarge(Decimal),
}

/// Fresh record id: the current time in milliseconds since the epoch.
pub fn new_id() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}
