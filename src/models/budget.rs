use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ValidationError, MAX_AMOUNT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub limit: Decimal,
    /// Supplied by the caller. Not recomputed from transactions.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub spent: Decimal,
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub name: String,
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
}

impl NewBudget {
    pub fn validate(self, id: String) -> Result<Budget, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let category = self.category.trim().to_string();
        if category.is_empty() {
            return Err(ValidationError::MissingCategory);
        }
        if self.limit <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveLimit(self.limit));
        }
        if self.spent < Decimal::ZERO {
            return Err(ValidationError::NegativeSpent(self.spent));
        }
        for value in [self.limit, self.spent] {
            if value > MAX_AMOUNT {
                return Err(ValidationError::TooLarge(value));
            }
        }
        Ok(Budget {
            id,
            name,
            limit: self.limit,
            spent: self.spent,
            category,
        })
    }
}
