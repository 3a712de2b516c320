use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{EntryType, ValidationError, MAX_AMOUNT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub description: String,
    /// Category name. Matched by value, never checked against the category list.
    pub category: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EntryType,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == EntryType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == EntryType::Expense
    }

    /// Amount with the sign of its direction: positive for income, negative for expense.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            EntryType::Income => self.amount,
            EntryType::Expense => -self.amount,
        }
    }
}

/// User input for a transaction that has not been given an id yet.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: EntryType,
    pub amount: Decimal,
    pub description: String,
    pub category: Option<String>,
    pub date: DateTime<Utc>,
}

impl NewTransaction {
    pub fn validate(self, id: String) -> Result<Transaction, ValidationError> {
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        if self.amount > MAX_AMOUNT {
            return Err(ValidationError::TooLarge(self.amount));
        }
        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(ValidationError::MissingCategory)?;

        Ok(Transaction {
            id,
            amount: self.amount,
            description,
            category,
            date: self.date,
            kind: self.kind,
        })
    }
}
