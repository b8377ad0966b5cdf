use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::{deserialize_amount, CategoryId};

/// A single categorized card transaction, as handed over by the categorization stage.
///
/// `amount` is signed with debits positive. Credits (refunds, reversals) arrive negative.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub date: NaiveDate,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub mcc_code: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>
}

impl Transaction {
    pub fn new(date: NaiveDate, amount: Decimal, category_id: Option<&str>) -> Self {
        Self {
            date,
            amount,
            category_id: category_id.map(str::to_string),
            mcc_code: None,
            merchant: None
        }
    }

    #[cfg(test)]
    pub fn with_merchant(mut self, merchant: &str) -> Self {
        self.merchant = Some(merchant.to_string());
        self
    }

    /// Category key with blanks folded into the uncategorized bucket.
    pub fn resolved_category(&self) -> Option<&str> {
        self.category_id.as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
    }
}
