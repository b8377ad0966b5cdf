use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::CardId;

/// Request-level failures. Anything in here aborts the whole recommendation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Cannot recommend: {0}")]
    InsufficientData(#[from] InsufficientDataError),
    #[error("Recommendation timed out after {elapsed_ms}ms")]
    Timeout {
        elapsed_ms: u64
    },
    #[error("Card evaluation worker failed: {0}")]
    Worker(String)
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum InsufficientDataError {
    #[error("no transactions were supplied")]
    NoTransactions,
    #[error("net debit spend is {total}, there is nothing to project")]
    NoSpend {
        total: Decimal
    },
    #[error("transaction amount {amount} on {date} exceeds the supported magnitude")]
    AmountOutOfRange {
        date: NaiveDate,
        amount: Decimal
    },
    #[error("spend totals overflowed while aggregating")]
    Overflow
}

/// A catalog card that cannot be evaluated. The card is skipped, the batch continues.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum CardDataValidationError {
    #[error("Card [{card_id}] is missing required field '{field}'")]
    MissingField {
        card_id: CardId,
        field: String
    },
    #[error("Card [{card_id}] has an invalid '{field}': {reason}")]
    InvalidValue {
        card_id: CardId,
        field: String,
        reason: String
    }
}

impl CardDataValidationError {
    pub fn missing_field(card_id: &str, field: &str) -> Self {
        Self::MissingField {
            card_id: card_id.to_string(),
            field: field.to_string()
        }
    }

    pub fn invalid_value(card_id: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            card_id: card_id.to_string(),
            field: field.to_string(),
            reason: reason.into()
        }
    }

    pub fn card_id(&self) -> &str {
        match self {
            Self::MissingField { card_id, .. } | Self::InvalidValue { card_id, .. } => card_id
        }
    }
}

/// A rule pointing at a category the taxonomy does not know. The rule is dropped, the card stays.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("Card [{card_id}] rule #{rule_position} references unknown category '{category_id}'")]
pub struct UnknownCategoryReferenceError {
    pub card_id: CardId,
    pub rule_position: usize,
    pub category_id: String
}

/// An eligibility constraint the request carries no data for. Lowers confidence only.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum EligibilityUnverifiableError {
    #[error("Card [{card_id}] requires a credit score of {required} but none was provided")]
    CreditScore {
        card_id: CardId,
        required: u16
    },
    #[error("Card [{card_id}] requires an annual income of {required} but none was provided")]
    Income {
        card_id: CardId,
        required: Decimal
    }
}
