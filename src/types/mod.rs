mod amount;
mod errors;
mod quarter;

pub use amount::{deserialize_amount, parse_amount, round_currency, MAX_TRANSACTION_AMOUNT};
pub use errors::{AmountError, QuarterError};
pub use quarter::Quarter;

pub type CardId = String;
pub type CategoryId = String;

/// Reserved bucket for spend that never resolved to a category.
pub const UNCATEGORIZED: &str = "uncategorized";

pub const MONTHS_PER_YEAR: u32 = 12;
