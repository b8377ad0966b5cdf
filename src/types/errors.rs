use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmountError {
    #[error("Amount error: value is an empty string")]
    Empty,
    #[error("Amount error: {0}")]
    InvalidFormat(String),
    #[error("Amount error: {0} exceeds the supported magnitude")]
    Overflow(String)
}

#[derive(Debug, Error)]
pub enum QuarterError {
    #[error("Quarter error: {0} is not in 1..=4")]
    OutOfRange(u8)
}
