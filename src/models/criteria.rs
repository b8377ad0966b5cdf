use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-supplied filters and user facts for one recommendation request.
///
/// Every field is optional on the wire. Missing values mean "no constraint", except
/// `include_business_cards` (defaults to excluding business cards) and `current_reward_rate`
/// (defaults to a zero-reward status quo).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationCriteria {
    pub credit_score: Option<u16>,
    pub annual_income: Option<Decimal>,
    pub max_annual_fee: Option<Decimal>,
    pub preferred_network: Option<String>,
    pub include_business_cards: bool,
    /// Treat eligibility that cannot be verified as a failed hard filter.
    pub require_verified_eligibility: bool,
    /// Percent the user already earns on spend today, used as the savings baseline.
    pub current_reward_rate: Decimal
}
