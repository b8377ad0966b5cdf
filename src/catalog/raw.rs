use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{CappingPeriod, Condition, RewardType};
use crate::types::Quarter;

/// Catalog exactly as the loader hands it over. Cards stay untyped JSON until validation so one
/// malformed card cannot sink the whole catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCatalog {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub cards: Vec<serde_json::Value>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawCard {
    pub id: Option<String>,
    pub name: Option<String>,
    pub issuer: Option<String>,
    pub network: Option<String>,
    pub is_business: Option<bool>,
    pub popularity: Option<i64>,
    pub fee_structure: Option<RawFeeStructure>,
    pub eligibility: Option<RawEligibility>,
    pub reward_structure: Option<RawRewardStructure>,
    pub signup_bonus: Option<RawSignupBonus>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawFeeStructure {
    pub joining_fee: Option<Decimal>,
    pub annual_fee: Option<Decimal>,
    pub annual_fee_waiver_spend: Option<Decimal>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawEligibility {
    pub min_income: Option<Decimal>,
    pub min_credit_score: Option<u16>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawRewardStructure {
    pub reward_type: Option<RewardType>,
    pub base_reward_rate: Option<Decimal>,
    #[serde(default)]
    pub accelerated_rules: Vec<RawRule>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawRule {
    pub category_id: Option<String>,
    #[serde(default)]
    pub merchant_patterns: Vec<String>,
    pub reward_rate: Option<Decimal>,
    pub capping_limit: Option<Decimal>,
    pub capping_period: Option<CappingPeriod>,
    pub quarter_active: Option<Vec<Quarter>>,
    #[serde(default)]
    pub conditions: Vec<Condition>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSignupBonus {
    pub value: Option<Decimal>,
    pub minimum_spend: Option<Decimal>,
    pub within_months: Option<u32>
}
