use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::SpendingProfile;
use crate::types::{CardId, CategoryId, Quarter};

/// Window over which a spend cap on an accelerated rate resets.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CappingPeriod {
    Monthly,
    Quarterly,
    Yearly
}

impl CappingPeriod {
    pub fn periods_per_year(self) -> u32 {
        match self {
            CappingPeriod::Monthly => 12,
            CappingPeriod::Quarterly => 4,
            CappingPeriod::Yearly => 1
        }
    }
}

/// A precondition on an accelerated rule.
///
/// Spend thresholds are checked against annualized spend. Attestations can only be satisfied by
/// an explicit flag on the profile; absence means unsatisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Condition {
    MinimumCategorySpend {
        category_id: CategoryId,
        amount: Decimal
    },
    MinimumTotalSpend {
        amount: Decimal
    },
    Attestation {
        flag: String,
        #[serde(default)]
        description: Option<String>
    }
}

impl Condition {
    pub fn is_satisfied(&self, profile: &SpendingProfile) -> bool {
        match self {
            Condition::MinimumCategorySpend { category_id, amount } => profile
                .category(category_id)
                .is_some_and(|category| category.annualized_spend >= *amount),
            Condition::MinimumTotalSpend { amount } => profile.annualized_spend >= *amount,
            Condition::Attestation { flag, .. } => profile.is_attested(flag)
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Condition::MinimumCategorySpend { category_id, amount } => {
                format!("at least {amount} yearly spend on {category_id}")
            }
            Condition::MinimumTotalSpend { amount } => format!("at least {amount} total yearly spend"),
            Condition::Attestation { flag, description } => description.clone().unwrap_or_else(|| flag.replace('_', " "))
        }
    }
}

/// A validated accelerated reward rule. `position` is its index in the card's rule list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceleratedRewardRule {
    pub position: usize,
    pub category_id: Option<CategoryId>,
    /// Lowercased substrings matched against merchant names.
    pub merchant_patterns: Vec<String>,
    pub reward_rate: Decimal,
    pub capping_limit: Option<Decimal>,
    pub capping_period: Option<CappingPeriod>,
    pub quarter_active: Option<Vec<Quarter>>,
    pub conditions: Vec<Condition>
}

impl AcceleratedRewardRule {
    pub fn is_active_in(&self, quarter: Quarter) -> bool {
        self.quarter_active.as_ref().is_none_or(|quarters| quarters.contains(&quarter))
    }

    pub fn matches_merchant(&self, merchant: &str) -> bool {
        self.merchant_patterns.iter().any(|pattern| merchant.contains(pattern.as_str()))
    }

    /// Cap expressed over one year of spend. A cap without a period is a yearly cap.
    pub fn annual_cap(&self) -> Option<Decimal> {
        self.capping_limit.map(|limit| {
            let periods = self.capping_period.unwrap_or(CappingPeriod::Yearly).periods_per_year();
            limit * Decimal::from(periods)
        })
    }

    pub fn label(&self) -> String {
        match (&self.category_id, self.merchant_patterns.is_empty()) {
            (Some(category_id), true) => format!("{}% on {category_id}", self.reward_rate.normalize()),
            (Some(category_id), false) => format!(
                "{}% on {category_id} / {}",
                self.reward_rate.normalize(),
                self.merchant_patterns.join(", ")
            ),
            (None, _) => format!("{}% at {}", self.reward_rate.normalize(), self.merchant_patterns.join(", "))
        }
    }
}

/// How earned reward units turn into currency.
///
/// Rates are always "units per 100 spent". A cashback unit is one currency unit. Points and miles
/// are valued at `conversion_rate`; `alternate_conversion_rate` is reported on its own and never
/// blended into the primary value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RewardType {
    Cashback,
    Points {
        conversion_rate: Decimal,
        #[serde(default)]
        alternate_conversion_rate: Option<Decimal>
    },
    Miles {
        conversion_rate: Decimal,
        #[serde(default)]
        alternate_conversion_rate: Option<Decimal>
    }
}

impl RewardType {
    pub fn unit_value(&self) -> Decimal {
        match self {
            RewardType::Cashback => Decimal::ONE,
            RewardType::Points { conversion_rate, .. } | RewardType::Miles { conversion_rate, .. } => *conversion_rate
        }
    }

    pub fn alternate_unit_value(&self) -> Option<Decimal> {
        match self {
            RewardType::Cashback => None,
            RewardType::Points { alternate_conversion_rate, .. }
            | RewardType::Miles { alternate_conversion_rate, .. } => *alternate_conversion_rate
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardStructure {
    pub reward_type: RewardType,
    pub base_reward_rate: Decimal,
    pub accelerated_rules: Vec<AcceleratedRewardRule>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeStructure {
    /// Charged once, in the first year.
    pub joining_fee: Decimal,
    /// Recurring fee, waived when yearly spend reaches `annual_fee_waiver_spend`.
    pub annual_fee: Decimal,
    pub annual_fee_waiver_spend: Option<Decimal>
}

impl FeeStructure {
    pub fn is_lifetime_free(&self) -> bool {
        self.joining_fee.is_zero() && self.annual_fee.is_zero()
    }

    pub fn is_waived_at(&self, annual_spend: Decimal) -> bool {
        !self.annual_fee.is_zero()
            && self.annual_fee_waiver_spend.is_some_and(|threshold| annual_spend >= threshold)
    }

    pub fn effective_annual_fee(&self, annual_spend: Decimal) -> Decimal {
        if self.is_waived_at(annual_spend) {
            Decimal::ZERO
        } else {
            self.annual_fee
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRequirements {
    pub min_income: Option<Decimal>,
    pub min_credit_score: Option<u16>
}

impl EligibilityRequirements {
    pub fn constraint_count(&self) -> usize {
        usize::from(self.min_income.is_some()) + usize::from(self.min_credit_score.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupBonus {
    pub value: Decimal,
    pub minimum_spend: Option<Decimal>,
    pub within_months: Option<u32>
}

impl SignupBonus {
    /// Whether the bonus spend requirement is reachable at the given monthly spend.
    pub fn is_reachable(&self, monthly_spend: Decimal) -> bool {
        match self.minimum_spend {
            None => true,
            Some(minimum) => {
                let months = self.within_months.unwrap_or(crate::types::MONTHS_PER_YEAR);
                monthly_spend * Decimal::from(months) >= minimum
            }
        }
    }
}

/// A validated catalog card. Only the catalog validator builds these.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardCatalogEntry {
    pub id: CardId,
    pub name: String,
    pub issuer: String,
    pub network: String,
    pub is_business: bool,
    /// Catalog popularity, 0 to 100.
    pub popularity: u8,
    pub fee_structure: FeeStructure,
    pub eligibility: EligibilityRequirements,
    pub reward_structure: RewardStructure,
    pub signup_bonus: Option<SignupBonus>
}
