use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{CardId, CategoryId, Quarter};

/// The accelerated rule that won precedence for a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedRule {
    pub position: usize,
    pub label: String,
    pub merchant_specific: bool
}

/// Earnings for one category on one card. Amounts are annualized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReward {
    pub category_id: CategoryId,
    pub spent_amount: Decimal,
    /// Rate the user earns today, from the request baseline.
    pub current_rate: Decimal,
    /// Rate this card applies to spend within the cap.
    pub card_rate: Decimal,
    pub earned_value: Decimal,
    pub alternate_earned_value: Option<Decimal>,
    /// Spend above the cap, earning only the base rate.
    pub capped_amount_excluded: Decimal,
    pub applied_rule: Option<AppliedRule>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InactiveReason {
    OutOfQuarter {
        active_quarters: Vec<Quarter>,
        evaluated: Quarter
    },
    ConditionUnmet {
        condition: String
    }
}

/// A rule that would have matched a category but was switched off.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InactiveRule {
    pub category_id: CategoryId,
    pub rule_label: String,
    pub reward_rate: Decimal,
    pub reason: InactiveReason
}

/// Everything the reward evaluator derived for one card against one profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardEvaluation {
    pub card_id: CardId,
    pub categories: Vec<CategoryReward>,
    pub inactive_rules: Vec<InactiveRule>,
    pub annual_spend: Decimal,
    pub annual_earnings: Decimal,
    pub alternate_annual_earnings: Option<Decimal>,
    pub baseline_earnings: Decimal
}

impl RewardEvaluation {
    pub fn category(&self, category_id: &str) -> Option<&CategoryReward> {
        self.categories.iter().find(|category| category.category_id == category_id)
    }

    /// Highest earning category, ties broken by category id.
    pub fn top_earning_category(&self) -> Option<&CategoryReward> {
        self.categories.iter().max_by(|left, right| {
            left.earned_value.cmp(&right.earned_value)
                .then_with(|| right.category_id.cmp(&left.category_id))
        })
    }
}

/// One additive score adjustment, kept separate from the weighted sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreFactor {
    pub label: String,
    pub points: f64
}

/// Score composition. Sub-scores are weighted points; `total_score` is clamped to 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub total_score: f64,
    pub first_year_value_score: f64,
    pub category_alignment_score: f64,
    pub fee_efficiency_score: f64,
    pub brand_preference_score: f64,
    pub accessibility_score: f64,
    pub bonus_factors: Vec<ScoreFactor>,
    pub penalty_factors: Vec<ScoreFactor>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub card_id: CardId,
    pub card_name: String,
    pub issuer: String,
    pub rank: usize,
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
    pub annual_savings: Decimal,
    pub annual_earnings: Decimal,
    pub alternate_annual_earnings: Option<Decimal>,
    pub signup_bonus_value: Option<Decimal>,
    pub fee_breakeven_months: Option<Decimal>,
    pub benefit_breakdown: Vec<CategoryReward>,
    pub primary_reason: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub confidence_score: f64
}

/// A card that was scored but filtered out, with the reasons why.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearMiss {
    pub card_id: CardId,
    pub card_name: String,
    pub score: f64,
    pub annual_savings: Decimal,
    pub cons: Vec<String>
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low
}

impl ConfidenceLevel {
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 0.75 {
            ConfidenceLevel::High
        } else if confidence >= 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSummary {
    pub top_recommendation: Option<CardId>,
    pub potential_savings: Decimal,
    pub average_score: f64,
    pub categories_analyzed: usize,
    pub confidence_level: ConfidenceLevel
}

/// Card-level data quality issues, reported in aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub catalog_version: String,
    pub cards_evaluated: usize,
    pub skipped_cards: Vec<String>,
    pub dropped_rules: Vec<String>,
    pub unverifiable_eligibility: Vec<String>,
    pub notes: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub near_misses: Vec<NearMiss>,
    pub summary: RecommendationSummary,
    pub diagnostics: Diagnostics,
    pub processing_time_ms: u64,
    pub generated_at: DateTime<Utc>
}
