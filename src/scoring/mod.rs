mod economics;
pub mod weights;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::eligibility::EligibilityAssessment;
use crate::models::{CardCatalogEntry, RewardEvaluation, ScoreBreakdown, ScoreFactor, SpendingProfile};

pub use economics::CardEconomics;
use weights::*;

/// Catalog-wide spread of first-year values, needed to normalize each card's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    min: Decimal,
    max: Decimal
}

impl ValueRange {
    /// Spread of the given values. An empty input gives a flat range at zero.
    pub fn from_values<I: IntoIterator<Item = Decimal>>(values: I) -> Self {
        values.into_iter()
            .fold(None, |range: Option<ValueRange>, value| match range {
                None => Some(ValueRange { min: value, max: value }),
                Some(range) => Some(ValueRange { min: range.min.min(value), max: range.max.max(value) })
            })
            .unwrap_or(ValueRange { min: Decimal::ZERO, max: Decimal::ZERO })
    }

    /// Position of `value` in the range as 0..=1. A flat range rewards any positive value fully.
    fn normalize(&self, value: Decimal) -> f64 {
        let span = self.max - self.min;

        if span.is_zero() {
            return if value > Decimal::ZERO { 1.0 } else { 0.0 };
        }

        to_f64((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Range-independent part of a card's score, computed inside the evaluation worker.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialScore {
    first_year_value: Decimal,
    category_alignment: f64,
    fee_efficiency: f64,
    brand_preference: f64,
    accessibility: f64,
    bonus_factors: Vec<ScoreFactor>,
    penalty_factors: Vec<ScoreFactor>
}

impl PartialScore {
    pub fn first_year_value(&self) -> Decimal {
        self.first_year_value
    }

    /// Normalizes first-year value against the catalog and assembles the clamped total.
    pub fn finalize(self, range: &ValueRange) -> ScoreBreakdown {
        let first_year_value_score = points(range.normalize(self.first_year_value), FIRST_YEAR_VALUE_WEIGHT);
        let bonuses: f64 = self.bonus_factors.iter().map(|factor| factor.points).sum();
        let penalties: f64 = self.penalty_factors.iter().map(|factor| factor.points).sum();

        let raw_total = first_year_value_score
            + self.category_alignment
            + self.fee_efficiency
            + self.brand_preference
            + self.accessibility
            + bonuses
            - penalties;

        ScoreBreakdown {
            total_score: round_score(raw_total).clamp(MIN_SCORE, MAX_SCORE),
            first_year_value_score,
            category_alignment_score: self.category_alignment,
            fee_efficiency_score: self.fee_efficiency,
            brand_preference_score: self.brand_preference,
            accessibility_score: self.accessibility,
            bonus_factors: self.bonus_factors,
            penalty_factors: self.penalty_factors
        }
    }
}

/// Turns a reward evaluation plus card metadata into weighted score components.
pub struct ScoreCalculator;

impl ScoreCalculator {
    pub fn score(
        card: &CardCatalogEntry,
        evaluation: &RewardEvaluation,
        economics: &CardEconomics,
        profile: &SpendingProfile,
        eligibility: &EligibilityAssessment
    ) -> PartialScore {
        let mut bonus_factors = Vec::new();
        let mut penalty_factors = Vec::new();

        if card.fee_structure.is_lifetime_free() {
            bonus_factors.push(factor("Lifetime free card", LIFETIME_FREE_BONUS));
        }

        if economics.fee_waived {
            bonus_factors.push(factor("Annual fee waived at your spend level", FEE_WAIVER_BONUS));
        }

        if economics.signup_bonus_value.is_some_and(|value| value > Decimal::ZERO) {
            bonus_factors.push(factor("Signup bonus reachable", SIGNUP_BONUS_BONUS));
        }

        if !eligibility.is_fully_verified() {
            penalty_factors.push(factor("Eligibility could not be fully verified", UNVERIFIABLE_ELIGIBILITY_PENALTY));
        }

        if economics.first_year_value < Decimal::ZERO {
            penalty_factors.push(factor("Fees exceed first-year rewards", NEGATIVE_VALUE_PENALTY));
        }

        if !eligibility.is_eligible() {
            penalty_factors.push(factor("Eligibility requirements not met", INELIGIBLE_PENALTY));
        }

        PartialScore {
            first_year_value: economics.first_year_value,
            category_alignment: points(category_alignment(evaluation, profile), CATEGORY_ALIGNMENT_WEIGHT),
            fee_efficiency: points(fee_efficiency(economics), FEE_EFFICIENCY_WEIGHT),
            brand_preference: points(f64::from(card.popularity) / 100.0, BRAND_PREFERENCE_WEIGHT),
            accessibility: points(accessibility(card), ACCESSIBILITY_WEIGHT),
            bonus_factors,
            penalty_factors
        }
    }
}

/// Spend-weighted share of the user's top categories that get an accelerated rate.
fn category_alignment(evaluation: &RewardEvaluation, profile: &SpendingProfile) -> f64 {
    let top_categories = profile.top_categories(TOP_CATEGORY_COUNT);
    let top_spend: Decimal = top_categories.iter().map(|category| category.total_spent).sum();

    if top_spend.is_zero() {
        return 0.0;
    }

    let aligned_spend: Decimal = top_categories.iter()
        .filter(|category| {
            evaluation.category(&category.category_id)
                .is_some_and(|reward| reward.applied_rule.is_some())
        })
        .map(|category| category.total_spent)
        .sum();

    to_f64(aligned_spend / top_spend)
}

fn fee_efficiency(economics: &CardEconomics) -> f64 {
    if economics.effective_annual_fee.is_zero() {
        return 1.0;
    }

    match economics.fee_breakeven_months {
        Some(months) => (1.0 - to_f64(months) / BREAKEVEN_HORIZON_MONTHS).max(0.0),
        None => 0.0
    }
}

fn accessibility(card: &CardCatalogEntry) -> f64 {
    let credit = card.eligibility.min_credit_score.map_or(1.0, |required| {
        ((CREDIT_SCORE_CEILING - f64::from(required)) / (CREDIT_SCORE_CEILING - CREDIT_SCORE_FLOOR)).clamp(0.0, 1.0)
    });

    let income = card.eligibility.min_income.map_or(1.0, |required| {
        (1.0 - to_f64(required) / INCOME_ACCESSIBILITY_CEILING).clamp(0.0, 1.0)
    });

    (credit + income) / 2.0
}

fn factor(label: &str, points: f64) -> ScoreFactor {
    ScoreFactor { label: label.to_string(), points }
}

fn points(fraction: f64, weight: f64) -> f64 {
    round_score(fraction.clamp(0.0, 1.0) * weight)
}

fn round_score(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
