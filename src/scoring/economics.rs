use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{CardCatalogEntry, RewardEvaluation, SpendingProfile};
use crate::types::MONTHS_PER_YEAR;

/// Money side of a card for one user: fees, bonus and the derived yearly figures.
#[derive(Debug, Clone, PartialEq)]
pub struct CardEconomics {
    pub annual_earnings: Decimal,
    pub effective_annual_fee: Decimal,
    pub fee_waived: bool,
    /// Counted only when the bonus spend requirement is reachable.
    pub signup_bonus_value: Option<Decimal>,
    pub signup_bonus_unreachable: bool,
    /// Earnings + signup bonus − joining fee − effective annual fee.
    pub first_year_value: Decimal,
    /// Earnings above the user's current baseline, net of the effective annual fee.
    pub annual_savings: Decimal,
    /// Months of earnings needed to recover the effective annual fee. `None` when there is no fee
    /// or nothing is earned.
    pub fee_breakeven_months: Option<Decimal>
}

impl CardEconomics {
    pub fn derive(card: &CardCatalogEntry, evaluation: &RewardEvaluation, profile: &SpendingProfile) -> Self {
        let fees = &card.fee_structure;
        let annual_earnings = evaluation.annual_earnings;
        let effective_annual_fee = fees.effective_annual_fee(evaluation.annual_spend);

        let (signup_bonus_value, signup_bonus_unreachable) = match &card.signup_bonus {
            Some(bonus) if bonus.is_reachable(profile.monthly_spend()) => (Some(bonus.value), false),
            Some(_) => (None, true),
            None => (None, false)
        };

        let fee_breakeven_months = if effective_annual_fee.is_zero() || annual_earnings <= Decimal::ZERO {
            None
        } else {
            Some((effective_annual_fee * Decimal::from(MONTHS_PER_YEAR) / annual_earnings)
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
        };

        Self {
            annual_earnings,
            effective_annual_fee,
            fee_waived: fees.is_waived_at(evaluation.annual_spend),
            signup_bonus_value,
            signup_bonus_unreachable,
            first_year_value: annual_earnings + signup_bonus_value.unwrap_or(Decimal::ZERO)
                - fees.joining_fee - effective_annual_fee,
            annual_savings: annual_earnings - evaluation.baseline_earnings - effective_annual_fee,
            fee_breakeven_months
        }
    }
}
