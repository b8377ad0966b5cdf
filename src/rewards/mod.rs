mod rules;
#[cfg(test)]
mod tests;

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{AppliedRule, CardCatalogEntry, CategoryReward, CategorySpend, RewardEvaluation, RewardType, SpendingProfile};
use crate::types::{round_currency, Quarter};

const RATE_BASIS: Decimal = Decimal::ONE_HUNDRED;

/// Projects one card's yearly rewards over a spending profile.
///
/// Pure: the same card, profile, quarter and baseline always give the same evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RewardEvaluator {
    quarter: Quarter,
    current_reward_rate: Decimal
}

impl RewardEvaluator {
    pub fn new(quarter: Quarter) -> Self {
        Self {
            quarter,
            current_reward_rate: Decimal::ZERO
        }
    }

    /// Percent the user already earns today; feeds `current_rate` and the baseline.
    pub fn with_current_reward_rate(mut self, rate: Decimal) -> Self {
        self.current_reward_rate = rate.max(Decimal::ZERO);
        self
    }

    pub fn quarter(&self) -> Quarter {
        self.quarter
    }

    pub fn evaluate(&self, card: &CardCatalogEntry, profile: &SpendingProfile) -> RewardEvaluation {
        let mut categories = Vec::with_capacity(profile.categories.len());
        let mut inactive_rules = Vec::new();

        for category in profile.categories.values() {
            let selection = rules::select_rule(&card.reward_structure.accelerated_rules, category, profile, self.quarter);
            inactive_rules.extend(selection.inactive);
            categories.push(self.evaluate_category(card, category, selection.applied));
        }

        let reward_type = &card.reward_structure.reward_type;
        let annual_earnings: Decimal = categories.iter().map(|category| category.earned_value).sum();

        let alternate_annual_earnings = reward_type.alternate_unit_value().map(|_| {
            categories.iter().filter_map(|category| category.alternate_earned_value).sum::<Decimal>()
        });

        let evaluation = RewardEvaluation {
            card_id: card.id.clone(),
            annual_spend: categories.iter().map(|category| category.spent_amount).sum(),
            baseline_earnings: round_currency(profile.annualized_spend * self.current_reward_rate / RATE_BASIS),
            categories,
            inactive_rules,
            annual_earnings,
            alternate_annual_earnings
        };

        debug!(
            "Card [{}] earns {} on {} yearly spend in {} ({} inactive rules)",
            card.id, evaluation.annual_earnings, evaluation.annual_spend, self.quarter, evaluation.inactive_rules.len()
        );

        evaluation
    }

    fn evaluate_category(&self, card: &CardCatalogEntry, category: &CategorySpend, applied: Option<rules::Candidate<'_>>) -> CategoryReward {
        let structure = &card.reward_structure;
        let base_rate = structure.base_reward_rate;
        let spend = category.annualized_spend;

        let (card_rate, accelerated_spend, capped_amount_excluded, applied_rule) = match applied {
            Some(candidate) => {
                let rule = candidate.rule;
                let eligible = rule.annual_cap().map_or(spend, |cap| spend.min(cap));

                //NOTE: A rule priced below the base rate would make the card worse for matching spend
                let rate = rule.reward_rate.max(base_rate);

                let applied_rule = AppliedRule {
                    position: rule.position,
                    label: rule.label(),
                    merchant_specific: candidate.merchant_specific
                };

                (rate, eligible, spend - eligible, Some(applied_rule))
            }
            None => (base_rate, spend, Decimal::ZERO, None)
        };

        let units = reward_units(accelerated_spend, card_rate) + reward_units(capped_amount_excluded, base_rate);

        CategoryReward {
            category_id: category.category_id.clone(),
            spent_amount: spend,
            current_rate: self.current_reward_rate,
            card_rate,
            earned_value: to_currency(units, &structure.reward_type),
            alternate_earned_value: structure.reward_type.alternate_unit_value().map(|value| round_currency(units * value)),
            capped_amount_excluded,
            applied_rule
        }
    }
}

/// Reward units earned on `spend` at `rate` units per 100.
fn reward_units(spend: Decimal, rate: Decimal) -> Decimal {
    spend * rate / RATE_BASIS
}

/// Values reward units at the primary conversion rate.
fn to_currency(units: Decimal, reward_type: &RewardType) -> Decimal {
    round_currency(units * reward_type.unit_value())
}
