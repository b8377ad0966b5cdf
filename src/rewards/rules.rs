use std::cmp::Ordering;

use crate::models::{AcceleratedRewardRule, CategorySpend, InactiveReason, InactiveRule, SpendingProfile};
use crate::types::Quarter;

pub(crate) struct Candidate<'a> {
    pub rule: &'a AcceleratedRewardRule,
    pub merchant_specific: bool
}

pub(crate) struct RuleSelection<'a> {
    pub applied: Option<Candidate<'a>>,
    pub inactive: Vec<InactiveRule>
}

/// Picks the single accelerated rule that applies to a category.
///
/// A rule is a candidate when its category matches or one of its merchant patterns matches a
/// merchant seen in the category. Candidates outside the evaluation quarter or with an unmet
/// condition are reported as inactive. Among the rest, merchant matches win over category
/// matches, then the higher rate, then the earlier rule.
pub(crate) fn select_rule<'a>(
    rules: &'a [AcceleratedRewardRule],
    category: &CategorySpend,
    profile: &SpendingProfile,
    quarter: Quarter
) -> RuleSelection<'a> {
    let mut candidates = Vec::new();
    let mut inactive = Vec::new();

    for rule in rules {
        let merchant_specific = category.merchant_names.iter().any(|merchant| rule.matches_merchant(merchant));
        let category_match = !category.is_uncategorized()
            && rule.category_id.as_deref() == Some(category.category_id.as_str());

        if !merchant_specific && !category_match {
            continue;
        }

        if !rule.is_active_in(quarter) {
            inactive.push(InactiveRule {
                category_id: category.category_id.clone(),
                rule_label: rule.label(),
                reward_rate: rule.reward_rate,
                reason: InactiveReason::OutOfQuarter {
                    active_quarters: rule.quarter_active.clone().unwrap_or_default(),
                    evaluated: quarter
                }
            });
            continue;
        }

        if let Some(unmet) = rule.conditions.iter().find(|condition| !condition.is_satisfied(profile)) {
            inactive.push(InactiveRule {
                category_id: category.category_id.clone(),
                rule_label: rule.label(),
                reward_rate: rule.reward_rate,
                reason: InactiveReason::ConditionUnmet { condition: unmet.describe() }
            });
            continue;
        }

        candidates.push(Candidate { rule, merchant_specific });
    }

    RuleSelection {
        applied: candidates.into_iter().min_by(precedence),
        inactive
    }
}

fn precedence(left: &Candidate<'_>, right: &Candidate<'_>) -> Ordering {
    right.merchant_specific.cmp(&left.merchant_specific)
        .then_with(|| right.rule.reward_rate.cmp(&left.rule.reward_rate))
        .then_with(|| left.rule.position.cmp(&right.rule.position))
}
