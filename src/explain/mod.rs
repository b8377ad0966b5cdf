
use rust_decimal::Decimal;

use crate::models::{CategoryReward, InactiveReason, SpendingProfile};
use crate::ranking::ScoredCard;

const QUICK_BREAKEVEN_MONTHS: Decimal = Decimal::from_parts(6, 0, 0, false, 0);
const SLOW_BREAKEVEN_MONTHS: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

const COMPLETENESS_WEIGHT: f64 = 0.6;
const ELIGIBILITY_CERTAINTY_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub primary_reason: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub confidence_score: f64
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Driver {
    FirstYearValue,
    CategoryAlignment,
    FeeEfficiency,
    BrandPreference,
    Accessibility
}

/// Derives display text and a confidence figure for a ranked card.
pub struct ExplanationGenerator;

impl ExplanationGenerator {
    pub fn explain(scored: &ScoredCard<'_>, profile: &SpendingProfile) -> Explanation {
        Explanation {
            primary_reason: primary_reason(scored),
            pros: pros(scored, profile),
            cons: cons(scored, profile),
            confidence_score: confidence(scored, profile)
        }
    }
}

fn dominant_driver(scored: &ScoredCard<'_>) -> Driver {
    let breakdown = &scored.breakdown;
    let drivers = [
        (Driver::FirstYearValue, breakdown.first_year_value_score),
        (Driver::CategoryAlignment, breakdown.category_alignment_score),
        (Driver::FeeEfficiency, breakdown.fee_efficiency_score),
        (Driver::BrandPreference, breakdown.brand_preference_score),
        (Driver::Accessibility, breakdown.accessibility_score)
    ];

    //NOTE: Strictly greater keeps the earlier driver on ties so the wording is stable
    drivers.iter()
        .fold(drivers[0], |best, current| if current.1 > best.1 { *current } else { best })
        .0
}

fn primary_reason(scored: &ScoredCard<'_>) -> String {
    let earner = scored.evaluation.top_earning_category()
        .map(|reward| format!("{} earns the most ({} a year)", display_category(reward), reward.earned_value))
        .unwrap_or_else(|| "rewards apply to all of your spend".to_string());

    match dominant_driver(scored) {
        Driver::FirstYearValue => {
            format!("Strong first-year value of {}; {earner}", scored.economics.first_year_value)
        }
        Driver::CategoryAlignment => format!("Accelerated rewards on your biggest spending categories; {earner}"),
        Driver::FeeEfficiency => match scored.economics.fee_breakeven_months {
            Some(months) => format!("Annual fee pays for itself in {months} months; {earner}"),
            None => format!("No annual fee to recover; {earner}")
        },
        Driver::BrandPreference => format!("Widely held {} card; {earner}", scored.card.issuer),
        Driver::Accessibility => format!("Easy to qualify for; {earner}")
    }
}

fn pros(scored: &ScoredCard<'_>, profile: &SpendingProfile) -> Vec<String> {
    let card = scored.card;
    let economics = &scored.economics;
    let mut pros = Vec::new();

    if card.fee_structure.is_lifetime_free() {
        pros.push("Lifetime free".to_string());
    } else if economics.fee_waived {
        pros.push(format!("Annual fee of {} waived at your projected spend", card.fee_structure.annual_fee));
    }

    if let Some(months) = economics.fee_breakeven_months.filter(|months| *months < QUICK_BREAKEVEN_MONTHS) {
        pros.push(format!("Annual fee recovered in {months} months"));
    }

    if let Some(value) = economics.signup_bonus_value.filter(|value| *value > Decimal::ZERO) {
        pros.push(format!("Signup bonus worth {value}"));
    }

    if let Some(reward) = top_category_reward(scored, profile) {
        if let Some(rule) = &reward.applied_rule {
            pros.push(format!("{} covers {}, your largest spending category", rule.label, display_category(reward)));
        }
    }

    if let Some(alternate) = scored.evaluation.alternate_annual_earnings.filter(|alternate| *alternate > economics.annual_earnings) {
        pros.push(format!("Up to {alternate} a year through alternate redemption"));
    }

    if economics.annual_savings > Decimal::ZERO {
        pros.push(format!("About {} a year more than your current rewards", economics.annual_savings));
    }

    pros
}

fn cons(scored: &ScoredCard<'_>, profile: &SpendingProfile) -> Vec<String> {
    let economics = &scored.economics;
    let mut cons = Vec::new();

    if let Some(reward) = top_category_reward(scored, profile) {
        if reward.capped_amount_excluded > Decimal::ZERO {
            cons.push(format!(
                "Spend cap: {} of your {} spend earns only the base rate",
                reward.capped_amount_excluded,
                display_category(reward)
            ));
        }

        //NOTE: An idle rule only matters when it beats what the category already earns
        let missed_rules = scored.evaluation.inactive_rules.iter()
            .filter(|inactive| inactive.category_id == reward.category_id && inactive.reward_rate > reward.card_rate);

        for inactive in missed_rules {
            cons.push(match &inactive.reason {
                InactiveReason::OutOfQuarter { active_quarters, .. } => {
                    let quarters: Vec<String> = active_quarters.iter().map(ToString::to_string).collect();
                    format!("{} is only active in {}", inactive.rule_label, quarters.join(", "))
                }
                InactiveReason::ConditionUnmet { condition } => {
                    format!("{} requires {condition}", inactive.rule_label)
                }
            });
        }
    }

    let fee_not_recovered = !economics.effective_annual_fee.is_zero()
        && economics.fee_breakeven_months.is_none_or(|months| months >= SLOW_BREAKEVEN_MONTHS);

    if fee_not_recovered {
        cons.push(format!("Annual fee of {} is not recovered by projected rewards", economics.effective_annual_fee));
    }

    if economics.annual_savings < Decimal::ZERO {
        cons.push("Earns less than your current rewards after fees".to_string());
    }

    if economics.signup_bonus_unreachable {
        cons.push("Signup bonus needs more spend than your current pattern reaches".to_string());
    }

    if !scored.eligibility.is_fully_verified() {
        cons.push("Eligibility unverified: provide your credit score and income to confirm".to_string());
    }

    cons
}

/// Weighted blend of rule coverage over categorized spend and eligibility certainty, in 0..=1.
fn confidence(scored: &ScoredCard<'_>, profile: &SpendingProfile) -> f64 {
    let categorized: Vec<&str> = profile.categorized().map(|category| category.category_id.as_str()).collect();

    let completeness = if categorized.is_empty() {
        0.0
    } else {
        let matched = categorized.iter()
            .filter(|category_id| {
                scored.evaluation.category(category_id).is_some_and(|reward| reward.applied_rule.is_some())
            })
            .count();

        matched as f64 / categorized.len() as f64
    };

    let confidence = COMPLETENESS_WEIGHT * completeness + ELIGIBILITY_CERTAINTY_WEIGHT * scored.eligibility.certainty();

    ((confidence * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

fn top_category_reward<'a>(scored: &'a ScoredCard<'_>, profile: &SpendingProfile) -> Option<&'a CategoryReward> {
    let top = profile.top_categories(1).into_iter().next()?;
    scored.evaluation.category(&top.category_id)
}

fn display_category(reward: &CategoryReward) -> String {
    reward.category_id.replace('_', " ")
}
