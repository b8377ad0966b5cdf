use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;

use crate::catalog::raw::{RawCard, RawEligibility, RawFeeStructure, RawRewardStructure, RawRule, RawSignupBonus};
use crate::models::{
    AcceleratedRewardRule, CardCatalogEntry, CardDataValidationError, Condition, EligibilityRequirements,
    FeeStructure, RewardStructure, RewardType, SignupBonus, UnknownCategoryReferenceError
};
use crate::types::CategoryId;

//NOTE: Default policies for optional catalog fields live here and nowhere else. Anything without a
//      default below is required and its absence skips the card.
const DEFAULT_POPULARITY: u8 = 50;
const MAX_POPULARITY: i64 = 100;
const UNKNOWN_NETWORK: &str = "unknown";
const UNIDENTIFIED_CARD: &str = "<unidentified>";

pub(crate) struct ValidatedCard {
    pub card: CardCatalogEntry,
    pub dropped_rules: Vec<UnknownCategoryReferenceError>
}

/// Turns one raw catalog card into a typed entry.
///
/// Rules that reference categories outside the taxonomy are dropped and reported alongside the
/// card; every other problem rejects the card.
pub(crate) fn validate_card(value: &Value, taxonomy: &BTreeSet<CategoryId>) -> Result<ValidatedCard, CardDataValidationError> {
    let fallback_id = value.get("id").and_then(Value::as_str).unwrap_or(UNIDENTIFIED_CARD);

    let raw: RawCard = serde_json::from_value(value.clone())
        .map_err(|error| CardDataValidationError::invalid_value(fallback_id, "card", error.to_string()))?;

    let id = required_text(raw.id, fallback_id, "id")?;
    let name = required_text(raw.name, &id, "name")?;
    let issuer = required_text(raw.issuer, &id, "issuer")?;
    let network = raw.network
        .map(|network| network.trim().to_string())
        .filter(|network| !network.is_empty())
        .unwrap_or_else(|| UNKNOWN_NETWORK.to_string());

    let popularity = match raw.popularity {
        None => DEFAULT_POPULARITY,
        Some(popularity) => u8::try_from(popularity)
            .ok()
            .filter(|popularity| i64::from(*popularity) <= MAX_POPULARITY)
            .ok_or_else(|| CardDataValidationError::invalid_value(&id, "popularity", format!("{popularity} is outside 0..=100")))?
    };

    let fee_structure = validate_fees(&id, required(raw.fee_structure, &id, "feeStructure")?)?;
    let eligibility = validate_eligibility(&id, raw.eligibility)?;
    let (reward_structure, dropped_rules) = validate_rewards(&id, required(raw.reward_structure, &id, "rewardStructure")?, taxonomy)?;
    let signup_bonus = raw.signup_bonus.map(|bonus| validate_signup_bonus(&id, bonus)).transpose()?;

    Ok(ValidatedCard {
        card: CardCatalogEntry {
            id,
            name,
            issuer,
            network,
            is_business: raw.is_business.unwrap_or(false),
            popularity,
            fee_structure,
            eligibility,
            reward_structure,
            signup_bonus
        },
        dropped_rules
    })
}

fn validate_fees(card_id: &str, raw: RawFeeStructure) -> Result<FeeStructure, CardDataValidationError> {
    let annual_fee = required(raw.annual_fee, card_id, "feeStructure.annualFee")?;

    Ok(FeeStructure {
        joining_fee: non_negative(raw.joining_fee.unwrap_or(Decimal::ZERO), card_id, "feeStructure.joiningFee")?,
        annual_fee: non_negative(annual_fee, card_id, "feeStructure.annualFee")?,
        annual_fee_waiver_spend: raw.annual_fee_waiver_spend
            .map(|spend| positive(spend, card_id, "feeStructure.annualFeeWaiverSpend"))
            .transpose()?
    })
}

fn validate_eligibility(card_id: &str, raw: Option<RawEligibility>) -> Result<EligibilityRequirements, CardDataValidationError> {
    let Some(raw) = raw else {
        return Ok(EligibilityRequirements::default());
    };

    Ok(EligibilityRequirements {
        min_income: raw.min_income
            .map(|income| non_negative(income, card_id, "eligibility.minIncome"))
            .transpose()?,
        min_credit_score: raw.min_credit_score
    })
}

fn validate_rewards(
    card_id: &str,
    raw: RawRewardStructure,
    taxonomy: &BTreeSet<CategoryId>
) -> Result<(RewardStructure, Vec<UnknownCategoryReferenceError>), CardDataValidationError> {
    let reward_type = required(raw.reward_type, card_id, "rewardStructure.rewardType")?;

    if let RewardType::Points { conversion_rate, alternate_conversion_rate }
        | RewardType::Miles { conversion_rate, alternate_conversion_rate } = &reward_type
    {
        positive(*conversion_rate, card_id, "rewardStructure.rewardType.conversionRate")?;

        if let Some(alternate) = alternate_conversion_rate {
            positive(*alternate, card_id, "rewardStructure.rewardType.alternateConversionRate")?;
        }
    }

    let base_reward_rate = non_negative(
        required(raw.base_reward_rate, card_id, "rewardStructure.baseRewardRate")?,
        card_id,
        "rewardStructure.baseRewardRate"
    )?;

    let mut accelerated_rules = Vec::with_capacity(raw.accelerated_rules.len());
    let mut dropped_rules = Vec::new();

    for (position, rule) in raw.accelerated_rules.into_iter().enumerate() {
        match validate_rule(card_id, position, rule, taxonomy)? {
            Ok(rule) => accelerated_rules.push(rule),
            Err(unknown) => {
                warn!("{unknown}; rule dropped, category falls back to the base rate");
                dropped_rules.push(unknown);
            }
        }
    }

    Ok((RewardStructure { reward_type, base_reward_rate, accelerated_rules }, dropped_rules))
}

fn validate_rule(
    card_id: &str,
    position: usize,
    raw: RawRule,
    taxonomy: &BTreeSet<CategoryId>
) -> Result<Result<AcceleratedRewardRule, UnknownCategoryReferenceError>, CardDataValidationError> {
    let field = format!("rewardStructure.acceleratedRules[{position}]");

    let reward_rate = non_negative(
        required(raw.reward_rate, card_id, &format!("{field}.rewardRate"))?,
        card_id,
        &format!("{field}.rewardRate")
    )?;

    let category_id = raw.category_id
        .map(|category| category.trim().to_string())
        .filter(|category| !category.is_empty());

    let merchant_patterns: Vec<String> = raw.merchant_patterns.iter()
        .map(|pattern| pattern.trim().to_lowercase())
        .filter(|pattern| !pattern.is_empty())
        .collect();

    if category_id.is_none() && merchant_patterns.is_empty() {
        return Err(CardDataValidationError::invalid_value(card_id, &field, "rule targets neither a category nor a merchant"));
    }

    let capping_limit = raw.capping_limit
        .map(|limit| positive(limit, card_id, &format!("{field}.cappingLimit")))
        .transpose()?;

    let quarter_active = match raw.quarter_active {
        Some(quarters) if quarters.is_empty() => {
            return Err(CardDataValidationError::invalid_value(card_id, &format!("{field}.quarterActive"), "no active quarters"));
        }
        Some(mut quarters) => {
            quarters.sort();
            quarters.dedup();
            Some(quarters)
        }
        None => None
    };

    let condition_categories = raw.conditions.iter().filter_map(|condition| match condition {
        Condition::MinimumCategorySpend { category_id, .. } => Some(category_id),
        _ => None
    });

    if let Some(unknown) = category_id.iter().chain(condition_categories).find(|category| !taxonomy.contains(*category)) {
        return Ok(Err(UnknownCategoryReferenceError {
            card_id: card_id.to_string(),
            rule_position: position,
            category_id: unknown.clone()
        }));
    }

    Ok(Ok(AcceleratedRewardRule {
        position,
        category_id,
        merchant_patterns,
        reward_rate,
        capping_limit,
        capping_period: raw.capping_period,
        quarter_active,
        conditions: raw.conditions
    }))
}

fn validate_signup_bonus(card_id: &str, raw: RawSignupBonus) -> Result<SignupBonus, CardDataValidationError> {
    Ok(SignupBonus {
        value: non_negative(required(raw.value, card_id, "signupBonus.value")?, card_id, "signupBonus.value")?,
        minimum_spend: raw.minimum_spend
            .map(|spend| non_negative(spend, card_id, "signupBonus.minimumSpend"))
            .transpose()?,
        within_months: raw.within_months.filter(|months| *months > 0)
    })
}

fn required<T>(value: Option<T>, card_id: &str, field: &str) -> Result<T, CardDataValidationError> {
    value.ok_or_else(|| CardDataValidationError::missing_field(card_id, field))
}

fn required_text(value: Option<String>, card_id: &str, field: &str) -> Result<String, CardDataValidationError> {
    value.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| CardDataValidationError::missing_field(card_id, field))
}

fn non_negative(value: Decimal, card_id: &str, field: &str) -> Result<Decimal, CardDataValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CardDataValidationError::invalid_value(card_id, field, format!("{value} is negative")));
    }

    Ok(value)
}

fn positive(value: Decimal, card_id: &str, field: &str) -> Result<Decimal, CardDataValidationError> {
    if value <= Decimal::ZERO {
        return Err(CardDataValidationError::invalid_value(card_id, field, format!("{value} must be greater than zero")));
    }

    Ok(value)
}
