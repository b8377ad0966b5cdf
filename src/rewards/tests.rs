use super::RewardEvaluator;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::aggregator::SpendingAggregator;
use crate::models::{
    AcceleratedRewardRule, CappingPeriod, CardCatalogEntry, Condition, EligibilityRequirements, FeeStructure,
    InactiveReason, RewardStructure, RewardType, SpendingProfile, Transaction
};
use crate::types::{Quarter, UNCATEGORIZED};

fn card(base_reward_rate: Decimal, accelerated_rules: Vec<AcceleratedRewardRule>) -> CardCatalogEntry {
    CardCatalogEntry {
        id: "test-card".to_string(),
        name: "Test Card".to_string(),
        issuer: "Test Bank".to_string(),
        network: "visa".to_string(),
        is_business: false,
        popularity: 50,
        fee_structure: FeeStructure { joining_fee: Decimal::ZERO, annual_fee: Decimal::ZERO, annual_fee_waiver_spend: None },
        eligibility: EligibilityRequirements::default(),
        reward_structure: RewardStructure { reward_type: RewardType::Cashback, base_reward_rate, accelerated_rules },
        signup_bonus: None
    }
}

fn category_rule(position: usize, category_id: &str, reward_rate: Decimal) -> AcceleratedRewardRule {
    AcceleratedRewardRule {
        position,
        category_id: Some(category_id.to_string()),
        merchant_patterns: Vec::new(),
        reward_rate,
        capping_limit: None,
        capping_period: None,
        quarter_active: None,
        conditions: Vec::new()
    }
}

fn merchant_rule(position: usize, pattern: &str, reward_rate: Decimal) -> AcceleratedRewardRule {
    AcceleratedRewardRule {
        category_id: None,
        merchant_patterns: vec![pattern.to_string()],
        ..category_rule(position, "", reward_rate)
    }
}

/// A profile covering exactly one year, so annualized spend equals the amounts given.
fn yearly_profile(spend: &[(Option<&str>, &str, Decimal)]) -> Result<SpendingProfile> {
    let january = NaiveDate::from_ymd_opt(2025, 1, 1).ok_or_else(|| anyhow!("invalid date"))?;
    let december = NaiveDate::from_ymd_opt(2025, 12, 31).ok_or_else(|| anyhow!("invalid date"))?;
    let mut transactions = Vec::new();

    for (category, merchant, amount) in spend {
        let half = *amount / dec!(2);
        transactions.push(Transaction::new(january, half, *category).with_merchant(merchant));
        transactions.push(Transaction::new(december, half, *category).with_merchant(merchant));
    }

    Ok(SpendingAggregator::new().aggregate(&transactions)?)
}

fn earned(evaluation: &crate::models::RewardEvaluation, category_id: &str) -> Result<Decimal> {
    evaluation.category(category_id)
        .map(|reward| reward.earned_value)
        .ok_or_else(|| anyhow!("{category_id} missing from evaluation"))
}

#[test]
fn test_evaluate_applies_category_rule_and_base_rate() -> Result<()> {
    let profile = yearly_profile(&[(Some("dining"), "Swiggy", dec!(50000)), (Some("grocery"), "DMart", dec!(30000))])?;
    let card = card(dec!(1), vec![category_rule(0, "dining", dec!(3))]);

    let evaluation = RewardEvaluator::new(Quarter::Q3).evaluate(&card, &profile);

    assert_eq!(earned(&evaluation, "dining")?, dec!(1500));
    assert_eq!(earned(&evaluation, "grocery")?, dec!(300));
    assert_eq!(evaluation.annual_earnings, dec!(1800));
    assert_eq!(evaluation.annual_spend, dec!(80000));
    assert_eq!(evaluation.category("grocery").and_then(|reward| reward.applied_rule.as_ref()), None);

    Ok(())
}

#[test]
fn test_evaluate_caps_accelerated_spend() -> Result<()> {
    let profile = yearly_profile(&[(Some("travel"), "IndiGo", dec!(200000))])?;

    let mut capped = category_rule(0, "travel", dec!(5));
    capped.capping_limit = Some(dec!(150000));
    capped.capping_period = Some(CappingPeriod::Yearly);

    let evaluation = RewardEvaluator::new(Quarter::Q1).evaluate(&card(dec!(1), vec![capped]), &profile);
    let travel = evaluation.category("travel").ok_or_else(|| anyhow!("travel missing"))?;

    assert_eq!(travel.earned_value, dec!(8000));
    assert_eq!(travel.capped_amount_excluded, dec!(50000));
    assert_eq!(travel.card_rate, dec!(5));

    Ok(())
}

#[test]
fn test_evaluate_scales_monthly_cap_to_a_year() -> Result<()> {
    let profile = yearly_profile(&[(Some("fuel"), "HPCL", dec!(120000))])?;

    let mut capped = category_rule(0, "fuel", dec!(4));
    capped.capping_limit = Some(dec!(5000));
    capped.capping_period = Some(CappingPeriod::Monthly);

    let evaluation = RewardEvaluator::new(Quarter::Q1).evaluate(&card(dec!(1), vec![capped]), &profile);

    //NOTE: 60000 at 4% plus 60000 at 1%
    assert_eq!(earned(&evaluation, "fuel")?, dec!(3000));

    Ok(())
}

#[test]
fn test_evaluate_gates_rotating_rules_by_quarter() -> Result<()> {
    let profile = yearly_profile(&[(Some("grocery"), "DMart", dec!(40000))])?;

    let mut rotating = category_rule(0, "grocery", dec!(5));
    rotating.quarter_active = Some(vec![Quarter::Q1, Quarter::Q2]);
    let card = card(dec!(1), vec![rotating]);

    let in_season = RewardEvaluator::new(Quarter::Q2).evaluate(&card, &profile);
    let off_season = RewardEvaluator::new(Quarter::Q3).evaluate(&card, &profile);

    assert_eq!(earned(&in_season, "grocery")?, dec!(2000));
    assert!(in_season.inactive_rules.is_empty());

    assert_eq!(earned(&off_season, "grocery")?, dec!(400));
    assert_eq!(off_season.inactive_rules.len(), 1);
    assert_eq!(
        off_season.inactive_rules[0].reason,
        InactiveReason::OutOfQuarter { active_quarters: vec![Quarter::Q1, Quarter::Q2], evaluated: Quarter::Q3 }
    );

    Ok(())
}

#[test]
fn test_evaluate_first_quarter_rule_earns_base_rest_of_year() -> Result<()> {
    let profile = yearly_profile(&[(Some("grocery"), "DMart", dec!(40000))])?;

    let mut first_quarter = category_rule(0, "grocery", dec!(5));
    first_quarter.quarter_active = Some(vec![Quarter::Q1]);
    let card = card(dec!(1), vec![first_quarter]);

    assert_eq!(earned(&RewardEvaluator::new(Quarter::Q1).evaluate(&card, &profile), "grocery")?, dec!(2000));

    for quarter in [Quarter::Q2, Quarter::Q3, Quarter::Q4] {
        let evaluation = RewardEvaluator::new(quarter).evaluate(&card, &profile);

        assert_eq!(earned(&evaluation, "grocery")?, dec!(400), "quarter: {quarter:?}");
        assert_eq!(evaluation.inactive_rules.len(), 1, "quarter: {quarter:?}");
    }

    Ok(())
}

#[test]
fn test_evaluate_reports_unmet_conditions() -> Result<()> {
    let profile = yearly_profile(&[(Some("shopping"), "Amazon", dec!(24000))])?;

    let mut conditional = category_rule(0, "shopping", dec!(5));
    conditional.conditions = vec![Condition::Attestation {
        flag: "amazon_prime".to_string(),
        description: Some("an Amazon Prime membership".to_string())
    }];
    let card = card(dec!(1), vec![conditional]);

    let evaluation = RewardEvaluator::new(Quarter::Q4).evaluate(&card, &profile);

    assert_eq!(earned(&evaluation, "shopping")?, dec!(240));
    assert_eq!(
        evaluation.inactive_rules[0].reason,
        InactiveReason::ConditionUnmet { condition: "an Amazon Prime membership".to_string() }
    );

    let mut attested = profile.clone();
    attested.attestations.insert("amazon_prime".to_string());

    assert_eq!(earned(&RewardEvaluator::new(Quarter::Q4).evaluate(&card, &attested), "shopping")?, dec!(1200));

    Ok(())
}

#[test]
fn test_merchant_rules_take_precedence_over_category_rules() -> Result<()> {
    let profile = yearly_profile(&[
        (Some("grocery"), "BigBasket Online", dec!(10000)),
        (Some("dining"), "Zomato", dec!(10000)),
    ])?;

    let card = card(dec!(1), vec![
        category_rule(0, "grocery", dec!(5)),
        merchant_rule(1, "bigbasket", dec!(3)),
        category_rule(2, "dining", dec!(2)),
        category_rule(3, "dining", dec!(4)),
    ]);

    let evaluation = RewardEvaluator::new(Quarter::Q1).evaluate(&card, &profile);
    let grocery = evaluation.category("grocery").and_then(|reward| reward.applied_rule.clone())
        .ok_or_else(|| anyhow!("grocery rule missing"))?;
    let dining = evaluation.category("dining").and_then(|reward| reward.applied_rule.clone())
        .ok_or_else(|| anyhow!("dining rule missing"))?;

    assert_eq!(grocery.position, 1);
    assert!(grocery.merchant_specific);
    assert_eq!(earned(&evaluation, "grocery")?, dec!(300));

    assert_eq!(dining.position, 3);
    assert!(!dining.merchant_specific);

    Ok(())
}

#[test]
fn test_equal_rates_fall_back_to_catalog_order() -> Result<()> {
    let profile = yearly_profile(&[(Some("dining"), "Zomato", dec!(10000))])?;
    let card = card(dec!(1), vec![category_rule(0, "dining", dec!(4)), category_rule(1, "dining", dec!(4))]);

    let evaluation = RewardEvaluator::new(Quarter::Q1).evaluate(&card, &profile);
    let applied = evaluation.category("dining").and_then(|reward| reward.applied_rule.as_ref()).map(|rule| rule.position);

    assert_eq!(applied, Some(0));

    Ok(())
}

#[test]
fn test_uncategorized_spend_only_matches_merchant_rules() -> Result<()> {
    let profile = yearly_profile(&[(None, "Amazon Pay", dec!(10000))])?;

    let by_category = card(dec!(1), vec![category_rule(0, UNCATEGORIZED, dec!(10))]);
    let by_merchant = card(dec!(1), vec![merchant_rule(0, "amazon", dec!(5))]);

    assert_eq!(earned(&RewardEvaluator::new(Quarter::Q1).evaluate(&by_category, &profile), UNCATEGORIZED)?, dec!(100));
    assert_eq!(earned(&RewardEvaluator::new(Quarter::Q1).evaluate(&by_merchant, &profile), UNCATEGORIZED)?, dec!(500));

    Ok(())
}

#[test]
fn test_earnings_never_decrease_as_rule_rate_rises() -> Result<()> {
    let profile = yearly_profile(&[(Some("dining"), "Zomato", dec!(36000)), (Some("fuel"), "HPCL", dec!(12000))])?;
    let evaluator = RewardEvaluator::new(Quarter::Q1);
    let mut previous = Decimal::MIN;

    for tenths in 0..=100 {
        let mut rule = category_rule(0, "dining", Decimal::new(tenths, 1));
        rule.capping_limit = Some(dec!(2000));
        rule.capping_period = Some(CappingPeriod::Monthly);

        let earnings = evaluator.evaluate(&card(dec!(1.5), vec![rule]), &profile).annual_earnings;

        assert!(earnings >= previous, "earnings fell to {earnings} at rate {tenths}/10");
        previous = earnings;
    }

    Ok(())
}

#[test]
fn test_points_are_valued_at_conversion_rate() -> Result<()> {
    let profile = yearly_profile(&[(Some("travel"), "IndiGo", dec!(100000))])?;

    let mut points = card(dec!(2), vec![category_rule(0, "travel", dec!(10))]);
    points.reward_structure.reward_type = RewardType::Points {
        conversion_rate: dec!(0.25),
        alternate_conversion_rate: Some(dec!(0.75))
    };

    let evaluation = RewardEvaluator::new(Quarter::Q1).evaluate(&points, &profile);

    //NOTE: 10000 points
    assert_eq!(evaluation.annual_earnings, dec!(2500));
    assert_eq!(evaluation.alternate_annual_earnings, Some(dec!(7500)));
    assert_eq!(evaluation.category("travel").and_then(|reward| reward.alternate_earned_value), Some(dec!(7500)));

    Ok(())
}

#[test]
fn test_baseline_uses_current_reward_rate() -> Result<()> {
    let profile = yearly_profile(&[(Some("dining"), "Zomato", dec!(60000))])?;
    let evaluator = RewardEvaluator::new(Quarter::Q1).with_current_reward_rate(dec!(0.5));

    let evaluation = evaluator.evaluate(&card(dec!(1), Vec::new()), &profile);

    assert_eq!(evaluation.baseline_earnings, dec!(300));
    assert_eq!(evaluation.categories[0].current_rate, dec!(0.5));

    let negative = RewardEvaluator::new(Quarter::Q1).with_current_reward_rate(dec!(-2));
    assert_eq!(negative.evaluate(&card(dec!(1), Vec::new()), &profile).baseline_earnings, Decimal::ZERO);

    Ok(())
}

#[test]
fn test_rule_below_base_rate_never_lowers_earnings() -> Result<()> {
    let profile = yearly_profile(&[(Some("fuel"), "HPCL", dec!(10000))])?;
    let evaluation = RewardEvaluator::new(Quarter::Q1).evaluate(&card(dec!(2), vec![category_rule(0, "fuel", dec!(1))]), &profile);

    assert_eq!(earned(&evaluation, "fuel")?, dec!(200));

    Ok(())
}
