use super::{read_transactions, read_transactions_from, SpendingAggregator};

use std::io::Write;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::NamedTempFile;

use crate::models::{InsufficientDataError, Transaction};
use crate::types::{parse_amount, MAX_TRANSACTION_AMOUNT, UNCATEGORIZED};

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| anyhow!("invalid date {year}-{month}-{day}"))
}

#[test]
fn test_aggregate_rejects_empty_input() {
    let result = SpendingAggregator::new().aggregate(&[]);

    assert_eq!(result, Err(InsufficientDataError::NoTransactions));
}

#[test]
fn test_aggregate_rejects_zero_and_credit_only_history() -> Result<()> {
    let zeros = vec![Transaction::new(date(2025, 1, 1)?, Decimal::ZERO, Some("dining"))];
    let credits = vec![
        Transaction::new(date(2025, 1, 1)?, dec!(-100), Some("dining")),
        Transaction::new(date(2025, 1, 2)?, dec!(-50), None),
    ];

    assert_eq!(SpendingAggregator::new().aggregate(&zeros), Err(InsufficientDataError::NoSpend { total: Decimal::ZERO }));
    assert_eq!(SpendingAggregator::new().aggregate(&credits), Err(InsufficientDataError::NoSpend { total: dec!(-150) }));

    Ok(())
}

#[test]
fn test_aggregate_rejects_amounts_beyond_supported_magnitude() -> Result<()> {
    let huge = Decimal::from_str_exact("10000000000000000000000000000")?;
    let transactions = vec![
        Transaction::new(date(2025, 1, 1)?, dec!(500), Some("grocery")),
        Transaction::new(date(2025, 1, 2)?, huge, Some("dining")),
    ];

    let result = SpendingAggregator::new().aggregate(&transactions);

    assert_eq!(result, Err(InsufficientDataError::AmountOutOfRange { date: date(2025, 1, 2)?, amount: huge }));
    assert!(parse_amount("10000000000000000000000000000").is_err());

    Ok(())
}

#[test]
fn test_aggregate_annualizes_amounts_at_the_ceiling() -> Result<()> {
    let transactions: Vec<Transaction> = (1..=28)
        .map(|day| Ok(Transaction::new(date(2025, 2, day)?, MAX_TRANSACTION_AMOUNT, Some("travel"))))
        .collect::<Result<_>>()?;

    let profile = SpendingAggregator::new().aggregate(&transactions)?;

    assert_eq!(profile.total_spent, MAX_TRANSACTION_AMOUNT * dec!(28));
    assert_eq!(profile.annualized_spend, MAX_TRANSACTION_AMOUNT * dec!(336));

    Ok(())
}

#[test]
fn test_read_transactions_skips_oversized_amounts() -> Result<()> {
    let csv = "date,amount,categoryId,mccCode,merchant\n\
               2025-01-05,10000000000000000000000000000,dining,,\n\
               2025-01-06,250.00,dining,,\n";

    let transactions = read_transactions_from(csv.as_bytes())?;

    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].amount, dec!(250.00));

    Ok(())
}

#[test]
fn test_aggregate_annualizes_partial_history() -> Result<()> {
    let transactions = vec![
        Transaction::new(date(2025, 1, 3)?, dec!(1000), Some("dining")),
        Transaction::new(date(2025, 2, 14)?, dec!(2000), Some("dining")),
        Transaction::new(date(2025, 3, 30)?, dec!(3000), Some("grocery")),
    ];

    let profile = SpendingAggregator::new().aggregate(&transactions)?;
    let dining = profile.category("dining").ok_or_else(|| anyhow!("dining missing"))?;

    assert_eq!(profile.months_spanned, 3);
    assert_eq!(profile.period_start, date(2025, 1, 3)?);
    assert_eq!(profile.period_end, date(2025, 3, 30)?);
    assert_eq!(profile.total_spent, dec!(6000));
    assert_eq!(profile.annualized_spend, dec!(24000));
    assert_eq!(profile.transaction_count, 3);

    assert_eq!(dining.total_spent, dec!(3000));
    assert_eq!(dining.transaction_count, 2);
    assert_eq!(dining.monthly_average, dec!(1000));
    assert_eq!(dining.annualized_spend, dec!(12000));

    assert_eq!(profile.monthly_totals.get("2025-02"), Some(&dec!(2000)));

    Ok(())
}

#[test]
fn test_aggregate_counts_months_across_year_boundary() -> Result<()> {
    let transactions = vec![
        Transaction::new(date(2024, 11, 30)?, dec!(700), Some("fuel")),
        Transaction::new(date(2025, 2, 1)?, dec!(500), Some("fuel")),
    ];

    let profile = SpendingAggregator::new().aggregate(&transactions)?;

    assert_eq!(profile.months_spanned, 4);
    assert_eq!(profile.annualized_spend, dec!(3600));

    Ok(())
}

#[test]
fn test_aggregate_nets_refunds_within_category() -> Result<()> {
    let transactions = vec![
        Transaction::new(date(2025, 5, 1)?, dec!(5000), Some("travel")).with_merchant("IndiGo"),
        Transaction::new(date(2025, 5, 20)?, dec!(-2000), Some("travel")).with_merchant("IndiGo"),
        Transaction::new(date(2025, 5, 21)?, dec!(800), Some("dining")),
        Transaction::new(date(2025, 5, 22)?, dec!(-1200), Some("dining")),
        Transaction::new(date(2025, 5, 23)?, dec!(-300), Some("fuel")),
    ];

    let profile = SpendingAggregator::new().aggregate(&transactions)?;
    let travel = profile.category("travel").ok_or_else(|| anyhow!("travel missing"))?;
    let dining = profile.category("dining").ok_or_else(|| anyhow!("dining missing"))?;

    assert_eq!(travel.total_spent, dec!(3000));
    assert_eq!(travel.transaction_count, 1);
    assert_eq!(travel.top_merchants[0].total_spent, dec!(3000));

    //NOTE: Over-refunded categories floor at zero, credit-only ones disappear
    assert_eq!(dining.total_spent, Decimal::ZERO);
    assert!(profile.category("fuel").is_none());
    assert_eq!(profile.total_spent, dec!(3000));

    Ok(())
}

#[test]
fn test_aggregate_buckets_blank_categories_as_uncategorized() -> Result<()> {
    let transactions = vec![
        Transaction::new(date(2025, 6, 1)?, dec!(400), None),
        Transaction::new(date(2025, 6, 2)?, dec!(600), Some("   ")),
        Transaction::new(date(2025, 6, 3)?, dec!(1000), Some("grocery")),
    ];

    let profile = SpendingAggregator::new().aggregate(&transactions)?;
    let uncategorized = profile.category(UNCATEGORIZED).ok_or_else(|| anyhow!("uncategorized missing"))?;

    assert_eq!(uncategorized.total_spent, dec!(1000));
    assert!(uncategorized.is_uncategorized());
    assert_eq!(profile.categorized().count(), 1);

    Ok(())
}

#[test]
fn test_aggregate_ranks_top_merchants() -> Result<()> {
    let mut transactions = Vec::new();

    for (day, merchant, amount) in [
        (1, "Swiggy", dec!(300)),
        (2, "Zomato", dec!(500)),
        (3, "swiggy", dec!(400)),
        (4, "Cafe A", dec!(50)),
        (5, "Cafe B", dec!(60)),
        (6, "Cafe C", dec!(70)),
        (7, "Cafe D", dec!(80)),
    ] {
        transactions.push(Transaction::new(date(2025, 7, day)?, amount, Some("dining")).with_merchant(merchant));
    }

    let profile = SpendingAggregator::new().aggregate(&transactions)?;
    let dining = profile.category("dining").ok_or_else(|| anyhow!("dining missing"))?;
    let names: Vec<&str> = dining.top_merchants.iter().map(|merchant| merchant.name.as_str()).collect();

    assert_eq!(names, vec!["Swiggy", "Zomato", "Cafe D", "Cafe C", "Cafe B"]);
    assert_eq!(dining.top_merchants[0].total_spent, dec!(700));
    assert_eq!(dining.top_merchants[0].transaction_count, 2);
    assert_eq!(dining.merchant_names.len(), 6);
    assert!(dining.merchant_names.contains("swiggy"));

    Ok(())
}

#[test]
fn test_aggregate_normalizes_attestations() -> Result<()> {
    let transactions = vec![Transaction::new(date(2025, 1, 1)?, dec!(100), Some("dining"))];
    let profile = SpendingAggregator::new()
        .with_attestations([" Amazon_Prime ", "SWIGGY_ONE"])
        .aggregate(&transactions)?;

    assert!(profile.is_attested("amazon_prime"));
    assert!(profile.is_attested("Swiggy_One"));
    assert!(!profile.is_attested("hdfc_salary"));

    Ok(())
}

#[test]
fn test_read_transactions_skips_malformed_rows() -> Result<()> {
    let csv = "date,amount,categoryId,mccCode,merchant\n\
               2025-01-05,\"1,200.50\",dining,5812,Swiggy\n\
               not-a-date,100,dining,,\n\
               2025-01-06,₹300.00,,,\n\
               2025-01-07,450.00 CR,travel,4511,IndiGo\n\
               2025-01-08,abc,fuel,,\n";

    let transactions = read_transactions_from(csv.as_bytes())?;

    assert_eq!(transactions.len(), 3);
    assert_eq!(transactions[0].amount, dec!(1200.50));
    assert_eq!(transactions[0].mcc_code.as_deref(), Some("5812"));
    assert_eq!(transactions[0].merchant.as_deref(), Some("Swiggy"));
    assert_eq!(transactions[1].resolved_category(), None);
    assert_eq!(transactions[2].amount, dec!(-450.00));

    Ok(())
}

#[test]
fn test_read_transactions_from_file() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "date,amount,categoryId,mccCode,merchant")?;
    writeln!(file, "2025-03-01,999.99,grocery,5411,BigBasket")?;

    let transactions = read_transactions(file.path())?;

    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].category_id.as_deref(), Some("grocery"));

    assert!(read_transactions(std::path::Path::new("missing-transactions.csv")).is_err());

    Ok(())
}
