mod ingest;
#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{CategorySpend, InsufficientDataError, MerchantSpend, SpendingProfile, Transaction};
use crate::types::{round_currency, CategoryId, MAX_TRANSACTION_AMOUNT, MONTHS_PER_YEAR, UNCATEGORIZED};

pub use ingest::{read_transactions, read_transactions_from};

const TOP_MERCHANT_LIMIT: usize = 5;

#[derive(Default)]
struct MerchantTally {
    name: String,
    net: Decimal,
    debit_count: u32
}

#[derive(Default)]
struct CategoryTally {
    net: Decimal,
    debit_count: u32,
    merchants: BTreeMap<String, MerchantTally>
}

/// Reduces categorized transactions into a `SpendingProfile`.
///
/// Zero amounts are ignored. Credits are netted against their category (floored at zero) and
/// never counted as transactions.
#[derive(Debug, Clone, Default)]
pub struct SpendingAggregator {
    attestations: BTreeSet<String>
}

impl SpendingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Facts about the user that satisfy non-spend reward conditions, e.g. `amazon_prime`.
    pub fn with_attestations<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.attestations.extend(flags.into_iter().map(|flag| flag.as_ref().trim().to_ascii_lowercase()));
        self
    }

    pub fn aggregate(&self, transactions: &[Transaction]) -> Result<SpendingProfile, InsufficientDataError> {
        if transactions.is_empty() {
            return Err(InsufficientDataError::NoTransactions);
        }

        let considered: Vec<&Transaction> = transactions.iter()
            .filter(|transaction| !transaction.amount.is_zero())
            .collect();

        if let Some(transaction) = considered.iter().find(|transaction| transaction.amount.abs() > MAX_TRANSACTION_AMOUNT) {
            return Err(InsufficientDataError::AmountOutOfRange { date: transaction.date, amount: transaction.amount });
        }

        let (Some(period_start), Some(period_end)) = (
            considered.iter().map(|transaction| transaction.date).min(),
            considered.iter().map(|transaction| transaction.date).max()
        ) else {
            return Err(InsufficientDataError::NoSpend { total: Decimal::ZERO });
        };

        let months_spanned = months_between(period_start, period_end);
        let mut tallies: BTreeMap<CategoryId, CategoryTally> = BTreeMap::new();
        let mut monthly_totals: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut net_total = Decimal::ZERO;

        for transaction in &considered {
            let category = transaction.resolved_category().unwrap_or(UNCATEGORIZED);
            let tally = tallies.entry(category.to_string()).or_default();
            let is_debit = transaction.amount.is_sign_positive();

            tally.net = checked_sum(tally.net, transaction.amount)?;
            net_total = checked_sum(net_total, transaction.amount)?;

            if is_debit {
                tally.debit_count += 1;
            }

            if let Some(merchant) = transaction.merchant.as_deref().map(str::trim).filter(|merchant| !merchant.is_empty()) {
                let merchant_tally = tally.merchants.entry(merchant.to_lowercase())
                    .or_insert_with(|| MerchantTally { name: merchant.to_string(), ..MerchantTally::default() });

                merchant_tally.net = checked_sum(merchant_tally.net, transaction.amount)?;

                if is_debit {
                    merchant_tally.debit_count += 1;
                }
            }

            let monthly_total = monthly_totals.entry(transaction.date.format("%Y-%m").to_string()).or_default();
            *monthly_total = checked_sum(*monthly_total, transaction.amount)?;
        }

        let categories: BTreeMap<CategoryId, CategorySpend> = tallies.into_iter()
            .filter(|(_, tally)| tally.debit_count > 0)
            .map(|(category_id, tally)| {
                let spend = summarize_category(category_id.clone(), tally, months_spanned)?;
                Ok((category_id, spend))
            })
            .collect::<Result<_, InsufficientDataError>>()?;

        let total_spent = categories.values()
            .try_fold(Decimal::ZERO, |total, category| checked_sum(total, category.total_spent))?;
        let annualized_spend = categories.values()
            .try_fold(Decimal::ZERO, |total, category| checked_sum(total, category.annualized_spend))?;

        if total_spent <= Decimal::ZERO {
            return Err(InsufficientDataError::NoSpend { total: net_total });
        }

        let profile = SpendingProfile {
            annualized_spend,
            transaction_count: categories.values().map(|category| category.transaction_count).sum(),
            categories,
            total_spent,
            months_spanned,
            period_start,
            period_end,
            monthly_totals,
            attestations: self.attestations.clone()
        };

        debug!(
            "Aggregated {} transactions into {} categories over {} month(s), total spend {}",
            transactions.len(), profile.categories.len(), months_spanned, profile.total_spent
        );

        Ok(profile)
    }
}

fn summarize_category(category_id: CategoryId, tally: CategoryTally, months_spanned: u32) -> Result<CategorySpend, InsufficientDataError> {
    let total_spent = tally.net.max(Decimal::ZERO);
    let months = Decimal::from(months_spanned);

    let merchant_names = tally.merchants.keys().cloned().collect();

    let mut top_merchants: Vec<MerchantSpend> = tally.merchants.into_values()
        .filter(|merchant| merchant.net > Decimal::ZERO)
        .map(|merchant| MerchantSpend {
            name: merchant.name,
            total_spent: merchant.net,
            transaction_count: merchant.debit_count
        })
        .collect();

    top_merchants.sort_by(|left, right| {
        right.total_spent.cmp(&left.total_spent).then_with(|| left.name.cmp(&right.name))
    });
    top_merchants.truncate(TOP_MERCHANT_LIMIT);

    let yearly = total_spent.checked_mul(Decimal::from(MONTHS_PER_YEAR))
        .ok_or(InsufficientDataError::Overflow)?;

    Ok(CategorySpend {
        category_id,
        total_spent,
        transaction_count: tally.debit_count,
        monthly_average: round_currency(total_spent / months),
        annualized_spend: round_currency(yearly / months),
        top_merchants,
        merchant_names
    })
}

fn checked_sum(total: Decimal, amount: Decimal) -> Result<Decimal, InsufficientDataError> {
    total.checked_add(amount).ok_or(InsufficientDataError::Overflow)
}

/// Calendar months from `start` to `end`, both inclusive. Never less than one.
fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let start_index = start.year() * 12 + start.month0() as i32;
    let end_index = end.year() * 12 + end.month0() as i32;

    u32::try_from(end_index - start_index + 1).unwrap_or(1).max(1)
}
