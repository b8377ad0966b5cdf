use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{CategoryId, UNCATEGORIZED, MONTHS_PER_YEAR};

/// Spend at one merchant within a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantSpend {
    pub name: String,
    pub total_spent: Decimal,
    pub transaction_count: u32
}

/// Aggregated spend for a single category over the profile period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category_id: CategoryId,
    /// Net spend over the observed period (refunds netted, floored at zero).
    pub total_spent: Decimal,
    pub transaction_count: u32,
    pub monthly_average: Decimal,
    /// Spend projected over twelve months. All reward math runs on this figure.
    pub annualized_spend: Decimal,
    pub top_merchants: Vec<MerchantSpend>,
    /// Every merchant seen in the category, lowercased, for pattern matching.
    pub merchant_names: BTreeSet<String>
}

impl CategorySpend {
    pub fn is_uncategorized(&self) -> bool {
        self.category_id == UNCATEGORIZED
    }
}

/// Immutable aggregate of a user's spending, built once per request by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingProfile {
    pub categories: BTreeMap<CategoryId, CategorySpend>,
    pub total_spent: Decimal,
    pub annualized_spend: Decimal,
    pub transaction_count: u32,
    pub months_spanned: u32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Net spend per calendar month, keyed `YYYY-MM`.
    pub monthly_totals: BTreeMap<String, Decimal>,
    /// Facts the caller vouches for that spend data cannot show (e.g. `amazon_prime`).
    pub attestations: BTreeSet<String>
}

impl SpendingProfile {
    pub fn category(&self, category_id: &str) -> Option<&CategorySpend> {
        self.categories.get(category_id)
    }

    pub fn is_attested(&self, flag: &str) -> bool {
        self.attestations.contains(&flag.to_ascii_lowercase())
    }

    /// Categories that count towards reward alignment (everything but the uncategorized bucket).
    pub fn categorized(&self) -> impl Iterator<Item = &CategorySpend> {
        self.categories.values().filter(|category| !category.is_uncategorized())
    }

    /// The `count` largest categorized buckets by spend, ties broken by category id.
    pub fn top_categories(&self, count: usize) -> Vec<&CategorySpend> {
        let mut categories: Vec<&CategorySpend> = self.categorized().collect();

        categories.sort_by(|left, right| {
            right.total_spent.cmp(&left.total_spent)
                .then_with(|| left.category_id.cmp(&right.category_id))
        });
        categories.truncate(count);

        categories
    }

    pub fn monthly_spend(&self) -> Decimal {
        self.annualized_spend / Decimal::from(MONTHS_PER_YEAR)
    }
}
