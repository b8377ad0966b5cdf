//! Scoring model constants. Sub-score weights add up to 100.

pub const FIRST_YEAR_VALUE_WEIGHT: f64 = 35.0;
pub const CATEGORY_ALIGNMENT_WEIGHT: f64 = 25.0;
pub const FEE_EFFICIENCY_WEIGHT: f64 = 20.0;
pub const BRAND_PREFERENCE_WEIGHT: f64 = 10.0;
pub const ACCESSIBILITY_WEIGHT: f64 = 10.0;

pub const LIFETIME_FREE_BONUS: f64 = 5.0;
pub const FEE_WAIVER_BONUS: f64 = 3.0;
pub const SIGNUP_BONUS_BONUS: f64 = 2.0;

pub const UNVERIFIABLE_ELIGIBILITY_PENALTY: f64 = 5.0;
pub const NEGATIVE_VALUE_PENALTY: f64 = 10.0;
pub const INELIGIBLE_PENALTY: f64 = 15.0;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// How many of the user's largest categories count for alignment.
pub const TOP_CATEGORY_COUNT: usize = 3;
/// Breakeven at or beyond this many months earns no fee efficiency.
pub const BREAKEVEN_HORIZON_MONTHS: f64 = 12.0;

pub const CREDIT_SCORE_FLOOR: f64 = 300.0;
pub const CREDIT_SCORE_CEILING: f64 = 900.0;
/// Minimum income at which a card counts as fully inaccessible.
pub const INCOME_ACCESSIBILITY_CEILING: f64 = 2_500_000.0;
