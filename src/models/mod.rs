mod card;
mod criteria;
mod errors;
mod profile;
mod recommendation;
mod transaction;

pub use card::{
    AcceleratedRewardRule, CappingPeriod, CardCatalogEntry, Condition, EligibilityRequirements,
    FeeStructure, RewardStructure, RewardType, SignupBonus
};
pub use criteria::RecommendationCriteria;
pub use errors::{
    CardDataValidationError, EligibilityUnverifiableError, EngineError, InsufficientDataError,
    UnknownCategoryReferenceError
};
pub use profile::{CategorySpend, MerchantSpend, SpendingProfile};
pub use recommendation::{
    AppliedRule, CategoryReward, ConfidenceLevel, Diagnostics, InactiveReason, InactiveRule,
    NearMiss, Recommendation, RecommendationResponse, RecommendationSummary, RewardEvaluation,
    ScoreBreakdown, ScoreFactor
};
pub use transaction::Transaction;
