mod cancel;
mod recommendation_engine;

pub use cancel::{CancellationHandle, CancellationToken};
pub use recommendation_engine::RecommendationEngine;
