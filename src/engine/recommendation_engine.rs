use std::future::pending;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant as DeadlineInstant};
use tracing::{debug, info, warn};

use crate::aggregator::SpendingAggregator;
use crate::catalog::CatalogSnapshot;
use crate::config::EngineConfig;
use crate::eligibility::{self, EligibilityAssessment};
use crate::engine::CancellationToken;
use crate::explain::ExplanationGenerator;
use crate::models::{
    CardCatalogEntry, ConfidenceLevel, Diagnostics, EngineError, Recommendation, RecommendationCriteria,
    RecommendationResponse, RecommendationSummary, RewardEvaluation, SpendingProfile, Transaction
};
use crate::ranking::{RankedCard, RecommendationRanker, ScoredCard};
use crate::rewards::RewardEvaluator;
use crate::scoring::{CardEconomics, PartialScore, ScoreCalculator, ValueRange};
use crate::types::Quarter;

/// Per-card output of an evaluation worker, before catalog-wide normalization.
struct CardOutcome {
    index: usize,
    evaluation: RewardEvaluation,
    economics: CardEconomics,
    eligibility: EligibilityAssessment,
    partial: PartialScore
}

/// Runs the full pipeline: aggregate, evaluate every card on a bounded worker pool, normalize,
/// rank and explain.
pub struct RecommendationEngine {
    config: EngineConfig
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Aggregates the transactions with the configured attestations, then recommends.
    pub async fn recommend(
        &self,
        transactions: &[Transaction],
        catalog: Arc<CatalogSnapshot>,
        criteria: &RecommendationCriteria,
        cancellation: CancellationToken
    ) -> Result<RecommendationResponse, EngineError> {
        let aggregator = SpendingAggregator::new().with_attestations(&self.config.attestations);
        let profile = aggregator.aggregate(transactions)?;

        self.recommend_for_profile(Arc::new(profile), catalog, criteria, cancellation).await
    }

    /// Recommends against an already aggregated profile.
    ///
    /// Either the whole response is produced or the call fails; a cancel or an expired deadline
    /// aborts every in-flight evaluation and returns `EngineError::Timeout`.
    pub async fn recommend_for_profile(
        &self,
        profile: Arc<SpendingProfile>,
        catalog: Arc<CatalogSnapshot>,
        criteria: &RecommendationCriteria,
        cancellation: CancellationToken
    ) -> Result<RecommendationResponse, EngineError> {
        let timer = Instant::now();
        let deadline = self.config.deadline.map(|deadline| DeadlineInstant::now() + deadline);
        let evaluation_date = self.config.evaluation_date.unwrap_or_else(|| Utc::now().date_naive());
        let evaluator = RewardEvaluator::new(Quarter::from_date(evaluation_date))
            .with_current_reward_rate(criteria.current_reward_rate);

        debug!(
            "Evaluating {} cards in {} with {} workers",
            catalog.cards().len(), evaluator.quarter(), self.config.worker_count
        );

        //NOTE: Dropping the evaluation future drops its JoinSet, which aborts every worker still running
        let outcomes = tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                warn!("Recommendation cancelled after {:?}", timer.elapsed());
                return Err(timeout(timer));
            }
            _ = wait_until(deadline) => {
                warn!("Recommendation deadline of {:?} exceeded", self.config.deadline.unwrap_or_default());
                return Err(timeout(timer));
            }
            result = self.evaluate_catalog(profile.clone(), catalog.clone(), Arc::new(criteria.clone()), evaluator) => result?
        };

        let range = ValueRange::from_values(outcomes.iter().map(|outcome| outcome.partial.first_year_value()));

        let scored: Vec<ScoredCard<'_>> = outcomes.into_iter()
            .map(|outcome| ScoredCard {
                card: &catalog.cards()[outcome.index],
                evaluation: outcome.evaluation,
                economics: outcome.economics,
                eligibility: outcome.eligibility,
                breakdown: outcome.partial.finalize(&range)
            })
            .collect();

        let cards_evaluated = scored.len();
        let unverifiable_eligibility: Vec<String> = scored.iter()
            .flat_map(|scored| scored.eligibility.unverifiable.iter().map(ToString::to_string))
            .collect();

        let ranking = RecommendationRanker::new(self.config.max_results).rank(scored, criteria);

        let recommendations: Vec<Recommendation> = ranking.ranked.iter()
            .map(|ranked| build_recommendation(ranked, &profile))
            .collect();

        let diagnostics = build_diagnostics(&catalog, cards_evaluated, unverifiable_eligibility);
        let summary = summarize(&recommendations, &profile);
        let processing_time = timer.elapsed();

        info!(
            "Recommended {} of {} cards ({} near misses) in {processing_time:?}",
            recommendations.len(), cards_evaluated, ranking.near_misses.len()
        );

        Ok(RecommendationResponse {
            recommendations,
            near_misses: ranking.near_misses,
            summary,
            diagnostics,
            processing_time_ms: elapsed_ms(processing_time),
            generated_at: Utc::now()
        })
    }

    async fn evaluate_catalog(
        &self,
        profile: Arc<SpendingProfile>,
        catalog: Arc<CatalogSnapshot>,
        criteria: Arc<RecommendationCriteria>,
        evaluator: RewardEvaluator
    ) -> Result<Vec<CardOutcome>, EngineError> {
        let permits = Arc::new(Semaphore::new(self.config.worker_count.max(1)));
        let mut workers = JoinSet::new();

        for index in 0..catalog.cards().len() {
            let permits = permits.clone();
            let profile = profile.clone();
            let catalog = catalog.clone();
            let criteria = criteria.clone();

            workers.spawn(async move {
                let _permit = permits.acquire_owned()
                    .await
                    .map_err(|error| EngineError::Worker(error.to_string()))?;

                Ok::<_, EngineError>(evaluate_card(index, &catalog.cards()[index], &profile, &criteria, evaluator))
            });
        }

        let mut outcomes = Vec::with_capacity(catalog.cards().len());

        while let Some(joined) = workers.join_next().await {
            let outcome = joined.map_err(|error| EngineError::Worker(error.to_string()))??;
            outcomes.push(outcome);
        }

        //NOTE: Workers finish in any order; catalog order keeps every later stage deterministic
        outcomes.sort_by_key(|outcome| outcome.index);

        Ok(outcomes)
    }
}

fn evaluate_card(
    index: usize,
    card: &CardCatalogEntry,
    profile: &SpendingProfile,
    criteria: &RecommendationCriteria,
    evaluator: RewardEvaluator
) -> CardOutcome {
    let evaluation = evaluator.evaluate(card, profile);
    let economics = CardEconomics::derive(card, &evaluation, profile);
    let eligibility = eligibility::assess(card, criteria);
    let partial = ScoreCalculator::score(card, &evaluation, &economics, profile, &eligibility);

    CardOutcome { index, evaluation, economics, eligibility, partial }
}

fn build_recommendation(ranked: &RankedCard<'_>, profile: &SpendingProfile) -> Recommendation {
    let scored = &ranked.scored;
    let explanation = ExplanationGenerator::explain(scored, profile);

    Recommendation {
        card_id: scored.card.id.clone(),
        card_name: scored.card.name.clone(),
        issuer: scored.card.issuer.clone(),
        rank: ranked.rank,
        score: scored.score(),
        score_breakdown: scored.breakdown.clone(),
        annual_savings: scored.economics.annual_savings,
        annual_earnings: scored.economics.annual_earnings,
        alternate_annual_earnings: scored.evaluation.alternate_annual_earnings,
        signup_bonus_value: scored.economics.signup_bonus_value,
        fee_breakeven_months: scored.economics.fee_breakeven_months,
        benefit_breakdown: scored.evaluation.categories.clone(),
        primary_reason: explanation.primary_reason,
        pros: explanation.pros,
        cons: explanation.cons,
        confidence_score: explanation.confidence_score
    }
}

fn summarize(recommendations: &[Recommendation], profile: &SpendingProfile) -> RecommendationSummary {
    let top = recommendations.first();

    let average_score = if recommendations.is_empty() {
        0.0
    } else {
        let total: f64 = recommendations.iter().map(|recommendation| recommendation.score).sum();
        ((total / recommendations.len() as f64) * 100.0).round() / 100.0
    };

    RecommendationSummary {
        top_recommendation: top.map(|recommendation| recommendation.card_id.clone()),
        potential_savings: top.map_or(Decimal::ZERO, |recommendation| recommendation.annual_savings.max(Decimal::ZERO)),
        average_score,
        categories_analyzed: profile.categorized().count(),
        confidence_level: top.map_or(ConfidenceLevel::Low, |recommendation| {
            ConfidenceLevel::from_score(recommendation.confidence_score)
        })
    }
}

fn build_diagnostics(catalog: &CatalogSnapshot, cards_evaluated: usize, unverifiable_eligibility: Vec<String>) -> Diagnostics {
    let mut notes = catalog.quality_notes();

    if cards_evaluated == 0 {
        notes.push("No cards could be evaluated; the catalog has no usable cards".to_string());
    }

    if !unverifiable_eligibility.is_empty() {
        notes.push(format!(
            "{} eligibility constraints could not be verified; provide credit score and income for firmer results",
            unverifiable_eligibility.len()
        ));
    }

    Diagnostics {
        catalog_version: catalog.version().to_string(),
        cards_evaluated,
        skipped_cards: catalog.skipped_cards().iter().map(ToString::to_string).collect(),
        dropped_rules: catalog.dropped_rules().iter().map(ToString::to_string).collect(),
        unverifiable_eligibility,
        notes
    }
}

async fn wait_until(deadline: Option<DeadlineInstant>) {
    match deadline {
        //NOTE: The timer wheel only fires on its next tick, an already expired deadline must win straight away
        Some(deadline) if deadline <= DeadlineInstant::now() => {}
        Some(deadline) => sleep_until(deadline).await,
        None => pending::<()>().await
    }
}

fn timeout(timer: Instant) -> EngineError {
    EngineError::Timeout { elapsed_ms: elapsed_ms(timer.elapsed()) }
}

fn elapsed_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
