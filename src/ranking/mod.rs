
use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::eligibility::EligibilityAssessment;
use crate::models::{CardCatalogEntry, EligibilityUnverifiableError, NearMiss, RecommendationCriteria, RewardEvaluation, ScoreBreakdown};
use crate::scoring::CardEconomics;

const DIVERSE_TOP_SLOTS: usize = 3;

/// A card with everything the evaluation stage derived for it.
#[derive(Debug, Clone)]
pub struct ScoredCard<'a> {
    pub card: &'a CardCatalogEntry,
    pub evaluation: RewardEvaluation,
    pub economics: CardEconomics,
    pub eligibility: EligibilityAssessment,
    pub breakdown: ScoreBreakdown
}

impl ScoredCard<'_> {
    pub fn score(&self) -> f64 {
        self.breakdown.total_score
    }
}

#[derive(Debug, Clone)]
pub struct RankedCard<'a> {
    pub rank: usize,
    pub scored: ScoredCard<'a>
}

#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    pub ranked: Vec<RankedCard<'a>>,
    pub near_misses: Vec<NearMiss>
}

/// Filters, orders and ranks scored cards.
pub struct RecommendationRanker {
    max_results: usize
}

impl RecommendationRanker {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }

    /// Cards failing eligibility or the caller's filters become near misses carrying the reasons.
    /// The rest are sorted by score, savings, then card id, with at most one card per issuer in
    /// the top three when at least three issuers are eligible.
    pub fn rank<'a>(&self, candidates: Vec<ScoredCard<'a>>, criteria: &RecommendationCriteria) -> Ranking<'a> {
        let mut eligible = Vec::with_capacity(candidates.len());
        let mut near_misses = Vec::new();

        for candidate in candidates {
            let mut reasons = candidate.eligibility.failures.clone();
            reasons.extend(criteria_exclusions(&candidate, criteria));

            if reasons.is_empty() {
                eligible.push(candidate);
            } else {
                debug!("Card [{}] moved to near misses: {}", candidate.card.id, reasons.join("; "));
                near_misses.push(NearMiss {
                    card_id: candidate.card.id.clone(),
                    card_name: candidate.card.name.clone(),
                    score: candidate.score(),
                    annual_savings: candidate.economics.annual_savings,
                    cons: reasons
                });
            }
        }

        eligible.sort_by(ranking_order);
        near_misses.sort_by(|left, right| {
            right.score.total_cmp(&left.score).then_with(|| left.card_id.cmp(&right.card_id))
        });

        let mut ordered = apply_issuer_diversity(eligible);
        ordered.truncate(self.max_results);

        let ranked = ordered.into_iter()
            .enumerate()
            .map(|(index, scored)| RankedCard { rank: index + 1, scored })
            .collect();

        Ranking { ranked, near_misses }
    }
}

pub(crate) fn ranking_order(left: &ScoredCard<'_>, right: &ScoredCard<'_>) -> Ordering {
    right.score().total_cmp(&left.score())
        .then_with(|| right.economics.annual_savings.cmp(&left.economics.annual_savings))
        .then_with(|| left.card.id.cmp(&right.card.id))
}

/// Reorders an already sorted list so the top slots hold distinct issuers. Deferred cards keep
/// their relative order after the top slots.
fn apply_issuer_diversity(sorted: Vec<ScoredCard<'_>>) -> Vec<ScoredCard<'_>> {
    let distinct_issuers: HashSet<String> = sorted.iter().map(|scored| issuer_key(scored.card)).collect();

    if distinct_issuers.len() < DIVERSE_TOP_SLOTS {
        return sorted;
    }

    let mut top = Vec::with_capacity(DIVERSE_TOP_SLOTS);
    let mut rest = Vec::with_capacity(sorted.len());
    let mut seen = HashSet::new();

    for scored in sorted {
        if top.len() < DIVERSE_TOP_SLOTS && seen.insert(issuer_key(scored.card)) {
            top.push(scored);
        } else {
            rest.push(scored);
        }
    }

    top.extend(rest);
    top
}

fn issuer_key(card: &CardCatalogEntry) -> String {
    card.issuer.to_lowercase()
}

fn criteria_exclusions(candidate: &ScoredCard<'_>, criteria: &RecommendationCriteria) -> Vec<String> {
    let card = candidate.card;
    let mut reasons = Vec::new();

    if let Some(max_fee) = criteria.max_annual_fee {
        let fee = candidate.economics.effective_annual_fee;

        if fee > max_fee {
            reasons.push(format!("Annual fee of {fee} exceeds your limit of {max_fee}"));
        }
    }

    if let Some(network) = criteria.preferred_network.as_deref().map(str::trim).filter(|network| !network.is_empty()) {
        if !card.network.eq_ignore_ascii_case(network) {
            reasons.push(format!("Issued on {}, not your preferred {network} network", card.network));
        }
    }

    if card.is_business && !criteria.include_business_cards {
        reasons.push("Business card, and business cards were not requested".to_string());
    }

    if criteria.require_verified_eligibility {
        reasons.extend(candidate.eligibility.unverifiable.iter().map(|unverifiable| match unverifiable {
            EligibilityUnverifiableError::CreditScore { required, .. } => {
                format!("Requires a credit score of {required}, which could not be verified")
            }
            EligibilityUnverifiableError::Income { required, .. } => {
                format!("Requires an annual income of {required}, which could not be verified")
            }
        }));
    }

    reasons
}
