
use tracing::warn;

use crate::models::{CardCatalogEntry, EligibilityUnverifiableError, RecommendationCriteria};

/// Outcome of checking a card's hard eligibility constraints against what the user told us.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EligibilityAssessment {
    /// Constraints the user demonstrably fails, phrased for display.
    pub failures: Vec<String>,
    /// Constraints we had no user data for.
    pub unverifiable: Vec<EligibilityUnverifiableError>,
    pub verified_constraints: usize,
    pub total_constraints: usize
}

impl EligibilityAssessment {
    pub fn is_eligible(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_fully_verified(&self) -> bool {
        self.unverifiable.is_empty()
    }

    /// Share of the card's constraints that could be evaluated, 1.0 when it has none.
    pub fn certainty(&self) -> f64 {
        if self.total_constraints == 0 {
            return 1.0;
        }

        self.verified_constraints as f64 / self.total_constraints as f64
    }
}

pub fn assess(card: &CardCatalogEntry, criteria: &RecommendationCriteria) -> EligibilityAssessment {
    let requirements = &card.eligibility;
    let mut assessment = EligibilityAssessment {
        total_constraints: requirements.constraint_count(),
        ..EligibilityAssessment::default()
    };

    if let Some(required) = requirements.min_credit_score {
        match criteria.credit_score {
            Some(score) => {
                assessment.verified_constraints += 1;

                if score < required {
                    assessment.failures.push(format!("Requires a credit score of {required}; yours is {score}"));
                }
            }
            None => assessment.unverifiable.push(EligibilityUnverifiableError::CreditScore {
                card_id: card.id.clone(),
                required
            })
        }
    }

    if let Some(required) = requirements.min_income {
        match criteria.annual_income {
            Some(income) => {
                assessment.verified_constraints += 1;

                if income < required {
                    assessment.failures.push(format!("Requires an annual income of {required}; yours is {income}"));
                }
            }
            None => assessment.unverifiable.push(EligibilityUnverifiableError::Income {
                card_id: card.id.clone(),
                required
            })
        }
    }

    for unverifiable in &assessment.unverifiable {
        warn!("{unverifiable}");
    }

    assessment
}
