mod cache;
mod errors;
mod raw;
mod validate;

use std::collections::{BTreeSet, HashSet};

use tracing::{info, warn};

use crate::models::{CardCatalogEntry, CardDataValidationError, UnknownCategoryReferenceError};
use crate::types::CategoryId;

pub use cache::{CatalogCache, CatalogSource, FileCatalogSource};
pub use errors::CatalogError;
pub use raw::RawCatalog;

const UNVERSIONED: &str = "unversioned";

/// Validated, immutable view of the card catalog for one request cycle.
///
/// Shared across evaluation workers behind an `Arc`; nothing hands out mutable access.
#[derive(Debug)]
pub struct CatalogSnapshot {
    version: String,
    taxonomy: BTreeSet<CategoryId>,
    cards: Vec<CardCatalogEntry>,
    skipped_cards: Vec<CardDataValidationError>,
    dropped_rules: Vec<UnknownCategoryReferenceError>
}

impl CatalogSnapshot {
    /// Validates a raw catalog. Bad cards are skipped and recorded, never fatal.
    pub fn from_raw(raw: RawCatalog) -> Result<Self, CatalogError> {
        let taxonomy: BTreeSet<CategoryId> = raw.categories
            .ok_or(CatalogError::MissingTaxonomy)?
            .into_iter()
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty())
            .collect();

        let mut cards = Vec::with_capacity(raw.cards.len());
        let mut skipped_cards = Vec::new();
        let mut dropped_rules = Vec::new();
        let mut seen = HashSet::new();

        for value in &raw.cards {
            match validate::validate_card(value, &taxonomy) {
                Ok(validated) => {
                    if !seen.insert(validated.card.id.clone()) {
                        let error = CardDataValidationError::invalid_value(&validated.card.id, "id", "duplicate card id");
                        warn!("{error}; card skipped");
                        skipped_cards.push(error);
                        continue;
                    }

                    dropped_rules.extend(validated.dropped_rules);
                    cards.push(validated.card);
                }
                Err(error) => {
                    warn!("{error}; card skipped");
                    skipped_cards.push(error);
                }
            }
        }

        let snapshot = Self {
            version: raw.version.unwrap_or_else(|| UNVERSIONED.to_string()),
            taxonomy,
            cards,
            skipped_cards,
            dropped_rules
        };

        info!(
            "Catalog [{}] loaded: {} cards usable, {} skipped, {} rules dropped",
            snapshot.version, snapshot.cards.len(), snapshot.skipped_cards.len(), snapshot.dropped_rules.len()
        );

        Ok(snapshot)
    }

    #[cfg(test)]
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Self::from_raw(serde_json::from_str(json)?)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn taxonomy(&self) -> &BTreeSet<CategoryId> {
        &self.taxonomy
    }

    pub fn cards(&self) -> &[CardCatalogEntry] {
        &self.cards
    }

    pub fn card(&self, card_id: &str) -> Option<&CardCatalogEntry> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    pub fn skipped_cards(&self) -> &[CardDataValidationError] {
        &self.skipped_cards
    }

    pub fn dropped_rules(&self) -> &[UnknownCategoryReferenceError] {
        &self.dropped_rules
    }

    /// Aggregate data quality notes, one line per issue class.
    pub fn quality_notes(&self) -> Vec<String> {
        let mut notes = Vec::new();

        if !self.skipped_cards.is_empty() {
            notes.push(format!("{} cards skipped due to invalid reward data", self.skipped_cards.len()));
        }

        if !self.dropped_rules.is_empty() {
            notes.push(format!("{} reward rules ignored due to unknown categories", self.dropped_rules.len()));
        }

        notes
    }
}
