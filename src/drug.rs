//! Drug information: entity extraction, RxNorm normalization, backfill and
//! pricing
//!
//! The medical entity recognizer and the price source are external services
//! and sit behind [`DrugEntityExtractor`] and [`PriceLookup`].

mod backfill;
mod extraction;
mod pricing;

pub use backfill::{normalize_drug_name, DrugDetails};
#[allow(unused_imports)] // Public API re-exports
pub use extraction::{
    AlternativeDrug, AttributeType, DrugExtraction, DrugType, EntityAttribute, MedicalEntity,
    RxNormConcept,
};
pub use pricing::{PriceLookup, StubPriceLookup};
#[allow(unused_imports)] // Public API re-exports
pub use pricing::PriceError;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no medical entity extractor configured")]
    Unavailable,
}

/// Recognizes medication entities (with RxNorm concepts) in free text
#[async_trait]
pub trait DrugEntityExtractor: Send + Sync {
    async fn extract_entities(&self, text: &str) -> Result<Vec<MedicalEntity>, ExtractionError>;
}

/// Extractor used when no recognizer is configured; every call fails and
/// callers carry on with the details they already have
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableExtractor;

#[async_trait]
impl DrugEntityExtractor for UnavailableExtractor {
    async fn extract_entities(&self, _text: &str) -> Result<Vec<MedicalEntity>, ExtractionError> {
        Err(ExtractionError::Unavailable)
    }
}

/// Run the extractor over `text` and summarize the result.
///
/// Blank text skips the call. On failure the error is returned alongside an
/// empty extraction so callers can keep going.
pub async fn extract_drug_information(
    extractor: &dyn DrugEntityExtractor,
    text: &str,
) -> (DrugExtraction, Option<ExtractionError>) {
    if text.trim().is_empty() {
        return (DrugExtraction::from_entities(&[], text), None);
    }
    match extractor.extract_entities(text).await {
        Ok(entities) => (DrugExtraction::from_entities(&entities, text), None),
        Err(e) => (DrugExtraction::from_entities(&[], text), Some(e)),
    }
}
