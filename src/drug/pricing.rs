//! Per-dose drug prices

use super::DrugDetails;
use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("no drug name to price")]
    MissingDrugName,
}

#[async_trait]
pub trait PriceLookup: Send + Sync {
    /// Cost in dollars of a single dose
    async fn per_dose_price(&self, details: &DrugDetails) -> Result<f64, PriceError>;
}

/// Stand-in price source until a pricing service is wired up: a random price
/// between $0.50 and $10.00, in whole cents
#[derive(Debug, Default, Clone, Copy)]
pub struct StubPriceLookup;

const MIN_CENTS: u32 = 50;
const MAX_CENTS: u32 = 1000;

#[async_trait]
impl PriceLookup for StubPriceLookup {
    async fn per_dose_price(&self, details: &DrugDetails) -> Result<f64, PriceError> {
        if details
            .drug_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty())
        {
            return Err(PriceError::MissingDrugName);
        }
        let cents = rand::thread_rng().gen_range(MIN_CENTS..=MAX_CENTS);
        Ok(f64::from(cents) / 100.0)
    }
}
