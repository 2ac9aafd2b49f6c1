//! Beneficiary profiles
//!
//! Profiles are loaded once at startup from a JSON array (camelCase fields).
//! Without a configured file the bundled sample profiles are used.

use crate::drug::normalize_drug_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUNDLED: &str = include_str!("../data/beneficiaries.json");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub drug_name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub rate: Option<String>,
    #[serde(default)]
    pub drug_form: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street_address: Vec<String>,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub zip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryCarePhysician {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    pub beneficiary_key: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub plan_type: String,
    #[serde(default)]
    pub mailing_address: Option<Address>,
    #[serde(default)]
    pub primary_care_physician: Option<PrimaryCarePhysician>,
    #[serde(default)]
    pub medications: Vec<Medication>,
}

impl Beneficiary {
    /// Profile for a key the directory does not know
    pub fn anonymous(beneficiary_key: u64) -> Self {
        Self {
            beneficiary_key,
            ..Self::default()
        }
    }

    pub fn first_name(&self) -> Option<&str> {
        Some(self.first_name.trim()).filter(|n| !n.is_empty())
    }

    pub fn plan_type(&self) -> Option<&str> {
        Some(self.plan_type.trim()).filter(|p| !p.is_empty())
    }

    pub fn city(&self) -> Option<&str> {
        self.mailing_address
            .as_ref()
            .map(|a| a.city.trim())
            .filter(|c| !c.is_empty())
    }

    /// `"City, ST"`, or just the city when no state is on file
    pub fn location(&self) -> Option<String> {
        let address = self.mailing_address.as_ref()?;
        let city = self.city()?;
        let state = address.state.trim();
        Some(if state.is_empty() {
            city.to_string()
        } else {
            format!("{city}, {state}")
        })
    }

    /// Medication on file whose name matches ignoring case and punctuation
    pub fn find_medication(&self, drug_name: &str) -> Option<&Medication> {
        let wanted = normalize_drug_name(drug_name);
        if wanted.is_empty() {
            return None;
        }
        self.medications
            .iter()
            .find(|m| normalize_drug_name(&m.drug_name) == wanted)
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid beneficiary data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Lookup of beneficiary profiles by key
#[derive(Debug, Default)]
pub struct BeneficiaryDirectory {
    by_key: HashMap<u64, Beneficiary>,
}

impl BeneficiaryDirectory {
    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        let profiles: Vec<Beneficiary> = serde_json::from_str(json)?;
        Ok(profiles.into_iter().collect())
    }

    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let json = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let directory = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), profiles = directory.len(), "Loaded beneficiary profiles");
        Ok(directory)
    }

    /// The sample profiles shipped with the service
    pub fn bundled() -> Result<Self, DirectoryError> {
        Self::from_json(BUNDLED)
    }

    pub fn find(&self, beneficiary_key: u64) -> Option<&Beneficiary> {
        self.by_key.get(&beneficiary_key)
    }

    /// Profile for `beneficiary_key`, anonymous when unknown
    pub fn resolve(&self, beneficiary_key: u64) -> Beneficiary {
        self.find(beneficiary_key)
            .cloned()
            .unwrap_or_else(|| Beneficiary::anonymous(beneficiary_key))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl FromIterator<Beneficiary> for BeneficiaryDirectory {
    fn from_iter<T: IntoIterator<Item = Beneficiary>>(iter: T) -> Self {
        Self {
            by_key: iter.into_iter().map(|b| (b.beneficiary_key, b)).collect(),
        }
    }
}
