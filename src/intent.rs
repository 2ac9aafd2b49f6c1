//! Intent classification
//!
//! An intent is what the user wants done (price a drug, find a provider...).
//! Detection turns the latest user message plus recent history into a
//! [`DetectedIntent`]; [`merge_context`] folds that into what the session has
//! already collected.

mod catalog;
mod detector;
mod keyword;
mod merge;

#[allow(unused_imports)] // Public API re-exports
pub use catalog::{prompt_instructions, suggestions, IntentDef};
#[cfg(test)]
pub use catalog::catalog;
pub use detector::{
    detect_or_unknown, DetectError, DetectedIntent, IntentDetector, LlmIntentDetector,
};
pub use keyword::KeywordIntentDetector;
pub use merge::merge_context;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported intents.
///
/// Deserializing never fails: unrecognised names become [`IntentName::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum IntentName {
    GetSingleDrugPrice,
    GetMultiDrugPrice,
    FindProvider,
    GetPlanInfo,
    Welcome,
    Unknown,
}

impl IntentName {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentName::GetSingleDrugPrice => "GetSingleDrugPrice",
            IntentName::GetMultiDrugPrice => "GetMultiDrugPrice",
            IntentName::FindProvider => "FindProvider",
            IntentName::GetPlanInfo => "GetPlanInfo",
            IntentName::Welcome => "Welcome",
            IntentName::Unknown => "Unknown",
        }
    }

    /// Parse a name as returned by the classifier
    pub fn parse(name: &str) -> IntentName {
        match name.trim() {
            "GetSingleDrugPrice" | "GetDrugPrice" => IntentName::GetSingleDrugPrice,
            "GetMultiDrugPrice" => IntentName::GetMultiDrugPrice,
            "FindProvider" => IntentName::FindProvider,
            "GetPlanInfo" => IntentName::GetPlanInfo,
            "Welcome" => IntentName::Welcome,
            _ => IntentName::Unknown,
        }
    }

    pub fn def(self) -> &'static IntentDef {
        IntentDef::get(self)
    }
}

impl fmt::Display for IntentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(IntentName::parse(s))
    }
}

impl From<String> for IntentName {
    fn from(s: String) -> Self {
        IntentName::parse(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_catalog_name() {
        for def in catalog() {
            assert_eq!(IntentName::parse(def.name.as_str()), def.name);
        }
    }

    #[test]
    fn test_legacy_and_unknown_names() {
        assert_eq!(IntentName::parse("GetDrugPrice"), IntentName::GetSingleDrugPrice);
        assert_eq!(IntentName::parse(" FindProvider "), IntentName::FindProvider);
        assert_eq!(IntentName::parse("BookFlight"), IntentName::Unknown);
        assert_eq!(IntentName::parse(""), IntentName::Unknown);
    }

    #[test]
    fn test_serde() {
        assert_eq!(
            serde_json::to_string(&IntentName::GetPlanInfo).unwrap(),
            "\"GetPlanInfo\""
        );
        let parsed: IntentName = serde_json::from_str("\"nonsense\"").unwrap();
        assert_eq!(parsed, IntentName::Unknown);
    }
}
