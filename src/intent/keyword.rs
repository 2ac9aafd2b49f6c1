//! Offline keyword classifier, used when no LLM is configured

use super::{DetectError, DetectedIntent, IntentDetector, IntentName};
use crate::session::ChatSession;
use async_trait::async_trait;

/// Keyword stems checked in order; the first group with a hit wins
const RULES: &[(&[&str], IntentName, f64)] = &[
    (
        &["drug", "medication", "prescription", "medicine"],
        IntentName::GetSingleDrugPrice,
        0.85,
    ),
    (
        &["doctor", "provider", "physician", "specialist"],
        IntentName::FindProvider,
        0.8,
    ),
    (&["plan", "coverage", "benefit"], IntentName::GetPlanInfo, 0.75),
    (&["hello", "hi", "hey", "help"], IntentName::Welcome, 0.9),
];

const NO_MATCH_CONFIDENCE: f64 = 0.5;

/// Matches whole words (or their plural) so "this" does not count as "hi"
fn mentions(words: &[String], stem: &str) -> bool {
    words
        .iter()
        .any(|w| w == stem || w.strip_suffix('s') == Some(stem))
}

pub fn classify(text: &str) -> DetectedIntent {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    RULES
        .iter()
        .find(|(stems, _, _)| stems.iter().any(|stem| mentions(&words, stem)))
        .map_or_else(
            || DetectedIntent::new(IntentName::Unknown, NO_MATCH_CONFIDENCE),
            |(_, intent, confidence)| DetectedIntent::new(*intent, *confidence),
        )
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordIntentDetector;

#[async_trait]
impl IntentDetector for KeywordIntentDetector {
    async fn detect(&self, session: &ChatSession) -> Result<DetectedIntent, DetectError> {
        let text = session.last_user_text().ok_or(DetectError::NoUserMessage)?;
        Ok(classify(text))
    }
}
