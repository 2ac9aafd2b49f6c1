//! LLM-backed intent detection

use super::IntentName;
use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::prompts;
use crate::session::{is_present, ChatSession, Slots};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Classifier output for one user message
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedIntent {
    pub intent: IntentName,
    /// Always within `[0, 1]`
    pub confidence: f64,
    /// Only present values
    pub slots: Slots,
}

impl DetectedIntent {
    pub fn new(intent: IntentName, confidence: f64) -> Self {
        Self {
            intent,
            confidence: clamp_confidence(confidence),
            slots: Slots::new(),
        }
    }

    #[cfg(test)]
    pub fn with_slot(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.slots.insert(name, value);
        self
    }

    /// What a failed detection degrades to
    pub fn unknown() -> Self {
        Self::new(IntentName::Unknown, 0.0)
    }
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("no user message to classify")]
    NoUserMessage,
    #[error("intent detection request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("malformed detection response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait IntentDetector: Send + Sync {
    /// Classify the session's latest user message
    async fn detect(&self, session: &ChatSession) -> Result<DetectedIntent, DetectError>;
}

/// Run `detector`, degrading any failure to [`DetectedIntent::unknown`]
pub async fn detect_or_unknown(detector: &dyn IntentDetector, session: &ChatSession) -> DetectedIntent {
    match detector.detect(session).await {
        Ok(detected) => detected,
        Err(e) => {
            tracing::warn!(
                session_id = %session.session_id,
                error = %e,
                "Intent detection failed, treating as Unknown"
            );
            DetectedIntent::unknown()
        }
    }
}

#[derive(Deserialize)]
struct RawDetection {
    #[serde(default)]
    intent: Value,
    #[serde(default)]
    confidence: Value,
    #[serde(default)]
    slots: Value,
}

/// Numbers, or numbers sent as strings
fn lenient_confidence(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Parse the classifier's reply.
///
/// The reply should be a bare JSON object, but models sometimes wrap it in
/// prose or code fences, so the first object in the text is used. Missing
/// fields default to `Unknown` / `0.0` / no slots.
pub fn parse_detection(text: &str) -> Result<DetectedIntent, DetectError> {
    let start = text
        .find('{')
        .ok_or_else(|| DetectError::Malformed("no JSON object in response".to_string()))?;
    let (_, candidate) = text.split_at(start);

    let raw: RawDetection = serde_json::Deserializer::from_str(candidate)
        .into_iter::<RawDetection>()
        .next()
        .ok_or_else(|| DetectError::Malformed("empty response".to_string()))?
        .map_err(|e| DetectError::Malformed(e.to_string()))?;

    let confidence = lenient_confidence(&raw.confidence);
    if confidence.is_none() && !raw.confidence.is_null() {
        tracing::debug!(confidence = %raw.confidence, "Ignoring unusable confidence");
    }

    let slots = match raw.slots {
        Value::Object(map) => map.into_iter().filter(|(_, v)| is_present(v)).collect(),
        Value::Null => Slots::new(),
        other => {
            tracing::debug!(slots = %other, "Ignoring non-object slots");
            Slots::new()
        }
    };

    Ok(DetectedIntent {
        intent: raw.intent.as_str().map_or(IntentName::Unknown, IntentName::parse),
        confidence: clamp_confidence(confidence.unwrap_or(0.0)),
        slots,
    })
}

/// Classifies with an LLM, giving it the recent conversation as context
pub struct LlmIntentDetector {
    llm: Arc<dyn LlmService>,
    context_messages: usize,
}

impl LlmIntentDetector {
    pub fn new(llm: Arc<dyn LlmService>, context_messages: usize) -> Self {
        Self {
            llm,
            context_messages,
        }
    }

    fn build_request(&self, session: &ChatSession) -> Result<LlmRequest, DetectError> {
        let latest = session.last_message(None).ok_or(DetectError::NoUserMessage)?;
        if latest.role != crate::session::Role::User {
            return Err(DetectError::NoUserMessage);
        }

        // The latest user message is sent separately, so skip it in the window
        let history = session.last_n_messages(self.context_messages, 1);
        let system = prompts::intent_detection(session.current_intent, &session.collected_slots);

        Ok(LlmRequest::new(prompts::build_messages(history, &latest.content))
            .with_system(system)
            .with_temperature(0.0))
    }
}

#[async_trait]
impl IntentDetector for LlmIntentDetector {
    async fn detect(&self, session: &ChatSession) -> Result<DetectedIntent, DetectError> {
        let request = self.build_request(session)?;
        let response = self.llm.complete(&request).await?;
        let detected = parse_detection(&response.text)?;

        tracing::debug!(
            session_id = %session.session_id,
            intent = %detected.intent,
            confidence = detected.confidence,
            slots = ?detected.slots.present_names(),
            "Detected intent"
        );
        Ok(detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::ScriptedLlm;
    use crate::llm::MessageRole;
    use crate::session::{ChatMessage, MessageMetadata};

    #[test]
    fn test_parse_plain_json() {
        let detected = parse_detection(
            r#"{"intent": "GetSingleDrugPrice", "confidence": 0.95, "slots": {"drug_name": "Lipitor"}}"#,
        )
        .unwrap();
        assert_eq!(detected.intent, IntentName::GetSingleDrugPrice);
        assert!((detected.confidence - 0.95).abs() < 1e-9);
        assert_eq!(detected.slots.text("drug_name").as_deref(), Some("Lipitor"));
    }

    #[test]
    fn test_parse_wrapped_in_prose() {
        let text = "Sure! Here is the result:\n```json\n{\"intent\": \"FindProvider\", \"confidence\": 0.9, \
                    \"slots\": {\"provider_type\": \"cardiologist\"}}\n```\nLet me know.";
        let detected = parse_detection(text).unwrap();
        assert_eq!(detected.intent, IntentName::FindProvider);
        assert!(detected.slots.has("provider_type"));
    }

    #[test]
    fn test_parse_defaults_and_clamping() {
        let detected = parse_detection(r#"{"intent": "Teleport", "confidence": 4.2}"#).unwrap();
        assert_eq!(detected.intent, IntentName::Unknown);
        assert!((detected.confidence - 1.0).abs() < f64::EPSILON);
        assert!(detected.slots.is_empty());

        let detected = parse_detection(r#"{"confidence": -1}"#).unwrap();
        assert_eq!(detected.intent, IntentName::Unknown);
        assert!(detected.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_drops_empty_slots() {
        let detected = parse_detection(
            r#"{"intent": "GetSingleDrugPrice", "confidence": 0.9,
                "slots": {"drug_name": "Zocor", "dosage": null, "frequency": ""}}"#,
        )
        .unwrap();
        assert_eq!(detected.slots.present_names(), vec!["drug_name".to_string()]);
        assert_eq!(detected.slots.len(), 1);
    }

    #[test]
    fn test_parse_tolerates_odd_field_types() {
        let detected = parse_detection(
            r#"{"intent": "GetPlanInfo", "confidence": "0.85", "slots": []}"#,
        )
        .unwrap();
        assert_eq!(detected.intent, IntentName::GetPlanInfo);
        assert!((detected.confidence - 0.85).abs() < 1e-9);
        assert!(detected.slots.is_empty());

        let detected = parse_detection(
            r#"{"intent": 7, "confidence": "high", "slots": {"plan_type": "HMO"}}"#,
        )
        .unwrap();
        assert_eq!(detected.intent, IntentName::Unknown);
        assert!(detected.confidence.abs() < f64::EPSILON);
        assert!(detected.slots.has("plan_type"));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_detection("I cannot help with that"),
            Err(DetectError::Malformed(_))
        ));
        assert!(matches!(
            parse_detection(r#"{"intent": "Welcome", "confidence": "#),
            Err(DetectError::Malformed(_))
        ));
    }

    fn session_with_history() -> ChatSession {
        let mut session = ChatSession::new(1);
        session.add_message(ChatMessage::user("How much is Lipitor?"));
        session.add_message(ChatMessage::assistant(
            "What dosage?",
            MessageMetadata::default(),
        ));
        session.add_message(ChatMessage::user("20mg daily"));
        session.current_intent = Some(IntentName::GetSingleDrugPrice);
        session.collected_slots.insert("drug_name", "Lipitor");
        session
    }

    #[tokio::test]
    async fn test_llm_detector_sends_context() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            r#"{"intent": "GetSingleDrugPrice", "confidence": 0.9, "slots": {"dosage": "20mg"}}"#,
        ]));
        let detector = LlmIntentDetector::new(llm.clone(), 10);

        let detected = detector.detect(&session_with_history()).await.unwrap();
        assert_eq!(detected.intent, IntentName::GetSingleDrugPrice);

        let request = llm.last_request().unwrap();
        let system = request.system.unwrap();
        assert!(system.contains("GetSingleDrugPrice"));
        assert!(system.contains("drug_name: Lipitor"));
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.messages[2].text, "20mg daily");
        assert_eq!(request.temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_llm_detector_requires_user_message() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let detector = LlmIntentDetector::new(llm.clone(), 10);

        let mut session = ChatSession::new(1);
        assert!(matches!(
            detector.detect(&session).await,
            Err(DetectError::NoUserMessage)
        ));

        session.add_message(ChatMessage::assistant("hi", MessageMetadata::default()));
        assert!(matches!(
            detector.detect(&session).await,
            Err(DetectError::NoUserMessage)
        ));
        assert!(llm.last_request().is_none());
    }

    #[tokio::test]
    async fn test_failure_degrades_to_unknown() {
        let llm = Arc::new(ScriptedLlm::failing());
        let detector = LlmIntentDetector::new(llm, 10);

        let detected = detect_or_unknown(&detector, &session_with_history()).await;
        assert_eq!(detected, DetectedIntent::unknown());
    }
}
