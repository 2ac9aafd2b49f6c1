//! Scripted collaborators for tests
//!
//! Nothing here touches the network: LLM replies, extracted entities,
//! prices and detected intents are all fixed up front.

use super::ChatService;
use crate::beneficiary::BeneficiaryDirectory;
use crate::controller::ControllerServices;
use crate::drug::{
    DrugDetails, DrugEntityExtractor, ExtractionError, MedicalEntity, PriceError, PriceLookup,
    UnavailableExtractor,
};
use crate::intent::{DetectError, DetectedIntent, IntentDetector};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::session::{ChatSession, SessionConfig, SessionStore};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Per-dose price returned by [`FixedPrice`]
pub const FIXED_PRICE: f64 = 2.5;

/// LLM that answers with queued texts, in order, and records every request
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<String>>,
    fail: bool,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a server error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn last_request(&self) -> Option<LlmRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(LlmError::server_error("scripted failure"));
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .map(LlmResponse::text)
            .ok_or_else(|| LlmError::network("no scripted reply left"))
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Extractor returning the same entities for any text
pub struct StaticExtractor {
    entities: Vec<MedicalEntity>,
    calls: AtomicUsize,
}

impl StaticExtractor {
    pub fn new(entities: Vec<MedicalEntity>) -> Self {
        Self {
            entities,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DrugEntityExtractor for StaticExtractor {
    async fn extract_entities(&self, _text: &str) -> Result<Vec<MedicalEntity>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entities.clone())
    }
}

pub struct FixedPrice;

#[async_trait]
impl PriceLookup for FixedPrice {
    async fn per_dose_price(&self, _details: &DrugDetails) -> Result<f64, PriceError> {
        Ok(FIXED_PRICE)
    }
}

/// Detector handing out queued detections; fails once they run out
pub struct FixedDetector {
    detections: Mutex<VecDeque<DetectedIntent>>,
}

impl FixedDetector {
    pub fn new(detections: Vec<DetectedIntent>) -> Self {
        Self {
            detections: Mutex::new(detections.into()),
        }
    }
}

#[async_trait]
impl IntentDetector for FixedDetector {
    async fn detect(&self, _session: &ChatSession) -> Result<DetectedIntent, DetectError> {
        self.detections
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| DetectError::Malformed("no scripted detection left".to_string()))
    }
}

/// Controller services with no extractor and a fixed price
pub fn services(llm: Option<Arc<dyn LlmService>>) -> ControllerServices {
    ControllerServices {
        llm,
        extractor: Arc::new(UnavailableExtractor),
        prices: Arc::new(FixedPrice),
        context_messages: 10,
    }
}

/// Chat service over the bundled beneficiaries and an in-memory store
pub fn chat_service(detector: FixedDetector) -> ChatService {
    ChatService::new(
        Arc::new(SessionStore::new(SessionConfig::default())),
        Arc::new(detector),
        Arc::new(BeneficiaryDirectory::bundled().unwrap()),
        services(None),
    )
}
