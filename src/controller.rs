//! Intent controllers
//!
//! Each supported intent has a controller that turns the session's collected
//! context into a [`Reply`]. [`route`] picks the controller and applies its
//! confidence gate: below the threshold the user is asked to confirm instead
//! of getting an answer.

mod find_provider;
mod multi_drug_price;
mod plan_info;
mod single_drug_price;
mod unknown;
mod welcome;

pub use welcome::welcome_message;

use crate::beneficiary::Beneficiary;
use crate::drug::{DrugEntityExtractor, PriceLookup};
use crate::intent::IntentName;
use crate::llm::{LlmRequest, LlmService};
use crate::prompts;
use crate::session::{ChatSession, Slots};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reply used whenever nothing better can be said
pub const REPHRASE: &str = "I am not sure what you mean. Could you please rephrase?";

const MAX_REPLY_TOKENS: u32 = 1024;

/// Structured attachment rendered beside the reply text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Card {
    Price {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        price: f64,
    },
    Location {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        address: String,
        city: String,
        state: String,
        zip: String,
    },
    Provider {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Plan {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtaLink {
    pub label: String,
    pub url: String,
}

/// How a turn ended, from the dialogue's point of view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered,
    NeedsSlots { missing: Vec<String> },
    Clarification,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub message: String,
    pub cards: Vec<Card>,
    pub cta: Option<CtaLink>,
    pub outcome: TurnOutcome,
}

impl Reply {
    fn with_outcome(message: impl Into<String>, outcome: TurnOutcome) -> Self {
        Self {
            message: message.into(),
            cards: Vec::new(),
            cta: None,
            outcome,
        }
    }

    pub fn answered(message: impl Into<String>) -> Self {
        Self::with_outcome(message, TurnOutcome::Answered)
    }

    pub fn needs_slots(message: impl Into<String>, missing: Vec<String>) -> Self {
        Self::with_outcome(message, TurnOutcome::NeedsSlots { missing })
    }

    pub fn clarification(message: impl Into<String>) -> Self {
        Self::with_outcome(message, TurnOutcome::Clarification)
    }

    pub fn fallback(message: impl Into<String>) -> Self {
        Self::with_outcome(message, TurnOutcome::Fallback)
    }

    pub fn with_card(mut self, card: Card) -> Self {
        self.cards.push(card);
        self
    }

    pub fn with_cta(mut self, label: &str, url: &str) -> Self {
        self.cta = Some(CtaLink {
            label: label.to_string(),
            url: url.to_string(),
        });
        self
    }
}

/// External services controllers call out to
#[derive(Clone)]
pub struct ControllerServices {
    /// `None` when no LLM is configured; replies then use canned text
    pub llm: Option<Arc<dyn LlmService>>,
    pub extractor: Arc<dyn DrugEntityExtractor>,
    pub prices: Arc<dyn PriceLookup>,
    /// History messages sent along with generation requests
    pub context_messages: usize,
}

/// Everything a controller may read or update during one turn
pub struct TurnContext<'a> {
    pub session: &'a mut ChatSession,
    pub beneficiary: &'a Beneficiary,
    pub services: &'a ControllerServices,
}

impl TurnContext<'_> {
    /// Text of the message being answered
    pub fn user_message(&self) -> &str {
        self.session.last_user_text().unwrap_or_default()
    }

    pub fn slots(&self) -> &Slots {
        &self.session.collected_slots
    }

    /// Generate reply text with the LLM, falling back to `canned` when no LLM
    /// is configured or the call fails
    pub async fn generate(&self, system: String, canned: &str) -> String {
        let Some(llm) = &self.services.llm else {
            return canned.to_string();
        };

        // The message being answered is always the newest in the session
        let history = self
            .session
            .last_n_messages(self.services.context_messages, 1);
        let request = LlmRequest::new(prompts::build_messages(history, self.user_message()))
            .with_system(system)
            .with_max_tokens(MAX_REPLY_TOKENS)
            .with_temperature(0.0);

        match llm.complete(&request).await {
            Ok(response) if !response.text.trim().is_empty() => response.text.trim().to_string(),
            Ok(_) => {
                tracing::warn!(session_id = %self.session.session_id, "LLM returned an empty reply, using canned text");
                canned.to_string()
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session.session_id,
                    error = %e,
                    "Reply generation failed, using canned text"
                );
                canned.to_string()
            }
        }
    }
}

/// Whether `confidence` clears the threshold; no threshold always passes
pub fn is_confident(min_confidence: Option<f64>, confidence: Option<f64>) -> bool {
    min_confidence.map_or(true, |min| confidence.unwrap_or(0.0) >= min)
}

/// Names of slots that hold a value
pub fn slots_we_have(slots: &Slots) -> Vec<String> {
    slots.present_names()
}

/// Required slots that hold no value, in `required` order
pub fn slots_we_are_missing(slots: &Slots, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|slot| !slots.has(slot))
        .map(|slot| (*slot).to_string())
        .collect()
}

#[async_trait]
pub trait IntentController: Send + Sync {
    fn intent(&self) -> IntentName;

    /// Confidence required before [`Self::handle`] runs; `None` handles
    /// every turn
    fn min_confidence(&self) -> Option<f64> {
        None
    }

    /// Reply when the detected intent is below the threshold
    async fn clarification(&self, ctx: &mut TurnContext<'_>) -> Reply {
        let def = self.intent().def();
        let prompt = prompts::clarification(
            def.text,
            ctx.session.current_confidence.unwrap_or(0.0),
            ctx.slots(),
            ctx.user_message(),
        );
        Reply::clarification(ctx.generate(prompt, REPHRASE).await)
    }

    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Reply;
}

pub fn controller_for(intent: IntentName) -> &'static dyn IntentController {
    match intent {
        IntentName::GetSingleDrugPrice => &single_drug_price::SingleDrugPriceController,
        IntentName::GetMultiDrugPrice => &multi_drug_price::MultiDrugPriceController,
        IntentName::FindProvider => &find_provider::FindProviderController,
        IntentName::GetPlanInfo => &plan_info::PlanInfoController,
        IntentName::Welcome => &welcome::WelcomeController,
        IntentName::Unknown => &unknown::UnknownController,
    }
}

/// Produce the reply for `intent` using the session's current confidence
pub async fn route(intent: IntentName, ctx: &mut TurnContext<'_>) -> Reply {
    let controller = controller_for(intent);
    let confidence = ctx.session.current_confidence;

    if is_confident(controller.min_confidence(), confidence) {
        controller.handle(ctx).await
    } else {
        tracing::info!(
            session_id = %ctx.session.session_id,
            intent = %intent,
            confidence = confidence.unwrap_or(0.0),
            threshold = controller.min_confidence().unwrap_or(0.0),
            "Confidence below threshold, asking for clarification"
        );
        controller.clarification(ctx).await
    }
}
