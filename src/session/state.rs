//! Dialogue state tracked per session
//!
//! Derived from the outcome of the latest turn and recorded on the session so
//! clients can see whether the bot is waiting on a clarification or on
//! missing slots.

use crate::controller::TurnOutcome;
use crate::intent::IntentName;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogueState {
    /// No turn processed yet
    #[default]
    New,

    /// Intent suspected but below the controller's confidence threshold
    Clarifying { intent: IntentName },

    /// Intent confirmed; waiting for the user to supply required slots
    CollectingSlots {
        intent: IntentName,
        missing: Vec<String>,
    },

    /// Last turn produced a full answer
    Answered { intent: IntentName },

    /// Request could not be mapped to a supported intent
    Fallback,
}

impl DialogueState {
    /// State after a turn routed to `intent` ended with `outcome`
    pub fn after_turn(intent: IntentName, outcome: &TurnOutcome) -> DialogueState {
        match outcome {
            TurnOutcome::Answered => DialogueState::Answered { intent },
            TurnOutcome::NeedsSlots { missing } => DialogueState::CollectingSlots {
                intent,
                missing: missing.clone(),
            },
            TurnOutcome::Clarification => DialogueState::Clarifying { intent },
            TurnOutcome::Fallback => DialogueState::Fallback,
        }
    }

    /// Whether the bot is waiting on the user for more input about an intent
    #[cfg(test)]
    pub fn pending_intent(&self) -> Option<IntentName> {
        match self {
            DialogueState::Clarifying { intent } | DialogueState::CollectingSlots { intent, .. } => {
                Some(*intent)
            }
            _ => None,
        }
    }
}
