//! Folding a fresh detection into the session's collected slots
//!
//! Pure: takes the previous context and the detection, returns the slots the
//! session should hold afterwards.

use super::{DetectedIntent, IntentName};
use crate::session::{same_value, Slots};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeReason {
    /// No intent before this turn
    Started,
    /// Same intent; new slots layered over the old ones
    Continued,
    /// Different intent; old slots dropped
    IntentChanged,
    /// Same intent but a critical slot now has a different value; old slots
    /// dropped
    CriticalSlotChanged,
}

impl MergeReason {
    pub fn cleared(self) -> bool {
        matches!(self, MergeReason::IntentChanged | MergeReason::CriticalSlotChanged)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub slots: Slots,
    pub reason: MergeReason,
}

pub fn merge_context(
    previous_intent: Option<IntentName>,
    collected: &Slots,
    detected: &DetectedIntent,
) -> MergeOutcome {
    let fresh = detected.slots.without_empty();

    let reason = match previous_intent {
        None => MergeReason::Started,
        Some(previous) if previous != detected.intent => MergeReason::IntentChanged,
        Some(previous) => {
            let def = previous.def();
            let conflict = fresh
                .iter()
                .filter(|(slot, _)| def.is_critical(slot))
                .any(|(slot, new)| collected.present(slot).is_some_and(|old| !same_value(old, new)));
            if conflict {
                MergeReason::CriticalSlotChanged
            } else {
                MergeReason::Continued
            }
        }
    };

    let slots = match reason {
        MergeReason::Started | MergeReason::IntentChanged | MergeReason::CriticalSlotChanged => {
            fresh
        }
        MergeReason::Continued => {
            let mut merged = collected.without_empty();
            merged.extend(fresh);
            merged
        }
    };

    MergeOutcome { slots, reason }
}
