//! Filling gaps in extracted drug details from other sources

use crate::beneficiary::Medication;
use crate::session::Slots;
use serde::Serialize;

/// Prescription details the price answer is built from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrugDetails {
    pub drug_name: Option<String>,
    pub dosage: Option<String>,
    pub drug_form: Option<String>,
    pub route: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub rate: Option<String>,
    pub strength: Option<String>,
}

/// Slot names, in the order they are listed to the extractor
pub const DRUG_SLOTS: [&str; 8] = [
    "drug_name",
    "dosage",
    "frequency",
    "duration",
    "rate",
    "strength",
    "route",
    "drug_form",
];

fn non_blank(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

impl DrugDetails {
    /// Details as collected in session slots
    pub fn from_slots(slots: &Slots) -> Self {
        Self {
            drug_name: slots.text("drug_name"),
            dosage: slots.text("dosage"),
            drug_form: slots.text("drug_form"),
            route: slots.text("route"),
            frequency: slots.text("frequency"),
            duration: slots.text("duration"),
            rate: slots.text("rate"),
            strength: slots.text("strength"),
        }
    }

    /// Values assumed when nobody said otherwise
    pub fn defaults() -> Self {
        Self {
            duration: Some("monthly".to_string()),
            ..Self::default()
        }
    }

    pub fn get(&self, slot: &str) -> Option<&String> {
        match slot {
            "drug_name" => self.drug_name.as_ref(),
            "dosage" => self.dosage.as_ref(),
            "drug_form" => self.drug_form.as_ref(),
            "route" => self.route.as_ref(),
            "frequency" => self.frequency.as_ref(),
            "duration" => self.duration.as_ref(),
            "rate" => self.rate.as_ref(),
            "strength" => self.strength.as_ref(),
            _ => None,
        }
    }

    fn field_mut(&mut self, slot: &str) -> Option<&mut Option<String>> {
        match slot {
            "drug_name" => Some(&mut self.drug_name),
            "dosage" => Some(&mut self.dosage),
            "drug_form" => Some(&mut self.drug_form),
            "route" => Some(&mut self.route),
            "frequency" => Some(&mut self.frequency),
            "duration" => Some(&mut self.duration),
            "rate" => Some(&mut self.rate),
            "strength" => Some(&mut self.strength),
            _ => None,
        }
    }

    /// Fill blank fields from `overlays`, earliest overlay first.
    ///
    /// Fields that already have a value are never replaced.
    pub fn backfill(mut self, overlays: &[&DrugDetails]) -> Self {
        for slot in DRUG_SLOTS {
            let Some(field) = self.field_mut(slot) else {
                continue;
            };
            if non_blank(field.as_ref()).is_some() {
                continue;
            }
            *field = overlays.iter().find_map(|o| non_blank(o.get(slot)));
        }
        self
    }

    /// Present fields as `(slot, value)` pairs in [`DRUG_SLOTS`] order
    pub fn present(&self) -> Vec<(&'static str, &str)> {
        DRUG_SLOTS
            .iter()
            .filter_map(|slot| {
                self.get(slot)
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
                    .map(|v| (*slot, v))
            })
            .collect()
    }
}

impl From<&Medication> for DrugDetails {
    fn from(medication: &Medication) -> Self {
        Self {
            drug_name: Some(medication.drug_name.clone()),
            dosage: medication.dosage.clone(),
            drug_form: medication.drug_form.clone(),
            route: medication.route.clone(),
            frequency: medication.frequency.clone(),
            duration: medication.duration.clone(),
            rate: medication.rate.clone(),
            strength: medication.strength.clone(),
        }
    }
}

/// Lowercase alphanumerics only, for matching names typed different ways
pub fn normalize_drug_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: Option<&str>, dosage: Option<&str>, frequency: Option<&str>) -> DrugDetails {
        DrugDetails {
            drug_name: name.map(str::to_string),
            dosage: dosage.map(str::to_string),
            frequency: frequency.map(str::to_string),
            ..DrugDetails::default()
        }
    }

    #[test]
    fn test_base_wins() {
        let base = details(Some("Lipitor"), Some("20mg"), None);
        let overlay = details(Some("Zocor"), Some("40mg"), Some("daily"));

        let filled = base.backfill(&[&overlay]);
        assert_eq!(filled.drug_name.as_deref(), Some("Lipitor"));
        assert_eq!(filled.dosage.as_deref(), Some("20mg"));
        assert_eq!(filled.frequency.as_deref(), Some("daily"));
    }

    #[test]
    fn test_overlay_priority_and_blank_values() {
        let base = details(Some("Lipitor"), Some("  "), None);
        let first = details(None, Some(""), None);
        let second = details(None, Some("10mg"), Some("weekly"));
        let third = DrugDetails::defaults();

        let filled = base.backfill(&[&first, &second, &third]);
        assert_eq!(filled.dosage.as_deref(), Some("10mg"));
        assert_eq!(filled.frequency.as_deref(), Some("weekly"));
        assert_eq!(filled.duration.as_deref(), Some("monthly"));
        assert!(filled.route.is_none());
    }

    #[test]
    fn test_from_slots() {
        let mut slots = Slots::new();
        slots.insert("drug_name", "Lipitor");
        slots.insert("dosage", 20);
        slots.insert("frequency", "");
        let details = DrugDetails::from_slots(&slots);
        assert_eq!(details.drug_name.as_deref(), Some("Lipitor"));
        assert_eq!(details.dosage.as_deref(), Some("20"));
        assert!(details.frequency.is_none());
    }

    #[test]
    fn test_present_order() {
        let d = details(Some("Lipitor"), None, Some("daily"));
        assert_eq!(d.present(), vec![("drug_name", "Lipitor"), ("frequency", "daily")]);
    }

    #[test]
    fn test_normalize_drug_name() {
        assert_eq!(normalize_drug_name("Lipitor"), "lipitor");
        assert_eq!(normalize_drug_name(" Co-Q10 (Ubiquinol) "), "coq10ubiquinol");
        assert_eq!(normalize_drug_name("METFORMIN ER"), normalize_drug_name("metformin-er"));
    }
}
