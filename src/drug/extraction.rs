//! Medical entities and the drug summary derived from them

use super::DrugDetails;
use serde::{Deserialize, Serialize};

/// RxNorm concept attached to a recognized medication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RxNormConcept {
    pub code: String,
    pub description: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeType {
    Dosage,
    Form,
    RouteOrMode,
    Frequency,
    Duration,
    Rate,
    Strength,
    #[serde(other)]
    Other,
}

/// Detail linked to a medication entity (its dosage, form...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAttribute {
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
    pub text: String,
    pub score: f64,
    #[serde(default)]
    pub relationship_score: f64,
    #[serde(default)]
    pub begin_offset: usize,
    #[serde(default)]
    pub end_offset: usize,
}

/// One entity recognized in the text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalEntity {
    pub text: String,
    pub category: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub score: f64,
    #[serde(default)]
    pub begin_offset: usize,
    #[serde(default)]
    pub end_offset: usize,
    #[serde(default)]
    pub rx_norm_concepts: Vec<RxNormConcept>,
    #[serde(default)]
    pub attributes: Vec<EntityAttribute>,
}

impl MedicalEntity {
    #[cfg(test)]
    pub fn medication(text: &str, score: f64) -> Self {
        Self {
            text: text.to_string(),
            category: "MEDICATION".to_string(),
            entity_type: "GENERIC_NAME".to_string(),
            score,
            begin_offset: 0,
            end_offset: text.len(),
            rx_norm_concepts: Vec::new(),
            attributes: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_type(mut self, entity_type: &str) -> Self {
        self.entity_type = entity_type.to_string();
        self
    }

    #[cfg(test)]
    pub fn with_concept(mut self, code: &str, description: &str, score: f64) -> Self {
        self.rx_norm_concepts.push(RxNormConcept {
            code: code.to_string(),
            description: description.to_string(),
            score,
        });
        self
    }

    #[cfg(test)]
    pub fn with_attribute(mut self, attribute_type: AttributeType, text: &str, score: f64) -> Self {
        self.attributes.push(EntityAttribute {
            attribute_type,
            text: text.to_string(),
            score,
            relationship_score: score,
            begin_offset: 0,
            end_offset: 0,
        });
        self
    }

    fn is_medication(&self) -> bool {
        self.category == "MEDICATION"
            || matches!(
                self.entity_type.as_str(),
                "GENERIC_NAME" | "BRAND_NAME" | "DX_NAME"
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrugType {
    BrandName,
    GenericName,
}

impl DrugType {
    fn from_entity_type(entity_type: &str) -> Option<Self> {
        match entity_type {
            "BRAND_NAME" => Some(DrugType::BrandName),
            "GENERIC_NAME" => Some(DrugType::GenericName),
            _ => None,
        }
    }
}

/// Related RxNorm concept other than the best match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeDrug {
    pub name: String,
    pub rxnorm_code: String,
    pub confidence: f64,
    pub is_preferred: bool,
}

/// Score above which an alternative concept is flagged preferred
const PREFERRED_SCORE: f64 = 0.5;

/// Drug summary of one extraction pass
#[derive(Debug, Clone, PartialEq)]
pub struct DrugExtraction {
    /// Name as written by the user plus the first value of each attribute
    pub details: DrugDetails,
    pub normalized_drug_name: Option<String>,
    pub rxnorm_code: Option<String>,
    pub drug_type: Option<DrugType>,
    /// Sorted by confidence, highest first
    pub alternatives: Vec<AlternativeDrug>,
    /// Score of the primary medication entity, 0 when none
    pub confidence: f64,
    pub entity_count: usize,
    pub has_rxnorm_data: bool,
    pub original_text: String,
}

fn highest<T>(items: impl IntoIterator<Item = T>, score: impl Fn(&T) -> f64) -> Option<T> {
    items
        .into_iter()
        .fold(None, |best: Option<T>, item| match best {
            Some(b) if score(&item) <= score(&b) => Some(b),
            _ => Some(item),
        })
}

impl DrugExtraction {
    pub fn from_entities(entities: &[MedicalEntity], text: &str) -> Self {
        let primary = highest(entities.iter().filter(|e| e.is_medication()), |e| e.score);

        let concepts: Vec<&RxNormConcept> = entities
            .iter()
            .flat_map(|e| e.rx_norm_concepts.iter())
            .collect();
        let best = highest(concepts.iter().copied(), |c| c.score);

        let mut alternatives: Vec<AlternativeDrug> = concepts
            .iter()
            .filter(|c| best.map_or(true, |b| b.code != c.code))
            .map(|c| AlternativeDrug {
                name: c.description.clone(),
                rxnorm_code: c.code.clone(),
                confidence: c.score,
                is_preferred: c.score > PREFERRED_SCORE,
            })
            .collect();
        alternatives.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let first_of = |wanted: AttributeType| {
            entities
                .iter()
                .flat_map(|e| e.attributes.iter())
                .find(|a| a.attribute_type == wanted)
                .map(|a| a.text.clone())
        };

        Self {
            details: DrugDetails {
                drug_name: primary.map(|e| e.text.clone()),
                dosage: first_of(AttributeType::Dosage),
                drug_form: first_of(AttributeType::Form),
                route: first_of(AttributeType::RouteOrMode),
                frequency: first_of(AttributeType::Frequency),
                duration: first_of(AttributeType::Duration),
                rate: first_of(AttributeType::Rate),
                strength: first_of(AttributeType::Strength),
            },
            normalized_drug_name: best.map(|c| c.description.clone()),
            rxnorm_code: best.map(|c| c.code.clone()),
            drug_type: primary.and_then(|e| DrugType::from_entity_type(&e.entity_type)),
            alternatives,
            confidence: primary.map_or(0.0, |e| e.score),
            entity_count: entities.len(),
            has_rxnorm_data: !concepts.is_empty(),
            original_text: text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lipitor() -> MedicalEntity {
        MedicalEntity::medication("Lipitor", 0.92)
            .with_type("BRAND_NAME")
            .with_concept("617310", "atorvastatin 20 MG Oral Tablet [Lipitor]", 0.81)
            .with_concept("617312", "atorvastatin 40 MG Oral Tablet [Lipitor]", 0.42)
            .with_concept("83367", "atorvastatin", 0.63)
            .with_attribute(AttributeType::Dosage, "20mg", 0.9)
            .with_attribute(AttributeType::Frequency, "daily", 0.8)
            .with_attribute(AttributeType::Frequency, "twice", 0.3)
    }

    #[test]
    fn test_primary_and_best_concept() {
        let extraction = DrugExtraction::from_entities(&[lipitor()], "Lipitor 20mg daily");

        assert_eq!(extraction.details.drug_name.as_deref(), Some("Lipitor"));
        assert_eq!(extraction.drug_type, Some(DrugType::BrandName));
        assert_eq!(extraction.rxnorm_code.as_deref(), Some("617310"));
        assert_eq!(
            extraction.normalized_drug_name.as_deref(),
            Some("atorvastatin 20 MG Oral Tablet [Lipitor]")
        );
        assert!(extraction.has_rxnorm_data);
        assert!((extraction.confidence - 0.92).abs() < f64::EPSILON);
    }

    #[test]
    fn test_alternatives_sorted_and_flagged() {
        let extraction = DrugExtraction::from_entities(&[lipitor()], "");
        let codes: Vec<_> = extraction
            .alternatives
            .iter()
            .map(|a| (a.rxnorm_code.as_str(), a.is_preferred))
            .collect();
        assert_eq!(codes, vec![("83367", true), ("617312", false)]);
    }

    #[test]
    fn test_first_attribute_of_each_type() {
        let extraction = DrugExtraction::from_entities(&[lipitor()], "");
        assert_eq!(extraction.details.dosage.as_deref(), Some("20mg"));
        assert_eq!(extraction.details.frequency.as_deref(), Some("daily"));
        assert!(extraction.details.route.is_none());
    }

    #[test]
    fn test_highest_scoring_medication_wins() {
        let entities = vec![
            MedicalEntity::medication("asprin", 0.4),
            MedicalEntity::medication("Zocor", 0.88),
            MedicalEntity {
                category: "TEST_TREATMENT_PROCEDURE".to_string(),
                entity_type: "TEST_NAME".to_string(),
                ..MedicalEntity::medication("cholesterol test", 0.99)
            },
        ];
        let extraction = DrugExtraction::from_entities(&entities, "");
        assert_eq!(extraction.details.drug_name.as_deref(), Some("Zocor"));
        assert_eq!(extraction.drug_type, Some(DrugType::GenericName));
        assert_eq!(extraction.entity_count, 3);
    }

    #[test]
    fn test_no_entities() {
        let extraction = DrugExtraction::from_entities(&[], "hello");
        assert_eq!(extraction.details, DrugDetails::default());
        assert!(extraction.alternatives.is_empty());
        assert!(!extraction.has_rxnorm_data);
        assert!(extraction.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn test_entity_wire_format() {
        let json = r#"{
            "text": "metformin",
            "category": "MEDICATION",
            "type": "GENERIC_NAME",
            "score": 0.97,
            "rxNormConcepts": [{"code": "6809", "description": "metformin", "score": 0.9}],
            "attributes": [{"type": "ROUTE_OR_MODE", "text": "oral", "score": 0.8},
                           {"type": "TIME_TO_START", "text": "now", "score": 0.5}]
        }"#;
        let entity: MedicalEntity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.attributes[0].attribute_type, AttributeType::RouteOrMode);
        assert_eq!(entity.attributes[1].attribute_type, AttributeType::Other);

        let extraction = DrugExtraction::from_entities(&[entity], "metformin");
        assert_eq!(extraction.details.route.as_deref(), Some("oral"));
        assert_eq!(extraction.rxnorm_code.as_deref(), Some("6809"));
    }
}
