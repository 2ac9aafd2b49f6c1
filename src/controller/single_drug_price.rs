//! Price of a single drug
//!
//! The request is enriched in stages: entity extraction over the user's
//! words and what was already collected, then the beneficiary's medication
//! list, then session slots, then defaults. Once the required slots are
//! present a per-dose price is looked up and summarized.

use super::{slots_we_are_missing, slots_we_have, Card, IntentController, Reply, TurnContext};
use crate::drug::{extract_drug_information, DrugDetails, DrugExtraction};
use crate::intent::IntentName;
use crate::prompts;
use crate::session::Slots;
use async_trait::async_trait;
use serde_json::json;

const ASK_DRUG_NAME: &str = "Which drug are you asking about? Please provide the name of the \
                             medication you'd like pricing information for.";

const PRICE_GUIDANCE: &str =
    "Include the cost per dose, length of supply, and the total cost for the duration of the supply.";

pub struct SingleDrugPriceController;

/// Text handed to the entity extractor: known slot values then the question
fn extraction_query(known: &DrugDetails, user_message: &str) -> String {
    let mut query = String::from("Data:\n");
    for (slot, value) in known.present() {
        query.push_str(&format!("{slot}: {value}\n"));
    }
    query.push_str("User asked: ");
    query.push_str(user_message);
    query
}

/// Record what was learned this turn back into the session slots
fn write_back(slots: &mut Slots, details: &DrugDetails, extraction: &DrugExtraction) {
    for (slot, value) in details.present() {
        slots.insert(slot, value);
    }
    if let Some(name) = &extraction.normalized_drug_name {
        slots.insert("normalized_drug_name", name.as_str());
    }
    if let Some(code) = &extraction.rxnorm_code {
        slots.insert("rxnorm_code", code.as_str());
    }
    if let Some(drug_type) = extraction.drug_type {
        slots.insert("drug_type", json!(drug_type));
    }
    if extraction.entity_count > 0 {
        slots.insert("entity_confidence", extraction.confidence);
        slots.insert("has_rxnorm_data", extraction.has_rxnorm_data);
    }
    if !extraction.alternatives.is_empty() {
        slots.insert("alternative_drugs", json!(extraction.alternatives));
    }
}

#[async_trait]
impl IntentController for SingleDrugPriceController {
    fn intent(&self) -> IntentName {
        IntentName::GetSingleDrugPrice
    }

    fn min_confidence(&self) -> Option<f64> {
        Some(0.8)
    }

    async fn clarification(&self, _ctx: &mut TurnContext<'_>) -> Reply {
        Reply::clarification("I think you are asking about a drug price. Is that right?")
    }

    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Reply {
        if !ctx.slots().has("drug_name") {
            return Reply::needs_slots(ASK_DRUG_NAME, vec!["drug_name".to_string()]);
        }

        let from_slots = DrugDetails::from_slots(ctx.slots());
        let query = extraction_query(&from_slots, ctx.user_message());
        let (extraction, error) =
            extract_drug_information(ctx.services.extractor.as_ref(), &query).await;
        if let Some(e) = error {
            tracing::debug!(session_id = %ctx.session.session_id, error = %e, "Drug extraction skipped");
        }

        let medication = [
            extraction.normalized_drug_name.as_deref(),
            extraction.details.drug_name.as_deref(),
            from_slots.drug_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find_map(|name| ctx.beneficiary.find_medication(name))
        .map(DrugDetails::from);

        let mut overlays = Vec::with_capacity(3);
        if let Some(medication) = &medication {
            overlays.push(medication);
        }
        let defaults = DrugDetails::defaults();
        overlays.push(&from_slots);
        overlays.push(&defaults);
        let details = extraction.details.clone().backfill(&overlays);

        write_back(&mut ctx.session.collected_slots, &details, &extraction);

        let drug_name = details.drug_name.clone().unwrap_or_default();
        let missing = slots_we_are_missing(ctx.slots(), IntentName::GetSingleDrugPrice.def().required_slots);
        if !missing.is_empty() {
            tracing::info!(
                session_id = %ctx.session.session_id,
                drug = %drug_name,
                missing = ?missing,
                "Drug price request incomplete"
            );
            let prompt = prompts::missing_information("drug price", &slots_we_have(ctx.slots()), &missing);
            let canned = format!(
                "To look up the price of {drug_name}, I also need the {}.",
                missing.join(" and ").replace('_', " ")
            );
            let message = ctx.generate(prompt, &canned).await;
            return Reply::needs_slots(message, missing);
        }

        let price = match ctx.services.prices.per_dose_price(&details).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!(session_id = %ctx.session.session_id, drug = %drug_name, error = %e, "Price lookup failed");
                return Reply::answered(format!(
                    "I'm sorry, I couldn't look up a price for {drug_name} right now. Please try again later."
                ));
            }
        };

        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let per_dose = format!("${price:.2}");
        let answer = json!({
            "Drug Name": drug_name,
            "Normalized Drug Name": text(&extraction.normalized_drug_name),
            "Per Dose Cost": per_dose,
            "Length of Supply": text(&details.duration),
            "Taken Via/Route": text(&details.route),
            "Frequency Taken": text(&details.frequency),
            "Drug Form": text(&details.drug_form),
        });
        let canned = format!(
            "{drug_name} costs about {per_dose} per dose, taken {}, for a {} supply.",
            text(&details.frequency),
            text(&details.duration)
        );
        let message = ctx
            .generate(prompts::answer("drug price", &answer, &[PRICE_GUIDANCE]), &canned)
            .await;

        let description = [details.dosage.as_deref(), details.frequency.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        Reply::answered(message).with_card(Card::Price {
            title: drug_name,
            description: Some(description).filter(|d| !d.is_empty()),
            price,
        })
    }
}
