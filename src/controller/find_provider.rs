use super::{Card, IntentController, Reply, TurnContext};
use crate::intent::IntentName;
use async_trait::async_trait;

const CARE_COMPARE_URL: &str = "https://www.medicare.gov/care-compare/";

pub struct FindProviderController;

#[async_trait]
impl IntentController for FindProviderController {
    fn intent(&self) -> IntentName {
        IntentName::FindProvider
    }

    fn min_confidence(&self) -> Option<f64> {
        Some(0.7)
    }

    async fn clarification(&self, _ctx: &mut TurnContext<'_>) -> Reply {
        Reply::clarification(
            "I think you are asking about finding a provider, but I am not sure enough to \
             answer that. Could you provide more details?",
        )
    }

    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Reply {
        let provider_type = ctx
            .slots()
            .text("provider_type")
            .unwrap_or_else(|| "doctor".to_string());
        let location = ctx
            .slots()
            .text("location")
            .or_else(|| ctx.beneficiary.city().map(str::to_string))
            .unwrap_or_else(|| "your area".to_string());

        let mut reply = Reply::answered(format!(
            "I can help you find a {provider_type} in {location}. Here's what I found: \
             (This is a placeholder response that would typically include provider search results)"
        ))
        .with_cta("Search providers on Medicare.gov", CARE_COMPARE_URL);

        if let (Some(address), Some(near)) = (
            &ctx.beneficiary.mailing_address,
            ctx.beneficiary.location(),
        ) {
            reply = reply.with_card(Card::Location {
                title: "Your address".to_string(),
                description: Some(format!("Searching near {near}")),
                address: address.street_address.join(", "),
                city: address.city.clone(),
                state: address.state.clone(),
                zip: address.zip.clone(),
            });
        }
        if let Some(pcp) = &ctx.beneficiary.primary_care_physician {
            reply = reply.with_card(Card::Provider {
                title: pcp.name.clone(),
                description: Some(match &pcp.phone {
                    Some(phone) => format!("Your primary care physician, {phone}"),
                    None => "Your primary care physician".to_string(),
                }),
            });
        }
        reply
    }
}
