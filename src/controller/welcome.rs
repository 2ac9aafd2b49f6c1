use super::{IntentController, Reply, TurnContext};
use crate::beneficiary::Beneficiary;
use crate::intent::{suggestions, IntentName};
use async_trait::async_trait;

/// Greeting listing what the assistant can do
pub fn welcome_message(beneficiary: &Beneficiary) -> String {
    let name = beneficiary.first_name().unwrap_or("there");
    let capabilities = suggestions()
        .iter()
        .map(|s| format!("• {s}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "👋 Hi {name}! I'm your Medicare assistant.\n\nI can help you to:\n{capabilities}\n\nWhat would you like to know about?"
    )
}

pub struct WelcomeController;

#[async_trait]
impl IntentController for WelcomeController {
    fn intent(&self) -> IntentName {
        IntentName::Welcome
    }

    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Reply {
        Reply::answered(welcome_message(ctx.beneficiary))
    }
}
