use super::{IntentController, Reply, TurnContext, REPHRASE};
use crate::intent::IntentName;
use crate::prompts;
use async_trait::async_trait;

/// Steers the user back to the supported intents
pub struct UnknownController;

#[async_trait]
impl IntentController for UnknownController {
    fn intent(&self) -> IntentName {
        IntentName::Unknown
    }

    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Reply {
        let prompt = prompts::fallback(ctx.user_message(), &[]);
        Reply::fallback(ctx.generate(prompt, REPHRASE).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beneficiary::Beneficiary;
    use crate::chat::testing::{services, ScriptedLlm};
    use crate::controller::TurnOutcome;
    use crate::session::{ChatMessage, ChatSession};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fallback_prompt_lists_suggestions() {
        let llm = Arc::new(ScriptedLlm::new(vec!["I can help with drug prices and more."]));
        let mut session = ChatSession::new(1);
        session.add_message(ChatMessage::user("what's the weather"));
        let beneficiary = Beneficiary::anonymous(1);
        let services = services(Some(llm.clone()));
        let mut ctx = TurnContext {
            session: &mut session,
            beneficiary: &beneficiary,
            services: &services,
        };

        let reply = UnknownController.handle(&mut ctx).await;
        assert_eq!(reply.outcome, TurnOutcome::Fallback);
        assert_eq!(reply.message, "I can help with drug prices and more.");

        let system = llm.last_request().unwrap().system.unwrap();
        assert!(system.contains("User's message: \"what's the weather\""));
        assert!(system.contains("- Find a doctor, provider, or facility"));
    }

    #[tokio::test]
    async fn test_canned_without_llm() {
        let mut session = ChatSession::new(1);
        session.add_message(ChatMessage::user("???"));
        let beneficiary = Beneficiary::anonymous(1);
        let services = services(None);
        let mut ctx = TurnContext {
            session: &mut session,
            beneficiary: &beneficiary,
            services: &services,
        };

        let reply = UnknownController.handle(&mut ctx).await;
        assert_eq!(reply.message, REPHRASE);
    }
}
