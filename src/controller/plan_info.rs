use super::{Card, IntentController, Reply, TurnContext};
use crate::intent::IntentName;
use async_trait::async_trait;

const PLAN_COMPARE_URL: &str = "https://www.medicare.gov/plan-compare/";

pub struct PlanInfoController;

#[async_trait]
impl IntentController for PlanInfoController {
    fn intent(&self) -> IntentName {
        IntentName::GetPlanInfo
    }

    fn min_confidence(&self) -> Option<f64> {
        Some(0.7)
    }

    async fn clarification(&self, _ctx: &mut TurnContext<'_>) -> Reply {
        Reply::clarification(
            "I think you are asking about your plan, but I am not sure enough to answer that. \
             Which part of your coverage would you like to know about?",
        )
    }

    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Reply {
        let plan_type = ctx
            .slots()
            .text("plan_type")
            .or_else(|| ctx.beneficiary.plan_type().map(str::to_string));
        let benefit = ctx.slots().text("benefit_type");

        let Some(plan_type) = plan_type else {
            return Reply::answered("Here's some information about your plan. (Placeholder)")
                .with_cta("Compare plans on Medicare.gov", PLAN_COMPARE_URL);
        };

        Reply::answered(format!(
            "Here's some information about your {plan_type} plan. (Placeholder)"
        ))
        .with_card(Card::Plan {
            title: plan_type,
            description: benefit.map(|b| format!("Benefit: {b}")),
        })
        .with_cta("Compare plans on Medicare.gov", PLAN_COMPARE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beneficiary::Beneficiary;
    use crate::chat::testing::services;
    use crate::session::{ChatMessage, ChatSession};

    #[tokio::test]
    async fn test_mentions_plan_type() {
        let beneficiary = Beneficiary {
            plan_type: "Medicare Advantage".to_string(),
            ..Beneficiary::anonymous(3)
        };
        let mut session = ChatSession::new(3);
        session.add_message(ChatMessage::user("what does my plan cover for dental"));
        session.collected_slots.insert("benefit_type", "dental");
        let services = services(None);
        let mut ctx = TurnContext {
            session: &mut session,
            beneficiary: &beneficiary,
            services: &services,
        };

        let reply = PlanInfoController.handle(&mut ctx).await;
        assert!(reply.message.contains("your Medicare Advantage plan"));
        assert_eq!(
            reply.cards,
            vec![Card::Plan {
                title: "Medicare Advantage".to_string(),
                description: Some("Benefit: dental".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_without_plan_on_file() {
        let beneficiary = Beneficiary::anonymous(3);
        let mut session = ChatSession::new(3);
        session.add_message(ChatMessage::user("tell me about my plan"));
        let services = services(None);
        let mut ctx = TurnContext {
            session: &mut session,
            beneficiary: &beneficiary,
            services: &services,
        };

        let reply = PlanInfoController.handle(&mut ctx).await;
        assert_eq!(reply.message, "Here's some information about your plan. (Placeholder)");
        assert!(reply.cards.is_empty());
        assert!(reply.cta.is_some());
    }
}
