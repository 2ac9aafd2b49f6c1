use super::{IntentController, Reply, TurnContext};
use crate::intent::IntentName;
use async_trait::async_trait;

const ONE_AT_A_TIME: &str = "It looks like you are asking about the price of multiple drugs. \
                             I can help, but please ask one drug at a time.";

pub struct MultiDrugPriceController;

#[async_trait]
impl IntentController for MultiDrugPriceController {
    fn intent(&self) -> IntentName {
        IntentName::GetMultiDrugPrice
    }

    async fn handle(&self, _ctx: &mut TurnContext<'_>) -> Reply {
        Reply::answered(ONE_AT_A_TIME)
    }
}
