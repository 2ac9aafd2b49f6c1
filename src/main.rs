//! Medicare chatbot service
//!
//! An HTTP backend that answers beneficiaries' Medicare questions (drug
//! prices, providers, plan benefits) through an intent-driven dialogue.

mod api;
mod beneficiary;
mod chat;
mod config;
mod controller;
mod drug;
mod intent;
mod llm;
mod prompts;
mod session;

use api::{create_router, AppState};
use beneficiary::BeneficiaryDirectory;
use chat::ChatService;
use config::{AppConfig, IntentBackend};
use controller::ControllerServices;
use drug::{StubPriceLookup, UnavailableExtractor};
use intent::{IntentDetector, KeywordIntentDetector, LlmIntentDetector};
use llm::LlmConfig;
use session::SessionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medicare_chatbot=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    let directory = match &config.beneficiaries_path {
        Some(path) => BeneficiaryDirectory::load(path)?,
        None => BeneficiaryDirectory::bundled()?,
    };
    tracing::info!(profiles = directory.len(), "Beneficiary directory ready");

    let llm_config = LlmConfig::from_env();
    let llm = llm_config.build_service();
    if llm.is_none() {
        tracing::warn!("No LLM configured; replies use canned text. Set ANTHROPIC_API_KEY or LLM_GATEWAY.");
    }

    let backend = config
        .intent_backend
        .effective(llm.is_some(), llm_config.mock_responses);
    let detector: Arc<dyn IntentDetector> = match (&llm, backend) {
        (Some(llm), IntentBackend::Llm) => {
            tracing::info!(model = %llm.model_id(), "Using LLM intent detection");
            Arc::new(LlmIntentDetector::new(llm.clone(), config.context_messages))
        }
        _ => {
            tracing::info!("Using keyword intent detection");
            Arc::new(KeywordIntentDetector)
        }
    };

    let store = Arc::new(SessionStore::new(config.session.clone()));
    let _sweeper = store.spawn_sweeper();

    let services = ControllerServices {
        llm,
        extractor: Arc::new(UnavailableExtractor),
        prices: Arc::new(StubPriceLookup),
        context_messages: config.context_messages,
    };
    let state = AppState::new(ChatService::new(
        store,
        detector,
        Arc::new(directory),
        services,
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Medicare chatbot listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
