mod config;
mod errors;
mod generation;
mod llm_client;
mod prospects;
mod rate_limit;
mod research;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::generator::{GenerationSettings, OutreachGenerator};
use crate::generation::prompts::{PromptTemplate, DEFAULT_PERSONA};
use crate::llm_client::LlmClient;
use crate::prospects::annotate::PlaceholderAnnotator;
use crate::prospects::sessions::SessionStore;
use crate::rate_limit::RateLimiter;
use crate::research::Ingestor;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Prospector API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.anthropic_api_url.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Prompt template: built-in unless a versioned override is configured
    let template = match &config.prompt_template_path {
        Some(path) => PromptTemplate::load(path)
            .with_context(|| format!("Failed to load prompt template {}", path.display()))?,
        None => PromptTemplate::default(),
    };
    info!("Prompt template version: {}", template.version);

    // Prospect snapshots
    match &config.snapshot_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create snapshot directory {}", dir.display())
            })?;
            info!("Prospect snapshots mirrored to {}", dir.display());
        }
        None => info!("PROSPECT_SNAPSHOT_DIR not set; prospect logs are memory-only"),
    }

    let ingestor = Ingestor::new(config.research_char_budget)?;
    info!(
        "Research budget: {} characters, completion budget: {} tokens",
        config.research_char_budget, config.max_output_tokens
    );

    let generator = OutreachGenerator::new(
        ingestor,
        Arc::new(llm),
        template,
        Arc::new(PlaceholderAnnotator),
        GenerationSettings {
            max_output_tokens: config.max_output_tokens,
            preview_chars: config.preview_chars,
            default_persona: config
                .persona
                .clone()
                .unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
        },
    );

    // Build app state
    let state = AppState {
        generator: Arc::new(generator),
        sessions: Arc::new(SessionStore::new(config.snapshot_dir.clone())),
        rate_limiter: Arc::new(RateLimiter::new(
            config.generation_rate_limit,
            Duration::from_secs(config.generation_rate_window_secs),
        )),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
