//! Intake server binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Initialize tracing
//! 3. Pick the text generator (Gemini or offline fallback)
//! 4. Start the idle-session sweeper
//! 5. Start the axum REST API server

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use intake_api::routes;
use intake_api::state::AppState;
use intake_conversation::ConversationService;
use intake_core::config::LlmConfig;
use intake_core::IntakeConfig;
use intake_llm::{DisabledGenerator, GeminiClient, TextGenerator, UnavailableTranscriber};

use crate::cli::CliArgs;

/// Choose the generative collaborator. Any setup failure degrades to the
/// offline generator so the server still answers from the fallback bank.
fn build_generator(config: &LlmConfig, offline: bool) -> Arc<dyn TextGenerator> {
    if offline {
        tracing::info!("Offline mode: fallback questions and summaries only");
        return Arc::new(DisabledGenerator);
    }
    match config.provider.as_str() {
        "gemini" => match GeminiClient::from_config(config) {
            Ok(client) => {
                tracing::info!(model = client.model(), "Gemini generator ready");
                Arc::new(client)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Gemini unavailable, using fallback text");
                Arc::new(DisabledGenerator)
            }
        },
        "disabled" => {
            tracing::info!("Language model disabled in config");
            Arc::new(DisabledGenerator)
        }
        other => {
            tracing::warn!(provider = other, "Unknown LLM provider, using fallback text");
            Arc::new(DisabledGenerator)
        }
    }
}

/// Periodically drop sessions that have been idle past the TTL.
async fn session_sweeper(service: Arc<ConversationService>, interval_secs: u64) {
    tracing::info!(interval_secs, "Session sweeper started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        if let Err(e) = service.purge_expired() {
            tracing::warn!(error = %e, "Session sweep failed");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = IntakeConfig::load_or_default(&config_file);

    // Tracing.
    let filter = args.resolve_log_filter(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting intake v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    config.server.port = args.resolve_port(config.server.port);
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref dir) = args.static_dir {
        config.server.static_dir = Some(dir.to_string_lossy().to_string());
    }

    // Collaborators.
    let generator = build_generator(&config.llm, args.offline);
    let service = ConversationService::new(&config, generator);
    let state = AppState::new(config.clone(), service, Arc::new(UnavailableTranscriber));

    // === Background tasks ===

    let sweeper_service = Arc::clone(&state.service);
    let sweep_interval = config.session.sweep_interval_secs;
    tokio::spawn(async move {
        session_sweeper(sweeper_service, sweep_interval).await;
    });

    // === API server ===

    if let Err(e) = routes::start_server(&config, state).await {
        tracing::error!(
            host = %config.server.host,
            port = config.server.port,
            error = %e,
            "API server failed; is another instance running?"
        );
        return Err(e.into());
    }

    Ok(())
}
