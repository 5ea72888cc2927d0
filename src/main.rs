// docchat/src/main.rs
use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use docchat::api::{start_api_server, AppState};
use docchat::config::ApiConfig;
use docchat::memory::GroqProvider;
use docchat::monitoring::{init_tracing, MonitoringConfig};
use docchat::session::{ChatEngine, SessionStore};
use tracing::{error, info};

fn fail(message: String) -> ! {
    error!("{}", message);
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let monitoring = MonitoringConfig::from_env();
    let _log_guard = init_tracing(&monitoring)?;

    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => fail(format!("Failed to load configuration: {}", e)),
    };

    let provider = match GroqProvider::new(
        &config.base_url,
        &config.api_key,
        &config.model,
        Duration::from_secs(config.llm_timeout_secs),
    ) {
        Ok(provider) => provider,
        Err(e) => fail(format!("Failed to initialize LLM client: {}", e)),
    };

    let engine = match ChatEngine::from_config(&config, Arc::new(provider)) {
        Ok(engine) => engine,
        Err(e) => fail(format!("Failed to initialize chat engine: {}", e)),
    };

    info!(
        model = %config.model,
        budget = config.max_context_budget,
        unit = engine.counter.unit(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        max_sessions = config.max_sessions,
        "Configuration loaded"
    );

    let state = web::Data::new(AppState::new(
        SessionStore::new(config.max_sessions),
        engine,
        config.max_upload_bytes,
    ));

    println!("🚀 Starting API server on http://{} ...", config.bind_addr());
    start_api_server(&config, state)?.await
}
