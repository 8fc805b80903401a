use std::sync::Arc;

use care_assist::config::ServiceConfig;
use care_assist::llm::{LlmConfig, create_generator};
use care_assist::pipeline::{Pipeline, PipelineSettings};
use care_assist::server::{AppState, service_routes};
use care_assist::spam::{LexicalSpamClassifier, SpamClassifier};
use care_assist::store::LibSqlStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env();

    // LLM credentials are required — without them the pipeline never starts.
    let llm_config = LlmConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export OPENAI_API_KEY=sk-... (or ANTHROPIC_API_KEY with LLM_BACKEND=anthropic)");
        std::process::exit(1);
    });

    eprintln!("📬 Care Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!("   API: http://0.0.0.0:{}", config.port);
    eprintln!("   Database: {}", config.db_path);

    let text_generator = create_generator(&llm_config)?;

    // ── Policy store ─────────────────────────────────────────────────
    let db_path = std::path::Path::new(&config.db_path);
    let store = LibSqlStore::new_local(db_path).await.unwrap_or_else(|e| {
        eprintln!("Error: Failed to open database at {}: {}", config.db_path, e);
        std::process::exit(1);
    });
    let seeded = store.seed_defaults().await?;
    if seeded > 0 {
        eprintln!("   Seeded catalog: {seeded} products");
    }

    // ── Spam classifier ──────────────────────────────────────────────
    let spam: Arc<dyn SpamClassifier> = Arc::new(LexicalSpamClassifier::new());
    eprintln!("   Spam classifier: lexical");

    // ── Pipeline ─────────────────────────────────────────────────────
    let pipeline = Arc::new(Pipeline::new(
        Arc::new(store),
        text_generator,
        PipelineSettings {
            classification_mode: config.classifier_mode,
            temperature: llm_config.temperature,
            max_tokens: llm_config.max_tokens,
        },
    ));

    let app = service_routes(AppState {
        pipeline,
        spam: Some(spam),
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "HTTP server started");
    axum::serve(listener, app).await?;

    Ok(())
}
