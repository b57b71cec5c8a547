use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use grana_assistant::Assistant;
use grana_core::config::{self, Config, StoreBackend};
use grana_core::store::{PostgrestStore, SqliteStore, Store};
use grana_llm::{ChatModel, LlmClient};
use grana_server::{router, AppState};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (stderr)
    init_tracing()?;
    info!("GranaApp assistant starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: model={}, max_steps={}, store={:?}",
        config.llm.model, config.llm.max_steps, config.store.backend
    );

    // 3. Open the record store
    let store = open_store(&config)?;

    // 4. Build the model client
    let llm = LlmClient::from_config(&config);
    if llm.is_available() {
        info!("LLM client ready ({})", config.llm.base_url);
    } else {
        warn!("OPENAI_API_KEY not configured; chat requests will be refused");
    }

    // 5. Wire the assistant and serve
    let assistant = Assistant::new(Arc::new(llm), store).with_max_steps(config.llm.max_steps);
    let app = router(AppState::new(assistant));

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!("Listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("GranaApp assistant shut down cleanly");
    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(&config.store.sqlite_path)
                .with_context(|| format!("failed to open database {}", config.store.sqlite_path))?;
            info!("Database opened at {}", config.store.sqlite_path);
            Ok(Arc::new(store))
        }
        StoreBackend::Supabase => {
            let url = config
                .store
                .supabase_url
                .clone()
                .context("store.supabase_url is not set")?;
            let key = config
                .credentials
                .supabase_service_key
                .clone()
                .context("SUPABASE_SERVICE_ROLE_KEY is not set")?;
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.llm.request_timeout_secs))
                .build()
                .context("failed to build HTTP client")?;
            info!("Using Supabase store at {url}");
            Ok(Arc::new(PostgrestStore::new(http, url, key)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Initialize tracing to stderr. `RUST_LOG` overrides the default filter.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "grana=info,grana_server=info,grana_assistant=info,grana_core=info,grana_llm=info,tower_http=info,warn",
            )
        }))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
