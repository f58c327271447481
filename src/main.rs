use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use xuezi::catalog::Catalog;
use xuezi::db::{CharacterStore, SqliteStore};
use xuezi::suggest::Suggester;
use xuezi::{api, AppState, SharedStore};

#[derive(Parser)]
#[command(name = "xuezi", version, about = "Personal Chinese vocabulary tracker")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "XUEZI_PORT")]
    port: u16,

    /// SQLite database path
    #[arg(short, long, default_value = "xuezi.db", env = "XUEZI_DB")]
    db: String,

    /// Word list (TSV: character, pinyin, definition). Defaults to the built-in HSK-1 list.
    #[arg(long, env = "XUEZI_CATALOG")]
    catalog: Option<PathBuf>,

    /// Fixed seed for suggestions
    #[arg(long, env = "XUEZI_SEED")]
    seed: Option<u64>,

    /// Fill an empty database with every catalog word, then serve
    #[arg(long, env = "XUEZI_POPULATE")]
    populate: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!(error = %e, "fatal");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin()?,
    };
    let catalog_src = args
        .catalog
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "builtin".into());

    let store = SqliteStore::open(&args.db)?;
    if args.populate {
        let n = store.seed_from_catalog(&catalog)?;
        info!(inserted = n, "populate finished");
    }
    let shared: SharedStore = Arc::new(store);

    let suggester = Suggester::new(Arc::new(catalog), args.seed);
    let catalog_len = suggester.catalog().len();

    let api_key = std::env::var("XUEZI_API_KEY").ok();
    let auth_status = if api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        "enabled"
    } else {
        "disabled"
    };

    let state = AppState::new(shared, suggester).with_api_key(api_key);
    let app = api::router(state);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        db = %args.db,
        catalog = %catalog_src,
        words = catalog_len,
        auth = auth_status,
        "xuezi starting"
    );

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                error!(error = %e, "failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutting down");
}
