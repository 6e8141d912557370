use std::sync::Arc;

use momentum_breakout::config::Config;
use momentum_breakout::services::DecisionJournal;
use momentum_breakout::sources::BinanceKlineSource;
use momentum_breakout::{app, AppState};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "momentum_breakout=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Starting momentum-breakout on {}:{} (symbols {:?}, interval {})",
        config.host, config.port, config.symbols, config.kline_interval
    );

    let journal = match &config.journal_dir {
        Some(dir) => match DecisionJournal::open(dir) {
            Ok(journal) => {
                info!("Journaling decisions to {}", journal.dir().display());
                Some(Arc::new(journal))
            }
            Err(e) => {
                warn!("Journal disabled, cannot open {}: {}", dir.display(), e);
                None
            }
        },
        None => None,
    };

    let source = Arc::new(BinanceKlineSource::new(config.binance_futures_url.clone()));
    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, source, journal);

    // Start the decision loop; it idles until live mode is on
    let runner = state.runner.clone();
    tokio::spawn(async move {
        runner.run().await;
    });

    let app = app(state.clone());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    state.runner.shutdown();
    Ok(())
}
