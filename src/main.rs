//! Chorus notification client.
//!
//! Connects to the notification socket, runs the delivery pipeline and logs
//! each delivered notification until Ctrl-C.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use chorus_core::config::{AppConfig, ReadReceiptTransport};
use chorus_core::error::AppError;
use chorus_core::traits::{ReadReceiptSink, SessionProvider, StaticSession};
use chorus_realtime::NotificationEngine;
use chorus_realtime::api::NotificationApi;
use chorus_realtime::metrics::PipelineMetrics;
use chorus_realtime::source::{CommandSlot, SocketReadReceipts, WebSocketSource};

/// Chorus real-time notification client
#[derive(Debug, Parser)]
#[command(name = "chorus-client", version, about, long_about = None)]
struct Cli {
    /// Configuration environment (loads `config/{env}.toml`)
    #[arg(short, long, env = "CHORUS_ENV", default_value = "development")]
    env: String,

    /// WebSocket endpoint, overriding `connection.url`
    #[arg(long)]
    url: Option<String>,

    /// Auth token, overriding `session.auth_token`
    #[arg(long, env = "CHORUS_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Client error");
        std::process::exit(1);
    }
}

/// Load configuration and apply command-line overrides
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load(&cli.env)?;
    if let Some(url) = &cli.url {
        config.connection.url = url.clone();
    }
    if let Some(token) = &cli.token {
        config.session.auth_token = Some(token.clone());
    }
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Wire the pipeline and run until Ctrl-C
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        url = %config.connection.url,
        "Starting Chorus client"
    );

    let session: Arc<dyn SessionProvider> = Arc::new(StaticSession::from_config(&config.session));
    if !session.is_authenticated() {
        tracing::warn!("No auth token configured; notifications will not be received");
    }

    let metrics = Arc::new(PipelineMetrics::new());
    let slot = Arc::new(CommandSlot::new());
    let api = Arc::new(NotificationApi::new(&config.api, Arc::clone(&session))?);
    let receipts: Arc<dyn ReadReceiptSink> = match config.api.read_receipts {
        ReadReceiptTransport::Socket => Arc::new(SocketReadReceipts::new(Arc::clone(&slot))),
        ReadReceiptTransport::Rest => api.clone(),
    };
    let source = WebSocketSource::new(&config.connection).with_metrics(Arc::clone(&metrics));

    let builder = NotificationEngine::builder()
        .connection(config.connection.clone())
        .delivery(config.delivery.clone())
        .effects(config.effects.clone())
        .source(Arc::new(source))
        .session(Arc::clone(&session))
        .read_receipts(receipts)
        .metrics(Arc::clone(&metrics))
        .command_slot(slot);
    let builder = attach_audio(builder);
    let engine = builder.build()?;

    let _deliveries = engine.on_delivery(|notification| {
        tracing::info!(
            notification_id = %notification.id,
            kind = %notification.kind,
            title = %notification.title,
            action_url = notification.action_url.as_deref().unwrap_or_default(),
            "Notification delivered"
        );
    });

    if session.is_authenticated() {
        match api.list_notifications().await {
            Ok(list) => engine.refresh(list),
            Err(e) => tracing::warn!(error = %e, "Initial notification fetch failed"),
        }
    }

    match engine.start().await {
        Ok(_) => {}
        Err(e) if e.is_remote() => {
            tracing::error!(error = %e, "Could not connect to the notification socket");
        }
        Err(e) => return Err(e),
    }
    tracing::info!(unread = engine.unread_count(), "Client running; press Ctrl-C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }

    tracing::info!("Shutting down");
    engine.shutdown();
    let snapshot = engine.metrics();
    tracing::info!(
        received = snapshot.events_received,
        delivered = snapshot.delivered,
        suppressed = snapshot.suppressed,
        malformed = snapshot.events_malformed,
        "Final pipeline counters"
    );
    Ok(())
}

#[cfg(feature = "cpal-audio")]
fn attach_audio(
    builder: chorus_realtime::NotificationEngineBuilder,
) -> chorus_realtime::NotificationEngineBuilder {
    match chorus_realtime::effects::CpalAudioSink::open() {
        Ok(sink) => builder.audio(Arc::new(sink)),
        Err(e) => {
            tracing::warn!(error = %e, "Audio output unavailable; tones disabled");
            builder
        }
    }
}

#[cfg(not(feature = "cpal-audio"))]
fn attach_audio(
    builder: chorus_realtime::NotificationEngineBuilder,
) -> chorus_realtime::NotificationEngineBuilder {
    tracing::debug!("Built without audio support; tones disabled");
    builder
}
