use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mediagen_events::{EventBus, InMemoryStepStore};
use mediagen_pipeline::{
    DummyGenerator, Generator, HttpUsageSink, Identity, ObservedGenerator, ProviderRouter, Sidecar,
    TracingUsageSink, UsageSink,
};
use mediagen_worker::{LogFormat, StepHandler, WorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "mediagen_worker=info,mediagen_providers=info,mediagen_pipeline=info";

/// How long in-flight steps may keep running after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env().context("invalid worker configuration")?;
    init_tracing(config.log_format);

    tracing::info!(
        coordination_env = %config.coordination_env,
        dummy_mode = config.dummy_mode,
        video_backend = %config.providers.video_backend,
        "Worker starting",
    );

    // --- Generators ---
    let sidecar = Sidecar::new(
        Identity::resolve(config.worker_name.as_deref()),
        usage_sink(&config)?,
    );
    let dummy: Arc<dyn Generator> = Arc::new(DummyGenerator::new());
    let live: Arc<dyn Generator> = match ProviderRouter::from_settings(&config.providers) {
        Ok(router) => Arc::new(ObservedGenerator::new(router, sidecar)),
        Err(e) if config.dummy_mode => {
            tracing::info!(error = %e, "Live providers not configured, dummy mode only");
            Arc::clone(&dummy)
        }
        Err(e) => return Err(e).context("failed to configure providers"),
    };

    // --- Coordination boundary ---
    let store = Arc::new(InMemoryStepStore::new());
    let bus = Arc::new(EventBus::default());
    let handler = Arc::new(StepHandler::new(store.clone(), live, dummy, config.dummy_mode));

    // --- Runner ---
    let cancel = CancellationToken::new();
    let runner = tokio::spawn(mediagen_worker::run(
        bus.subscribe(),
        handler,
        cancel.clone(),
    ));
    tracing::info!("Worker ready, waiting for pending steps");

    if config.feed_stdin {
        let (store, bus, cancel) = (Arc::clone(&store), Arc::clone(&bus), cancel.clone());
        tokio::spawn(async move {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            mediagen_worker::feed_lines(stdin, &store, &bus, cancel).await;
        });
    }

    shutdown_signal().await;
    cancel.cancel();

    let tracker = runner.await.context("step runner panicked")?;
    if tokio::time::timeout(DRAIN_TIMEOUT, tracker.wait()).await.is_err() {
        tracing::warn!(
            in_flight = tracker.len(),
            "Drain timeout elapsed, abandoning in-flight steps",
        );
    }

    tracing::info!("Worker stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn usage_sink(config: &WorkerConfig) -> anyhow::Result<Arc<dyn UsageSink>> {
    match &config.usage_log_url {
        Some(url) => {
            let sink = HttpUsageSink::new(
                url.clone(),
                config.usage_log_key.clone(),
                config.providers.http_timeout,
            )
            .context("failed to build usage sink")?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(TracingUsageSink)),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
