//! `run` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use multiplexer::MultiplexerHandle;
use tracing::{info, warn};

use super::{load_config, start_service};
use crate::cli::RunArgs;
use crate::gateway::Gateway;
use crate::signal::shutdown_signal;

/// Execute the `run` command
pub async fn run_service(args: &RunArgs) -> Result<()> {
    let mut config = load_config(&args.service).context("Failed to load configuration")?;
    if let Some(listen) = args.listen {
        info!(listen = %listen, "Overriding gateway listen address from CLI");
        config.gateway.listen = listen;
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    info!(
        mode = ?config.upstream.mode,
        base = %config.upstream.base(),
        close_policy = ?config.lifecycle.close_policy,
        queue_capacity = config.ports.queue_capacity,
        mock = args.service.mock,
        "Configuration loaded"
    );

    let listen = config.gateway.listen;
    let (handle, service_task) =
        start_service(&args.service, config).context("Failed to start multiplexer")?;

    let gateway = Gateway::bind(listen, handle.clone())
        .await
        .context("Failed to start viewer gateway")?;

    let stats_task = (args.stats_interval > 0).then(|| {
        tokio::spawn(log_stats(
            handle.clone(),
            Duration::from_secs(args.stats_interval),
        ))
    });

    let result = gateway.serve(shutdown_signal()).await;
    if let Err(ref e) = result {
        warn!(error = %e, "Viewer gateway stopped unexpectedly");
    }

    info!("Shutting down multiplexer...");
    handle.shutdown().await;
    if let Some(task) = stats_task {
        task.abort();
    }
    if let Err(e) = service_task.await {
        warn!(error = %e, "Multiplexer task ended abnormally");
    }

    result.context("Viewer gateway failed")?;
    info!("probe-mux finished");
    Ok(())
}

/// Periodically log service statistics until the service stops
async fn log_stats(handle: MultiplexerHandle, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Ok(stats) = handle.stats().await else {
            break;
        };
        let dropped: u64 = stats
            .port_metrics
            .iter()
            .map(|(_, metrics)| metrics.dropped_count)
            .sum();
        info!(
            ports = stats.ports,
            interested = stats.interested_ports,
            lifecycle = ?stats.lifecycle,
            ready_state = ?stats.ready_state,
            url = stats.connection_url.as_deref().unwrap_or("-"),
            received = stats.messages_received,
            malformed = stats.malformed_payloads,
            stale = stats.stale_events,
            dropped,
            "Multiplexer statistics"
        );
    }
}
