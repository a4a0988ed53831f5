//! `watch` command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use observability::DeliveryAggregator;
use tracing::{info, warn};

use super::{load_config, start_service};
use crate::cli::WatchArgs;
use crate::signal::shutdown_signal;

/// Execute the `watch` command
pub async fn run_watch(args: &WatchArgs) -> Result<()> {
    let config = load_config(&args.service).context("Failed to load configuration")?;
    let (handle, service_task) =
        start_service(&args.service, config).context("Failed to start multiplexer")?;

    let mut port = handle.attach().await?;
    port.connect(args.group.as_str()).await?;
    info!(port = %port.id(), group = %args.group, "Watching group");

    let max_messages = (args.max_messages > 0).then_some(args.max_messages);
    let timeout = async {
        if args.timeout > 0 {
            tokio::time::sleep(Duration::from_secs(args.timeout)).await;
        } else {
            std::future::pending::<()>().await;
        }
    };
    tokio::pin!(timeout);
    let signal = shutdown_signal();
    tokio::pin!(signal);

    let mut aggregator = DeliveryAggregator::new();
    loop {
        tokio::select! {
            message = port.recv() => {
                let Some(message) = message else {
                    warn!("Stream ended by the multiplexer");
                    break;
                };
                aggregator.update(&message);
                info!(
                    source = %message.source,
                    device_class = message.device_class.as_str(),
                    group = message.group_id,
                    items = message.metrics.len(),
                    "Telemetry batch"
                );
                if max_messages.is_some_and(|max| aggregator.total_messages >= max) {
                    info!(count = aggregator.total_messages, "Message limit reached");
                    break;
                }
            }
            _ = &mut timeout => {
                info!("Watch timeout reached");
                break;
            }
            _ = &mut signal => {
                warn!("Received shutdown signal");
                break;
            }
        }
    }

    let metrics = port.metrics();
    port.close_stream().await.ok();
    port.detach().await;
    handle.shutdown().await;
    if let Err(e) = service_task.await {
        warn!(error = %e, "Multiplexer task ended abnormally");
    }

    println!("{}", aggregator.summary());
    println!("Dropped at this viewer: {}", metrics.dropped_count);
    Ok(())
}
