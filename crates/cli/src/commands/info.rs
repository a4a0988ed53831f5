//! `info` command implementation.

use anyhow::{Context, Result};
use catalog::{chart_config, dashboard_for, ChartConfig, DashboardSection, KNOWN_CHART_KEYS};
use contracts::{DeviceClass, GroupId, MuxConfig};
use multiplexer::StreamSelector;
use serde::Serialize;
use tracing::info;
use upstream::SseConnector;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ServiceInfo {
    mode: String,
    base: String,
    close_policy: String,
    queue_capacity: usize,
    listen: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<EndpointInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    charts: Vec<ChartInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dashboards: Vec<DashboardInfo>,
}

#[derive(Serialize)]
struct EndpointInfo {
    group: String,
    endpoint: String,
    /// Absolute URL the transport would request, if it can be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct ChartInfo {
    key: &'static str,
    #[serde(flatten)]
    config: ChartConfig,
}

#[derive(Serialize)]
struct DashboardInfo {
    device_class: &'static str,
    sections: &'static [DashboardSection],
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration info");
            config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => MuxConfig::default(),
    };

    let info = build_service_info(&config, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize service info")?;
        println!("{}", json);
    } else {
        print_service_info(&info);
    }

    Ok(())
}

fn build_service_info(config: &MuxConfig, args: &InfoArgs) -> ServiceInfo {
    let endpoint = args.group.as_deref().map(|group| {
        let group = GroupId::new(group);
        let endpoint = StreamSelector::from_config(&config.upstream).endpoint_for(&group);
        let resolved = SseConnector::from_config(&config.upstream)
            .and_then(|connector| connector.resolve(&endpoint));
        let (resolved, error) = match resolved {
            Ok(url) => (Some(url.to_string()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        EndpointInfo {
            group: group.as_str().to_string(),
            endpoint,
            resolved,
            error,
        }
    });

    let charts = if args.charts {
        KNOWN_CHART_KEYS
            .iter()
            .map(|&key| ChartInfo {
                key,
                config: chart_config(key),
            })
            .collect()
    } else {
        Vec::new()
    };

    let dashboards = if args.dashboard {
        DeviceClass::all()
            .into_iter()
            .map(|class| DashboardInfo {
                device_class: class.as_str(),
                sections: dashboard_for(class),
            })
            .collect()
    } else {
        Vec::new()
    };

    ServiceInfo {
        mode: format!("{:?}", config.upstream.mode),
        base: config.upstream.base().to_string(),
        close_policy: format!("{:?}", config.lifecycle.close_policy),
        queue_capacity: config.ports.queue_capacity,
        listen: config.gateway.listen.to_string(),
        endpoint,
        charts,
        dashboards,
    }
}

fn print_service_info(info: &ServiceInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  probe-mux Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("📡 Upstream");
    println!("   ├─ Mode: {}", info.mode);
    if info.base.is_empty() {
        println!("   └─ Base: (same origin)");
    } else {
        println!("   └─ Base: {}", info.base);
    }

    println!("\n🔀 Fan-out");
    println!("   ├─ Close policy: {}", info.close_policy);
    println!("   ├─ Port queue capacity: {}", info.queue_capacity);
    println!("   └─ Gateway: {}", info.listen);

    if let Some(endpoint) = &info.endpoint {
        println!("\n🎯 Group {}", endpoint.group);
        println!("   ├─ Endpoint: {}", endpoint.endpoint);
        match (&endpoint.resolved, &endpoint.error) {
            (Some(url), _) => println!("   └─ Resolved: {}", url),
            (None, Some(error)) => println!("   └─ Unresolvable: {}", error),
            (None, None) => println!("   └─ Unresolvable"),
        }
    }

    if !info.charts.is_empty() {
        println!("\n📈 Charts ({})", info.charts.len());
        for (i, chart) in info.charts.iter().enumerate() {
            let prefix = if i == info.charts.len() - 1 { "└─" } else { "├─" };
            println!(
                "   {} {}: {} [{}]",
                prefix,
                chart.key,
                chart.config.title,
                chart.config.y_axis_name
            );
        }
    }

    for dashboard in &info.dashboards {
        println!("\n🧭 Dashboard {}", dashboard.device_class);
        for (i, section) in dashboard.sections.iter().enumerate() {
            let prefix = if i == dashboard.sections.len() - 1 { "└─" } else { "├─" };
            println!("   {} {} ({})", prefix, section.title, section.key);
        }
    }

    println!();
}
