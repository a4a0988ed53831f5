//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ClosePolicy, MuxConfig, RuntimeMode};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    mode: RuntimeMode,
    base: String,
    close_policy: ClosePolicy,
    queue_capacity: usize,
    listen: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    mode: config.upstream.mode,
                    base: config.upstream.base().to_string(),
                    close_policy: config.lifecycle.close_policy,
                    queue_capacity: config.ports.queue_capacity,
                    listen: config.gateway.listen.to_string(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Non-fatal issues worth pointing out
fn collect_warnings(config: &MuxConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.upstream.accept_invalid_certs {
        warnings.push(
            "upstream.accept_invalid_certs is set - TLS certificates are not verified".to_string(),
        );
    }

    if config.upstream.mode == RuntimeMode::Production
        && config.upstream.dev_origin != contracts::DEFAULT_DEV_ORIGIN
    {
        warnings.push("upstream.dev_origin is ignored in production mode".to_string());
    }

    if config.ports.queue_capacity < 4 {
        warnings.push(format!(
            "ports.queue_capacity = {} - slow viewers will drop most batches",
            config.ports.queue_capacity
        ));
    }

    if !config.gateway.listen.ip().is_loopback() {
        warnings.push(format!(
            "gateway.listen = {} - viewer gateway is reachable from the network",
            config.gateway.listen
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Mode: {:?}", summary.mode);
            let base = if summary.base.is_empty() {
                "(same origin)"
            } else {
                summary.base.as_str()
            };
            println!("  Base: {}", base);
            println!("  Close policy: {:?}", summary.close_policy);
            println!("  Port queue capacity: {}", summary.queue_capacity);
            println!("  Gateway: {}", summary.listen);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
