//! Configuration validation
//!
//! Rules:
//! - capacities and retry delay are at least 1 (derived `Validate`)
//! - origins are absolute http(s) URLs
//! - production mode needs an origin to resolve relative endpoints against

use std::collections::BTreeMap;

use contracts::{ContractError, MuxConfig, RuntimeMode};
use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a MuxConfig
///
/// Returns the first error found, or Ok(()).
pub fn validate(config: &MuxConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_origins(config)?;
    validate_production_origin(config)?;
    Ok(())
}

/// Field-level rules declared on the config types
fn validate_fields(config: &MuxConfig) -> Result<(), ContractError> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_error("", &errors)
                .unwrap_or_else(|| ("config".to_string(), "invalid configuration".to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// Depth-first search for the first failing field, in field name order
fn first_error(prefix: &str, errors: &ValidationErrors) -> Option<(String, String)> {
    let sorted: BTreeMap<_, _> = errors.errors().iter().collect();

    for (field, kind) in sorted {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        let found = match kind {
            ValidationErrorsKind::Field(errs) => errs.first().map(|e| {
                let message = match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("failed '{}' check", e.code),
                };
                (path, message)
            }),
            ValidationErrorsKind::Struct(inner) => first_error(&path, inner),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_error(&format!("{path}[{idx}]"), inner)),
        };

        if found.is_some() {
            return found;
        }
    }
    None
}

fn validate_origins(config: &MuxConfig) -> Result<(), ContractError> {
    check_http_origin("upstream.dev_origin", &config.upstream.dev_origin)?;
    if let Some(origin) = &config.upstream.origin {
        check_http_origin("upstream.origin", origin)?;
    }
    Ok(())
}

fn check_http_origin(field: &str, value: &str) -> Result<(), ContractError> {
    let lower = value.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ContractError::config_validation(
            field,
            format!("'{value}' must be an absolute http(s) URL"),
        )),
    }
}

fn validate_production_origin(config: &MuxConfig) -> Result<(), ContractError> {
    if config.upstream.mode == RuntimeMode::Production && config.upstream.origin.is_none() {
        return Err(ContractError::config_validation(
            "upstream.origin",
            "production mode uses relative endpoints and needs an origin",
        ));
    }
    Ok(())
}
