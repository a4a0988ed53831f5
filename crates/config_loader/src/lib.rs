//! # Config Loader
//!
//! Loads the multiplexer configuration.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate the result
//! - Produce a `MuxConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("probe-mux.toml")).unwrap();
//! println!("queue capacity: {}", config.ports.queue_capacity);
//! ```

mod parser;
mod validator;

pub use contracts::MuxConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file, format chosen by extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<MuxConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<MuxConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Load `path` when given, the defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<MuxConfig, ContractError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(MuxConfig::default()),
        }
    }

    /// Validate a configuration assembled in code (e.g. after CLI overrides)
    pub fn validate(config: &MuxConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize to a TOML string
    pub fn to_toml(config: &MuxConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize to a JSON string
    pub fn to_json(config: &MuxConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<MuxConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ClosePolicy;
    use std::io::Write;

    const SAMPLE_TOML: &str = r#"
[upstream]
mode = "development"
dev_origin = "https://10.1.2.3:8655"
accept_invalid_certs = true

[ports]
queue_capacity = 16

[lifecycle]
close_policy = "ref_counted"

[gateway]
listen = "127.0.0.1:9000"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.upstream.base(), "https://10.1.2.3:8655");
        assert_eq!(config.ports.queue_capacity, 16);
        assert_eq!(config.lifecycle.close_policy, ClosePolicy::RefCounted);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(again.upstream.dev_origin, config.upstream.dev_origin);
        assert_eq!(again.gateway.listen, config.gateway.listen);
    }

    #[test]
    fn test_toml_to_json() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(again.lifecycle.close_policy, ClosePolicy::RefCounted);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let result = ConfigLoader::load_from_str("[ports]\nqueue_capacity = 0\n", ConfigFormat::Toml);
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }), "{err}");
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE_TOML.as_bytes()).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.ports.queue_capacity, 16);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }

    #[test]
    fn test_sample_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/probe-mux.toml");
        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert!(config.upstream.accept_invalid_certs);
        assert_eq!(config.gateway.listen.port(), 8700);
    }

    #[test]
    fn test_load_or_default() {
        let config = ConfigLoader::load_or_default(None).unwrap();
        assert_eq!(config.ports.queue_capacity, 64);
    }
}
