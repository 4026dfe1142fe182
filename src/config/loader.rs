//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::SubmitterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SubmitterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    tracing::info!(
        path = %path.display(),
        lcd_url = %config.ledger.lcd_url,
        chain_id = %config.ledger.chain_id,
        "Configuration loaded"
    );

    Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<SubmitterConfig, ConfigError> {
    let config: SubmitterConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[ledger]
lcd_url = "http://localhost:1317"
failover_urls = ["http://localhost:1318"]
chain_id = "localterra"
request_timeout_secs = 30

[signer]
account_address = "terra1gfu9uymnr04amjtssfamzymuwna303awyz9kch"

[retries]
max_attempts = 8
base_delay_ms = 100
sequence_conflict_codes = [{ codespace = "sdk", code = 32 }]

[fees.execute]
gas_limit = 2000000
amount = "500000uusd"

[observability]
log_format = "json"
"#;

    #[test]
    fn test_parse_config() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.ledger.chain_id, "localterra");
        assert_eq!(config.ledger.failover_urls.len(), 1);
        assert_eq!(config.ledger.broadcast_mode, "block");
        assert_eq!(config.retries.max_attempts, 8);
        assert_eq!(config.retries.max_delay_ms, 4000);
        assert_eq!(config.retries.sequence_conflict_codes[0].code, 32);
        assert_eq!(config.fees.execute.gas_limit, 2_000_000);
        assert_eq!(config.fees.store_code.gas_limit, 10_000_000);
        assert_eq!(
            config.signer.account_address.as_deref(),
            Some("terra1gfu9uymnr04amjtssfamzymuwna303awyz9kch")
        );
        assert_eq!(config.observability.log_format, "json");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.ledger.lcd_url, "https://bombay-lcd.terra.dev");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[ledger\nchain_id = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_lists_every_problem() {
        let err = parse_config(
            r#"
[ledger]
chain_id = ""
request_timeout_secs = 0
"#,
        )
        .unwrap_err();
        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("Validation failed: "));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ledger.lcd_url, "http://localhost:1317");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/submitter.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
