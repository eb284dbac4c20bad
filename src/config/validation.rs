//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempt budgets >= 1)
//! - Check that endpoint URLs and bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::RelayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "chain.rpc_url").
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".into(),
            message: format!("'{}' is not a valid socket address", config.listener.bind_address),
        });
    }

    if config.listener.max_sessions == 0 {
        errors.push(ValidationError {
            field: "listener.max_sessions".into(),
            message: "must be at least 1".into(),
        });
    }

    if config.chain.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError {
            field: "chain.rpc_url".into(),
            message: format!("'{}' is not a valid URL", config.chain.rpc_url),
        });
    }

    for (i, failover) in config.chain.failover_urls.iter().enumerate() {
        if failover.parse::<url::Url>().is_err() {
            errors.push(ValidationError {
                field: format!("chain.failover_urls[{}]", i),
                message: format!("'{}' is not a valid URL", failover),
            });
        }
    }

    if config.chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "chain.rpc_timeout_secs".into(),
            message: "must be at least 1".into(),
        });
    }

    if config.chain.gas_price_multiplier < 1.0 {
        errors.push(ValidationError {
            field: "chain.gas_price_multiplier".into(),
            message: "must be >= 1.0".into(),
        });
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError {
            field: "retries.max_attempts".into(),
            message: "must be at least 1 (the first attempt)".into(),
        });
    }

    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError {
            field: "retries.base_delay_ms".into(),
            message: "must not exceed retries.max_delay_ms".into(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address".into(),
            message: format!(
                "'{}' is not a valid socket address",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = RelayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.retries.max_attempts = 0;
        config.chain.rpc_timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
        assert!(errors.iter().any(|e| e.field == "retries.max_attempts"));
    }

    #[test]
    fn rejects_inverted_backoff_bounds() {
        let mut config = RelayConfig::default();
        config.retries.base_delay_ms = 5_000;
        config.retries.max_delay_ms = 100;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "retries.base_delay_ms");
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = RelayConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
