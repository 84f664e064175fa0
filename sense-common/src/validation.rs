//! Configuration validation.
//!
//! Checks that required values are present and within valid ranges before
//! any client is built from the configuration.

use thiserror::Error;

use crate::config::{ChartConfig, Config, ObservabilityConfig, ServiceConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

const RANGE_TOKENS: &[&str] = &["5d", "1w", "1m", "6m", "1y", "5y"];
const LOG_FORMATS: &[&str] = &["json", "pretty"];

impl Validate for Config {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors: Vec<ValidationError> = [
            self.service.validate(),
            self.chart.validate(),
            self.observability.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

impl Config {
    /// Validate once every override has been applied.
    pub fn validated(self) -> crate::Result<Self> {
        Validate::validate(&self).map_err(|e| crate::Error::Config(e.to_string()))?;
        Ok(self)
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "service.base_url".into(),
            });
        }

        let parsed = url::Url::parse(&self.base_url).map_err(|e| ValidationError::InvalidValue {
            field: "service.base_url".into(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidValue {
                field: "service.base_url".into(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "service.timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ChartConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.max_points == 0 {
            return Err(ValidationError::InvalidValue {
                field: "chart.max_points".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if !RANGE_TOKENS.contains(&self.default_range.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "chart.default_range".into(),
                reason: format!("expected one of {}", RANGE_TOKENS.join(", ")),
            });
        }

        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("expected one of {}", LOG_FORMATS.join(", ")),
            });
        }

        Ok(())
    }
}
