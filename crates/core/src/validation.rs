//! Client-side validation support
//!
//! Request payloads are checked field by field before anything is put on
//! the wire. A failed check names the offending field so the caller can
//! show the message next to it.

use config::ConfigError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single failed field check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trait for payloads that can be checked before dispatch
pub trait Validate {
    /// Returns the first failing field check, if any
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Trait for validating configuration values
pub trait ValidateConfig: Serialize + for<'de> Deserialize<'de> {
    /// Validate the configuration
    ///
    /// Returns Ok(()) if valid, or an error describing what's wrong
    fn validate(&self) -> Result<(), ConfigError>;
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        Self::Message(err.to_string())
    }
}

/// Common validation helpers
pub mod validators {
    use super::ValidationError;
    use chrono::NaiveDate;

    /// Earliest year the API accepts in month/year queries
    pub const MIN_YEAR: i32 = 1970;
    /// Latest year the API accepts in month/year queries
    pub const MAX_YEAR: i32 = 9999;

    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field: &'static str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new(field, "cannot be empty"));
        }
        Ok(())
    }

    /// Validate URL format
    pub fn validate_url(url: &str, field: &'static str) -> Result<(), ValidationError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| ValidationError::new(field, format!("invalid URL - {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::new(field, "URL scheme must be http or https"));
        }
        Ok(())
    }

    /// Validate email format (basic check)
    pub fn validate_email(email: &str, field: &'static str) -> Result<(), ValidationError> {
        let mut parts = email.split('@');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
        );
        if !valid {
            return Err(ValidationError::new(field, "invalid email format"));
        }
        Ok(())
    }

    /// Validate that a value is within range
    pub fn validate_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        field: &'static str,
    ) -> Result<(), ValidationError> {
        if value < min || value > max {
            return Err(ValidationError::new(
                field,
                format!("must be between {min} and {max}"),
            ));
        }
        Ok(())
    }

    /// Validate that an amount is a finite number strictly greater than zero
    pub fn validate_positive(amount: f64, field: &'static str) -> Result<(), ValidationError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::new(field, "must be a positive amount"));
        }
        Ok(())
    }

    /// Validate that an amount is a finite number no lower than zero
    pub fn validate_non_negative(amount: f64, field: &'static str) -> Result<(), ValidationError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::new(field, "cannot be negative"));
        }
        Ok(())
    }

    /// Validate a month (1-12) and year pair used by monthly queries
    pub fn validate_month_year(month: u32, year: i32) -> Result<(), ValidationError> {
        validate_range(month, 1, 12, "month")?;
        validate_range(year, MIN_YEAR, MAX_YEAR, "year")
    }

    /// Validate a server-assigned record id
    pub fn validate_id(id: i64, field: &'static str) -> Result<(), ValidationError> {
        if id <= 0 {
            return Err(ValidationError::new(field, "must be a positive id"));
        }
        Ok(())
    }

    /// Validate that a date is not after `today`
    pub fn validate_not_future(
        date: NaiveDate,
        today: NaiveDate,
        field: &'static str,
    ) -> Result<(), ValidationError> {
        if date > today {
            return Err(ValidationError::new(field, "cannot be in the future"));
        }
        Ok(())
    }

    /// Validate that a date is strictly after `today`
    pub fn validate_strictly_future(
        date: NaiveDate,
        today: NaiveDate,
        field: &'static str,
    ) -> Result<(), ValidationError> {
        if date <= today {
            return Err(ValidationError::new(field, "must be in the future"));
        }
        Ok(())
    }
}
