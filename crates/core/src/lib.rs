//! Expense tracker core types and utilities

pub mod error;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ErrorContext};
pub use types::{RecordId, RecordKind};
pub use validation::{Validate, ValidateConfig, ValidationError};
