//! Custom error types for the sales insights pipeline.
//!
//! This module provides the error hierarchy using `thiserror` so that every
//! stage (loading, cleaning, aggregation, rendering) fails with a descriptive,
//! machine-identifiable error instead of continuing on a wrong assumption.
//!
//! Errors are serializable so the CLI can emit them as JSON (`--json`).

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the sales pipeline.
#[derive(Error, Debug)]
pub enum SalesError {
    /// Input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Header has a different number of columns than the schema.
    #[error("Expected {expected} columns but the input has {found}")]
    ColumnCountMismatch { expected: usize, found: usize },

    /// Header names do not match the schema.
    #[error(
        "Schema mismatch: missing columns [{}], unexpected columns [{}]",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A cell could not be parsed into the column's type.
    #[error("Invalid value '{value}' in column '{column}' at row {row}: expected {expected}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
        expected: String,
    },

    /// A column carries a different type than the stage requires.
    #[error("Column '{column}' has type {found}, expected {expected}")]
    InvalidColumnType {
        column: String,
        expected: String,
        found: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Chart rendering failed.
    #[error("Failed to render chart: {0}")]
    ChartRenderingFailed(String),

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SalesError>,
    },
}

impl SalesError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SalesError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for machine consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "INPUT_NOT_FOUND",
            Self::ColumnCountMismatch { .. } => "COLUMN_COUNT_MISMATCH",
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::InvalidColumnType { .. } => "INVALID_COLUMN_TYPE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ChartRenderingFailed(_) => "CHART_RENDERING_FAILED",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error comes from the input not matching the expected schema.
    pub fn is_schema_error(&self) -> bool {
        match self {
            Self::ColumnCountMismatch { .. }
            | Self::SchemaMismatch { .. }
            | Self::ColumnNotFound(_) => true,
            Self::WithContext { source, .. } => source.is_schema_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for SalesError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("SalesError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, SalesError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SalesError::Polars(e).with_context(context))
    }
}

impl From<crate::config::ConfigValidationError> for SalesError {
    fn from(error: crate::config::ConfigValidationError) -> Self {
        SalesError::InvalidConfig(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            SalesError::ColumnNotFound("Age".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            SalesError::ColumnCountMismatch {
                expected: 9,
                found: 8
            }
            .error_code(),
            "COLUMN_COUNT_MISMATCH"
        );
    }

    #[test]
    fn test_schema_mismatch_message_lists_columns() {
        let error = SalesError::SchemaMismatch {
            missing: vec!["Date".to_string(), "Age".to_string()],
            unexpected: vec!["2023-11-24".to_string()],
        };
        let message = error.to_string();
        assert!(message.contains("missing columns [Date, Age]"));
        assert!(message.contains("unexpected columns [2023-11-24]"));
    }

    #[test]
    fn test_is_schema_error() {
        assert!(
            SalesError::SchemaMismatch {
                missing: vec![],
                unexpected: vec![],
            }
            .is_schema_error()
        );
        assert!(
            SalesError::ColumnNotFound("Date".to_string())
                .with_context("Loading")
                .is_schema_error()
        );
        assert!(!SalesError::InvalidConfig("bad".to_string()).is_schema_error());
    }

    #[test]
    fn test_config_validation_error_converts() {
        let error: SalesError = crate::config::ConfigValidationError::InvalidYear(0).into();
        assert_eq!(error.error_code(), "INVALID_CONFIG");
        assert_eq!(
            error.to_string(),
            "Invalid configuration: Invalid target year: 0 (must be between 1 and 9999)"
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = SalesError::InvalidValue {
            column: "Date".to_string(),
            row: 3,
            value: "not-a-date".to_string(),
            expected: "date".to_string(),
        };
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("INVALID_VALUE"));
        assert!(json.contains("not-a-date"));
    }

    #[test]
    fn test_with_context() {
        let error = SalesError::ColumnNotFound("Date".to_string()).with_context("During filtering");
        assert!(error.to_string().contains("During filtering"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND"); // Preserves original code
    }
}
