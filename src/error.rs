//! Error types.
//!
//! Two layers:
//!
//! - [`AnalysisError`]: typed failures of the analytical core (alignment,
//!   estimation, statistics). Library callers can match on these.
//! - [`AppError`]: the binary boundary. Carries a process exit code and a
//!   human-readable message.

use thiserror::Error;

use crate::app::pipeline::PipelineError;

/// Failures raised by the analysis core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Not enough observations to run a stage.
    #[error("insufficient data for {context}: found {found}, need at least {required}")]
    InsufficientData {
        context: String,
        found: usize,
        required: usize,
    },

    /// A required named series is absent.
    #[error("missing series '{series}'")]
    MissingSeries { series: String },

    /// Degenerate or malformed input (e.g. zero variance).
    #[error("invalid input for {context}: {reason}")]
    InvalidInput { context: String, reason: String },

    /// The data provider failed to deliver a series.
    #[error("failed to fetch '{series}': {message}")]
    Fetch { series: String, message: String },
}

impl AnalysisError {
    pub fn insufficient(context: impl Into<String>, found: usize, required: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            found,
            required,
        }
    }

    pub fn missing(series: impl Into<String>) -> Self {
        Self::MissingSeries {
            series: series.into(),
        }
    }

    pub fn invalid(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn fetch(series: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            series: series.into(),
            message: message.into(),
        }
    }

    /// Exit code used when this error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            AnalysisError::InsufficientData { .. } | AnalysisError::MissingSeries { .. } => 3,
            AnalysisError::InvalidInput { .. } | AnalysisError::Fetch { .. } => 4,
        }
    }
}

/// Convenience alias for core results.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(err.source.exit_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message_names_counts() {
        let err = AnalysisError::insufficient("alignment", 42, 100);
        assert_eq!(
            err.to_string(),
            "insufficient data for alignment: found 42, need at least 100"
        );
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn app_error_keeps_exit_code_from_analysis_error() {
        let app: AppError = AnalysisError::fetch("LQD", "timeout").into();
        assert_eq!(app.exit_code(), 4);
        assert_eq!(app.to_string(), "failed to fetch 'LQD': timeout");
    }
}
