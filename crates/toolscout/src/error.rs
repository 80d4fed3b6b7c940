//! Error types for the research workflow.

use llm::LlmError;
use thiserror::Error;

/// Errors raised by the research components.
///
/// Only `Configuration` is fatal. Provider and validation failures are
/// absorbed inside the pipeline (skip the page, degrade the record).
#[derive(Error, Debug, Clone)]
pub enum ResearchError {
    #[error("Missing required API keys: {}", missing.join(", "))]
    Configuration { missing: Vec<String> },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Validation error: {reason}")]
    Validation {
        reason: String,
        defects: Vec<String>,
    },

    #[error("Template error: {0}")]
    Template(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl ResearchError {
    /// Shorthand for a validation failure without field-level detail.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
            defects: Vec::new(),
        }
    }
}

impl From<handlebars::RenderError> for ResearchError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for ResearchError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<reqwest::Error> for ResearchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Provider(err.to_string())
    }
}

/// Result alias for the research components.
pub type ResearchResult<T> = Result<T, ResearchError>;
