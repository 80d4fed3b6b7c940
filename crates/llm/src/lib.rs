//! Language model integration for the research workflow.
//!
//! This crate provides:
//! - The `AIProvider` abstraction shared by every model-backed component
//! - An OpenAI chat completions provider
//! - Helpers for pulling structured JSON out of free-form model output

pub mod error;
pub mod openai;
pub mod provider;

// Re-exports
pub use error::{LlmError, LlmResult};
pub use openai::OpenAIProvider;
pub use provider::{
    extract_json_text, parse_ai_response, AIMessage, AIProvider, AIResponse, AIRole,
    GenerateOptions, MessageBuilder, TokenUsage,
};
