//! Prompt template management.

use handlebars::{no_escape, Handlebars};
use serde::Serialize;

use crate::error::ResearchResult;

/// Manages Handlebars prompt templates.
pub struct PromptManager {
    handlebars: Handlebars<'static>,
}

impl PromptManager {
    /// Create a new prompt manager with embedded templates.
    pub fn new() -> ResearchResult<Self> {
        let mut handlebars = Handlebars::new();
        // Prompts are plain text; HTML escaping would mangle scraped content.
        handlebars.register_escape_fn(no_escape);

        handlebars.register_partial("company_fields", COMPANY_FIELDS_PARTIAL)?;
        handlebars.register_template_string("extract", EXTRACT_TEMPLATE)?;
        handlebars.register_template_string("extract_retry", EXTRACT_RETRY_TEMPLATE)?;
        handlebars.register_template_string("synthesize", SYNTHESIZE_TEMPLATE)?;
        handlebars.register_template_string("describe", DESCRIBE_TEMPLATE)?;
        handlebars.register_template_string("analyze", ANALYZE_TEMPLATE)?;
        handlebars.register_template_string("compare", COMPARE_TEMPLATE)?;
        handlebars.register_template_string("recommend", RECOMMEND_TEMPLATE)?;

        Ok(Self { handlebars })
    }

    /// Render a template with the given data.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> ResearchResult<String> {
        let result = self.handlebars.render(template, data)?;
        Ok(result)
    }
}

/// System prompt for extraction and synthesis calls.
pub const RESEARCH_SYSTEM_PROMPT: &str = concat!(
    "You are a knowledgeable research assistant for developer tools and companies. ",
    "You only report facts you are confident about and always respond with valid JSON."
);

/// System prompt for the analysis call.
pub const ANALYSIS_SYSTEM_PROMPT: &str = concat!(
    "You are an expert technical analyst specializing in developer tools ",
    "and technology recommendations."
);

/// System prompt for comparisons.
pub const COMPARISON_SYSTEM_PROMPT: &str =
    "You are an expert technical analyst specializing in technology comparisons.";

/// System prompt for recommendations.
pub const RECOMMENDATION_SYSTEM_PROMPT: &str =
    "You are an expert technical consultant providing personalized technology recommendations.";

/// Field list shared by every prompt that asks for company records.
const COMPANY_FIELDS_PARTIAL: &str = include_str!("../templates/company_fields.hbs");

/// Extraction prompt template.
const EXTRACT_TEMPLATE: &str = include_str!("../templates/extract.hbs");

/// Corrective prompt sent after an unusable extraction reply.
const EXTRACT_RETRY_TEMPLATE: &str = include_str!("../templates/extract_retry.hbs");

/// Gap-fill prompt template.
const SYNTHESIZE_TEMPLATE: &str = include_str!("../templates/synthesize.hbs");

/// Single company knowledge prompt template.
const DESCRIBE_TEMPLATE: &str = include_str!("../templates/describe.hbs");

/// Analysis prompt template.
const ANALYZE_TEMPLATE: &str = include_str!("../templates/analyze.hbs");

/// Comparison prompt template.
const COMPARE_TEMPLATE: &str = include_str!("../templates/compare.hbs");

/// Recommendation prompt template.
const RECOMMEND_TEMPLATE: &str = include_str!("../templates/recommend.hbs");
