//! Comparative analysis, comparisons and recommendations.

use std::fmt;
use std::sync::Arc;

use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::Table;
use llm::{AIMessage, AIProvider, GenerateOptions};
use serde_json::json;

use crate::config::ResearchConfig;
use crate::error::{ResearchError, ResearchResult};
use crate::model::CompanyRecord;
use crate::prompts::{
    PromptManager, ANALYSIS_SYSTEM_PROMPT, COMPARISON_SYSTEM_PROMPT, RECOMMENDATION_SYSTEM_PROMPT,
};

/// Returned by `analyze` for an empty company list.
pub const NO_RESULTS_MESSAGE: &str =
    "No companies or tools found for the given query. Please try a different search term.";

/// Returned by `compare` for an empty company list.
pub const NO_COMPANIES_TO_COMPARE: &str = "No companies to compare.";

/// Returned by `recommend` for an empty company list.
pub const NO_COMPANIES_FOR_RECOMMENDATIONS: &str = "No companies available for recommendations.";

/// List items shown per cell.
const MAX_LIST_ITEMS: usize = 5;

/// Characters of description shown per cell.
const MAX_DESCRIPTION_CHARS: usize = 300;

/// A record field companies can be compared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Website,
    Description,
    PricingModel,
    IsOpenSource,
    TechStack,
    LanguageSupport,
    ApiAvailable,
    IntegrationCapabilities,
    Category,
    GithubUrl,
    DocumentationUrl,
}

impl Criterion {
    /// Every criterion, in record field order.
    #[must_use]
    pub fn all() -> &'static [Criterion] {
        &[
            Criterion::Website,
            Criterion::Description,
            Criterion::PricingModel,
            Criterion::IsOpenSource,
            Criterion::TechStack,
            Criterion::LanguageSupport,
            Criterion::ApiAvailable,
            Criterion::IntegrationCapabilities,
            Criterion::Category,
            Criterion::GithubUrl,
            Criterion::DocumentationUrl,
        ]
    }

    /// Parse a criterion from a field name or common alias.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "website" | "url" => Some(Criterion::Website),
            "description" => Some(Criterion::Description),
            "pricing_model" | "pricing" | "price" => Some(Criterion::PricingModel),
            "is_open_source" | "open_source" | "oss" => Some(Criterion::IsOpenSource),
            "tech_stack" | "stack" => Some(Criterion::TechStack),
            "language_support" | "languages" => Some(Criterion::LanguageSupport),
            "api_available" | "api" => Some(Criterion::ApiAvailable),
            "integration_capabilities" | "integrations" => {
                Some(Criterion::IntegrationCapabilities)
            }
            "category" => Some(Criterion::Category),
            "github_url" | "github" | "repository" => Some(Criterion::GithubUrl),
            "documentation_url" | "documentation" | "docs" => Some(Criterion::DocumentationUrl),
            _ => None,
        }
    }

    /// Parse a list of criteria, dropping unknown names. Empty input or no
    /// recognized names means every criterion.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Vec<Criterion> {
        let mut criteria = Vec::new();
        for name in names {
            match Criterion::parse(name.as_ref()) {
                Some(c) if !criteria.contains(&c) => criteria.push(c),
                Some(_) => {}
                None => tracing::warn!(criterion = name.as_ref(), "Ignoring unknown criterion"),
            }
        }
        if criteria.is_empty() {
            Criterion::all().to_vec()
        } else {
            criteria
        }
    }

    /// Column header.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Criterion::Website => "Website",
            Criterion::Description => "Description",
            Criterion::PricingModel => "Pricing",
            Criterion::IsOpenSource => "Open Source",
            Criterion::TechStack => "Tech Stack",
            Criterion::LanguageSupport => "Language Support",
            Criterion::ApiAvailable => "API Available",
            Criterion::IntegrationCapabilities => "Integrations",
            Criterion::Category => "Category",
            Criterion::GithubUrl => "GitHub",
            Criterion::DocumentationUrl => "Documentation",
        }
    }

    /// Cell text for a record.
    fn value(self, company: &CompanyRecord) -> String {
        match self {
            Criterion::Website => optional(company.website.as_deref()),
            Criterion::Description => company
                .description
                .as_deref()
                .map(|d| truncate_chars(d, MAX_DESCRIPTION_CHARS))
                .unwrap_or_else(|| "N/A".to_string()),
            Criterion::PricingModel => company.pricing_model.to_string(),
            Criterion::IsOpenSource => yes_no(company.is_open_source).to_string(),
            Criterion::TechStack => list(&company.tech_stack),
            Criterion::LanguageSupport => list(&company.language_support),
            Criterion::ApiAvailable => match company.api_available {
                Some(available) => yes_no(available).to_string(),
                None => "Unknown".to_string(),
            },
            Criterion::IntegrationCapabilities => list(&company.integration_capabilities),
            Criterion::Category => optional(company.category.as_deref()),
            Criterion::GithubUrl => optional(company.github_url.as_deref()),
            Criterion::DocumentationUrl => optional(company.documentation_url.as_deref()),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Criterion::Website => "website",
            Criterion::Description => "description",
            Criterion::PricingModel => "pricing_model",
            Criterion::IsOpenSource => "is_open_source",
            Criterion::TechStack => "tech_stack",
            Criterion::LanguageSupport => "language_support",
            Criterion::ApiAvailable => "api_available",
            Criterion::IntegrationCapabilities => "integration_capabilities",
            Criterion::Category => "category",
            Criterion::GithubUrl => "github_url",
            Criterion::DocumentationUrl => "documentation_url",
        };
        write!(f, "{s}")
    }
}

/// Render companies as a markdown table with a name column plus `criteria`.
pub fn companies_table(companies: &[CompanyRecord], criteria: &[Criterion]) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);

    let mut header = vec!["Name".to_string()];
    header.extend(criteria.iter().map(|c| c.label().to_string()));
    table.set_header(header);

    for company in companies {
        let mut row = vec![cell(&company.name)];
        row.extend(criteria.iter().map(|c| cell(&c.value(company))));
        table.add_row(row);
    }

    table.to_string()
}

/// Generates prose from research results.
pub struct Analyst {
    provider: Arc<dyn AIProvider>,
    prompts: Arc<PromptManager>,
    model: String,
    options: GenerateOptions,
}

impl Analyst {
    /// Create an analyst.
    pub fn new(
        provider: Arc<dyn AIProvider>,
        prompts: Arc<PromptManager>,
        config: &ResearchConfig,
    ) -> Self {
        Self {
            provider,
            prompts,
            model: config.llm_model.clone(),
            options: GenerateOptions {
                temperature: Some(config.analysis_temperature),
                max_tokens: Some(config.max_tokens),
                ..Default::default()
            },
        }
    }

    /// Comparative summary and recommendation for a query's results.
    pub async fn analyze(
        &self,
        query: &str,
        companies: &[CompanyRecord],
    ) -> ResearchResult<String> {
        if companies.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }

        let prompt = self.prompts.render(
            "analyze",
            &json!({
                "query": query,
                "companies": companies_table(companies, Criterion::all()),
            }),
        )?;

        tracing::info!(query, companies = companies.len(), "Generating analysis");
        self.generate(ANALYSIS_SYSTEM_PROMPT, prompt).await
    }

    /// Compare companies on the given criteria (all fields when empty).
    pub async fn compare(
        &self,
        companies: &[CompanyRecord],
        criteria: &[Criterion],
    ) -> ResearchResult<String> {
        if companies.is_empty() {
            return Ok(NO_COMPANIES_TO_COMPARE.to_string());
        }

        let criteria = if criteria.is_empty() {
            Criterion::all()
        } else {
            criteria
        };
        let names: Vec<String> = criteria.iter().map(ToString::to_string).collect();

        let prompt = self.prompts.render(
            "compare",
            &json!({
                "criteria": names.join(", "),
                "companies": companies_table(companies, criteria),
            }),
        )?;

        tracing::info!(companies = companies.len(), criteria = ?names, "Generating comparison");
        self.generate(COMPARISON_SYSTEM_PROMPT, prompt).await
    }

    /// Recommendations tailored to optional user requirements.
    pub async fn recommend(
        &self,
        companies: &[CompanyRecord],
        requirements: Option<&str>,
    ) -> ResearchResult<String> {
        if companies.is_empty() {
            return Ok(NO_COMPANIES_FOR_RECOMMENDATIONS.to_string());
        }

        let requirements = requirements.map(str::trim).filter(|r| !r.is_empty());
        let prompt = self.prompts.render(
            "recommend",
            &json!({
                "requirements": requirements,
                "companies": companies_table(companies, Criterion::all()),
            }),
        )?;

        tracing::info!(
            companies = companies.len(),
            has_requirements = requirements.is_some(),
            "Generating recommendations"
        );
        self.generate(RECOMMENDATION_SYSTEM_PROMPT, prompt).await
    }

    async fn generate(&self, system: &str, prompt: String) -> ResearchResult<String> {
        let messages = vec![AIMessage::system(system), AIMessage::user(prompt)];
        let response = self
            .provider
            .generate_text(&self.model, &messages, &self.options)
            .await?;

        let text = response.text.trim();
        if text.is_empty() {
            return Err(ResearchError::Provider(
                "model returned an empty response".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn optional(value: Option<&str>) -> String {
    value.unwrap_or("N/A").to_string()
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "N/A".to_string()
    } else {
        items
            .iter()
            .take(MAX_LIST_ITEMS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max).collect();
        format!("{truncated}...")
    }
}

/// Keep a cell on one markdown table line.
fn cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "/")
}
