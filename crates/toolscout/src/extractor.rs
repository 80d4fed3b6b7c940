//! Schema-constrained extraction of company records from scraped pages.

use std::sync::Arc;

use llm::{parse_ai_response, AIMessage, AIProvider, GenerateOptions, MessageBuilder};
use serde_json::{json, Value};
use url::Url;

use crate::config::ResearchConfig;
use crate::discovery::ScrapedPage;
use crate::error::ResearchError;
use crate::model::CompanyRecord;
use crate::prompts::{PromptManager, RESEARCH_SYSTEM_PROMPT};
use crate::validation::validate_company;

/// Hosts where the first path segments name the project rather than the host.
const CODE_HOSTS: &[&str] = &["github.com", "gitlab.com", "bitbucket.org", "codeberg.org"];

/// Why an extraction attempt failed, plus the reply to show the model on retry.
struct AttemptFailure {
    error: ResearchError,
    reply: Option<String>,
}

/// Turns scraped pages into `CompanyRecord`s using a language model.
pub struct CompanyExtractor {
    provider: Arc<dyn AIProvider>,
    prompts: Arc<PromptManager>,
    model: String,
    options: GenerateOptions,
}

impl CompanyExtractor {
    /// Create an extractor.
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
                temperature: Some(config.llm_temperature),
                max_tokens: Some(config.max_tokens),
                json_mode: true,
                ..Default::default()
            },
        }
    }

    /// Extract a record from a page. Never fails.
    ///
    /// A strict attempt is followed by at most one corrective attempt. If both
    /// fail the result is a minimal record named after the URL.
    pub async fn extract(&self, page: &ScrapedPage) -> CompanyRecord {
        let prompt = match self.prompts.render(
            "extract",
            &json!({
                "url": page.url,
                "title": page.title,
                "description": page.description,
                "content": page.content,
            }),
        ) {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!(url = %page.url, error = %e, "Failed to render extraction prompt");
                return fallback_record(&page.url);
            }
        };

        let messages = MessageBuilder::new()
            .system(RESEARCH_SYSTEM_PROMPT)
            .user(prompt.clone())
            .build();

        let failure = match self.attempt(&messages, &page.url).await {
            Ok(record) => return record,
            Err(failure) => failure,
        };

        tracing::info!(
            url = %page.url,
            error = %failure.error,
            "Extraction unusable, retrying with corrective prompt"
        );

        let context = json!({ "error": failure.error.to_string() });
        let corrective = match self.prompts.render("extract_retry", &context) {
            Ok(corrective) => corrective,
            Err(e) => {
                tracing::error!(url = %page.url, error = %e, "Failed to render corrective prompt");
                return fallback_record(&page.url);
            }
        };

        let mut builder = MessageBuilder::new()
            .system(RESEARCH_SYSTEM_PROMPT)
            .user(prompt);
        if let Some(reply) = failure.reply {
            builder = builder.assistant(reply);
        }
        let messages = builder.user(corrective).build();

        match self.attempt(&messages, &page.url).await {
            Ok(record) => record,
            Err(failure) => {
                tracing::warn!(
                    url = %page.url,
                    error = %failure.error,
                    "Extraction failed twice, keeping minimal record"
                );
                fallback_record(&page.url)
            }
        }
    }

    async fn attempt(
        &self,
        messages: &[AIMessage],
        url: &str,
    ) -> Result<CompanyRecord, AttemptFailure> {
        let response = self
            .provider
            .generate_text(&self.model, messages, &self.options)
            .await
            .map_err(|e| AttemptFailure {
                error: e.into(),
                reply: None,
            })?;

        let value: Value = parse_ai_response(&response).map_err(|e| AttemptFailure {
            error: e.into(),
            reply: Some(response.text.clone()),
        })?;

        let validated = validate_company(&value, Some(url)).map_err(|error| AttemptFailure {
            error,
            reply: Some(response.text.clone()),
        })?;

        if !validated.defects.is_empty() {
            let defects: Vec<String> = validated.defects.iter().map(ToString::to_string).collect();
            tracing::debug!(url, ?defects, "Extracted record had field defects");
        }

        Ok(validated.record)
    }
}

/// Minimal record for a page whose content could not be extracted.
pub fn fallback_record(url: &str) -> CompanyRecord {
    let name = name_from_url(url).unwrap_or_else(|| url.trim().to_string());
    let record = CompanyRecord::named(name);
    if Url::parse(url).is_ok() {
        record.with_website(url)
    } else {
        record
    }
}

/// Infer a company or project name from a URL.
///
/// `https://github.com/redis/redis-py` gives `redis-py`; `https://docs.mongodb.com`
/// gives `Mongodb`.
pub fn name_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if CODE_HOSTS.contains(&host) {
        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        if let Some(project) = segments.get(1).or_else(|| segments.first()) {
            return Some((*project).to_string());
        }
    }

    let host = host
        .strip_prefix("docs.")
        .or_else(|| host.strip_prefix("app."))
        .unwrap_or(host);
    let label = host.split('.').next().filter(|l| !l.is_empty())?;

    let mut chars = label.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}
