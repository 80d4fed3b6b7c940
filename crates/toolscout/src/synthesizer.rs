//! Company records from model knowledge, used when scraping under-delivers.

use std::sync::Arc;

use llm::{parse_ai_response, AIMessage, AIProvider, GenerateOptions};
use serde_json::{json, Value};

use crate::config::ResearchConfig;
use crate::error::ResearchResult;
use crate::model::CompanyRecord;
use crate::prompts::{PromptManager, RESEARCH_SYSTEM_PROMPT};
use crate::validation::validate_company;

/// Asks the model for companies it already knows about.
pub struct CompanySynthesizer {
    provider: Arc<dyn AIProvider>,
    prompts: Arc<PromptManager>,
    model: String,
    options: GenerateOptions,
}

impl CompanySynthesizer {
    /// Create a synthesizer.
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

    /// Propose up to `count` companies matching `query`, skipping `exclude`.
    ///
    /// Returns whatever valid entries the model produced; failures yield an
    /// empty list.
    pub async fn synthesize(
        &self,
        query: &str,
        count: usize,
        exclude: &[String],
    ) -> Vec<CompanyRecord> {
        if count == 0 {
            return Vec::new();
        }

        match self.try_synthesize(query, count, exclude).await {
            Ok(records) => {
                tracing::info!(
                    query,
                    requested = count,
                    produced = records.len(),
                    "Synthesized companies"
                );
                records
            }
            Err(e) => {
                tracing::warn!(query, requested = count, error = %e, "Synthesis failed");
                Vec::new()
            }
        }
    }

    async fn try_synthesize(
        &self,
        query: &str,
        count: usize,
        exclude: &[String],
    ) -> ResearchResult<Vec<CompanyRecord>> {
        let prompt = self.prompts.render(
            "synthesize",
            &json!({ "query": query, "count": count, "exclude": exclude }),
        )?;

        let value = self.ask(prompt).await?;

        let records = company_entries(&value)
            .iter()
            .filter_map(|entry| match validate_company(entry, None) {
                Ok(validated) => Some(validated.record),
                Err(e) => {
                    tracing::debug!(error = %e, "Dropping synthesized entry");
                    None
                }
            })
            .collect();

        Ok(records)
    }

    /// Describe a single named company from model knowledge.
    pub async fn describe(&self, name: &str, website: Option<&str>) -> Option<CompanyRecord> {
        let result = async {
            let prompt = self
                .prompts
                .render("describe", &json!({ "name": name, "website": website }))?;
            let value = self.ask(prompt).await?;
            validate_company(&value, website).map(|v| v.record)
        }
        .await;

        match result {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(name, error = %e, "Could not describe company");
                None
            }
        }
    }

    async fn ask(&self, prompt: String) -> ResearchResult<Value> {
        let messages = vec![
            AIMessage::system(RESEARCH_SYSTEM_PROMPT),
            AIMessage::user(prompt),
        ];
        let response = self
            .provider
            .generate_text(&self.model, &messages, &self.options)
            .await?;
        Ok(parse_ai_response(&response)?)
    }
}

/// Pull the list of company entries out of a synthesis reply.
///
/// Accepts `{"companies": [...]}`, a bare array, any object holding a single
/// array, or one company object.
fn company_entries(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(obj) => {
            if let Some(Value::Array(items)) = obj.get("companies") {
                return items.clone();
            }
            if obj.contains_key("name") || obj.contains_key("company_name") {
                return vec![value.clone()];
            }
            obj.values()
                .find_map(|v| v.as_array().cloned())
                .unwrap_or_default()
        }
        _ => Vec::new(),
    }
}
