//! Scripted fakes for the model provider and the web scraper.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use llm::{AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, LlmError, LlmResult};
use toolscout::{ResearchConfig, ResearchError, ResearchResult, ScrapedPage, SearchHit, WebScraper};

/// What a model call was asked to do, judged from its last user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Extract,
    ExtractRetry,
    Synthesize,
    Describe,
    Analyze,
    Compare,
    Recommend,
    Ping,
    Other,
}

impl CallKind {
    pub fn of(messages: &[AIMessage]) -> Self {
        let last = messages
            .iter()
            .rev()
            .find(|m| m.role == AIRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        if last.starts_with("Your previous reply could not be used") {
            CallKind::ExtractRetry
        } else if last.starts_with("Extract a structured profile") {
            CallKind::Extract
        } else if last.starts_with("Propose ") {
            CallKind::Synthesize
        } else if last.starts_with("Research the company") {
            CallKind::Describe
        } else if last.starts_with("Based on the following research results") {
            CallKind::Analyze
        } else if last.starts_with("Compare these") {
            CallKind::Compare
        } else if last.starts_with("Based on the following companies") {
            CallKind::Recommend
        } else if last == "ping" {
            CallKind::Ping
        } else {
            CallKind::Other
        }
    }
}

/// A recorded model call.
#[derive(Debug, Clone)]
pub struct Call {
    pub kind: CallKind,
    pub messages: Vec<AIMessage>,
    pub json_mode: bool,
}

impl Call {
    /// Text of the last user message.
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == AIRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

type Responder = dyn Fn(CallKind, &[AIMessage]) -> LlmResult<String> + Send + Sync;

/// Model provider answering from a closure and recording every call.
pub struct FakeProvider {
    responder: Box<Responder>,
    calls: Mutex<Vec<Call>>,
    configured: bool,
}

impl FakeProvider {
    pub fn new(
        responder: impl Fn(CallKind, &[AIMessage]) -> LlmResult<String> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            configured: true,
        })
    }

    /// Provider whose API key is missing. Any call it still receives fails.
    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(|_, _| Err(api_error("no API key"))),
            calls: Mutex::new(Vec::new()),
            configured: false,
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<Call> {
        let calls = self.calls();
        calls.into_iter().filter(|c| c.kind == kind).collect()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.calls_of(kind).len()
    }
}

#[async_trait]
impl AIProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake-llm"
    }

    fn api_key_env_var(&self) -> &'static str {
        "FAKE_API_KEY"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate_text(
        &self,
        _model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> LlmResult<AIResponse> {
        let kind = CallKind::of(messages);
        self.calls.lock().unwrap().push(Call {
            kind,
            messages: messages.to_vec(),
            json_mode: options.json_mode,
        });
        (self.responder)(kind, messages).map(AIResponse::from_text)
    }
}

/// Scraper returning canned search hits and pages.
pub struct FakeScraper {
    hits: Vec<SearchHit>,
    pages: HashMap<String, String>,
    slow: HashMap<String, Duration>,
    search_error: Option<String>,
    searches: Mutex<Vec<(String, usize)>>,
    scrapes: Mutex<Vec<String>>,
}

impl FakeScraper {
    /// Every hit scrapes successfully with content naming the URL.
    pub fn with_pages(urls: &[&str]) -> Self {
        Self {
            hits: urls.iter().map(|u| SearchHit::new(*u)).collect(),
            pages: urls
                .iter()
                .map(|u| ((*u).to_string(), format!("Homepage content for {u}")))
                .collect(),
            slow: HashMap::new(),
            search_error: None,
            searches: Mutex::new(Vec::new()),
            scrapes: Mutex::new(Vec::new()),
        }
    }

    /// Search returns nothing.
    pub fn empty() -> Self {
        Self::with_pages(&[])
    }

    /// Search fails outright.
    pub fn failing_search(reason: &str) -> Self {
        Self {
            search_error: Some(reason.to_string()),
            ..Self::empty()
        }
    }

    /// Add a hit whose scrape fails.
    #[must_use]
    pub fn with_broken(mut self, url: &str) -> Self {
        self.hits.push(SearchHit::new(url));
        self
    }

    /// Add a hit whose scrape sleeps for `delay` before answering.
    #[must_use]
    pub fn with_slow(mut self, url: &str, delay: Duration) -> Self {
        self.hits.push(SearchHit::new(url));
        self.pages
            .insert(url.to_string(), format!("Homepage content for {url}"));
        self.slow.insert(url.to_string(), delay);
        self
    }

    /// Add a page that can be scraped but is not returned by search.
    #[must_use]
    pub fn with_page(mut self, url: &str, content: &str) -> Self {
        self.pages.insert(url.to_string(), content.to_string());
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    /// Query and limit of every search, in order.
    pub fn searched(&self) -> Vec<(String, usize)> {
        self.searches.lock().unwrap().clone()
    }

    pub fn scraped(&self) -> Vec<String> {
        self.scrapes.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebScraper for FakeScraper {
    fn name(&self) -> &'static str {
        "fake-web"
    }

    async fn search(&self, query: &str, limit: usize) -> ResearchResult<Vec<SearchHit>> {
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), limit));
        if let Some(reason) = &self.search_error {
            return Err(ResearchError::Provider(reason.clone()));
        }
        Ok(self.hits.iter().take(limit).cloned().collect())
    }

    async fn scrape(&self, url: &str) -> ResearchResult<ScrapedPage> {
        self.scrapes.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.slow.get(url) {
            tokio::time::sleep(*delay).await;
        }
        match self.pages.get(url) {
            Some(content) => Ok(ScrapedPage {
                url: url.to_string(),
                title: None,
                description: None,
                content: content.clone(),
            }),
            None => Err(ResearchError::Provider(format!("HTTP 500 scraping {url}"))),
        }
    }
}

/// Configuration with fake keys and no domain restriction.
pub fn test_config() -> ResearchConfig {
    ResearchConfig {
        openai_api_key: "sk-test".to_string(),
        firecrawl_api_key: "fc-test".to_string(),
        include_domains: Vec::new(),
        scraping_timeout_secs: 1,
        ..ResearchConfig::default()
    }
}

/// JSON for a company record with a website.
pub fn company_json(name: &str, website: &str) -> String {
    serde_json::json!({
        "name": name,
        "website": website,
        "description": format!("{name} is a developer tool."),
        "pricing_model": "freemium",
        "is_open_source": "yes",
        "tech_stack": ["Rust"],
        "language_support": ["Python", "Go"],
        "api_available": "true",
        "integration_capabilities": [],
        "category": "database",
        "github_url": null,
        "documentation_url": null
    })
    .to_string()
}

/// Name the extraction prompt's URL maps to, e.g. `https://redis.io` gives `Redis`.
pub fn url_in_prompt(messages: &[AIMessage]) -> Option<String> {
    messages
        .iter()
        .find(|m| m.role == AIRole::User)?
        .content
        .lines()
        .find_map(|l| l.strip_prefix("URL: "))
        .map(str::to_string)
}

/// A provider error for scripted failures.
pub fn api_error(message: &str) -> LlmError {
    LlmError::Api {
        status: 500,
        message: message.to_string(),
    }
}
