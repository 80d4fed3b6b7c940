//! Firecrawl API client for web search and scraping.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{ResearchConfig, DEFAULT_FIRECRAWL_BASE_URL};
use crate::discovery::{ScrapedPage, SearchHit, WebScraper};
use crate::error::{ResearchError, ResearchResult};

/// Response from Firecrawl scrape API.
#[derive(Debug, Deserialize)]
pub struct ScrapeResponse {
    /// Whether the request was successful.
    pub success: bool,
    /// Scraped data.
    pub data: Option<ScrapeData>,
    /// Error message if failed.
    pub error: Option<String>,
}

/// Scraped page data.
#[derive(Debug, Deserialize)]
pub struct ScrapeData {
    /// Markdown content.
    pub markdown: Option<String>,
    /// Page metadata.
    pub metadata: Option<ScrapeMetadata>,
}

/// Metadata for a scraped page.
#[derive(Debug, Deserialize)]
pub struct ScrapeMetadata {
    /// Page title.
    pub title: Option<String>,
    /// Page description.
    pub description: Option<String>,
    /// Source URL.
    #[serde(rename = "sourceURL")]
    pub source_url: Option<String>,
    /// HTTP status code.
    #[serde(rename = "statusCode")]
    pub status_code: Option<u16>,
}

/// Response from Firecrawl search API.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Whether the request was successful.
    pub success: bool,
    /// Ranked results.
    #[serde(default)]
    pub data: Vec<SearchResult>,
    /// Error message if failed.
    pub error: Option<String>,
}

/// A single search result.
#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Request body for Firecrawl scrape.
#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: Vec<&'static str>,
    #[serde(rename = "onlyMainContent")]
    only_main_content: bool,
    timeout: u64,
}

/// Request body for Firecrawl search.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    limit: usize,
}

/// Firecrawl API client.
pub struct FirecrawlClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl FirecrawlClient {
    /// Create a new Firecrawl client.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_FIRECRAWL_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            client: Client::new(),
        }
    }

    /// Create a client from research configuration.
    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(config.firecrawl_api_key.clone())
            .with_base_url(config.firecrawl_base_url.clone())
            .with_timeout(config.scraping_timeout())
    }

    /// Use a different API base (self-hosted Firecrawl, tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn post<B: Serialize + Sync, R: for<'de> Deserialize<'de> + Send>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ResearchResult<R> {
        let response = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| ResearchError::Provider(format!("Firecrawl request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(ResearchError::Provider(format!(
                "Firecrawl API error ({status}): {error_text}"
            )));
        }

        response.json::<R>().await.map_err(|e| {
            ResearchError::Provider(format!("Failed to parse Firecrawl response: {e}"))
        })
    }
}

#[async_trait]
impl WebScraper for FirecrawlClient {
    fn name(&self) -> &'static str {
        "firecrawl"
    }

    async fn search(&self, query: &str, limit: usize) -> ResearchResult<Vec<SearchHit>> {
        let response: SearchResponse = self.post("search", &SearchRequest { query, limit }).await?;

        if !response.success {
            return Err(ResearchError::Provider(format!(
                "Firecrawl search failed: {}",
                response.error.unwrap_or_else(|| "Unknown error".into())
            )));
        }

        Ok(response
            .data
            .into_iter()
            .filter_map(|r| {
                r.url.filter(|u| !u.is_empty()).map(|url| SearchHit {
                    url,
                    title: r.title,
                    description: r.description,
                })
            })
            .collect())
    }

    async fn scrape(&self, url: &str) -> ResearchResult<ScrapedPage> {
        let request = ScrapeRequest {
            url,
            formats: vec!["markdown"],
            only_main_content: true,
            timeout: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        };

        let response: ScrapeResponse = self.post("scrape", &request).await?;

        if !response.success {
            return Err(ResearchError::Provider(format!(
                "Firecrawl scrape of {url} failed: {}",
                response.error.unwrap_or_else(|| "Unknown error".into())
            )));
        }

        let data = response
            .data
            .ok_or_else(|| ResearchError::Provider("No data in scrape response".into()))?;

        let (title, description) = match data.metadata {
            Some(meta) => {
                if let Some(code) = meta.status_code.filter(|c| *c >= 400) {
                    return Err(ResearchError::Provider(format!(
                        "{url} returned HTTP {code}"
                    )));
                }
                (meta.title, meta.description)
            }
            None => (None, None),
        };

        Ok(ScrapedPage {
            url: url.to_string(),
            title,
            description,
            content: data.markdown.unwrap_or_default(),
        })
    }
}
