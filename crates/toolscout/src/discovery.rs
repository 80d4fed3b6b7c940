//! Candidate discovery and bounded-concurrency scraping.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use url::Url;

use crate::config::ResearchConfig;
use crate::error::{ResearchError, ResearchResult};

/// Maximum characters of page content handed to the model.
const MAX_CONTENT_LENGTH: usize = 50_000;

/// Search hits requested per wanted candidate, leaving room for filtering.
const SEARCH_OVERFETCH: usize = 3;

/// Upper bound on hits requested in one search.
const MAX_SEARCH_LIMIT: usize = 50;

/// A search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result URL.
    pub url: String,
    /// Page title.
    pub title: Option<String>,
    /// Snippet or meta description.
    pub description: Option<String>,
}

impl SearchHit {
    /// A hit with only a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            description: None,
        }
    }
}

/// Content scraped from a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    /// Source URL.
    pub url: String,
    /// Page title.
    pub title: Option<String>,
    /// Meta description.
    pub description: Option<String>,
    /// Main content as markdown.
    pub content: String,
}

/// A search and scrape provider.
#[async_trait]
pub trait WebScraper: Send + Sync {
    /// Provider name for logs and health reports.
    fn name(&self) -> &'static str;

    /// Search the web, most relevant first.
    async fn search(&self, query: &str, limit: usize) -> ResearchResult<Vec<SearchHit>>;

    /// Scrape a single URL.
    async fn scrape(&self, url: &str) -> ResearchResult<ScrapedPage>;
}

/// Finds candidate URLs and scrapes them.
pub struct Discovery {
    scraper: Arc<dyn WebScraper>,
    include_domains: Vec<String>,
    max_concurrent: usize,
    timeout: Duration,
}

impl Discovery {
    /// Create discovery over the given provider.
    pub fn new(scraper: Arc<dyn WebScraper>, config: &ResearchConfig) -> Self {
        Self {
            scraper,
            include_domains: config
                .include_domains
                .iter()
                .map(|d| strip_www(&d.to_lowercase()).to_string())
                .collect(),
            max_concurrent: config.max_scraping_concurrent.max(1),
            timeout: config.scraping_timeout(),
        }
    }

    /// Override the per-scrape timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Candidate URLs for a query, in provider ranking order.
    ///
    /// The search is restricted to the allow-list and asks for more hits than
    /// needed. Hits outside the allow-list and repeated URLs are then dropped.
    /// A provider failure yields an empty list.
    pub async fn discover(&self, query: &str, max_results: usize) -> Vec<String> {
        if max_results == 0 {
            return Vec::new();
        }

        let search_query = self.search_query(query);
        let limit = max_results
            .saturating_mul(SEARCH_OVERFETCH)
            .min(MAX_SEARCH_LIMIT)
            .max(max_results);
        tracing::debug!(query = %search_query, limit, "Searching for candidates");

        let hits = match self.scraper.search(&search_query, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(query, provider = self.scraper.name(), error = %e, "Search failed");
                return Vec::new();
            }
        };

        let mut urls: Vec<String> = Vec::new();
        for hit in hits {
            if !self.is_allowed(&hit.url) {
                tracing::debug!(url = %hit.url, "Skipping result outside allowed domains");
                continue;
            }
            if urls.contains(&hit.url) {
                continue;
            }
            urls.push(hit.url);
            if urls.len() == max_results {
                break;
            }
        }

        tracing::info!(query, candidates = urls.len(), "Discovered candidate URLs");
        urls
    }

    /// Query sent to the provider, with one `site:` operator per allowed domain.
    pub fn search_query(&self, query: &str) -> String {
        if self.include_domains.is_empty() {
            return query.to_string();
        }
        let sites: Vec<String> = self
            .include_domains
            .iter()
            .map(|domain| format!("site:{domain}"))
            .collect();
        format!("{query} ({})", sites.join(" OR "))
    }

    /// Scrape one URL within the configured timeout.
    pub async fn scrape(&self, url: &str) -> ResearchResult<ScrapedPage> {
        let mut page = tokio::time::timeout(self.timeout, self.scraper.scrape(url))
            .await
            .map_err(|_| {
                ResearchError::Provider(format!(
                    "scrape of {url} timed out after {}s",
                    self.timeout.as_secs_f32()
                ))
            })??;

        if page.content.trim().is_empty() {
            let message = format!("no content scraped from {url}");
            return Err(ResearchError::Provider(message));
        }

        page.content = truncate_content(&page.content, MAX_CONTENT_LENGTH);
        Ok(page)
    }

    /// Scrape a batch with at most `max_scraping_concurrent` requests in flight.
    ///
    /// Slot `i` holds the page for `urls[i]`, or `None` if that scrape failed.
    pub async fn scrape_batch(&self, urls: &[String]) -> Vec<Option<ScrapedPage>> {
        let semaphore = Semaphore::new(self.max_concurrent);
        let mut slots: Vec<Option<ScrapedPage>> = vec![None; urls.len()];

        let tasks = urls.iter().enumerate().map(|(index, url)| {
            let semaphore = &semaphore;
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return (index, None);
                };
                match self.scrape(url).await {
                    Ok(page) => {
                        tracing::debug!(url, chars = page.content.len(), "Scraped page");
                        (index, Some(page))
                    }
                    Err(e) => {
                        tracing::warn!(url, error = %e, "Scrape failed, skipping");
                        (index, None)
                    }
                }
            }
        });

        for (index, page) in join_all(tasks).await {
            slots[index] = page;
        }

        slots
    }

    /// Whether a URL's host is on the allow-list.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        if self.include_domains.is_empty() {
            return true;
        }
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = strip_www(&host.to_lowercase()).to_string();

        self.include_domains
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    }
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Truncate content to max length, trying to break at paragraph boundaries.
fn truncate_content(content: &str, max_length: usize) -> String {
    if content.len() <= max_length {
        return content.to_string();
    }

    // Find a safe character boundary at or before max_length
    let safe_end = content
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= max_length)
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());

    let truncate_at = content[..safe_end].rfind("\n\n").unwrap_or(safe_end);

    format!("{}...", &content[..truncate_at])
}
