//! Workflow facade tying discovery, extraction, gap filling and analysis together.

use std::sync::Arc;
use std::time::Instant;

use llm::{AIMessage, AIProvider, GenerateOptions, OpenAIProvider};

use crate::analysis::{Analyst, Criterion};
use crate::config::ResearchConfig;
use crate::discovery::{Discovery, WebScraper};
use crate::error::ResearchResult;
use crate::extractor::CompanyExtractor;
use crate::firecrawl::FirecrawlClient;
use crate::model::{CompanyRecord, HealthReport, HealthStatus, ResearchResultBundle};
use crate::orchestrator::Researcher;
use crate::prompts::PromptManager;
use crate::synthesizer::CompanySynthesizer;

/// Entry point for programmatic and CLI use.
pub struct Workflow {
    config: ResearchConfig,
    scraper: Arc<dyn WebScraper>,
    provider: Arc<dyn AIProvider>,
    researcher: Researcher,
    analyst: Analyst,
}

impl Workflow {
    /// Build a workflow backed by OpenAI and Firecrawl.
    ///
    /// Fails with a configuration error naming every missing API key.
    pub fn new(config: ResearchConfig) -> ResearchResult<Self> {
        config.validate()?;
        Self::unvalidated(config)
    }

    /// Build the OpenAI and Firecrawl workflow without checking credentials.
    ///
    /// Only useful for `health_check`, which reports missing keys itself.
    pub fn unvalidated(config: ResearchConfig) -> ResearchResult<Self> {
        let mut openai = OpenAIProvider::new(config.openai_api_key.clone())
            .with_timeout(config.llm_timeout());
        if let Some(base_url) = &config.openai_base_url {
            openai = openai.with_base_url(base_url.clone());
        }
        let firecrawl = FirecrawlClient::from_config(&config);

        Self::with_components(config, Arc::new(firecrawl), Arc::new(openai))
    }

    /// Build a workflow around the given scraper and model provider.
    pub fn with_components(
        config: ResearchConfig,
        scraper: Arc<dyn WebScraper>,
        provider: Arc<dyn AIProvider>,
    ) -> ResearchResult<Self> {
        let prompts = Arc::new(PromptManager::new()?);

        let discovery = Discovery::new(Arc::clone(&scraper), &config);
        let extractor = CompanyExtractor::new(Arc::clone(&provider), Arc::clone(&prompts), &config);
        let synthesizer =
            CompanySynthesizer::new(Arc::clone(&provider), Arc::clone(&prompts), &config);
        let analyst = Analyst::new(Arc::clone(&provider), prompts, &config);

        tracing::debug!(
            scraper = scraper.name(),
            provider = provider.name(),
            model = %config.llm_model,
            "Workflow ready"
        );

        Ok(Self {
            researcher: Researcher::new(discovery, extractor, synthesizer),
            analyst,
            config,
            scraper,
            provider,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Research a query and analyze the results.
    ///
    /// Never fails. An analysis failure leaves `analysis` empty.
    pub async fn run(&self, query: &str, max_results: usize) -> ResearchResultBundle {
        let started = Instant::now();

        let companies = self.researcher.research(query, max_results).await;

        let analysis = match self.analyst.analyze(query, &companies).await {
            Ok(analysis) => Some(analysis),
            Err(e) => {
                tracing::warn!(query, error = %e, "Analysis failed");
                None
            }
        };

        let bundle = ResearchResultBundle::new(query, companies, analysis, started.elapsed());
        tracing::info!(
            query,
            total_results = bundle.total_results,
            search_time = bundle.search_time.unwrap_or_default(),
            "Run complete"
        );
        bundle
    }

    /// Research tools in a category.
    pub async fn search_by_category(
        &self,
        category: &str,
        max_results: usize,
    ) -> ResearchResultBundle {
        let query = format!("{category} tools and companies");
        self.run(&query, max_results).await
    }

    /// Research a single company.
    ///
    /// With a website the page is scraped directly; otherwise the top search
    /// hit for the name is used. When nothing can be scraped the record comes
    /// from model knowledge.
    pub async fn research_company(
        &self,
        name: &str,
        website: Option<&str>,
    ) -> Option<CompanyRecord> {
        let discovery = self.researcher.discovery();

        let url = match website {
            Some(website) => Some(website.to_string()),
            None => discovery.discover(name, 1).await.into_iter().next(),
        };

        if let Some(url) = url {
            match discovery.scrape(&url).await {
                Ok(page) => return Some(self.researcher.extractor().extract(&page).await),
                Err(e) => tracing::warn!(name, url, error = %e, "Could not scrape company page"),
            }
        } else {
            tracing::info!(name, "No page found for company");
        }

        self.researcher.synthesizer().describe(name, website).await
    }

    /// Compare companies on the named criteria (all fields when empty).
    pub async fn compare_companies(
        &self,
        companies: &[CompanyRecord],
        criteria: &[String],
    ) -> ResearchResult<String> {
        let criteria = Criterion::parse_list(criteria);
        self.analyst.compare(companies, &criteria).await
    }

    /// Recommend companies for the user's requirements.
    pub async fn get_recommendations(
        &self,
        companies: &[CompanyRecord],
        requirements: Option<&str>,
    ) -> ResearchResult<String> {
        self.analyst.recommend(companies, requirements).await
    }

    /// Report configuration and, with `live`, provider reachability.
    ///
    /// Problems are reported in the result, never raised.
    pub async fn health_check(&self, live: bool) -> HealthReport {
        let mut report = HealthReport::new();

        let missing = self.config.missing_keys();
        if missing.is_empty() {
            report.record("config", HealthStatus::Healthy, "healthy");
        } else {
            report.record(
                "config",
                HealthStatus::Unhealthy,
                format!("missing keys: {}", missing.join(", ")),
            );
        }

        if live {
            self.check_provider(&mut report).await;
            self.check_scraper(&mut report).await;
        }

        tracing::info!(status = %report.status, "Health check complete");
        report
    }

    async fn check_provider(&self, report: &mut HealthReport) {
        let component = self.provider.name().to_string();
        // Without a key the call cannot succeed, so skip it.
        if !self.provider.is_configured() {
            let detail = format!("unhealthy: {} is not set", self.provider.api_key_env_var());
            report.record(&component, HealthStatus::Unhealthy, detail);
            return;
        }

        let options = GenerateOptions {
            max_tokens: Some(5),
            ..Default::default()
        };
        let messages = [AIMessage::user("ping")];

        match self
            .provider
            .generate_text(&self.config.llm_model, &messages, &options)
            .await
        {
            Ok(_) => report.record(&component, HealthStatus::Healthy, "healthy"),
            Err(e) => {
                let detail = format!("unhealthy: {e}");
                report.record(&component, HealthStatus::Degraded, detail);
            }
        }
    }

    async fn check_scraper(&self, report: &mut HealthReport) {
        let component = self.scraper.name().to_string();
        match self.scraper.search("developer tools", 1).await {
            Ok(_) => report.record(&component, HealthStatus::Healthy, "healthy"),
            Err(e) => {
                let detail = format!("unhealthy: {e}");
                report.record(&component, HealthStatus::Degraded, detail);
            }
        }
    }
}
