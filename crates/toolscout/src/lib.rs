//! Research assistant for developer tools and companies.
//!
//! This crate provides:
//! - Web discovery and scraping via Firecrawl, restricted to an allow-list of domains
//! - LLM-backed extraction of scraped pages into `CompanyRecord`s
//! - Gap filling from model knowledge when scraping under-delivers
//! - Comparative analysis, comparisons and recommendations
//! - A `Workflow` facade and an interactive CLI

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod firecrawl;
pub mod model;
pub mod orchestrator;
pub mod output;
pub mod prompts;
pub mod synthesizer;
pub mod validation;
pub mod workflow;

// Re-export main types
pub use analysis::{Analyst, Criterion};
pub use config::ResearchConfig;
pub use discovery::{Discovery, ScrapedPage, SearchHit, WebScraper};
pub use error::{ResearchError, ResearchResult};
pub use extractor::CompanyExtractor;
pub use firecrawl::FirecrawlClient;
pub use model::{CompanyRecord, HealthReport, HealthStatus, PricingModel, ResearchResultBundle};
pub use orchestrator::Researcher;
pub use synthesizer::CompanySynthesizer;
pub use workflow::Workflow;
