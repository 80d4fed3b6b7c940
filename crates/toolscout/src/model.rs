//! Records produced by a research run.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a tool or company charges for its product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    Free,
    Paid,
    Freemium,
    OpenSource,
    #[default]
    Unknown,
}

impl PricingModel {
    /// Parse a pricing model leniently. Unrecognized values map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();

        match normalized.as_str() {
            "free" => PricingModel::Free,
            "paid" | "commercial" | "subscription" | "enterprise" => PricingModel::Paid,
            "freemium" => PricingModel::Freemium,
            "open_source" | "opensource" | "oss" => PricingModel::OpenSource,
            _ => PricingModel::Unknown,
        }
    }
}

impl fmt::Display for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PricingModel::Free => "free",
            PricingModel::Paid => "paid",
            PricingModel::Freemium => "freemium",
            PricingModel::OpenSource => "open_source",
            PricingModel::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Structured profile of a company or developer tool.
///
/// `name` is always present. Every other field degrades to `None` or empty
/// instead of failing extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Company or tool name.
    pub name: String,
    /// Official website.
    pub website: Option<String>,
    /// Short description.
    pub description: Option<String>,
    /// Pricing model.
    #[serde(default)]
    pub pricing_model: PricingModel,
    /// Whether the tool is open source.
    #[serde(default)]
    pub is_open_source: bool,
    /// Technologies the tool is built with.
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Programming languages the tool supports.
    #[serde(default)]
    pub language_support: Vec<String>,
    /// Whether an API is offered. `None` means unknown.
    pub api_available: Option<bool>,
    /// Integrations with other products.
    #[serde(default)]
    pub integration_capabilities: Vec<String>,
    /// Tool category.
    pub category: Option<String>,
    /// Source repository.
    pub github_url: Option<String>,
    /// Documentation site.
    pub documentation_url: Option<String>,
}

impl CompanyRecord {
    /// A record carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            website: None,
            description: None,
            pricing_model: PricingModel::Unknown,
            is_open_source: false,
            tech_stack: Vec::new(),
            language_support: Vec::new(),
            api_available: None,
            integration_capabilities: Vec::new(),
            category: None,
            github_url: None,
            documentation_url: None,
        }
    }

    /// Set the website.
    #[must_use]
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Key used to detect the same company across scrape and synthesis.
    pub fn dedup_key(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Case-insensitive, trimmed form of a company name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Output of a single `run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResultBundle {
    /// The user's query.
    pub query: String,
    /// Companies in discovery order.
    pub companies: Vec<CompanyRecord>,
    /// Analysis text, when the analysis step produced one.
    pub analysis: Option<String>,
    /// Always equal to `companies.len()`.
    pub total_results: usize,
    /// Wall-clock seconds spent.
    pub search_time: Option<f64>,
}

impl ResearchResultBundle {
    /// Assemble a bundle; `total_results` is derived from `companies`.
    pub fn new(
        query: impl Into<String>,
        companies: Vec<CompanyRecord>,
        analysis: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            query: query.into(),
            total_results: companies.len(),
            companies,
            analysis,
            search_time: Some(elapsed.as_secs_f64()),
        }
    }
}

/// Overall health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        };
        write!(f, "{s}")
    }
}

/// Result of `Workflow::health_check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Worst status across components.
    pub status: HealthStatus,
    /// Per-component status text ("healthy", "missing keys: ...", "unhealthy: ...").
    pub components: BTreeMap<String, String>,
    /// When the check ran.
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    /// Start a report with every component still to be recorded.
    pub fn new() -> Self {
        Self {
            status: HealthStatus::Healthy,
            components: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Record a component status, lowering the overall status if needed.
    pub fn record(&mut self, component: &str, status: HealthStatus, detail: impl Into<String>) {
        let detail = detail.into();
        self.components.insert(component.to_string(), detail);
        self.status = match (self.status, status) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        };
    }

    /// Whether every component is healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

impl Default for HealthReport {
    fn default() -> Self {
        Self::new()
    }
}
