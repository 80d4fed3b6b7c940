//! Research orchestrator - sequences discover, scrape, extract and gap fill.

use std::collections::HashSet;

use crate::discovery::Discovery;
use crate::extractor::CompanyExtractor;
use crate::model::CompanyRecord;
use crate::synthesizer::CompanySynthesizer;

/// Fill attempts when scraping under-delivers: the first ask plus one retry.
const MAX_FILL_ATTEMPTS: usize = 2;

/// Produces company records for a query.
pub struct Researcher {
    discovery: Discovery,
    extractor: CompanyExtractor,
    synthesizer: CompanySynthesizer,
}

impl Researcher {
    /// Create a researcher from its collaborators.
    #[must_use]
    pub fn new(
        discovery: Discovery,
        extractor: CompanyExtractor,
        synthesizer: CompanySynthesizer,
    ) -> Self {
        Self {
            discovery,
            extractor,
            synthesizer,
        }
    }

    /// Discovery layer, shared with single-company lookups.
    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Extractor, shared with single-company lookups.
    pub fn extractor(&self) -> &CompanyExtractor {
        &self.extractor
    }

    /// Synthesizer, shared with single-company lookups.
    pub fn synthesizer(&self) -> &CompanySynthesizer {
        &self.synthesizer
    }

    /// Research up to `max_results` companies for a query.
    ///
    /// Scraped records come first in discovery order, then synthesized ones.
    /// Names are unique (case-insensitive, trimmed); the first occurrence wins.
    /// Never fails: provider problems shrink the result instead.
    pub async fn research(&self, query: &str, max_results: usize) -> Vec<CompanyRecord> {
        if max_results == 0 {
            tracing::debug!(query, "max_results is 0, nothing to research");
            return Vec::new();
        }

        tracing::info!(query, max_results, "Starting research");

        let urls = self.discovery.discover(query, max_results).await;
        let pages = self.discovery.scrape_batch(&urls).await;

        let mut companies = RecordSet::with_capacity(max_results);
        let mut scrape_failures = 0usize;

        for page in pages {
            let Some(page) = page else {
                scrape_failures += 1;
                continue;
            };
            let record = self.extractor.extract(&page).await;
            if !companies.push(record) {
                tracing::debug!(url = %page.url, "Duplicate company from scrape, keeping first");
            }
        }

        tracing::info!(
            query,
            candidates = urls.len(),
            extracted = companies.len(),
            scrape_failures,
            "Scrape phase complete"
        );

        for attempt in 1..=MAX_FILL_ATTEMPTS {
            let deficit = max_results.saturating_sub(companies.len());
            if deficit == 0 {
                break;
            }

            tracing::info!(query, deficit, attempt, "Filling gap from model knowledge");
            let candidates = self
                .synthesizer
                .synthesize(query, deficit, &companies.names())
                .await;

            let mut added = 0usize;
            for record in candidates {
                if companies.len() >= max_results {
                    break;
                }
                if companies.push(record) {
                    added += 1;
                }
            }

            if added == 0 {
                tracing::info!(
                    query,
                    attempt,
                    "No new companies from synthesis, stopping fill"
                );
                break;
            }
        }

        let mut records = companies.into_records();
        records.truncate(max_results);

        tracing::info!(query, results = records.len(), "Research complete");
        records
    }
}

/// Insertion-ordered records with unique normalized names.
struct RecordSet {
    records: Vec<CompanyRecord>,
    seen: HashSet<String>,
}

impl RecordSet {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Add a record unless its name is already present. Returns whether it was added.
    fn push(&mut self, record: CompanyRecord) -> bool {
        if self.seen.insert(record.dedup_key()) {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }

    fn into_records(self) -> Vec<CompanyRecord> {
        self.records
    }
}
