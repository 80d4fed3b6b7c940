//! End-to-end workflow behavior against scripted providers.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use llm::{AIMessage, AIRole};
use serde_json::json;
use toolscout::analysis::{NO_COMPANIES_TO_COMPARE, NO_RESULTS_MESSAGE};
use toolscout::extractor::name_from_url;
use toolscout::{HealthStatus, ResearchConfig, ResearchError, Workflow};

use common::{
    api_error, company_json, test_config, url_in_prompt, CallKind, FakeProvider, FakeScraper,
};

fn known_name(url: &str) -> String {
    if url.contains("mongodb") {
        "MongoDB".to_string()
    } else if url.contains("redis") {
        "Redis".to_string()
    } else {
        name_from_url(url).unwrap_or_else(|| url.to_string())
    }
}

/// First cells of the company table embedded in a prompt.
fn table_names(prompt: &str) -> Vec<String> {
    prompt
        .lines()
        .filter(|l| l.starts_with('|') && !l.starts_with("|-"))
        .filter_map(|l| l.split('|').nth(1).map(|c| c.trim().to_string()))
        .filter(|name| name != "Name")
        .collect()
}

fn user_prompt(messages: &[AIMessage]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == AIRole::User)
        .map(|m| m.content.clone())
        .unwrap_or_default()
}

fn companies_reply(names: &[&str]) -> String {
    let companies: Vec<_> = names
        .iter()
        .map(|n| json!({"name": n, "pricing_model": "open_source"}))
        .collect();
    json!({ "companies": companies }).to_string()
}

/// Provider that extracts by URL, synthesizes `synthesized` and echoes analysis tables.
fn scripted(synthesized: &'static [&'static str]) -> Arc<FakeProvider> {
    FakeProvider::new(move |kind, messages| match kind {
        CallKind::Extract => {
            let url = url_in_prompt(messages).unwrap_or_default();
            Ok(company_json(&known_name(&url), &url))
        }
        CallKind::Synthesize => Ok(companies_reply(synthesized)),
        CallKind::Analyze | CallKind::Compare | CallKind::Recommend => Ok(format!(
            "  Covered options: {}  ",
            table_names(&user_prompt(messages)).join(", ")
        )),
        CallKind::Describe => Ok(company_json("Describe", "https://describe.dev")),
        CallKind::Ping => Ok("pong".to_string()),
        _ => Err(api_error("unexpected call")),
    })
}

fn workflow(scraper: FakeScraper, provider: &Arc<FakeProvider>) -> (Workflow, Arc<FakeScraper>) {
    workflow_with(test_config(), scraper, provider)
}

fn workflow_with(
    config: ResearchConfig,
    scraper: FakeScraper,
    provider: &Arc<FakeProvider>,
) -> (Workflow, Arc<FakeScraper>) {
    let scraper = Arc::new(scraper);
    let workflow = Workflow::with_components(config, scraper.clone(), provider.clone())
        .expect("workflow from fakes");
    (workflow, scraper)
}

fn names(bundle: &toolscout::ResearchResultBundle) -> Vec<&str> {
    bundle.companies.iter().map(|c| c.name.as_str()).collect()
}

#[tokio::test]
async fn test_two_scraped_results_need_no_synthesis() {
    let provider = scripted(&["Neo4j"]);
    let (workflow, _) = workflow(
        FakeScraper::with_pages(&["https://mongodb.com", "https://redis.io"]),
        &provider,
    );

    let bundle = workflow.run("NoSQL databases", 2).await;

    assert_eq!(names(&bundle), vec!["MongoDB", "Redis"]);
    assert_eq!(bundle.total_results, 2);
    assert_eq!(provider.count(CallKind::Synthesize), 0);
    assert!(bundle.search_time.is_some());

    let analysis = bundle.analysis.expect("analysis text");
    assert!(analysis.contains("MongoDB"));
    assert!(analysis.contains("Redis"));
    assert!(!analysis.starts_with(' '));

    let redis = &bundle.companies[1];
    assert_eq!(redis.website.as_deref(), Some("https://redis.io"));
    assert!(redis.is_open_source);
    assert_eq!(redis.api_available, Some(true));
    let extractions = provider.calls_of(CallKind::Extract);
    assert!(extractions.iter().all(|c| c.json_mode));
    let analyses = provider.calls_of(CallKind::Analyze);
    assert!(analyses.iter().all(|c| !c.json_mode));
}

#[tokio::test]
async fn test_zero_max_results_returns_empty_message() {
    let provider = scripted(&["Neo4j"]);
    let (workflow, scraper) = workflow(FakeScraper::with_pages(&["https://redis.io"]), &provider);

    let bundle = workflow.run("NoSQL databases", 0).await;

    assert!(bundle.companies.is_empty());
    assert_eq!(bundle.total_results, 0);
    assert_eq!(bundle.analysis.as_deref(), Some(NO_RESULTS_MESSAGE));
    assert!(provider.calls().is_empty());
    assert_eq!(scraper.search_count(), 0);
}

#[tokio::test]
async fn test_scraped_record_wins_over_synthesized_duplicate() {
    let provider = scripted(&["redis", "Memcached", "Valkey"]);
    let (workflow, _) = workflow(FakeScraper::with_pages(&["https://redis.io"]), &provider);

    let bundle = workflow.run("key-value stores", 3).await;

    assert_eq!(names(&bundle), vec!["Redis", "Memcached", "Valkey"]);
    assert_eq!(bundle.total_results, 3);
    let redis: Vec<_> = bundle
        .companies
        .iter()
        .filter(|c| c.name.eq_ignore_ascii_case("redis"))
        .collect();
    assert_eq!(redis.len(), 1);
    assert_eq!(redis[0].website.as_deref(), Some("https://redis.io"));

    let synth = provider.calls_of(CallKind::Synthesize);
    assert!(synth[0].prompt().contains("Propose 2 real"));
    assert!(synth[0].prompt().contains("- Redis"));
}

#[tokio::test]
async fn test_no_candidates_falls_back_to_synthesis() {
    let provider = scripted(&["Acme Widgets", "Globex"]);
    let (workflow, scraper) = workflow(FakeScraper::empty(), &provider);

    let bundle = workflow.run("totally-fictitious-category-xyz", 5).await;

    assert!(bundle.companies.len() <= 5);
    assert_eq!(bundle.total_results, bundle.companies.len());
    assert_eq!(names(&bundle), vec!["Acme Widgets", "Globex"]);
    assert!(scraper.scraped().is_empty());
    assert_eq!(provider.count(CallKind::Extract), 0);

    // The retry asks for the remaining deficit and stops when nothing new comes back.
    let synth = provider.calls_of(CallKind::Synthesize);
    assert_eq!(synth.len(), 2);
    assert!(synth[0].prompt().contains("Propose 5 real"));
    assert!(synth[1].prompt().contains("Propose 3 real"));
    assert!(synth[1].prompt().contains("- Acme Widgets"));
    assert!(synth[1].prompt().contains("- Globex"));
}

#[tokio::test]
async fn test_synthesis_overshoot_is_truncated() {
    let provider = scripted(&["A", "B", "C", "D", "E"]);
    let (workflow, _) = workflow(FakeScraper::empty(), &provider);

    let bundle = workflow.run("anything", 3).await;

    assert_eq!(names(&bundle), vec!["A", "B", "C"]);
    assert_eq!(provider.count(CallKind::Synthesize), 1);
}

#[tokio::test]
async fn test_scrape_timeout_is_filled_by_synthesis() {
    let provider = scripted(&["Tool One", "Tool Two", "Tool Three"]);
    let scraper = FakeScraper::empty()
        .with_slow("https://obscure.dev", Duration::from_secs(3));
    let (workflow, scraper) = workflow(scraper, &provider);

    let bundle = workflow.run("very obscure niche tool", 3).await;

    assert!(bundle.companies.len() <= 3);
    assert_eq!(names(&bundle), vec!["Tool One", "Tool Two", "Tool Three"]);
    assert_eq!(bundle.total_results, 3);
    assert_eq!(scraper.scraped(), vec!["https://obscure.dev"]);
    assert_eq!(provider.count(CallKind::Extract), 0);
    let synth = provider.calls_of(CallKind::Synthesize);
    assert!(synth[0].prompt().contains("Propose 3 real"));
}

#[tokio::test]
async fn test_broken_scrapes_are_skipped_in_order() {
    let provider = scripted(&[]);
    let scraper = FakeScraper::with_pages(&["https://mongodb.com"])
        .with_broken("https://broken.example")
        .with_slow("https://redis.io", Duration::from_millis(10));
    let (workflow, _) = workflow(scraper, &provider);

    let bundle = workflow.run("NoSQL databases", 3).await;

    assert_eq!(names(&bundle), vec!["MongoDB", "Redis"]);
    assert_eq!(bundle.total_results, 2);
}

#[tokio::test]
async fn test_extraction_retries_once_with_corrective_prompt() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let provider = FakeProvider::new(move |kind, messages| match kind {
        CallKind::Extract => {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("Sure! Here is the company: Redis".to_string())
        }
        CallKind::ExtractRetry => Ok(format!(
            "```json\n{}\n```",
            company_json("Redis", &url_in_prompt(messages).unwrap_or_default())
        )),
        CallKind::Analyze => Ok("Redis is great".to_string()),
        _ => Err(api_error("unexpected call")),
    });
    let (workflow, _) = workflow(FakeScraper::with_pages(&["https://redis.io"]), &provider);

    let bundle = workflow.run("caches", 1).await;

    assert_eq!(names(&bundle), vec!["Redis"]);
    assert_eq!(
        bundle.companies[0].description.as_deref(),
        Some("Redis is a developer tool.")
    );
    assert_eq!(attempts.load(Ordering::SeqCst), 1);

    let retries = provider.calls_of(CallKind::ExtractRetry);
    assert_eq!(retries.len(), 1);
    let retry = &retries[0].messages;
    let echoed = retry
        .iter()
        .any(|m| m.role == AIRole::Assistant && m.content.contains("Here is the company"));
    assert!(echoed);
    let retry_prompt = retries[0].prompt();
    assert!(retry_prompt.contains("Return ONLY valid structured data"));
}

#[tokio::test]
async fn test_extraction_failing_twice_keeps_minimal_record() {
    let provider = FakeProvider::new(|kind, _| match kind {
        CallKind::Extract | CallKind::ExtractRetry => {
            Ok(r#"{"name": "", "website": "nope"}"#.to_string())
        }
        CallKind::Analyze => Ok("Only Grafana".to_string()),
        _ => Err(api_error("unexpected call")),
    });
    let (workflow, _) = workflow(FakeScraper::with_pages(&["https://grafana.com"]), &provider);

    let bundle = workflow.run("dashboards", 1).await;

    assert_eq!(provider.count(CallKind::Extract), 1);
    assert_eq!(provider.count(CallKind::ExtractRetry), 1);
    let grafana = &bundle.companies[0];
    assert_eq!(grafana.name, "Grafana");
    assert_eq!(grafana.website.as_deref(), Some("https://grafana.com"));
    assert_eq!(grafana.api_available, None);
    assert!(grafana.tech_stack.is_empty());
}

#[tokio::test]
async fn test_provider_errors_never_abort_run() {
    let provider = FakeProvider::new(|_, _| Err(api_error("model is down")));
    let (workflow, _) = workflow(FakeScraper::with_pages(&["https://redis.io"]), &provider);

    let bundle = workflow.run("caches", 3).await;

    assert_eq!(names(&bundle), vec!["Redis"]);
    assert_eq!(bundle.total_results, 1);
    assert_eq!(bundle.analysis, None);
    assert_eq!(provider.count(CallKind::Synthesize), 1);
}

#[tokio::test]
async fn test_search_failure_goes_straight_to_synthesis() {
    let provider = scripted(&["Prometheus"]);
    let (workflow, _) = workflow(FakeScraper::failing_search("rate limited"), &provider);

    let bundle = workflow.run("monitoring", 1).await;

    assert_eq!(names(&bundle), vec!["Prometheus"]);
}

#[tokio::test]
async fn test_allow_list_filters_candidates() {
    let provider = scripted(&[]);
    let config = ResearchConfig {
        include_domains: vec!["redis.io".to_string()],
        ..test_config()
    };
    let (workflow, scraper) = workflow_with(
        config,
        FakeScraper::with_pages(&["https://mongodb.com", "https://www.redis.io/docs"]),
        &provider,
    );

    let bundle = workflow.run("NoSQL databases", 2).await;

    assert_eq!(scraper.scraped(), vec!["https://www.redis.io/docs"]);
    assert_eq!(names(&bundle), vec!["Redis"]);
    let searches = scraper.searched();
    assert_eq!(searches[0].0, "NoSQL databases (site:redis.io)");
}

#[tokio::test]
async fn test_search_by_category_builds_query() {
    let provider = scripted(&["Grafana"]);
    let (workflow, _) = workflow(FakeScraper::empty(), &provider);

    let bundle = workflow.search_by_category("monitoring", 1).await;

    assert_eq!(bundle.query, "monitoring tools and companies");
    let synth = provider.calls_of(CallKind::Synthesize);
    let quoted = "\"monitoring tools and companies\"";
    assert!(synth[0].prompt().contains(quoted));
}

#[tokio::test]
async fn test_research_company_scrapes_given_website() {
    let provider = scripted(&[]);
    let scraper = FakeScraper::empty()
        .with_page("https://redis.io", "Redis home");
    let (workflow, scraper) = workflow(scraper, &provider);

    let record = workflow
        .research_company("Redis", Some("https://redis.io"))
        .await
        .expect("record");

    assert_eq!(record.name, "Redis");
    assert_eq!(scraper.search_count(), 0);
    assert_eq!(scraper.scraped(), vec!["https://redis.io"]);
}

#[tokio::test]
async fn test_research_company_discovers_top_hit() {
    let provider = scripted(&[]);
    let (workflow, scraper) = workflow(
        FakeScraper::with_pages(&["https://mongodb.com", "https://redis.io"]),
        &provider,
    );

    let record = workflow
        .research_company("MongoDB", None)
        .await
        .expect("record");

    assert_eq!(record.name, "MongoDB");
    assert_eq!(scraper.scraped(), vec!["https://mongodb.com"]);
}

#[tokio::test]
async fn test_research_company_falls_back_to_model_knowledge() {
    let provider = scripted(&[]);
    let (workflow, _) = workflow(FakeScraper::empty(), &provider);

    let record = workflow
        .research_company("Describe", None)
        .await
        .expect("record");

    assert_eq!(record.name, "Describe");
    let describe = provider.calls_of(CallKind::Describe);
    assert_eq!(describe.len(), 1);
    let expected = "Research the company or developer tool: Describe";
    assert!(describe[0].prompt().contains(expected));
}

#[tokio::test]
async fn test_research_company_gives_up_quietly() {
    let provider = FakeProvider::new(|_, _| Err(api_error("model is down")));
    let (workflow, _) = workflow(FakeScraper::empty(), &provider);

    assert!(workflow.research_company("Nobody", None).await.is_none());
}

#[tokio::test]
async fn test_compare_uses_requested_criteria() {
    let provider = scripted(&[]);
    let (workflow, _) = workflow(FakeScraper::empty(), &provider);
    let bundle = workflow.run("NoSQL databases", 0).await;
    assert!(bundle.companies.is_empty());

    let empty = workflow
        .compare_companies(&[], &["pricing".to_string()])
        .await
        .unwrap();
    assert_eq!(empty, NO_COMPANIES_TO_COMPARE);
    assert!(provider.calls().is_empty());

    let companies = vec![
        toolscout::CompanyRecord::named("MongoDB"),
        toolscout::CompanyRecord::named("Redis"),
    ];
    let comparison = workflow
        .compare_companies(&companies, &["pricing".to_string(), "stars".to_string()])
        .await
        .unwrap();

    assert_eq!(comparison, "Covered options: MongoDB, Redis");
    let compares = provider.calls_of(CallKind::Compare);
    let prompt = compares[0].prompt();
    assert!(prompt.contains("following criteria: pricing_model"));
    assert!(prompt.contains("| Pricing"));
    assert!(!prompt.contains("Tech Stack"));
}

#[tokio::test]
async fn test_recommendations_include_requirements() {
    let provider = scripted(&[]);
    let (workflow, _) = workflow(FakeScraper::empty(), &provider);
    let companies = vec![toolscout::CompanyRecord::named("Redis")];

    let text = workflow
        .get_recommendations(&companies, Some("low latency caching"))
        .await
        .unwrap();

    assert_eq!(text, "Covered options: Redis");
    let recommends = provider.calls_of(CallKind::Recommend);
    let prompt = recommends[0].prompt();
    assert!(prompt.contains("User requirements: low latency caching"));
}

#[tokio::test]
async fn test_health_reports_missing_key_without_raising() {
    let provider = scripted(&[]);
    let config = ResearchConfig {
        openai_api_key: String::new(),
        ..test_config()
    };
    let (workflow, _) = workflow_with(config, FakeScraper::empty(), &provider);

    let report = workflow.health_check(false).await;

    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert!(!report.is_healthy());
    assert_eq!(
        report.components.get("config").map(String::as_str),
        Some("missing keys: OPENAI_API_KEY")
    );
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn test_live_health_marks_failing_provider_degraded() {
    let provider = FakeProvider::new(|_, _| Err(api_error("bad gateway")));
    let (workflow, scraper) = workflow(FakeScraper::empty(), &provider);

    let report = workflow.health_check(true).await;

    assert_eq!(report.status, HealthStatus::Degraded);
    assert_eq!(
        report.components.get("config").map(String::as_str),
        Some("healthy")
    );
    assert!(report.components["fake-llm"].starts_with("unhealthy:"));
    assert_eq!(report.components["fake-web"], "healthy");
    assert_eq!(provider.count(CallKind::Ping), 1);
    assert_eq!(scraper.search_count(), 1);
}

#[tokio::test]
async fn test_live_health_all_healthy() {
    let provider = scripted(&[]);
    let (workflow, _) = workflow(FakeScraper::empty(), &provider);

    let report = workflow.health_check(true).await;

    assert!(report.is_healthy());
    assert_eq!(report.components.len(), 3);
}

#[tokio::test]
async fn test_live_health_skips_call_to_unconfigured_provider() {
    let provider = FakeProvider::unconfigured();
    let (workflow, scraper) = workflow(FakeScraper::empty(), &provider);

    let report = workflow.health_check(true).await;

    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert_eq!(
        report.components["fake-llm"],
        "unhealthy: FAKE_API_KEY is not set"
    );
    assert!(provider.calls().is_empty());
    assert_eq!(report.components["fake-web"], "healthy");
    assert_eq!(scraper.search_count(), 1);
}

#[test]
fn test_new_requires_both_keys() {
    let config = ResearchConfig {
        openai_api_key: String::new(),
        firecrawl_api_key: "  ".to_string(),
        ..ResearchConfig::default()
    };

    match Workflow::new(config) {
        Err(ResearchError::Configuration { missing }) => {
            assert_eq!(missing, vec!["OPENAI_API_KEY", "FIRECRAWL_API_KEY"]);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected a configuration error"),
    }
}

#[test]
fn test_new_with_keys_builds_real_clients() {
    let workflow = Workflow::new(test_config()).unwrap();
    assert_eq!(workflow.config().llm_model, "gpt-4o-mini");
}
