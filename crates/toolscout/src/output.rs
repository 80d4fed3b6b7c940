//! Terminal output for research results.
//!
//! This module uses println! for CLI output, which is appropriate
//! for terminal user interfaces.

#![allow(clippy::disallowed_macros)]

use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::model::{CompanyRecord, HealthReport, HealthStatus, PricingModel, ResearchResultBundle};

/// Get colored pricing string
pub fn pricing_colored(pricing: PricingModel) -> String {
    match pricing {
        PricingModel::Free => "free".green().to_string(),
        PricingModel::OpenSource => "open_source".green().bold().to_string(),
        PricingModel::Freemium => "freemium".cyan().to_string(),
        PricingModel::Paid => "paid".yellow().to_string(),
        PricingModel::Unknown => "unknown".dimmed().to_string(),
    }
}

/// Get colored health status string
pub fn health_colored(status: HealthStatus) -> String {
    match status {
        HealthStatus::Healthy => "healthy".green().to_string(),
        HealthStatus::Degraded => "degraded".yellow().to_string(),
        HealthStatus::Unhealthy => "unhealthy".red().bold().to_string(),
    }
}

fn yes_no_unknown(value: Option<bool>) -> String {
    match value {
        Some(true) => "Yes".green().to_string(),
        Some(false) => "No".red().to_string(),
        None => "Unknown".dimmed().to_string(),
    }
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".dimmed().to_string()
    } else {
        items.join(", ")
    }
}

/// Lines describing one company, numbered from 1.
pub fn company_lines(position: usize, company: &CompanyRecord) -> Vec<String> {
    let mut lines = vec![format!("{}. {}", position, company.name.bold())];

    let website = company
        .website
        .as_deref()
        .map_or_else(|| "-".dimmed().to_string(), |w| w.underline().to_string());
    let pricing = pricing_colored(company.pricing_model);
    let open_source = yes_no_unknown(Some(company.is_open_source));
    let tech_stack = list_or_dash(&company.tech_stack);
    let languages = list_or_dash(&company.language_support);
    let api = yes_no_unknown(company.api_available);
    let integrations = list_or_dash(&company.integration_capabilities);

    lines.push(format!("   🌐 Website: {website}"));
    lines.push(format!("   💰 Pricing: {pricing}"));
    lines.push(format!("   📖 Open Source: {open_source}"));
    lines.push(format!("   🛠️  Tech Stack: {tech_stack}"));
    lines.push(format!("   💻 Language Support: {languages}"));
    lines.push(format!("   🔌 API: {api}"));
    lines.push(format!("   🔗 Integrations: {integrations}"));
    if let Some(description) = &company.description {
        lines.push(format!("   📝 Description: {description}"));
    }

    lines
}

/// Print a company.
pub fn print_company(position: usize, company: &CompanyRecord) {
    for line in company_lines(position, company) {
        println!("{line}");
    }
    println!();
}

/// Print a titled block of prose.
pub fn print_section(title: &str, body: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", "=".repeat(60).dimmed());
    println!("{body}");
}

/// Print the companies of a run followed by its analysis.
pub fn print_bundle(bundle: &ResearchResultBundle) {
    println!(
        "\n📊 Results for: {} ({} found{})",
        bundle.query.bold(),
        bundle.total_results,
        bundle
            .search_time
            .map(|secs| format!(", {secs:.1}s"))
            .unwrap_or_default()
    );
    println!("{}", "=".repeat(60).dimmed());

    if bundle.companies.is_empty() {
        println!("{}", "No companies found.".yellow());
    }

    for (i, company) in bundle.companies.iter().enumerate() {
        print_company(i + 1, company);
    }

    if let Some(analysis) = &bundle.analysis {
        print_section("🧠 Analysis", analysis);
    }
}

/// Create a table for a health report
pub fn health_table(report: &HealthReport) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Component").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
    ]);

    for (component, detail) in &report.components {
        let color = if detail == "healthy" {
            Color::Green
        } else if detail.starts_with("missing") {
            Color::Red
        } else {
            Color::Yellow
        };
        table.add_row(vec![Cell::new(component), Cell::new(detail).fg(color)]);
    }

    table
}

/// Print a health report.
pub fn print_health(report: &HealthReport) {
    println!(
        "\n🩺 Health: {} ({})",
        health_colored(report.status),
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("{}", health_table(report));
}
