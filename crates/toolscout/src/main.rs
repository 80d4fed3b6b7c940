//! Toolscout CLI - research developer tools and companies.

#![allow(clippy::disallowed_macros)]

use std::io::Write;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toolscout::config::log_level_from_env;
use toolscout::output::{print_bundle, print_company, print_health, print_section};
use toolscout::{ResearchConfig, Workflow};

/// Inputs that end the interactive loop.
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "q"];

/// Toolscout - research developer tools and companies from the web.
#[derive(Parser)]
#[command(name = "toolscout")]
#[command(about = "Research developer tools and companies from the web")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read queries from stdin until "exit" (default)
    Interactive,

    /// Research a query and print companies plus analysis
    Run {
        /// Research query, e.g. "NoSQL databases"
        query: String,

        /// Companies to return (defaults to MAX_SEARCH_RESULTS)
        #[arg(long)]
        max_results: Option<usize>,

        /// Print the result bundle as JSON
        #[arg(long)]
        json: bool,
    },

    /// Research tools in a category
    Category {
        /// Category, e.g. "monitoring"
        category: String,

        /// Companies to return (defaults to MAX_SEARCH_RESULTS)
        #[arg(long)]
        max_results: Option<usize>,

        /// Print the result bundle as JSON
        #[arg(long)]
        json: bool,
    },

    /// Research a single company
    Company {
        /// Company or tool name
        name: String,

        /// Official website to scrape instead of searching
        #[arg(long)]
        website: Option<String>,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Research a query and compare the results
    Compare {
        /// Research query
        query: String,

        /// Fields to compare on (comma separated, default all)
        #[arg(long, value_delimiter = ',')]
        criteria: Vec<String>,

        /// Companies to compare (defaults to MAX_SEARCH_RESULTS)
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Research a query and recommend options for your requirements
    Recommend {
        /// Research query
        query: String,

        /// What you need, e.g. "self-hosted, Python SDK"
        #[arg(long)]
        requirements: Option<String>,

        /// Companies to consider (defaults to MAX_SEARCH_RESULTS)
        #[arg(long)]
        max_results: Option<usize>,
    },

    /// Check configuration and provider reachability
    Health {
        /// Make one small call to each provider
        #[arg(long)]
        live: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Must precede `ResearchConfig::load`, which warns about invalid values.
    init_tracing(cli.verbose);
    let config = ResearchConfig::load();

    let command = cli.command.unwrap_or(Commands::Interactive);

    if let Commands::Health { live, json } = command {
        let workflow = Workflow::unvalidated(config)?;
        let report = workflow.health_check(live).await;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_health(&report);
        }
        return Ok(());
    }

    let default_max = config.max_search_results;
    let workflow = Workflow::new(config)?;

    match command {
        Commands::Interactive => run_interactive(&workflow).await,
        Commands::Run {
            query,
            max_results,
            json,
        } => {
            let bundle = workflow
                .run(&query, max_results.unwrap_or(default_max))
                .await;
            print_result(&bundle, json, print_bundle)
        }
        Commands::Category {
            category,
            max_results,
            json,
        } => {
            let bundle = workflow
                .search_by_category(&category, max_results.unwrap_or(default_max))
                .await;
            print_result(&bundle, json, print_bundle)
        }
        Commands::Company {
            name,
            website,
            json,
        } => match workflow.research_company(&name, website.as_deref()).await {
            Some(company) => print_result(&company, json, |c| print_company(1, c)),
            None => anyhow::bail!("Could not research company: {name}"),
        },
        Commands::Compare {
            query,
            criteria,
            max_results,
        } => {
            let bundle = workflow
                .run(&query, max_results.unwrap_or(default_max))
                .await;
            let comparison = workflow
                .compare_companies(&bundle.companies, &criteria)
                .await?;
            print_section("⚖️  Comparison", &comparison);
            Ok(())
        }
        Commands::Recommend {
            query,
            requirements,
            max_results,
        } => {
            let bundle = workflow
                .run(&query, max_results.unwrap_or(default_max))
                .await;
            let recommendations = workflow
                .get_recommendations(&bundle.companies, requirements.as_deref())
                .await?;
            print_section("⭐ Recommendations", &recommendations);
            Ok(())
        }
        Commands::Health { .. } => Ok(()),
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose` and `LOG_LEVEL`.
fn init_tracing(verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        log_level_from_env()
    };
    let directives = format!("toolscout={level},llm={level},warn");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_result<T: serde::Serialize>(value: &T, json: bool, pretty: impl Fn(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        pretty(value);
    }
    Ok(())
}

async fn run_interactive(workflow: &Workflow) -> Result<()> {
    println!("{}", "🔎 Toolscout - Developer Tools Research".cyan().bold());
    println!("Type a query such as \"NoSQL databases\", or 'exit' to quit.\n");

    let max_results = workflow.config().max_search_results;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", "🔍 Enter your research query:".bold());
        std::io::stdout().flush()?;

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("❌ Failed to read input: {e}");
                break;
            }
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&query.to_lowercase().as_str()) {
            break;
        }

        println!("\n⏳ Researching {query}...");
        let bundle = workflow.run(query, max_results).await;
        print_bundle(&bundle);
        println!();
    }

    println!("👋 Goodbye!");
    Ok(())
}
