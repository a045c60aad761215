pub mod aggregator;
pub mod audit;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod http_client;
pub mod keyword_analyzer;
pub mod models;
pub mod onpage_analyzer;
pub mod page_ranker;
pub mod probe;
pub mod reporter;
pub mod robots;
pub mod scoring;
pub mod technical_checker;

use anyhow::{Context, Result};
use audit::Auditor;
use cli::Cli;
use colored::*;
use http_client::HttpFetcher;
use probe::NoProbe;
use reporter::Reporter;

pub async fn run(args: Cli) -> Result<()> {
    args.validate()?;
    let json_output = args.output == "json";

    if !json_output {
        println!("{}", "seoaudit - Website SEO Audit".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!();
        println!("{} {}", "Starting audit:".bright_white().bold(), args.url);
        println!("{} {}", "Max depth:".bright_white().bold(), args.depth);
        println!("{} {}", "Max pages:".bright_white().bold(), args.max_pages);
        println!("{} {}", "Top pages:".bright_white().bold(), args.top_n);
        println!();
    }

    let fetcher = HttpFetcher::new(args.timeout()).context("Failed to build HTTP client")?;
    let mut auditor = Auditor::new(fetcher, NoProbe, args.audit_options());
    if !json_output && !args.verbose {
        auditor.enable_progress_bar();
    }

    let report = auditor
        .run(&args.url)
        .await
        .with_context(|| format!("Audit of {} failed", args.url))?;

    if json_output {
        println!("{}", Reporter::to_json(&report)?);
    } else {
        Reporter::print_text_report(&report);
    }

    if let Some(filename) = &args.save {
        Reporter::save_json_report(&report, filename)?;
    }

    Ok(())
}
