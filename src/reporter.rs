use crate::audit::AuditReport;
use anyhow::{Context, Result};
use colored::*;
use std::fs::File;
use std::io::Write;

pub struct Reporter;

impl Reporter {
    fn colored_score(score: f64) -> ColoredString {
        let text = format!("{:.1}", score);
        if score >= 80.0 {
            text.bright_green()
        } else if score >= 50.0 {
            text.yellow()
        } else {
            text.bright_red()
        }
    }

    pub fn print_text_report(report: &AuditReport) {
        println!("\n{}", "=".repeat(80).bright_blue());
        println!("{}", "SEO Audit Report".bright_cyan().bold());
        println!("{}", "=".repeat(80).bright_blue());
        println!();

        let crawl = &report.crawl;
        println!("{}: {}", "Site".bright_white().bold(), crawl.site.url);
        println!("{}: {}", "Domain".bright_white().bold(), crawl.site.domain);
        println!(
            "{}: {}",
            "Audited".bright_white().bold(),
            crawl.site.created_at.to_rfc3339()
        );
        println!();

        println!("{}", "Scores".bright_yellow().bold().underline());
        println!("  Overall:   {}", Self::colored_score(report.score.overall));
        println!("  Technical: {}", Self::colored_score(report.score.technical));
        println!("  On-page:   {}", Self::colored_score(report.score.onpage));
        println!();

        println!("{}", "Crawl".bright_yellow().bold().underline());
        println!(
            "  Pages Crawled: {}",
            crawl.pages.len().to_string().bright_green()
        );
        println!(
            "  Skipped:       {}",
            if crawl.skipped.is_empty() {
                "0".bright_green()
            } else {
                crawl.skipped.len().to_string().yellow()
            }
        );
        println!();

        println!("{}", "Technical Checks".bright_yellow().bold().underline());
        for check in &report.technical.checks {
            println!(
                "  {:<18} {}",
                check.category.to_string(),
                Self::colored_score(check.score)
            );
            for issue in &check.issues {
                println!("      {} {}", "-".dimmed(), issue);
            }
        }
        println!();

        if !report.ranked.is_empty() {
            println!("{}", "Most Important Pages".bright_yellow().bold().underline());
            for (rank, page) in report.ranked.iter().enumerate() {
                let finding = report.findings.iter().find(|f| f.page_url == page.url);
                let finding_score = finding
                    .map(|f| Self::colored_score(f.score))
                    .unwrap_or_else(|| "N/A".dimmed());
                println!(
                    "  {:>2}. {} (importance {}, depth {}, inbound {}) on-page {}",
                    rank + 1,
                    page.url.bright_white(),
                    page.score,
                    page.depth,
                    page.inbound_links,
                    finding_score
                );
                if let Some(finding) = finding {
                    let r = &finding.readability;
                    println!(
                        "      readability {} ({:.1} words per sentence)",
                        r.level.as_str().cyan(),
                        r.avg_sentence_length
                    );
                }
            }
            println!();
        }

        if !report.site_keywords.is_empty() {
            println!("{}", "Site Keywords".bright_yellow().bold().underline());
            let keywords: Vec<String> = report
                .site_keywords
                .iter()
                .take(10)
                .map(|k| format!("{} ({:.2}%)", k.keyword, k.density))
                .collect();
            println!("  {}", keywords.join(", "));
            println!();
        }

        if !report.score.top_issues.is_empty() {
            println!("{}", "Top Issues".bright_yellow().bold().underline());
            for issue in &report.score.top_issues {
                println!("  [{}] {}", "ISSUE".bright_red(), issue);
            }
            println!();
        }

        if !report.score.top_recommendations.is_empty() {
            println!("{}", "Top Recommendations".bright_yellow().bold().underline());
            for rec in &report.score.top_recommendations {
                println!("  [{}] {}", "FIX".bright_cyan(), rec);
            }
            println!();
        }

        println!("{}", "=".repeat(80).bright_blue());
    }

    pub fn to_json(report: &AuditReport) -> Result<String> {
        serde_json::to_string_pretty(report).context("Failed to serialize report")
    }

    pub fn save_json_report(report: &AuditReport, filename: &str) -> Result<()> {
        let json = Self::to_json(report)?;
        let mut file = File::create(filename)
            .with_context(|| format!("Failed to create report file: {}", filename))?;
        file.write_all(json.as_bytes())?;
        eprintln!("Report saved to: {}", filename.bright_green());
        Ok(())
    }
}
