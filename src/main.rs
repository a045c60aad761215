use anyhow::Result;
use clap::Parser;
use colored::*;
use seoaudit::cli::Cli;
use seoaudit::config::Config;
use seoaudit::run;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn setup_logging(verbose: bool) {
    let default = if verbose { "seoaudit=debug" } else { "seoaudit=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_args() -> Result<Cli> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Some(Config::from_file(Path::new(path))?),
        None => Config::from_default_paths()?,
    };
    Ok(match config {
        Some(config) => config.merge_with_cli(&cli),
        None => cli,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match load_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
            std::process::exit(1);
        }
    };

    setup_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
