use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, DEFAULT_LANGUAGE, DEFAULT_OUTPUT};
use crate::crawler::{DEFAULT_DELAY_MS, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES};
use crate::http_client::DEFAULT_TIMEOUT_SECS;
use crate::page_ranker::DEFAULT_TOP_N;

const APP_NAME: &str = "seoaudit";

/// Configuration file structure that mirrors CLI options.
/// All fields are optional to allow partial configuration; the URL is always
/// given on the command line.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Maximum crawl depth
    pub depth: Option<usize>,

    /// Maximum number of pages to crawl
    pub max_pages: Option<usize>,

    /// Number of top-ranked pages to analyze
    pub top_n: Option<usize>,

    /// Stopword language: en, ko or auto
    pub language: Option<String>,

    /// Per-request timeout in seconds
    pub timeout: Option<u64>,

    /// Pause between page fetches in milliseconds
    pub delay_ms: Option<u64>,

    /// Output format: text or json
    pub output: Option<String>,

    /// Save report to file
    pub save: Option<String>,

    /// Verbose output
    pub verbose: Option<bool>,
}

/// Configuration file format based on file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl ConfigFormat {
    const ALL: [ConfigFormat; 3] = [ConfigFormat::Json, ConfigFormat::Toml, ConfigFormat::Yaml];

    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ConfigFormat::Json => &["json"],
            ConfigFormat::Toml => &["toml"],
            ConfigFormat::Yaml => &["yaml", "yml"],
        }
    }

    fn name(self) -> &'static str {
        match self {
            ConfigFormat::Json => "JSON",
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
        }
    }

    fn parse(self, contents: &str) -> Result<Config> {
        let config = match self {
            ConfigFormat::Json => serde_json::from_str(contents)?,
            ConfigFormat::Toml => toml::from_str(contents)?,
            ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
        };
        Ok(config)
    }
}

/// `<dir>/<stem>.<ext>` for every supported extension, JSON first.
fn candidates(dir: PathBuf, stem: &'static str) -> impl Iterator<Item = PathBuf> {
    ConfigFormat::ALL
        .into_iter()
        .flat_map(ConfigFormat::extensions)
        .map(move |ext| dir.join(format!("{stem}.{ext}")))
}

impl Config {
    /// Load configuration from a file; the extension picks the parser.
    pub fn from_file(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let format = format
            .with_context(|| format!("Unsupported config file format: {}", path.display()))?;

        format.parse(&contents).with_context(|| {
            format!("Failed to parse {} config: {}", format.name(), path.display())
        })
    }

    /// Candidate config files in priority order: `./seoaudit.*`, then
    /// `$XDG_CONFIG_HOME/seoaudit/config.*` (falling back to `~/.config`).
    pub fn default_paths() -> Vec<PathBuf> {
        let config_home = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")));

        candidates(PathBuf::new(), APP_NAME)
            .chain(
                config_home
                    .into_iter()
                    .flat_map(|home| candidates(home.join(APP_NAME), "config")),
            )
            .collect()
    }

    /// Returns the first configuration file found, or None if no config exists
    pub fn from_default_paths() -> Result<Option<Self>> {
        let Some(path) = Self::default_paths().into_iter().find(|p| p.is_file()) else {
            return Ok(None);
        };
        tracing::debug!(path = %path.display(), "Loading config file");
        Self::from_file(&path).map(Some)
    }

    /// Merge this configuration with CLI arguments
    /// CLI values that differ from their defaults take precedence
    pub fn merge_with_cli(&self, cli: &Cli) -> Cli {
        fn pick<T: Clone + PartialEq>(cli: &T, default: T, file: &Option<T>) -> T {
            if *cli != default {
                cli.clone()
            } else {
                file.clone().unwrap_or(default)
            }
        }

        Cli {
            url: cli.url.clone(),
            depth: pick(&cli.depth, DEFAULT_MAX_DEPTH, &self.depth),
            max_pages: pick(&cli.max_pages, DEFAULT_MAX_PAGES, &self.max_pages),
            top_n: pick(&cli.top_n, DEFAULT_TOP_N, &self.top_n),
            language: pick(&cli.language, DEFAULT_LANGUAGE.to_string(), &self.language),
            timeout: pick(&cli.timeout, DEFAULT_TIMEOUT_SECS, &self.timeout),
            delay_ms: pick(&cli.delay_ms, DEFAULT_DELAY_MS, &self.delay_ms),
            output: pick(&cli.output, DEFAULT_OUTPUT.to_string(), &self.output),
            save: cli.save.clone().or_else(|| self.save.clone()),
            verbose: cli.verbose || self.verbose.unwrap_or(false),
            config: cli.config.clone(),
        }
    }
}
