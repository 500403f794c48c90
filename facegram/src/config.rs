use crate::feed::{FeedSettings, PageSizePolicy};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout() -> u64 { 10_000 }

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_first_page_size")]
    pub first_page_size: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_debounce")]
    pub debounce_ms: u64,
    /// Rows from the end of the list at which the next page is requested.
    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: usize,
}

fn default_first_page_size() -> u32 { 10 }
fn default_page_size() -> u32 { 7 }
fn default_debounce() -> u64 { 200 }
fn default_proximity_threshold() -> usize { 2 }

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            first_page_size: 10,
            page_size: 7,
            debounce_ms: 200,
            proximity_threshold: 2,
        }
    }
}

impl FeedConfig {
    pub fn settings(&self) -> FeedSettings {
        FeedSettings {
            page_sizes: PageSizePolicy {
                first: self.first_page_size,
                subsequent: self.page_size,
            },
            debounce: Duration::from_millis(self.debounce_ms),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        if config.feed.first_page_size == 0 || config.feed.page_size == 0 {
            anyhow::bail!("feed page sizes must be at least 1");
        }
        Ok(config)
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        for (key, value) in parse_env(&content) {
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// Username from FACEGRAM_USERNAME, or prompted. A prompted value is saved
    /// to .env for future runs.
    pub fn username() -> Result<String> {
        match std::env::var("FACEGRAM_USERNAME") {
            Ok(name) if !name.trim().is_empty() => Ok(sanitize(&name)),
            _ => {
                let name = prompt("Username")?;
                save_env_var("FACEGRAM_USERNAME", &name);
                Ok(name)
            }
        }
    }

    /// Password from FACEGRAM_PASSWORD, or prompted. Never written to disk.
    pub fn password() -> Result<String> {
        match std::env::var("FACEGRAM_PASSWORD") {
            Ok(pw) if !pw.is_empty() => Ok(sanitize(&pw)),
            _ => prompt("Password"),
        }
    }
}

/// Parse KEY=VALUE lines, skipping blanks and comments and stripping quotes.
fn parse_env(content: &str) -> Vec<(&str, &str)> {
    // Strip BOM if present (common on Windows-created files)
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim().trim_matches('"').trim_matches('\'')))
        .collect()
}

pub fn prompt(label: &str) -> Result<String> {
    let value = prompt_optional(label)?;
    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", label);
    }
    Ok(value)
}

/// Like [`prompt`] but an empty answer is allowed.
pub fn prompt_optional(label: &str) -> Result<String> {
    print!("  {} > ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Strip carriage returns, BOM, and other invisible chars from a value.
fn sanitize(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

/// Append a KEY=VALUE line to .env and set it in the current process.
fn save_env_var(key: &str, value: &str) {
    std::env::set_var(key, value);
    let path = Path::new(ENV_FILE);
    let mut contents = std::fs::read_to_string(path).unwrap_or_default();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&format!("{}={}\n", key, value));
    if let Err(e) = std::fs::write(path, contents) {
        tracing::warn!(error = %e, "could not save {} to .env", key);
    }
}
