use std::{env, fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http_port: u16,
    pub data_path: PathBuf,

    #[serde(default = "default_master_token")]
    pub master_token: String,
    #[serde(default = "default_scan_delay_ms")]
    pub scan_delay_ms: u64,
    #[serde(default = "default_ping_url")]
    pub ping_url: String,

    #[serde(default)]
    pub insight: InsightConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsightConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_master_token() -> String {
    "NETSCAN-2024".to_string()
}

// emulated acquisition latency, not a measured quantity
fn default_scan_delay_ms() -> u64 {
    2500
}

fn default_ping_url() -> String {
    "https://www.google.com/favicon.ico".to_string()
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

pub fn load(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path).context("Failed to read config")?;
    let mut config: Config = toml::from_str(&data).context("Failed to parse config")?;
    if config.insight.api_key.is_none() {
        config.insight.api_key = env::var("GEMINI_API_KEY").ok();
    }
    Ok(config)
}
