use crate::batch::BatchConfig;
use anyhow::Error;
use clap::Parser;
use serde::Deserialize;

// Default TTS worker the relay forwards to
const DEFAULT_TTS_URL: &str = "https://text-to-speech.prathamesh-tts.workers.dev/";

#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    #[clap(long)]
    pub conf: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http_addr: String,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    #[serde(default)]
    pub relay: RelayConfig,
    pub batch: Option<BatchConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub tts_url: String,
    #[serde(default)]
    pub transliterate: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            tts_url: DEFAULT_TTS_URL.to_string(),
            transliterate: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            log_level: Some("info".to_string()),
            log_file: None,
            relay: RelayConfig::default(),
            batch: None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let config = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", e, path))?,
        )?;
        Ok(config)
    }
}
