mod api;
mod credentials;
mod defaults;
mod validation;

use crate::cli::Args;
use crate::models::Agent;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use api::{normalize_base_url, ApiConfig};
pub use credentials::{load_api_key, save_api_key};
pub use defaults::DEFAULT_BASE_URL;
pub use validation::{expand_env_var_in_string, expand_optional};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub verbose: Option<bool>,
    #[serde(default)]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub stream: Option<bool>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Agent named on the command line, in the environment or in a config
    /// file. `None` leaves resumed sessions on their stored agent.
    pub agent: Option<Agent>,
    pub stream: bool,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub stream_timeout: u64,
    pub verbose: bool,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JsonConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    pub fn from_env_and_args(args: &Args) -> Result<Self, String> {
        let json_config = match JsonConfig::load() {
            Ok(config) => config,
            Err(e) => {
                // A broken config file should not block chatting.
                eprintln!("Warning: {:#}", e);
                JsonConfig::default()
            }
        };

        // Base URL: CLI args > env var > JSON config > default
        let base_url = args
            .api_endpoint
            .clone()
            .or_else(|| env::var("RUNIX_BASE_URL").ok())
            .or_else(|| expand_optional(json_config.api.base_url.clone()))
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        // Data dir: env var > JSON config > ~/.cache/runix
        let data_dir = env::var("RUNIX_DATA_DIR")
            .ok()
            .or_else(|| expand_optional(json_config.session.data_dir.clone()))
            .map(PathBuf::from)
            .or_else(defaults::default_data_dir)
            .ok_or("Could not determine a data directory; set RUNIX_DATA_DIR")?;

        // API key: CLI arg > env var > JSON config > persisted key
        let api_key = args
            .set_api_key
            .clone()
            .or_else(|| env::var("RUNIX_API_KEY").ok())
            .or_else(|| expand_optional(json_config.api.api_key.clone()))
            .or_else(|| load_api_key(&data_dir))
            .filter(|k| !k.trim().is_empty());

        // Agent: CLI arg > env var > JSON config > the session's own
        let agent = args
            .agent
            .clone()
            .or_else(|| env::var("RUNIX_AGENT").ok())
            .or(json_config.chat.agent.clone())
            .map(|name| name.parse::<Agent>())
            .transpose()?;

        let stream = if args.no_stream {
            false
        } else {
            json_config.chat.stream.unwrap_or_else(defaults::default_stream)
        };

        let temperature = args.temperature.or(json_config.chat.temperature);
        let max_output_tokens = args.max_output_tokens.or(json_config.chat.max_output_tokens);

        // Stream timeout: env var > JSON config > default
        let stream_timeout = env::var("RUNIX_STREAM_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .or(json_config.api.stream_timeout)
            .unwrap_or_else(defaults::default_stream_timeout);

        // Verbose: CLI flag > env var > JSON config > default
        let verbose = args.verbose
            || env::var("RUNIX_VERBOSE")
                .ok()
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .or(json_config.session.verbose)
                .unwrap_or(false);

        Ok(Config {
            base_url,
            api_key,
            agent,
            stream,
            temperature,
            max_output_tokens,
            stream_timeout,
            verbose,
            data_dir,
        })
    }

    pub fn chat_endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    pub fn evidence_endpoint(&self) -> String {
        format!("{}/api/evidence", self.base_url)
    }
}

impl JsonConfig {
    pub fn load() -> Result<Self> {
        for path in Self::get_config_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(JsonConfig::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );

        let config = if is_yaml {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))?
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config file: {}", path.display()))?
        };

        Ok(config)
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".runix.yaml"),
            PathBuf::from(".runix.yml"),
            PathBuf::from(".runix.json"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            let config_dir = home_dir.join(".config").join("runix");
            paths.push(config_dir.join("runix.yaml"));
            paths.push(config_dir.join("runix.yml"));
            paths.push(config_dir.join("runix.json"));
        }

        paths
    }
}
