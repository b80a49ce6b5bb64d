use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ai::GenerationParams;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Records processed at once within a stage. 1 keeps stages sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// How far back a regular (non `--all`) fetch looks for saved articles.
    #[serde(default = "default_fetch_lookback_hours")]
    pub fetch_lookback_hours: u32,

    pub pocket: Option<PocketConfig>,
    pub summarizer: Option<SummarizerConfig>,
    pub sheets: Option<SheetsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PocketConfig {
    pub consumer_key: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Path to a HuggingFace `tokenizer.json`.
    pub tokenizer_path: String,
    /// Inference endpoint that generates token sequences.
    pub endpoint: String,
    pub api_token: Option<String>,

    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default = "default_max_input_length")]
    pub max_input_length: usize,

    /// Tokens removed from the encoded article before chunking.
    #[serde(default = "default_sentinel_tokens")]
    pub sentinel_tokens: Vec<String>,

    #[serde(default)]
    pub generation: GenerationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub access_token: String,

    #[serde(default = "default_range")]
    pub range: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("article-archiver");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("articles.db").to_string_lossy().to_string()
}

fn default_concurrency() -> usize {
    1
}

fn default_fetch_lookback_hours() -> u32 {
    24
}

fn default_model_id() -> String {
    "facebook/bart-large-cnn".to_string()
}

fn default_max_input_length() -> usize {
    1024
}

fn default_sentinel_tokens() -> Vec<String> {
    vec!["<pad>".to_string(), "<mask>".to_string()]
}

fn default_range() -> String {
    "articles!A1:H1".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            concurrency: default_concurrency(),
            fetch_lookback_hours: default_fetch_lookback_hours(),
            pocket: None,
            summarizer: None,
            sheets: None,
        }
    }
}

impl Config {
    /// Loads the config at `path`, or the default location when `None`.
    /// A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            config
        };

        if config.concurrency == 0 {
            return Err(AppError::Config("concurrency must be at least 1".to_string()));
        }
        Ok(config)
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("article-archiver")
            .join("config.toml")
    }
}
