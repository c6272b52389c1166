//! TOML configuration.
//!
//! Every section is optional; missing keys fall back to the defaults below.
//! The remote embedding credential is never stored in the file: only the
//! name of the environment variable that holds it.
//!
//! ```toml
//! [paths]
//! docs_dir = "./docs"
//! index_path = "./data/index.json"
//!
//! [chunking]
//! size = 700
//! overlap = 150
//!
//! [embedding]
//! backend = "auto"        # auto | remote | local
//! model = "text-embedding-3-small"
//!
//! [retrieval]
//! top_k = 5
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::embedding::BackendChoice;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            index_path: default_index_path(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("./docs")
}
fn default_index_path() -> PathBuf {
    PathBuf::from("./data/index.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Target window length in characters.
    #[serde(default = "default_chunk_size")]
    pub size: usize,
    /// Characters shared between consecutive windows.
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    700
}
fn default_chunk_overlap() -> usize {
    150
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: BackendChoice,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable holding the remote API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_local_dims")]
    pub local_dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_batch_tokens")]
    pub max_batch_tokens: usize,
    #[serde(default = "default_max_item_tokens")]
    pub max_item_tokens: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::Auto,
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            local_dims: default_local_dims(),
            batch_size: default_batch_size(),
            max_batch_tokens: default_max_batch_tokens(),
            max_item_tokens: default_max_item_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_local_dims() -> usize {
    256
}
fn default_batch_size() -> usize {
    64
}
fn default_max_batch_tokens() -> usize {
    250_000
}
fn default_max_item_tokens() -> usize {
    8_000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}

impl EmbeddingConfig {
    /// Reads the remote credential from the configured environment variable.
    /// Blank values count as absent.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Defaults rooted at `dir`: documents in `dir/docs`, index at
    /// `dir/data/index.json`.
    pub fn rooted_at(dir: &Path) -> Self {
        let mut config = Self::default();
        config.paths.docs_dir = dir.join("docs");
        config.paths.index_path = dir.join("data").join("index.json");
        config
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.size == 0 {
        anyhow::bail!("chunking.size must be > 0");
    }
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if config.embedding.local_dims == 0 {
        anyhow::bail!("embedding.local_dims must be > 0");
    }
    if config.embedding.batch_size == 0 {
        anyhow::bail!("embedding.batch_size must be > 0");
    }
    if config.embedding.max_item_tokens == 0 || config.embedding.max_batch_tokens == 0 {
        anyhow::bail!("embedding token budgets must be > 0");
    }
    if config.embedding.max_item_tokens > config.embedding.max_batch_tokens {
        anyhow::bail!("embedding.max_item_tokens must not exceed embedding.max_batch_tokens");
    }
    Ok(())
}
