//! Configuration management for ragchat.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.ragchat/config.yaml`, or the path in `RAGCHAT_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Credentials are never stored in the config file itself. The file names the
//! environment variable that holds each key (`apiKeyEnv`), and the key is
//! resolved from the environment at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Main application configuration.
///
/// Built once during start-up and treated as read-only afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the workspace root (contains .ragchat/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Hosted chat-completion service settings
    pub completion: CompletionConfig,

    /// Context assembly limits
    pub retrieval: RetrievalConfig,

    /// Managed vector index settings
    pub index: IndexConfig,

    /// Query embedder settings
    pub embedding: EmbedderConfig,
}

/// Chat-completion service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletionConfig {
    /// OpenAI-compatible chat completions URL
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Name of the environment variable holding the bearer token
    pub api_key_env: String,

    /// Resolved bearer token (never read from or written to the file)
    #[serde(skip)]
    pub api_key: Option<String>,

    pub max_tokens: u32,

    pub temperature: f32,

    /// Per-attempt HTTP timeout
    pub timeout_secs: u64,

    /// Shared budget for rate-limit, payload-shrink and network retries
    pub max_retries: u32,

    /// Base delay of the exponential backoff
    pub retry_base_delay_secs: f64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "groq/compound-mini".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            api_key: None,
            max_tokens: 250,
            temperature: 0.7,
            timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_secs: 1.0,
        }
    }
}

/// Limits applied while turning matches into an LLM context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Per-fragment limit (head truncation)
    pub max_fragment_chars: usize,

    /// Whole-context limit (tail truncation)
    pub max_context_chars: usize,

    /// Floor the completion client will not shrink the context below
    pub min_context_chars: usize,

    pub default_top_k: usize,

    /// Upper bound for caller-supplied top_k values
    pub max_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_fragment_chars: 800,
            max_context_chars: 2000,
            min_context_chars: 200,
            default_top_k: 3,
            max_top_k: 50,
        }
    }
}

/// Managed vector index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexConfig {
    /// Index provider (only "pinecone" is supported)
    pub provider: String,

    pub index_name: String,

    /// Data-plane host; resolved from the control plane when absent
    pub host: Option<String>,

    pub control_plane_url: String,

    pub namespace: Option<String>,

    /// Name of the environment variable holding the index API key
    pub api_key_env: String,

    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: "pinecone".to_string(),
            index_name: String::new(),
            host: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            namespace: None,
            api_key_env: "PINECONE_API_KEY".to_string(),
            api_key: None,
        }
    }
}

/// Upper bound for `retryBaseDelaySecs`; the backoff doubles from here.
pub const MAX_RETRY_BASE_DELAY_SECS: f64 = 60.0;

/// Query embedder configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbedderConfig {
    /// Provider name: "fastembed", "ollama" or "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Provider endpoint (ollama only)
    pub endpoint: Option<String>,

    /// Model download cache (fastembed only); defaults to `.ragchat/models`
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: "fastembed".to_string(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            endpoint: None,
            cache_dir: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    completion: Option<CompletionConfig>,
    retrieval: Option<RetrievalConfig>,
    index: Option<IndexConfig>,
    embedding: Option<EmbedderConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            completion: CompletionConfig::default(),
            retrieval: RetrievalConfig::default(),
            index: IndexConfig::default(),
            embedding: EmbedderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment variables.
    ///
    /// Environment variables:
    /// - `RAGCHAT_WORKSPACE`: Override workspace path
    /// - `RAGCHAT_CONFIG`: Path to config file
    /// - `RAGCHAT_MODEL`: Completion model identifier
    /// - `RAGCHAT_COMPLETION_ENDPOINT`: Completion URL
    /// - `PINECONE_INDEX_NAME`, `PINECONE_HOST`: Index location
    /// - `GROQ_API_KEY`, `PINECONE_API_KEY`: Credentials (names configurable)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ragchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Index: {}", config.index.index_name);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration, letting explicit paths win over the environment.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("RAGCHAT_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("RAGCHAT_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.ragchat_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(model) = std::env::var("RAGCHAT_MODEL") {
            config.completion.model = model;
        }

        if let Ok(endpoint) = std::env::var("RAGCHAT_COMPLETION_ENDPOINT") {
            config.completion.endpoint = endpoint;
        }

        if let Ok(index_name) = std::env::var("PINECONE_INDEX_NAME") {
            config.index.index_name = index_name;
        }

        if let Ok(host) = std::env::var("PINECONE_HOST") {
            config.index.host = Some(host);
        }

        config.resolve_secrets();

        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(completion) = config_file.completion {
            result.completion = completion;
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(index) = config_file.index {
            result.index = index;
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Read API keys from the environment variables named in the config.
    fn resolve_secrets(&mut self) {
        self.completion.api_key = std::env::var(&self.completion.api_key_env).ok();
        self.index.api_key = std::env::var(&self.index.api_key_env).ok();
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        model: Option<String>,
        index_name: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(model) = model {
            self.completion.model = model;
        }

        if let Some(index_name) = index_name {
            self.index.index_name = index_name;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .ragchat directory.
    pub fn ragchat_dir(&self) -> PathBuf {
        self.workspace.join(".ragchat")
    }

    /// Validate configuration before any client is built.
    pub fn validate(&self) -> AppResult<()> {
        if self.completion.endpoint.trim().is_empty() {
            return Err(AppError::Config(
                "Completion endpoint must not be empty".to_string(),
            ));
        }

        if self.completion.api_key.is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.completion.api_key_env
            )));
        }

        let delay = self.completion.retry_base_delay_secs;
        if !delay.is_finite() || !(0.0..=MAX_RETRY_BASE_DELAY_SECS).contains(&delay) {
            return Err(AppError::Config(format!(
                "retryBaseDelaySecs must be between 0 and {} (got {})",
                MAX_RETRY_BASE_DELAY_SECS, delay
            )));
        }

        let known_index_providers = ["pinecone"];
        if !known_index_providers.contains(&self.index.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown index provider: {}. Supported: {}",
                self.index.provider,
                known_index_providers.join(", ")
            )));
        }

        if self.index.index_name.trim().is_empty() && self.index.host.is_none() {
            return Err(AppError::Config(
                "No index configured. Set PINECONE_INDEX_NAME or index.indexName".to_string(),
            ));
        }

        if self.index.api_key.is_none() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                self.index.api_key_env
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        self.retrieval.validate()
    }
}

impl RetrievalConfig {
    /// Check that the limits are mutually consistent.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_fragment_chars == 0 {
            return Err(AppError::Config(
                "maxFragmentChars must be greater than zero".to_string(),
            ));
        }

        if self.min_context_chars == 0 || self.min_context_chars > self.max_context_chars {
            return Err(AppError::Config(format!(
                "minContextChars ({}) must be between 1 and maxContextChars ({})",
                self.min_context_chars, self.max_context_chars
            )));
        }

        if self.max_top_k == 0 {
            return Err(AppError::Config(
                "maxTopK must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.completion.api_key = Some("gsk-test".to_string());
        config.index.api_key = Some("pc-test".to_string());
        config.index.index_name = "campus-pages".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.completion.model, "groq/compound-mini");
        assert_eq!(config.completion.max_tokens, 250);
        assert_eq!(config.completion.max_retries, 3);
        assert_eq!(config.completion.timeout_secs, 30);
        assert_eq!(config.retrieval.max_fragment_chars, 800);
        assert_eq!(config.retrieval.max_context_chars, 2000);
        assert_eq!(config.retrieval.min_context_chars, 200);
        assert_eq!(config.retrieval.default_top_k, 3);
        assert_eq!(config.embedding.provider, "fastembed");
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(config.embedding.dimensions, 384);
        assert!(!config.verbose);
    }

    #[test]
    fn test_ragchat_dir() {
        let config = AppConfig::default();
        assert!(config.ragchat_dir().ends_with(".ragchat"));
    }

    #[test]
    fn test_with_overrides() {
        let overridden = AppConfig::default().with_overrides(
            Some("llama-3.1-8b-instant".to_string()),
            Some("docs".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.completion.model, "llama-3.1-8b-instant");
        assert_eq!(overridden.index.index_name, "docs");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_partial_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
completion:
  model: llama-3.3-70b-versatile
  maxRetries: 5
retrieval:
  maxContextChars: 4000
index:
  indexName: campus-pages
  namespace: giki
logging:
  level: warn
  color: false
"#,
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.completion.model, "llama-3.3-70b-versatile");
        assert_eq!(merged.completion.max_retries, 5);
        // Unspecified fields keep their defaults
        assert_eq!(merged.completion.max_tokens, 250);
        assert_eq!(merged.retrieval.max_context_chars, 4000);
        assert_eq!(merged.retrieval.max_fragment_chars, 800);
        assert_eq!(merged.index.index_name, "campus-pages");
        assert_eq!(merged.index.namespace.as_deref(), Some("giki"));
        assert_eq!(merged.log_level.as_deref(), Some("warn"));
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_yaml_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "completion: [not, a, map]").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_ok() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_completion_key() {
        let mut config = valid_config();
        config.completion.api_key = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_validate_missing_index() {
        let mut config = valid_config();
        config.index.index_name.clear();
        assert!(config.validate().is_err());

        config.index.host = Some("https://campus-pages-abc.svc.pinecone.io".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_index_provider() {
        let mut config = valid_config();
        config.index.provider = "qdrant".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unusable_retry_delay() {
        for delay in [f64::INFINITY, f64::NAN, -0.5, 1e12] {
            let mut config = valid_config();
            config.completion.retry_base_delay_secs = delay;
            let err = config.validate().unwrap_err();
            assert!(
                err.to_string().contains("retryBaseDelaySecs"),
                "delay {delay} gave {err}"
            );
        }

        let mut config = valid_config();
        config.completion.retry_base_delay_secs = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_infinite_retry_delay_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "completion:\n  retryBaseDelaySecs: .inf\n").unwrap();

        let mut config = valid_config().merge_yaml(&path).unwrap();
        config.completion.api_key = Some("gsk-test".to_string());
        config.index.api_key = Some("pc-test".to_string());

        assert!(config.completion.retry_base_delay_secs.is_infinite());
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_retrieval_floor_above_limit() {
        let retrieval = RetrievalConfig {
            min_context_chars: 3000,
            ..Default::default()
        };
        assert!(retrieval.validate().is_err());
    }
}
