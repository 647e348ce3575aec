//! Configuration management for Architect.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config files (.architect/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Every constant the pipeline depends on (fan-out width, refine cap, history
//! capacity, trigger vocabulary, gateway deadlines) is a named option here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::retry::RetryPolicy;

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["groq", "openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .architect/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("groq", "openai", "ollama")
    pub provider: String,

    /// Model identifier passed to the provider
    pub model: String,

    /// Sampling temperature for every pipeline call
    pub temperature: f32,

    /// Explicit API key for the LLM provider
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Pipeline tuning
    pub pipeline: PipelineConfig,

    /// Timeout/retry policy shared by all gateways
    pub gateway: GatewayConfig,

    /// Web search gateway settings
    pub search: SearchConfig,

    /// Passage index settings
    pub index: IndexConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    /// OpenAI-compatible chat completions API (OpenAI, Groq)
    OpenAiCompatible {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            ProviderConfig::OpenAiCompatible { model, .. } => model,
            ProviderConfig::Ollama { model, .. } => model,
        }
    }

    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ProviderConfig::OpenAiCompatible { endpoint, .. } => endpoint.as_deref(),
            ProviderConfig::Ollama { endpoint, .. } => Some(endpoint),
        }
    }
}

/// Pipeline tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Upper bound on derived retrieval queries per question
    pub max_queries: usize,

    /// Passages fetched per retrieval query
    pub retrieval_k: usize,

    /// Upper bound on critic/refiner rounds
    pub max_refine_rounds: usize,

    /// Conversation turns kept per session
    pub history_capacity: usize,

    /// Results requested from the web search gateway
    pub web_max_results: usize,

    /// Case-insensitive substrings that route an unsupported answer to web search
    pub external_triggers: Vec<String>,

    /// Append a "Sources:" section to document-derived answers
    pub cite_sources: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_queries: 3,
            retrieval_k: 2,
            max_refine_rounds: 2,
            history_capacity: 4,
            web_max_results: 5,
            external_triggers: [
                "who is", "ceo", "founder", "current", "latest", "today", "2024", "2025",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            cite_sources: true,
        }
    }
}

/// Gateway timeout and retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewayConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_retries: 2,
            initial_backoff_ms: 500,
        }
    }
}

/// Web search gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    /// Search provider ("tavily")
    pub provider: String,

    /// Environment variable holding the provider API key
    pub api_key_env: String,

    /// Provider-specific depth ("basic", "advanced")
    pub search_depth: String,

    /// Custom endpoint (tests, proxies)
    pub endpoint: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: "tavily".to_string(),
            api_key_env: "TAVILY_API_KEY".to_string(),
            search_depth: "basic".to_string(),
            endpoint: None,
        }
    }
}

/// Passage index settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// JSON-lines passage file, relative paths resolve against the workspace
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".architect/index/passages.jsonl"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub bind: SocketAddr,

    /// Live sessions kept before the least recently used one is evicted
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            max_sessions: 1024,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    temperature: Option<f32>,
    pipeline: Option<PipelineConfig>,
    gateway: Option<GatewayConfig>,
    search: Option<SearchConfig>,
    index: Option<IndexConfig>,
    server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
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
            provider: "groq".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.0,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            pipeline: PipelineConfig::default(),
            gateway: GatewayConfig::default(),
            search: SearchConfig::default(),
            index: IndexConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `ARCHITECT_WORKSPACE`: Override workspace path
    /// - `ARCHITECT_CONFIG`: Path to config file
    /// - `ARCHITECT_PROVIDER`: LLM provider
    /// - `ARCHITECT_MODEL`: Model identifier
    /// - `ARCHITECT_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use architect_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and config file.
    ///
    /// `workspace` and `config_file` come from the command line and win over
    /// `ARCHITECT_WORKSPACE` and `ARCHITECT_CONFIG`. They are resolved before
    /// the YAML file is read, so the file they name is the one merged.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var("ARCHITECT_WORKSPACE").ok().map(PathBuf::from));
        if let Some(ref workspace) = workspace {
            config.workspace = workspace.clone();
        }

        config.config_file =
            config_file.or_else(|| std::env::var("ARCHITECT_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.architect_dir().join("config.yaml"),
        };

        if config.config_file.is_some() && !config_path.exists() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // An explicit workspace beats `workspace.path` in the file
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("ARCHITECT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("ARCHITECT_MODEL") {
            config.model = model;
        }

        if let Ok(key) = std::env::var("ARCHITECT_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(contents)?
        };

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(temperature) = config_file.temperature {
            result.temperature = temperature;
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        if let Some(pipeline) = config_file.pipeline {
            result.pipeline = pipeline;
        }
        if let Some(gateway) = config_file.gateway {
            result.gateway = gateway;
        }
        if let Some(search) = config_file.search {
            result.search = search;
        }
        if let Some(index) = config_file.index {
            result.index = index;
        }
        if let Some(server) = config_file.server {
            result.server = server;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    /// The workspace and config file flags are applied earlier, by `load_from`.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
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

    /// Get the path to the .architect directory.
    pub fn architect_dir(&self) -> PathBuf {
        self.workspace.join(".architect")
    }

    /// Absolute path of the passage index.
    pub fn index_path(&self) -> PathBuf {
        if self.index.path.is_absolute() {
            self.index.path.clone()
        } else {
            self.workspace.join(&self.index.path)
        }
    }

    /// Gateway call policy derived from `gateway`.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(self.gateway.timeout_secs),
            max_retries: self.gateway.max_retries,
            initial_backoff: Duration::from_millis(self.gateway.initial_backoff_ms),
        }
    }

    /// Get a provider's configuration block, if the config file declared one.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Custom endpoint for a provider, if configured.
    pub fn provider_endpoint(&self, provider: &str) -> Option<String> {
        self.get_provider_config(provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string)
    }

    /// Environment variable that holds the key for `provider`.
    fn api_key_env(&self, provider: &str) -> Option<String> {
        match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAiCompatible { api_key_env, .. }) => Some(api_key_env.clone()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None => match provider {
                "groq" => Some("GROQ_API_KEY".to_string()),
                "openai" => Some("OPENAI_API_KEY".to_string()),
                _ => None,
            },
        }
    }

    /// Resolve the LLM API key: explicit key first, then the provider's env var.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        self.api_key_env(provider)
            .and_then(|env_var| std::env::var(env_var).ok())
    }

    /// Resolve the web search API key from its environment variable.
    pub fn resolve_search_api_key(&self) -> Option<String> {
        std::env::var(&self.search.api_key_env).ok()
    }

    /// Validate configuration for the active provider and pipeline.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();

        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if let Some(env_var) = self.api_key_env(provider) {
            if self.resolve_api_key(provider).is_none() {
                return Err(AppError::Config(format!(
                    "API key not found in environment variable: {}",
                    env_var
                )));
            }
        }

        let caps = [
            ("pipeline.maxQueries", self.pipeline.max_queries),
            ("pipeline.retrievalK", self.pipeline.retrieval_k),
            ("pipeline.historyCapacity", self.pipeline.history_capacity),
        ];
        for (name, value) in caps {
            if value == 0 {
                return Err(AppError::Config(format!("{} must be at least 1", name)));
            }
        }

        if !self.pipeline.external_triggers.is_empty() && self.resolve_search_api_key().is_none() {
            return Err(AppError::Config(format!(
                "pipeline.externalTriggers needs web search but {} is not set \
                 (set it, or set pipeline.externalTriggers to [])",
                self.search.api_key_env
            )));
        }

        if self.gateway.timeout_secs == 0 {
            return Err(AppError::Config(
                "gateway.timeoutSecs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ollama_config() -> AppConfig {
        let mut config = AppConfig {
            provider: "ollama".to_string(),
            ..AppConfig::default()
        };
        config.pipeline.external_triggers.clear();
        config
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "groq");
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.pipeline.max_queries, 3);
        assert_eq!(config.pipeline.retrieval_k, 2);
        assert_eq!(config.pipeline.max_refine_rounds, 2);
        assert_eq!(config.pipeline.history_capacity, 4);
        assert_eq!(config.pipeline.web_max_results, 5);
        assert!(config
            .pipeline
            .external_triggers
            .contains(&"ceo".to_string()));
        assert!(!config.verbose);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "ollama");
        assert_eq!(overridden.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
llm:
  activeProvider: ollama
  providers:
    ollama:
      endpoint: http://localhost:11434
      model: llama3.1
pipeline:
  retrievalK: 4
  externalTriggers: ["stock price"]
gateway:
  timeoutSecs: 5
index:
  path: /data/passages.jsonl
logging:
  level: warn
  color: false
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(merged.provider, "ollama");
        assert_eq!(merged.model, "llama3.1");
        assert_eq!(
            merged.provider_endpoint("ollama").as_deref(),
            Some("http://localhost:11434")
        );
        assert_eq!(merged.pipeline.retrieval_k, 4);
        // Unspecified keys keep their defaults
        assert_eq!(merged.pipeline.max_queries, 3);
        assert_eq!(merged.pipeline.external_triggers, vec!["stock price"]);
        assert_eq!(merged.gateway.timeout_secs, 5);
        assert_eq!(merged.gateway.max_retries, 2);
        assert_eq!(merged.index_path(), PathBuf::from("/data/passages.jsonl"));
        assert_eq!(merged.log_level.as_deref(), Some("warn"));
        assert!(merged.no_color);
    }

    #[test]
    fn test_merge_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "temperature: 0.2\nserver:\n  bind: 0.0.0.0:9000\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.temperature, 0.2);
        assert_eq!(merged.server.bind.port(), 9000);
    }

    #[test]
    fn test_merge_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "pipeline: [not, a, map]").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_from_explicit_config_file() {
        let workspace = TempDir::new().unwrap();
        let custom = workspace.path().join("custom.yaml");
        std::fs::write(&custom, "pipeline:\n  retrievalK: 7\nserver:\n  maxSessions: 16\n").unwrap();

        let config =
            AppConfig::load_from(Some(workspace.path().to_path_buf()), Some(custom.clone()))
                .unwrap();

        assert_eq!(config.config_file.as_deref(), Some(custom.as_path()));
        assert_eq!(config.pipeline.retrieval_k, 7);
        assert_eq!(config.server.max_sessions, 16);
        assert_eq!(config.workspace, workspace.path());
    }

    #[test]
    fn test_load_from_workspace_config() {
        let workspace = TempDir::new().unwrap();
        let dir = workspace.path().join(".architect");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("config.yaml"), "pipeline:\n  maxRefineRounds: 5\n").unwrap();

        let config = AppConfig::load_from(Some(workspace.path().to_path_buf()), None).unwrap();

        assert_eq!(config.pipeline.max_refine_rounds, 5);
        assert_eq!(
            config.index_path(),
            workspace.path().join(".architect/index/passages.jsonl")
        );
    }

    #[test]
    fn test_load_from_missing_config_file() {
        let workspace = TempDir::new().unwrap();
        let missing = workspace.path().join("absent.yaml");

        let result = AppConfig::load_from(Some(workspace.path().to_path_buf()), Some(missing));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_relative_index_path() {
        let config = AppConfig {
            workspace: PathBuf::from("/srv/reports"),
            ..AppConfig::default()
        };
        assert_eq!(
            config.index_path(),
            PathBuf::from("/srv/reports/.architect/index/passages.jsonl")
        );
    }

    #[test]
    fn test_retry_policy() {
        let policy = AppConfig::default().retry_policy();
        assert_eq!(policy.timeout, Duration::from_secs(60));
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.initial_backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig {
            provider: "unknown".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ollama() {
        assert!(ollama_config().validate().is_ok());
    }

    #[test]
    fn test_validate_groq_with_explicit_key() {
        let config = AppConfig {
            provider: "groq".to_string(),
            api_key: Some("gsk-test".to_string()),
            ..ollama_config()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.resolve_api_key("groq").as_deref(), Some("gsk-test"));
    }

    #[test]
    fn test_validate_triggers_need_search_key() {
        let mut config = ollama_config();
        config.pipeline.external_triggers = vec!["ceo".to_string()];
        config.search.api_key_env = "ARCHITECT_TEST_UNSET_SEARCH_KEY".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ARCHITECT_TEST_UNSET_SEARCH_KEY"));

        config.pipeline.external_triggers.clear();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_caps() {
        let mut config = ollama_config();
        config.pipeline.retrieval_k = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("retrievalK"));
    }
}
