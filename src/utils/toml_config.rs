//! TOML-based configuration for the council server
//!
//! This module provides declarative configuration for the HTTP server, the web
//! search backend, pipeline limits, the research providers and the solver via
//! a TOML file (`council.toml`).
//!
//! Credentials are never stored in the file. Each provider names the
//! environment variable holding its API key, resolved when the runtime
//! [`ProviderConfig`] is built.
//!
//! # Hot Reloading
//!
//! Configuration changes are automatically detected and applied at runtime.
//! Use `ConfigManager` for thread-safe access to the current configuration.
//! Requests take a snapshot when they start, so a reload never affects a
//! request already in flight.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Root configuration structure loaded from council.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouncilConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Research providers, in invocation order
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,

    /// Model that merges the provider reports into the final answer
    #[serde(default)]
    pub solver: Option<ProviderSettings>,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Allow any origin (the bundled browser client is served elsewhere)
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            cors_permissive: default_true(),
        }
    }
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackend {
    /// Tavily search API (requires an API key)
    Tavily,
    /// DuckDuckGo via daedra (no key)
    DuckDuckGo,
    /// Always returns no results
    Disabled,
}

impl SearchBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchBackend::Tavily => "tavily",
            SearchBackend::DuckDuckGo => "duckduckgo",
            SearchBackend::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_backend")]
    pub backend: SearchBackend,

    /// Environment variable containing the Tavily API key
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_tavily_base")]
    pub base_url: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_backend() -> SearchBackend {
    SearchBackend::Tavily
}

fn default_search_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

fn default_tavily_base() -> String {
    "https://api.tavily.com".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_search_timeout() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: default_search_backend(),
            api_key_env: default_search_key_env(),
            base_url: default_tavily_base(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============= Pipeline Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound for every model call and every solver chunk wait
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connect timeout for the HTTP client behind each model session
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How many search hits go into the summary context
    #[serde(default = "default_context_results")]
    pub context_results: usize,

    /// Capacity of the per-request event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_request_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_context_results() -> usize {
    3
}

fn default_event_buffer() -> usize {
    32
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            context_results: default_context_results(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl PipelineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// ============= Provider Configuration =============

/// A provider entry as written in the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Model identifier sent to the endpoint
    pub model: String,

    #[serde(default = "default_openai_base")]
    pub base_url: String,

    /// Environment variable containing the API key
    pub api_key_env: String,

    /// Fold the system prompt into the user turn. Defaults to true for
    /// models whose name contains "reasoner".
    #[serde(default)]
    pub merge_system_prompt: Option<bool>,
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

impl ProviderSettings {
    /// Effective value of the merged-system-prompt capability flag
    pub fn merge_system_prompt(&self) -> bool {
        self.merge_system_prompt
            .unwrap_or_else(|| self.model.to_lowercase().contains("reasoner"))
    }

    /// Resolve the credential and capability flag into a runtime config
    pub fn resolve(&self) -> ProviderConfig {
        ProviderConfig {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            api_key: std::env::var(&self.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty()),
            api_key_env: self.api_key_env.clone(),
            merge_system_prompt: self.merge_system_prompt(),
        }
    }
}

/// Immutable provider description handed to the research pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub model: String,
    pub base_url: String,
    /// `None` when the referenced environment variable is unset
    pub api_key: Option<String>,
    /// Name of the environment variable the key came from
    pub api_key_env: String,
    /// Provider rejects a separate system-role message
    pub merge_system_prompt: bool,
}

impl ProviderConfig {
    pub fn new(
        model: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
            api_key: Some(api_key.into()),
            api_key_env: String::new(),
            merge_system_prompt: false,
        }
    }

    pub fn with_merged_system_prompt(mut self, merge: bool) -> Self {
        self.merge_system_prompt = merge;
        self
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Model '{0}' is configured more than once")]
    DuplicateProvider(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl CouncilConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CouncilConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency
    ///
    /// Missing credentials are not an error here; they are reported per
    /// request so the client sees a structured error event.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "search.max_results must be at least 1".to_string(),
            ));
        }
        if self.search.timeout_secs == 0
            || self.pipeline.request_timeout_secs == 0
            || self.pipeline.connect_timeout_secs == 0
        {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if self.pipeline.context_results == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.context_results must be at least 1".to_string(),
            ));
        }
        if self.pipeline.event_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.event_buffer must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.model.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "provider model must not be empty".to_string(),
                ));
            }
            if !seen.insert(provider.model.as_str()) {
                return Err(ConfigError::DuplicateProvider(provider.model.clone()));
            }
        }

        if let Some(solver) = &self.solver
            && solver.model.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "solver model must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolved research providers, in configuration order
    pub fn research_providers(&self) -> Vec<ProviderConfig> {
        self.providers.iter().map(ProviderSettings::resolve).collect()
    }

    /// Resolved solver provider, if one is configured
    pub fn solver_provider(&self) -> Option<ProviderConfig> {
        self.solver.as_ref().map(ProviderSettings::resolve)
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Thread-safe configuration manager with hot reloading support
pub struct ConfigManager {
    config: Arc<ArcSwap<CouncilConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl ConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Convert to absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = CouncilConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Create a config manager directly from a config (useful for testing)
    /// This won't have file watching capabilities.
    pub fn from_config(config: CouncilConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("council.toml"),
            watcher: RwLock::new(None),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<CouncilConfig> {
        self.config.load_full()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = CouncilConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        let file_name = config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Watch the parent directory so editors that replace the file are seen
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            let debounce = Duration::from_millis(500);
            let mut last_reload: Option<std::time::Instant> = None;

            while rx.recv().await.is_some() {
                if last_reload.is_some_and(|at| at.elapsed() < debounce) {
                    continue;
                }

                // Wait a bit for the write to complete
                tokio::time::sleep(Duration::from_millis(100)).await;

                match CouncilConfig::load(&config_path) {
                    Ok(new_config) => {
                        config_arc.store(Arc::new(new_config));
                        info!("Configuration hot-reloaded successfully");
                        last_reload = Some(std::time::Instant::now());
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> String {
        r#"
[server]
host = "0.0.0.0"
port = 9000
log_level = "debug"

[search]
backend = "duckduckgo"
max_results = 4

[pipeline]
request_timeout_secs = 20

[[providers]]
model = "deepseek-reasoner"
base_url = "https://api.deepseek.com"
api_key_env = "COUNCIL_TEST_DEEPSEEK_KEY"

[[providers]]
model = "moonshot-v1-8k"
base_url = "https://api.moonshot.cn/v1"
api_key_env = "COUNCIL_TEST_KIMI_KEY"

[[providers]]
model = "gpt-4o"
api_key_env = "COUNCIL_TEST_OPENAI_KEY"
merge_system_prompt = true

[solver]
model = "deepseek-chat"
base_url = "https://api.deepseek.com"
api_key_env = "COUNCIL_TEST_DEEPSEEK_KEY"
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config = CouncilConfig::from_toml_str(&create_test_config()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.search.backend, SearchBackend::DuckDuckGo);
        assert_eq!(config.search.max_results, 4);
        assert_eq!(config.pipeline.request_timeout(), Duration::from_secs(20));
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.solver.as_ref().unwrap().model, "deepseek-chat");
    }

    #[test]
    fn test_provider_order_is_preserved() {
        let config = CouncilConfig::from_toml_str(&create_test_config()).unwrap();
        let models: Vec<_> = config
            .research_providers()
            .into_iter()
            .map(|p| p.model)
            .collect();

        assert_eq!(models, vec!["deepseek-reasoner", "moonshot-v1-8k", "gpt-4o"]);
    }

    #[test]
    fn test_merge_flag_resolution() {
        let config = CouncilConfig::from_toml_str(&create_test_config()).unwrap();
        let providers = config.research_providers();

        // Derived from the model name
        assert!(providers[0].merge_system_prompt);
        assert!(!providers[1].merge_system_prompt);
        // Explicit override
        assert!(providers[2].merge_system_prompt);
    }

    #[test]
    fn test_explicit_false_overrides_reasoner_name() {
        let settings = ProviderSettings {
            model: "some-Reasoner-v2".to_string(),
            base_url: default_openai_base(),
            api_key_env: "UNUSED".to_string(),
            merge_system_prompt: Some(false),
        };
        assert!(!settings.merge_system_prompt());
    }

    #[test]
    fn test_missing_credential_resolves_to_none() {
        let settings = ProviderSettings {
            model: "gpt-4o".to_string(),
            base_url: default_openai_base(),
            api_key_env: "COUNCIL_TEST_DEFINITELY_UNSET_KEY".to_string(),
            merge_system_prompt: None,
        };

        let resolved = settings.resolve();
        assert!(resolved.api_key.is_none());
        assert_eq!(resolved.api_key_env, "COUNCIL_TEST_DEFINITELY_UNSET_KEY");
    }

    #[test]
    fn test_credential_resolved_from_env() {
        // SAFETY: unique variable name, not read by any other test
        unsafe {
            std::env::set_var("COUNCIL_TEST_RESOLVE_KEY", "sk-test");
        }
        let settings = ProviderSettings {
            model: "gpt-4o".to_string(),
            base_url: default_openai_base(),
            api_key_env: "COUNCIL_TEST_RESOLVE_KEY".to_string(),
            merge_system_prompt: None,
        };

        assert_eq!(settings.resolve().api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_defaults() {
        let config = CouncilConfig::from_toml_str("").unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.search.backend, SearchBackend::Tavily);
        assert_eq!(config.search.api_key_env, "TAVILY_API_KEY");
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.pipeline.context_results, 3);
        assert_eq!(config.pipeline.connect_timeout(), Duration::from_secs(10));
        assert!(config.providers.is_empty());
        assert!(config.solver.is_none());
    }

    #[test]
    fn test_validation_duplicate_provider() {
        let toml = r#"
[[providers]]
model = "gpt-4o"
api_key_env = "A"

[[providers]]
model = "gpt-4o"
api_key_env = "B"
"#;
        let result = CouncilConfig::from_toml_str(toml);
        assert!(matches!(result, Err(ConfigError::DuplicateProvider(m)) if m == "gpt-4o"));
    }

    #[test]
    fn test_validation_zero_max_results() {
        let toml = r#"
[search]
max_results = 0
"#;
        let result = CouncilConfig::from_toml_str(toml);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_empty_solver_model() {
        let toml = r#"
[solver]
model = " "
api_key_env = "X"
"#;
        assert!(CouncilConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = CouncilConfig::load("/definitely/not/here/council.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_config_manager_from_config() {
        let config = CouncilConfig::from_toml_str(&create_test_config()).unwrap();
        let manager = ConfigManager::from_config(config);

        let snapshot = manager.config();
        assert_eq!(snapshot.providers.len(), 3);
    }

    #[test]
    fn test_config_manager_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("council.toml");
        fs::write(&path, "[server]\nport = 8100\n").unwrap();

        let manager = ConfigManager::new(&path).unwrap();
        assert_eq!(manager.config().server.port, 8100);

        let before = manager.config();
        fs::write(&path, "[server]\nport = 8200\n").unwrap();
        manager.reload().unwrap();

        assert_eq!(manager.config().server.port, 8200);
        // Earlier snapshots are unaffected
        assert_eq!(before.server.port, 8100);
    }

    #[test]
    fn test_failed_reload_keeps_previous_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("council.toml");
        fs::write(&path, "[server]\nport = 8100\n").unwrap();

        let manager = ConfigManager::new(&path).unwrap();
        fs::write(&path, "[server\nport = ").unwrap();

        assert!(manager.reload().is_err());
        assert_eq!(manager.config().server.port, 8100);
    }
}
