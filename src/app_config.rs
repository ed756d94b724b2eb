use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Target language code (ISO 639-1)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Unit extraction config (tag and attribute allow-lists)
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Translation provider config
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Resolver config (priority order and total-failure policy)
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Pipeline concurrency and timeout config
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Tag and attribute allow-lists driving unit extraction
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Elements whose direct text content is translatable
    #[serde(default = "default_text_tags")]
    pub text_tags: Vec<String>,

    /// Attributes translatable on any element
    #[serde(default = "default_translatable_attributes")]
    pub translatable_attributes: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            text_tags: default_text_tags(),
            translatable_attributes: default_translatable_attributes(),
        }
    }
}

/// Configuration for all translation backends
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ProvidersConfig {
    /// Best-effort endpoint pool (LibreTranslate-compatible wire format)
    #[serde(default)]
    pub pool: PoolProviderConfig,

    /// Keyed single-endpoint provider (DeepL-compatible wire format)
    #[serde(default)]
    pub keyed: KeyedProviderConfig,

    /// Arbitration provider (OpenAI chat-completions wire format)
    #[serde(default)]
    pub arbiter: ArbiterConfig,
}

/// Best-effort pool provider configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolProviderConfig {
    /// Interchangeable endpoints, shuffled on every pass
    #[serde(default = "default_pool_endpoints")]
    pub endpoints: Vec<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_pool_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Pause between full endpoint passes, in seconds
    #[serde(default = "default_pool_pass_backoff_secs")]
    pub pass_backoff_secs: u64,

    /// Global retry window in seconds; the provider gives up once it elapses
    #[serde(default = "default_pool_retry_window_secs")]
    pub retry_window_secs: u64,
}

impl Default for PoolProviderConfig {
    fn default() -> Self {
        Self {
            endpoints: default_pool_endpoints(),
            request_timeout_secs: default_pool_timeout_secs(),
            pass_backoff_secs: default_pool_pass_backoff_secs(),
            retry_window_secs: default_pool_retry_window_secs(),
        }
    }
}

/// Keyed single-endpoint provider configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KeyedProviderConfig {
    /// API key; may also come from the PAGELINGO_KEYED_API_KEY env var
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_keyed_endpoint")]
    pub endpoint: String,

    /// Bounded number of attempts before giving up
    #[serde(default = "default_keyed_max_attempts")]
    pub max_attempts: usize,

    /// Base backoff in milliseconds for exponential backoff between attempts
    #[serde(default = "default_keyed_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_keyed_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for KeyedProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_keyed_endpoint(),
            max_attempts: default_keyed_max_attempts(),
            backoff_base_ms: default_keyed_backoff_base_ms(),
            request_timeout_secs: default_keyed_timeout_secs(),
        }
    }
}

/// Arbitration provider configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ArbiterConfig {
    /// Whether arbitration is attempted at all
    #[serde(default = "default_arbiter_enabled")]
    pub enabled: bool,

    /// API key; may also come from the PAGELINGO_ARBITER_API_KEY env var
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_arbiter_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_arbiter_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_arbiter_temperature")]
    pub temperature: f32,

    /// Per-request timeout in seconds
    #[serde(default = "default_arbiter_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            enabled: default_arbiter_enabled(),
            api_key: String::new(),
            endpoint: default_arbiter_endpoint(),
            model: default_arbiter_model(),
            temperature: default_arbiter_temperature(),
            request_timeout_secs: default_arbiter_timeout_secs(),
        }
    }
}

/// What the resolver inserts when every provider and the arbiter failed
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TotalFailurePolicy {
    /// Insert the designated failure sentinel
    #[default]
    Sentinel,
    /// Insert the original untranslated content
    Original,
}

/// Resolver configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResolverConfig {
    /// Provider priority order used after arbitration, highest first
    #[serde(default = "default_provider_priority")]
    pub priority: Vec<String>,

    /// Policy when no provider produced any text
    #[serde(default)]
    pub total_failure_policy: TotalFailurePolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            priority: default_provider_priority(),
            total_failure_policy: TotalFailurePolicy::default(),
        }
    }
}

/// Pipeline concurrency and timeout configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Maximum number of units translated concurrently
    #[serde(default = "default_max_concurrent_units")]
    pub max_concurrent_units: usize,

    /// Whole-document timeout in seconds; 0 disables the timeout
    #[serde(default = "default_document_timeout_secs")]
    pub document_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_units: default_max_concurrent_units(),
            document_timeout_secs: default_document_timeout_secs(),
        }
    }
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_language: default_target_language(),
            extraction: ExtractionConfig::default(),
            providers: ProvidersConfig::default(),
            resolver: ResolverConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, then apply env var overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;
        let mut config: Config =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Default configuration with env var overrides applied
    pub fn default_config() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Pull secrets from the environment, preferring env vars over file values
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("PAGELINGO_KEYED_API_KEY") {
            if !key.is_empty() {
                self.providers.keyed.api_key = key;
            }
        }
        if let Ok(key) = std::env::var("PAGELINGO_ARBITER_API_KEY") {
            if !key.is_empty() {
                self.providers.arbiter.api_key = key;
            }
        }
    }

    /// Validate the configuration values
    pub fn validate(&self) -> Result<()> {
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language cannot be empty"));
        }
        if self.extraction.text_tags.is_empty() && self.extraction.translatable_attributes.is_empty()
        {
            return Err(anyhow!(
                "At least one of the tag or attribute allow-lists must be non-empty"
            ));
        }
        if self.providers.pool.endpoints.is_empty() {
            return Err(anyhow!("Pool provider requires at least one endpoint"));
        }
        for endpoint in &self.providers.pool.endpoints {
            url::Url::parse(endpoint)
                .with_context(|| format!("Invalid pool endpoint URL: {}", endpoint))?;
        }
        url::Url::parse(&self.providers.keyed.endpoint)
            .with_context(|| format!("Invalid keyed endpoint URL: {}", self.providers.keyed.endpoint))?;
        if self.providers.keyed.max_attempts == 0 {
            return Err(anyhow!("Keyed provider needs at least one attempt"));
        }
        if self.pipeline.max_concurrent_units == 0 {
            return Err(anyhow!("max_concurrent_units must be greater than zero"));
        }
        if self.resolver.priority.is_empty() {
            return Err(anyhow!("Resolver priority list cannot be empty"));
        }
        Ok(())
    }
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_text_tags() -> Vec<String> {
    [
        "title", "h1", "h2", "h3", "h4", "h5", "h6", "p", "a", "button", "span", "div", "li",
        "td", "th", "label", "address", "figcaption", "caption", "summary", "blockquote", "q",
        "cite", "dt", "dd", "legend", "option", "strong", "em", "mark", "time",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_translatable_attributes() -> Vec<String> {
    ["title", "alt", "placeholder"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_pool_endpoints() -> Vec<String> {
    [
        "https://translate.argosopentech.com",
        "https://libretranslate.de",
        "https://libretranslate.terraprint.co",
        "https://lt.vern.cc",
        "https://trans.zillyhuhn.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_pool_timeout_secs() -> u64 {
    30
}

fn default_pool_pass_backoff_secs() -> u64 {
    5
}

fn default_pool_retry_window_secs() -> u64 {
    600
}

fn default_keyed_endpoint() -> String {
    "https://api-free.deepl.com/v2/translate".to_string()
}

fn default_keyed_max_attempts() -> usize {
    5
}

fn default_keyed_backoff_base_ms() -> u64 {
    2000
}

fn default_keyed_timeout_secs() -> u64 {
    15
}

fn default_arbiter_enabled() -> bool {
    true
}

fn default_arbiter_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_arbiter_model() -> String {
    "gpt-4".to_string()
}

fn default_arbiter_temperature() -> f32 {
    0.2
}

fn default_arbiter_timeout_secs() -> u64 {
    60
}

fn default_provider_priority() -> Vec<String> {
    vec!["keyed".to_string(), "pool".to_string()]
}

fn default_max_concurrent_units() -> usize {
    8
}

fn default_document_timeout_secs() -> u64 {
    900
}
