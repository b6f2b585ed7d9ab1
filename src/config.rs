//! Application configuration: config/default.toml plus environment overrides
//!
//! Load order: the TOML file first, then `ATRIUM__*` environment variables on
//! top (double underscore nests keys, e.g. `ATRIUM__LLM__PROVIDER=mock`).

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration root (top level of config/default.toml)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub llm: LlmSection,
}

/// [server] section: bind address
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// [session] section: window size and the interaction-mode override
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    /// Assistant replies kept per submission window
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
    /// When set, replaces whatever interaction_mode the client sends; empty
    /// or absent makes the client's mode authoritative (and required)
    #[serde(default = "default_mode_override")]
    pub mode_override: Option<String>,
}

fn default_max_history_turns() -> usize {
    5
}

fn default_mode_override() -> Option<String> {
    Some("free".to_string())
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
            mode_override: default_mode_override(),
        }
    }
}

/// [storage] section: canonical layout directory and history snapshot path
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_layout_dir")]
    pub layout_dir: PathBuf,
    #[serde(default = "default_history_path")]
    pub history_path: PathBuf,
}

fn default_layout_dir() -> PathBuf {
    PathBuf::from("./uploaded_jsons")
}

fn default_history_path() -> PathBuf {
    PathBuf::from("./conversation_history.json")
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            layout_dir: default_layout_dir(),
            history_path: default_history_path(),
        }
    }
}

/// [llm] section: backend selection, generation parameters, timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// Backend: azure / openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub azure: LlmAzureSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

fn default_provider() -> String {
    "azure".to_string()
}

fn default_model() -> String {
    "gpt-4.1".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    500
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            azure: LlmAzureSection::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

/// [llm.azure] section: deployment coordinates, deployment id defaults to the model name
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmAzureSection {
    pub endpoint: Option<String>,
    pub deployment: Option<String>,
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// Backend request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            session: SessionSection::default(),
            storage: StorageSection::default(),
            llm: LlmSection::default(),
        }
    }
}

/// Loads configuration, with environment variables `ATRIUM__*` on top
///
/// 1. Looks for config/default.toml, ../config/default.toml, default.toml in
///    order and takes the first hit as the base source
/// 2. If config_path is given and exists, it is layered over the base
/// 3. Environment variables `ATRIUM__*` override last (double underscore
///    nests keys)
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("ATRIUM")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
