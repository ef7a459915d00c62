/// Configuration schema and defaults for offerdash.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[general]`, `[web]`, `[analytics]`, `[chat]`, `[spy]` and `[logging]`.
///
/// Every field has a sensible built-in default. Users only need to set the
/// values they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level offerdash configuration.
///
/// Maps directly to the `~/.offerdash/config.toml` and `.offerdash.toml`
/// file schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferdashConfig {
    pub general: GeneralConfig,
    pub web: WebConfig,
    pub analytics: AnalyticsConfig,
    pub chat: ChatConfig,
    pub spy: SpyConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [general]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding `offers.json` and `activity.jsonl`. `~` is expanded
    /// to the home directory.
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.offerdash".to_string(),
        }
    }
}

impl GeneralConfig {
    /// `data_dir` with a leading `~` expanded.
    pub fn data_dir_path(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }
}

/// Expand a leading `~` or `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

/// Dashboard server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: false,
        }
    }
}

// ---------------------------------------------------------------------------
// [analytics]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Window length when no explicit dates are given.
    pub default_days: u32,
    /// Minutes east of UTC used to assign offers to calendar days.
    /// `-180` is Brasília time.
    pub utc_offset_minutes: i32,
    /// Entries in the top-offers list.
    pub top_offers: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_days: 30,
            utc_offset_minutes: -180,
            top_offers: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// [chat]
// ---------------------------------------------------------------------------

/// AI mentor chat settings (OpenRouter-compatible endpoint).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Chat completions endpoint.
    pub api_url: String,
    pub model: String,
    /// API key. Usually supplied through `OPENROUTER_API_KEY` instead.
    pub api_key: String,
    /// Sent as `HTTP-Referer`.
    pub site_url: String,
    /// Sent as `X-Title`.
    pub site_name: String,
    /// Whole-request timeout (milliseconds), streaming included.
    pub timeout_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "nousresearch/nous-hermes-2-mistral-7b-dpo:free".to_string(),
            api_key: String::new(),
            site_url: "http://localhost:9747".to_string(),
            site_name: "AI Mentor".to_string(),
            timeout_ms: 120_000,
        }
    }
}

impl ChatConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// [spy]
// ---------------------------------------------------------------------------

/// Landing-page metadata fetcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpyConfig {
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for SpyConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                .to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `"info"`, `"debug"`, `"warn"`, `"error"`. `RUST_LOG` wins
    /// when set.
    pub level: String,
    /// Whether offer mutations are appended to `<data_dir>/activity.jsonl`.
    pub activity_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            activity_log: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl OfferdashConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `offerdash config init`.
    pub fn default_toml() -> String {
        r#"# offerdash Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (OFFERDASH_*, OPENROUTER_API_KEY)
#   2. Project config (.offerdash.toml in current directory)
#   3. User global config (~/.offerdash/config.toml)
#   4. Built-in defaults

[general]
data_dir = "~/.offerdash"        # offers.json and activity.jsonl live here

[web]
addr = "127.0.0.1:9747"
open_browser = false

[analytics]
default_days = 30
utc_offset_minutes = -180        # Minutes east of UTC (-180 = Brasília)
top_offers = 5

[chat]
api_url = "https://openrouter.ai/api/v1/chat/completions"
model = "nousresearch/nous-hermes-2-mistral-7b-dpo:free"
api_key = ""                     # Prefer OPENROUTER_API_KEY
site_url = "http://localhost:9747"
site_name = "AI Mentor"
timeout_ms = 120000

[spy]
timeout_ms = 10000
user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36"

[logging]
level = "info"                   # error | warn | info | debug | trace
activity_log = true
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
