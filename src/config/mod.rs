/// Configuration system for offerdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::OfferdashConfig::default()`]
/// 2. **User global config**: `~/.offerdash/config.toml`
/// 3. **Project local config**: `.offerdash.toml` in the current directory
/// 4. **Environment variables**: `OFFERDASH_*` and `OPENROUTER_API_KEY`
///
/// Files are merged key by key, so a project file that only sets
/// `[web] addr` keeps every other value from the global file.
///
/// # Usage
///
/// ```rust,ignore
/// use offerdash::config;
///
/// let cfg = config::load();
/// let store = JsonFileStore::in_dir(&cfg.general.data_dir_path());
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

pub use schema::OfferdashConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> OfferdashConfig {
    load_layers(&default_layers())
}

/// The file layers [`load`] reads, lowest precedence first.
pub fn default_layers() -> Vec<Option<PathBuf>> {
    vec![global_config_path(), project_config_path()]
}

/// Merge `paths` and apply the process environment on top.
pub fn load_layers(paths: &[Option<PathBuf>]) -> OfferdashConfig {
    let mut config = load_files(paths);
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Merge the given TOML files (later wins) over the built-in defaults.
///
/// Missing files are skipped. Malformed files are skipped with a warning so
/// a typo never locks the user out of the dashboard.
pub fn load_files(paths: &[Option<PathBuf>]) -> OfferdashConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());
    for path in paths.iter().flatten() {
        if let Some(layer) = load_toml_file(path) {
            merge_values(&mut merged, layer);
        }
    }

    match merged.try_into() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "config has invalid values, using defaults");
            OfferdashConfig::default()
        }
    }
}

fn load_toml_file(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed config file");
            None
        }
    }
}

/// Deep-merge `overlay` into `base`: tables merge recursively, any other
/// value replaces.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.offerdash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".offerdash").join("config.toml"))
}

/// Path to the project local config: `.offerdash.toml` in the current
/// directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".offerdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `OFFERDASH_DATA_DIR`: data directory
/// - `OFFERDASH_ADDR`: dashboard listen address
/// - `OFFERDASH_OPEN_BROWSER`: open the browser on `web` (`1`/`true`/`yes`/`on`)
/// - `OFFERDASH_UTC_OFFSET_MINUTES`: analytics day offset
/// - `OFFERDASH_LOG_LEVEL`: log level
/// - `OFFERDASH_CHAT_MODEL`: chat model
/// - `OPENROUTER_API_KEY` or `OFFERDASH_CHAT_API_KEY`: chat API key
pub fn apply_env_overrides(config: &mut OfferdashConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("OFFERDASH_DATA_DIR")
        && !val.is_empty()
    {
        config.general.data_dir = val;
    }
    if let Some(val) = var("OFFERDASH_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Some(val) = var("OFFERDASH_OPEN_BROWSER") {
        config.web.open_browser = is_truthy(&val);
    }
    if let Some(val) = var("OFFERDASH_UTC_OFFSET_MINUTES")
        && let Ok(minutes) = val.trim().parse::<i32>()
    {
        config.analytics.utc_offset_minutes = minutes;
    }
    if let Some(val) = var("OFFERDASH_LOG_LEVEL")
        && !val.is_empty()
    {
        config.logging.level = val;
    }
    if let Some(val) = var("OFFERDASH_CHAT_MODEL")
        && !val.is_empty()
    {
        config.chat.model = val;
    }
    for key in ["OPENROUTER_API_KEY", "OFFERDASH_CHAT_API_KEY"] {
        if let Some(val) = var(key)
            && !val.trim().is_empty()
        {
            config.chat.api_key = val;
        }
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.offerdash/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    init_config_at(&path, force)?;
    Ok(path)
}

/// [`init_config`] against an explicit path.
pub fn init_config_at(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, OfferdashConfig::default_toml()).context("failed to write config file")?;
    Ok(())
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `analytics.default_days`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_at(&path, key, value)
}

/// [`set_config_value`] against an explicit path.
///
/// A missing file starts from the serialized defaults, so every known key can
/// be set. The result must still deserialize; a value of the wrong type is
/// rejected before anything is written.
pub fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config as TOML value")?
    } else {
        let defaults = toml::to_string_pretty(&OfferdashConfig::default())
            .context("failed to serialize default config")?;
        toml::from_str(&defaults).context("failed to parse serialized defaults")?
    };

    // Keys absent from a hand-written file are filled in from the defaults.
    if get_toml_value(&root, key).is_none() {
        let defaults: toml::Value = toml::Value::try_from(OfferdashConfig::default())
            .context("failed to serialize default config")?;
        if let Some(default_leaf) = get_toml_value(&defaults, key) {
            insert_toml_path(&mut root, key, default_leaf.clone())?;
        }
    }

    set_toml_value(&mut root, key, value)?;

    let _: OfferdashConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")?;
    Ok(())
}

fn get_toml_value<'a>(root: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.').try_fold(root, |node, part| node.get(part))
}

fn insert_toml_path(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let Some((section, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config key must be 'section.key', got '{key}'");
    };
    let mut current = root;
    for part in section.split('.') {
        let table = current
            .as_table_mut()
            .with_context(|| format!("expected table at '{part}' in '{key}'"))?;
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{section}'"))?;
    table.insert(leaf.to_string(), value);
    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("config key must be 'section.key', got '{key}'");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let Some(existing) = table.get(leaf) else {
        anyhow::bail!("config key not found: '{key}'");
    };
    let new_value = match existing {
        toml::Value::Boolean(_) => toml::Value::Boolean(is_truthy(raw_value)),
        toml::Value::Integer(_) => {
            let n: i64 = raw_value
                .trim()
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        toml::Value::Float(_) => {
            let f: f64 = raw_value
                .trim()
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML. The API key is masked.
pub fn show_effective_config() -> Result<String> {
    render_config(&load())
}

/// Serialize `config` for display, masking the API key.
pub fn render_config(config: &OfferdashConfig) -> Result<String> {
    let mut shown = config.clone();
    shown.chat.api_key = mask_secret(&shown.chat.api_key);
    toml::to_string_pretty(&shown).context("failed to serialize effective config")
}

/// `sk-or-v1-abcdef…` becomes `sk-o…cdef`; short or empty secrets are fully
/// hidden.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => String::new(),
        n if n <= 8 => "********".to_string(),
        n => {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{head}…{tail}")
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn load_files_returns_defaults_when_no_files_exist() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_files(&[Some(dir.path().join("missing.toml")), None]);
        assert_eq!(config, OfferdashConfig::default());
    }

    #[test]
    fn later_files_override_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        fs::write(&global, "[web]\naddr = \"0.0.0.0:1\"\nopen_browser = true\n").unwrap();
        fs::write(&project, "[web]\naddr = \"127.0.0.1:2\"\n").unwrap();

        let config = load_files(&[Some(global), Some(project)]);
        assert_eq!(config.web.addr, "127.0.0.1:2");
        assert!(config.web.open_browser);
    }

    #[test]
    fn malformed_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "this is = = not toml").unwrap();
        assert_eq!(load_files(&[Some(bad)]), OfferdashConfig::default());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = OfferdashConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("OFFERDASH_ADDR", "0.0.0.0:8080"),
                ("OFFERDASH_OPEN_BROWSER", "yes"),
                ("OFFERDASH_UTC_OFFSET_MINUTES", "60"),
                ("OPENROUTER_API_KEY", "sk-test-key"),
            ]),
        );
        assert_eq!(config.web.addr, "0.0.0.0:8080");
        assert!(config.web.open_browser);
        assert_eq!(config.analytics.utc_offset_minutes, 60);
        assert!(config.chat.has_api_key());
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = OfferdashConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[("OFFERDASH_DATA_DIR", ""), ("OPENROUTER_API_KEY", "  ")]),
        );
        assert_eq!(config, OfferdashConfig::default());
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn set_toml_value_updates_typed_values() {
        let toml_str = r#"
[web]
addr = "127.0.0.1:9747"
open_browser = false

[analytics]
default_days = 30
"#;
        let mut root: toml::Value = toml::from_str(toml_str).unwrap();
        set_toml_value(&mut root, "web.addr", "0.0.0.0:1").unwrap();
        set_toml_value(&mut root, "web.open_browser", "true").unwrap();
        set_toml_value(&mut root, "analytics.default_days", "7").unwrap();

        assert_eq!(root["web"]["addr"].as_str(), Some("0.0.0.0:1"));
        assert_eq!(root["web"]["open_browser"].as_bool(), Some(true));
        assert_eq!(root["analytics"]["default_days"].as_integer(), Some(7));
    }

    #[test]
    fn set_toml_value_rejects_invalid_key() {
        let mut root: toml::Value = toml::from_str("[web]\naddr = \"x\"\n").unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "value").is_err());
        assert!(set_toml_value(&mut root, "web.nope", "value").is_err());
        assert!(set_toml_value(&mut root, "web", "value").is_err());
    }

    #[test]
    fn set_config_value_at_creates_and_updates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        set_config_value_at(&path, "analytics.default_days", "14").unwrap();
        let config = load_files(&[Some(path.clone())]);
        assert_eq!(config.analytics.default_days, 14);

        // A hand-written file missing the section still accepts known keys.
        fs::write(&path, "[web]\naddr = \"127.0.0.1:1\"\n").unwrap();
        set_config_value_at(&path, "chat.model", "openai/gpt-4o-mini").unwrap();
        let config = load_files(&[Some(path.clone())]);
        assert_eq!(config.chat.model, "openai/gpt-4o-mini");
        assert_eq!(config.web.addr, "127.0.0.1:1");
    }

    #[test]
    fn set_config_value_at_rejects_bad_types() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(set_config_value_at(&path, "analytics.default_days", "many").is_err());
        assert!(set_config_value_at(&path, "analytics.default_days", "-3").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn init_config_at_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        init_config_at(&path, false).unwrap();
        assert!(init_config_at(&path, false).is_err());
        init_config_at(&path, true).unwrap();
        assert_eq!(load_files(&[Some(path)]), OfferdashConfig::default());
    }

    #[test]
    fn render_config_masks_api_key() {
        let mut config = OfferdashConfig::default();
        config.chat.api_key = "sk-or-v1-0123456789".to_string();
        let rendered = render_config(&config).unwrap();
        assert!(!rendered.contains("0123456789"));
        assert!(rendered.contains("sk-o…6789"));
        assert_eq!(mask_secret("short"), "********");
        assert_eq!(mask_secret(""), "");
    }
}
