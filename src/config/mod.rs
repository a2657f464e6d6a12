/// Configuration system for pulsecheck.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::PulseConfig::default()`]
/// 2. **User global config**: `~/.pulsecheck/config.toml`
/// 3. **Project local config**: `.pulsecheck.toml` in the current directory
/// 4. **Environment variables**: `PULSECHECK_*` overrides (highest precedence)
///
/// Later layers override earlier ones key by key: a file that only sets
/// `[analysis] method` leaves every other value from the previous layer alone.
///
/// # Usage
///
/// ```rust,ignore
/// use pulsecheck::config;
///
/// let cfg = config::load();
/// let client = AnalysisClient::from_config(&cfg.analysis);
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::PulseConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges defaults → global TOML → project TOML → env vars.
pub fn load() -> PulseConfig {
    let mut config = load_files(&[global_config_path(), project_config_path()]);
    apply_env_overrides(&mut config);
    config
}

/// Merge the given TOML files (lowest precedence first) over the defaults.
///
/// Missing files, files that are not TOML and files with a wrongly typed value
/// are skipped on their own. The other layers still apply.
fn load_files(paths: &[Option<PathBuf>]) -> PulseConfig {
    let mut config = PulseConfig::default();
    let Ok(mut merged) = toml::Value::try_from(&config) else {
        return config;
    };

    for path in paths.iter().flatten() {
        let Some(layer) = read_toml_value(path) else {
            continue;
        };

        let mut candidate = merged.clone();
        merge_values(&mut candidate, layer);
        let parsed: Result<PulseConfig, _> = candidate.clone().try_into();
        match parsed {
            Ok(parsed) => {
                config = parsed;
                merged = candidate;
            }
            Err(e) => eprintln!("[pulsecheck] ignoring {}: {e}", path.display()),
        }
    }

    config
}

fn read_toml_value(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Recursively overlay `overlay` onto `base`. Tables merge key by key, any
/// other value replaces the base value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
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

/// Path to the user global config: `~/.pulsecheck/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pulsecheck").join("config.toml"))
}

/// Path to the project local config: `.pulsecheck.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".pulsecheck.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `PULSECHECK_ANALYSIS_URL`: analysis service base URL
/// - `PULSECHECK_METHOD`: scoring method (`ml`, `nltk`)
/// - `PULSECHECK_GRAPH_URL`: profile API base URL
/// - `PULSECHECK_WEB_ADDR`: dashboard listen address
/// - `PULSECHECK_LOGIN_URL`: external login surface
/// - `PULSECHECK_LOGGING`: event log on/off (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut PulseConfig) {
    if let Ok(val) = std::env::var("PULSECHECK_ANALYSIS_URL")
        && !val.is_empty()
    {
        config.analysis.base_url = val;
    }
    if let Ok(val) = std::env::var("PULSECHECK_METHOD")
        && let Some(method) = parse_method(&val)
    {
        config.analysis.method = method;
    }
    if let Ok(val) = std::env::var("PULSECHECK_GRAPH_URL")
        && !val.is_empty()
    {
        config.graph.base_url = val;
    }
    if let Ok(val) = std::env::var("PULSECHECK_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Ok(val) = std::env::var("PULSECHECK_LOGIN_URL")
        && !val.is_empty()
    {
        config.web.login_url = val;
    }
    if let Ok(val) = std::env::var("PULSECHECK_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse a scoring method string.
pub fn parse_method(val: &str) -> Option<schema::Method> {
    match val.to_ascii_lowercase().as_str() {
        "ml" => Some(schema::Method::Ml),
        "nltk" | "lexicon" => Some(schema::Method::Nltk),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.pulsecheck/config.toml`.
///
/// Returns an error if the file already exists, unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, PulseConfig::default_toml()).context("failed to write config file")
}

/// Set a single config key in the global config file.
///
/// Supports dotted keys like `analysis.method`. The value is parsed to match
/// the type of the key's current value.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_at(&path, key, value)
}

fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let mut root = toml::Value::try_from(PulseConfig::default())
        .context("failed to serialize default config")?;

    // Start from defaults so keys missing from a partial file can still be set.
    if path.exists() {
        let content = fs::read_to_string(path).context("failed to read config file")?;
        let existing: toml::Value =
            toml::from_str(&content).context("failed to parse config as TOML value")?;
        merge_values(&mut root, existing);
    }

    set_toml_value(&mut root, key, value)?;

    // Reject values that would make the file unloadable.
    let _: PulseConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}': '{value}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    if key.is_empty() {
        anyhow::bail!("empty config key");
    }
    let (sections, leaf) = key.rsplit_once('.').unwrap_or(("", key));

    let mut current = root;
    for part in sections.split('.').filter(|p| !p.is_empty()) {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{sections}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("config key '{key}' is a section, not a value"),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use schema::Method;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn parse_method_handles_variants() {
        assert_eq!(parse_method("ml"), Some(Method::Ml));
        assert_eq!(parse_method("ML"), Some(Method::Ml));
        assert_eq!(parse_method("nltk"), Some(Method::Nltk));
        assert_eq!(parse_method("lexicon"), Some(Method::Nltk));
        assert_eq!(parse_method("bert"), None);
    }

    #[test]
    fn later_layers_override_key_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        fs::write(
            &global,
            "[analysis]\nmethod = \"nltk\"\nbase_url = \"http://analysis:9000\"\n",
        )
        .unwrap();
        fs::write(&project, "[analysis]\nmethod = \"ml\"\n").unwrap();

        let config = load_files(&[Some(global), Some(project)]);
        assert_eq!(config.analysis.method, Method::Ml);
        assert_eq!(config.analysis.base_url, "http://analysis:9000");
        assert_eq!(config.web, schema::WebConfig::default());
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "[analysis\nmethod = ").unwrap();

        let config = load_files(&[Some(broken), Some(dir.path().join("missing.toml"))]);
        assert_eq!(config, PulseConfig::default());
    }

    #[test]
    fn mistyped_layer_is_skipped_alone() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        fs::write(&global, "[web]\naddr = \"0.0.0.0:1234\"\n").unwrap();
        fs::write(
            &project,
            "[graph]\npicture_size = \"big\"\n\n[analysis]\nmethod = \"nltk\"\n",
        )
        .unwrap();

        let config = load_files(&[Some(global), Some(project)]);
        assert_eq!(config.web.addr, "0.0.0.0:1234");
        assert_eq!(config.graph, schema::GraphConfig::default());
        assert_eq!(config.analysis.method, Method::Ml);
    }

    #[test]
    fn set_toml_value_updates_typed_values() {
        let mut root = toml::Value::try_from(PulseConfig::default()).unwrap();
        set_toml_value(&mut root, "analysis.method", "nltk").unwrap();
        set_toml_value(&mut root, "graph.picture_size", "200").unwrap();
        set_toml_value(&mut root, "web.open_browser", "off").unwrap();

        let config: PulseConfig = root.try_into().unwrap();
        assert_eq!(config.analysis.method, Method::Nltk);
        assert_eq!(config.graph.picture_size, 200);
        assert!(!config.web.open_browser);
    }

    #[test]
    fn set_toml_value_rejects_bad_input() {
        let mut root = toml::Value::try_from(PulseConfig::default()).unwrap();
        assert!(set_toml_value(&mut root, "nonexistent.key", "x").is_err());
        assert!(set_toml_value(&mut root, "analysis.unknown", "x").is_err());
        assert!(set_toml_value(&mut root, "graph.picture_size", "big").is_err());
        assert!(set_toml_value(&mut root, "analysis", "x").is_err());
        assert!(set_toml_value(&mut root, "", "x").is_err());
    }

    #[test]
    fn set_config_value_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        set_config_value_at(&path, "web.addr", "0.0.0.0:8080").unwrap();
        let written: PulseConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.web.addr, "0.0.0.0:8080");

        // Invalid enum value is rejected and the file is left untouched.
        assert!(set_config_value_at(&path, "analysis.method", "bert").is_err());
        let written: PulseConfig = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.analysis.method, Method::Ml);
    }

    #[test]
    fn write_default_config_respects_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_default_config(&path, false).unwrap();
        assert!(write_default_config(&path, false).is_err());
        write_default_config(&path, true).unwrap();
    }

    #[test]
    fn expand_home_handles_plain_paths() {
        assert_eq!(
            expand_home("/tmp/events.jsonl"),
            Some(PathBuf::from("/tmp/events.jsonl"))
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x.json"), Some(home.join("x.json")));
        }
    }

    #[test]
    fn show_effective_config_returns_toml() {
        let toml_str = show_effective_config().unwrap();
        let _: PulseConfig = toml::from_str(&toml_str).unwrap();
    }
}
