//! Store configuration.
//!
//! Loaded from a TOML file layered over stock defaults. The file is sparse:
//! it only needs the keys it overrides.
//!
//! ## Config File Location
//!
//! `--config <path>` names the file explicitly; otherwise `assetstore.toml`
//! in the working directory is used when present. With neither, the stock
//! defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! storage_root = "storage"      # Overridden by the STORAGE_ROOT env var
//!
//! [encoding]
//! primary_max_width = 2000      # Width cap for webp/ renditions
//! primary_quality = 85          # 1-100
//! derivative_quality = 80       # 1-100
//!
//! [logging]
//! level = "info"                # EnvFilter directive; RUST_LOG wins
//! format = "text"               # "text" or "json"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Quality, RenditionConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "assetstore.toml";

/// Environment variable overriding `storage_root`.
pub const STORAGE_ROOT_ENV: &str = "STORAGE_ROOT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Store configuration.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding the folder tree.
    pub storage_root: PathBuf,
    pub encoding: EncodingConfig,
    pub logging: LoggingConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("storage"),
            encoding: EncodingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage_root must not be empty".into(),
            ));
        }
        if self.encoding.primary_max_width == 0 {
            return Err(ConfigError::Validation(
                "encoding.primary_max_width must be greater than 0".into(),
            ));
        }
        for (key, value) in [
            ("primary_quality", self.encoding.primary_quality),
            ("derivative_quality", self.encoding.derivative_quality),
        ] {
            if !(1..=100).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "encoding.{key} must be 1-100"
                )));
            }
        }
        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.logging.level) {
            return Err(ConfigError::Validation(format!(
                "logging.level {:?} is not a valid filter: {e}",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// Apply environment overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup(STORAGE_ROOT_ENV).filter(|v| !v.is_empty()) {
            self.storage_root = PathBuf::from(root);
        }
    }
}

/// Rendition encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub primary_max_width: u32,
    pub primary_quality: u32,
    pub derivative_quality: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        let defaults = RenditionConfig::default();
        Self {
            primary_max_width: defaults.primary_max_width,
            primary_quality: defaults.primary_quality.value(),
            derivative_quality: defaults.derivative_quality.value(),
        }
    }
}

impl EncodingConfig {
    pub fn renditions(&self) -> RenditionConfig {
        RenditionConfig {
            primary_max_width: self.primary_max_width,
            primary_quality: Quality::new(self.primary_quality),
            derivative_quality: Quality::new(self.derivative_quality),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"assetstore=debug"`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(StoreConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto the stock defaults and deserialize.
///
/// Validation is left to the caller so environment overrides can apply first.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<StoreConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Load, apply the environment, and validate.
///
/// An explicit `path` must exist. Without one, [`CONFIG_FILE`] in the
/// working directory is used if present.
pub fn load_config(path: Option<&Path>) -> Result<StoreConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

pub fn load_config_with_env(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<StoreConfig, ConfigError> {
    let overlay = match path {
        Some(p) => Some(load_raw_config(p)?),
        None => {
            let default = Path::new(CONFIG_FILE);
            if default.exists() {
                Some(load_raw_config(default)?)
            } else {
                None
            }
        }
    };
    let mut config = resolve_config(overlay)?;
    config.apply_env(lookup);
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Asset Store Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Directory holding the folder tree. The STORAGE_ROOT environment variable
# takes precedence over this value.
storage_root = "storage"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[encoding]
# Primary renditions (webp/) are scaled down to at most this width.
# Smaller images are never upscaled.
primary_max_width = 2000

# WebP quality of the primary rendition (1 = worst, 100 = best).
primary_quality = 85

# WebP quality of size derivatives ({width}x{height}/).
derivative_quality = 80

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# Filter directive, e.g. "debug" or "assetstore=debug,warn".
# RUST_LOG overrides this when set.
level = "info"

# "text" for humans, "json" for log collectors.
format = "text"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_config_matches_rendition_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.storage_root, PathBuf::from("storage"));
        assert_eq!(config.encoding.renditions(), RenditionConfig::default());
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn default_config_passes_validation() {
        StoreConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.toml");
        fs::write(
            &path,
            r#"
storage_root = "/srv/assets"

[encoding]
derivative_quality = 70
"#,
        )
        .unwrap();

        let config = load_config_with_env(Some(&path), no_env).unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/srv/assets"));
        assert_eq!(config.encoding.derivative_quality, 70);
        // untouched keys keep stock values
        assert_eq!(config.encoding.primary_quality, 85);
        assert_eq!(config.encoding.primary_max_width, 2000);
    }

    #[test]
    fn env_overrides_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.toml");
        fs::write(&path, r#"storage_root = "/from/file""#).unwrap();

        let config = load_config_with_env(Some(&path), |key| {
            (key == STORAGE_ROOT_ENV).then(|| "/from/env".to_string())
        })
        .unwrap();
        assert_eq!(config.storage_root, PathBuf::from("/from/env"));
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let mut config = StoreConfig::default();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.storage_root, PathBuf::from("storage"));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config_with_env(Some(&tmp.path().join("nope.toml")), no_env);
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.toml");
        fs::write(&path, "this is not = [valid").unwrap();
        assert!(matches!(
            load_config_with_env(Some(&path), no_env),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn log_format_parses_lowercase() {
        let config = resolve_config(Some(
            toml::from_str("[logging]\nformat = \"json\"").unwrap(),
        ))
        .unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<StoreConfig, _> = toml::from_str("[encoding]\nqualty = 90\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<StoreConfig, _> = toml::from_str("[encodng]\nprimary_quality = 90\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_quality_bounds() {
        let mut config = StoreConfig::default();
        config.encoding.primary_quality = 100;
        config.encoding.derivative_quality = 1;
        assert!(config.validate().is_ok());

        config.encoding.derivative_quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        config.encoding.derivative_quality = 80;
        config.encoding.primary_quality = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_zero_width() {
        let mut config = StoreConfig::default();
        config.encoding.primary_max_width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_bad_log_filter() {
        let mut config = StoreConfig::default();
        config.logging.level = "assetstore=loud".into();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[encoding]
primary_quality = 85
derivative_quality = 80
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[encoding]\nprimary_quality = 90\n").unwrap();
        let merged = merge_toml(base, overlay);
        let encoding = merged.get("encoding").unwrap();
        assert_eq!(encoding.get("primary_quality").unwrap().as_integer(), Some(90));
        assert_eq!(encoding.get("derivative_quality").unwrap().as_integer(), Some(80));
    }

    #[test]
    fn merge_toml_scalar_replaces_table() {
        let base: toml::Value = toml::from_str("[a]\nb = 1\n").unwrap();
        let overlay: toml::Value = toml::from_str("a = 5").unwrap();
        assert_eq!(merge_toml(base, overlay).get("a").unwrap().as_integer(), Some(5));
    }

    // =========================================================================
    // Stock config tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(Some(value)).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value().unwrap();
        let table = value.as_table().unwrap();
        for key in ["storage_root", "encoding", "logging"] {
            assert!(table.contains_key(key), "missing {key}");
        }
    }
}
