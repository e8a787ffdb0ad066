//! Layered configuration loading.
//!
//! Layers apply in order, later ones winning:
//!
//! 1. Defaults (or a preset)
//! 2. A TOML or JSON file
//! 3. `.env` file entries
//! 4. Process environment variables

use std::env;
use std::fs;
use std::path::Path;

use crate::config::{FormatterPreset, LoggerPreset};
use crate::{AccordConfig, LoadError};

/// Configuration loader with layered approach.
///
/// # Example
///
/// ```no_run
/// use accord_config::ConfigLoader;
///
/// # fn main() -> Result<(), accord_config::LoadError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("accord.toml")?
///     .with_env_prefix("ACCORD")
///     .load()?;
///
/// let formatter = config.error_formatter();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: AccordConfig,
    env_prefix: Option<String>,
    env_file: Vec<(String, String)>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AccordConfig::default(),
            env_prefix: None,
            env_file: Vec::new(),
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = AccordConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use accord_config::{ConfigLoader, LoggerPreset};
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.preset, LoggerPreset::Pretty);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = AccordConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = AccordConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format follows the extension: `.toml` or `.json`. The file
    /// replaces the current configuration; sections it omits take their
    /// defaults.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(LoadError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| LoadError::read_error(path, e))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| LoadError::UnsupportedFormat(path.display().to_string()))?;

        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, LoadError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format (`toml` or
    /// `json`).
    ///
    /// # Example
    ///
    /// ```
    /// use accord_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[service]\nname = \"users\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.service.name, "users");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, LoadError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `ACCORD__LOGGING__PRESET=structured`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load `.env` from the current directory or its parents into the process
    /// environment. A missing file is not an error.
    pub fn with_dotenv(self) -> Result<Self, LoadError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Read overrides from a specific `.env` file without touching the
    /// process environment.
    ///
    /// Entries are applied at [`load`](Self::load), before process variables,
    /// and only when an env prefix is set.
    pub fn with_env_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, LoadError> {
        for entry in dotenvy::from_path_iter(path.as_ref())? {
            self.env_file.push(entry?);
        }
        Ok(self)
    }

    /// Finalize: apply env overrides and validate.
    pub fn load(mut self) -> Result<AccordConfig, LoadError> {
        if let Some(prefix) = self.env_prefix.take() {
            let file_vars = std::mem::take(&mut self.env_file);
            for (key, value) in file_vars.into_iter().chain(env::vars()) {
                if key.starts_with(&prefix) {
                    self.apply_env_var(&key, &value, &prefix)?;
                }
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without validation.
    #[must_use]
    pub fn load_unvalidated(self) -> AccordConfig {
        self.config
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), LoadError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        match parts.as_slice() {
            ["SERVICE", "NAME"] => {
                self.config.service.name = value.to_string();
            }
            ["SERVICE", "VERSION"] => {
                self.config.service.version = value.to_string();
            }
            ["LOGGING", "PRESET"] => {
                self.config.logging.preset = LoggerPreset::parse(value).ok_or_else(|| {
                    LoadError::env_parse_error(
                        key,
                        "expected 'default', 'pretty', 'structured', or 'silent'",
                    )
                })?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["LOGGING", "WITH_TARGET"] => {
                self.config.logging.with_target = Some(
                    parse_bool(value)
                        .ok_or_else(|| LoadError::env_parse_error(key, "expected boolean"))?,
                );
            }
            ["LOGGING", "WITH_FILE_LINE"] => {
                self.config.logging.with_file_line = Some(
                    parse_bool(value)
                        .ok_or_else(|| LoadError::env_parse_error(key, "expected boolean"))?,
                );
            }
            ["ERRORS", "FORMATTER"] => {
                self.config.errors.formatter = FormatterPreset::parse(value).ok_or_else(|| {
                    LoadError::env_parse_error(
                        key,
                        "expected 'default', 'pretty', 'structured', or 'silent'",
                    )
                })?;
            }
            _ => {}
        }

        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<AccordConfig, LoadError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
