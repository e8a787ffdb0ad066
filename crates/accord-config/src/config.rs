//! Configuration types.
//!
//! [`AccordConfig`] is the root. Every section has defaults, and unknown
//! fields are rejected.

use accord_core::format::ErrorFormatter;
use accord_telemetry::logging::{create_env_filter, LogConfig};
use accord_telemetry::Logger;
use serde::{Deserialize, Serialize};

use crate::LoadError;

/// Complete Accord service configuration.
///
/// # Example
///
/// ```
/// use accord_config::AccordConfig;
///
/// let config = AccordConfig::default();
/// assert_eq!(config.service.name, "accord-service");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AccordConfig {
    /// Service identity.
    #[serde(default)]
    pub service: ServiceSection,

    /// Logger preset and overrides.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Error rendering.
    #[serde(default)]
    pub errors: ErrorsSection,
}

/// Service identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceSection {
    /// Service name.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Service version.
    #[serde(default = "default_service_version")]
    pub version: String,
}

fn default_service_name() -> String {
    "accord-service".to_string()
}

fn default_service_version() -> String {
    "0.0.0".to_string()
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
        }
    }
}

/// Logger preset names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoggerPreset {
    /// Use the ambient subscriber.
    #[default]
    Default,
    /// Human-readable output.
    Pretty,
    /// JSON output.
    Structured,
    /// No output.
    Silent,
}

impl LoggerPreset {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "default" => Some(Self::Default),
            "pretty" => Some(Self::Pretty),
            "structured" => Some(Self::Structured),
            "silent" => Some(Self::Silent),
            _ => None,
        }
    }
}

/// Logging section.
///
/// `level`, `with_target` and `with_file_line` override the preset. They
/// only apply to the `pretty` and `structured` presets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Logger preset.
    #[serde(default)]
    pub preset: LoggerPreset,

    /// Level filter override (e.g. "debug" or "accord_server=debug,info").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Whether to include the event target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_target: Option<bool>,

    /// Whether to include file and line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_file_line: Option<bool>,
}

impl LoggingSection {
    fn has_overrides(&self) -> bool {
        self.level.is_some() || self.with_target.is_some() || self.with_file_line.is_some()
    }

    fn apply(&self, mut config: LogConfig) -> LogConfig {
        if let Some(level) = &self.level {
            config.level.clone_from(level);
        }
        if let Some(with_target) = self.with_target {
            config.with_target = with_target;
        }
        if let Some(with_file_line) = self.with_file_line {
            config.with_file_line = with_file_line;
        }
        config
    }
}

/// Error formatter preset names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatterPreset {
    /// Compact JSON envelope.
    #[default]
    Default,
    /// One line of text.
    Pretty,
    /// Detailed JSON envelope.
    Structured,
    /// Status only.
    Silent,
}

impl FormatterPreset {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "default" => Some(Self::Default),
            "pretty" => Some(Self::Pretty),
            "structured" => Some(Self::Structured),
            "silent" => Some(Self::Silent),
            _ => None,
        }
    }
}

/// Errors section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ErrorsSection {
    /// Error formatter preset.
    #[serde(default)]
    pub formatter: FormatterPreset,
}

impl AccordConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidValue` if the service name is empty or the
    /// level override does not parse.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.service.name.trim().is_empty() {
            return Err(LoadError::invalid_value("service.name", "must not be empty"));
        }

        if let Some(level) = &self.logging.level {
            create_env_filter(level)
                .map_err(|e| LoadError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty logs and detailed error bodies.
    ///
    /// # Example
    ///
    /// ```
    /// use accord_config::{AccordConfig, FormatterPreset, LoggerPreset};
    ///
    /// let config = AccordConfig::development();
    /// assert_eq!(config.logging.preset, LoggerPreset::Pretty);
    /// assert_eq!(config.errors.formatter, FormatterPreset::Structured);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.preset = LoggerPreset::Pretty;
        config.errors.formatter = FormatterPreset::Structured;
        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON logs and compact error bodies.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.preset = LoggerPreset::Structured;
        config.errors.formatter = FormatterPreset::Default;
        config
    }

    /// Builds the runtime logger.
    ///
    /// Without overrides the preset maps directly onto a [`Logger`] preset.
    /// With overrides a custom dispatcher is built from the preset's
    /// [`LogConfig`].
    pub fn logger(&self) -> Result<Logger, LoadError> {
        let base = match self.logging.preset {
            LoggerPreset::Default => return Ok(Logger::Default),
            LoggerPreset::Silent => return Ok(Logger::Silent),
            LoggerPreset::Pretty if !self.logging.has_overrides() => return Ok(Logger::Pretty),
            LoggerPreset::Structured if !self.logging.has_overrides() => {
                return Ok(Logger::Structured)
            }
            LoggerPreset::Pretty => LogConfig::development(),
            LoggerPreset::Structured => LogConfig::production(),
        };

        Logger::from_config(&self.logging.apply(base))
            .map_err(|e| LoadError::invalid_value("logging", e.to_string()))
    }

    /// Builds the runtime error formatter.
    #[must_use]
    pub fn error_formatter(&self) -> ErrorFormatter {
        match self.errors.formatter {
            FormatterPreset::Default => ErrorFormatter::Default,
            FormatterPreset::Pretty => ErrorFormatter::Pretty,
            FormatterPreset::Structured => ErrorFormatter::Structured,
            FormatterPreset::Silent => ErrorFormatter::Silent,
        }
    }
}
