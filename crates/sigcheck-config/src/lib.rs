//! `sigcheck.toml` loading, file selection and tracing setup.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sigcheck_core::{DetectOptions, GenericMethodPolicy, Severity};
use thiserror::Error;

mod diagnostics;
mod filter;
mod logging;

pub use diagnostics::{ConfigDiagnostics, ConfigWarning};
pub use filter::FileFilter;
pub use logging::{init_tracing, LoggingConfig};

/// Environment variable pointing at a config file (absolute or relative to the workspace root).
pub const SIGCHECK_CONFIG_ENV_VAR: &str = "SIGCHECK_CONFIG_PATH";

const CONFIG_FILE_NAMES: &[&str] = &["sigcheck.toml", ".sigcheck.toml"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SigcheckConfig {
    pub files: FilesConfig,
    pub detection: DetectionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Globs selecting files while walking directories.
    pub include: Vec<String>,
    /// Globs removing files from the selection.
    pub exclude: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.java".to_string()],
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub generic_methods: GenericMethodPolicy,
    /// Annotation names that never make two declarations differ (`Override`).
    pub ignored_decorations: Vec<String>,
    pub fail_on: FailOn,
}

impl DetectionConfig {
    pub fn detect_options(&self) -> DetectOptions {
        DetectOptions {
            generic_methods: self.generic_methods,
            ignored_decorations: self.ignored_decorations.clone(),
        }
    }
}

/// Lowest finding severity that makes a check fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailOn {
    #[default]
    Error,
    Warning,
}

impl FailOn {
    pub fn threshold(self) -> Severity {
        match self {
            FailOn::Error => Severity::Error,
            FailOn::Warning => Severity::Warning,
        }
    }

    pub fn fails(self, severity: Severity) -> bool {
        severity >= self.threshold()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
    #[error("invalid glob in {key} ({pattern:?}): {message}")]
    InvalidGlob {
        key: &'static str,
        pattern: String,
        message: String,
    },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // `Display` embeds a source snippet; keep just the message.
        ConfigError::Toml(err.message().to_string())
    }
}

impl SigcheckConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::load_from_path_with_diagnostics(path)?.0)
    }

    /// Load a config file and report unknown keys and suspicious values.
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let (config, diagnostics) = Self::load_from_str_with_diagnostics(&text)?;
        for key in &diagnostics.unknown_keys {
            tracing::warn!(
                target: "sigcheck.config",
                path = %path.display(),
                key = %key,
                "unknown config key"
            );
        }
        Ok((config, diagnostics))
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<SigcheckConfig>(text)?;
        // Fail early on bad globs rather than at walk time.
        config.file_filter()?;

        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        if !config.logging.level_is_valid() {
            diagnostics.warnings.push(ConfigWarning::LoggingLevelInvalid {
                value: config.logging.level.clone(),
            });
        }
        for name in &config.detection.ignored_decorations {
            if name.contains('(') {
                diagnostics
                    .warnings
                    .push(ConfigWarning::IgnoredDecorationHasArguments {
                        value: name.clone(),
                    });
            }
        }
        Ok((config, diagnostics))
    }

    pub fn file_filter(&self) -> Result<FileFilter, ConfigError> {
        FileFilter::new(&self.files)
    }
}

/// Find the config file for a workspace root.
///
/// Search order:
/// 1) `SIGCHECK_CONFIG_PATH` (absolute or relative to `workspace_root`)
/// 2) `sigcheck.toml` in `workspace_root`
/// 3) `.sigcheck.toml` in `workspace_root`
pub fn discover_config_path(workspace_root: &Path) -> Option<PathBuf> {
    if let Some(value) = std::env::var_os(SIGCHECK_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            workspace_root.join(candidate)
        };
        return Some(path.canonicalize().unwrap_or(path));
    }

    CONFIG_FILE_NAMES
        .iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
        .map(|path| path.canonicalize().unwrap_or(path))
}

/// Load the config for a workspace root; defaults and `None` when there is none.
pub fn load_for_workspace(
    workspace_root: &Path,
) -> Result<(SigcheckConfig, Option<PathBuf>), ConfigError> {
    let (config, path, _) = load_for_workspace_with_diagnostics(workspace_root)?;
    Ok((config, path))
}

pub fn load_for_workspace_with_diagnostics(
    workspace_root: &Path,
) -> Result<(SigcheckConfig, Option<PathBuf>, ConfigDiagnostics), ConfigError> {
    let Some(path) = discover_config_path(workspace_root) else {
        return Ok((
            SigcheckConfig::default(),
            None,
            ConfigDiagnostics::default(),
        ));
    };
    let (config, diagnostics) = SigcheckConfig::load_from_path_with_diagnostics(&path)?;
    tracing::debug!(target: "sigcheck.config", path = %path.display(), "loaded config");
    Ok((config, Some(path), diagnostics))
}
