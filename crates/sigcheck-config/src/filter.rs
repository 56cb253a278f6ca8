use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::{ConfigError, FilesConfig};

/// Include/exclude glob matching for files found while walking a directory.
///
/// Paths are matched relative to the walked root. A file is selected when it matches at least
/// one include pattern and no exclude pattern.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl FileFilter {
    pub fn new(config: &FilesConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            include: build_set("files.include", &config.include)?,
            exclude: build_set("files.exclude", &config.exclude)?,
        })
    }

    pub fn matches(&self, relative: &Path) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        // Built from constant patterns.
        Self::new(&FilesConfig::default()).unwrap_or_else(|_| Self {
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
        })
    }
}

fn build_set(key: &'static str, patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| ConfigError::InvalidGlob {
            key,
            pattern: pattern.clone(),
            message: err.kind().to_string(),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| ConfigError::InvalidGlob {
        key,
        pattern: patterns.join(", "),
        message: err.to_string(),
    })
}
