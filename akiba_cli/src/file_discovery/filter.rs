//! File name filtering using glob patterns

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

use super::{DiscoveryError, Result};

/// Files never treated as episodes: metadata sidecars and marker files
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &["*.nfo", "*.jpg", "*.png", ".plexmatch", ".ignore"];

/// Matches file names that discovery skips
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    globset: GlobSet,
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        let patterns: Vec<String> = DEFAULT_IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect();
        // The built-in patterns are valid globs
        Self::new(&patterns).unwrap_or(Self {
            globset: GlobSet::empty(),
        })
    }
}

impl IgnoreFilter {
    /// Create a filter from glob patterns matched against the file name
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(true)
                .build()
                .map_err(|e| DiscoveryError::InvalidPattern(format!("{pattern}: {e}")))?;
            builder.add(glob);
        }

        let globset = builder
            .build()
            .map_err(|e| DiscoveryError::InvalidPattern(e.to_string()))?;

        Ok(Self { globset })
    }

    /// Whether the file name of `path` matches an ignore pattern
    pub fn is_ignored(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.globset.is_match(Path::new(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns() {
        let filter = IgnoreFilter::default();

        assert!(filter.is_ignored(Path::new("/show/tvshow.nfo")));
        assert!(filter.is_ignored(Path::new("/show/poster.JPG")));
        assert!(filter.is_ignored(Path::new("/show/fanart.png")));
        assert!(filter.is_ignored(Path::new("/show/.plexmatch")));
        assert!(filter.is_ignored(Path::new("/show/.ignore")));

        assert!(!filter.is_ignored(Path::new("/show/Show - 01 - Title.mkv")));
        assert!(!filter.is_ignored(Path::new("/show/notes.ignore.txt")));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = IgnoreFilter::new(&["[".to_string()]);
        assert!(matches!(result, Err(DiscoveryError::InvalidPattern(_))));
    }
}
