//! Pattern resolution
//!
//! Expands user patterns into concrete paths to watch. Re-run on every
//! create event so new files and directories matching a pattern get
//! picked up without a restart.

use std::collections::HashSet;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Expands glob patterns into the set of paths to watch
#[derive(Debug, Clone)]
pub struct PathResolver {
    patterns: Vec<String>,
    recursive: bool,
}

impl PathResolver {
    pub fn new(patterns: Vec<String>, recursive: bool) -> Self {
        Self {
            patterns,
            recursive,
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Resolve every pattern against the file system
    ///
    /// Matches keep pattern order and appear once. With `recursive`,
    /// each matched directory is followed by all of its descendant
    /// directories. Patterns matching nothing contribute nothing.
    pub fn resolve(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();

        for pattern in &self.patterns {
            for matched in expand(pattern) {
                let walk = if self.recursive && matched.is_dir() {
                    sub_dirs(&matched)
                } else {
                    vec![matched]
                };

                for path in walk {
                    if seen.insert(path.clone()) {
                        paths.push(path);
                    }
                }
            }
        }

        paths
    }
}

/// Glob-expand a single pattern
///
/// Invalid patterns are logged and produce no matches.
pub fn expand(pattern: &str) -> Vec<PathBuf> {
    let pattern = trim_separators(pattern);

    let entries = match glob::glob(pattern) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Invalid pattern '{}': {}", pattern, e);
            return Vec::new();
        }
    };

    let mut matches = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => matches.push(path),
            Err(e) => debug!("Skipping unreadable match for '{}': {}", pattern, e),
        }
    }

    if matches.is_empty() {
        debug!("Pattern '{}' matched nothing", pattern);
    }
    matches
}

/// Given a directory, all directories in its tree are returned, itself first
pub fn sub_dirs(root: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => debug!("Walk error under {}: {}", root.display(), e),
        }
    }

    dirs
}

/// `src/` and `src` name the same directory; the glob crate only
/// understands the latter. A bare separator stays the root.
fn trim_separators(pattern: &str) -> &str {
    let trimmed = pattern.trim_end_matches(['/', MAIN_SEPARATOR]);
    if trimmed.is_empty() {
        if pattern.is_empty() {
            "."
        } else {
            &pattern[..1]
        }
    } else {
        trimmed
    }
}
