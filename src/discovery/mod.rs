//! Resolves the ordered list of query files to benchmark.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::DiscoveryError;

/// Extension of query files picked up from a directory pattern.
const QUERIES_EXTENSION: &str = "queries";

/// One query file and the name its artifacts are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    path: PathBuf,
    name: String,
}

impl TestCase {
    /// Builds a test case from a query-file path; the name is its base name.
    ///
    /// # Errors
    ///
    /// Returns an error when the path has no final component.
    pub fn from_path(path: PathBuf) -> Result<Self, DiscoveryError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| DiscoveryError::UnnamedTest { path: path.clone() })?;
        Ok(Self { path, name })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding this test's artifacts, relative to the work root.
    #[must_use]
    pub fn results_dir_name(&self) -> String {
        format!("{}_results", self.name)
    }
}

/// Where to look for tests, in priority order.
#[derive(Debug, Clone, Copy)]
pub struct TestSelection<'sel> {
    pub explicit: &'sel [String],
    pub pattern: Option<&'sel str>,
    pub default_glob: &'sel str,
}

/// Resolves the test list.
///
/// Explicit names win and are kept verbatim. Otherwise a pattern naming an
/// existing directory lists its `*.queries` files in name order, any other
/// pattern is expanded as a glob, and with no pattern the default glob is
/// used.
///
/// # Errors
///
/// Returns [`DiscoveryError::NoTestsFound`] when nothing resolves, or an
/// error for an invalid glob or unreadable directory.
pub fn resolve(selection: TestSelection<'_>) -> Result<Vec<TestCase>, DiscoveryError> {
    let (paths, searched) = if !selection.explicit.is_empty() {
        let paths = selection.explicit.iter().map(PathBuf::from).collect();
        (paths, "explicit arguments".to_owned())
    } else if let Some(pattern) = selection.pattern.filter(|value| !value.is_empty()) {
        let dir = Path::new(pattern);
        if dir.is_dir() {
            (list_queries_dir(dir)?, pattern.to_owned())
        } else {
            (expand_glob(pattern)?, pattern.to_owned())
        }
    } else {
        (
            expand_glob(selection.default_glob)?,
            selection.default_glob.to_owned(),
        )
    };

    if paths.is_empty() {
        return Err(DiscoveryError::NoTestsFound { searched });
    }

    let cases = paths
        .into_iter()
        .map(TestCase::from_path)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!("Resolved {} test(s) from {}", cases.len(), searched);
    Ok(cases)
}

fn list_queries_dir(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let entries = std::fs::read_dir(dir).map_err(|source| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == QUERIES_EXTENSION)
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let entries = glob::glob(pattern).map_err(|source| DiscoveryError::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(err) => tracing::warn!("Skipping unreadable glob match: {}", err),
        }
    }
    Ok(paths)
}
