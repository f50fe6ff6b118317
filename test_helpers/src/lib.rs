//! Test helpers for the xct-config workspace
//!
//! Locates the workspace root so integration tests can read the shared
//! configuration fixtures and write generated artifacts to a common place.

use once_cell::sync::Lazy;
use std::env;
use std::path::{Path, PathBuf};

/// Error type for test helper operations
#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Failed to find project root: {0}")]
    ProjectRootNotFound(String),

    #[error("Failed to read fixture {path}: {source}")]
    FixtureRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Returns the path to the workspace root directory.
///
/// Walks up from the current directory until it finds a Cargo.toml that
/// declares `[workspace]`.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let mut current_dir = env::current_dir().map_err(|e| {
        TestHelperError::ProjectRootNotFound(format!("Failed to get current directory: {e}"))
    })?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml).map_err(|e| {
                TestHelperError::ProjectRootNotFound(format!("Failed to read Cargo.toml: {e}"))
            })?;

            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Err(TestHelperError::ProjectRootNotFound(
        "Workspace root not found".to_string(),
    ))
}

/// Lazily initialized project root path
static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("Failed to find project root directory"));

/// Directory holding the sample configuration files
pub fn fixtures_dir() -> PathBuf {
    PROJECT_ROOT.join("fixtures")
}

/// Path of a fixture file by name
pub fn fixture_path<P: AsRef<Path>>(name: P) -> PathBuf {
    fixtures_dir().join(name)
}

/// Read a fixture file into a string
pub fn read_fixture<P: AsRef<Path>>(name: P) -> Result<String, TestHelperError> {
    let path = fixture_path(name);
    std::fs::read_to_string(&path).map_err(|source| TestHelperError::FixtureRead { path, source })
}

/// Returns the directory for generated test artifacts, creating it if needed.
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }

    output_dir
}

/// Returns a path within the output directory.
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    get_output_dir().join(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_root_exists() {
        let root = find_project_root().expect("Failed to find project root");
        assert!(root.exists());
        assert!(root.join("Cargo.toml").exists());
    }

    #[test]
    fn test_fixtures_dir_exists() {
        assert!(fixtures_dir().is_dir());
    }

    #[test]
    fn test_missing_fixture() {
        let err = read_fixture("does-not-exist.txt").unwrap_err();
        assert!(matches!(err, TestHelperError::FixtureRead { .. }));
    }

    #[test]
    fn test_output_path() {
        let path = output_path("script.py");
        assert_eq!(path, get_output_dir().join("script.py"));
    }
}
