//! File presence and content queries rooted at a working directory.

use std::path::{Path, PathBuf};

use crate::domain::{CoreError, Result};

/// Go module manifest.
pub const GO_MOD: &str = "go.mod";

/// golangci-lint configuration, in lookup order.
pub const GOLANGCI_CONFIGS: &[&str] = &[".golangci.yml", ".golangci.yaml"];

/// GoReleaser configuration, in lookup order.
pub const GORELEASER_CONFIGS: &[&str] = &[".goreleaser.yaml", ".goreleaser.yml"];

/// release-please configuration (no dot prefix).
pub const RELEASE_PLEASE_CONFIG: &str = "release-please-config.json";

/// release-please manifest (dot prefix).
pub const RELEASE_PLEASE_MANIFEST: &str = ".release-please-manifest.json";

/// Action definitions that mark the provider repository itself.
pub const PROVIDER_MARKERS: &[&str] = &[
    "ci/action.yaml",
    "release/action.yaml",
    "self-validate/action.yaml",
];

/// Read-only view over a project directory.
#[derive(Debug, Clone)]
pub struct FileInspector {
    root: PathBuf,
}

impl FileInspector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute (root-joined) path of a relative path.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    /// Read a file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// - `CoreError::NotFound`: the file does not exist.
    /// - `CoreError::Read`: the file exists but could not be read.
    pub fn read_text(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CoreError::NotFound(PathBuf::from(relative))
            } else {
                CoreError::Read { path, source }
            }
        })
    }

    /// First candidate that exists, in the order given.
    pub fn first_existing<'a>(&self, candidates: &[&'a str]) -> Option<&'a str> {
        candidates.iter().copied().find(|c| self.exists(c))
    }

    /// Whether this directory is the go-actions provider repository.
    pub fn is_provider_repo(&self) -> bool {
        PROVIDER_MARKERS.iter().all(|m| self.exists(m))
    }
}
