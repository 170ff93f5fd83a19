//! Shared types used across uiproof modules

use std::path::{Path, PathBuf};
use url::Url;

use crate::core::error::{Result, UiProofError};

/// Where the front-end under test is hosted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A packaged build loaded straight from disk
    File(PathBuf),
    /// A served build
    Http(Url),
}

impl Origin {
    /// Parse an origin from a CLI or config string.
    ///
    /// `http(s)://` becomes [`Origin::Http`]; `file://` URLs and bare paths
    /// become [`Origin::File`] with an absolute path.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(UiProofError::config("origin is empty"));
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw)
                .map_err(|e| UiProofError::config(format!("invalid origin URL '{}': {}", raw, e)))?;
            return Ok(Self::Http(url));
        }

        if raw.starts_with("file://") {
            let url = Url::parse(raw)
                .map_err(|e| UiProofError::config(format!("invalid file URL '{}': {}", raw, e)))?;
            let path = url
                .to_file_path()
                .map_err(|_| UiProofError::config(format!("not a local file URL: {}", raw)))?;
            return Ok(Self::File(path));
        }

        Ok(Self::File(absolute(Path::new(raw))?))
    }

    /// URL of the origin itself
    pub fn entry_url(&self) -> Result<String> {
        match self {
            Self::Http(url) => Ok(url.to_string()),
            Self::File(path) => file_url(path),
        }
    }

    /// Resolve a step location against this origin.
    ///
    /// Empty means the origin itself. Absolute `http`, `https` and `file`
    /// URLs pass through. Anything else is joined onto the origin URL for a
    /// served build, or treated as a path relative to the working directory
    /// for a packaged one.
    pub fn resolve(&self, location: &str) -> Result<String> {
        let location = location.trim();
        if location.is_empty() {
            return self.entry_url();
        }

        if let Ok(url) = Url::parse(location) {
            if matches!(url.scheme(), "http" | "https" | "file") {
                return Ok(url.to_string());
            }
        }

        match self {
            Self::Http(base) => base
                .join(location)
                .map(|u| u.to_string())
                .map_err(|e| UiProofError::config(format!("cannot join '{}': {}", location, e))),
            Self::File(_) => file_url(&absolute(Path::new(location))?),
        }
    }

    /// Whether this origin is served over HTTP
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::Http(url) => write!(f, "{}", url),
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn file_url(path: &Path) -> Result<String> {
    Url::from_file_path(path)
        .map(|u| u.to_string())
        .map_err(|_| UiProofError::config(format!("cannot build file URL for {}", path.display())))
}
