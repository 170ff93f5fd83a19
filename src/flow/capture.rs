//! Named screenshots written during a run
//!
//! File names are `<ordinal>_<name>.png`. The ordinal is the capture's
//! position in the run, so names never collide even when a step sequence
//! reuses a semantic name.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::browser::RemoteControl;
use crate::core::{Result, UiProofError};

/// One written snapshot. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactRecord {
    pub name: String,
    pub path: PathBuf,
    pub step_index: usize,
    pub timestamp: DateTime<Utc>,
}

/// Writes snapshots into one output directory
#[derive(Debug, Clone)]
pub struct ArtifactCapture {
    output_dir: PathBuf,
}

impl ArtifactCapture {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Deterministic file name for the `ordinal`-th capture (1-based)
    pub fn file_name(ordinal: usize, name: &str) -> String {
        format!("{:02}_{}.png", ordinal, sanitize(name))
    }

    /// Take a screenshot named `name` as the run's `ordinal`-th capture
    pub async fn capture(
        &self,
        remote: &dyn RemoteControl,
        name: &str,
        ordinal: usize,
        step_index: usize,
    ) -> Result<ArtifactRecord> {
        let failed = |reason: String| UiProofError::CaptureFailed {
            name: name.to_string(),
            reason,
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| failed(format!("cannot create {}: {}", self.output_dir.display(), e)))?;

        let path = self.output_dir.join(Self::file_name(ordinal, name));
        remote
            .screenshot(&path)
            .await
            .map_err(|e| failed(e.to_string()))?;

        info!(name, path = %path.display(), "captured");
        Ok(ArtifactRecord {
            name: name.to_string(),
            path,
            step_index,
            timestamp: Utc::now(),
        })
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "capture".to_string()
    } else {
        cleaned
    }
}
