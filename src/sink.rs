use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ReportError;
use crate::models::Artifact;

/// Final destination of a downloaded report.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, artifact: Artifact) -> Result<PathBuf, ReportError>;
}

pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn save(&self, artifact: Artifact) -> Result<PathBuf, ReportError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(sanitize_filename(&artifact.filename));
        tokio::fs::write(&path, &artifact.bytes).await?;
        Ok(path)
    }
}

/// Keeps server-supplied names inside the target directory.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "reporte".to_string()
    } else {
        cleaned.to_string()
    }
}
