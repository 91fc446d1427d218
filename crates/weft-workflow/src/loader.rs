use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use tracing::debug;

use weft_core::dsl::WorkflowDsl;
use weft_core::error::{Result, WeftError};
use weft_core::traits::DslLoader;

/// Loads `<dir>/<flow id>.json`.
pub struct FileDslLoader {
    dir: PathBuf,
}

impl FileDslLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, flow_id: &str) -> Option<PathBuf> {
        let valid = !flow_id.is_empty()
            && flow_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !flow_id.starts_with('.');
        valid.then(|| self.dir.join(format!("{flow_id}.json")))
    }
}

impl DslLoader for FileDslLoader {
    fn load(&self, flow_id: &str) -> BoxFuture<'_, Result<WorkflowDsl>> {
        let flow_id = flow_id.to_string();
        Box::pin(async move {
            let path = self
                .path_for(&flow_id)
                .ok_or_else(|| WeftError::WorkflowNotFound(flow_id.clone()))?;
            debug!(flow_id = %flow_id, path = %path.display(), "Loading workflow");

            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(WeftError::WorkflowNotFound(flow_id));
                }
                Err(e) => return Err(e.into()),
            };
            WorkflowDsl::from_json(&text)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("podcast.json"),
            r#"{"nodes": [{"id": "node-start::001"}], "edges": []}"#,
        )
        .unwrap();

        let loader = FileDslLoader::new(dir.path());
        let dsl = loader.load("podcast").await.unwrap();
        assert_eq!(dsl.nodes[0].id, "node-start::001");
    }

    #[tokio::test]
    async fn test_missing_flow() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileDslLoader::new(dir.path());
        let err = loader.load("nope").await.unwrap_err();
        assert!(matches!(err, WeftError::WorkflowNotFound(ref id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileDslLoader::new(dir.path());
        assert!(matches!(
            loader.load("../secret").await,
            Err(WeftError::WorkflowNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_flow() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let loader = FileDslLoader::new(dir.path());
        assert!(matches!(loader.load("bad").await, Err(WeftError::Dsl(_))));
    }
}
