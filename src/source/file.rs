//! Local file result source
//!
//! Reads the result document straight from the path the simulation writes.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{DataSource, FetchError};
use crate::series::{decode_payload, Series};

/// Reads the result document from disk on every fetch
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for FileSource {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    async fn fetch(&self) -> Result<Series, FetchError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|error| FetchError::Io {
                path: self.path.clone(),
                error,
            })?;

        Ok(decode_payload(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FailureKind;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_result_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("result.json");
        std::fs::write(
            &path,
            r#"{"res":[{"year":0,"num_herbs":10,"num_carns":0}]}"#,
        )
        .unwrap();

        let source = FileSource::new(&path);
        let series = source.fetch().await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.samples()[0].num_herbs, 10);
    }

    #[tokio::test]
    async fn test_missing_file_is_transport_failure() {
        let dir = tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent.json"));

        let err = source.fetch().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[tokio::test]
    async fn test_partially_written_file_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("result.json");
        std::fs::write(&path, r#"{"res":[{"year":0,"num_he"#).unwrap();

        let err = FileSource::new(&path).fetch().await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Malformed);
    }
}
