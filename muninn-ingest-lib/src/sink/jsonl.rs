//! File-backed sink: one JSON object per line, one file per collection.
//! Stands in for a real document store in single-node deployments.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::{Record, RecordSink, SinkError};

pub struct JsonlSink {
    dir: PathBuf,
    next_id: AtomicU64,
}

impl JsonlSink {
    /// Creates the target directory if needed. Failure here is a startup
    /// error and fatal to the process.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir, next_id: AtomicU64::new(0) })
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn insert(&self, collection: &str, record: Record) -> Result<String, SinkError> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let path = self.dir.join(format!("{collection}.jsonl"));
        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(line.as_bytes()).await?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(format!("{id:016x}"))
    }
}
