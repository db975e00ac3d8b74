//! In-process sink. Backs the `memory` config kind and the test suite.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{Record, RecordSink, SinkError};

#[derive(Debug, Default)]
pub struct MemorySink {
    collections: DashMap<String, Vec<Record>>,
    next_id: AtomicU64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything inserted into one collection, in insert order.
    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.collections.get(collection).map(|r| r.value().clone()).unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map(|r| r.value().len()).unwrap_or(0)
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn insert(&self, collection: &str, record: Record) -> Result<String, SinkError> {
        self.collections.entry(collection.to_string()).or_default().push(record);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(format!("{id:016x}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inserts_are_grouped_by_collection() {
        let sink = MemorySink::new();
        let a = sink.insert("a", Record::new().set("n", 1u8)).await.expect("insert");
        let b = sink.insert("b", Record::new().set("n", 2u8)).await.expect("insert");
        assert_ne!(a, b);
        assert_eq!(sink.count("a"), 1);
        assert_eq!(sink.count("b"), 1);
        assert_eq!(sink.count("c"), 0);
        assert_eq!(sink.records("a")[0].get("n"), Some(&super::super::Value::UInt(1)));
    }
}
