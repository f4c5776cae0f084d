use std::sync::Arc;

use crate::engine::ids::{IdGenerator, RandomIdGenerator};
use crate::observability::metrics::Metrics;
use crate::store::{MemoryStore, RecordStore};

pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub ids: Arc<dyn IdGenerator>,
    pub metrics: Metrics,
    /// Prefix every route is mounted under, without a trailing slash.
    pub base_path: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        ids: Arc<dyn IdGenerator>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            store,
            ids,
            metrics: Metrics::new(),
            base_path: base_path.into(),
        }
    }

    pub fn in_memory(driver_id_segment: u8, base_path: impl Into<String>) -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RandomIdGenerator::new(driver_id_segment)),
            base_path,
        )
    }

    pub fn path(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.base_path)
    }
}
