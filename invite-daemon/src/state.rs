use std::path::PathBuf;
use std::sync::Arc;

use invite_bitable::TableService;
use invite_core::{Config, FieldNames, TableRef};

use crate::processor::SyncHandle;

/// Shared state of the HTTP handlers.
pub struct AppState {
    pub service: Arc<dyn TableService>,
    /// Table read by search and ranking.
    pub search_table: TableRef,
    pub fields: FieldNames,
    pub sync: SyncHandle,
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(service: Arc<dyn TableService>, config: &Config, sync: SyncHandle) -> Arc<Self> {
        Arc::new(Self {
            service,
            search_table: config.search_table.clone(),
            fields: config.fields.clone(),
            sync,
            static_dir: config.static_dir.clone(),
        })
    }
}
