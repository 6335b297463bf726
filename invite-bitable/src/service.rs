//! The table operations the rest of the workspace depends on.

use async_trait::async_trait;
use serde_json::{Map, Value};

use invite_core::{Record, RecordId, TableRef};

use crate::error::BitableError;

/// Read and write access to remote tables.
///
/// [`crate::BitableClient`] is the production implementation.
#[async_trait]
pub trait TableService: Send + Sync {
    /// Fetch every record of `table` (first page only; no pagination).
    async fn list_records(&self, table: &TableRef) -> Result<Vec<Record>, BitableError>;

    /// Overwrite the given `fields` of one record.
    async fn update_record(
        &self,
        table: &TableRef,
        record_id: &RecordId,
        fields: Map<String, Value>,
    ) -> Result<(), BitableError>;
}
