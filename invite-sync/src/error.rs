//! Error types for invite-sync.

use thiserror::Error;

use invite_bitable::BitableError;
use invite_core::TableRef;

/// All errors that can arise from sync and query operations.
///
/// Per-record write failures are not errors: they are counted in the
/// [`invite_core::SyncOutcome`] and the run continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Listing the records of a table failed.
    #[error("{stage} read of table {table} failed: {source}")]
    Read {
        stage: &'static str,
        table: TableRef,
        #[source]
        source: BitableError,
    },
}

/// Convenience constructor for [`SyncError::Read`].
pub(crate) fn read_err(stage: &'static str, table: &TableRef, source: BitableError) -> SyncError {
    SyncError::Read {
        stage,
        table: table.clone(),
        source,
    }
}
