//! # invite-sync
//!
//! Invitation count aggregation, count reconciliation and the read-only
//! lookup/ranking queries.
//!
//! Call [`SyncPipeline::run`] to execute one sync run: count invitation codes
//! in the source table, then rewrite changed counts in the target table.

pub mod aggregate;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod reconcile;
pub mod throttle;

pub use aggregate::count_invitations;
pub use error::SyncError;
pub use pipeline::{RunStatus, SyncPipeline, SyncReport, SyncTables, SyncTrigger};
pub use query::{build_ranking, find_invite_code, match_phone, ranking};
pub use reconcile::{apply, plan, reconcile, CountChange, ReconcilePlan};
pub use throttle::WriteThrottle;
