//! Invite core library: domain types, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: records, invitation count maps, sync outcomes, ranking rows
//! - [`config`]: environment-driven service configuration
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, DEFAULT_PORT, DEFAULT_WRITE_INTERVAL, DEFAULT_WRITE_TIMEOUT};
pub use error::ConfigError;
pub use types::{
    parse_count, FieldNames, InvitationCountMap, RankingEntry, Record, RecordId, SyncOutcome,
    TableRef,
};
