//! Invite daemon runtime: HTTP API + single-flight sync processor + daily
//! scheduler, all stopped by one shutdown broadcast.

mod error;
pub mod processor;
pub mod routes;
mod runtime;
pub mod schedule;
pub mod state;

pub use error::{ApiError, DaemonError};
pub use processor::SyncHandle;
pub use routes::build_router;
pub use runtime::{init_tracing, run, start_blocking};
pub use state::AppState;
