//! # invite-bitable
//!
//! Async client for the Feishu bitable open API: tenant token exchange,
//! listing the records of a table and updating a single record.
//!
//! The sync pipeline and the daemon only see the [`TableService`] trait, so
//! they can be driven by an in-memory table in tests.

pub mod auth;
pub mod client;
pub mod error;
pub mod service;

pub use auth::TokenProvider;
pub use client::{BitableClient, BitableOptions};
pub use error::BitableError;
pub use service::TableService;
