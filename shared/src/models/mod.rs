//! Data models
//!
//! Shared between the server, the client crate and the frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflake ids.

pub mod client;
pub mod dining_table;
pub mod order;
pub mod product;
pub mod sauce;

// Re-exports
pub use client::*;
pub use dining_table::*;
pub use order::*;
pub use product::*;
pub use sauce::*;
