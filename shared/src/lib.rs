//! Shared types for El Pastorcito
//!
//! Common types used by the server and the client crates: domain models,
//! order arithmetic and status workflow, list views, error types and
//! response envelopes.

pub mod client;
pub mod error;
pub mod listing;
pub mod message;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use listing::{FieldValue, ListQuery, Listable, SortDirection, apply_list_query};
pub use message::SyncPayload;
pub use order::{OrderStatus, ServiceType, TransitionPolicy, order_total};
