//! Pastorcito Client - HTTP client for the El Pastorcito server
//!
//! Typed calls for the customer ordering flow and the admin back office,
//! plus the customer-side pieces that live outside the server: the
//! persisted client session, the cart and debounced phone suggestions.

pub mod cart;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod suggest;

pub use cart::Cart;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, SessionError};
pub use http::HttpClient;
pub use session::{ClientDirectory, ClientSession, FileSessionStorage, SessionStorage};
pub use suggest::{PhoneSuggester, SUGGEST_DEBOUNCE};

// Re-export shared types for convenience
pub use shared::ApiResponse;
pub use shared::client::{AdminInfo, LoginRequest, LoginResponse};
