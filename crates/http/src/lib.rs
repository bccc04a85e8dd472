//! Expense tracker HTTP client
//!
//! This crate provides an authenticated client for the expense tracker REST
//! API with transparent access-token refresh, plus typed wrappers for every
//! resource the API exposes.

#[macro_use]
extern crate tracing;

pub mod client;
pub mod types;

pub use client::error::ClientError;
pub use client::session::SessionEvent;
pub use client::token::{ACCESS_TOKEN_KEY, MemoryTokenStore, TokenStore};
pub use client::{ClientConfig, TrackerClient, TrackerClientBuilder};

#[cfg(not(target_arch = "wasm32"))]
pub use client::token::FileTokenStore;

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
