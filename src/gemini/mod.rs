//! Gemini protocol client.
//!
//! - **`client`**: connection, request/response exchange, redirect following
//! - **`status`**: status line grammar
//! - **`endpoint`**: host/port derivation and redirect target resolution
//! - **`tls`**: TLS connector that trusts self-signed certificates
//! - **`error`**: failure kinds of a retrieval

pub mod client;
pub mod endpoint;
pub mod error;
pub mod status;
pub mod tls;

pub use client::{Body, GeminiClient, GeminiStream, Redirect, Response};
pub use error::GeminiError;
pub use status::{Status, StatusClass};

/// URL scheme of the Gemini protocol.
pub const SCHEME: &str = "gemini";

/// Port used when a gemini URL names none.
pub const DEFAULT_PORT: u16 = 1965;
