//! HTTP front end of the gateway.
//!
//! - **`connection`**: per-client state machine and request routing
//! - **`parser`**: parses incoming HTTP requests from byte buffers
//! - **`request`**: request representation and query string access
//! - **`response`**: response representation with builder pattern
//! - **`writer`**: serializes responses, or just their head for streamed bodies
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Route the request
//!        └──────┬───────────┘
//!               ├─ Local answer ──▶ Writing ─┬─ Keep-Alive → Reading
//!               │                            └─ Close → Closed
//!               └─ ?url= ──▶ Streaming ──▶ Closed
//! ```
//!
//! Gateway pages are streamed as they are transcoded, without a
//! Content-Length, so the connection closes after each one.

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
