//! gemgate - Gemini to HTTP gateway
//!
//! Core library: the Gemini protocol client, the gemtext to HTML transcoder
//! and the HTTP front end that ties them together.

pub mod config;
pub mod gateway;
pub mod gemini;
pub mod gemtext;
pub mod http;
pub mod server;
pub mod template;
