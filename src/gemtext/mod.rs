//! Gemtext to HTML transcoding.
//!
//! The transcoder is a small state machine over input lines:
//!
//! ```text
//!   ┌──────────┐  "* "   ┌────────┐
//!   │ Default  │ ──────▶ │ InList │ ── any other line closes </ul>
//!   └────┬─────┘ ◀────── └────────┘
//!        │ ```
//!        ▼
//!   ┌─────────────┐
//!   │ InPreformat │ ── lines copied verbatim (escaped) until the next ```
//!   └─────────────┘
//! ```
//!
//! At end of input an open list is closed. An open preformatted block is
//! left open unless `close_unterminated_preformat` is set.

pub mod error;
pub mod escape;
pub mod link;
pub mod patterns;
pub mod transcoder;

pub use error::TranscodeError;
pub use link::LinkResolutionError;
pub use patterns::{Line, LinePatterns};
pub use transcoder::{State, TranscodeOptions, TranscodeSummary, Transcoder};
