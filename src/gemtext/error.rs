use thiserror::Error;

/// Errors that abort a transcoding run. Unresolvable links are not among
/// them; those degrade to plain text.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to read body: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write output: {0}")]
    Sink(#[source] std::io::Error),

    #[error("timed out {0}")]
    Timeout(&'static str),

    #[error("failed to render page template: {0}")]
    Template(#[from] tera::Error),
}
