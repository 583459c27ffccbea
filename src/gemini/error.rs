use thiserror::Error;

/// Failures of a single Gemini retrieval. None of these are retried.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("failed to connect to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out during {stage} for {url}")]
    Timeout { url: String, stage: &'static str },

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("failed to read response: {0}")]
    Read(#[source] std::io::Error),

    #[error("invalid status line: {line:?}")]
    MalformedStatus { line: String },

    #[error("server asked for input, which is not supported: {prompt}")]
    InputRequired { prompt: String },

    #[error("can't parse redirect URL {target:?}: {reason}")]
    RedirectParse { target: String, reason: String },

    #[error("unhandled status: {line}")]
    UnhandledStatus { line: String },

    #[error("too many redirects ({limit}) starting from {url}")]
    TooManyRedirects { url: String, limit: usize },

    #[error("redirected to non-gemini URL {target}")]
    ForeignRedirect { target: url::Url },

    #[error("failed to write request: {0}")]
    Sink(#[source] std::io::Error),

    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),
}

impl GeminiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GeminiError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, GeminiError>;
