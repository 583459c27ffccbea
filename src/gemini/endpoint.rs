//! Connection endpoints and redirect target resolution.

use url::{Host, Url};

use crate::gemini::error::{GeminiError, Result};
use crate::gemini::{DEFAULT_PORT, SCHEME};

/// Host and port a Gemini URL is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname or IP literal, without IPv6 brackets
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn from_url(url: &Url) -> Result<Self> {
        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            _ => return Err(GeminiError::MissingHost(url.to_string())),
        };

        Ok(Self {
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
        })
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Resolves a redirect meta field against the URL that produced it.
///
/// Relative targets inherit scheme, host and path context from `current`.
/// A gemini target must end up with a host; foreign schemes are returned
/// as-is for the caller to decide on.
pub fn resolve_redirect(current: &Url, meta: &str) -> Result<Url> {
    let raw = meta.trim();
    if raw.is_empty() {
        return Err(GeminiError::RedirectParse {
            target: meta.to_string(),
            reason: "empty redirect target".to_string(),
        });
    }

    let target = current.join(raw).map_err(|e| GeminiError::RedirectParse {
        target: raw.to_string(),
        reason: e.to_string(),
    })?;

    if target.scheme() == SCHEME && target.host_str().is_none_or(str::is_empty) {
        return Err(GeminiError::RedirectParse {
            target: raw.to_string(),
            reason: "redirect target has no host".to_string(),
        });
    }

    Ok(target)
}
