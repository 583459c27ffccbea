//! Gemini protocol client
//!
//! One request per TLS connection: send the URL, read the status line, then
//! either hand back the open body stream or a redirect target.

use std::future::Future;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use url::Url;

use crate::config::GeminiConfig;
use crate::gemini::SCHEME;
use crate::gemini::endpoint::{Endpoint, resolve_redirect};
use crate::gemini::error::{GeminiError, Result};
use crate::gemini::status::{MAX_STATUS_LINE, Status, StatusClass};
use crate::gemini::tls;

/// Stream type of a live Gemini connection.
pub type GeminiStream = TlsStream<TcpStream>;

/// A success response whose body has not been read yet.
pub struct Body<S> {
    /// URL the body was served for (after any redirects)
    pub url: Url,
    /// Declared MIME type
    pub mime: String,
    /// Remainder of the connection, positioned after the status line
    pub reader: BufReader<S>,
}

/// A redirect response. The origin is kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: Url,
    pub origin: Url,
    pub permanent: bool,
}

pub enum Response<S> {
    Success(Body<S>),
    Redirect(Redirect),
}

/// Client for fetching Gemini resources
pub struct GeminiClient {
    connector: TlsConnector,
    connect_timeout: Duration,
    read_timeout: Duration,
    max_redirects: usize,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        Ok(Self {
            connector: tls::connector()?,
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            max_redirects: config.max_redirects,
        })
    }

    /// Issue a single request without following redirects.
    pub async fn request(&self, url: &Url) -> Result<Response<GeminiStream>> {
        let stream = self.connect(url).await?;
        exchange(stream, url, self.read_timeout).await
    }

    /// Fetch `url`, following up to `max_redirects` gemini redirects.
    pub async fn fetch(&self, url: &Url) -> Result<Body<GeminiStream>> {
        let client = self;
        follow_redirects(url, self.max_redirects, move |next| async move {
            client.request(&next).await
        })
        .await
    }

    async fn connect(&self, url: &Url) -> Result<GeminiStream> {
        let endpoint = Endpoint::from_url(url)?;
        let server_name = ServerName::try_from(endpoint.host.clone()).map_err(|e| {
            GeminiError::Connection {
                url: url.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            }
        })?;

        tracing::debug!(url = %url, endpoint = %endpoint, "Connecting");

        let connecting = async {
            let tcp = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
            self.connector.connect(server_name, tcp).await
        };

        within(self.connect_timeout, url, "connect", connecting)
            .await?
            .map_err(|source| GeminiError::Connection {
                url: url.to_string(),
                source,
            })
    }
}

/// Run one request/response exchange over an already established stream.
///
/// The stream is consumed; on every error path it is dropped here, on
/// success it lives on inside the returned body.
pub async fn exchange<S>(mut stream: S, url: &Url, read_timeout: Duration) -> Result<Response<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = format!("{}\r\n", url.as_str());
    let sending = async {
        stream.write_all(request.as_bytes()).await?;
        stream.flush().await
    };
    within(read_timeout, url, "request", sending)
        .await?
        .map_err(GeminiError::Sink)?;

    let mut reader = BufReader::new(stream);
    let line = within(read_timeout, url, "status line", read_status_line(&mut reader)).await??;

    tracing::debug!(url = %url, status = %line.trim_end(), "Received status line");

    let status = Status::parse(&line)?;

    match status.class {
        StatusClass::Input => Err(GeminiError::InputRequired {
            prompt: status.meta,
        }),
        StatusClass::Success => Ok(Response::Success(Body {
            url: url.clone(),
            mime: status.mime().to_string(),
            reader,
        })),
        StatusClass::Redirect => {
            let target = resolve_redirect(url, &status.meta)?;
            Ok(Response::Redirect(Redirect {
                target,
                origin: url.clone(),
                permanent: status.is_permanent_redirect(),
            }))
        }
        _ => Err(GeminiError::UnhandledStatus {
            line: line.trim_end().to_string(),
        }),
    }
}

/// Drive `request` from `start` until a success response, following at most
/// `max_redirects` redirects.
pub async fn follow_redirects<S, F, Fut>(
    start: &Url,
    max_redirects: usize,
    mut request: F,
) -> Result<Body<S>>
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = Result<Response<S>>>,
{
    let mut url = start.clone();

    for hop in 0..=max_redirects {
        match request(url).await? {
            Response::Success(body) => return Ok(body),
            Response::Redirect(redirect) => {
                tracing::info!(
                    from = %redirect.origin,
                    to = %redirect.target,
                    permanent = redirect.permanent,
                    hop = hop + 1,
                    "Following redirect"
                );

                if redirect.target.scheme() != SCHEME {
                    return Err(GeminiError::ForeignRedirect {
                        target: redirect.target,
                    });
                }
                url = redirect.target;
            }
        }
    }

    Err(GeminiError::TooManyRedirects {
        url: start.to_string(),
        limit: max_redirects,
    })
}

async fn read_status_line<R>(reader: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(64);
    let n = (&mut *reader)
        .take(MAX_STATUS_LINE as u64)
        .read_until(b'\n', &mut buf)
        .await
        .map_err(GeminiError::Read)?;

    if n == 0 {
        return Err(GeminiError::Read(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before status line",
        )));
    }

    if !buf.ends_with(b"\n") {
        if buf.len() >= MAX_STATUS_LINE {
            return Err(GeminiError::MalformedStatus {
                line: String::from_utf8_lossy(&buf).into_owned(),
            });
        }
        return Err(GeminiError::Read(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed in the middle of the status line",
        )));
    }

    String::from_utf8(buf).map_err(|e| GeminiError::MalformedStatus {
        line: String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

async fn within<T>(
    limit: Duration,
    url: &Url,
    stage: &'static str,
    fut: impl Future<Output = T>,
) -> Result<T> {
    timeout(limit, fut).await.map_err(|_| GeminiError::Timeout {
        url: url.to_string(),
        stage,
    })
}
