use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;
use url::Url;

use crate::gateway::{Gateway, target_url};
use crate::gemini::SCHEME;
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

const READ_CHUNK: usize = 4096;

pub struct Connection<S = TcpStream> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    gateway: Arc<Gateway>,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Streaming(Url),
    Closed,
}

/// What to do with a parsed request.
#[derive(Debug)]
pub enum Route {
    /// Address form, no URL given yet
    Landing,
    /// Fetch through the gateway and stream the result
    Fetch(Url),
    /// Answer directly
    Respond(Response),
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, gateway: Arc<Gateway>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
            gateway,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    match self.read_request().await? {
                        Some(req) => {
                            self.state = ConnectionState::Processing(req);
                        }
                        None => {
                            self.state = ConnectionState::Closed;
                        }
                    }
                }

                ConnectionState::Processing(req) => {
                    let keep_alive = req.keep_alive();
                    tracing::debug!(method = ?req.method, path = %req.path, "Request");

                    self.state = match route(req, self.gateway.gateway_path()) {
                        Route::Landing => {
                            let writer = ResponseWriter::new(&self.gateway.landing_page()?, keep_alive);
                            ConnectionState::Writing(writer, keep_alive)
                        }
                        Route::Respond(response) => {
                            let writer = ResponseWriter::new(&response, keep_alive);
                            ConnectionState::Writing(writer, keep_alive)
                        }
                        Route::Fetch(url) => ConnectionState::Streaming(url),
                    };
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if *keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                // Streamed bodies are delimited by closing the connection
                ConnectionState::Streaming(url) => {
                    let status = self.gateway.serve(url, &mut self.stream).await?;
                    tracing::debug!(url = %url, status = status.as_u16(), "Gateway response complete");
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        loop {
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    let _ = self.buffer.split_to(consumed);
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => {
                    return Err(anyhow::anyhow!("HTTP parse error: {:?}", e));
                }
            }

            self.buffer.reserve(READ_CHUNK);
            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                // Client closed connection
                return Ok(None);
            }
        }
    }
}

/// Decide how to answer `req`.
pub fn route(req: &Request, gateway_path: &str) -> Route {
    if req.method != Method::GET {
        return Route::Respond(Response::method_not_allowed());
    }

    if req.route() != gateway_path {
        return Route::Respond(Response::not_found());
    }

    let raw = match req.query_param("url") {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Route::Landing,
    };

    match target_url(&raw) {
        Ok(url) if url.scheme() == SCHEME => Route::Fetch(url),
        Ok(url) => Route::Respond(Response::redirect(url.as_str())),
        Err(e) => {
            tracing::debug!(url = %raw, error = %e, "Rejecting unparseable URL");
            Route::Respond(Response::bad_request("invalid URL"))
        }
    }
}
