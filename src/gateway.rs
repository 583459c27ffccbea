//! Gemini retrieval rendered as an HTTP response.
//!
//! The gateway follows redirects through [`GeminiClient`], streams gemtext
//! bodies through the [`Transcoder`] straight into the HTTP connection, and
//! turns every failure into an error page that names the requested URL
//! but not the internal cause.

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use url::Url;

use crate::config::Config;
use crate::gemini::status::is_gemtext;
use crate::gemini::{Body, GeminiClient, GeminiError};
use crate::gemtext::{LinePatterns, TranscodeOptions, Transcoder};
use crate::http::response::{HTML_CONTENT_TYPE, Response, StatusCode};
use crate::http::writer::{ResponseWriter, serialize_head};
use crate::template::{TemplateData, Templates};

pub struct Gateway {
    client: GeminiClient,
    patterns: LinePatterns,
    templates: Templates,
    options: TranscodeOptions,
}

impl Gateway {
    pub fn new(config: &Config) -> Result<Self> {
        let client = GeminiClient::new(&config.gemini).context("Failed to set up TLS client")?;
        let patterns = LinePatterns::compile().context("Failed to compile gemtext patterns")?;
        let templates = Templates::new().context("Failed to compile page templates")?;
        let options = TranscodeOptions {
            gateway_path: config.render.gateway_path.clone(),
            close_unterminated_preformat: config.render.close_unterminated_preformat,
            io_timeout: Some(config.gemini.read_timeout()),
        };

        Ok(Self {
            client,
            patterns,
            templates,
            options,
        })
    }

    pub fn gateway_path(&self) -> &str {
        &self.options.gateway_path
    }

    /// Page with an empty address form.
    pub fn landing_page(&self) -> Result<Response> {
        let data = TemplateData::for_url("", &self.options.gateway_path);
        Ok(Response::html(StatusCode::Ok, self.templates.page(&data)?))
    }

    /// Fetch `url` and write the complete HTTP response to `sink`.
    pub async fn serve<W>(&self, url: &Url, sink: &mut W) -> Result<StatusCode>
    where
        W: AsyncWrite + Unpin,
    {
        let fetched = self.client.fetch(url).await;
        self.respond(url, fetched, sink).await
    }

    /// Write the HTTP response for the outcome of fetching `requested`.
    pub async fn respond<S, W>(
        &self,
        requested: &Url,
        fetched: Result<Body<S>, GeminiError>,
        sink: &mut W,
    ) -> Result<StatusCode>
    where
        S: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let body = match fetched {
            Ok(body) => body,
            Err(GeminiError::ForeignRedirect { target }) => {
                tracing::info!(url = %requested, target = %target, "Handing off non-gemini redirect");
                return self.write_buffered(Response::redirect(target.as_str()), sink).await;
            }
            Err(e) => {
                tracing::error!(url = %requested, error = %e, "Gemini retrieval failed");
                let (status, notice) = failure_notice(&e);
                let data = TemplateData::for_url(requested.as_str(), &self.options.gateway_path)
                    .with_error(format!("{} {}", notice, requested));
                let page = self.templates.page(&data)?;
                return self.write_buffered(Response::html(status, page), sink).await;
            }
        };

        if !is_gemtext(&body.mime) {
            tracing::warn!(url = %body.url, mime = %body.mime, "Unsupported content type, not transcoding");
            let data = TemplateData::for_url(body.url.as_str(), &self.options.gateway_path)
                .with_error(format!("This resource is {}, which the gateway cannot display.", body.mime));
            let page = self.templates.page(&data)?;
            return self.write_buffered(Response::html(StatusCode::Ok, page), sink).await;
        }

        let head = serialize_head(
            StatusCode::Ok,
            [
                ("Content-Type", HTML_CONTENT_TYPE),
                ("Cache-Control", "no-store"),
                ("Connection", "close"),
            ],
        );
        sink.write_all(&head).await?;

        let summary = Transcoder::new(&self.patterns, &self.options)
            .transcode_document(&self.templates, &body.url, body.reader, sink)
            .await
            .with_context(|| format!("Transcoding {} failed mid-response", body.url))?;

        tracing::info!(
            url = %body.url,
            lines = summary.lines,
            links = summary.links,
            unresolved_links = summary.unresolved_links,
            "Page served"
        );

        Ok(StatusCode::Ok)
    }

    async fn write_buffered<W>(&self, response: Response, sink: &mut W) -> Result<StatusCode>
    where
        W: AsyncWrite + Unpin,
    {
        let status = response.status;
        ResponseWriter::new(&response, false).write_to_stream(sink).await?;
        Ok(status)
    }
}

/// Interpret the `url` query parameter. A bare host or path without a scheme
/// is taken to be a gemini URL.
pub fn target_url(raw: &str) -> Result<Url, url::ParseError> {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) if !is_host_and_port(&url) => Ok(url),
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("gemini://{}", raw))
        }
        Err(e) => Err(e),
    }
}

/// `example.org:1965/page` parses with `example.org` as its scheme.
fn is_host_and_port(url: &Url) -> bool {
    url.cannot_be_a_base() && url.path().starts_with(|c: char| c.is_ascii_digit())
}

fn failure_notice(error: &GeminiError) -> (StatusCode, &'static str) {
    match error {
        e if e.is_timeout() => (
            StatusCode::GatewayTimeout,
            "The Gemini server did not answer in time:",
        ),
        GeminiError::MissingHost(_) => (StatusCode::BadRequest, "Not a fetchable URL:"),
        GeminiError::InputRequired { .. } => (
            StatusCode::BadGateway,
            "This page asks for input, which the gateway does not support:",
        ),
        _ => (StatusCode::BadGateway, "Failed to retrieve"),
    }
}
