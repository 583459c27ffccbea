//! Streaming gemtext to HTML transcoder
//!
//! Lines are read one at a time and written out as soon as they are
//! rendered. The only state carried between lines is [`State`].

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use url::Url;

use crate::gemtext::error::TranscodeError;
use crate::gemtext::escape::escape_html;
use crate::gemtext::link;
use crate::gemtext::patterns::{Line, LinePatterns};
use crate::template::{TemplateData, Templates};

/// Longest body line rendered; the remainder of a longer line is dropped.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Open block context between lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Default,
    InPreformat,
    InList,
}

#[derive(Debug, Clone)]
pub struct TranscodeOptions {
    /// Path gemini links are rewritten to
    pub gateway_path: String,

    /// Close a preformatted block still open at end of input
    pub close_unterminated_preformat: bool,

    /// Deadline for each body read and each output write
    pub io_timeout: Option<Duration>,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            gateway_path: "/".to_string(),
            close_unterminated_preformat: false,
            io_timeout: None,
        }
    }
}

/// Counters collected over one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscodeSummary {
    pub lines: usize,
    pub links: usize,
    pub unresolved_links: usize,
    pub preformat_blocks: usize,
    pub preformat_left_open: bool,
    pub truncated_lines: usize,
}

pub struct Transcoder<'a> {
    patterns: &'a LinePatterns,
    options: &'a TranscodeOptions,
    state: State,
    summary: TranscodeSummary,
}

impl<'a> Transcoder<'a> {
    pub fn new(patterns: &'a LinePatterns, options: &'a TranscodeOptions) -> Self {
        Self {
            patterns,
            options,
            state: State::Default,
            summary: TranscodeSummary::default(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn summary(&self) -> &TranscodeSummary {
        &self.summary
    }

    /// Write a complete HTML document: preamble, transcoded body, closing.
    pub async fn transcode_document<R, W>(
        mut self,
        templates: &Templates,
        base: &Url,
        reader: R,
        sink: &mut W,
    ) -> Result<TranscodeSummary, TranscodeError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let data = TemplateData::for_url(base.as_str(), &self.options.gateway_path);

        self.emit(sink, &templates.header(&data)?).await?;
        self.transcode_body(base, reader, sink).await?;
        self.emit(sink, &templates.footer(&data)?).await?;

        with_deadline(self.options.io_timeout, "flushing output", sink.flush())
            .await?
            .map_err(TranscodeError::Sink)?;

        if self.summary.preformat_left_open {
            tracing::warn!(url = %base, "Document ended inside a preformatted block");
        }

        Ok(self.summary)
    }

    /// Transcode every line of `reader`, then close any open blocks.
    pub async fn transcode_body<R, W>(
        &mut self,
        base: &Url,
        mut reader: R,
        sink: &mut W,
    ) -> Result<(), TranscodeError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut raw = Vec::with_capacity(256);
        let mut out = String::with_capacity(256);

        loop {
            raw.clear();
            let n = with_deadline(
                self.options.io_timeout,
                "reading body",
                (&mut reader)
                    .take(MAX_LINE_BYTES as u64)
                    .read_until(b'\n', &mut raw),
            )
            .await?
            .map_err(TranscodeError::Read)?;

            if n == 0 {
                break;
            }

            if n == MAX_LINE_BYTES && !raw.ends_with(b"\n") {
                tracing::warn!(url = %base, limit = MAX_LINE_BYTES, "Truncating overlong line");
                self.summary.truncated_lines += 1;
                with_deadline(
                    self.options.io_timeout,
                    "reading body",
                    discard_line(&mut reader),
                )
                .await?
                .map_err(TranscodeError::Read)?;
            }

            let line = String::from_utf8_lossy(&raw);
            tracing::debug!(line = %line.trim_end(), "gemtext");

            out.clear();
            self.feed_line(base, &line, &mut out);
            self.emit(sink, &out).await?;
        }

        out.clear();
        self.finish(&mut out);
        self.emit(sink, &out).await
    }

    /// Render one input line (terminator optional) into `out`.
    pub fn feed_line(&mut self, base: &Url, raw: &str, out: &mut String) {
        let line = raw
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(raw);
        self.summary.lines += 1;

        let kind = self.patterns.classify(line);

        if self.state == State::InPreformat {
            match kind {
                Line::PreformatFence(_) => {
                    out.push_str("</pre>\n");
                    self.state = State::Default;
                }
                _ => {
                    out.push_str(&escape_html(line));
                    out.push('\n');
                }
            }
            return;
        }

        if !matches!(kind, Line::ListItem(_)) {
            self.close_list(out);
        }

        match kind {
            Line::PreformatFence(alt) => {
                match alt {
                    Some(alt) => out.push_str(&format!("<pre aria-label=\"{}\">\n", escape_html(alt))),
                    None => out.push_str("<pre>\n"),
                }
                self.state = State::InPreformat;
                self.summary.preformat_blocks += 1;
            }
            Line::Blank => out.push_str("<br>\n"),
            Line::Heading1(text) => out.push_str(&format!("<h1>{}</h1>\n", escape_html(text))),
            Line::Heading2(text) => out.push_str(&format!("<h2>{}</h2>\n", escape_html(text))),
            Line::Heading3(text) => out.push_str(&format!("<h3>{}</h3>\n", escape_html(text))),
            Line::Link { target, label } => {
                self.summary.links += 1;
                match link::resolve(base, target) {
                    Ok(resolved) => link::render(&resolved, label, &self.options.gateway_path, out),
                    Err(e) => {
                        tracing::debug!(error = %e, "Rendering link as text");
                        self.summary.unresolved_links += 1;
                        out.push_str(&format!("<p>{}</p>\n", escape_html(line)));
                    }
                }
            }
            Line::Quote(text) => {
                out.push_str(&format!("<blockquote>{}</blockquote>\n", escape_html(text)))
            }
            Line::ListItem(text) => {
                if self.state != State::InList {
                    out.push_str("<ul>\n");
                    self.state = State::InList;
                }
                out.push_str(&format!("<li>{}</li>\n", escape_html(text)));
            }
            Line::Text(text) => out.push_str(&format!("{}<br>\n", escape_html(text))),
        }
    }

    /// Close whatever block the input left open.
    pub fn finish(&mut self, out: &mut String) {
        match self.state {
            State::InList => self.close_list(out),
            State::InPreformat if self.options.close_unterminated_preformat => {
                out.push_str("</pre>\n");
                self.state = State::Default;
            }
            State::InPreformat => {
                out.push_str("<!-- unterminated preformatted block -->\n");
                self.summary.preformat_left_open = true;
            }
            State::Default => {}
        }
    }

    fn close_list(&mut self, out: &mut String) {
        if self.state == State::InList {
            out.push_str("</ul>\n");
            self.state = State::Default;
        }
    }

    async fn emit<W>(&self, sink: &mut W, chunk: &str) -> Result<(), TranscodeError>
    where
        W: AsyncWrite + Unpin,
    {
        if chunk.is_empty() {
            return Ok(());
        }
        with_deadline(
            self.options.io_timeout,
            "writing output",
            sink.write_all(chunk.as_bytes()),
        )
        .await?
        .map_err(TranscodeError::Sink)
    }
}

/// Skip input up to and including the next newline.
async fn discard_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (used, done) = {
            let buf = reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (buf.len(), false),
            }
        };
        reader.consume(used);
        if done {
            return Ok(());
        }
    }
}

async fn with_deadline<T>(
    limit: Option<Duration>,
    stage: &'static str,
    fut: impl Future<Output = T>,
) -> Result<T, TranscodeError> {
    match limit {
        Some(limit) => timeout(limit, fut)
            .await
            .map_err(|_| TranscodeError::Timeout(stage)),
        None => Ok(fut.await),
    }
}
