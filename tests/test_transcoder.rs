//! Tests for gemtext to HTML transcoding

use gemgate::gemtext::transcoder::MAX_LINE_BYTES;
use gemgate::gemtext::{LinePatterns, State, TranscodeError, TranscodeOptions, Transcoder};
use gemgate::template::Templates;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncWrite, BufReader, duplex};
use url::Url;

const BASE: &str = "gemini://example.org/a/";

async fn render_with(body: &str, options: &TranscodeOptions) -> (String, Transcoder<'static>) {
    let patterns: &'static LinePatterns = Box::leak(Box::new(LinePatterns::compile().unwrap()));
    let options: &'static TranscodeOptions = Box::leak(Box::new(options.clone()));
    let base = Url::parse(BASE).unwrap();

    let mut out = Vec::new();
    let mut transcoder = Transcoder::new(patterns, options);
    transcoder
        .transcode_body(&base, body.as_bytes(), &mut out)
        .await
        .unwrap();

    (String::from_utf8(out).unwrap(), transcoder)
}

async fn render(body: &str) -> String {
    render_with(body, &TranscodeOptions::default()).await.0
}

#[tokio::test]
async fn test_relative_link_reenters_gateway() {
    let html = render("=> b.gmi Next\n").await;

    assert_eq!(
        html,
        "<p><a href=\"/?url=gemini%3A%2F%2Fexample.org%2Fa%2Fb.gmi\">Next</a> \
         <span class=\"scheme\"><a href=\"gemini://example.org/a/b.gmi\">[gemini]</a></span></p>\n"
    );
}

#[tokio::test]
async fn test_link_without_label_shows_target() {
    let html = render("=> gemini://other.org/page\n").await;

    assert!(html.contains(">gemini://other.org/page</a>"));
    assert!(html.contains("href=\"/?url=gemini%3A%2F%2Fother.org%2Fpage\""));
}

#[tokio::test]
async fn test_foreign_link_points_directly() {
    let html = render("=> https://example.com/ Website\n").await;

    assert!(html.contains("<a href=\"https://example.com/\">Website</a>"));
    assert!(html.contains("<a href=\"https://example.com/\">[https]</a>"));
    assert!(!html.contains("?url="));
}

#[tokio::test]
async fn test_custom_gateway_path() {
    let options = TranscodeOptions {
        gateway_path: "/proxy".to_string(),
        ..TranscodeOptions::default()
    };
    let (html, _) = render_with("=> /index.gmi Home\n", &options).await;

    assert!(html.contains("href=\"/proxy?url=gemini%3A%2F%2Fexample.org%2Findex.gmi\""));
}

#[tokio::test]
async fn test_unresolvable_link_falls_back_to_text() {
    let (html, transcoder) =
        render_with("=> http://[::1 broken\nafter\n", &TranscodeOptions::default()).await;

    assert_eq!(html, "<p>=&gt; http://[::1 broken</p>\nafter<br>\n");
    assert_eq!(transcoder.summary().links, 1);
    assert_eq!(transcoder.summary().unresolved_links, 1);
}

#[tokio::test]
async fn test_list_run_gets_one_container() {
    let html = render("* one\n* two\n* three\ntext\n").await;

    assert_eq!(html.matches("<ul>").count(), 1);
    assert_eq!(html.matches("</ul>").count(), 1);
    assert_eq!(html.matches("<li>").count(), 3);
    assert!(html.starts_with("<ul>\n<li>one</li>\n"));
    assert!(html.contains("<li>three</li>\n</ul>\ntext<br>\n"));
}

#[tokio::test]
async fn test_separate_lists_get_separate_containers() {
    let html = render("* a\n\n* b\n").await;

    assert_eq!(html, "<ul>\n<li>a</li>\n</ul>\n<br>\n<ul>\n<li>b</li>\n</ul>\n");
}

#[tokio::test]
async fn test_list_closed_at_end_of_input() {
    let (html, transcoder) = render_with("* a\n* b", &TranscodeOptions::default()).await;

    assert!(html.ends_with("<li>b</li>\n</ul>\n"));
    assert_eq!(transcoder.state(), State::Default);
}

#[tokio::test]
async fn test_heading_closes_list() {
    let html = render("* a\n## Section\n").await;

    assert_eq!(html, "<ul>\n<li>a</li>\n</ul>\n<h2>Section</h2>\n");
}

#[tokio::test]
async fn test_paired_fences() {
    let (html, transcoder) =
        render_with("```\nx\n```\n```\ny\n```\n", &TranscodeOptions::default()).await;

    assert_eq!(html.matches("<pre>").count(), 2);
    assert_eq!(html.matches("</pre>").count(), 2);
    assert_eq!(transcoder.summary().preformat_blocks, 2);
    assert!(!transcoder.summary().preformat_left_open);
}

#[tokio::test]
async fn test_odd_fence_leaves_block_open() {
    let (html, transcoder) =
        render_with("```\nx\n```\n```\ny\n", &TranscodeOptions::default()).await;

    assert_eq!(html.matches("<pre>").count(), 2);
    assert_eq!(html.matches("</pre>").count(), 1);
    assert!(html.ends_with("y\n<!-- unterminated preformatted block -->\n"));
    assert_eq!(transcoder.state(), State::InPreformat);
    assert!(transcoder.summary().preformat_left_open);
}

#[tokio::test]
async fn test_odd_fence_closed_when_configured() {
    let options = TranscodeOptions {
        close_unterminated_preformat: true,
        ..TranscodeOptions::default()
    };
    let (html, transcoder) = render_with("```\ny\n", &options).await;

    assert_eq!(html, "<pre>\ny\n</pre>\n");
    assert_eq!(transcoder.state(), State::Default);
}

#[tokio::test]
async fn test_preformat_is_verbatim_and_escaped() {
    let html = render("```\n<b>&</b>\n# not a heading\n=> not/a/link\n```\n").await;

    assert_eq!(
        html,
        "<pre>\n&lt;b&gt;&amp;&lt;/b&gt;\n# not a heading\n=&gt; not/a/link\n</pre>\n"
    );
}

#[tokio::test]
async fn test_fence_alt_text() {
    let html = render("```ascii \"art\"\n```\n").await;

    assert_eq!(html, "<pre aria-label=\"ascii &quot;art&quot;\">\n</pre>\n");
}

#[tokio::test]
async fn test_fence_closes_open_list() {
    let html = render("* a\n```\n* b\n```\n").await;

    assert_eq!(html, "<ul>\n<li>a</li>\n</ul>\n<pre>\n* b\n</pre>\n");
}

#[tokio::test]
async fn test_block_elements_are_escaped() {
    let html = render("# A <b>\n### C & D\n> quoted <i>\n\nplain <script>\n").await;

    assert_eq!(
        html,
        "<h1>A &lt;b&gt;</h1>\n<h3>C &amp; D</h3>\n<blockquote>quoted &lt;i&gt;</blockquote>\n<br>\nplain &lt;script&gt;<br>\n"
    );
}

#[tokio::test]
async fn test_crlf_line_endings() {
    let html = render("# Title\r\nbody\r\n").await;

    assert_eq!(html, "<h1>Title</h1>\nbody<br>\n");
}

#[tokio::test]
async fn test_document_wraps_body_in_template() {
    let patterns = LinePatterns::compile().unwrap();
    let templates = Templates::new().unwrap();
    let options = TranscodeOptions::default();
    let base = Url::parse("gemini://example.org/").unwrap();
    let mut out = Vec::new();

    let summary = Transcoder::new(&patterns, &options)
        .transcode_document(&templates, &base, BufReader::new(&b"# Hello\n"[..]), &mut out)
        .await
        .unwrap();
    let html = String::from_utf8(out).unwrap();

    let head = html.find("<title>gemgate gemini://example.org/</title>").unwrap();
    let body = html.find("<h1>Hello</h1>").unwrap();
    let tail = html.find("</html>").unwrap();
    assert!(head < body && body < tail);
    assert_eq!(summary.lines, 1);
}

#[tokio::test]
async fn test_overlong_line_is_truncated() {
    let mut body = "a".repeat(MAX_LINE_BYTES + 100);
    body.push_str("\nafter\n");

    let (html, transcoder) = render_with(&body, &TranscodeOptions::default()).await;

    let expected = format!("{}<br>\nafter<br>\n", "a".repeat(MAX_LINE_BYTES));
    assert_eq!(html, expected);
    assert_eq!(transcoder.summary().truncated_lines, 1);
    assert_eq!(transcoder.summary().lines, 2);
}

#[tokio::test]
async fn test_empty_heading_markers() {
    let html = render("#\n##\n###\n").await;

    assert_eq!(html, "<h1></h1>\n<h2></h2>\n<h3></h3>\n");
}

struct BrokenSink;

impl AsyncWrite for BrokenSink {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away")))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_sink_failure_is_reported() {
    let patterns = LinePatterns::compile().unwrap();
    let options = TranscodeOptions::default();
    let base = Url::parse(BASE).unwrap();

    let result = Transcoder::new(&patterns, &options)
        .transcode_body(&base, &b"# Hello\n"[..], &mut BrokenSink)
        .await;

    assert!(matches!(result, Err(TranscodeError::Sink(_))));
}

#[tokio::test]
async fn test_stalled_body_times_out() {
    let patterns = LinePatterns::compile().unwrap();
    let options = TranscodeOptions {
        io_timeout: Some(Duration::from_millis(50)),
        ..TranscodeOptions::default()
    };
    let base = Url::parse(BASE).unwrap();
    let (reader, _writer) = duplex(64);
    let mut out = Vec::new();

    let result = Transcoder::new(&patterns, &options)
        .transcode_body(&base, BufReader::new(reader), &mut out)
        .await;

    assert!(matches!(result, Err(TranscodeError::Timeout(_))));
}
