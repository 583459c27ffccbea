//! Link lines: resolution against the page URL and anchor rendering.

use thiserror::Error;
use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::gemini::SCHEME;
use crate::gemtext::escape::escape_html;

#[derive(Debug, Error)]
#[error("can't resolve link {target:?}: {source}")]
pub struct LinkResolutionError {
    pub target: String,
    #[source]
    pub source: url::ParseError,
}

/// Resolve a link target, possibly relative, against the page it appears on.
pub fn resolve(base: &Url, target: &str) -> Result<Url, LinkResolutionError> {
    base.join(target).map_err(|source| LinkResolutionError {
        target: target.to_string(),
        source,
    })
}

/// Gateway URL that fetches `target` through this service.
pub fn gateway_href(gateway_path: &str, target: &Url) -> String {
    let encoded: String = byte_serialize(target.as_str().as_bytes()).collect();
    format!("{}?url={}", gateway_path, encoded)
}

/// Render a resolved link as a paragraph with the primary anchor followed by
/// a scheme badge pointing straight at the target.
///
/// Gemini targets are routed back through the gateway; anything else is
/// linked directly.
pub fn render(target: &Url, label: Option<&str>, gateway_path: &str, out: &mut String) {
    let direct = escape_html(target.as_str());
    let primary = if target.scheme() == SCHEME {
        escape_html(&gateway_href(gateway_path, target)).into_owned()
    } else {
        direct.clone().into_owned()
    };
    let text = escape_html(label.unwrap_or(target.as_str()));
    let scheme = escape_html(target.scheme());

    out.push_str(&format!(
        "<p><a href=\"{primary}\">{text}</a> <span class=\"scheme\"><a href=\"{direct}\">[{scheme}]</a></span></p>\n"
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_href_encodes_target() {
        let target = Url::parse("gemini://example.org/a b?q=1").unwrap();
        assert_eq!(
            gateway_href("/", &target),
            "/?url=gemini%3A%2F%2Fexample.org%2Fa%2520b%3Fq%3D1"
        );
    }

    #[test]
    fn foreign_links_point_directly() {
        let target = Url::parse("https://example.com/page").unwrap();
        let mut out = String::new();
        render(&target, Some("Web"), "/", &mut out);
        assert_eq!(
            out,
            "<p><a href=\"https://example.com/page\">Web</a> <span class=\"scheme\"><a href=\"https://example.com/page\">[https]</a></span></p>\n"
        );
    }
}
