//! HTML page chrome around transcoded documents and error notices.
//!
//! The header and footer are tera templates compiled once at startup.
//! Everything substituted into them is autoescaped.

use serde::Serialize;
use tera::{Context, Tera};

use crate::gemtext::escape::escape_html;

const HEADER: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
<style>
body{max-width:42em;margin:1em auto;padding:0 1em;font-family:sans-serif;line-height:1.4}
pre{overflow-x:auto;background:#f4f4f4;padding:.5em}
blockquote{border-left:3px solid #ccc;margin-left:0;padding-left:1em;font-style:italic}
.scheme a{font-size:.75em;color:#777}
.error{color:#a00}
form input[type=text]{width:70%}
</style>
</head>
<body>
<form action="{{ gateway_path }}" method="get"><input type="text" name="url" value="{{ url }}" placeholder="gemini://"> <input type="submit" value="Go"></form>
{% if error %}<p class="error">{{ error }}</p>
{% endif %}<main>
"#;

const FOOTER: &str = "</main>\n</body>\n</html>\n";

/// Values substituted into the page template.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateData {
    /// URL being displayed, prefilled in the address form
    pub url: String,
    pub title: String,
    /// Notice shown above the body
    pub error: Option<String>,
    /// Where the address form submits to
    pub gateway_path: String,
}

impl TemplateData {
    pub fn for_url(url: &str, gateway_path: &str) -> Self {
        Self {
            url: url.to_string(),
            title: if url.is_empty() {
                "gemgate".to_string()
            } else {
                format!("gemgate {}", url)
            },
            error: None,
            gateway_path: gateway_path.to_string(),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Compiled page templates
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.set_escape_fn(escape);
        tera.add_raw_templates(vec![("header.html", HEADER), ("footer.html", FOOTER)])?;
        Ok(Self { tera })
    }

    /// Everything up to and including the opening of the content area.
    pub fn header(&self, data: &TemplateData) -> Result<String, tera::Error> {
        self.render("header.html", data)
    }

    pub fn footer(&self, data: &TemplateData) -> Result<String, tera::Error> {
        self.render("footer.html", data)
    }

    /// A complete page with no body content, for notices and errors.
    pub fn page(&self, data: &TemplateData) -> Result<String, tera::Error> {
        let mut page = self.header(data)?;
        page.push_str(&self.footer(data)?);
        Ok(page)
    }

    fn render(&self, name: &str, data: &TemplateData) -> Result<String, tera::Error> {
        let context = Context::from_serialize(data)?;
        self.tera.render(name, &context)
    }
}

fn escape(raw: &str) -> String {
    escape_html(raw).into_owned()
}
