//! Gemtext line classification
//!
//! The patterns are compiled once at startup and shared read-only between
//! all requests.

use regex::Regex;

/// What a single gemtext line is, with its captured payload.
///
/// Variants are listed in the order they are tested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// ```` ``` ```` with optional alt text
    PreformatFence(Option<&'a str>),
    Blank,
    Heading1(&'a str),
    Heading2(&'a str),
    Heading3(&'a str),
    Link {
        target: &'a str,
        label: Option<&'a str>,
    },
    ListItem(&'a str),
    Quote(&'a str),
    Text(&'a str),
}

/// Compiled gemtext line patterns
#[derive(Debug)]
pub struct LinePatterns {
    fence: Regex,
    blank: Regex,
    heading1: Regex,
    heading2: Regex,
    heading3: Regex,
    link: Regex,
    list_item: Regex,
    quote: Regex,
}

impl LinePatterns {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            fence: Regex::new(r"^```(.*)$")?,
            blank: Regex::new(r"^\s*$")?,
            heading1: Regex::new(r"^#([^#].*)?$")?,
            heading2: Regex::new(r"^##([^#].*)?$")?,
            heading3: Regex::new(r"^###(.*)$")?,
            link: Regex::new(r"^=>[ \t]*(\S+)(?:[ \t]+(.*))?$")?,
            list_item: Regex::new(r"^\* (.*)$")?,
            quote: Regex::new(r"^>(.*)$")?,
        })
    }

    /// Classify one line. `line` must not contain its line terminator.
    pub fn classify<'a>(&self, line: &'a str) -> Line<'a> {
        if let Some(caps) = self.fence.captures(line) {
            let alt = caps.get(1).map(|m| m.as_str().trim()).filter(|s| !s.is_empty());
            return Line::PreformatFence(alt);
        }

        if self.blank.is_match(line) {
            return Line::Blank;
        }

        if let Some(text) = capture(&self.heading1, line) {
            return Line::Heading1(text);
        }
        if let Some(text) = capture(&self.heading2, line) {
            return Line::Heading2(text);
        }
        if let Some(text) = capture(&self.heading3, line) {
            return Line::Heading3(text);
        }

        if let Some(caps) = self.link.captures(line) {
            if let Some(target) = caps.get(1) {
                let label = caps
                    .get(2)
                    .map(|m| m.as_str().trim())
                    .filter(|s| !s.is_empty());
                return Line::Link {
                    target: target.as_str(),
                    label,
                };
            }
        }

        if let Some(text) = capture(&self.list_item, line) {
            return Line::ListItem(text);
        }
        if let Some(text) = capture(&self.quote, line) {
            return Line::Quote(text);
        }

        Line::Text(line)
    }
}

/// Trimmed first group of a match; an absent group reads as empty text.
fn capture<'a>(re: &Regex, line: &'a str) -> Option<&'a str> {
    re.captures(line)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str().trim()))
}
