//! Gemini response status line
//!
//! Grammar: `<class digit 1-6><digit>[<space|tab><meta>]\r\n`. The meta is a
//! MIME type for success, a URL for redirects, and free text otherwise.

use crate::gemini::error::GeminiError;

/// Longest meta field the protocol allows, in bytes.
pub const MAX_META_LEN: usize = 1024;

/// Upper bound on a full status line: two digits, separator, meta, CRLF.
pub const MAX_STATUS_LINE: usize = MAX_META_LEN + 5;

/// MIME type assumed when a success response carries no meta.
pub const DEFAULT_MIME: &str = "text/gemini; charset=utf-8";

/// Outcome family encoded by the first status digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 1x - server wants user input
    Input,
    /// 2x - body follows
    Success,
    /// 3x - resource moved
    Redirect,
    /// 4x
    TemporaryFailure,
    /// 5x
    PermanentFailure,
    /// 6x
    ClientCertificateRequired,
}

impl StatusClass {
    fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            b'1' => Some(StatusClass::Input),
            b'2' => Some(StatusClass::Success),
            b'3' => Some(StatusClass::Redirect),
            b'4' => Some(StatusClass::TemporaryFailure),
            b'5' => Some(StatusClass::PermanentFailure),
            b'6' => Some(StatusClass::ClientCertificateRequired),
            _ => None,
        }
    }
}

/// A parsed status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Two digit status code, e.g. 20 or 31
    pub code: u8,
    pub class: StatusClass,
    /// Everything after the separator, without the line terminator
    pub meta: String,
}

impl Status {
    /// Parses one status line. The trailing `\r\n` (or bare `\n`) is optional.
    pub fn parse(line: &str) -> Result<Self, GeminiError> {
        let malformed = || GeminiError::MalformedStatus {
            line: line.to_string(),
        };

        let trimmed = line
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(line);

        let bytes = trimmed.as_bytes();
        if bytes.len() < 2 {
            return Err(malformed());
        }

        let class = StatusClass::from_digit(bytes[0]).ok_or_else(malformed)?;
        if !bytes[1].is_ascii_digit() {
            return Err(malformed());
        }
        let code = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');

        let meta = match bytes.get(2) {
            None => "",
            Some(b' ') | Some(b'\t') => &trimmed[3..],
            Some(_) => return Err(malformed()),
        };
        if meta.len() > MAX_META_LEN {
            return Err(malformed());
        }

        Ok(Status {
            code,
            class,
            meta: meta.to_string(),
        })
    }

    /// MIME type of a success response, defaulting when the meta is empty.
    pub fn mime(&self) -> &str {
        let meta = self.meta.trim();
        if meta.is_empty() { DEFAULT_MIME } else { meta }
    }

    /// Whether this is a permanent (31) redirect.
    pub fn is_permanent_redirect(&self) -> bool {
        self.code == 31
    }
}

/// Whether a MIME type names gemtext, ignoring parameters and case.
pub fn is_gemtext(mime: &str) -> bool {
    mime.split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case("text/gemini"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_success_line() {
        let status = Status::parse("20 text/gemini; lang=en\r\n").unwrap();
        assert_eq!(status.code, 20);
        assert_eq!(status.class, StatusClass::Success);
        assert_eq!(status.meta, "text/gemini; lang=en");
        assert!(is_gemtext(status.mime()));
    }

    #[test]
    fn empty_success_meta_defaults_to_gemtext() {
        let status = Status::parse("20\r\n").unwrap();
        assert_eq!(status.mime(), DEFAULT_MIME);
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(matches!(
            Status::parse("20text/gemini\r\n"),
            Err(GeminiError::MalformedStatus { .. })
        ));
    }
}
