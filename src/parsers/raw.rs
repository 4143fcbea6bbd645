// Raw HTTP request line parser for Canary
// Uses regex to pull the path out of `METHOD /path HTTP/x.y`

use lazy_static::lazy_static;
use regex::Regex;

use super::{LineParser, RequestTarget};

lazy_static! {
    /// Method token, a single space, an absolute path, a single space, then the version marker
    static ref REQUEST_LINE: Regex = Regex::new(r"(?i)^[A-Z]+ (/[^ ]*) HTTP").unwrap();
}

pub struct RawRequestParser;

impl RawRequestParser {
    /// Path (with query) of a request line, or `None` if the line is not a request line
    pub fn request_path(line: &str) -> Option<&str> {
        REQUEST_LINE
            .captures(line)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str())
    }
}

impl LineParser for RawRequestParser {
    fn extract_target<'a>(&self, line: &'a str) -> Option<RequestTarget<'a>> {
        RequestTarget::split(Self::request_path(line)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_path_from_request_line() {
        let target = RawRequestParser
            .extract_target("GET /search?q=test HTTP/1.1")
            .unwrap();
        assert_eq!(target.base, "/search");
        assert_eq!(target.query, "q=test");
    }

    #[test]
    fn method_is_case_insensitive() {
        assert_eq!(
            RawRequestParser::request_path("post /api?id=1 HTTP/2"),
            Some("/api?id=1")
        );
    }

    #[test]
    fn request_line_without_query_is_skipped() {
        assert!(RawRequestParser.extract_target("GET /search HTTP/1.1").is_none());
    }

    #[test]
    fn non_request_lines_are_skipped() {
        assert!(RawRequestParser.extract_target("https://example.com/?q=1").is_none());
        assert!(RawRequestParser.extract_target("Host: example.com").is_none());
        assert!(RawRequestParser.extract_target("GET search?q=1 HTTP/1.1").is_none());
        assert!(RawRequestParser.extract_target("GET /search?q=1").is_none());
    }
}
