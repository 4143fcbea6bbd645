// Line parsers for Canary
// Extract the `path?query` portion of an input line

pub mod bare;
pub mod raw;

pub use bare::BareUrlParser;
pub use raw::RawRequestParser;

/// The part of a line that carries a query string, split at the first `?`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    pub base: &'a str,
    pub query: &'a str,
}

impl<'a> RequestTarget<'a> {
    /// Split `candidate` at its first `?`; `None` when there is no query separator
    pub fn split(candidate: &'a str) -> Option<Self> {
        let (base, query) = candidate.split_once('?')?;
        Some(Self { base, query })
    }
}

/// Trait for extracting the injectable target from one input line.
///
/// Returning `None` means the line is skipped, never that parsing failed.
pub trait LineParser: Send + Sync {
    fn extract_target<'a>(&self, line: &'a str) -> Option<RequestTarget<'a>>;
}

/// Pick the parser for the configured input shape
pub fn parser_for(raw_mode: bool) -> Box<dyn LineParser> {
    if raw_mode {
        Box::new(RawRequestParser)
    } else {
        Box::new(BareUrlParser)
    }
}
