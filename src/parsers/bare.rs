// Bare URL parser for Canary
// The whole line is the injection candidate

use super::{LineParser, RequestTarget};

pub struct BareUrlParser;

impl LineParser for BareUrlParser {
    fn extract_target<'a>(&self, line: &'a str) -> Option<RequestTarget<'a>> {
        RequestTarget::split(line)
    }
}
