// Per-line injection pipeline for Canary
// Composes parser -> allocator -> mutator for a single line

use tracing::debug;

use crate::allocator::TokenAllocator;
use crate::models::{Injection, InjectorConfig};
use crate::mutator::QueryMutator;
use crate::parsers::{parser_for, LineParser};

/// Everything a worker needs to turn one input line into an injected line.
///
/// Shared read-only between workers; the allocator's cursor is the only
/// interior state.
pub struct CanaryInjector {
    parser: Box<dyn LineParser>,
    allocator: TokenAllocator,
    mutator: QueryMutator,
}

impl CanaryInjector {
    pub fn new(config: InjectorConfig) -> Self {
        Self {
            parser: parser_for(config.raw_mode),
            allocator: TokenAllocator::new(config.canary),
            mutator: QueryMutator::new(config.targets, config.policy),
        }
    }

    /// Next token for `line_number`, including OAST wrapping, prefix and suffix
    pub fn allocate_token(&self, line_number: u64) -> String {
        self.allocator.allocate(line_number)
    }

    /// Inject a token into `text`, or `None` if the line is skipped.
    ///
    /// A token is allocated as soon as the line has a query string, even if
    /// no parameter turns out to be eligible.
    pub fn process_line(&self, text: &str, line_number: u64) -> Option<Injection> {
        let Some(target) = self.parser.extract_target(text) else {
            debug!(line = line_number, "no injectable query string");
            return None;
        };

        let token = self.allocate_token(line_number);
        let Some(injected) = self.mutator.mutate(&target, &token) else {
            debug!(line = line_number, "no eligible parameter");
            return None;
        };

        Some(Injection {
            log_entry: format!("{} -> {}", text, injected),
            line: injected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanaryConfig, CanaryMode};

    fn custom(value: &str) -> InjectorConfig {
        InjectorConfig::new(CanaryConfig::new(CanaryMode::Custom(value.to_string())))
    }

    #[test]
    fn log_entry_shows_before_and_after() {
        let injector = CanaryInjector::new(custom("tok"));
        let result = injector.process_line("https://a.test/x?q=1", 1).unwrap();
        assert_eq!(result.line, "https://a.test/x?q=tok");
        assert_eq!(result.log_entry, "https://a.test/x?q=1 -> https://a.test/x?q=tok");
    }

    #[test]
    fn raw_mode_outputs_path_form() {
        let mut config = custom("tok");
        config.raw_mode = true;
        let injector = CanaryInjector::new(config);
        let result = injector.process_line("GET /search?q=test HTTP/1.1", 1).unwrap();
        assert_eq!(result.line, "/search?q=tok");
    }

    #[test]
    fn range_cursor_advances_on_ineligible_lines() {
        let mut config = InjectorConfig::new(CanaryConfig::new(CanaryMode::Range { start: 1, end: 3 }));
        config.targets = ["id"].into_iter().collect();
        let injector = CanaryInjector::new(config);

        assert!(injector.process_line("/a?other=1", 1).is_none());
        let result = injector.process_line("/a?id=0", 2).unwrap();
        assert_eq!(result.line, "/a?id=2");
    }

    #[test]
    fn line_without_query_does_not_touch_cursor() {
        let config = InjectorConfig::new(CanaryConfig::new(CanaryMode::Range { start: 1, end: 3 }));
        let injector = CanaryInjector::new(config);

        assert!(injector.process_line("/no-query", 1).is_none());
        assert_eq!(injector.process_line("/a?id=0", 2).unwrap().line, "/a?id=1");
    }
}
