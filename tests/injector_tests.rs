/// Integration tests for the per-line injection pipeline
/// Covers parsing, token allocation and query mutation through CanaryInjector
use canary::models::{CanaryConfig, CanaryMode, InjectorConfig, MutationPolicy, TargetParams};
use canary::CanaryInjector;

fn config(mode: CanaryMode) -> InjectorConfig {
    InjectorConfig::new(CanaryConfig::new(mode))
}

fn custom(value: &str) -> InjectorConfig {
    config(CanaryMode::Custom(value.to_string()))
}

// ============================================
// Skipped lines
// ============================================

#[test]
fn test_line_without_query_is_skipped() {
    let injector = CanaryInjector::new(custom("tok"));
    assert!(injector.process_line("https://example.com/search", 1).is_none());
    assert!(injector.process_line("", 2).is_none());
}

#[test]
fn test_raw_mode_rejects_non_request_lines() {
    let mut cfg = custom("tok");
    cfg.raw_mode = true;
    let injector = CanaryInjector::new(cfg);

    assert!(injector.process_line("https://example.com/?q=1", 1).is_none());
    assert!(injector.process_line("Host: example.com", 2).is_none());
    // Request line shape but no query string
    assert!(injector.process_line("GET /search HTTP/1.1", 3).is_none());
}

#[test]
fn test_no_eligible_parameter_is_skipped() {
    let mut cfg = custom("tok");
    cfg.targets = TargetParams::from_csv("id");
    let injector = CanaryInjector::new(cfg);
    assert!(injector.process_line("/p?a=1&b=2", 1).is_none());
}

// ============================================
// Token strategies
// ============================================

#[test]
fn test_range_cycles_through_values() {
    let injector = CanaryInjector::new(config(CanaryMode::from_value("1-3")));
    let tokens: Vec<String> = (1..=4).map(|n| injector.allocate_token(n)).collect();
    assert_eq!(tokens, vec!["1", "2", "3", "1"]);
}

#[test]
fn test_malformed_range_is_literal() {
    let injector = CanaryInjector::new(config(CanaryMode::from_value("5-2")));
    for n in 1..=3 {
        assert_eq!(injector.allocate_token(n), "5-2");
    }
}

#[test]
fn test_oast_wrapping_before_prefix_and_suffix() {
    let mut cfg = custom("T");
    cfg.canary.delimiter = ".".to_string();
    cfg.canary.oast_domain = Some("x.oast.me".to_string());
    let injector = CanaryInjector::new(cfg.clone());
    assert_eq!(injector.allocate_token(1), "https://T.x.oast.me");

    cfg.canary.prefix = "\"".to_string();
    cfg.canary.suffix = "'".to_string();
    let injector = CanaryInjector::new(cfg);
    assert_eq!(injector.allocate_token(1), "\"https://T.x.oast.me'");
}

#[test]
fn test_timestamp_tokens_are_unique_per_line() {
    let injector = CanaryInjector::new(config(CanaryMode::Timestamp));
    let mut tokens: Vec<String> = (1..=50).map(|n| injector.allocate_token(n)).collect();
    tokens.sort();
    tokens.dedup();
    assert_eq!(tokens.len(), 50);
}

// ============================================
// Mutation policy
// ============================================

#[test]
fn test_keep_original_appends_token() {
    let mut cfg = custom("X");
    cfg.policy = MutationPolicy {
        keep_original: true,
        replace_all: false,
    };
    let injector = CanaryInjector::new(cfg);
    let result = injector.process_line("/item?id=7", 1).unwrap();
    assert_eq!(result.line, "/item?id=7X");
}

#[test]
fn test_first_parameter_only_by_default() {
    let injector = CanaryInjector::new(custom("X"));
    let result = injector.process_line("/p?a=1&b=2", 1).unwrap();
    assert_eq!(result.line, "/p?a=X&b=2");
}

#[test]
fn test_replace_all_parameters() {
    let mut cfg = custom("X");
    cfg.policy.replace_all = true;
    let injector = CanaryInjector::new(cfg);
    let result = injector.process_line("/p?a=1&b=2&a=3", 1).unwrap();
    assert_eq!(result.line, "/p?a=X&a=X&b=X");
}

#[test]
fn test_target_filter_regardless_of_replace_all() {
    for replace_all in [false, true] {
        let mut cfg = custom("X");
        cfg.targets = TargetParams::from_csv("b");
        cfg.policy.replace_all = replace_all;
        let injector = CanaryInjector::new(cfg);
        let result = injector.process_line("/p?a=1&b=2", 1).unwrap();
        assert_eq!(result.line, "/p?a=1&b=X");
    }
}

// ============================================
// End to end
// ============================================

#[test]
fn test_raw_request_line_end_to_end() {
    let mut cfg = custom("tok");
    cfg.raw_mode = true;
    let injector = CanaryInjector::new(cfg);
    let result = injector.process_line("GET /search?q=test HTTP/1.1", 1).unwrap();
    assert_eq!(result.line, "/search?q=tok");
    assert_eq!(result.log_entry, "GET /search?q=test HTTP/1.1 -> /search?q=tok");
}

#[test]
fn test_oast_token_is_percent_encoded_in_url() {
    let mut cfg = custom("abc");
    cfg.canary.oast_domain = Some(".oast.me".to_string());
    let injector = CanaryInjector::new(cfg);
    let result = injector
        .process_line("https://target.test/r?next=/home", 1)
        .unwrap();
    assert_eq!(result.line, "https://target.test/r?next=https%3A%2F%2Fabc.oast.me");
}

#[test]
fn test_processing_is_idempotent_for_custom_tokens() {
    let mut cfg = custom("tok");
    cfg.policy.replace_all = true;
    let injector = CanaryInjector::new(cfg);
    let line = "https://example.com/a?z=1&y=two%20words&z=3";
    let first = injector.process_line(line, 1).unwrap();
    let second = injector.process_line(line, 1).unwrap();
    assert_eq!(first, second);
}
