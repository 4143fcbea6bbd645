// Token allocation for Canary
// Produces the raw token for a line and wraps it with OAST domain, prefix and suffix

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;

use crate::models::{CanaryConfig, CanaryMode};

/// Hands out canary tokens to concurrent workers.
///
/// The range cursor is the only state shared between workers. It is advanced
/// with a single atomic fetch-and-increment, so no two calls ever observe the
/// same cursor value and the range is consumed round-robin regardless of
/// which worker asks first.
#[derive(Debug)]
pub struct TokenAllocator {
    config: CanaryConfig,
    cursor: AtomicUsize,
}

impl TokenAllocator {
    pub fn new(config: CanaryConfig) -> Self {
        Self {
            config,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &CanaryConfig {
        &self.config
    }

    /// Allocate the final token value for `line_number`
    pub fn allocate(&self, line_number: u64) -> String {
        let raw = self.raw_token(line_number);
        self.decorate(&raw)
    }

    /// Token before OAST wrapping and prefix/suffix
    pub fn raw_token(&self, line_number: u64) -> String {
        match &self.config.mode {
            CanaryMode::Timestamp => format!("{}{}", Utc::now().timestamp(), line_number),
            CanaryMode::Custom(value) => value.clone(),
            CanaryMode::Range { start, end } => {
                let cursor = self.cursor.fetch_add(1, Ordering::Relaxed);
                range_value(*start, *end, cursor)
            }
        }
    }

    /// Apply OAST wrapping, then prefix and suffix
    pub fn decorate(&self, token: &str) -> String {
        let wrapped = match &self.config.oast_domain {
            Some(domain) => format!("https://{}{}{}", token, self.config.delimiter, domain),
            None => token.to_string(),
        };
        format!("{}{}{}", self.config.prefix, wrapped, self.config.suffix)
    }
}

/// Value at `cursor` in the cyclic sequence `start, start+1, ..., end, start, ...`
fn range_value(start: i64, end: i64, cursor: usize) -> String {
    let len = (end as i128 - start as i128 + 1) as u128;
    let offset = (cursor as u128 % len) as i128;
    (start as i128 + offset).to_string()
}
