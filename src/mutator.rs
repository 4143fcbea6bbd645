// Query mutation for Canary
// Decides which parameter values receive the token and rebuilds the query string

use std::collections::HashMap;

use url::form_urlencoded;

use crate::models::{MutationPolicy, TargetParams};
use crate::parsers::RequestTarget;

/// Query parameters in first-appearance order.
///
/// Repeated keys are folded into one entry whose values keep their original
/// order, so `a=1&b=2&a=3` becomes `[("a", ["1", "3"]), ("b", ["2"])]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
    /// Position of each key in `entries`
    index: HashMap<String, usize>,
}

impl QueryParams {
    /// Decode an `application/x-www-form-urlencoded` query string
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.push(key.into_owned(), value.into_owned());
        }
        params
    }

    pub fn push(&mut self, key: String, value: String) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1.push(value),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, vec![value]));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        let pos = *self.index.get(key)?;
        Some(self.entries[pos].1.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Percent-encode back into a query string, keys grouped in first-appearance order
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.entries {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    /// Rewrite eligible values with `token`; returns how many values changed
    fn apply(&mut self, token: &str, targets: &TargetParams, policy: MutationPolicy) -> usize {
        let mut changed = 0;
        for (key, values) in self.entries.iter_mut() {
            if !targets.matches(key) {
                continue;
            }
            for value in values.iter_mut() {
                if policy.keep_original {
                    value.push_str(token);
                } else {
                    *value = token.to_string();
                }
                changed += 1;
                if !policy.replace_all {
                    return changed;
                }
            }
        }
        changed
    }
}

/// Applies the target filter and mutation policy to one request target
#[derive(Debug, Clone, Default)]
pub struct QueryMutator {
    targets: TargetParams,
    policy: MutationPolicy,
}

impl QueryMutator {
    pub fn new(targets: TargetParams, policy: MutationPolicy) -> Self {
        Self { targets, policy }
    }

    /// Inject `token` into the query of `target`.
    ///
    /// Returns `base?query` with the mutated query, or `None` when no
    /// parameter was eligible.
    pub fn mutate(&self, target: &RequestTarget<'_>, token: &str) -> Option<String> {
        let mut params = QueryParams::parse(target.query);
        if params.apply(token, &self.targets, self.policy) == 0 {
            return None;
        }
        Some(format!("{}?{}", target.base, params.encode()))
    }
}
