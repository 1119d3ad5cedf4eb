//! Per-session active-rule tracking.
//!
//! The engine must see each activation exactly once; the local set lets the
//! service answer repeat activations without an engine round trip and catch
//! deactivations of rules that were never activated.

use std::collections::HashSet;

/// Set of rule names currently active for one grammar session.
///
/// Not internally synchronized; it lives inside the session and shares the
/// session's lock.
#[derive(Debug, Default)]
pub struct ActiveRuleSet {
    rules: HashSet<String>,
}

impl ActiveRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the rule is currently active.
    pub fn contains(&self, rule: &str) -> bool {
        self.rules.contains(rule)
    }

    /// Record an activation. Returns `false` if the rule was already active.
    pub fn insert(&mut self, rule: &str) -> bool {
        self.rules.insert(rule.to_string())
    }

    /// Record a deactivation. Returns `false` if the rule was not active.
    pub fn remove(&mut self, rule: &str) -> bool {
        self.rules.remove(rule)
    }

    /// Clear the set, returning the rules that were active. Used on unload,
    /// where remaining activations are implicitly dropped.
    pub fn drain(&mut self) -> Vec<String> {
        self.rules.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
