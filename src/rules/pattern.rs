use regex::{Regex, RegexBuilder};

use crate::error::{Result, WardenError};

/// Compiled size cap. A rule whose pattern exceeds this fails at catalog
/// construction instead of degrading scan time later.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;
const DFA_SIZE_LIMIT: usize = 1 << 21;

/// A compiled rule pattern.
///
/// Matching always enumerates every non-overlapping occurrence, left to
/// right, via [`RulePattern::matches`]. There is no single-match entry
/// point, so "search all occurrences" is a structural property of the type
/// rather than per-rule authoring discipline. The underlying engine is
/// finite-automaton based and cannot backtrack catastrophically.
#[derive(Debug, Clone)]
pub struct RulePattern {
    regex: Regex,
}

/// Byte span of one occurrence within the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    pub start: usize,
    pub end: usize,
}

impl RulePattern {
    /// Compile a pattern for a rule. `rule_id` is only used to attribute
    /// compile failures.
    pub fn compile(rule_id: &str, pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .size_limit(PATTERN_SIZE_LIMIT)
            .dfa_size_limit(DFA_SIZE_LIMIT)
            .build()
            .map_err(|e| WardenError::Pattern {
                rule_id: rule_id.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { regex })
    }

    /// All occurrences of the pattern in `text`, in offset order.
    pub fn matches<'t>(&'t self, text: &'t str) -> impl Iterator<Item = PatternMatch> + 't {
        self.regex.find_iter(text).map(|m| PatternMatch {
            start: m.start(),
            end: m.end(),
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
