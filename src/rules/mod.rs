pub mod builtin;
pub mod finding;
pub mod pattern;

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::Result;

pub use finding::{Category, Finding, RuleSummary, Severity, Summary};
pub use pattern::{PatternMatch, RulePattern};

/// A named vulnerability signature: compiled pattern plus taxonomy metadata.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Stable identifier (e.g. "HARDCODED_SECRET").
    pub id: String,
    /// Human-readable rule name.
    pub name: String,
    pub category: Category,
    pub severity: Severity,
    pub pattern: RulePattern,
    /// Finding description template.
    pub message: String,
    pub cwe: Option<String>,
    pub owasp: Option<String>,
    pub fix: Option<String>,
}

/// Declarative form of a rule, compiled into a [`Rule`] when the catalog
/// is built.
#[derive(Debug, Clone)]
pub struct RuleDef {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub severity: Severity,
    pub pattern: &'static str,
    pub message: &'static str,
    pub cwe: Option<&'static str>,
    pub owasp: Option<&'static str>,
    pub fix: Option<&'static str>,
}

/// Immutable registry of vulnerability signatures.
///
/// Built once, then shared by reference across any number of concurrent
/// scans. There is no mutation path after construction.
#[derive(Debug)]
pub struct RuleCatalog {
    rules: Vec<Rule>,
}

static BUILTIN_CATALOG: Lazy<Arc<RuleCatalog>> = Lazy::new(|| {
    Arc::new(
        RuleCatalog::from_defs(&builtin::defs())
            .expect("builtin rule patterns are valid"),
    )
});

/// The process-wide builtin catalog, compiled on first use.
pub fn builtin_catalog() -> Arc<RuleCatalog> {
    Arc::clone(&BUILTIN_CATALOG)
}

impl RuleCatalog {
    /// Compile a catalog from rule definitions. Fails if any pattern does
    /// not compile within the configured size limits.
    pub fn from_defs(defs: &[RuleDef]) -> Result<Self> {
        let mut rules = Vec::with_capacity(defs.len());
        for def in defs {
            rules.push(Rule {
                id: def.id.into(),
                name: def.name.into(),
                category: def.category,
                severity: def.severity,
                pattern: RulePattern::compile(def.id, def.pattern)?,
                message: def.message.into(),
                cwe: def.cwe.map(Into::into),
                owasp: def.owasp.map(Into::into),
                fix: def.fix.map(Into::into),
            });
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rules that pass both narrowing filters. An empty `rule_ids` or
    /// `severities` slice means that filter is absent; both are ANDed.
    pub fn active_rules(&self, rule_ids: &[String], severities: &[Severity]) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| rule_ids.is_empty() || rule_ids.iter().any(|id| id == &r.id))
            .filter(|r| severities.is_empty() || severities.contains(&r.severity))
            .collect()
    }

    /// Static metadata for every rule, independent of compiled matchers.
    pub fn list(&self) -> Vec<RuleSummary> {
        self.rules
            .iter()
            .map(|r| RuleSummary {
                id: r.id.clone(),
                name: r.name.clone(),
                category: r.category,
                severity: r.severity,
                description: r.message.clone(),
            })
            .collect()
    }
}
