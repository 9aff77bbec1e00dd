use serde::{Deserialize, Serialize};

/// A concrete match of a rule against a unit of text, with position and
/// remediation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Unique within one report (per-rule ordinal, e.g. "SQL_INJECTION-2").
    pub id: String,
    /// Severity level, copied from the rule.
    pub severity: Severity,
    /// Vulnerability category, copied from the rule.
    pub category: Category,
    /// Human-readable rule name.
    pub title: String,
    /// What was detected and why it matters.
    pub description: String,
    /// File the match was found in ("inline" scans use the supplied label).
    pub file: String,
    /// 1-based line of the match start.
    pub line: usize,
    /// 1-based column of the match start within its line.
    pub column: usize,
    /// 1-based line of the match end.
    pub end_line: usize,
    /// 1-based column of the match end.
    pub end_column: usize,
    /// Trimmed source line containing the match start.
    pub code_snippet: String,
    /// Suggested remediation.
    pub fix: Option<String>,
    /// CWE/OWASP/advisory lookup URLs.
    pub references: Vec<String>,
    /// CWE identifier (e.g. "CWE-798").
    pub cwe: Option<String>,
    /// OWASP Top-10 identifier (e.g. "A07:2021").
    pub owasp: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" | "moderate" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }

    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Vulnerability taxonomy category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Secrets,
    Injection,
    Cryptography,
    Configuration,
    Disclosure,
    Dependencies,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secrets => write!(f, "Secrets"),
            Self::Injection => write!(f, "Injection"),
            Self::Cryptography => write!(f, "Cryptography"),
            Self::Configuration => write!(f, "Configuration"),
            Self::Disclosure => write!(f, "Disclosure"),
            Self::Dependencies => write!(f, "Dependencies"),
        }
    }
}

/// Per-severity finding counts for one report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl Summary {
    /// Tally a finding set. The report invariant is that this is always
    /// recomputed from the full finding list, never incremented ad hoc.
    pub fn tally(findings: &[Finding]) -> Self {
        let mut summary = Self::default();
        for finding in findings {
            *summary.slot_mut(finding.severity) += 1;
        }
        summary
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }

    fn slot_mut(&mut self, severity: Severity) -> &mut usize {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
            Severity::Info => &mut self.info,
        }
    }
}

/// Static catalog metadata for one rule, used for `list-rules` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSummary {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub severity: Severity,
    pub description: String,
}
