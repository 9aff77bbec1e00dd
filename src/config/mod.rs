use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::{Finding, Severity};

/// Top-level configuration from `.codewarden.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minimum severity that fails the scan at the CLI boundary.
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,
    /// Default language when the CLI does not pass one.
    #[serde(default)]
    pub language: Option<String>,
    /// Worker-pool bound for project scans.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Rule IDs excluded from scanning entirely.
    #[serde(default)]
    pub ignore_rules: HashSet<String>,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Wall-clock budget for the audit subprocess, in seconds.
    #[serde(default = "default_audit_timeout")]
    pub timeout_secs: u64,
}

fn default_fail_on() -> Severity {
    Severity::High
}

fn default_audit_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fail_on: default_fail_on(),
            language: None,
            threads: None,
            ignore_rules: HashSet::new(),
            audit: AuditConfig::default(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_audit_timeout(),
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// True when the finding set crosses the failure threshold.
    pub fn fails(&self, findings: &[Finding]) -> bool {
        findings.iter().any(|f| f.severity >= self.fail_on)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# codewarden configuration
# See https://github.com/limaronaldo/codewarden for documentation.

# Minimum severity to fail the scan (info, low, medium, high, critical).
fail_on = "high"

# Default language for extension filtering when none is passed.
# language = "typescript"

# Worker-pool bound for project scans (default: all cores).
# threads = 4

# Rule IDs to skip entirely.
# ignore_rules = ["DEBUG_LOGGING"]

[audit]
# Subprocess budget for `npm audit`, in seconds.
timeout_secs = 30
"#
    }
}
