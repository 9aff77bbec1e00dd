//! Applies one rule's pattern against one unit of text.

use crate::rules::{Finding, Rule};

/// Run `rule` against `text`, producing one finding per occurrence.
///
/// Line and column are derived from the absolute match offset: the line is
/// the count of line terminators before the match start plus one, and the
/// column is the offset from the start of that line. The matched substring
/// is never re-located within the line, which would pick the wrong position
/// when the substring recurs earlier on the same line.
///
/// Finding ids carry the bare rule id here; the report builder appends the
/// per-rule ordinal once the full finding set is known.
pub fn apply(rule: &Rule, text: &str, file: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut cursor = LineCursor::new(text);

    for m in rule.pattern.matches(text) {
        let (line, column) = cursor.position(m.start);
        let snippet = cursor.line_text(m.start).trim().to_string();
        let (end_line, end_column) = cursor.position(m.end);

        findings.push(Finding {
            id: rule.id.clone(),
            severity: rule.severity,
            category: rule.category,
            title: rule.name.clone(),
            description: rule.message.clone(),
            file: file.to_string(),
            line,
            column,
            end_line,
            end_column,
            code_snippet: snippet,
            fix: rule.fix.clone(),
            references: references(rule),
            cwe: rule.cwe.clone(),
            owasp: rule.owasp.clone(),
        });
    }

    findings
}

fn references(rule: &Rule) -> Vec<String> {
    let mut refs = Vec::new();
    if let Some(cwe) = &rule.cwe {
        if let Some(num) = cwe.strip_prefix("CWE-") {
            refs.push(format!("https://cwe.mitre.org/data/definitions/{num}.html"));
        }
    }
    if let Some(owasp) = &rule.owasp {
        refs.push(format!("https://owasp.org/Top10/#{owasp}"));
    }
    refs
}

/// Incremental offset-to-position translator.
///
/// Match offsets from `find_iter` are non-decreasing, so each lookup only
/// advances from the previous one instead of rescanning the text.
struct LineCursor<'t> {
    text: &'t str,
    offset: usize,
    line: usize,
    line_start: usize,
}

impl<'t> LineCursor<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            text,
            offset: 0,
            line: 1,
            line_start: 0,
        }
    }

    /// 1-based (line, column) of a byte offset at or after the last query.
    fn position(&mut self, target: usize) -> (usize, usize) {
        debug_assert!(target >= self.offset, "offsets must be non-decreasing");
        for (i, b) in self.text.as_bytes()[self.offset..target].iter().enumerate() {
            if *b == b'\n' {
                self.line += 1;
                self.line_start = self.offset + i + 1;
            }
        }
        self.offset = target;
        (self.line, target - self.line_start + 1)
    }

    /// Full text of the line containing `offset`. Must be called with the
    /// same offset as the preceding `position` query.
    fn line_text(&self, offset: usize) -> &'t str {
        let end = self.text[offset..]
            .find('\n')
            .map(|i| offset + i)
            .unwrap_or(self.text.len());
        &self.text[self.line_start..end]
    }
}
