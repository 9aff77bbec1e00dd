//! Decomposes unified-diff text into added and removed line sets.

/// Line content extracted from a unified diff, header characters stripped,
/// in original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffLines {
    pub added: Vec<String>,
    /// Retained for change context; never scanned.
    pub removed: Vec<String>,
}

/// Classify each diff line. A line is added when it starts with a single
/// `+` and is not the `+++` file header; removed analogously for `-`/`---`.
pub fn extract(diff_text: &str) -> DiffLines {
    let mut lines = DiffLines::default();

    for line in diff_text.lines() {
        if let Some(rest) = line.strip_prefix('+') {
            if !line.starts_with("+++") {
                lines.added.push(rest.to_string());
            }
        } else if let Some(rest) = line.strip_prefix('-') {
            if !line.starts_with("---") {
                lines.removed.push(rest.to_string());
            }
        }
    }

    lines
}
