use crate::error::Result;
use crate::scan::Report;

/// Render a report as pretty-printed JSON.
pub fn render(report: &Report) -> Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{ScanRequest, Scanner};

    #[test]
    fn report_round_trips_through_json() {
        let report = Scanner::new()
            .scan(&ScanRequest {
                inline_content: Some("eval(JSON.parse(x))".to_string()),
                file_path: Some("api.ts".to_string()),
                language: Some("typescript".to_string()),
                ..Default::default()
            })
            .unwrap();

        let rendered = render(&report).unwrap();
        let parsed: Report = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.report_id, report.report_id);
        assert_eq!(parsed.findings, report.findings);
        assert_eq!(parsed.summary, report.summary);
    }
}
