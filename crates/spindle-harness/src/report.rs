//! Campaign summaries in JSON and markdown.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::HarnessError;
use crate::runner::CaseResult;
use crate::structured_log::now_utc;

/// Summary of one soak campaign: counts plus every per-case result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoakReport {
    pub campaign: String,
    pub profile: String,
    pub generated_at: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub cases: Vec<CaseResult>,
}

impl SoakReport {
    /// Assemble a report from a finished run.
    #[must_use]
    pub fn from_results(
        campaign: impl Into<String>,
        profile: impl Into<String>,
        cases: Vec<CaseResult>,
    ) -> Self {
        let passed = cases.iter().filter(|case| case.passed).count();
        Self {
            campaign: campaign.into(),
            profile: profile.into(),
            generated_at: now_utc(),
            total: cases.len(),
            passed,
            failed: cases.len() - passed,
            cases,
        }
    }

    /// True when every case passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Render a markdown summary with one table row per case.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Soak report: {}\n\n", self.campaign));
        out.push_str(&format!("- profile: {}\n", self.profile));
        out.push_str(&format!("- generated: {}\n", self.generated_at));
        out.push_str(&format!(
            "- cases: {} total, {} passed, {} failed\n\n",
            self.total, self.passed, self.failed
        ));
        out.push_str("| case | outcome | elapsed (ms) | detail |\n");
        out.push_str("|------|---------|--------------|--------|\n");
        for case in &self.cases {
            let outcome = if case.passed { "pass" } else { "fail" };
            let detail = case.detail.as_deref().unwrap_or("");
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                case.case_name, outcome, case.elapsed_ms, detail
            ));
        }
        out
    }

    /// Write the JSON form to `path`.
    pub fn write_json(&self, path: &Path) -> Result<(), HarnessError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a report previously written by [`write_json`](Self::write_json).
    pub fn from_json_file(path: &Path) -> Result<Self, HarnessError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cases() -> Vec<CaseResult> {
        vec![
            CaseResult {
                case_name: "spawn_join_storm".to_string(),
                passed: true,
                detail: None,
                elapsed_ms: 120,
            },
            CaseResult {
                case_name: "exit_code_matrix".to_string(),
                passed: false,
                detail: Some("exit code 42 came back as 0".to_string()),
                elapsed_ms: 3,
            },
        ]
    }

    #[test]
    fn counts_reflect_the_case_list() {
        let report = SoakReport::from_results("nightly", "standard", sample_cases());
        assert_eq!(report.total, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.all_passed());
    }

    #[test]
    fn markdown_lists_every_case() {
        let report = SoakReport::from_results("nightly", "standard", sample_cases());
        let markdown = report.to_markdown();

        assert!(markdown.starts_with("# Soak report: nightly\n"));
        assert!(markdown.contains("- profile: standard\n"));
        assert!(markdown.contains("| spawn_join_storm | pass | 120 |  |"));
        assert!(markdown.contains("| exit_code_matrix | fail | 3 | exit code 42 came back as 0 |"));
    }

    #[test]
    fn reports_round_trip_through_json() {
        let report = SoakReport::from_results("nightly", "quick", sample_cases());
        let json = serde_json::to_string(&report).expect("serializable");
        let parsed: SoakReport = serde_json::from_str(&json).expect("deserializable");

        assert_eq!(parsed.campaign, "nightly");
        assert_eq!(parsed.profile, "quick");
        assert_eq!(parsed.total, report.total);
        assert_eq!(parsed.cases.len(), 2);
        assert_eq!(parsed.cases[1].detail, report.cases[1].detail);
    }

    #[test]
    fn json_files_round_trip_on_disk() {
        let path =
            std::env::temp_dir().join(format!("spindle-report-{}.json", std::process::id()));
        let report = SoakReport::from_results("nightly", "quick", sample_cases());

        report.write_json(&path).expect("report writes");
        let parsed = SoakReport::from_json_file(&path).expect("report reads back");
        let _ = std::fs::remove_file(&path);

        assert_eq!(parsed.campaign, report.campaign);
        assert_eq!(parsed.failed, 1);
    }
}
