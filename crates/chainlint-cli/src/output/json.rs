//! JSON output formatter for diagnostic display
//!
//! Provides structured JSON output for programmatic integration.

use chainlint_core::diagnostic::{Applicability, Diagnostic, Fix};
use chainlint_core::rules::{RuleRegistry, Severity};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Serialize)]
pub struct JsonOutput {
    pub version: &'static str,
    pub metadata: JsonMetadata,
    pub summary: JsonSummary,
    pub diagnostics: Vec<JsonDiagnostic>,
}

#[derive(Serialize)]
pub struct JsonMetadata {
    pub chainlint_version: &'static str,
    pub working_directory: String,
    pub analyzed_path: String,
}

#[derive(Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub files_with_issues: usize,
    pub total_diagnostics: usize,
    pub fixable: usize,
    pub fixed_files: usize,
    pub by_severity: SeverityCounts,
}

#[derive(Serialize, Default)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub hint: usize,
}

#[derive(Serialize)]
pub struct JsonDiagnostic {
    pub rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub severity: Severity,
    pub confidence: String,
    pub message: String,
    pub location: JsonLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<JsonFix>,
}

#[derive(Serialize)]
pub struct JsonLocation {
    pub file: String,
    pub start: JsonPosition,
    pub end: JsonPosition,
    pub span: JsonSpan,
}

#[derive(Serialize)]
pub struct JsonPosition {
    pub line: usize,
    pub column: usize,
}

#[derive(Serialize)]
pub struct JsonSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Serialize)]
pub struct JsonFix {
    pub title: String,
    pub applicability: Applicability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub start: JsonPosition,
    pub end: JsonPosition,
    pub new_text: String,
}

pub struct JsonFormatter<'a> {
    registry: Option<&'a RuleRegistry>,
    fixed_files: usize,
}

impl<'a> JsonFormatter<'a> {
    pub fn new() -> Self {
        Self {
            registry: None,
            fixed_files: 0,
        }
    }

    pub fn with_registry(registry: &'a RuleRegistry) -> Self {
        Self {
            registry: Some(registry),
            fixed_files: 0,
        }
    }

    pub fn with_fixed_files(mut self, fixed_files: usize) -> Self {
        self.fixed_files = fixed_files;
        self
    }

    pub fn format(
        &self,
        diagnostics: &[Diagnostic],
        total_files: usize,
        analyzed_path: &str,
    ) -> serde_json::Result<String> {
        let output = JsonOutput {
            version: "1.0",
            metadata: self.build_metadata(analyzed_path),
            summary: self.build_summary(diagnostics, total_files),
            diagnostics: diagnostics
                .iter()
                .map(|d| self.convert_diagnostic(d))
                .collect(),
        };
        serde_json::to_string_pretty(&output)
    }

    fn build_metadata(&self, analyzed_path: &str) -> JsonMetadata {
        JsonMetadata {
            chainlint_version: env!("CARGO_PKG_VERSION"),
            working_directory: std::env::current_dir()
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default(),
            analyzed_path: analyzed_path.to_string(),
        }
    }

    fn build_summary(&self, diagnostics: &[Diagnostic], total_files: usize) -> JsonSummary {
        let mut by_severity = SeverityCounts::default();
        let mut files_with_issues: HashSet<&str> = HashSet::new();

        for diag in diagnostics {
            match diag.severity {
                Severity::Error => by_severity.error += 1,
                Severity::Warning => by_severity.warning += 1,
                Severity::Info => by_severity.info += 1,
                Severity::Hint => by_severity.hint += 1,
            }
            files_with_issues.insert(&diag.file);
        }

        JsonSummary {
            total_files,
            files_with_issues: files_with_issues.len(),
            total_diagnostics: diagnostics.len(),
            fixable: diagnostics
                .iter()
                .filter(|d| d.automatic_fixes().next().is_some())
                .count(),
            fixed_files: self.fixed_files,
            by_severity,
        }
    }

    fn convert_diagnostic(&self, diag: &Diagnostic) -> JsonDiagnostic {
        JsonDiagnostic {
            rule_id: diag.rule_id.clone(),
            rule_name: self.rule_name(&diag.rule_id),
            message_id: diag.message_id.clone(),
            severity: diag.severity,
            confidence: format!("{:?}", diag.confidence).to_lowercase(),
            message: diag.message.clone(),
            location: JsonLocation {
                file: diag.file.clone(),
                start: JsonPosition {
                    line: diag.line,
                    column: diag.column,
                },
                end: JsonPosition {
                    line: diag.end_line,
                    column: diag.end_column,
                },
                span: JsonSpan {
                    start: diag.start,
                    end: diag.end,
                },
            },
            suggestion: diag.suggestion.clone(),
            fixes: diag.fixes.iter().map(convert_fix).collect(),
        }
    }

    fn rule_name(&self, rule_id: &str) -> Option<String> {
        self.registry
            .and_then(|registry| registry.rule_refs(rule_id))
            .map(|(_, name)| name.to_string())
    }
}

impl Default for JsonFormatter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn convert_fix(fix: &Fix) -> JsonFix {
    JsonFix {
        title: fix.title.clone(),
        applicability: fix.applicability,
        message_id: fix.message_id.clone(),
        start: JsonPosition {
            line: fix.line,
            column: fix.column,
        },
        end: JsonPosition {
            line: fix.end_line,
            column: fix.end_column,
        },
        new_text: fix.new_text().to_string(),
    }
}
