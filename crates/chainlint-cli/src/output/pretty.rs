//! Pretty formatter for human-readable terminal output
//!
//! Displays diagnostics with colors, source code context, the proposed
//! rewrite, and a summary.

use chainlint_core::diagnostic::Diagnostic;
use chainlint_core::rules::Severity;
use colored::{ColoredString, Colorize};
use std::collections::HashMap;

pub struct PrettyFormatter {
    sources: HashMap<String, String>,
}

impl PrettyFormatter {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    pub fn with_sources(sources: HashMap<String, String>) -> Self {
        Self { sources }
    }

    pub fn format(&self, diagnostics: &[Diagnostic]) -> String {
        let mut output = String::new();

        for diag in diagnostics {
            output.push_str(&self.format_diagnostic(diag));
            output.push('\n');
        }

        if !diagnostics.is_empty() {
            output.push_str(&self.format_summary(diagnostics));
        }

        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut lines = Vec::new();

        let header = format!(
            "{}[{}]: {}",
            self.colorize_severity(&diag.severity),
            diag.rule_id.dimmed(),
            diag.message
        );
        lines.push(header);
        lines.push(format!(
            "  {} {}:{}:{}",
            "-->".blue(),
            diag.file,
            diag.line,
            diag.column
        ));

        let padding = " ".repeat(diag.line.to_string().len());

        if let Some(source_line) = self.get_source_line(&diag.file, diag.line) {
            lines.push(format!("{} {}", padding, "|".blue()));
            lines.push(format!(
                "{} {} {}",
                diag.line.to_string().blue(),
                "|".blue(),
                source_line
            ));

            let caret_len = if diag.end_column > diag.column && diag.end_line == diag.line {
                diag.end_column - diag.column
            } else {
                source_line
                    .chars()
                    .count()
                    .saturating_sub(diag.column.saturating_sub(1))
            };
            lines.push(format!(
                "{} {} {}{}",
                padding,
                "|".blue(),
                " ".repeat(diag.column.saturating_sub(1)),
                "^".repeat(caret_len.max(1)).red()
            ));
            lines.push(format!("{} {}", padding, "|".blue()));
        }

        for fix in &diag.fixes {
            let label = if fix.is_automatic() {
                "fix:".green()
            } else {
                "suggestion:".yellow()
            };
            lines.push(format!(
                "{} {} {} {}",
                padding,
                "=".blue(),
                label,
                fix.new_text()
            ));
        }

        lines.join("\n")
    }

    fn colorize_severity(&self, severity: &Severity) -> ColoredString {
        match severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
            Severity::Hint => "hint".cyan().bold(),
        }
    }

    fn get_source_line(&self, file: &str, line: usize) -> Option<&str> {
        self.sources
            .get(file)
            .and_then(|source| source.lines().nth(line.checked_sub(1)?))
    }

    fn format_summary(&self, diagnostics: &[Diagnostic]) -> String {
        let error_count = diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error))
            .count();
        let warning_count = diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Warning))
            .count();
        let fixable = diagnostics
            .iter()
            .filter(|d| d.automatic_fixes().next().is_some())
            .count();

        let total = diagnostics.len();
        let problems_str = if total == 1 { "problem" } else { "problems" };
        let errors_str = plural(error_count, "error");
        let warnings_str = plural(warning_count, "warning");

        let mut summary = format!(
            "\nFound {} {} ({}, {})\n",
            total.to_string().bold(),
            problems_str,
            errors_str.red(),
            warnings_str.yellow()
        );
        if fixable > 0 {
            summary.push_str(&format!(
                "{} fixable with {}\n",
                fixable.to_string().bold(),
                "--fix".green()
            ));
        }
        summary
    }
}

impl Default for PrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainlint_core::diagnostic::{Applicability, Fix};

    const SOURCE: &str = "const a = 1;\nfoo && foo.bar;\nconst b = 2;";

    fn create_test_diagnostic(severity: Severity, line: usize, column: usize) -> Diagnostic {
        Diagnostic::new(
            "Q022",
            severity,
            "Prefer using an optional chain expression instead",
            "test.js",
            line,
            column,
        )
        .with_end(line, column + 14)
    }

    fn sources() -> HashMap<String, String> {
        HashMap::from([("test.js".to_string(), SOURCE.to_string())])
    }

    #[test]
    fn pretty_format_single_diagnostic() {
        let diag = create_test_diagnostic(Severity::Warning, 2, 1);

        let output = PrettyFormatter::with_sources(sources()).format(&[diag]);

        assert!(output.contains("warning"));
        assert!(output.contains("Q022"));
        assert!(output.contains("optional chain"));
        assert!(output.contains("test.js:2:1"));
        assert!(output.contains("foo && foo.bar;"));
    }

    #[test]
    fn colors_match_severity() {
        let formatter = PrettyFormatter::new();

        assert_eq!(
            formatter.colorize_severity(&Severity::Error).to_string(),
            "error".red().bold().to_string()
        );
        assert_eq!(
            formatter.colorize_severity(&Severity::Warning).to_string(),
            "warning".yellow().bold().to_string()
        );
    }

    #[test]
    fn caret_covers_the_chain() {
        colored::control::set_override(false);
        let diag = create_test_diagnostic(Severity::Warning, 2, 1);

        let output = PrettyFormatter::with_sources(sources()).format(&[diag]);

        assert!(output.contains(&format!("| {}", "^".repeat(14))));
    }

    #[test]
    fn shows_fix_and_suggestion_lines() {
        let fix = Fix::replace("Use an optional chain", "foo?.bar", 2, 1, 2, 15);
        let suggestion = fix.clone().with_applicability(Applicability::Suggestion);
        let diags = vec![
            create_test_diagnostic(Severity::Warning, 2, 1).with_fix(fix),
            create_test_diagnostic(Severity::Warning, 2, 1).with_fix(suggestion),
        ];

        let output = PrettyFormatter::with_sources(sources()).format(&diags);

        assert!(output.contains("fix:"));
        assert!(output.contains("suggestion:"));
        assert!(output.contains("foo?.bar"));
        assert!(output.contains("fixable with"));
    }

    #[test]
    fn shows_summary() {
        let diags = vec![
            create_test_diagnostic(Severity::Error, 1, 2),
            create_test_diagnostic(Severity::Warning, 2, 1),
            create_test_diagnostic(Severity::Warning, 3, 2),
        ];

        let output = PrettyFormatter::new().format(&diags);

        assert!(output.contains("problems"));
        assert!(output.contains("1 error"));
        assert!(output.contains("2 warnings"));
        assert!(!output.contains("fixable"));
    }

    #[test]
    fn empty_diagnostics_produces_empty_output() {
        assert!(PrettyFormatter::new().format(&[]).is_empty());
    }

    #[test]
    fn handles_missing_source() {
        let diag = create_test_diagnostic(Severity::Warning, 1, 2);

        let output = PrettyFormatter::new().format(&[diag]);

        assert!(output.contains("Q022"));
        assert!(!output.contains('^'));
    }
}
