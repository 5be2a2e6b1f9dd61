//! Check command - analyzes JavaScript/TypeScript files for guard chains

use crate::output::OutputFormat;
use crate::output::json::JsonFormatter;
use crate::output::pretty::PrettyFormatter;
use anyhow::{Context, Result};
use chainlint_core::analysis::AnalysisEngine;
use chainlint_core::config::load_config_or_default_with_warnings;
use chainlint_core::diagnostic::Diagnostic;
use chainlint_core::fixer::apply_fixes_until_stable;
use chainlint_core::parser::ParsedFile;
use chainlint_core::rules::Severity;
use clap::Args;
use colored::Colorize;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const SUPPORTED_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to file or directory to analyze
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Apply automatic fixes and write the files back
    #[arg(long)]
    pub fix: bool,

    /// Output format for diagnostics
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Fail on warnings (exit code 1)
    #[arg(long)]
    pub fail_on_warnings: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

struct FileReport {
    path: String,
    content: String,
    diagnostics: Vec<Diagnostic>,
    fixed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
    pub fixed_files: usize,
}

impl CheckSummary {
    pub fn should_fail(&self, fail_on_warnings: bool) -> bool {
        self.errors > 0 || (fail_on_warnings && self.warnings > 0)
    }
}

impl CheckArgs {
    pub fn run(&self) -> Result<()> {
        let summary = self.execute()?;

        if summary.should_fail(self.fail_on_warnings) {
            process::exit(1);
        }

        Ok(())
    }

    pub fn execute(&self) -> Result<CheckSummary> {
        self.configure_colors();

        let config_result = load_config_or_default_with_warnings(&self.path);
        for warning in &config_result.warnings {
            eprintln!("{} {}", "warning:".yellow().bold(), warning);
        }
        let config = config_result.config;

        let files = discover_files(&self.path)?;
        if files.is_empty() {
            println!("No JavaScript/TypeScript files found.");
            return Ok(CheckSummary {
                files: 0,
                errors: 0,
                warnings: 0,
                fixed_files: 0,
            });
        }
        info!(files = files.len(), fix = self.fix, "checking files");

        let engine = AnalysisEngine::with_config(&config);
        let reports: Vec<FileReport> = files
            .par_iter()
            .map(|file| self.check_file(&engine, file))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        let fixed_files = reports.iter().filter(|r| r.fixed).count();
        let sources: HashMap<String, String> = reports
            .iter()
            .map(|r| (r.path.clone(), r.content.clone()))
            .collect();
        let diagnostics: Vec<Diagnostic> = reports
            .into_iter()
            .flat_map(|r| r.diagnostics)
            .collect();

        let summary = CheckSummary {
            files: files.len(),
            errors: count_severity(&diagnostics, Severity::Error),
            warnings: count_severity(&diagnostics, Severity::Warning),
            fixed_files,
        };

        match self.format {
            OutputFormat::Json => {
                let formatter =
                    JsonFormatter::with_registry(engine.registry()).with_fixed_files(fixed_files);
                let analyzed_path = self.path.to_string_lossy();
                println!(
                    "{}",
                    formatter.format(&diagnostics, summary.files, &analyzed_path)?
                );
            }
            OutputFormat::Text => self.output_text(&diagnostics),
            OutputFormat::Pretty => {
                print!("{}", PrettyFormatter::with_sources(sources).format(&diagnostics));
            }
        }

        if self.fix && fixed_files > 0 && self.format != OutputFormat::Json {
            println!("Fixed {} file(s)", fixed_files);
        }

        Ok(summary)
    }

    /// `None` when the file cannot be read; the run continues without it.
    fn check_file(&self, engine: &AnalysisEngine, file: &Path) -> Result<Option<FileReport>> {
        let path = file.to_string_lossy().to_string();
        let mut content = match fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                warn!(file = %path, error = %e, "skipping unreadable file");
                return Ok(None);
            }
        };

        let mut fixed = false;
        if self.fix {
            let result = apply_fixes_until_stable(engine, &path, &content, false);
            if result.changed() {
                fs::write(file, &result.output)
                    .with_context(|| format!("Failed to write fixed file {}", path))?;
                debug!(file = %path, applied = result.applied, "wrote fixes");
                content = result.output;
                fixed = true;
            }
        }

        let parsed = ParsedFile::from_source(&path, &content);
        let diagnostics = engine.analyze(&parsed);

        Ok(Some(FileReport {
            path,
            content,
            diagnostics,
            fixed,
        }))
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env {
            colored::control::set_override(false);
        }
    }

    fn output_text(&self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
                Severity::Info => "info".blue().bold(),
                Severity::Hint => "hint".cyan().bold(),
            };

            println!(
                "{}:{}:{}: {} [{}]: {}",
                diag.file,
                diag.line,
                diag.column,
                severity_str,
                diag.rule_id.dimmed(),
                diag.message
            );

            if let Some(suggestion) = &diag.suggestion {
                println!("  {} {}", "suggestion:".green(), suggestion);
            }
        }

        if !diagnostics.is_empty() {
            println!();
            println!(
                "Found {} error(s) and {} warning(s)",
                count_severity(diagnostics, Severity::Error),
                count_severity(diagnostics, Severity::Warning)
            );
        }
    }
}

fn count_severity(diagnostics: &[Diagnostic], severity: Severity) -> usize {
    diagnostics.iter().filter(|d| d.severity == severity).count()
}

fn discover_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    if path.is_file() {
        if is_supported_file(path) {
            return Ok(vec![path.to_path_buf()]);
        } else {
            return Ok(vec![]);
        }
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_supported_file(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();

    Ok(files)
}

fn is_supported_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || name == "node_modules")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::File;
    use tempfile::tempdir;

    fn args_for(path: &Path, format: OutputFormat) -> CheckArgs {
        CheckArgs {
            path: path.to_path_buf(),
            fix: false,
            format,
            fail_on_warnings: false,
            no_color: true,
        }
    }

    #[test]
    fn discover_files_finds_single_js_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.js");
        File::create(&file_path).unwrap();

        let files = discover_files(&file_path).unwrap();

        assert_eq!(files, vec![file_path]);
    }

    #[test]
    fn discover_files_finds_files_in_directory() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("a.js")).unwrap();
        File::create(dir.path().join("b.ts")).unwrap();
        File::create(dir.path().join("c.tsx")).unwrap();
        File::create(dir.path().join("readme.md")).unwrap();

        let files = discover_files(dir.path()).unwrap();

        assert_eq!(files.len(), 3);
    }

    #[test]
    fn discover_files_skips_hidden_and_node_modules() {
        let dir = tempdir().unwrap();
        for skipped in [".git", "node_modules"] {
            let sub = dir.path().join(skipped);
            fs::create_dir(&sub).unwrap();
            File::create(sub.join("index.js")).unwrap();
        }
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        File::create(src.join("main.ts")).unwrap();

        let files = discover_files(dir.path()).unwrap();

        assert_eq!(files, vec![src.join("main.ts")]);
    }

    #[test]
    fn discover_files_errors_on_missing_path() {
        let dir = tempdir().unwrap();

        assert!(discover_files(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn is_supported_file_checks_extensions() {
        for ext in SUPPORTED_EXTENSIONS {
            assert!(is_supported_file(Path::new(&format!("test.{}", ext))));
        }
        assert!(!is_supported_file(Path::new("test.md")));
        assert!(!is_supported_file(Path::new("test.rs")));
    }

    #[test]
    fn summary_fails_on_errors_or_requested_warnings() {
        let summary = CheckSummary {
            files: 1,
            errors: 0,
            warnings: 2,
            fixed_files: 0,
        };

        assert!(!summary.should_fail(false));
        assert!(summary.should_fail(true));
        assert!(CheckSummary { errors: 1, ..summary }.should_fail(false));
    }

    #[test]
    #[serial]
    fn check_reports_warnings_without_touching_files() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.ts");
        let source = "declare const foo: { bar: number } | null;\nfoo && foo.bar;\n";
        fs::write(&file_path, source).unwrap();

        let summary = args_for(dir.path(), OutputFormat::Json).execute().unwrap();

        assert_eq!(summary.files, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.fixed_files, 0);
        assert_eq!(fs::read_to_string(&file_path).unwrap(), source);
    }

    #[test]
    #[serial]
    fn check_with_fix_rewrites_files() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.ts");
        fs::write(
            &file_path,
            "declare const foo: { bar: number } | null;\nfoo && foo.bar;\n",
        )
        .unwrap();

        let args = CheckArgs {
            fix: true,
            ..args_for(dir.path(), OutputFormat::Text)
        };
        let summary = args.execute().unwrap();

        assert_eq!(summary.fixed_files, 1);
        assert_eq!(summary.warnings, 0);
        assert_eq!(
            fs::read_to_string(&file_path).unwrap(),
            "declare const foo: { bar: number } | null;\nfoo?.bar;\n"
        );
    }

    #[test]
    #[serial]
    fn fix_leaves_suggestions_in_place() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.js");
        fs::write(&file_path, "foo && foo.bar;\n").unwrap();

        let args = CheckArgs {
            fix: true,
            ..args_for(&file_path, OutputFormat::Pretty)
        };
        let summary = args.execute().unwrap();

        assert_eq!(summary.fixed_files, 0);
        assert_eq!(summary.warnings, 1);
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "foo && foo.bar;\n");
    }

    #[test]
    #[serial]
    fn config_file_options_are_applied() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("chainlint.toml"),
            "[rules.prefer-optional-chain]\nrequireNullish = true\n",
        )
        .unwrap();
        fs::write(dir.path().join("test.js"), "foo && foo.bar;\n").unwrap();

        let summary = args_for(dir.path(), OutputFormat::Json).execute().unwrap();

        assert_eq!(summary.warnings, 0);
    }

    #[test]
    #[serial]
    fn parse_errors_count_as_errors() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("broken.js"), "const = ;\n").unwrap();

        let summary = args_for(dir.path(), OutputFormat::Text).execute().unwrap();

        assert!(summary.errors > 0);
        assert!(summary.should_fail(false));
    }
}
