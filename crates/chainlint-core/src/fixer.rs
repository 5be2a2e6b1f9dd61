//! Applies diagnostic fixes to source text.
//!
//! Edits are applied in start order; an edit overlapping one already taken is
//! skipped and left for the next pass.

use tracing::debug;

use crate::analysis::AnalysisEngine;
use crate::diagnostic::{Diagnostic, Fix};
use crate::parser::{ParsedFile, Parser};

pub const MAX_PASSES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutput {
    pub output: String,
    pub applied: usize,
    pub skipped: usize,
}

impl FixOutput {
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// One pass over `diagnostics`. Suggestions are only taken when
/// `include_suggestions` is set.
pub fn apply_fixes(source: &str, diagnostics: &[Diagnostic], include_suggestions: bool) -> FixOutput {
    let mut fixes: Vec<&Fix> = diagnostics
        .iter()
        .flat_map(|d| d.fixes.iter())
        .filter(|fix| include_suggestions || fix.is_automatic())
        .filter(|fix| fix.start <= fix.end && fix.end <= source.len())
        .collect();
    fixes.sort_by_key(|fix| (fix.start, fix.end));

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    let mut applied = 0;
    let mut skipped = 0;

    for fix in fixes {
        if fix.start < cursor || !source.is_char_boundary(fix.start) || !source.is_char_boundary(fix.end) {
            skipped += 1;
            continue;
        }
        output.push_str(&source[cursor..fix.start]);
        output.push_str(fix.new_text());
        cursor = fix.end;
        applied += 1;
    }
    output.push_str(&source[cursor..]);

    FixOutput {
        output,
        applied,
        skipped,
    }
}

/// Re-analyzes and re-applies until nothing changes, the output stops
/// parsing, or [`MAX_PASSES`] is reached.
pub fn apply_fixes_until_stable(
    engine: &AnalysisEngine,
    filename: &str,
    source: &str,
    include_suggestions: bool,
) -> FixOutput {
    let parser = Parser::for_file(filename);
    let mut current = source.to_string();
    let mut applied = 0;
    let mut skipped = 0;

    for pass in 1..=MAX_PASSES {
        let file = ParsedFile::from_source(filename, &current);
        let diagnostics = engine.analyze(&file);
        let result = apply_fixes(&current, &diagnostics, include_suggestions);
        skipped = result.skipped;

        if !result.changed() {
            break;
        }
        if let Err(error) = parser.parse_module(&result.output) {
            debug!(
                file = filename,
                pass,
                error = %error.message,
                "fixed output does not parse, keeping previous pass"
            );
            break;
        }

        debug!(file = filename, pass, applied = result.applied, "applied fixes");
        applied += result.applied;
        current = result.output;
    }

    FixOutput {
        output: current,
        applied,
        skipped,
    }
}
