//! Analysis engine for code analysis and diagnostic generation
//!
//! Provides the core analysis functionality for CLI and other consumers.

use tracing::debug;

use crate::config::Config;
use crate::diagnostic::Diagnostic;
use crate::parser::ParsedFile;
use crate::rules::quality::{PreferOptionalChain, PreferOptionalChainOptions};
use crate::rules::{RuleRegistry, Severity};

pub const PARSE_RULE_ID: &str = "PARSE";

pub struct AnalysisEngine {
    registry: RuleRegistry,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self {
            registry: create_default_registry(PreferOptionalChainOptions::default()),
        }
    }

    pub fn with_config(config: &Config) -> Self {
        let mut registry = create_default_registry(config.rules.prefer_optional_chain);
        registry.configure(&config.rules);
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn analyze(&self, file: &ParsedFile) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let disable_directives = file.disable_directives();

        for error in file.errors() {
            let diagnostic = Diagnostic::new(
                PARSE_RULE_ID,
                Severity::Error,
                &error.message,
                &file.metadata().filename,
                error.line,
                error.column,
            );
            if !disable_directives.is_disabled(diagnostic.line, &[PARSE_RULE_ID]) {
                diagnostics.push(diagnostic);
            }
        }

        let rule_diagnostics = self.registry.run_all(file);
        let reported = rule_diagnostics.len();
        for diagnostic in rule_diagnostics {
            let suppressed = match self.registry.rule_refs(&diagnostic.rule_id) {
                Some((id, name)) => disable_directives.is_disabled(diagnostic.line, &[id, name]),
                None => disable_directives.is_disabled(diagnostic.line, &[&diagnostic.rule_id]),
            };
            if !suppressed {
                diagnostics.push(diagnostic);
            }
        }

        debug!(
            file = %file.metadata().filename,
            rules = self.registry.len(),
            parse_errors = file.errors().len(),
            suppressed = reported + file.errors().len() - diagnostics.len(),
            diagnostics = diagnostics.len(),
            "analyzed file"
        );

        diagnostics
    }
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn create_default_registry(options: PreferOptionalChainOptions) -> RuleRegistry {
    let mut registry = RuleRegistry::new();

    registry.register(Box::new(PreferOptionalChain::with_options(options)));

    registry
}
