//! Rule system for code analysis
//!
//! Provides the rule trait, metadata and registry used by the analysis engine.

pub mod quality;

use crate::config::RulesConfig;
use crate::diagnostic::Diagnostic;
use crate::parser::ParsedFile;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn level(&self) -> u8 {
        match self {
            Confidence::High => 3,
            Confidence::Medium => 2,
            Confidence::Low => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCategory {
    Quality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: RuleCategory,
    pub severity: Severity,
    pub docs_url: Option<&'static str>,
    pub examples: Option<&'static str>,
}

pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;
    fn check(&self, file: &ParsedFile) -> Vec<Diagnostic>;
}

pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
    disabled_rules: HashSet<String>,
    severity_overrides: HashMap<String, Severity>,
    quality_enabled: bool,
    min_confidence: Confidence,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            disabled_rules: HashSet::new(),
            severity_overrides: HashMap::new(),
            quality_enabled: true,
            min_confidence: Confidence::Low,
        }
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn configure(&mut self, config: &RulesConfig) {
        self.disabled_rules.clear();
        self.severity_overrides.clear();

        for rule_ref in &config.disabled {
            self.disabled_rules.insert(rule_ref.clone());
        }

        for (rule_ref, severity_value) in &config.severity {
            self.severity_overrides
                .insert(rule_ref.clone(), (*severity_value).into());
        }

        self.quality_enabled = config.quality.unwrap_or(true);
        self.min_confidence = config
            .min_confidence
            .map(Confidence::from)
            .unwrap_or(Confidence::Low);
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn run_all(&self, file: &ParsedFile) -> Vec<Diagnostic> {
        let min_level = self.min_confidence.level();

        self.rules
            .iter()
            .filter(|rule| self.should_run_rule(rule.as_ref()))
            .flat_map(|rule| {
                let mut diagnostics = rule.check(file);
                diagnostics.retain(|d| d.confidence.level() >= min_level);
                self.apply_severity_overrides(rule.as_ref(), &mut diagnostics);
                diagnostics
            })
            .collect()
    }

    fn should_run_rule(&self, rule: &dyn Rule) -> bool {
        let metadata = rule.metadata();

        if !self.quality_enabled && metadata.category == RuleCategory::Quality {
            return false;
        }

        !self.is_rule_disabled(metadata)
    }

    fn is_rule_disabled(&self, metadata: &RuleMetadata) -> bool {
        self.disabled_rules.contains(metadata.id) || self.disabled_rules.contains(metadata.name)
    }

    fn apply_severity_overrides(&self, rule: &dyn Rule, diagnostics: &mut [Diagnostic]) {
        let metadata = rule.metadata();

        let override_severity = self
            .severity_overrides
            .get(metadata.id)
            .or_else(|| self.severity_overrides.get(metadata.name));

        if let Some(severity) = override_severity {
            for diag in diagnostics.iter_mut() {
                diag.severity = *severity;
            }
        }
    }

    pub fn is_rule_enabled(&self, id_or_name: &str) -> bool {
        self.get_rule(id_or_name)
            .or_else(|| self.get_rule_by_name(id_or_name))
            .is_some_and(|rule| self.should_run_rule(rule))
    }

    pub fn get_rule(&self, id: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().id == id)
            .map(|r| r.as_ref())
    }

    pub fn get_rule_by_name(&self, name: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().name == name)
            .map(|r| r.as_ref())
    }

    /// Resolves a rule reference (id or name) to the rule's id and name.
    pub fn rule_refs(&self, rule_id: &str) -> Option<(&'static str, &'static str)> {
        self.get_rule(rule_id)
            .map(|r| (r.metadata().id, r.metadata().name))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Declares a rule struct with its metadata. Rules that take options pass
/// `options = Type`, which adds an `options` field and `with_options`.
#[macro_export]
macro_rules! declare_rule {
    (
        $name:ident,
        id = $id:literal,
        name = $rule_name:literal,
        description = $desc:literal,
        category = $cat:ident,
        severity = $sev:ident,
        options = $opts:ty
        $(, docs_url = $url:literal)?
        $(, examples = $examples:literal)?
    ) => {
        pub struct $name {
            metadata: $crate::rules::RuleMetadata,
            options: $opts,
        }

        impl $name {
            pub fn new() -> Self {
                Self::with_options(<$opts>::default())
            }

            pub fn with_options(options: $opts) -> Self {
                Self {
                    metadata: declare_rule!(
                        @metadata $id, $rule_name, $desc, $cat, $sev, $($url)?; $($examples)?
                    ),
                    options,
                }
            }

            pub fn options(&self) -> &$opts {
                &self.options
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
    (
        $name:ident,
        id = $id:literal,
        name = $rule_name:literal,
        description = $desc:literal,
        category = $cat:ident,
        severity = $sev:ident
        $(, docs_url = $url:literal)?
        $(, examples = $examples:literal)?
    ) => {
        pub struct $name {
            metadata: $crate::rules::RuleMetadata,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    metadata: declare_rule!(
                        @metadata $id, $rule_name, $desc, $cat, $sev, $($url)?; $($examples)?
                    ),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
    (@metadata $id:literal, $rule_name:literal, $desc:literal, $cat:ident, $sev:ident, $($url:literal)?; $($examples:literal)?) => {
        $crate::rules::RuleMetadata {
            id: $id,
            name: $rule_name,
            description: $desc,
            category: $crate::rules::RuleCategory::$cat,
            severity: $crate::rules::Severity::$sev,
            docs_url: declare_rule!(@docs_url $($url)?),
            examples: declare_rule!(@examples $($examples)?),
        }
    };
    (@docs_url $url:literal) => { Some($url) };
    (@docs_url) => { None };
    (@examples $examples:literal) => { Some($examples) };
    (@examples) => { None };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfidenceValue, SeverityValue};

    struct TestRule {
        metadata: RuleMetadata,
        diagnostics_to_return: Vec<Diagnostic>,
    }

    impl TestRule {
        fn new(id: &'static str) -> Self {
            Self {
                metadata: RuleMetadata {
                    id,
                    name: "test-rule",
                    description: "A test rule",
                    category: RuleCategory::Quality,
                    severity: Severity::Warning,
                    docs_url: None,
                    examples: None,
                },
                diagnostics_to_return: Vec::new(),
            }
        }

        fn with_name(mut self, name: &'static str) -> Self {
            self.metadata.name = name;
            self
        }

        fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
            self.diagnostics_to_return.push(diagnostic);
            self
        }
    }

    impl Rule for TestRule {
        fn metadata(&self) -> &RuleMetadata {
            &self.metadata
        }

        fn check(&self, _file: &ParsedFile) -> Vec<Diagnostic> {
            self.diagnostics_to_return.clone()
        }
    }

    fn test_file() -> ParsedFile {
        ParsedFile::from_source("test.js", "foo && foo.bar;")
    }

    #[test]
    fn run_all_collects_diagnostics() {
        let mut registry = RuleRegistry::new();
        let diag1 = Diagnostic::new("T001", Severity::Warning, "Issue 1", "test.js", 1, 1);
        let diag2 = Diagnostic::new("T002", Severity::Error, "Issue 2", "test.js", 2, 1);
        registry.register(Box::new(TestRule::new("T001").with_diagnostic(diag1)));
        registry.register(Box::new(TestRule::new("T002").with_diagnostic(diag2)));

        let diagnostics = registry.run_all(&test_file());

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].rule_id, "T001");
        assert_eq!(diagnostics[1].rule_id, "T002");
    }

    #[test]
    fn registry_lookup_by_id_and_name() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(TestRule::new("T001").with_name("first")));
        registry.register(Box::new(TestRule::new("T002").with_name("second")));

        assert_eq!(registry.get_rule("T002").unwrap().metadata().name, "second");
        assert_eq!(registry.get_rule_by_name("first").unwrap().metadata().id, "T001");
        assert!(registry.get_rule("UNKNOWN").is_none());
        assert_eq!(registry.rule_refs("T001"), Some(("T001", "first")));
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn confidence_level_ordering() {
        assert_eq!(Confidence::default(), Confidence::High);
        assert!(Confidence::High.level() > Confidence::Medium.level());
        assert!(Confidence::Medium.level() > Confidence::Low.level());
    }

    declare_rule!(
        MacroTestRule,
        id = "M001",
        name = "macro-test",
        description = "Tests the declare_rule! macro",
        category = Quality,
        severity = Info
    );

    impl Rule for MacroTestRule {
        fn metadata(&self) -> &RuleMetadata {
            &self.metadata
        }

        fn check(&self, _file: &ParsedFile) -> Vec<Diagnostic> {
            Vec::new()
        }
    }

    #[test]
    fn declare_rule_macro_creates_rule() {
        let rule = MacroTestRule::new();
        let metadata = rule.metadata();

        assert_eq!(metadata.id, "M001");
        assert_eq!(metadata.name, "macro-test");
        assert_eq!(metadata.category, RuleCategory::Quality);
        assert_eq!(metadata.severity, Severity::Info);
        assert!(metadata.docs_url.is_none());
        assert!(metadata.examples.is_none());
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct MacroOptions {
        strict: bool,
    }

    declare_rule!(
        MacroOptionsRule,
        id = "M002",
        name = "macro-options",
        description = "Tests the declare_rule! macro with options",
        category = Quality,
        severity = Warning,
        options = MacroOptions,
        examples = "// Bad\nfoo && foo.bar;\n\n// Good\nfoo?.bar;"
    );

    impl Rule for MacroOptionsRule {
        fn metadata(&self) -> &RuleMetadata {
            &self.metadata
        }

        fn check(&self, _file: &ParsedFile) -> Vec<Diagnostic> {
            Vec::new()
        }
    }

    #[test]
    fn declare_rule_macro_with_options() {
        let default_rule = MacroOptionsRule::new();
        let strict_rule = MacroOptionsRule::with_options(MacroOptions { strict: true });

        assert!(!default_rule.options().strict);
        assert!(strict_rule.options().strict);
        assert_eq!(strict_rule.metadata().id, "M002");
        assert!(strict_rule.metadata().examples.unwrap().contains("foo?.bar"));
    }

    // ==================== Configuration Tests ====================

    #[test]
    fn disabled_rule_by_id_or_name_not_executed() {
        for rule_ref in ["Q022", "prefer-optional-chain"] {
            let mut registry = RuleRegistry::new();
            let diag = Diagnostic::new("Q022", Severity::Warning, "chain", "test.js", 1, 1);
            registry.register(Box::new(
                TestRule::new("Q022")
                    .with_name("prefer-optional-chain")
                    .with_diagnostic(diag),
            ));

            registry.configure(&RulesConfig {
                disabled: vec![rule_ref.to_string()],
                ..Default::default()
            });

            assert!(registry.run_all(&test_file()).is_empty(), "{rule_ref}");
            assert!(!registry.is_rule_enabled("Q022"));
        }
    }

    #[test]
    fn disable_quality_category() {
        let mut registry = RuleRegistry::new();
        let diag = Diagnostic::new("Q022", Severity::Warning, "chain", "test.js", 1, 1);
        registry.register(Box::new(TestRule::new("Q022").with_diagnostic(diag)));

        registry.configure(&RulesConfig {
            quality: Some(false),
            ..Default::default()
        });

        assert!(registry.run_all(&test_file()).is_empty());
    }

    #[test]
    fn override_severity_by_name() {
        let mut registry = RuleRegistry::new();
        let diag = Diagnostic::new("Q022", Severity::Warning, "chain", "test.js", 1, 1);
        registry.register(Box::new(
            TestRule::new("Q022")
                .with_name("prefer-optional-chain")
                .with_diagnostic(diag),
        ));

        let mut severity = HashMap::new();
        severity.insert("prefer-optional-chain".to_string(), SeverityValue::Error);
        registry.configure(&RulesConfig {
            severity,
            ..Default::default()
        });

        let diagnostics = registry.run_all(&test_file());

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn min_confidence_filters_diagnostics() {
        let mut registry = RuleRegistry::new();
        let high = Diagnostic::new("T001", Severity::Warning, "high", "test.js", 1, 1);
        let medium = Diagnostic::new("T001", Severity::Warning, "medium", "test.js", 2, 1)
            .with_confidence(Confidence::Medium);
        registry.register(Box::new(
            TestRule::new("T001")
                .with_diagnostic(high)
                .with_diagnostic(medium),
        ));

        registry.configure(&RulesConfig {
            min_confidence: Some(ConfidenceValue::High),
            ..Default::default()
        });
        let diagnostics = registry.run_all(&test_file());

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "high");
    }
}
