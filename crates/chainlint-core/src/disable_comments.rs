//! Inline disable comment directives for suppressing diagnostics
//!
//! Supports ESLint-style disable comments:
//! - `// chainlint-disable-next-line Q022` - disable Q022 for the next line
//! - `// chainlint-disable-line prefer-optional-chain` - rules may be named by id or name
//! - `// chainlint-disable-next-line` - disable all rules for the next line
//! - `/* chainlint-disable-line */` - block comments work the same way

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?://|/\*)\s*chainlint-disable-(next-line|line)(?:\s+([^*]*?))?\s*(?:\*/|$)")
        .expect("Invalid regex pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisableDirective {
    pub line: usize,
    pub rule_ids: Vec<String>,
}

impl DisableDirective {
    pub fn new(line: usize, rule_ids: Vec<String>) -> Self {
        Self { line, rule_ids }
    }

    pub fn for_all_rules(line: usize) -> Self {
        Self {
            line,
            rule_ids: Vec::new(),
        }
    }

    pub fn disables_all(&self) -> bool {
        self.rule_ids.is_empty()
    }

    pub fn disables_rule(&self, rule_ref: &str) -> bool {
        self.rule_ids.is_empty() || self.rule_ids.iter().any(|id| id == rule_ref)
    }

    fn merge(&mut self, other: DisableDirective) {
        if self.disables_all() || other.disables_all() {
            self.rule_ids.clear();
        } else {
            self.rule_ids.extend(other.rule_ids);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisableDirectives {
    by_line: HashMap<usize, DisableDirective>,
}

impl DisableDirectives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_source(source: &str) -> Self {
        let mut directives = Self::new();

        for (line_idx, line) in source.lines().enumerate() {
            let line_num = line_idx + 1;

            for captures in DIRECTIVE.captures_iter(line) {
                let rule_ids = captures
                    .get(2)
                    .map(|m| parse_rule_ids(m.as_str()))
                    .unwrap_or_default();
                let target_line = match &captures[1] {
                    "next-line" => line_num + 1,
                    _ => line_num,
                };
                directives.add(DisableDirective::new(target_line, rule_ids));
            }
        }

        directives
    }

    pub fn add(&mut self, directive: DisableDirective) {
        match self.by_line.get_mut(&directive.line) {
            Some(existing) => existing.merge(directive),
            None => {
                self.by_line.insert(directive.line, directive);
            }
        }
    }

    /// True when any of `rule_refs` (typically a rule's id and name) is disabled on `line`.
    pub fn is_disabled(&self, line: usize, rule_refs: &[&str]) -> bool {
        self.by_line
            .get(&line)
            .is_some_and(|d| rule_refs.iter().any(|r| d.disables_rule(r)))
    }

    pub fn is_empty(&self) -> bool {
        self.by_line.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_line.len()
    }
}

fn parse_rule_ids(rest: &str) -> Vec<String> {
    rest.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
