//! Diagnostic reporting for analysis results
//!
//! Provides structured diagnostic information for issues found during analysis,
//! together with the text edits that resolve them.

use serde::Serialize;

use crate::rules::{Confidence, Severity};

/// Whether a fix may be applied without asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Applicability {
    #[default]
    Automatic,
    Suggestion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FixKind {
    ReplaceWith { new_text: String },
}

/// A single text edit. `start`/`end` are byte offsets into the analyzed source;
/// line and column are 1-based and only used for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub title: String,
    pub kind: FixKind,
    pub applicability: Applicability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub start: usize,
    pub end: usize,
}

impl Fix {
    pub fn replace(
        title: impl Into<String>,
        new_text: impl Into<String>,
        line: usize,
        column: usize,
        end_line: usize,
        end_column: usize,
    ) -> Self {
        Self {
            title: title.into(),
            kind: FixKind::ReplaceWith {
                new_text: new_text.into(),
            },
            applicability: Applicability::Automatic,
            message_id: None,
            line,
            column,
            end_line,
            end_column,
            start: 0,
            end: 0,
        }
    }

    pub fn with_byte_range(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_applicability(mut self, applicability: Applicability) -> Self {
        self.applicability = applicability;
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn new_text(&self) -> &str {
        match &self.kind {
            FixKind::ReplaceWith { new_text } => new_text,
        }
    }

    pub fn is_automatic(&self) -> bool {
        self.applicability == Applicability::Automatic
    }

    pub fn overlaps(&self, other: &Fix) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub severity: Severity,
    pub confidence: Confidence,
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<Fix>,
}

impl Diagnostic {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        file: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            message_id: None,
            severity,
            confidence: Confidence::default(),
            message: message.into(),
            file: file.into(),
            line,
            column,
            end_line: line,
            end_column: column,
            start: 0,
            end: 0,
            suggestion: None,
            fixes: Vec::new(),
        }
    }

    pub fn with_end(mut self, end_line: usize, end_column: usize) -> Self {
        self.end_line = end_line;
        self.end_column = end_column;
        self
    }

    pub fn with_byte_range(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fixes.push(fix);
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn automatic_fixes(&self) -> impl Iterator<Item = &Fix> {
        self.fixes.iter().filter(|f| f.is_automatic())
    }

    pub fn suggested_fixes(&self) -> impl Iterator<Item = &Fix> {
        self.fixes.iter().filter(|f| !f.is_automatic())
    }
}
