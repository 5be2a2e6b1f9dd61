//! Visitor context providing file information during AST traversal.

use swc_common::{BytePos, Span};

use crate::parser::ParsedFile;

pub struct VisitorContext<'a> {
    file: &'a ParsedFile,
}

impl<'a> VisitorContext<'a> {
    pub fn new(file: &'a ParsedFile) -> Self {
        Self { file }
    }

    pub fn file(&self) -> &'a ParsedFile {
        self.file
    }

    /// 1-based (line, column) of a byte offset into the source.
    pub fn offset_to_location(&self, offset: usize) -> (usize, usize) {
        let source = self.file.source();
        let offset = offset.min(source.len());

        let prefix = &source[..offset];
        let line = prefix.matches('\n').count() + 1;
        let last_newline = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = prefix[last_newline..].chars().count() + 1;

        (line, column)
    }

    pub fn pos_to_location(&self, pos: BytePos) -> (usize, usize) {
        self.offset_to_location(self.file.offset(pos))
    }

    pub fn span_to_location(&self, span: Span) -> (usize, usize) {
        self.pos_to_location(span.lo)
    }

    /// (line, column, end_line, end_column), all 1-based.
    pub fn span_to_range(&self, span: Span) -> (usize, usize, usize, usize) {
        let (line, column) = self.pos_to_location(span.lo);
        let (end_line, end_column) = self.pos_to_location(span.hi);
        (line, column, end_line, end_column)
    }

    pub fn get_source_text(&self, span: Span) -> Option<&'a str> {
        let range = self.file.span_range(span);
        self.file.source().get(range)
    }
}
