//! prefer-optional-chain rule (Q022): collapse guard chains like `foo && foo.bar`
//! into optional chains like `foo?.bar`.
//!
//! Each `&&`/`||` run is flattened once, from its outermost node. Guards are
//! classified, grown into chains over one access path, checked against the
//! declared types, and rewritten. Unsafe rewrites become suggestions unless
//! `allowPotentiallyUnsafeFixesThatModifyTheReturnTypeIKnowWhatImDoing` is set.

mod chain;
mod classify;
mod fallback;
mod options;
mod path;
mod rewrite;
mod safety;

pub use options::PreferOptionalChainOptions;

use std::collections::HashSet;
use std::ops::ControlFlow;

use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    BinExpr, Expr, ExprOrSpread, JSXExprContainer, JSXSpreadChild, MemberExpr, SpreadElement, Tpl,
};
use tracing::debug;

use self::chain::{ChainFinder, flatten};
use self::classify::ChainStyle;
use self::safety::Verdict;
use crate::declare_rule;
use crate::diagnostic::{Applicability, Diagnostic, Fix};
use crate::parser::ParsedFile;
use crate::rules::{Confidence, Rule, RuleMetadata, Severity};
use crate::semantic::{DeclaredTypes, TypeOracle};
use crate::visitor::{AstVisitor, VisitorContext, walk_ast};

pub const MESSAGE_ID: &str = "preferOptionalChain";
pub const SUGGEST_MESSAGE_ID: &str = "optionalChainSuggest";

const MESSAGE: &str =
    "Prefer using an optional chain expression instead, as it's more concise and easier to read.";
const SUGGEST_TITLE: &str = "Change to an optional chain.";
const FIX_TITLE: &str = "Use an optional chain";

declare_rule!(
    PreferOptionalChain,
    id = "Q022",
    name = "prefer-optional-chain",
    description = "Enforce concise optional chain expressions instead of chained logical ands, negated logical ors, or empty objects",
    category = Quality,
    severity = Warning,
    options = PreferOptionalChainOptions,
    examples = "// Bad\nfoo && foo.a && foo.a.b && foo.a.b.c;\n!foo || !foo.bar;\n(foo || {}).bar;\n\n// Good\nfoo?.a?.b?.c;\n!foo?.bar;\nfoo?.bar;"
);

impl Rule for PreferOptionalChain {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, file: &ParsedFile) -> Vec<Diagnostic> {
        let Some(module) = file.module() else {
            return Vec::new();
        };

        let types = DeclaredTypes::from_module(module);
        let ctx = VisitorContext::new(file);
        let mut visitor = PreferOptionalChainVisitor {
            diagnostics: Vec::new(),
            file_path: file.metadata().filename.clone(),
            rule_id: self.metadata.id,
            severity: self.metadata.severity,
            options: self.options,
            oracle: &types,
            consumed: HashSet::new(),
            skipped: Vec::new(),
        };

        walk_ast(module, &mut visitor, &ctx);
        visitor.diagnostics
    }
}

struct PreferOptionalChainVisitor<'o> {
    diagnostics: Vec<Diagnostic>,
    file_path: String,
    rule_id: &'static str,
    severity: Severity,
    options: PreferOptionalChainOptions,
    oracle: &'o dyn TypeOracle,
    /// Nested nodes of runs that were already flattened from an outer node.
    consumed: HashSet<(u32, u32)>,
    /// Template substitutions, spreads and JSX containers.
    skipped: Vec<Span>,
}

impl PreferOptionalChainVisitor<'_> {
    fn is_skipped(&self, span: Span) -> bool {
        self.skipped
            .iter()
            .any(|region| region.lo <= span.lo && span.hi <= region.hi)
    }

    fn mark_nested(&mut self, expr: &Expr, style: ChainStyle) {
        if let Expr::Bin(bin) = expr {
            if bin.op == style.op() {
                self.consumed.insert((bin.span.lo.0, bin.span.hi.0));
                self.mark_nested(&bin.left, style);
                self.mark_nested(&bin.right, style);
            }
        }
    }

    fn report(&mut self, span: Span, replacement: String, verdict: Verdict, ctx: &VisitorContext) {
        let automatic = verdict == Verdict::Safe || self.options.allow_unsafe_fixes;
        let (line, column, end_line, end_column) = ctx.span_to_range(span);
        let range = ctx.file().span_range(span);

        let mut fix = Fix::replace(
            if automatic { FIX_TITLE } else { SUGGEST_TITLE },
            replacement.clone(),
            line,
            column,
            end_line,
            end_column,
        )
        .with_byte_range(range.start, range.end);
        if !automatic {
            fix = fix
                .with_applicability(Applicability::Suggestion)
                .with_message_id(SUGGEST_MESSAGE_ID);
        }

        let confidence = match verdict {
            Verdict::Safe => Confidence::High,
            _ => Confidence::Medium,
        };

        self.diagnostics.push(
            Diagnostic::new(
                self.rule_id,
                self.severity,
                MESSAGE,
                &self.file_path,
                line,
                column,
            )
            .with_end(end_line, end_column)
            .with_byte_range(range.start, range.end)
            .with_message_id(MESSAGE_ID)
            .with_confidence(confidence)
            .with_suggestion(format!("Replace with '{}'", replacement))
            .with_fix(fix),
        );
    }

    fn skip(&mut self, span: Span) -> ControlFlow<()> {
        self.skipped.push(span);
        ControlFlow::Continue(())
    }
}

impl AstVisitor for PreferOptionalChainVisitor<'_> {
    fn visit_bin_expr(&mut self, node: &BinExpr, ctx: &VisitorContext) -> ControlFlow<()> {
        let Some(style) = ChainStyle::from_op(node.op) else {
            return ControlFlow::Continue(());
        };
        if self.consumed.contains(&(node.span.lo.0, node.span.hi.0)) || self.is_skipped(node.span) {
            return ControlFlow::Continue(());
        }
        self.mark_nested(&node.left, style);
        self.mark_nested(&node.right, style);

        let mut operands = Vec::new();
        flatten(&node.left, style, &mut operands);
        flatten(&node.right, style, &mut operands);

        let finder = ChainFinder {
            style,
            oracle: self.oracle,
            options: &self.options,
        };
        for chain in finder.find(&operands, ctx.file()) {
            let replacement = rewrite::rewrite(&chain, ctx.file());
            debug!(
                file = %self.file_path,
                style = ?chain.style,
                operands = chain.operands,
                levels = chain.guards.len(),
                reason = chain.verdict.reason(),
                "reporting optional chain"
            );
            self.report(chain.span, replacement, chain.verdict, ctx);
        }

        ControlFlow::Continue(())
    }

    fn visit_member_expr(&mut self, node: &MemberExpr, ctx: &VisitorContext) -> ControlFlow<()> {
        if self.is_skipped(node.span) {
            return ControlFlow::Continue(());
        }
        let Some(fallback) = fallback::match_fallback(node) else {
            return ControlFlow::Continue(());
        };

        let verdict = fallback.verdict(self.oracle, &self.options);
        if verdict == Verdict::Disqualified {
            return ControlFlow::Continue(());
        }
        let replacement = fallback.rewrite(node, ctx.file());
        debug!(
            file = %self.file_path,
            reason = verdict.reason(),
            "reporting empty-object fallback"
        );
        self.report(node.span, replacement, verdict, ctx);

        ControlFlow::Continue(())
    }

    fn visit_tpl(&mut self, node: &Tpl, _ctx: &VisitorContext) -> ControlFlow<()> {
        self.skip(node.span)
    }

    fn visit_expr_or_spread(&mut self, node: &ExprOrSpread, _ctx: &VisitorContext) -> ControlFlow<()> {
        if node.spread.is_some() {
            return self.skip(node.span());
        }
        ControlFlow::Continue(())
    }

    fn visit_spread_element(
        &mut self,
        node: &SpreadElement,
        _ctx: &VisitorContext,
    ) -> ControlFlow<()> {
        self.skip(node.span())
    }

    fn visit_jsx_expr_container(
        &mut self,
        node: &JSXExprContainer,
        _ctx: &VisitorContext,
    ) -> ControlFlow<()> {
        self.skip(node.span)
    }

    fn visit_jsx_spread_child(
        &mut self,
        node: &JSXSpreadChild,
        _ctx: &VisitorContext,
    ) -> ControlFlow<()> {
        self.skip(node.span)
    }
}
