//! Finds runs of guards over one deepening access path.

use swc_common::{Span, Spanned};
use swc_ecma_ast::Expr;
use tracing::trace;

use super::PreferOptionalChainOptions;
use super::classify::{ChainStyle, CheckKind, classify, terminal_path};
use super::path::AccessPath;
use super::safety::{Verdict, judge_level};
use crate::parser::ParsedFile;
use crate::semantic::TypeOracle;

/// Checks written against one path, possibly repeated (`foo && foo && foo.bar`).
#[derive(Debug)]
struct Level<'a> {
    path: AccessPath<'a>,
    first: usize,
    checks: Vec<CheckKind>,
}

#[derive(Debug)]
pub(super) struct Chain<'a> {
    pub style: ChainStyle,
    /// Paths of the guard levels, shallowest first.
    pub guards: Vec<AccessPath<'a>>,
    pub terminal: &'a Expr,
    pub terminal_path: AccessPath<'a>,
    pub operands: usize,
    pub span: Span,
    pub verdict: Verdict,
}

/// Flattens a left-nested run of `op`. Parenthesized operands stay whole.
pub(super) fn flatten<'a>(expr: &'a Expr, style: ChainStyle, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Bin(bin) if bin.op == style.op() => {
            flatten(&bin.left, style, out);
            flatten(&bin.right, style, out);
        }
        _ => out.push(expr),
    }
}

pub(super) struct ChainFinder<'o> {
    pub style: ChainStyle,
    pub oracle: &'o dyn TypeOracle,
    pub options: &'o PreferOptionalChainOptions,
}

impl ChainFinder<'_> {
    /// Every chain in `operands`, left to right, never sharing an operand.
    pub fn find<'a>(&self, operands: &[&'a Expr], file: &ParsedFile) -> Vec<Chain<'a>> {
        let mut chains = Vec::new();
        let mut start = 0;

        while start < operands.len() {
            match self.chain_at(operands, start, file) {
                Some((chain, next)) => {
                    chains.push(chain);
                    start = next;
                }
                None => start += 1,
            }
        }
        chains
    }

    fn chain_at<'a>(
        &self,
        operands: &[&'a Expr],
        start: usize,
        file: &ParsedFile,
    ) -> Option<(Chain<'a>, usize)> {
        let first = classify(operands[start], file).filter(|c| c.kind.continues(self.style))?;
        let mut levels = vec![Level {
            path: first.path,
            first: start,
            checks: vec![first.kind],
        }];

        for (index, &operand) in operands.iter().enumerate().skip(start + 1) {
            let current = levels.len() - 1;

            if let Some(check) = classify(operand, file).filter(|c| c.kind.continues(self.style)) {
                if check.path.same_as(&levels[current].path) {
                    levels[current].checks.push(check.kind);
                    continue;
                }
                if levels[current].path.is_strict_prefix_of(&check.path) {
                    levels.push(Level {
                        path: check.path,
                        first: index,
                        checks: vec![check.kind],
                    });
                    continue;
                }
            }

            if let Some(path) = terminal_path(operand, self.style, file) {
                if levels[current].path.is_strict_prefix_of(&path) {
                    levels.push(Level {
                        path,
                        first: index,
                        checks: Vec::new(),
                    });
                }
            }
            break;
        }

        self.settle(operands, levels, file)
    }

    /// Picks the deepest terminal reachable through usable guards.
    fn settle<'a>(
        &self,
        operands: &[&'a Expr],
        levels: Vec<Level<'a>>,
        file: &ParsedFile,
    ) -> Option<(Chain<'a>, usize)> {
        let verdicts: Vec<Verdict> = levels
            .iter()
            .map(|level| {
                let shape = self.oracle.type_of(level.path.target());
                judge_level(&level.checks, &shape, self.options)
            })
            .collect();

        let usable = verdicts
            .iter()
            .position(|v| *v == Verdict::Disqualified)
            .unwrap_or(levels.len());
        let deepest = usable.min(levels.len().saturating_sub(1));
        if deepest + 1 < levels.len() {
            trace!(
                levels = levels.len(),
                kept = deepest + 1,
                guard = %levels[deepest + 1].path.render(),
                "truncating chain at disqualified guard"
            );
        }

        let (terminal_index, terminal_path) = (1..=deepest).rev().find_map(|t| {
            let operand = operands[levels[t].first];
            terminal_path(operand, self.style, file)
                .filter(|path| levels[t - 1].path.is_strict_prefix_of(path))
                .map(|path| (t, path))
        })?;

        let first_operand = operands[levels[0].first];
        let terminal = operands[levels[terminal_index].first];
        let verdict = verdicts[..terminal_index]
            .iter()
            .copied()
            .max()
            .unwrap_or(Verdict::Safe);
        let next = levels[terminal_index].first + 1;
        let levels_start = levels[0].first;

        let chain = Chain {
            style: self.style,
            guards: levels
                .into_iter()
                .take(terminal_index)
                .map(|level| level.path)
                .collect(),
            terminal,
            terminal_path,
            operands: next - levels_start,
            span: Span::new(first_operand.span().lo, terminal.span().hi),
            verdict,
        };
        Some((chain, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{DeclaredTypes, UntypedOracle};
    use swc_ecma_ast::{ExprStmt, ModuleItem, Stmt};

    struct Found {
        guards: Vec<String>,
        terminal: String,
        verdict: Verdict,
    }

    fn find_with(code: &str, options: PreferOptionalChainOptions) -> Vec<Found> {
        let file = ParsedFile::from_source("test.ts", code);
        let module = file.module().expect("parse failed");
        let types = DeclaredTypes::from_module(module);
        let expr = module
            .body
            .iter()
            .rev()
            .find_map(|item| match item {
                ModuleItem::Stmt(Stmt::Expr(ExprStmt { expr, .. })) => Some(&**expr),
                _ => None,
            })
            .expect("no expression statement");

        let Expr::Bin(bin) = expr else {
            panic!("expected logical expression");
        };
        let style = ChainStyle::from_op(bin.op).expect("expected && or ||");
        let mut operands = Vec::new();
        flatten(expr, style, &mut operands);

        let finder = ChainFinder {
            style,
            oracle: &types,
            options: &options,
        };
        finder
            .find(&operands, &file)
            .into_iter()
            .map(|chain| Found {
                guards: chain.guards.iter().map(|p| p.render()).collect(),
                terminal: chain.terminal_path.render(),
                verdict: chain.verdict,
            })
            .collect()
    }

    fn find(code: &str) -> Vec<Found> {
        find_with(code, PreferOptionalChainOptions::default())
    }

    #[test]
    fn grows_through_every_level() {
        let found = find("foo && foo.bar && foo.bar.baz;");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guards, vec!["foo", "foo.bar"]);
        assert_eq!(found[0].terminal, "foo.bar.baz");
        assert_eq!(found[0].verdict, Verdict::Unsafe);
    }

    #[test]
    fn nullish_guards_are_safe() {
        let found = find("foo != null && foo.bar != null && foo.bar.baz;");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].verdict, Verdict::Safe);
    }

    #[test]
    fn unrelated_bases_form_separate_chains() {
        let found = find("a.b && a.b.c && c.d && c.d.e;");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].terminal, "a.b.c");
        assert_eq!(found[1].guards, vec!["c.d"]);
    }

    #[test]
    fn mismatched_call_arguments_break_the_chain() {
        assert!(find("foo.bar(a) && foo.bar(a, b).baz;").is_empty());
    }

    #[test]
    fn duplicate_operands_share_a_level() {
        let found = find("foo && foo && foo.bar;");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guards, vec!["foo"]);
    }

    #[test]
    fn terminal_may_be_several_steps_deeper() {
        let found = find("foo && foo.bar.baz.buzz;");

        assert_eq!(found[0].terminal, "foo.bar.baz.buzz");
    }

    #[test]
    fn comparisons_end_the_chain_as_terminals() {
        let found = find("foo && foo.bar && foo.bar.baz === 0;");

        assert_eq!(found[0].guards, vec!["foo", "foo.bar"]);
        assert_eq!(found[0].terminal, "foo.bar.baz");
        assert!(find("foo && foo.bar !== null;").is_empty());
    }

    #[test]
    fn negated_or_chains() {
        let found = find("!foo || !foo.bar || !foo.bar.baz;");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guards, vec!["foo", "foo.bar"]);
        assert!(find("!foo && foo.bar;").is_empty());
        assert!(find("foo || foo.bar;").is_empty());
    }

    #[test]
    fn disqualified_level_truncates() {
        let code = r#"
declare const foo: { bar: string | undefined } | null;
foo && foo.bar && foo.bar.length;
"#;
        let options = PreferOptionalChainOptions {
            check_string: false,
            ..Default::default()
        };
        let found = find_with(code, options);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guards, vec!["foo"]);
        assert_eq!(found[0].terminal, "foo.bar");
        assert_eq!(found[0].verdict, Verdict::Safe);
    }

    #[test]
    fn incomplete_strict_check_needs_its_complement() {
        let code = "declare const foo: { bar: 1 } | null | undefined;\nfoo !== null && foo.bar;";
        assert!(find(code).is_empty());

        let code = "declare const foo: { bar: 1 } | null | undefined;\nfoo !== null && foo !== undefined && foo.bar;";
        let found = find(code);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].verdict, Verdict::Safe);
    }

    #[test]
    fn untyped_oracle_reports_unsafe() {
        let file = ParsedFile::from_source("test.js", "foo && foo.bar;");
        let module = file.module().unwrap();
        let ModuleItem::Stmt(Stmt::Expr(ExprStmt { expr, .. })) = &module.body[0] else {
            panic!("expected expression statement");
        };
        let mut operands = Vec::new();
        flatten(expr, ChainStyle::And, &mut operands);
        let options = PreferOptionalChainOptions::default();
        let finder = ChainFinder {
            style: ChainStyle::And,
            oracle: &UntypedOracle,
            options: &options,
        };

        let chains = finder.find(&operands, &file);
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].operands, 2);
        assert_eq!(chains[0].verdict, Verdict::Unsafe);
    }
}
