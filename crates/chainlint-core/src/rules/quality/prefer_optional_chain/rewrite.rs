//! Builds the replacement text for an accepted chain.

use swc_common::Spanned;

use super::chain::Chain;
use crate::parser::{CommentStyle, ParsedFile};

/// Replacement for `chain.span`: the terminal operand with `?.` at every
/// guard's boundary step. Comments from the removed guards move in front.
pub(super) fn rewrite(chain: &Chain<'_>, file: &ParsedFile) -> String {
    let source = file.source();
    let removed = file.span_range(chain.span);
    let terminal = file.span_range(chain.terminal.span());

    let mut out = String::with_capacity(terminal.len() + chain.guards.len() * 2);
    for comment in file.comments() {
        if comment.start >= removed.start && comment.end <= terminal.start {
            out.push_str(&source[comment.start..comment.end]);
            out.push(match comment.style {
                CommentStyle::Line => '\n',
                CommentStyle::Block => ' ',
            });
        }
    }

    let boundaries: Vec<_> = chain
        .guards
        .iter()
        .filter_map(|guard| chain.terminal_path.steps.get(guard.len()))
        .collect();
    debug_assert_eq!(
        boundaries.len(),
        chain.guards.len(),
        "every guard needs a boundary step in the terminal"
    );

    let mut insertions: Vec<(usize, &str)> = boundaries
        .iter()
        .filter(|step| !step.optional)
        .map(|step| (step.insert_at, step.marker()))
        .collect();
    insertions.sort_by_key(|(at, _)| *at);

    let mut cursor = terminal.start;
    for (at, marker) in insertions {
        if at < cursor || at > terminal.end {
            continue;
        }
        out.push_str(&source[cursor..at]);
        out.push_str(marker);
        cursor = at;
    }
    out.push_str(&source[cursor..terminal.end]);
    out
}

#[cfg(test)]
mod tests {
    use super::super::PreferOptionalChainOptions;
    use super::super::chain::{ChainFinder, flatten};
    use super::super::classify::ChainStyle;
    use super::*;
    use crate::semantic::UntypedOracle;
    use swc_ecma_ast::{Expr, ExprStmt, ModuleItem, Stmt};

    fn rewrites(code: &str) -> Vec<String> {
        let file = ParsedFile::from_source("test.ts", code);
        let module = file.module().expect("parse failed");
        let ModuleItem::Stmt(Stmt::Expr(ExprStmt { expr, .. })) = &module.body[0] else {
            panic!("expected expression statement");
        };
        let Expr::Bin(bin) = &**expr else {
            panic!("expected logical expression");
        };
        let style = ChainStyle::from_op(bin.op).unwrap();
        let mut operands = Vec::new();
        flatten(expr, style, &mut operands);

        let options = PreferOptionalChainOptions::default();
        let finder = ChainFinder {
            style,
            oracle: &UntypedOracle,
            options: &options,
        };
        finder
            .find(&operands, &file)
            .iter()
            .map(|chain| rewrite(chain, &file))
            .collect()
    }

    #[test]
    fn inserts_one_marker_per_guard() {
        assert_eq!(rewrites("foo && foo.bar && foo.bar.baz;"), vec!["foo?.bar?.baz"]);
        assert_eq!(rewrites("foo && foo.bar.baz.buzz;"), vec!["foo?.bar.baz.buzz"]);
    }

    #[test]
    fn element_and_call_steps() {
        assert_eq!(rewrites("foo && foo[0] && foo[0].bar;"), vec!["foo?.[0]?.bar"]);
        assert_eq!(rewrites("foo.bar && foo.bar();"), vec!["foo.bar?.()"]);
        assert_eq!(rewrites("foo && foo.bar<T>();"), vec!["foo?.bar<T>()"]);
        assert_eq!(rewrites("foo.get && foo.get<T>(1);"), vec!["foo.get?.<T>(1)"]);
    }

    #[test]
    fn trailing_comparison_is_kept() {
        assert_eq!(rewrites("foo && foo.bar === 0;"), vec!["foo?.bar === 0"]);
        assert_eq!(
            rewrites("foo && foo.bar && foo.bar.toFixed();"),
            vec!["foo?.bar?.toFixed()"]
        );
    }

    #[test]
    fn existing_optional_steps_are_not_doubled() {
        assert_eq!(rewrites("foo && foo?.bar && foo?.bar.baz;"), vec!["foo?.bar?.baz"]);
    }

    #[test]
    fn non_null_assertions_stay_in_place() {
        assert_eq!(rewrites("foo! && foo!.bar;"), vec!["foo!?.bar"]);
        assert_eq!(rewrites("foo && foo.bar! && foo.bar!.baz;"), vec!["foo?.bar!?.baz"]);
    }

    #[test]
    fn negated_or_keeps_the_leading_bang() {
        assert_eq!(rewrites("!foo || !foo.bar || !foo.bar.baz;"), vec!["!foo?.bar?.baz"]);
        assert_eq!(rewrites("foo == null || foo.bar == null;"), vec!["foo?.bar == null"]);
    }

    #[test]
    fn comments_in_removed_guards_move_forward() {
        assert_eq!(
            rewrites("foo /* first */ && foo.bar;"),
            vec!["/* first */ foo?.bar"]
        );
        assert_eq!(
            rewrites("foo && // line\n  foo.bar;"),
            vec!["// line\nfoo?.bar"]
        );
    }

    #[test]
    fn sibling_chains_rewrite_independently() {
        assert_eq!(
            rewrites("a && a.b && c && c.d;"),
            vec!["a?.b", "c?.d"]
        );
    }
}
