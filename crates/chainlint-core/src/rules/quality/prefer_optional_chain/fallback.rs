//! `(foo || {}).bar` and `(foo ?? {}).bar`.

use swc_common::{Span, Spanned};
use swc_ecma_ast::{BinaryOp, Expr, MemberExpr, MemberProp};

use super::PreferOptionalChainOptions;
use super::path::strip_parens;
use super::safety::{Verdict, judge_truthiness};
use crate::parser::ParsedFile;
use crate::semantic::TypeOracle;

#[derive(Debug)]
pub(super) struct Fallback<'a> {
    /// The value before `||` / `??`.
    pub value: &'a Expr,
    pub op: BinaryOp,
}

/// Matches a member access on a parenthesized empty-object fallback.
pub(super) fn match_fallback(member: &MemberExpr) -> Option<Fallback<'_>> {
    let Expr::Paren(paren) = &*member.obj else {
        return None;
    };
    let Expr::Bin(bin) = strip_parens(&paren.expr) else {
        return None;
    };
    if !matches!(bin.op, BinaryOp::LogicalOr | BinaryOp::NullishCoalescing) {
        return None;
    }
    match strip_parens(&bin.right) {
        Expr::Object(object) if object.props.is_empty() => Some(Fallback {
            value: &bin.left,
            op: bin.op,
        }),
        _ => None,
    }
}

impl Fallback<'_> {
    /// `??` only falls back on nullish values; `||` also on other falsy ones.
    pub fn verdict(&self, oracle: &dyn TypeOracle, options: &PreferOptionalChainOptions) -> Verdict {
        match self.op {
            BinaryOp::NullishCoalescing => Verdict::Safe,
            _ => judge_truthiness(&oracle.type_of(self.value), options),
        }
    }

    pub fn rewrite(&self, member: &MemberExpr, file: &ParsedFile) -> String {
        let text = |span: Span| file.source().get(file.span_range(span)).unwrap_or_default();

        let value = text(self.value.span());
        let mut out = if needs_parens(self.value) {
            format!("({})", value)
        } else {
            value.to_string()
        };

        out.push_str("?.");
        match &member.prop {
            MemberProp::Ident(ident) => out.push_str(&ident.sym),
            MemberProp::PrivateName(private) => {
                out.push('#');
                out.push_str(&private.name);
            }
            MemberProp::Computed(computed) => out.push_str(text(computed.span)),
        }
        out
    }
}

/// Whether `expr` must be wrapped to stay the object of a member access.
fn needs_parens(expr: &Expr) -> bool {
    !matches!(
        expr,
        Expr::Ident(_)
            | Expr::This(_)
            | Expr::Member(_)
            | Expr::SuperProp(_)
            | Expr::Call(_)
            | Expr::OptChain(_)
            | Expr::MetaProp(_)
            | Expr::Paren(_)
            | Expr::TsNonNull(_)
            | Expr::Array(_)
            | Expr::Lit(_)
            | Expr::Tpl(_)
    )
}
