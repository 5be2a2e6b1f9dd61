//! Access paths: a base expression followed by member, element and call steps.
//!
//! Paths compare by canonical text, so parentheses, non-null assertions,
//! existing `?.` tokens and whitespace never make two paths differ.

use swc_common::{BytePos, Span, Spanned};
use swc_ecma_ast::{
    ArrowExpr, AssignExpr, Callee, Expr, ExprOrSpread, Function, MemberExpr, MemberProp,
    OptChainBase, UpdateExpr, YieldExpr,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::parser::ParsedFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StepKind {
    Member,
    Element,
    Call,
}

#[derive(Debug, Clone)]
pub(super) struct Step<'a> {
    pub kind: StepKind,
    /// `.name`, `[key]` or `<T>(args)`, compacted.
    pub key: String,
    /// Already written with `?.` in the source.
    pub optional: bool,
    /// Byte offset where the optional marker goes.
    pub insert_at: usize,
    pub expr: &'a Expr,
}

impl Step<'_> {
    /// Text inserted at `insert_at` to make this step optional.
    pub fn marker(&self) -> &'static str {
        match self.kind {
            StepKind::Member => "?",
            StepKind::Element | StepKind::Call => "?.",
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct AccessPath<'a> {
    pub base: &'a Expr,
    pub base_key: String,
    pub steps: Vec<Step<'a>>,
}

impl<'a> AccessPath<'a> {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// The expression the whole path evaluates.
    pub fn target(&self) -> &'a Expr {
        self.steps.last().map(|s| s.expr).unwrap_or(self.base)
    }

    pub fn same_as(&self, other: &AccessPath<'_>) -> bool {
        self.len() == other.len() && self.is_prefix_of(other)
    }

    /// True when `other` starts with every step of `self`.
    pub fn is_prefix_of(&self, other: &AccessPath<'_>) -> bool {
        self.base_key == other.base_key
            && self.len() <= other.len()
            && self
                .steps
                .iter()
                .zip(&other.steps)
                .all(|(a, b)| a.kind == b.kind && a.key == b.key)
    }

    pub fn is_strict_prefix_of(&self, other: &AccessPath<'_>) -> bool {
        self.len() < other.len() && self.is_prefix_of(other)
    }

    /// Canonical rendering, used in log output.
    pub fn render(&self) -> String {
        let mut out = self.base_key.clone();
        for step in &self.steps {
            out.push_str(&step.key);
        }
        out
    }
}

pub(super) fn strip_parens(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    expr
}

/// Builds the access path of `expr`, or `None` when it is not an access on
/// a supported base.
///
/// A parenthesized `await` is a base only when at least one step follows it.
/// Keys, arguments and bases that update, assign or yield are rejected.
pub(super) fn access_path<'a>(expr: &'a Expr, file: &ParsedFile) -> Option<AccessPath<'a>> {
    let mut steps = Vec::new();
    let base = collect(expr, file, &mut steps)?;
    if matches!(base, Expr::Await(_)) && steps.is_empty() {
        return None;
    }
    Some(AccessPath {
        base,
        base_key: compact(text(file, base.span())),
        steps,
    })
}

fn collect<'a>(expr: &'a Expr, file: &ParsedFile, steps: &mut Vec<Step<'a>>) -> Option<&'a Expr> {
    match expr {
        Expr::Paren(paren) => collect(&paren.expr, file, steps),
        Expr::TsNonNull(non_null) => collect(&non_null.expr, file, steps),
        Expr::Member(member) => {
            if computed_key_has_side_effects(&member.prop) {
                return None;
            }
            let base = collect(&member.obj, file, steps)?;
            steps.push(member_step(member, false, expr, file));
            Some(base)
        }
        Expr::Call(call) => {
            let Callee::Expr(callee) = &call.callee else {
                return None;
            };
            if args_have_side_effects(&call.args) {
                return None;
            }
            let base = collect(callee, file, steps)?;
            let type_args = call.type_args.as_ref().map(|t| t.span);
            steps.push(call_step(callee, type_args, call.span.hi, false, expr, file));
            Some(base)
        }
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => {
                if computed_key_has_side_effects(&member.prop) {
                    return None;
                }
                let base = collect(&member.obj, file, steps)?;
                steps.push(member_step(member, chain.optional, expr, file));
                Some(base)
            }
            OptChainBase::Call(call) => {
                if args_have_side_effects(&call.args) {
                    return None;
                }
                let base = collect(&call.callee, file, steps)?;
                let type_args = call.type_args.as_ref().map(|t| t.span);
                steps.push(call_step(
                    &call.callee,
                    type_args,
                    call.span.hi,
                    chain.optional,
                    expr,
                    file,
                ));
                Some(base)
            }
        },
        Expr::Ident(_)
        | Expr::This(_)
        | Expr::MetaProp(_)
        | Expr::SuperProp(_)
        | Expr::New(_)
        | Expr::TsAs(_)
        | Expr::TsSatisfies(_)
        | Expr::TsTypeAssertion(_)
        | Expr::TsConstAssertion(_) => {
            (!contains_await(text(file, expr.span())) && !has_side_effects(expr)).then_some(expr)
        }
        Expr::Await(await_expr) => (!has_side_effects(&await_expr.arg)).then_some(expr),
        _ => None,
    }
}

#[derive(Default)]
struct SideEffects {
    found: bool,
}

impl Visit for SideEffects {
    fn visit_update_expr(&mut self, _: &UpdateExpr) {
        self.found = true;
    }

    fn visit_assign_expr(&mut self, _: &AssignExpr) {
        self.found = true;
    }

    fn visit_yield_expr(&mut self, _: &YieldExpr) {
        self.found = true;
    }

    // Bodies are not run by evaluating the path.
    fn visit_function(&mut self, _: &Function) {}

    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}
}

fn has_side_effects(expr: &Expr) -> bool {
    let mut finder = SideEffects::default();
    expr.visit_with(&mut finder);
    finder.found
}

fn computed_key_has_side_effects(prop: &MemberProp) -> bool {
    match prop {
        MemberProp::Computed(computed) => has_side_effects(&computed.expr),
        _ => false,
    }
}

fn args_have_side_effects(args: &[ExprOrSpread]) -> bool {
    args.iter().any(|arg| has_side_effects(&arg.expr))
}

fn member_step<'a>(
    member: &MemberExpr,
    optional: bool,
    expr: &'a Expr,
    file: &ParsedFile,
) -> Step<'a> {
    let (kind, key, insert_at) = match &member.prop {
        MemberProp::Ident(ident) => (
            StepKind::Member,
            format!(".{}", ident.sym),
            find_token(file, member.obj.span().hi, member.prop.span().lo, b'.'),
        ),
        MemberProp::PrivateName(private) => (
            StepKind::Member,
            format!(".#{}", private.name),
            find_token(file, member.obj.span().hi, member.prop.span().lo, b'.'),
        ),
        MemberProp::Computed(computed) => (
            StepKind::Element,
            format!("[{}]", compact(text(file, computed.expr.span()))),
            file.offset(computed.span.lo),
        ),
    };
    Step {
        kind,
        key,
        optional,
        insert_at,
        expr,
    }
}

fn call_step<'a>(
    callee: &Expr,
    type_args: Option<Span>,
    end: BytePos,
    optional: bool,
    expr: &'a Expr,
    file: &ParsedFile,
) -> Step<'a> {
    let open_paren = find_token(file, callee.span().hi, end, b'(');
    let insert_at = type_args.map_or(open_paren, |span| file.offset(span.lo));
    let args = file
        .source()
        .get(open_paren..file.offset(end))
        .unwrap_or_default();
    let type_args = type_args
        .map(|span| compact(text(file, span)))
        .unwrap_or_default();

    Step {
        kind: StepKind::Call,
        key: format!("{}{}", type_args, compact(args)),
        optional,
        insert_at,
        expr,
    }
}

fn text(file: &ParsedFile, span: Span) -> &str {
    file.source().get(file.span_range(span)).unwrap_or_default()
}

fn contains_await(text: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .any(|word| word == "await")
}

/// Offset of the first `token` byte between `from` and `to` outside comments,
/// or `to` when none is found.
fn find_token(file: &ParsedFile, from: BytePos, to: BytePos, token: u8) -> usize {
    let start = file.offset(from);
    let end = file.offset(to);
    let bytes = file.source().as_bytes();

    let mut i = start;
    while i < end {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < end && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < end && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
            }
            b if b == token => return i,
            _ => i += 1,
        }
    }
    end
}

/// Removes whitespace and comments outside string literals.
pub(super) fn compact(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            '?' if chars.peek() == Some(&'.') => {
                // `a?.b` and `a.b` compare equal; `a?.[0]` and `a[0]` too.
                chars.next();
                if !matches!(chars.peek(), Some('[') | Some('(')) {
                    out.push('.');
                }
            }
            '!' if matches!(chars.peek(), Some('.') | Some('[') | Some(')')) => {}
            c if c.is_whitespace() => {}
            c => out.push(c),
        }
    }
    out
}
