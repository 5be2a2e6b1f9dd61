//! Guard and terminal operand shapes.

use swc_ecma_ast::{BinExpr, BinaryOp, Expr, Lit, UnaryExpr, UnaryOp};

use super::path::{AccessPath, access_path, strip_parens};
use crate::parser::ParsedFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChainStyle {
    And,
    Or,
}

impl ChainStyle {
    pub fn from_op(op: BinaryOp) -> Option<Self> {
        match op {
            BinaryOp::LogicalAnd => Some(Self::And),
            BinaryOp::LogicalOr => Some(Self::Or),
            _ => None,
        }
    }

    pub fn op(self) -> BinaryOp {
        match self {
            Self::And => BinaryOp::LogicalAnd,
            Self::Or => BinaryOp::LogicalOr,
        }
    }
}

/// Which nullish value a comparison rules out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Comparison {
    /// `==` / `!=`: both.
    Loose,
    StrictNull,
    StrictUndefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CheckKind {
    /// `x`
    Truthy,
    /// `!x`
    Falsy,
    /// `x != null`, `x !== undefined`, `null !== x`
    NotNullish(Comparison),
    /// `x == null`, `x === undefined`
    Nullish(Comparison),
    /// `typeof x !== 'undefined'`
    TypeofDefined,
    /// `typeof x === 'undefined'`
    TypeofUndefined,
}

impl CheckKind {
    /// Whether a chain of `style` continues past this check when the value is present.
    pub fn continues(self, style: ChainStyle) -> bool {
        match style {
            ChainStyle::And => matches!(
                self,
                CheckKind::Truthy | CheckKind::NotNullish(_) | CheckKind::TypeofDefined
            ),
            ChainStyle::Or => matches!(
                self,
                CheckKind::Falsy | CheckKind::Nullish(_) | CheckKind::TypeofUndefined
            ),
        }
    }

    pub fn is_truthiness(self) -> bool {
        matches!(self, CheckKind::Truthy | CheckKind::Falsy)
    }

    pub fn comparison(self) -> Option<Comparison> {
        match self {
            CheckKind::NotNullish(cmp) | CheckKind::Nullish(cmp) => Some(cmp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Check<'a> {
    pub kind: CheckKind,
    pub path: AccessPath<'a>,
}

/// Classifies one operand of a flattened logical expression.
pub(super) fn classify<'a>(operand: &'a Expr, file: &ParsedFile) -> Option<Check<'a>> {
    let expr = strip_parens(operand);
    match expr {
        Expr::Unary(UnaryExpr {
            op: UnaryOp::Bang,
            arg,
            ..
        }) => Some(Check {
            kind: CheckKind::Falsy,
            path: access_path(arg, file)?,
        }),
        Expr::Bin(bin) if is_equality(bin.op) => classify_comparison(bin, file),
        _ => Some(Check {
            kind: CheckKind::Truthy,
            path: access_path(expr, file)?,
        }),
    }
}

fn classify_comparison<'a>(bin: &'a BinExpr, file: &ParsedFile) -> Option<Check<'a>> {
    let negated = matches!(bin.op, BinaryOp::NotEq | BinaryOp::NotEqEq);

    if let Some((arg, literal)) = typeof_comparison(bin) {
        if literal != "undefined" {
            return None;
        }
        let kind = if negated {
            CheckKind::TypeofDefined
        } else {
            CheckKind::TypeofUndefined
        };
        return Some(Check {
            kind,
            path: access_path(arg, file)?,
        });
    }

    let (target, value) = split_comparison(bin)?;
    let comparison = match (bin.op, value) {
        (BinaryOp::EqEq | BinaryOp::NotEq, Value::Null | Value::Undefined) => Comparison::Loose,
        (_, Value::Null) => Comparison::StrictNull,
        (_, Value::Undefined) => Comparison::StrictUndefined,
        _ => return None,
    };
    let kind = if negated {
        CheckKind::NotNullish(comparison)
    } else {
        CheckKind::Nullish(comparison)
    };

    Some(Check {
        kind,
        path: access_path(target, file)?,
    })
}

/// Access path of a terminal operand, when replacing that access with
/// `undefined` gives the value the chain style short-circuits to.
pub(super) fn terminal_path<'a>(
    operand: &'a Expr,
    style: ChainStyle,
    file: &ParsedFile,
) -> Option<AccessPath<'a>> {
    let expr = strip_parens(operand);
    match expr {
        Expr::Unary(UnaryExpr {
            op: UnaryOp::Bang,
            arg,
            ..
        }) => match style {
            ChainStyle::Or => access_path(arg, file),
            ChainStyle::And => None,
        },
        Expr::Bin(bin) if is_equality(bin.op) => {
            let negated = matches!(bin.op, BinaryOp::NotEq | BinaryOp::NotEqEq);

            if let Some((arg, literal)) = typeof_comparison(bin) {
                let undefined = literal == "undefined";
                let accepted = match style {
                    ChainStyle::And => negated == undefined,
                    ChainStyle::Or => negated != undefined,
                };
                return accepted.then(|| access_path(arg, file)).flatten();
            }

            let (target, value) = split_comparison(bin)?;
            let accepted = match (style, bin.op) {
                (ChainStyle::And, BinaryOp::EqEqEq) => matches!(value, Value::Null | Value::Literal),
                (ChainStyle::And, BinaryOp::EqEq) => value == Value::Literal,
                (ChainStyle::And, BinaryOp::NotEqEq) => value == Value::Undefined,
                (ChainStyle::And, BinaryOp::NotEq) => matches!(value, Value::Null | Value::Undefined),
                (ChainStyle::Or, BinaryOp::EqEq) => matches!(value, Value::Null | Value::Undefined),
                (ChainStyle::Or, BinaryOp::EqEqEq) => value == Value::Undefined,
                (ChainStyle::Or, BinaryOp::NotEqEq) => matches!(value, Value::Null | Value::Literal),
                (ChainStyle::Or, BinaryOp::NotEq) => value == Value::Literal,
                _ => false,
            };
            accepted.then(|| access_path(target, file)).flatten()
        }
        Expr::Bin(bin) if style == ChainStyle::And && is_relational(bin.op) => {
            access_path(&bin.left, file).or_else(|| match bin.op {
                BinaryOp::InstanceOf => None,
                _ => access_path(&bin.right, file),
            })
        }
        _ => match style {
            ChainStyle::And => access_path(expr, file),
            ChainStyle::Or => None,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value {
    Null,
    Undefined,
    /// Any other literal.
    Literal,
    Other,
}

fn value_of(expr: &Expr) -> Value {
    match strip_parens(expr) {
        Expr::Lit(Lit::Null(_)) => Value::Null,
        Expr::Lit(_) => Value::Literal,
        Expr::Ident(ident) if &*ident.sym == "undefined" => Value::Undefined,
        Expr::Unary(UnaryExpr {
            op: UnaryOp::Void,
            arg,
            ..
        }) if matches!(**arg, Expr::Lit(_)) => Value::Undefined,
        Expr::Unary(UnaryExpr {
            op: UnaryOp::Minus,
            arg,
            ..
        }) if matches!(**arg, Expr::Lit(Lit::Num(_) | Lit::BigInt(_))) => Value::Literal,
        Expr::Tpl(tpl) if tpl.exprs.is_empty() => Value::Literal,
        _ => Value::Other,
    }
}

/// Splits `x op v` or `v op x` into the compared expression and the value side.
fn split_comparison(bin: &BinExpr) -> Option<(&Expr, Value)> {
    match (value_of(&bin.left), value_of(&bin.right)) {
        (Value::Other, Value::Other) => None,
        (Value::Other, value) => Some((&bin.left, value)),
        (value, Value::Other) => Some((&bin.right, value)),
        _ => None,
    }
}

/// `typeof x === 'lit'` in either operand order.
fn typeof_comparison(bin: &BinExpr) -> Option<(&Expr, String)> {
    fn typeof_arg(expr: &Expr) -> Option<&Expr> {
        match strip_parens(expr) {
            Expr::Unary(UnaryExpr {
                op: UnaryOp::TypeOf,
                arg,
                ..
            }) => Some(&**arg),
            _ => None,
        }
    }
    let string = |expr: &Expr| match strip_parens(expr) {
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        _ => None,
    };

    typeof_arg(&bin.left)
        .zip(string(&bin.right))
        .or_else(|| typeof_arg(&bin.right).zip(string(&bin.left)))
}

fn is_equality(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::EqEq | BinaryOp::NotEq | BinaryOp::EqEqEq | BinaryOp::NotEqEq
    )
}

fn is_relational(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq | BinaryOp::InstanceOf
    )
}
