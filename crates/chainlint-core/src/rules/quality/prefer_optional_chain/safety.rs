//! Decides whether collapsing a guard into `?.` keeps the expression's value.

use super::PreferOptionalChainOptions;
use super::classify::{CheckKind, Comparison};
use crate::semantic::{Primitive, TypeCategory, TypeKind, TypeShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Verdict {
    /// The short-circuit value can only be nullish.
    Safe,
    /// The guard may short-circuit on a falsy non-nullish value.
    Unsafe,
    /// The guard cannot be turned into `?.` at all.
    Disqualified,
}

impl Verdict {
    pub fn reason(self) -> &'static str {
        match self {
            Verdict::Safe => "nullish-only guards",
            Verdict::Unsafe => "guard may short-circuit on a falsy value",
            Verdict::Disqualified => "guard is excluded by its type or options",
        }
    }
}

const CATEGORIES: [TypeCategory; 6] = [
    TypeCategory::Any,
    TypeCategory::Unknown,
    TypeCategory::String,
    TypeCategory::Number,
    TypeCategory::Boolean,
    TypeCategory::BigInt,
];

fn is_checked(category: TypeCategory, options: &PreferOptionalChainOptions) -> bool {
    match category {
        TypeCategory::Any => options.check_any,
        TypeCategory::Unknown => options.check_unknown,
        TypeCategory::String => options.check_string,
        TypeCategory::Number => options.check_number,
        TypeCategory::Boolean => options.check_boolean,
        TypeCategory::BigInt => options.check_big_int,
    }
}

/// Verdict for one level of a chain: every check written against the same path.
pub(super) fn judge_level(
    checks: &[CheckKind],
    shape: &TypeShape,
    options: &PreferOptionalChainOptions,
) -> Verdict {
    if checks.is_empty() || !is_complete(checks, shape) {
        return Verdict::Disqualified;
    }

    if checks.iter().any(|kind| kind.is_truthiness()) {
        judge_truthiness(shape, options)
    } else {
        Verdict::Safe
    }
}

/// Verdict for a bare truthiness test of a value with type `shape`.
pub(super) fn judge_truthiness(shape: &TypeShape, options: &PreferOptionalChainOptions) -> Verdict {
    if options.require_nullish && !shape.includes_nullish() {
        return Verdict::Disqualified;
    }

    let gated = CATEGORIES
        .iter()
        .any(|&category| !is_checked(category, options) && shape.is_exactly(category));
    if gated {
        return Verdict::Disqualified;
    }

    if shape.has_falsy_literal() && !options.allow_unsafe_fixes {
        return Verdict::Disqualified;
    }

    if may_be_falsy(shape) {
        Verdict::Unsafe
    } else {
        Verdict::Safe
    }
}

/// Whether the checks on one path together rule out both `null` and `undefined`.
fn is_complete(checks: &[CheckKind], shape: &TypeShape) -> bool {
    let mut rules_out_null = false;
    let mut rules_out_undefined = false;

    for kind in checks {
        match kind.comparison() {
            Some(Comparison::StrictNull) => rules_out_null = true,
            Some(Comparison::StrictUndefined) => rules_out_undefined = true,
            _ => return true,
        }
    }

    let unconstrained = shape.is_unconstrained();
    (rules_out_null || unconstrained || !shape.includes_null())
        && (rules_out_undefined || unconstrained || !shape.includes_undefined())
}

fn may_be_falsy(shape: &TypeShape) -> bool {
    shape.non_nullish().any(|kind| match kind {
        TypeKind::Object => false,
        TypeKind::Literal { falsy, .. } => falsy,
        TypeKind::Primitive(primitive) => primitive != Primitive::Symbol,
        TypeKind::Any | TypeKind::Unknown | TypeKind::Opaque => true,
        TypeKind::Null | TypeKind::Undefined => false,
    })
}
