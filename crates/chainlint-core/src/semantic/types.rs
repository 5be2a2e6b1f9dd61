//! Declared-type oracle
//!
//! Answers type questions about expressions using only what is written in the
//! same file: annotations, interfaces, type aliases, class members and simple
//! initializers. Whatever cannot be resolved is reported as [`TypeKind::Opaque`].

use std::collections::HashMap;

use swc_common::{BytePos, Span};
use swc_ecma_ast::{
    ArrowExpr, BindingIdent, BlockStmt, Callee, Class, ClassDecl, ClassExpr, ClassMember, Constructor, Expr,
    FnDecl, Function, Lit, MemberProp, MethodKind, Module, ObjectLit, OptChainBase, Param,
    ParamOrTsParamProp, Pat, Prop, PropName, PropOrSpread, TsEntityName, TsFnOrConstructorType,
    TsInterfaceDecl, TsKeywordTypeKind, TsLit, TsParamPropParam, TsTupleElement, TsType,
    TsTypeAliasDecl, TsTypeElement, TsTypeOperatorOp, TsTypeQueryExpr, TsTypeRef,
    TsUnionOrIntersectionType, UnaryOp, VarDecl, VarDeclKind,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::parser::ParsedFile;

const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    BigInt,
    Symbol,
}

/// One constituent of a (possibly union) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Null,
    Undefined,
    Any,
    Unknown,
    Primitive(Primitive),
    Literal { primitive: Primitive, falsy: bool },
    Object,
    Opaque,
}

impl TypeKind {
    pub fn is_nullish(self) -> bool {
        matches!(self, TypeKind::Null | TypeKind::Undefined)
    }

    pub fn primitive(self) -> Option<Primitive> {
        match self {
            TypeKind::Primitive(p) | TypeKind::Literal { primitive: p, .. } => Some(p),
            _ => None,
        }
    }

    fn widened(self) -> Self {
        match self {
            TypeKind::Literal { primitive, .. } => TypeKind::Primitive(primitive),
            other => other,
        }
    }
}

/// Categories that `checkX` options refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCategory {
    String,
    Number,
    Boolean,
    BigInt,
    Any,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeShape {
    kinds: Vec<TypeKind>,
}

impl TypeShape {
    pub fn new(kinds: impl IntoIterator<Item = TypeKind>) -> Self {
        let mut unique = Vec::new();
        for kind in kinds {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        Self { kinds: unique }
    }

    pub fn opaque() -> Self {
        Self::new([TypeKind::Opaque])
    }

    pub fn kinds(&self) -> &[TypeKind] {
        &self.kinds
    }

    pub fn includes_null(&self) -> bool {
        self.kinds.contains(&TypeKind::Null)
    }

    pub fn includes_undefined(&self) -> bool {
        self.kinds.contains(&TypeKind::Undefined)
    }

    pub fn includes_nullish(&self) -> bool {
        self.includes_null() || self.includes_undefined()
    }

    /// Opaque, `any` and `unknown` say nothing about which nullish value is possible.
    pub fn is_unconstrained(&self) -> bool {
        self.kinds
            .iter()
            .any(|k| matches!(k, TypeKind::Opaque | TypeKind::Any | TypeKind::Unknown))
    }

    pub fn non_nullish(&self) -> impl Iterator<Item = TypeKind> + '_ {
        self.kinds.iter().copied().filter(|k| !k.is_nullish())
    }

    /// True when the type, ignoring `null`/`undefined`, is only `category`.
    pub fn is_exactly(&self, category: TypeCategory) -> bool {
        match category {
            TypeCategory::Any => self.kinds.contains(&TypeKind::Any),
            TypeCategory::Unknown => {
                self.kinds.contains(&TypeKind::Unknown) && !self.kinds.contains(&TypeKind::Any)
            }
            _ => {
                let Some(primitive) = category.primitive() else {
                    return false;
                };
                let mut rest = self.non_nullish().peekable();
                rest.peek().is_some() && rest.all(|k| k.primitive() == Some(primitive))
            }
        }
    }

    pub fn has_falsy_literal(&self) -> bool {
        self.kinds
            .iter()
            .any(|k| matches!(k, TypeKind::Literal { falsy: true, .. }))
    }
}

impl TypeCategory {
    pub fn primitive(self) -> Option<Primitive> {
        match self {
            TypeCategory::String => Some(Primitive::String),
            TypeCategory::Number => Some(Primitive::Number),
            TypeCategory::Boolean => Some(Primitive::Boolean),
            TypeCategory::BigInt => Some(Primitive::BigInt),
            TypeCategory::Any | TypeCategory::Unknown => None,
        }
    }
}

pub trait TypeOracle {
    fn type_of(&self, expr: &Expr) -> TypeShape;
}

/// An oracle that knows nothing; every expression is opaque.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntypedOracle;

impl TypeOracle for UntypedOracle {
    fn type_of(&self, _expr: &Expr) -> TypeShape {
        TypeShape::opaque()
    }
}

#[derive(Debug, Clone)]
enum InitValue {
    Kind(TypeKind),
    Expr(Box<Expr>),
    Annotated(Box<TsType>),
    Object(Vec<(String, InitValue)>),
    Function(Option<Box<TsType>>),
    Array,
}

#[derive(Debug, Clone)]
enum Declared {
    Annotated { ty: Box<TsType>, optional: bool },
    Init { value: InitValue, widen: bool },
    Function(Option<Box<TsType>>),
    Class,
    Untyped,
}

#[derive(Debug, Clone)]
struct Binding {
    scope: Span,
    pos: BytePos,
    declared: Declared,
}

#[derive(Debug, Clone, Default)]
struct ClassInfo {
    members: HashMap<String, Declared>,
    super_class: Option<String>,
}

#[derive(Debug, Clone)]
struct InterfaceInfo {
    members: Vec<TsTypeElement>,
    extends: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Resolved<'r> {
    Kind(TypeKind),
    Members(&'r [TsTypeElement]),
    Interface(&'r str),
    Intersection(&'r [Box<TsType>]),
    Array(Option<&'r TsType>),
    Tuple(&'r [TsTupleElement]),
    Record(&'r TsType),
    Function(Option<&'r TsType>),
    Class(&'r ClassInfo),
    Object(&'r [(String, InitValue)]),
}

enum Key {
    Name(String),
    Index(f64),
    Dynamic,
}

/// Declarations gathered from one module.
#[derive(Debug, Default)]
pub struct DeclaredTypes {
    bindings: HashMap<String, Vec<Binding>>,
    aliases: HashMap<String, Box<TsType>>,
    interfaces: HashMap<String, Vec<InterfaceInfo>>,
    classes: Vec<ClassInfo>,
    class_names: HashMap<String, usize>,
    class_scopes: Vec<(Span, usize)>,
}

impl DeclaredTypes {
    pub fn from_file(file: &ParsedFile) -> Self {
        file.module().map(Self::from_module).unwrap_or_default()
    }

    pub fn from_module(module: &Module) -> Self {
        let mut collector = Collector {
            table: DeclaredTypes::default(),
            scopes: vec![Span::new(BytePos(0), BytePos(u32::MAX))],
        };
        module.visit_with(&mut collector);
        collector.table
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    fn lookup(&self, name: &str, pos: BytePos) -> Option<&Binding> {
        let candidates = self.bindings.get(name)?;
        let innermost = candidates
            .iter()
            .filter(|b| contains(b.scope, pos))
            .map(|b| b.scope.hi.0 - b.scope.lo.0)
            .min()?;
        let in_scope = candidates
            .iter()
            .filter(|b| contains(b.scope, pos) && b.scope.hi.0 - b.scope.lo.0 == innermost);

        let mut first = None;
        let mut last_before = None;
        for binding in in_scope {
            first.get_or_insert(binding);
            if binding.pos <= pos {
                last_before = Some(binding);
            }
        }
        last_before.or(first)
    }

    fn enclosing_class(&self, pos: BytePos) -> Option<&ClassInfo> {
        self.class_scopes
            .iter()
            .filter(|(span, _)| contains(*span, pos))
            .min_by_key(|(span, _)| span.hi.0 - span.lo.0)
            .and_then(|(_, index)| self.classes.get(*index))
    }

    fn resolve_declared<'r>(&'r self, declared: &'r Declared, depth: usize) -> Vec<Resolved<'r>> {
        match declared {
            Declared::Annotated { ty, optional } => {
                let mut resolved = self.resolve_type(ty, depth + 1);
                if *optional {
                    resolved.push(Resolved::Kind(TypeKind::Undefined));
                }
                resolved
            }
            Declared::Init { value, widen } => self.resolve_init(value, *widen, depth + 1),
            Declared::Function(ret) => vec![Resolved::Function(ret.as_deref())],
            Declared::Class => vec![Resolved::Kind(TypeKind::Object)],
            Declared::Untyped => vec![Resolved::Kind(TypeKind::Opaque)],
        }
    }

    fn resolve_init<'r>(&'r self, value: &'r InitValue, widen: bool, depth: usize) -> Vec<Resolved<'r>> {
        match value {
            InitValue::Kind(kind) if widen => vec![Resolved::Kind(kind.widened())],
            InitValue::Kind(kind) => vec![Resolved::Kind(*kind)],
            InitValue::Expr(expr) => self.resolve_expr(expr, depth + 1),
            InitValue::Annotated(ty) => self.resolve_type(ty, depth + 1),
            InitValue::Object(props) => vec![Resolved::Object(props)],
            InitValue::Function(ret) => vec![Resolved::Function(ret.as_deref())],
            InitValue::Array => vec![Resolved::Array(None)],
        }
    }

    fn resolve_type<'r>(&'r self, ty: &'r TsType, depth: usize) -> Vec<Resolved<'r>> {
        if depth > MAX_DEPTH {
            return vec![Resolved::Kind(TypeKind::Opaque)];
        }

        let kind = |k| vec![Resolved::Kind(k)];
        match ty {
            TsType::TsKeywordType(keyword) => match keyword.kind {
                TsKeywordTypeKind::TsAnyKeyword => kind(TypeKind::Any),
                TsKeywordTypeKind::TsUnknownKeyword => kind(TypeKind::Unknown),
                TsKeywordTypeKind::TsNumberKeyword => kind(TypeKind::Primitive(Primitive::Number)),
                TsKeywordTypeKind::TsStringKeyword => kind(TypeKind::Primitive(Primitive::String)),
                TsKeywordTypeKind::TsBooleanKeyword => {
                    kind(TypeKind::Primitive(Primitive::Boolean))
                }
                TsKeywordTypeKind::TsBigIntKeyword => kind(TypeKind::Primitive(Primitive::BigInt)),
                TsKeywordTypeKind::TsSymbolKeyword => kind(TypeKind::Primitive(Primitive::Symbol)),
                TsKeywordTypeKind::TsObjectKeyword => kind(TypeKind::Object),
                TsKeywordTypeKind::TsVoidKeyword | TsKeywordTypeKind::TsUndefinedKeyword => {
                    kind(TypeKind::Undefined)
                }
                TsKeywordTypeKind::TsNullKeyword => kind(TypeKind::Null),
                TsKeywordTypeKind::TsNeverKeyword => Vec::new(),
                TsKeywordTypeKind::TsIntrinsicKeyword => kind(TypeKind::Opaque),
            },
            TsType::TsLitType(lit) => kind(match &lit.lit {
                TsLit::Number(n) => TypeKind::Literal {
                    primitive: Primitive::Number,
                    falsy: n.value == 0.0,
                },
                TsLit::Str(s) => TypeKind::Literal {
                    primitive: Primitive::String,
                    falsy: s.value.to_string().is_empty(),
                },
                TsLit::Bool(b) => TypeKind::Literal {
                    primitive: Primitive::Boolean,
                    falsy: !b.value,
                },
                TsLit::BigInt(b) => TypeKind::Literal {
                    primitive: Primitive::BigInt,
                    falsy: b.value.to_string() == "0",
                },
                TsLit::Tpl(_) => TypeKind::Primitive(Primitive::String),
            }),
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                union
                    .types
                    .iter()
                    .flat_map(|t| self.resolve_type(t, depth + 1))
                    .collect()
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(
                intersection,
            )) => {
                // Branded primitives (`string & { __brand: 'id' }`) behave like the primitive.
                let primitives: Vec<_> = intersection
                    .types
                    .iter()
                    .flat_map(|t| self.resolve_type(t, depth + 1))
                    .filter(|r| matches!(r, Resolved::Kind(k) if k.primitive().is_some()))
                    .collect();
                if primitives.is_empty() {
                    vec![Resolved::Intersection(&intersection.types)]
                } else {
                    primitives
                }
            }
            TsType::TsParenthesizedType(paren) => self.resolve_type(&paren.type_ann, depth + 1),
            TsType::TsTypeLit(lit) => vec![Resolved::Members(&lit.members)],
            TsType::TsArrayType(array) => vec![Resolved::Array(Some(&array.elem_type))],
            TsType::TsTupleType(tuple) => vec![Resolved::Tuple(&tuple.elem_types)],
            TsType::TsOptionalType(optional) => {
                let mut resolved = self.resolve_type(&optional.type_ann, depth + 1);
                resolved.push(Resolved::Kind(TypeKind::Undefined));
                resolved
            }
            TsType::TsFnOrConstructorType(TsFnOrConstructorType::TsFnType(func)) => {
                vec![Resolved::Function(Some(&func.type_ann.type_ann))]
            }
            TsType::TsFnOrConstructorType(TsFnOrConstructorType::TsConstructorType(_)) => {
                kind(TypeKind::Object)
            }
            TsType::TsTypeRef(reference) => self.resolve_type_ref(reference, depth),
            TsType::TsTypeQuery(query) => match &query.expr_name {
                TsTypeQueryExpr::TsEntityName(TsEntityName::Ident(ident)) => self
                    .lookup(&ident.sym, query.span.lo)
                    .map(|b| self.resolve_declared(&b.declared, depth + 1))
                    .unwrap_or_else(|| kind(TypeKind::Opaque)),
                _ => kind(TypeKind::Opaque),
            },
            TsType::TsTypeOperator(operator) => match operator.op {
                TsTypeOperatorOp::ReadOnly => self.resolve_type(&operator.type_ann, depth + 1),
                TsTypeOperatorOp::Unique => kind(TypeKind::Primitive(Primitive::Symbol)),
                TsTypeOperatorOp::KeyOf => kind(TypeKind::Opaque),
            },
            TsType::TsTypePredicate(_) => kind(TypeKind::Primitive(Primitive::Boolean)),
            _ => kind(TypeKind::Opaque),
        }
    }

    fn resolve_type_ref<'r>(&'r self, reference: &'r TsTypeRef, depth: usize) -> Vec<Resolved<'r>> {
        let TsEntityName::Ident(ident) = &reference.type_name else {
            return vec![Resolved::Kind(TypeKind::Opaque)];
        };
        let name: &str = &ident.sym;
        let args: Vec<&TsType> = reference
            .type_params
            .as_ref()
            .map(|p| p.params.iter().map(|t| &**t).collect())
            .unwrap_or_default();

        if let Some(alias) = self.aliases.get(name) {
            return self.resolve_type(alias, depth + 1);
        }
        if let Some((key, _)) = self.interfaces.get_key_value(name) {
            return vec![Resolved::Interface(key)];
        }
        if let Some(info) = self.class_names.get(name).and_then(|i| self.classes.get(*i)) {
            return vec![Resolved::Class(info)];
        }

        match name {
            "Array" | "ReadonlyArray" => vec![Resolved::Array(args.first().copied())],
            "Record" => match args.get(1).copied() {
                Some(value) => vec![Resolved::Record(value)],
                None => vec![Resolved::Kind(TypeKind::Object)],
            },
            "NonNullable" => match args.first().copied() {
                Some(inner) => strip_nullish(self.resolve_type(inner, depth + 1)),
                None => vec![Resolved::Kind(TypeKind::Opaque)],
            },
            "Readonly" => match args.first().copied() {
                Some(inner) => self.resolve_type(inner, depth + 1),
                None => vec![Resolved::Kind(TypeKind::Opaque)],
            },
            "Map" | "Set" | "WeakMap" | "WeakSet" | "Promise" | "Date" | "RegExp" | "Function"
            | "Object" | "Error" => vec![Resolved::Kind(TypeKind::Object)],
            _ => vec![Resolved::Kind(TypeKind::Opaque)],
        }
    }

    fn resolve_expr<'r>(&'r self, expr: &'r Expr, depth: usize) -> Vec<Resolved<'r>> {
        if depth > MAX_DEPTH {
            return vec![Resolved::Kind(TypeKind::Opaque)];
        }

        let kind = |k| vec![Resolved::Kind(k)];
        match expr {
            Expr::Ident(ident) => match self.lookup(&ident.sym, ident.span.lo) {
                Some(binding) => self.resolve_declared(&binding.declared, depth + 1),
                None if &*ident.sym == "undefined" => kind(TypeKind::Undefined),
                None => kind(TypeKind::Opaque),
            },
            Expr::This(this) => match self.enclosing_class(this.span.lo) {
                Some(info) => vec![Resolved::Class(info)],
                None => kind(TypeKind::Opaque),
            },
            Expr::Paren(paren) => self.resolve_expr(&paren.expr, depth + 1),
            Expr::TsNonNull(non_null) => strip_nullish(self.resolve_expr(&non_null.expr, depth + 1)),
            Expr::TsAs(as_expr) => self.resolve_type(&as_expr.type_ann, depth + 1),
            Expr::TsTypeAssertion(assertion) => self.resolve_type(&assertion.type_ann, depth + 1),
            Expr::TsSatisfies(satisfies) => self.resolve_expr(&satisfies.expr, depth + 1),
            Expr::TsConstAssertion(assertion) => self.resolve_expr(&assertion.expr, depth + 1),
            Expr::Member(member) => {
                let target = self.resolve_expr(&member.obj, depth + 1);
                self.member(&target, &member_key(&member.prop), depth + 1)
            }
            Expr::OptChain(chain) => {
                let mut resolved = match &*chain.base {
                    OptChainBase::Member(member) => {
                        let target = self.resolve_expr(&member.obj, depth + 1);
                        self.member(&target, &member_key(&member.prop), depth + 1)
                    }
                    OptChainBase::Call(call) => {
                        let callee = self.resolve_expr(&call.callee, depth + 1);
                        self.call(&callee, depth + 1)
                    }
                };
                if chain.optional {
                    resolved.push(Resolved::Kind(TypeKind::Undefined));
                }
                resolved
            }
            Expr::Call(call) => match &call.callee {
                Callee::Expr(callee) => {
                    let callee = self.resolve_expr(callee, depth + 1);
                    self.call(&callee, depth + 1)
                }
                _ => kind(TypeKind::Opaque),
            },
            Expr::New(new) => match &*new.callee {
                Expr::Ident(ident) => match self
                    .class_names
                    .get(&*ident.sym)
                    .and_then(|i| self.classes.get(*i))
                {
                    Some(info) => vec![Resolved::Class(info)],
                    None => kind(TypeKind::Object),
                },
                _ => kind(TypeKind::Object),
            },
            Expr::Lit(lit) => kind(literal_kind(lit)),
            Expr::Tpl(_) => kind(TypeKind::Primitive(Primitive::String)),
            Expr::Unary(unary) => kind(unary_kind(unary.op)),
            Expr::Object(_) | Expr::Class(_) => kind(TypeKind::Object),
            Expr::Array(_) => vec![Resolved::Array(None)],
            Expr::Arrow(arrow) => vec![Resolved::Function(
                arrow.return_type.as_deref().map(|a| &*a.type_ann),
            )],
            Expr::Fn(func) => vec![Resolved::Function(
                func.function.return_type.as_deref().map(|a| &*a.type_ann),
            )],
            _ => kind(TypeKind::Opaque),
        }
    }

    fn call<'r>(&'r self, callee: &[Resolved<'r>], depth: usize) -> Vec<Resolved<'r>> {
        let mut out = Vec::new();
        for resolved in callee {
            match resolved {
                Resolved::Function(Some(ret)) => out.extend(self.resolve_type(ret, depth + 1)),
                Resolved::Kind(TypeKind::Any) => out.push(Resolved::Kind(TypeKind::Any)),
                Resolved::Kind(k) if k.is_nullish() => {}
                Resolved::Members(members) => match call_signature(members) {
                    Some(ret) => out.extend(self.resolve_type(ret, depth + 1)),
                    None => out.push(Resolved::Kind(TypeKind::Opaque)),
                },
                _ => out.push(Resolved::Kind(TypeKind::Opaque)),
            }
        }
        non_empty(out)
    }

    fn member<'r>(&'r self, target: &[Resolved<'r>], key: &Key, depth: usize) -> Vec<Resolved<'r>> {
        if depth > MAX_DEPTH {
            return vec![Resolved::Kind(TypeKind::Opaque)];
        }

        let mut out = Vec::new();
        for resolved in target {
            match *resolved {
                Resolved::Kind(k) if k.is_nullish() => {}
                Resolved::Kind(TypeKind::Any) => out.push(Resolved::Kind(TypeKind::Any)),
                Resolved::Kind(k) if k.primitive() == Some(Primitive::String) => match key {
                    Key::Name(name) if name == "length" => {
                        out.push(Resolved::Kind(TypeKind::Primitive(Primitive::Number)))
                    }
                    Key::Index(_) => out.push(Resolved::Kind(TypeKind::Primitive(Primitive::String))),
                    _ => out.push(Resolved::Kind(TypeKind::Opaque)),
                },
                Resolved::Kind(_) | Resolved::Function(_) => {
                    out.push(Resolved::Kind(TypeKind::Opaque))
                }
                Resolved::Members(members) => out.extend(
                    self.lookup_elements(members, key, depth)
                        .unwrap_or_else(|| vec![Resolved::Kind(TypeKind::Opaque)]),
                ),
                Resolved::Interface(name) => out.extend(
                    self.lookup_interface(name, key, depth)
                        .unwrap_or_else(|| vec![Resolved::Kind(TypeKind::Opaque)]),
                ),
                Resolved::Intersection(parts) => {
                    let found: Vec<_> = parts
                        .iter()
                        .flat_map(|part| {
                            let resolved = self.resolve_type(part, depth + 1);
                            self.member(&resolved, key, depth + 1)
                        })
                        .filter(|r| !matches!(r, Resolved::Kind(TypeKind::Opaque)))
                        .collect();
                    out.extend(non_empty(found));
                }
                Resolved::Array(element) => match key {
                    Key::Name(name) if name == "length" => {
                        out.push(Resolved::Kind(TypeKind::Primitive(Primitive::Number)))
                    }
                    Key::Index(_) | Key::Dynamic => match element {
                        Some(element) => out.extend(self.resolve_type(element, depth + 1)),
                        None => out.push(Resolved::Kind(TypeKind::Opaque)),
                    },
                    Key::Name(_) => out.push(Resolved::Kind(TypeKind::Opaque)),
                },
                Resolved::Tuple(elements) => match key {
                    Key::Name(name) if name == "length" => {
                        out.push(Resolved::Kind(TypeKind::Primitive(Primitive::Number)))
                    }
                    Key::Index(index) => match elements.get(*index as usize) {
                        Some(element) if index.fract() == 0.0 && *index >= 0.0 => {
                            out.extend(self.resolve_type(&element.ty, depth + 1))
                        }
                        _ => out.push(Resolved::Kind(TypeKind::Undefined)),
                    },
                    Key::Dynamic => out.extend(
                        elements
                            .iter()
                            .flat_map(|e| self.resolve_type(&e.ty, depth + 1)),
                    ),
                    Key::Name(_) => out.push(Resolved::Kind(TypeKind::Opaque)),
                },
                Resolved::Record(value) => out.extend(self.resolve_type(value, depth + 1)),
                Resolved::Class(info) => out.extend(
                    self.lookup_class(info, key, depth)
                        .unwrap_or_else(|| vec![Resolved::Kind(TypeKind::Opaque)]),
                ),
                Resolved::Object(props) => {
                    let found = match key {
                        Key::Name(name) => props.iter().find(|(prop, _)| prop == name),
                        _ => None,
                    };
                    match found {
                        Some((_, value)) => out.extend(self.resolve_init(value, true, depth + 1)),
                        None => out.push(Resolved::Kind(TypeKind::Opaque)),
                    }
                }
            }
        }
        non_empty(out)
    }

    fn lookup_elements<'r>(
        &'r self,
        members: &'r [TsTypeElement],
        key: &Key,
        depth: usize,
    ) -> Option<Vec<Resolved<'r>>> {
        if let Key::Name(name) = key {
            for member in members {
                match member {
                    TsTypeElement::TsPropertySignature(prop)
                        if !prop.computed && prop_key(&prop.key).as_deref() == Some(name) =>
                    {
                        let mut resolved = match &prop.type_ann {
                            Some(ann) => self.resolve_type(&ann.type_ann, depth + 1),
                            None => vec![Resolved::Kind(TypeKind::Opaque)],
                        };
                        if prop.optional {
                            resolved.push(Resolved::Kind(TypeKind::Undefined));
                        }
                        return Some(resolved);
                    }
                    TsTypeElement::TsMethodSignature(method)
                        if !method.computed && prop_key(&method.key).as_deref() == Some(name) =>
                    {
                        let mut resolved = vec![Resolved::Function(
                            method.type_ann.as_deref().map(|a| &*a.type_ann),
                        )];
                        if method.optional {
                            resolved.push(Resolved::Kind(TypeKind::Undefined));
                        }
                        return Some(resolved);
                    }
                    TsTypeElement::TsGetterSignature(getter)
                        if !getter.computed && prop_key(&getter.key).as_deref() == Some(name) =>
                    {
                        return Some(match &getter.type_ann {
                            Some(ann) => self.resolve_type(&ann.type_ann, depth + 1),
                            None => vec![Resolved::Kind(TypeKind::Opaque)],
                        });
                    }
                    _ => {}
                }
            }
        }

        members.iter().find_map(|member| match member {
            TsTypeElement::TsIndexSignature(index) => Some(match &index.type_ann {
                Some(ann) => self.resolve_type(&ann.type_ann, depth + 1),
                None => vec![Resolved::Kind(TypeKind::Opaque)],
            }),
            _ => None,
        })
    }

    fn lookup_interface<'r>(&'r self, name: &str, key: &Key, depth: usize) -> Option<Vec<Resolved<'r>>> {
        if depth > MAX_DEPTH {
            return None;
        }
        let declarations = self.interfaces.get(name)?;
        declarations
            .iter()
            .find_map(|decl| self.lookup_elements(&decl.members, key, depth))
            .or_else(|| {
                declarations
                    .iter()
                    .flat_map(|decl| decl.extends.iter())
                    .find_map(|parent| self.lookup_interface(parent, key, depth + 1))
            })
    }

    fn lookup_class<'r>(&'r self, info: &'r ClassInfo, key: &Key, depth: usize) -> Option<Vec<Resolved<'r>>> {
        if depth > MAX_DEPTH {
            return None;
        }
        let Key::Name(name) = key else {
            return None;
        };
        match info.members.get(name) {
            Some(declared) => Some(self.resolve_declared(declared, depth + 1)),
            None => {
                let parent = info
                    .super_class
                    .as_ref()
                    .and_then(|s| self.class_names.get(s))
                    .and_then(|i| self.classes.get(*i))?;
                self.lookup_class(parent, key, depth + 1)
            }
        }
    }

    fn shape(resolved: &[Resolved<'_>]) -> TypeShape {
        TypeShape::new(resolved.iter().map(|r| match r {
            Resolved::Kind(kind) => *kind,
            _ => TypeKind::Object,
        }))
    }
}

impl TypeOracle for DeclaredTypes {
    fn type_of(&self, expr: &Expr) -> TypeShape {
        Self::shape(&self.resolve_expr(expr, 0))
    }
}

fn contains(span: Span, pos: BytePos) -> bool {
    span.lo <= pos && pos < span.hi
}

fn strip_nullish(resolved: Vec<Resolved<'_>>) -> Vec<Resolved<'_>> {
    resolved
        .into_iter()
        .filter(|r| !matches!(r, Resolved::Kind(k) if k.is_nullish()))
        .collect()
}

fn non_empty(resolved: Vec<Resolved<'_>>) -> Vec<Resolved<'_>> {
    if resolved.is_empty() {
        vec![Resolved::Kind(TypeKind::Opaque)]
    } else {
        resolved
    }
}

fn call_signature(members: &[TsTypeElement]) -> Option<&TsType> {
    members.iter().find_map(|member| match member {
        TsTypeElement::TsCallSignatureDecl(call) => call.type_ann.as_deref().map(|a| &*a.type_ann),
        _ => None,
    })
}

fn member_key(prop: &MemberProp) -> Key {
    match prop {
        MemberProp::Ident(ident) => Key::Name(ident.sym.to_string()),
        MemberProp::PrivateName(private) => Key::Name(format!("#{}", private.name)),
        MemberProp::Computed(computed) => match &*computed.expr {
            Expr::Lit(Lit::Str(s)) => Key::Name(s.value.to_string()),
            Expr::Lit(Lit::Num(n)) => Key::Index(n.value),
            _ => Key::Dynamic,
        },
    }
}

fn prop_key(key: &Expr) -> Option<String> {
    match key {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Lit(Lit::Str(s)) => Some(s.value.to_string()),
        Expr::Lit(Lit::Num(n)) => Some(n.value.to_string()),
        _ => None,
    }
}

fn prop_name(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        PropName::Num(n) => Some(n.value.to_string()),
        _ => None,
    }
}

fn literal_kind(lit: &Lit) -> TypeKind {
    match lit {
        Lit::Str(s) => TypeKind::Literal {
            primitive: Primitive::String,
            falsy: s.value.to_string().is_empty(),
        },
        Lit::Bool(b) => TypeKind::Literal {
            primitive: Primitive::Boolean,
            falsy: !b.value,
        },
        Lit::Num(n) => TypeKind::Literal {
            primitive: Primitive::Number,
            falsy: n.value == 0.0 || n.value.is_nan(),
        },
        Lit::BigInt(b) => TypeKind::Literal {
            primitive: Primitive::BigInt,
            falsy: b.value.to_string() == "0",
        },
        Lit::Null(_) => TypeKind::Null,
        Lit::JSXText(_) => TypeKind::Primitive(Primitive::String),
        Lit::Regex(_) => TypeKind::Object,
    }
}

fn unary_kind(op: UnaryOp) -> TypeKind {
    match op {
        UnaryOp::Bang | UnaryOp::Delete => TypeKind::Primitive(Primitive::Boolean),
        UnaryOp::TypeOf => TypeKind::Primitive(Primitive::String),
        UnaryOp::Void => TypeKind::Undefined,
        UnaryOp::Minus | UnaryOp::Plus | UnaryOp::Tilde => TypeKind::Primitive(Primitive::Number),
    }
}

fn init_value(expr: &Expr) -> InitValue {
    match expr {
        Expr::Lit(lit) => InitValue::Kind(literal_kind(lit)),
        Expr::Tpl(_) => InitValue::Kind(TypeKind::Primitive(Primitive::String)),
        Expr::Unary(unary) => InitValue::Kind(unary_kind(unary.op)),
        Expr::Ident(ident) if &*ident.sym == "undefined" => InitValue::Kind(TypeKind::Undefined),
        Expr::Object(object) => InitValue::Object(object_props(object)),
        Expr::Arrow(arrow) => InitValue::Function(arrow.return_type.as_ref().map(|a| a.type_ann.clone())),
        Expr::Fn(func) => {
            InitValue::Function(func.function.return_type.as_ref().map(|a| a.type_ann.clone()))
        }
        Expr::Array(_) => InitValue::Array,
        Expr::New(_) | Expr::Class(_) => InitValue::Kind(TypeKind::Object),
        Expr::TsAs(as_expr) => InitValue::Annotated(as_expr.type_ann.clone()),
        Expr::TsTypeAssertion(assertion) => InitValue::Annotated(assertion.type_ann.clone()),
        Expr::Paren(paren) => init_value(&paren.expr),
        Expr::TsConstAssertion(assertion) => init_value(&assertion.expr),
        Expr::Ident(_)
        | Expr::This(_)
        | Expr::Member(_)
        | Expr::OptChain(_)
        | Expr::Call(_)
        | Expr::TsNonNull(_)
        | Expr::TsSatisfies(_) => InitValue::Expr(Box::new(expr.clone())),
        _ => InitValue::Kind(TypeKind::Opaque),
    }
}

fn object_props(object: &ObjectLit) -> Vec<(String, InitValue)> {
    object
        .props
        .iter()
        .filter_map(|prop| match prop {
            PropOrSpread::Prop(prop) => match &**prop {
                Prop::KeyValue(kv) => Some((prop_name(&kv.key)?, init_value(&kv.value))),
                Prop::Shorthand(ident) => Some((
                    ident.sym.to_string(),
                    InitValue::Expr(Box::new(Expr::Ident(ident.clone()))),
                )),
                Prop::Method(method) => Some((
                    prop_name(&method.key)?,
                    InitValue::Function(
                        method.function.return_type.as_ref().map(|a| a.type_ann.clone()),
                    ),
                )),
                _ => None,
            },
            PropOrSpread::Spread(_) => None,
        })
        .collect()
}

struct Collector {
    table: DeclaredTypes,
    scopes: Vec<Span>,
}

impl Collector {
    fn scope(&self) -> Span {
        self.scopes
            .last()
            .copied()
            .unwrap_or_else(|| Span::new(BytePos(0), BytePos(u32::MAX)))
    }

    fn bind(&mut self, name: &str, pos: BytePos, declared: Declared) {
        let binding = Binding {
            scope: self.scope(),
            pos,
            declared,
        };
        self.table
            .bindings
            .entry(name.to_string())
            .or_default()
            .push(binding);
    }

    fn bind_ident(&mut self, ident: &BindingIdent, init: Option<&Expr>, widen: bool) {
        let declared = match (&ident.type_ann, init) {
            (Some(ann), _) => Declared::Annotated {
                ty: ann.type_ann.clone(),
                optional: ident.id.optional,
            },
            (None, Some(init)) => Declared::Init {
                value: init_value(init),
                widen,
            },
            (None, None) => Declared::Untyped,
        };
        self.bind(&ident.id.sym, ident.id.span.lo, declared);
    }

    fn bind_pat(&mut self, pat: &Pat, init: Option<&Expr>, widen: bool) {
        match pat {
            Pat::Ident(ident) => self.bind_ident(ident, init, widen),
            Pat::Assign(assign) => self.bind_pat(&assign.left, Some(&assign.right), true),
            Pat::Rest(rest) => self.bind_pat(&rest.arg, None, true),
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.bind_pat(elem, None, true);
                }
            }
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        swc_ecma_ast::ObjectPatProp::KeyValue(kv) => {
                            self.bind_pat(&kv.value, None, true)
                        }
                        swc_ecma_ast::ObjectPatProp::Assign(assign) => {
                            self.bind(&assign.key.id.sym, assign.key.id.span.lo, Declared::Untyped)
                        }
                        swc_ecma_ast::ObjectPatProp::Rest(rest) => {
                            self.bind_pat(&rest.arg, None, true)
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn bind_params(&mut self, params: &[Param]) {
        for param in params {
            self.bind_pat(&param.pat, None, true);
        }
    }

    fn class_info(&mut self, class: &Class) -> usize {
        let mut info = ClassInfo {
            super_class: match class.super_class.as_deref() {
                Some(Expr::Ident(ident)) => Some(ident.sym.to_string()),
                _ => None,
            },
            ..Default::default()
        };

        for member in &class.body {
            match member {
                ClassMember::ClassProp(prop) if !prop.is_static => {
                    if let Some(name) = prop_name(&prop.key) {
                        let declared = member_declared(
                            prop.type_ann.as_deref().map(|a| &*a.type_ann),
                            prop.value.as_deref(),
                            prop.is_optional,
                        );
                        info.members.insert(name, declared);
                    }
                }
                ClassMember::PrivateProp(prop) if !prop.is_static => {
                    info.members.insert(
                        format!("#{}", prop.key.name),
                        member_declared(
                            prop.type_ann.as_deref().map(|a| &*a.type_ann),
                            prop.value.as_deref(),
                            prop.is_optional,
                        ),
                    );
                }
                ClassMember::Method(method) if !method.is_static => {
                    if let Some(name) = prop_name(&method.key) {
                        info.members.insert(name, method_declared(method.kind, &method.function));
                    }
                }
                ClassMember::PrivateMethod(method) if !method.is_static => {
                    info.members.insert(
                        format!("#{}", method.key.name),
                        method_declared(method.kind, &method.function),
                    );
                }
                ClassMember::Constructor(ctor) => {
                    for param in &ctor.params {
                        if let ParamOrTsParamProp::TsParamProp(prop) = param {
                            let ident = match &prop.param {
                                TsParamPropParam::Ident(ident) => Some(ident),
                                TsParamPropParam::Assign(assign) => assign.left.as_ident(),
                            };
                            if let Some(ident) = ident {
                                info.members.insert(
                                    ident.id.sym.to_string(),
                                    member_declared(
                                        ident.type_ann.as_deref().map(|a| &*a.type_ann),
                                        None,
                                        ident.id.optional,
                                    ),
                                );
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        self.table.classes.push(info);
        self.table.classes.len() - 1
    }

    fn visit_class_body(&mut self, class: &Class, name: Option<&str>) {
        let index = self.class_info(class);
        if let Some(name) = name {
            self.table.class_names.insert(name.to_string(), index);
        }
        self.table.class_scopes.push((class.span, index));
        class.visit_children_with(self);
    }
}

fn member_declared(ty: Option<&TsType>, value: Option<&Expr>, optional: bool) -> Declared {
    match (ty, value) {
        (Some(ty), _) => Declared::Annotated {
            ty: Box::new(ty.clone()),
            optional,
        },
        (None, Some(value)) => Declared::Init {
            value: init_value(value),
            widen: true,
        },
        (None, None) => Declared::Untyped,
    }
}

fn method_declared(kind: MethodKind, function: &Function) -> Declared {
    let ret = function.return_type.as_ref().map(|a| a.type_ann.clone());
    match (kind, ret) {
        (MethodKind::Getter, Some(ty)) => Declared::Annotated { ty, optional: false },
        (MethodKind::Getter, None) => Declared::Untyped,
        (_, ret) => Declared::Function(ret),
    }
}

impl Visit for Collector {
    fn visit_var_decl(&mut self, node: &VarDecl) {
        let widen = node.kind != VarDeclKind::Const;
        for decl in &node.decls {
            self.bind_pat(&decl.name, decl.init.as_deref(), widen);
        }
        node.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        let ret = node.function.return_type.as_ref().map(|a| a.type_ann.clone());
        self.bind(&node.ident.sym, node.ident.span.lo, Declared::Function(ret));
        node.visit_children_with(self);
    }

    fn visit_function(&mut self, node: &Function) {
        self.scopes.push(node.span);
        self.bind_params(&node.params);
        node.visit_children_with(self);
        self.scopes.pop();
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        self.scopes.push(node.span);
        for param in &node.params {
            self.bind_pat(param, None, true);
        }
        node.visit_children_with(self);
        self.scopes.pop();
    }

    fn visit_constructor(&mut self, node: &Constructor) {
        self.scopes.push(node.span);
        for param in &node.params {
            match param {
                ParamOrTsParamProp::Param(param) => self.bind_pat(&param.pat, None, true),
                ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                    TsParamPropParam::Ident(ident) => self.bind_ident(ident, None, true),
                    TsParamPropParam::Assign(assign) => {
                        self.bind_pat(&assign.left, Some(&assign.right), true)
                    }
                },
            }
        }
        node.visit_children_with(self);
        self.scopes.pop();
    }

    fn visit_block_stmt(&mut self, node: &BlockStmt) {
        self.scopes.push(node.span);
        node.visit_children_with(self);
        self.scopes.pop();
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        self.bind(&node.ident.sym, node.ident.span.lo, Declared::Class);
        self.visit_class_body(&node.class, Some(&*node.ident.sym));
    }

    fn visit_class_expr(&mut self, node: &ClassExpr) {
        let name = node.ident.as_ref().map(|i| i.sym.to_string());
        self.visit_class_body(&node.class, name.as_deref());
    }

    fn visit_ts_interface_decl(&mut self, node: &TsInterfaceDecl) {
        let info = InterfaceInfo {
            members: node.body.body.clone(),
            extends: node
                .extends
                .iter()
                .filter_map(|parent| match &*parent.expr {
                    Expr::Ident(ident) => Some(ident.sym.to_string()),
                    _ => None,
                })
                .collect(),
        };
        self.table
            .interfaces
            .entry(node.id.sym.to_string())
            .or_default()
            .push(info);
    }

    fn visit_ts_type_alias_decl(&mut self, node: &TsTypeAliasDecl) {
        self.table
            .aliases
            .insert(node.id.sym.to_string(), node.type_ann.clone());
    }

    fn visit_ts_type(&mut self, _node: &TsType) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_ecma_ast::{ExprStmt, ModuleItem, Stmt};

    /// Type of the expression statement on the last line of `code`.
    fn type_of_last(code: &str) -> TypeShape {
        let parsed = ParsedFile::from_source("test.ts", code);
        let module = parsed.module().expect("parse failed");
        let types = DeclaredTypes::from_module(module);
        let expr = module
            .body
            .iter()
            .rev()
            .find_map(|item| match item {
                ModuleItem::Stmt(Stmt::Expr(ExprStmt { expr, .. })) => Some(expr),
                _ => None,
            })
            .expect("no expression statement");
        types.type_of(expr)
    }

    #[test]
    fn declared_union_with_null() {
        let shape = type_of_last("declare const foo: string | null;\nfoo;");

        assert!(shape.includes_null());
        assert!(!shape.includes_undefined());
        assert!(shape.is_exactly(TypeCategory::String));
        assert!(!shape.is_exactly(TypeCategory::Number));
    }

    #[test]
    fn optional_member_adds_undefined() {
        let shape = type_of_last("declare const foo: { bar?: { baz: number } };\nfoo.bar;");

        assert!(shape.includes_undefined());
        assert!(shape.kinds().contains(&TypeKind::Object));
    }

    #[test]
    fn member_through_interface_and_extends() {
        let code = r#"
interface Base { id: number }
interface Item extends Base { name?: string }
declare const item: Item | undefined;
item.id;
"#;
        let shape = type_of_last(code);

        assert_eq!(shape.kinds(), &[TypeKind::Primitive(Primitive::Number)]);
    }

    #[test]
    fn type_alias_and_falsy_literals() {
        let code = "type Flag = false | 0 | 'on';\ndeclare const flag: Flag;\nflag;";
        let shape = type_of_last(code);

        assert!(shape.has_falsy_literal());
        assert!(!shape.is_exactly(TypeCategory::Boolean));
    }

    #[test]
    fn untyped_identifier_is_opaque() {
        let shape = type_of_last("foo;");

        assert_eq!(shape, TypeShape::opaque());
        assert!(shape.is_unconstrained());
        assert!(!shape.includes_nullish());
    }

    #[test]
    fn any_and_unknown_are_exact_categories() {
        assert!(type_of_last("declare const a: any;\na;").is_exactly(TypeCategory::Any));
        let unknown = type_of_last("declare const u: unknown | null;\nu;");
        assert!(unknown.is_exactly(TypeCategory::Unknown));
        assert!(unknown.includes_null());
    }

    #[test]
    fn call_resolves_declared_return_type() {
        let code = "function load(): { data: string } | null { return null; }\nload();";
        let shape = type_of_last(code);

        assert!(shape.includes_null());
        assert!(shape.kinds().contains(&TypeKind::Object));
    }

    #[test]
    fn method_signature_call_resolves() {
        let code = "declare const api: { get(): number | undefined };\napi.get();";
        let shape = type_of_last(code);

        assert!(shape.includes_undefined());
        assert!(shape.is_exactly(TypeCategory::Number));
    }

    #[test]
    fn non_null_assertion_strips_nullish() {
        let shape = type_of_last("declare const foo: { a: 1 } | null;\nfoo!;");

        assert!(!shape.includes_nullish());
    }

    #[test]
    fn const_initializer_keeps_literal_and_let_widens() {
        let constant = type_of_last("const zero = 0;\nzero;");
        let variable = type_of_last("let count = 0;\ncount;");

        assert!(constant.has_falsy_literal());
        assert_eq!(variable.kinds(), &[TypeKind::Primitive(Primitive::Number)]);
    }

    #[test]
    fn object_literal_members_are_widened() {
        let shape = type_of_last("const config = { retries: 0, nested: {} };\nconfig.retries;");

        assert_eq!(shape.kinds(), &[TypeKind::Primitive(Primitive::Number)]);
    }

    #[test]
    fn parameter_types_are_scoped_to_their_function() {
        let code = r#"
function a(x: string | null) { return x; }
function b(x?: { y: number }) { x; }
"#;
        let parsed = ParsedFile::from_source("test.ts", code);
        let module = parsed.module().unwrap();
        let types = DeclaredTypes::from_module(module);

        let ModuleItem::Stmt(Stmt::Decl(swc_ecma_ast::Decl::Fn(b))) = &module.body[1] else {
            panic!("expected function b");
        };
        let body = b.function.body.as_ref().unwrap();
        let Stmt::Expr(ExprStmt { expr, .. }) = &body.stmts[0] else {
            panic!("expected expression statement");
        };
        let shape = types.type_of(expr);

        assert!(shape.includes_undefined());
        assert!(shape.kinds().contains(&TypeKind::Object));
        assert!(!shape.is_exactly(TypeCategory::String));
    }

    #[test]
    fn this_resolves_class_members() {
        let code = r#"
class Store {
    items: string[] | null = null;
    constructor(private readonly cache?: Map<string, number>) {}
    run() { this.items; }
}
"#;
        let parsed = ParsedFile::from_source("test.ts", code);
        let module = parsed.module().unwrap();
        let types = DeclaredTypes::from_module(module);

        struct FindThisMember<'a> {
            types: &'a DeclaredTypes,
            shapes: Vec<TypeShape>,
        }
        impl Visit for FindThisMember<'_> {
            fn visit_member_expr(&mut self, node: &swc_ecma_ast::MemberExpr) {
                if node.obj.is_this() {
                    self.shapes.push(self.types.type_of(&Expr::Member(node.clone())));
                }
            }
        }

        let mut finder = FindThisMember {
            types: &types,
            shapes: Vec::new(),
        };
        module.visit_with(&mut finder);

        assert_eq!(finder.shapes.len(), 1);
        assert!(finder.shapes[0].includes_null());
        assert!(finder.shapes[0].kinds().contains(&TypeKind::Object));
    }

    #[test]
    fn array_and_tuple_elements() {
        let array = type_of_last("declare const list: Array<{ a: 1 } | null>;\nlist[0];");
        let tuple = type_of_last("declare const pair: [string, number];\npair[1];");
        let length = type_of_last("declare const items: string[];\nitems.length;");

        assert!(array.includes_null());
        assert_eq!(tuple.kinds(), &[TypeKind::Primitive(Primitive::Number)]);
        assert_eq!(length.kinds(), &[TypeKind::Primitive(Primitive::Number)]);
    }

    #[test]
    fn self_referential_alias_is_bounded() {
        let shape = type_of_last("type Loop = Loop | null;\ndeclare const l: Loop;\nl;");

        assert!(shape.includes_null());
        assert!(shape.kinds().contains(&TypeKind::Opaque));
    }

    #[test]
    fn untyped_oracle_is_always_opaque() {
        let parsed = ParsedFile::from_source("test.js", "foo;");
        let module = parsed.module().unwrap();
        let ModuleItem::Stmt(Stmt::Expr(ExprStmt { expr, .. })) = &module.body[0] else {
            panic!("expected expression statement");
        };

        assert_eq!(UntypedOracle.type_of(expr), TypeShape::opaque());
    }
}
