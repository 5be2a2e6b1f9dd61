//! Semantic analysis module
//!
//! Provides the declared-type oracle that type-aware rules query.

pub mod types;

pub use types::{
    DeclaredTypes, Primitive, TypeCategory, TypeKind, TypeOracle, TypeShape, UntypedOracle,
};
