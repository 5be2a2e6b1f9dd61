//! Core of chainlint: finds `&&`/`||` guard chains and empty-object
//! fallbacks that read better as optional chains, with fixes.

pub mod analysis;
pub mod config;
pub mod diagnostic;
pub mod disable_comments;
pub mod fixer;
pub mod parser;
pub mod rules;
pub mod semantic;
pub mod visitor;
