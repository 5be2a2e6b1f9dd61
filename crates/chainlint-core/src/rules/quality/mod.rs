//! Quality rules for code style and best practices

pub mod prefer_optional_chain;

pub use prefer_optional_chain::{PreferOptionalChain, PreferOptionalChainOptions};
