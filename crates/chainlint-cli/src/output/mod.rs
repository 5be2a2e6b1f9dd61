//! Output formatters for diagnostics

pub mod json;
pub mod pretty;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}
