//! CLI command implementations

pub mod check;

pub use check::CheckArgs;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze JavaScript/TypeScript files for guard chains
    Check(CheckArgs),
}
