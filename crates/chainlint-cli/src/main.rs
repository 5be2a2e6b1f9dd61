//! chainlint CLI - finds guard chains that read better as optional chains
//!
//! Reports `foo && foo.bar` style guards in JavaScript/TypeScript and can
//! rewrite them to `foo?.bar` in place.

mod commands;
mod logging;
mod output;

use clap::Parser;
use commands::Commands;
use logging::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "chainlint",
    author,
    version,
    about = "Prefer optional chains over manual guard checks",
    long_about = "chainlint finds chains of null/undefined/falsy guards such as\n\
                  `foo && foo.bar && foo.bar.baz` and empty-object fallbacks such as\n\
                  `(foo || {}).bar`, and rewrites them into optional chains."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level for diagnostics written to stderr (RUST_LOG overrides)
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level);

    match cli.command {
        Commands::Check(args) => args.run(),
    }
}
