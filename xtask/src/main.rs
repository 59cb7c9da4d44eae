use clap::{Parser, Subcommand};

use crate::{fuzz::Fuzz, test::Test};

mod build;
mod doc;
mod fuzz;
mod test;

#[derive(Parser)]
#[command(about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build all crates in workspace
    Build {
        /// Build with release profile
        #[arg(short, long, default_value_t = false)]
        release: bool,

        /// Build for a target other than the host
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Build docs for the bootswitch crates
    Doc {
        /// Document private items in crate
        #[arg(short, long, default_value_t = false)]
        private: bool,

        /// Open in web browser after documenting
        #[arg(short, long, default_value_t = false)]
        open: bool,
    },

    /// Run unit tests and clippy on host
    Test {
        #[command(subcommand)]
        command: Option<Test>,
    },

    /// Fuzz one of the parsers
    Fuzz {
        #[command(subcommand)]
        command: Fuzz,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Build { release, target } => build::build_all_crates(release, target.as_deref())?,
        Commands::Doc { private, open } => doc::doc_crate(private, open)?,
        Commands::Test { command } => test::test_crate(command)?,
        Commands::Fuzz { command } => fuzz::fuzz_parsers(command)?,
    }
    Ok(())
}
