use clap::Subcommand;
use duct::cmd;

#[derive(Subcommand)]
pub enum Test {
    /// Only run clippy
    Clippy,

    /// Only run the unit tests
    Unit,
}

pub fn test_crate(command: Option<Test>) -> anyhow::Result<()> {
    match command {
        Some(Test::Clippy) => clippy()?,
        Some(Test::Unit) => unit()?,
        None => {
            clippy()?;
            unit()?;
        }
    }
    Ok(())
}

fn clippy() -> anyhow::Result<()> {
    cmd!("cargo", "clippy", "--workspace", "--exclude", "bootswitch-fuzz", "--all-targets").run()?;
    Ok(())
}

fn unit() -> anyhow::Result<()> {
    cmd!("cargo", "test", "-p", "bootswitch-core", "-p", "bootswitch-ratatui").run()?;
    Ok(())
}
