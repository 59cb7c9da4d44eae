use clap::Subcommand;
use duct::cmd;

#[derive(Subcommand)]
pub enum Fuzz {
    /// Run the efibootmgr listing parser
    Listing,

    /// Run the configuration file parser
    Config,
}

pub fn fuzz_parsers(command: Fuzz) -> anyhow::Result<()> {
    let mut args = vec!["fuzz", "run"];
    match command {
        Fuzz::Listing => args.push("listing"),
        Fuzz::Config => args.push("config"),
    }

    cmd!("cargo", "install", "cargo-fuzz").run()?; // will not install if its already installed
    cmd("cargo", args).run()?;
    Ok(())
}
