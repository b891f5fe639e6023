use anyhow::Error as Anyhow;
use clap::Parser;

mod applet;
mod cli;
mod io;

fn main() -> Result<(), Anyhow> {
    let cli = cli::Cli::parse();
    cli.execute()
}
