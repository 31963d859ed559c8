use anyhow::Result;
use clap::Parser;
use treealign::{align, pair};

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(clap::Subcommand)]
enum Subcommand {
    /// Contrast every target against every query, writing a score matrix.
    Align(Box<align::Cli>),
    /// Align one pair of sequences and print the alignment.
    Pair(pair::Cli),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.subcommand {
        Subcommand::Align(cli) => align::cli(*cli),
        Subcommand::Pair(cli) => pair::cli(cli),
    }
}
