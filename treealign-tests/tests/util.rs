use std::{env, sync::Once};

use anyhow::Result;
use clap::Parser;
use treealign::{align, pair};

static REPO_ROOT: Once = Once::new();

/// The working directory of a test is this crate; the test files live one
/// level up in the repo root. Hops exactly once per test process.
pub fn enter_repo_root() {
    REPO_ROOT.call_once(|| {
        let current = env::current_dir().expect("no working directory");
        if !current.join("test_files").is_dir() {
            let parent = current.parent().expect("no parent directory");
            env::set_current_dir(parent).expect("cannot enter repo root");
        }
    });
}

pub fn run_in_repo_root(args: &str) -> Result<()> {
    enter_repo_root();

    if args.starts_with("align ") {
        align::cli(align::Cli::parse_from(args.split_whitespace()))?;
    } else if args.starts_with("pair ") {
        pair::cli(pair::Cli::parse_from(args.split_whitespace()))?;
    }

    Ok(())
}
