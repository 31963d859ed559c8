use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use lib_treealign::{
    aligner::TreeSequenceAligner, costs::GapCosts, node_types::NodeTypeMap,
    substitution_matrix::SubstitutionMatrix, tree_sequence::TreeSequence,
};
use log::{info, LevelFilter};
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use crate::fasta::{parse_pair_fasta_file, parse_single_fasta_file, FastaRecord};

#[derive(Parser)]
pub struct Cli {
    #[clap(long, short = 'l', default_value = "info")]
    log_level: LevelFilter,

    #[command(flatten)]
    input: CliInput,

    /// Gap extension penalty, applied per gapped residue.
    #[clap(long, default_value_t = -8.0, allow_negative_numbers = true)]
    gap: f64,

    /// Gap open penalty, paid once per gap run in addition to the extension
    /// penalty.
    #[clap(long, default_value_t = 0.0, allow_negative_numbers = true)]
    gap_open: f64,

    /// Custom substitution matrix file with one tab-separated
    /// `<residue> <residue> <score>` triple per line.
    #[clap(long, short = 'm')]
    matrix: PathBuf,

    /// Node type specification file with one `<tag>:<residues>` line per
    /// type, for example `C:BRPD`.
    ///
    /// Defaults to `A:A`, `C:C`, `T:T`.
    #[clap(long)]
    node_types: Option<PathBuf>,

    /// The file to store the alignment in toml format.
    #[clap(long, short = 'o')]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CliInput {
    #[clap(flatten)]
    separate_input: Option<CliSeparateInput>,

    #[clap(flatten)]
    pair_input: Option<CliPairInput>,
}

#[derive(Args)]
#[group(multiple = true)]
struct CliSeparateInput {
    /// The path to the target fasta file.
    #[clap(long, short = 't', required = false, requires = "query")]
    target: PathBuf,

    /// The path to the query fasta file.
    #[clap(long, short = 'q', required = false, requires = "target")]
    query: PathBuf,
}

#[derive(Args)]
struct CliPairInput {
    /// The path to a fasta file containing both the target and the query.
    #[clap(long, short = 'p', required = false, conflicts_with_all = ["target", "query"])]
    pair_fasta: PathBuf,
}

pub fn cli(cli: Cli) -> Result<()> {
    let _ = TermLogger::init(
        cli.log_level,
        Default::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    let costs = GapCosts::new(cli.gap, cli.gap_open)?;
    let substitution_matrix = SubstitutionMatrix::read_plain(open(&cli.matrix)?, costs.gap)?;
    let node_types = match &cli.node_types {
        Some(path) => NodeTypeMap::read_plain(open(path)?)?,
        None => NodeTypeMap::default(),
    };

    let (target, query) = if let Some(CliPairInput { pair_fasta }) = &cli.input.pair_input {
        info!("Loading pair file {}", pair_fasta.display());
        parse_pair_fasta_file(pair_fasta)?
    } else if let Some(CliSeparateInput { target, query }) = &cli.input.separate_input {
        info!("Loading target file {}", target.display());
        let target = parse_single_fasta_file(target)?;
        info!("Loading query file {}", query.display());
        (target, parse_single_fasta_file(query)?)
    } else {
        bail!("no fasta input file given")
    };
    let target = into_sequence(target);
    let query = into_sequence(query);

    let aligner = TreeSequenceAligner::new(&substitution_matrix, &node_types, costs);
    let result = aligner.align(&target, &query)?;

    if let Some(output) = &cli.output {
        let mut writer = BufWriter::new(File::create(output)?);
        write!(writer, "{}", toml::to_string(&result)?)?;
    }

    println!("{result}");
    Ok(())
}

fn into_sequence(record: FastaRecord) -> TreeSequence {
    TreeSequence::new(record.name, record.sequence.chars())
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path).with_context(|| {
        format!("unable to open {}", path.display())
    })?))
}
