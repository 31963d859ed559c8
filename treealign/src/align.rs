use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lib_treealign::{
    aligner::{AlignmentResult, TreeSequenceAligner},
    costs::GapCosts,
    node_types::NodeTypeMap,
    substitution_matrix::SubstitutionMatrix,
    tree_sequence::TreeSequence,
};
use log::{info, warn, LevelFilter};
use rayon::prelude::*;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use crate::fasta::parse_fasta_file;

#[derive(Parser)]
pub struct Cli {
    #[clap(long, short = 'l', default_value = "info")]
    log_level: LevelFilter,

    /// The fasta file containing the target sequences.
    #[clap(long, short = 'f')]
    targets: PathBuf,

    /// An optional second fasta file containing the query sequences.
    ///
    /// Without it, the targets are contrasted against themselves.
    #[clap(long, short = 'q')]
    queries: Option<PathBuf>,

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

    /// Number of worker threads.
    #[clap(long, short = 'n', default_value_t = 2)]
    workers: usize,

    /// The file to write the score matrix to.
    ///
    /// If it already exists, targets listed in it are skipped and new rows
    /// are appended.
    #[clap(long, short = 'o', default_value = "scores.tab")]
    output: PathBuf,

    /// An optional file to write the aligned strings to, one target/query
    /// pair per line.
    #[clap(long, short = 'a')]
    alignments: Option<PathBuf>,

    /// The score flavour written to the score matrix.
    #[clap(long, short = 's', default_value = "alignment")]
    score_type: ScoreType,

    /// An optional file to dump the parsed parameters to.
    #[clap(long)]
    args_log: Option<PathBuf>,

    /// Re-align queries that already completed as targets.
    #[clap(long)]
    force_query: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScoreType {
    /// The raw alignment score.
    Alignment,
    /// The total number of gap characters.
    Gaps,
    /// Gaps beyond those forced by the length difference.
    ExcessGaps,
    /// Score divided by the shorter sequence length.
    ShortNormalized,
    /// Score divided by the longer sequence length.
    LongNormalized,
}

impl ScoreType {
    fn extract(self, result: &AlignmentResult) -> String {
        match self {
            Self::Alignment => result.score.to_string(),
            Self::Gaps => result.gap_count().to_string(),
            Self::ExcessGaps => result.excess_gap_count().to_string(),
            Self::ShortNormalized => result.short_normalized().to_string(),
            Self::LongNormalized => result.long_normalized().to_string(),
        }
    }
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

    let targets = load_sequences(&cli.targets)?;
    let mut queries = match &cli.queries {
        Some(path) => load_sequences(path)?,
        None => targets.clone(),
    };
    // Score matrix columns are ordered by query name.
    queries.sort_by(|first, second| first.name().cmp(second.name()));

    let completed = parse_completed(&cli.output)?;
    info!("{} of {} targets already complete", completed.len(), targets.len());

    if let Some(path) = &cli.args_log {
        write_params(&cli, path)?;
    }

    let resume = !completed.is_empty();
    let output = Mutex::new(OutputState {
        scores: open_output(&cli.output, resume)?,
        alignments: match &cli.alignments {
            Some(path) => Some(open_output(path, resume)?),
            None => None,
        },
        header_written: resume,
        completed: completed.len(),
    });

    let remaining: Vec<&TreeSequence> = targets
        .iter()
        .filter(|target| !completed.contains(target.name()))
        .collect();
    let total = targets.len();
    let aligner = TreeSequenceAligner::new(&substitution_matrix, &node_types, costs);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.workers)
        .build()?;
    pool.install(|| {
        remaining.par_iter().try_for_each(|target| -> Result<()> {
            let results: Vec<Option<AlignmentResult>> = queries
                .iter()
                .map(|query| {
                    if !cli.force_query && completed.contains(query.name()) {
                        // Already aligned while the query was a target.
                        return None;
                    }
                    match aligner.align(target, query) {
                        Ok(result) => Some(result),
                        Err(error) => {
                            warn!("skipping '{}' vs '{}': {error}", target.name(), query.name());
                            None
                        }
                    }
                })
                .collect();

            let mut output = output.lock().unwrap();
            output.write_target(target.name(), &queries, &results, cli.score_type)?;
            info!(
                "{} [OK] {} of {} ({}% complete)",
                target.name(),
                output.completed,
                total,
                output.completed * 100 / total.max(1)
            );
            Ok(())
        })
    })?;

    info!("analysis complete");
    Ok(())
}

struct OutputState {
    scores: BufWriter<File>,
    alignments: Option<BufWriter<File>>,
    header_written: bool,
    completed: usize,
}

impl OutputState {
    fn write_target(
        &mut self,
        target: &str,
        queries: &[TreeSequence],
        results: &[Option<AlignmentResult>],
        score_type: ScoreType,
    ) -> Result<()> {
        if !self.header_written {
            let names: Vec<&str> = queries.iter().map(TreeSequence::name).collect();
            writeln!(self.scores, "\t{}", names.join("\t"))?;
            self.header_written = true;
        }

        let values: Vec<String> = results
            .iter()
            .map(|result| match result {
                Some(result) => score_type.extract(result),
                None => "None".to_owned(),
            })
            .collect();
        writeln!(self.scores, "{target}\t{}", values.join("\t"))?;
        self.scores.flush()?;

        if let Some(alignments) = &mut self.alignments {
            for result in results.iter().flatten() {
                writeln!(
                    alignments,
                    "{}\t{}\t{}\t{}",
                    result.target_name,
                    result.query_name,
                    result.target_alignment,
                    result.query_alignment
                )?;
            }
            alignments.flush()?;
        }

        self.completed += 1;
        Ok(())
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path).with_context(|| {
        format!("unable to open {}", path.display())
    })?))
}

fn open_output(path: &Path, append: bool) -> Result<BufWriter<File>> {
    let file = File::options()
        .create(true)
        .append(append)
        .write(true)
        .truncate(!append)
        .open(path)
        .with_context(|| format!("unable to open output file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn load_sequences(path: &Path) -> Result<Vec<TreeSequence>> {
    let records = parse_fasta_file(path)?;
    info!("{} sequences parsed from {}", records.len(), path.display());
    Ok(records
        .into_iter()
        .map(|record| TreeSequence::new(record.name, record.sequence.chars()))
        .collect())
}

/// First column of an existing score matrix: the targets that already ran.
fn parse_completed(path: &Path) -> Result<HashSet<String>> {
    let mut completed = HashSet::new();
    if !path.is_file() {
        return Ok(completed);
    }
    for line in BufReader::new(File::open(path)?).lines() {
        let line = line?;
        if line.is_empty() {
            break;
        }
        if let Some(name) = line.split('\t').next() {
            if !name.is_empty() {
                completed.insert(name.to_owned());
            }
        }
    }
    Ok(completed)
}

fn write_params(cli: &Cli, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "Parameter\tValue")?;
    writeln!(writer, "alignments\t{}", display_path(&cli.alignments))?;
    writeln!(writer, "force_query\t{}", cli.force_query)?;
    writeln!(writer, "gap\t{}", cli.gap)?;
    writeln!(writer, "gap_open\t{}", cli.gap_open)?;
    writeln!(writer, "matrix\t{}", cli.matrix.display())?;
    writeln!(writer, "node_types\t{}", display_path(&cli.node_types))?;
    writeln!(writer, "output\t{}", cli.output.display())?;
    writeln!(writer, "queries\t{}", display_path(&cli.queries))?;
    writeln!(writer, "score_type\t{:?}", cli.score_type)?;
    writeln!(writer, "targets\t{}", cli.targets.display())?;
    writeln!(writer, "workers\t{}", cli.workers)?;
    Ok(())
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "None".to_owned(),
    }
}
