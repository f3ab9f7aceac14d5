use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use sift_match::{match_all, match_all_par, write_report, MatchConfig, MatchError, QueryReport};
use sift_parse::{read_features, IngestStats, ParsedFeature};

pub use sift_match::{self, MatchConfig as Config};

#[derive(Debug)]
pub enum CompareError {
    /// A named input file cannot be opened; fatal for the whole run
    UnreadableInput { path: String, source: io::Error },
    Io(io::Error),
    Match(MatchError),
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl std::fmt::Display for CompareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareError::UnreadableInput { path, source } => {
                write!(f, "File {} is not open: {}", path, source)
            }
            CompareError::Io(e) => write!(f, "I/O error: {}", e),
            CompareError::Match(e) => write!(f, "Match error: {}", e),
            CompareError::ThreadPool(e) => write!(f, "Thread pool error: {}", e),
        }
    }
}

impl std::error::Error for CompareError {}

impl From<io::Error> for CompareError {
    fn from(err: io::Error) -> Self {
        CompareError::Io(err)
    }
}

impl From<MatchError> for CompareError {
    fn from(err: MatchError) -> Self {
        CompareError::Match(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for CompareError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        CompareError::ThreadPool(err)
    }
}

pub type CompareResult<T> = Result<T, CompareError>;

/// Open and ingest one descriptor file.
///
/// Per-line float counts go to the diagnostic writer, followed by a
/// `Read <n> lines from <path>` summary. Malformed lines are skipped and
/// counted; only the open failure is fatal.
pub fn read_descriptor_file<D: Write>(
    path: &Path,
    diag: &mut D,
) -> CompareResult<(Vec<ParsedFeature>, IngestStats)> {
    let file = File::open(path).map_err(|source| CompareError::UnreadableInput {
        path: path.display().to_string(),
        source,
    })?;
    let (records, stats) = read_features(BufReader::new(file), diag)?;
    writeln!(diag, "Read {} lines from {}", stats.decoded, path.display())?;
    Ok((records, stats))
}

/// Match the query records against the references and write one report
/// block per query, in query order. A query with no candidates is
/// reported as `no match`, never as a failure of the run.
pub fn compare_records<W: Write>(
    queries: &[ParsedFeature],
    references: &[ParsedFeature],
    config: &MatchConfig,
    out: &mut W,
) -> CompareResult<()> {
    config.validate()?;

    let results: Vec<Result<QueryReport, MatchError>> = if config.parallel {
        match_all_par(queries, references)
    } else {
        match_all(queries, references)
    };

    for (index, result) in results.iter().enumerate() {
        match result {
            Ok(report) => write_report(out, report)?,
            Err(MatchError::EmptyReferenceSet) => {
                writeln!(out, "no match for query {}", index)?;
            }
            Err(other) => return Err(other.clone().into()),
        }
    }
    Ok(())
}

/// Full comparison run: ingest both files, match, report.
pub fn run_compare<W: Write, D: Write>(
    left: &Path,
    right: &Path,
    config: &MatchConfig,
    out: &mut W,
    diag: &mut D,
) -> CompareResult<()> {
    if config.parallel {
        sift_core::init_thread_pool(config.n_threads)?;
    }

    let (queries, _) = read_descriptor_file(left, diag)?;
    let (references, _) = read_descriptor_file(right, diag)?;

    compare_records(&queries, &references, config, out)
}
