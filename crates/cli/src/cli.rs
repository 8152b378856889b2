use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use config::{Config, MalformedPolicy};
use std::path::{Path, PathBuf};

/// champion-rounds: champion placement statistics by elimination round
///
/// Reads ranked match documents, groups every qualifying player by the round
/// their game ended in, and reports how often each champion was on their
/// board and the average placement it finished with. The result is written
/// as a timestamped JSON file.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    ///
    /// If not provided, `champion-rounds.toml` and `champion-rounds.d/*.toml`
    /// in the working directory are checked, where the latter is a glob
    /// pattern. If they don't exist, the default configuration is used.
    #[arg(short, long, value_parser = validate_file)]
    pub config: Option<PathBuf>,

    /// Match files to analyse. Glob patterns are expanded.
    ///
    /// Overrides `source.inputs` from the configuration.
    pub inputs: Vec<String>,

    /// Directory the result file is written to.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Stop after reading this many matches.
    #[arg(short, long)]
    pub limit: Option<u64>,

    /// Number of worker threads folding records.
    #[arg(short = 'j', long, value_parser = validate_workers)]
    pub workers: Option<usize>,

    /// Abort on the first malformed record instead of skipping it.
    #[arg(long)]
    pub strict: bool,

    /// Indent the JSON output.
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

impl Cli {
    /// Override configuration values with the ones given on the command line.
    pub fn apply(&self, config: &mut Config) {
        if !self.inputs.is_empty() {
            config.source.inputs = self.inputs.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if self.limit.is_some() {
            config.source.limit = self.limit;
        }
        if let Some(workers) = self.workers {
            config.runtime.workers = workers;
        }
        if self.strict {
            config.source.malformed = MalformedPolicy::Fail;
        }
        if self.pretty {
            config.output.pretty = true;
        }
    }
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

/// Validate worker count
#[inline(always)]
fn validate_workers(workers: &str) -> Result<usize, String> {
    let workers: usize = workers
        .parse()
        .map_err(|_| format!("`{workers}` is not a valid worker count"))?;
    if (1..=256).contains(&workers) {
        Ok(workers)
    } else {
        Err("Worker count must be between 1 and 256".to_string())
    }
}
