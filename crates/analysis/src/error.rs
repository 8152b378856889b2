#![forbid(unsafe_code)]

use crate::shaping::MalformedField;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no input file matched `{0}`")]
    NoInput(String),

    #[error("invalid input pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record: missing or invalid {0}")]
    Malformed(MalformedField),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode results: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid timestamp format `{0}`")]
    TimestampFormat(String),

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Config(#[from] config::Error),
}
