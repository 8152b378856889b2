#![forbid(unsafe_code)]

mod document;
mod json_file;

pub use document::{Document, MatchDocument, MatchInfo, MatchMetadata, Participant, Unit};
pub use json_file::JsonFileSource;

use crate::error::Error;
use crate::shaping::{ShapeOutcome, ShapeSpec};

/// Lazy sequence of shaped participants. An `Err` item is fatal.
pub type ShapedStream<'a> = Box<dyn Iterator<Item = Result<ShapeOutcome, Error>> + 'a>;

pub trait RecordSource: Send {
    /// Run the filter/shape query and return its results as a pull-based
    /// stream. Fails up front if the underlying store is unavailable.
    fn query<'a>(&'a mut self, spec: &'a ShapeSpec) -> Result<ShapedStream<'a>, Error>;
}

/// In-process collection of match documents.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    documents: Vec<MatchDocument>,
}

impl MemorySource {
    pub fn new(documents: Vec<MatchDocument>) -> Self {
        Self { documents }
    }
}

impl RecordSource for MemorySource {
    fn query<'a>(&'a mut self, spec: &'a ShapeSpec) -> Result<ShapedStream<'a>, Error> {
        let documents = self
            .documents
            .iter()
            .cloned()
            .map(|document| Ok(Document::Parsed(document)));
        Ok(Box::new(spec.stream(documents)))
    }
}
