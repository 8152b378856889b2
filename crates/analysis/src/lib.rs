#![forbid(unsafe_code)]

pub mod clock;
pub mod domain;
pub mod engine;
pub mod error;
pub mod reduce;
pub mod shaping;
pub mod sink;
pub mod source;
pub mod table;

pub use engine::{AnalysisEngine, RunReport, Services};
pub use error::Error;
pub use reduce::{DefaultReducer, FoldOutcome, FoldStats, Reducer, fold_parallel};
pub use shaping::{MalformedField, RejectReason, ShapeOutcome, ShapeSpec, champion_name};
pub use sink::{JsonFileSink, MemorySink, ResultSink};
pub use source::{JsonFileSource, MatchDocument, MemorySource, Participant, RecordSource};
pub use table::{FinalTable, ResultTable};

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::{Aggregate, ChampionKey, RoundKey, ShapedRecord, Summary};
