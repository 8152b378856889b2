#![forbid(unsafe_code)]

use crate::domain::ShapedRecord;
use crate::error::Error;
use crate::reduce::{FoldStats, Reducer, fold_parallel};
use crate::shaping::{RejectReason, ShapeOutcome, ShapeSpec};
use crate::sink::ResultSink;
use crate::source::{RecordSource, ShapedStream};
use crate::table::{FinalTable, ResultTable};
use config::{Config, MalformedPolicy};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct Services {
    pub source: Box<dyn RecordSource>,
    pub reducer: Box<dyn Reducer>,
    pub sink: Box<dyn ResultSink>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    /// Records folded into the table.
    pub accepted: u64,
    /// Records dropped by the duplicate-unit guard.
    pub duplicate_units: u64,
    /// Records dropped before the fold, by reason.
    pub rejected: BTreeMap<RejectReason, u64>,
    pub elapsed: Duration,
    pub output: PathBuf,
    pub table: FinalTable,
}

impl RunReport {
    /// Records skipped because a field was missing or invalid.
    pub fn malformed(&self) -> u64 {
        self.rejected
            .iter()
            .filter(|(reason, _)| reason.is_malformed())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn rejected(&self, reason: RejectReason) -> u64 {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }
}

/// Counts what happened to the records pulled from the source.
#[derive(Debug, Default)]
struct Tally {
    rejected: BTreeMap<RejectReason, u64>,
    fold: FoldStats,
}

pub struct AnalysisEngine {
    config: Config,
    services: Services,
}

impl AnalysisEngine {
    pub fn new(config: Config, services: Services) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config, services })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Query the source, fold every accepted record, finalize, and hand the
    /// result to the sink. Nothing is written if any stage before the sink
    /// fails.
    pub fn run(&mut self) -> Result<RunReport, Error> {
        let start = Instant::now();
        let spec = ShapeSpec::from_config(&self.config);
        let policy = self.config.source.malformed;
        let workers = self.config.runtime.workers;
        info!(?spec, workers, "starting analysis");

        let mut tally = Tally::default();
        let stream = self.services.source.query(&spec)?;
        let table = if workers > 1 {
            Self::fold_batched(
                stream,
                self.services.reducer.as_ref(),
                policy,
                workers,
                self.config.runtime.batch_size,
                &mut tally,
            )?
        } else {
            Self::fold_sequential(stream, self.services.reducer.as_ref(), policy, &mut tally)?
        };

        if table.total_count() == 0 {
            warn!("no record was accepted, the result table is empty");
        }
        let table = table.finalize();
        let output = self.services.sink.write(&table)?;
        let elapsed = start.elapsed();

        let report = RunReport {
            accepted: tally.fold.applied,
            duplicate_units: tally.fold.duplicate_units,
            rejected: tally.rejected,
            elapsed,
            output,
            table,
        };
        info!(
            accepted = report.accepted,
            duplicate_units = report.duplicate_units,
            malformed = report.malformed(),
            rounds = report.table.round_numbers().count(),
            champions = report.table.champion_count(),
            ?elapsed,
            "analysis finished"
        );
        Ok(report)
    }

    fn fold_sequential(
        stream: ShapedStream<'_>,
        reducer: &dyn Reducer,
        policy: MalformedPolicy,
        tally: &mut Tally,
    ) -> Result<ResultTable, Error> {
        let mut table = ResultTable::new();
        for outcome in stream {
            if let Some(record) = tally.admit(outcome?, policy)? {
                tally.fold.record(reducer.fold(&mut table, &record));
            }
        }
        Ok(table)
    }

    fn fold_batched(
        stream: ShapedStream<'_>,
        reducer: &dyn Reducer,
        policy: MalformedPolicy,
        workers: usize,
        batch_size: usize,
        tally: &mut Tally,
    ) -> Result<ResultTable, Error> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;
        let mut table = ResultTable::new();
        let mut batch: Vec<ShapedRecord> = Vec::with_capacity(batch_size);

        let mut flush = |batch: &mut Vec<ShapedRecord>, tally: &mut Tally| {
            let (partial, stats) = fold_parallel(reducer, batch, &pool);
            debug!(records = batch.len(), "batch folded");
            table.merge(partial);
            tally.fold.merge(stats);
            batch.clear();
        };

        for outcome in stream {
            if let Some(record) = tally.admit(outcome?, policy)? {
                batch.push(record);
                if batch.len() >= batch_size {
                    flush(&mut batch, tally);
                }
            }
        }
        if !batch.is_empty() {
            flush(&mut batch, tally);
        }
        Ok(table)
    }
}

impl Tally {
    /// Count a rejection, or pass the record on to the fold.
    fn admit(
        &mut self,
        outcome: ShapeOutcome,
        policy: MalformedPolicy,
    ) -> Result<Option<ShapedRecord>, Error> {
        match outcome {
            ShapeOutcome::Accept(record) => Ok(Some(record)),
            ShapeOutcome::Reject(RejectReason::Malformed(field))
                if policy == MalformedPolicy::Fail =>
            {
                Err(Error::Malformed(field))
            }
            ShapeOutcome::Reject(reason) => {
                *self.rejected.entry(reason).or_default() += 1;
                Ok(None)
            }
        }
    }
}
