#![forbid(unsafe_code)]

use crate::domain::{ChampionKey, RoundKey, ShapedRecord};
use crate::table::ResultTable;
use itertools::Itertools;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldOutcome {
    Applied,
    /// The record fields the same champion more than once and was left out.
    DuplicateUnits,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FoldStats {
    pub applied: u64,
    pub duplicate_units: u64,
}

impl FoldStats {
    pub fn record(&mut self, outcome: FoldOutcome) {
        match outcome {
            FoldOutcome::Applied => self.applied += 1,
            FoldOutcome::DuplicateUnits => self.duplicate_units += 1,
        }
    }

    pub fn merge(&mut self, other: FoldStats) {
        self.applied += other.applied;
        self.duplicate_units += other.duplicate_units;
    }
}

pub trait Reducer: Send + Sync {
    /// Fold one shaped record into the table. Either every target entry
    /// reflects the record or none does.
    fn fold(&self, table: &mut ResultTable, record: &ShapedRecord) -> FoldOutcome;
}

/// Counts a record under the grand rollup, its round rollup, and, for every
/// champion on the board, under `[round][champion]` and `[total][champion]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultReducer;

impl Reducer for DefaultReducer {
    fn fold(&self, table: &mut ResultTable, record: &ShapedRecord) -> FoldOutcome {
        let champions: Vec<&Arc<str>> = record.units.iter().unique().collect();
        if champions.len() != record.num_units {
            trace!(?record, "duplicate units, record skipped");
            return FoldOutcome::DuplicateUnits;
        }

        let placement = f64::from(record.placement);
        let round = RoundKey::Round(record.last_round);

        table.observe(RoundKey::Total, ChampionKey::Total, placement);
        table.observe(round, ChampionKey::Total, placement);
        for champion in champions {
            let key = ChampionKey::Champion(champion.clone());
            table.observe(round, key.clone(), placement);
            table.observe(RoundKey::Total, key, placement);
        }
        FoldOutcome::Applied
    }
}

/// Fold `records` on `pool`, one partial table per rayon split, and merge the
/// partials pairwise. Equivalent to folding the records in order.
pub fn fold_parallel<R>(
    reducer: &R,
    records: &[ShapedRecord],
    pool: &rayon::ThreadPool,
) -> (ResultTable, FoldStats)
where
    R: Reducer + ?Sized,
{
    pool.install(|| {
        records
            .par_iter()
            .fold(
                || (ResultTable::new(), FoldStats::default()),
                |(mut table, mut stats), record| {
                    stats.record(reducer.fold(&mut table, record));
                    (table, stats)
                },
            )
            .reduce(
                || (ResultTable::new(), FoldStats::default()),
                |(mut left, mut left_stats), (right, right_stats)| {
                    left.merge(right);
                    left_stats.merge(right_stats);
                    (left, left_stats)
                },
            )
    })
}
