#![forbid(unsafe_code)]

mod final_table;

pub use final_table::FinalTable;

use crate::domain::{Aggregate, ChampionKey, RoundKey};
use rustc_hash::FxHashMap;

/// Running aggregates of one round (or of the grand rollup), keyed by
/// champion plus the round's own [`ChampionKey::Total`].
pub type RoundBucket = FxHashMap<ChampionKey, Aggregate>;

/// Two-level table of running aggregates: round → champion → aggregate.
///
/// `[Total][Total]` exists from construction. Every other entry is created
/// together with its first observation, so only the grand rollup of an empty
/// table can have a zero count.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    rounds: FxHashMap<RoundKey, RoundBucket>,
}

impl Default for ResultTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultTable {
    pub fn new() -> Self {
        let mut rounds = FxHashMap::default();
        let mut total = RoundBucket::default();
        total.insert(ChampionKey::Total, Aggregate::default());
        rounds.insert(RoundKey::Total, total);
        Self { rounds }
    }

    /// Bucket of `round`, created with a zeroed round rollup on first use.
    pub fn ensure_round(&mut self, round: RoundKey) -> &mut RoundBucket {
        self.rounds.entry(round).or_insert_with(|| {
            let mut bucket = RoundBucket::default();
            bucket.insert(ChampionKey::Total, Aggregate::default());
            bucket
        })
    }

    /// Create-or-increment the entry at `[round][champion]`.
    pub fn observe(&mut self, round: RoundKey, champion: ChampionKey, placement: f64) {
        self.ensure_round(round)
            .entry(champion)
            .and_modify(|agg| agg.observe(placement))
            .or_insert_with(|| Aggregate::first(placement));
    }

    /// Add every entry of `other` into `self`. Counts and sums are added per
    /// key, so merge order does not matter.
    pub fn merge(&mut self, other: ResultTable) {
        for (round, bucket) in other.rounds {
            let target = self.ensure_round(round);
            for (champion, agg) in bucket {
                target
                    .entry(champion)
                    .and_modify(|existing| existing.merge(&agg))
                    .or_insert(agg);
            }
        }
    }

    pub fn get(&self, round: RoundKey, champion: &ChampionKey) -> Option<&Aggregate> {
        self.rounds.get(&round)?.get(champion)
    }

    pub fn round(&self, round: RoundKey) -> Option<&RoundBucket> {
        self.rounds.get(&round)
    }

    pub fn rounds(&self) -> impl Iterator<Item = (&RoundKey, &RoundBucket)> {
        self.rounds.iter()
    }

    /// Number of records folded in so far.
    pub fn total_count(&self) -> u64 {
        self.get(RoundKey::Total, &ChampionKey::Total)
            .map_or(0, |agg| agg.count)
    }

    /// Turn every placement sum into an average.
    ///
    /// Consumes the table, so averaging cannot be applied twice:
    ///
    /// ```compile_fail
    /// let table = analysis::table::ResultTable::new();
    /// let once = table.finalize();
    /// let twice = table.finalize();
    /// ```
    pub fn finalize(self) -> FinalTable {
        FinalTable::from_running(self)
    }
}
