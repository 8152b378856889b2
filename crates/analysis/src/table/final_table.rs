#![forbid(unsafe_code)]

use crate::domain::{ChampionKey, RoundKey, Summary};
use crate::table::ResultTable;
use serde::Serialize;
use std::collections::BTreeMap;

/// Finalized result table: round → champion → `{count, avg_place}`.
///
/// Keys are ordered, rounds ascending with `total` last, which is also the
/// order they are serialized in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FinalTable {
    rounds: BTreeMap<RoundKey, BTreeMap<ChampionKey, Summary>>,
}

impl FinalTable {
    pub(crate) fn from_running(table: ResultTable) -> Self {
        let rounds = table
            .rounds
            .into_iter()
            .map(|(round, bucket)| {
                let bucket = bucket
                    .into_iter()
                    .map(|(champion, agg)| (champion, agg.summarize()))
                    .collect();
                (round, bucket)
            })
            .collect();
        Self { rounds }
    }

    pub fn get(&self, round: RoundKey, champion: &ChampionKey) -> Option<&Summary> {
        self.rounds.get(&round)?.get(champion)
    }

    pub fn round(&self, round: RoundKey) -> Option<&BTreeMap<ChampionKey, Summary>> {
        self.rounds.get(&round)
    }

    pub fn rounds(&self) -> impl Iterator<Item = (&RoundKey, &BTreeMap<ChampionKey, Summary>)> {
        self.rounds.iter()
    }

    /// Concrete rounds present in the table, ascending.
    pub fn round_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.rounds.keys().filter_map(|key| match key {
            RoundKey::Round(round) => Some(*round),
            RoundKey::Total => None,
        })
    }

    /// Every finalized entry, round-major.
    pub fn entries(&self) -> impl Iterator<Item = (RoundKey, &ChampionKey, &Summary)> {
        self.rounds.iter().flat_map(|(round, bucket)| {
            bucket
                .iter()
                .map(move |(champion, summary)| (*round, champion, summary))
        })
    }

    /// The grand rollup over every accepted record.
    pub fn grand_total(&self) -> Summary {
        self.get(RoundKey::Total, &ChampionKey::Total)
            .copied()
            .unwrap_or(Summary {
                count: 0,
                avg_place: 0.0,
            })
    }

    /// Number of distinct champions seen across all rounds.
    pub fn champion_count(&self) -> usize {
        self.round(RoundKey::Total).map_or(0, |bucket| {
            bucket
                .keys()
                .filter(|key| matches!(key, ChampionKey::Champion(_)))
                .count()
        })
    }
}
