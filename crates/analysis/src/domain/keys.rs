#![forbid(unsafe_code)]

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

const TOTAL: &str = "total";

/// Outer key of the result table.
///
/// Ordering puts every concrete round before [`RoundKey::Total`], so sorted
/// output lists rounds ascending and the grand rollup last.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoundKey {
    Round(u32),
    Total,
}

impl fmt::Display for RoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundKey::Round(round) => write!(f, "{round}"),
            RoundKey::Total => f.write_str(TOTAL),
        }
    }
}

impl fmt::Debug for RoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundKey::Round(round) => f.debug_tuple("Round").field(round).finish(),
            RoundKey::Total => f.write_str("Total"),
        }
    }
}

impl From<u32> for RoundKey {
    fn from(round: u32) -> Self {
        RoundKey::Round(round)
    }
}

impl Serialize for RoundKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inner key of the result table: a bare champion name or the rollup over
/// all champions of a round.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChampionKey {
    Champion(Arc<str>),
    Total,
}

impl ChampionKey {
    pub fn champion(name: impl Into<Arc<str>>) -> Self {
        ChampionKey::Champion(name.into())
    }

    /// Whether a champion called `name` would be written under the same
    /// output key as [`ChampionKey::Total`].
    pub fn shadows_rollup(name: &str) -> bool {
        name == TOTAL
    }

    pub fn name(&self) -> &str {
        match self {
            ChampionKey::Champion(name) => name,
            ChampionKey::Total => TOTAL,
        }
    }
}

impl fmt::Display for ChampionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for ChampionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChampionKey::Champion(name) => f.debug_tuple("Champion").field(name).finish(),
            ChampionKey::Total => f.write_str("Total"),
        }
    }
}

impl Serialize for ChampionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
