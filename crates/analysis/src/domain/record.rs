#![forbid(unsafe_code)]

use std::sync::Arc;

/// One participant, filtered and projected down to what the fold needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedRecord {
    /// Number of units on the board. Not guaranteed to match `units.len()`
    /// for records built outside the shaper.
    pub num_units: usize,
    /// Bare champion names, in board order.
    pub units: Vec<Arc<str>>,
    pub last_round: u32,
    pub placement: u32,
}

impl ShapedRecord {
    pub fn new<I, S>(last_round: u32, placement: u32, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let units: Vec<Arc<str>> = units.into_iter().map(Into::into).collect();
        Self {
            num_units: units.len(),
            units,
            last_round,
            placement,
        }
    }
}
