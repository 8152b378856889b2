#![forbid(unsafe_code)]

use serde::Serialize;

/// Running count and placement sum of one table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aggregate {
    pub count: u64,
    pub placement_sum: f64,
}

impl Aggregate {
    pub fn first(placement: f64) -> Self {
        Self {
            count: 1,
            placement_sum: placement,
        }
    }

    pub fn observe(&mut self, placement: f64) {
        self.count += 1;
        self.placement_sum += placement;
    }

    pub fn merge(&mut self, other: &Aggregate) {
        self.count += other.count;
        self.placement_sum += other.placement_sum;
    }

    /// Turn the running sum into an average. An empty aggregate averages to 0.
    pub fn summarize(&self) -> Summary {
        let avg_place = if self.count == 0 {
            0.0
        } else {
            self.placement_sum / self.count as f64
        };
        Summary {
            count: self.count,
            avg_place,
        }
    }
}

/// Finalized table entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: u64,
    pub avg_place: f64,
}
