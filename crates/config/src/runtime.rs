use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Runtime {
    /// Number of worker threads folding records. With 1 the records are
    /// folded on the calling thread, one at a time, in source order.
    ///
    /// With more than one worker, records are pulled from the source in
    /// batches and every batch is split across the workers. Each worker
    /// builds its own partial table and the partials are merged. The result
    /// is the same as a sequential run.
    pub workers: usize,

    /// Number of shaped records pulled from the source per parallel batch.
    /// Ignored when `workers` is 1.
    pub batch_size: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            workers: 1,
            batch_size: 4096,
        }
    }
}
