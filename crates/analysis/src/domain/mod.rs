#![forbid(unsafe_code)]

mod aggregate;
mod keys;
mod record;

pub use aggregate::{Aggregate, Summary};
pub use keys::{ChampionKey, RoundKey};
pub use record::ShapedRecord;
