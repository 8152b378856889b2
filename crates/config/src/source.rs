use serde::{Deserialize, Serialize};

/// What to do with a record that lacks a field the analysis needs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedPolicy {
    /// Skip the record, count it, and keep going.
    #[default]
    #[serde(rename = "skip")]
    Skip,

    /// Abort the whole run on the first malformed record.
    #[serde(rename = "fail")]
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Source {
    /// Files holding match documents. Glob patterns are expanded, e.g.
    /// `data/matches/*.jsonl`.
    ///
    /// A `.json` file holds a single match document or an array of them. A
    /// `.jsonl` or `.ndjson` file holds one match document per line and is
    /// streamed.
    pub inputs: Vec<String>,

    /// Stop after reading this many matches. Meant for quick test runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// See [`MalformedPolicy`].
    pub malformed: MalformedPolicy,
}
