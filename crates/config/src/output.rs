use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Output {
    /// Directory the result file is written to. It is created if missing.
    pub directory: PathBuf,

    /// File name prefix. The full name is `<prefix>_<timestamp>.json`.
    pub file_prefix: String,

    /// `strftime`-style format of the timestamp embedded in the file name.
    pub timestamp_format: String,

    /// Indent the JSON output.
    pub pretty: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("results"),
            file_prefix: "champion_round_base_analysis".into(),
            timestamp_format: "%d-%m-%Y-%H-%M-%S".into(),
            pretty: false,
        }
    }
}
