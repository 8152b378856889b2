#![forbid(unsafe_code)]

use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::table::FinalTable;
use config::Config;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

pub trait ResultSink: Send + Sync {
    /// Persist the finalized table and return where it went.
    fn write(&self, table: &FinalTable) -> Result<PathBuf, Error>;
}

/// Writes the table as one JSON document to
/// `<directory>/<prefix>_<timestamp>.json`.
pub struct JsonFileSink {
    directory: PathBuf,
    file_prefix: String,
    timestamp_format: String,
    pretty: bool,
    clock: Box<dyn Clock>,
}

impl JsonFileSink {
    pub fn new(config: &Config) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    pub fn with_clock(config: &Config, clock: Box<dyn Clock>) -> Self {
        Self {
            directory: config.output.directory.clone(),
            file_prefix: config.output.file_prefix.clone(),
            timestamp_format: config.output.timestamp_format.clone(),
            pretty: config.output.pretty,
            clock,
        }
    }

    /// Path the next write goes to.
    pub fn target_path(&self) -> Result<PathBuf, Error> {
        let mut name = format!("{}_", self.file_prefix);
        write!(name, "{}", self.clock.now().format(&self.timestamp_format))
            .map_err(|_| Error::TimestampFormat(self.timestamp_format.clone()))?;
        name.push_str(".json");
        Ok(self.directory.join(name))
    }
}

impl ResultSink for JsonFileSink {
    fn write(&self, table: &FinalTable) -> Result<PathBuf, Error> {
        let path = self.target_path()?;
        let write_err = |source| Error::Write {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.directory).map_err(write_err)?;
        let mut writer = BufWriter::new(File::create(&path).map_err(write_err)?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, table)?;
        } else {
            serde_json::to_writer(&mut writer, table)?;
        }
        writer.flush().map_err(write_err)?;

        debug!(path = %path.display(), "results written");
        Ok(path)
    }
}

/// Keeps the last written table in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    last: Mutex<Option<FinalTable>>,
}

impl MemorySink {
    pub fn take(&self) -> Option<FinalTable> {
        self.last.lock().ok()?.take()
    }
}

impl ResultSink for MemorySink {
    fn write(&self, table: &FinalTable) -> Result<PathBuf, Error> {
        if let Ok(mut last) = self.last.lock() {
            *last = Some(table.clone());
        }
        Ok(PathBuf::from("<memory>"))
    }
}

impl<S: ResultSink + ?Sized> ResultSink for std::sync::Arc<S> {
    fn write(&self, table: &FinalTable) -> Result<PathBuf, Error> {
        (**self).write(table)
    }
}
