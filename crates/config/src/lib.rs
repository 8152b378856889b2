#![forbid(unsafe_code)]

mod error;
mod filter;
mod output;
mod runtime;
mod source;

pub use error::Error;
pub use filter::{Filter, NON_COMBAT_ROUNDS, RANKED_QUEUE_ID};
pub use output::Output;
pub use runtime::Runtime;
pub use source::{MalformedPolicy, Source};

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub filter: Filter,
    pub source: Source,
    pub output: Output,
    pub runtime: Runtime,
}

impl Config {
    /// Load configuration from a TOML file. Missing fields are filled with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Config = toml_edit::de::from_str(&text)?;
        config.apply_defaults();
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let toml = toml_edit::ser::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from multiple TOML files. Later files override earlier ones.
    pub fn load_multiple<T, U>(paths: U) -> Result<Self, Error>
    where
        T: AsRef<Path>,
        U: IntoIterator<Item = T>,
    {
        let mut merged = toml_edit::DocumentMut::new();
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            let text = std::fs::read_to_string(path)?;
            let doc: toml_edit::DocumentMut = text.parse()?;
            merge_document(&mut merged, doc);
        }
        let mut config: Config = toml_edit::de::from_str(&merged.to_string())?;
        config.apply_defaults();
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.runtime.workers == 0 {
            return Err(Error::Invalid("runtime.workers must be at least 1".into()));
        }
        if self.runtime.batch_size == 0 {
            return Err(Error::Invalid(
                "runtime.batch_size must be at least 1".into(),
            ));
        }
        if self.output.file_prefix.is_empty() {
            return Err(Error::Invalid("output.file_prefix must not be empty".into()));
        }
        Ok(())
    }

    fn apply_defaults(&mut self) {
        // Excluded rounds are looked up with a binary search.
        self.filter.normalize();
    }
}

fn merge_document(target: &mut toml_edit::DocumentMut, source: toml_edit::DocumentMut) {
    for (key, item) in source.iter() {
        merge_item(
            target.entry(key).or_insert(toml_edit::Item::None),
            item.clone(),
        );
    }
}

fn merge_item(target: &mut toml_edit::Item, source: toml_edit::Item) {
    use toml_edit::Item;
    match (target, source) {
        (Item::Table(target_table), Item::Table(source_table)) => {
            for (key, item) in source_table.iter() {
                merge_item(target_table.entry(key).or_insert(Item::None), item.clone());
            }
        }
        (Item::ArrayOfTables(target_array), Item::ArrayOfTables(source_array)) => {
            for table in source_array.iter() {
                target_array.push(table.clone());
            }
        }
        (target_item, source_item) => {
            *target_item = source_item;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.source.inputs = vec!["matches/*.jsonl".into()];
        config.source.limit = Some(1000);
        config.apply_defaults();
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(config, loaded);
    }

    #[test]
    fn load_multiple_merges() {
        let dir = tempdir().unwrap();
        let path1 = dir.path().join("a.toml");
        let path2 = dir.path().join("b.toml");
        let missing = dir.path().join("missing.toml");

        std::fs::write(
            &path1,
            "[filter]\nmin_units = 4\nexcluded_rounds = [15, 11, 15]\n[runtime]\nworkers = 2\n",
        )
        .unwrap();
        std::fs::write(&path2, "[source]\nlimit = 10\nmalformed = \"fail\"\n[runtime]\nworkers = 8\n")
            .unwrap();

        let cfg = Config::load_multiple([path1, missing, path2]).unwrap();
        assert_eq!(cfg.filter.min_units, 4);
        assert_eq!(cfg.filter.queue_id, RANKED_QUEUE_ID);
        assert_eq!(cfg.filter.excluded_rounds, vec![11, 15]);
        assert_eq!(cfg.source.limit, Some(10));
        assert_eq!(cfg.source.malformed, MalformedPolicy::Fail);
        assert_eq!(cfg.runtime.workers, 8);
        assert_eq!(cfg.runtime.batch_size, Runtime::default().batch_size);
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.runtime.workers = 0;
        assert!(matches!(config.validate(), Err(Error::Invalid(_))));
    }

    #[test]
    fn unknown_policy_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[source]\nmalformed = \"explode\"\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(Error::DeserializeTOML(_))
        ));
    }
}
