//! # Configuration Management
//!
//! This module loads store settings and picks the storage engine at
//! configuration time. Settings come from a TOML file, with `LEVELKV_*`
//! environment variables taking precedence:
//!
//! - Engine selection (`memory` or `sled`)
//! - Store path
//! - Open, read and write options
//!
//! ## Example Configuration File (store.toml)
//! ```toml
//! path = "data"
//! engine = "sled"
//! create_if_missing = true
//! cache_capacity = 524288000
//! verify_checksums = false
//! sync = false
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use config::{Config as ConfigLib, Environment, File};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::atom::Atom;
use crate::backend::{Backend, Value};
use crate::backends::{MemoryBackend, SledBackend};
use crate::cache::BytesSize;
use crate::database::Database;
use crate::level::Level;
use crate::options::{Options, ReadOptions, WriteOptions};

/// Storage engine to open a store with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-memory store, lost when the process exits
    Memory,
    /// Persistent store using sled
    #[default]
    Sled,
}

/// Settings for opening one store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory of the store
    pub path: PathBuf,

    /// Storage engine type to use ("memory" or "sled")
    #[serde(default)]
    pub engine: EngineKind,

    /// Create the store if it does not exist yet
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,

    /// Block cache size in bytes; the engine's default when absent
    #[serde(default)]
    pub cache_capacity: Option<BytesSize>,

    #[serde(default)]
    pub verify_checksums: bool,

    /// Flush every write before it returns
    #[serde(default)]
    pub sync: bool,
}

fn default_create_if_missing() -> bool {
    true
}

impl Default for StoreConfig {
    /// A sled store in `./data`, created on first open, with engine defaults
    /// for everything else.
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
            engine: EngineKind::Sled,
            create_if_missing: true,
            cache_capacity: None,
            verify_checksums: false,
            sync: false,
        }
    }
}

impl StoreConfig {
    /// Load configuration from a file, then apply `LEVELKV_*` environment
    /// overrides (for example `LEVELKV_SYNC=true`).
    ///
    /// The file format is taken from its extension.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = ConfigLib::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("LEVELKV"))
            .build()?;

        let config: StoreConfig = settings.try_deserialize()?;
        Ok(config)
    }

    /// Options, read options and write options for `level` carrying these settings.
    pub fn configure<B: Backend>(
        &self,
        level: &Level<B>,
    ) -> (Options<B>, ReadOptions<B>, WriteOptions<B>) {
        let mut options = level.new_options();
        options.set_create_if_missing(self.create_if_missing);
        if let Some(capacity) = self.cache_capacity {
            options.set_cache_size(capacity);
        }

        let mut read_options = level.new_read_options();
        if self.verify_checksums {
            read_options.set_verify_checksums(true);
        }

        let mut write_options = level.new_write_options();
        if self.sync {
            write_options.set_sync(true);
        }
        (options, read_options, write_options)
    }

    /// Open the configured store through `level`, whatever engine it wraps.
    pub fn open_with<B: Backend>(&self, level: &Level<B>) -> crate::Result<Database<B>> {
        let (options, read_options, write_options) = self.configure(level);
        let mut database = Database::new();
        database
            .set_options(options)?
            .set_read_options(read_options)?
            .set_write_options(write_options)?;
        level.open_database(&mut database, &self.path)?;
        Ok(database)
    }

    /// Open the configured store with the engine named by [`StoreConfig::engine`].
    pub fn open(&self) -> crate::Result<Store> {
        debug!("opening {:?} store at {}", self.engine, self.path.display());
        match self.engine {
            EngineKind::Memory => {
                let level = Level::new(MemoryBackend::new());
                Ok(Store::Memory {
                    database: self.open_with(&level)?,
                    level,
                })
            }
            EngineKind::Sled => {
                let level = Level::new(SledBackend::new());
                Ok(Store::Sled {
                    database: self.open_with(&level)?,
                    level,
                })
            }
        }
    }
}

/// A store whose engine was chosen at configuration time.
///
/// Single-key operations are available directly. For atoms, match on the
/// variant and use its `level` and `database`.
pub enum Store {
    Memory {
        level: Level<MemoryBackend>,
        database: Database<MemoryBackend>,
    },
    Sled {
        level: Level<SledBackend>,
        database: Database<SledBackend>,
    },
}

impl Store {
    pub fn engine(&self) -> EngineKind {
        match self {
            Store::Memory { .. } => EngineKind::Memory,
            Store::Sled { .. } => EngineKind::Sled,
        }
    }

    pub fn get(&self, key: impl AsRef<[u8]>) -> crate::Result<Option<Value>> {
        match self {
            Store::Memory { database, .. } => database.get(key),
            Store::Sled { database, .. } => database.get(key),
        }
    }

    pub fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> crate::Result<()> {
        match self {
            Store::Memory { database, .. } => database.put(key, value),
            Store::Sled { database, .. } => database.put(key, value),
        }
    }

    pub fn delete(&self, key: impl AsRef<[u8]>) -> crate::Result<()> {
        match self {
            Store::Memory { database, .. } => database.delete(key),
            Store::Sled { database, .. } => database.delete(key),
        }
    }

    /// Commit a group of puts (`Some(value)`) and deletes (`None`) as one atom.
    pub fn commit<K, V>(&self, ops: impl IntoIterator<Item = (K, Option<V>)>) -> crate::Result<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        match self {
            Store::Memory { level, database } => {
                let mut atom = level.new_atom();
                record(&mut atom, ops);
                database.commit(&mut atom)
            }
            Store::Sled { level, database } => {
                let mut atom = level.new_atom();
                record(&mut atom, ops);
                database.commit(&mut atom)
            }
        }
    }

    pub fn close(&mut self) -> crate::Result<()> {
        match self {
            Store::Memory { database, .. } => database.close(),
            Store::Sled { database, .. } => database.close(),
        }
    }
}

fn record<B, K, V>(atom: &mut Atom<B>, ops: impl IntoIterator<Item = (K, Option<V>)>)
where
    B: Backend,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    for (key, value) in ops {
        match value {
            Some(value) => atom.put(key, value),
            None => atom.delete(key),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MEGABYTE;
    use crate::resource::State;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_config_load() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("store.toml");
        fs::write(
            &file,
            r#"
path = "data/store"
engine = "memory"
cache_capacity = 524288000
sync = true
            "#,
        )
        .unwrap();

        let config = StoreConfig::load(&file).unwrap();
        assert_eq!(config.path, PathBuf::from("data/store"));
        assert_eq!(config.engine, EngineKind::Memory);
        assert_eq!(config.cache_capacity, Some(500 * MEGABYTE));
        assert!(config.sync);
        // defaults for the keys the file leaves out
        assert!(config.create_if_missing);
        assert!(!config.verify_checksums);
    }

    #[test]
    fn test_config_load_missing_file() {
        let temp_dir = tempdir().unwrap();
        assert!(StoreConfig::load(&temp_dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_configure_binds_only_what_is_set() {
        let level = Level::new(MemoryBackend::new());
        let config = StoreConfig {
            cache_capacity: Some(MEGABYTE),
            sync: true,
            ..StoreConfig::default()
        };

        let (options, read_options, write_options) = config.configure(&level);
        assert_eq!(options.state(), State::Bound);
        assert_eq!(options.cache().unwrap().capacity(), MEGABYTE);
        assert_eq!(read_options.state(), State::Unbound);
        assert_eq!(write_options.state(), State::Bound);
    }

    #[test]
    fn test_open_memory_store() {
        let config = StoreConfig {
            engine: EngineKind::Memory,
            ..StoreConfig::default()
        };
        let mut store = config.open().unwrap();
        assert_eq!(store.engine(), EngineKind::Memory);

        store.put("Alpha", "x").unwrap();
        store
            .commit([("Beta", Some("y")), ("Alpha", None)])
            .unwrap();
        assert_eq!(store.get("Alpha").unwrap(), None);
        assert_eq!(store.get("Beta").unwrap(), Some(b"y".to_vec()));
        store.close().unwrap();
        store.close().unwrap();
    }

    #[test]
    fn test_open_sled_store() {
        let temp_dir = tempdir().unwrap();
        let config = StoreConfig {
            path: temp_dir.path().join("sled"),
            cache_capacity: Some(MEGABYTE),
            ..StoreConfig::default()
        };
        let mut store = config.open().unwrap();
        assert_eq!(store.engine(), EngineKind::Sled);

        store.put("Alpha", "x").unwrap();
        assert_eq!(store.get("Alpha").unwrap(), Some(b"x".to_vec()));
        store.close().unwrap();
    }
}
