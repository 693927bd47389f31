//! # Level
//!
//! A [`Level`] binds the user-facing API to one injected storage engine. It is
//! the factory for every configuration object, atom and database of that
//! engine, and the only place a store is opened, destroyed or repaired.
//!
//! Each `Level` carries a process-unique id stamped into everything it
//! creates. Handing wrappers from one `Level` to a database opened through
//! another fails with [`Error::BackendMismatch`] before the engine is touched.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;

use crate::atom::Atom;
use crate::backend::Backend;
use crate::cache::{BytesSize, Cache};
use crate::database::Database;
use crate::error::Result;
#[cfg(doc)]
use crate::error::Error;
use crate::options::{Options, ReadOptions, WriteOptions};

static NEXT_LEVEL_ID: AtomicU64 = AtomicU64::new(1);

/// Factory for the wrappers of one storage engine.
pub struct Level<B> {
    backend: Arc<B>,
    id: u64,
}

impl<B> Clone for Level<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            id: self.id,
        }
    }
}

impl<B: Backend> Level<B> {
    /// Wrap `backend`. Levels created from different calls never share wrappers.
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            id: NEXT_LEVEL_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn new_options(&self) -> Options<B> {
        Options::new(self.clone())
    }

    pub fn new_read_options(&self) -> ReadOptions<B> {
        ReadOptions::new(self.clone())
    }

    pub fn new_write_options(&self) -> WriteOptions<B> {
        WriteOptions::new(self.clone())
    }

    /// A cache of `capacity` bytes. Nothing is allocated until a store is
    /// opened with it.
    pub fn new_cache(&self, capacity: BytesSize) -> Cache<B> {
        Cache::new(self.clone(), capacity)
    }

    pub fn new_atom(&self) -> Atom<B> {
        Atom::new(self.clone())
    }

    /// Open the store at `path` into `database`.
    ///
    /// Missing Options, ReadOptions and WriteOptions are filled with defaults
    /// first. If the open fails, those defaults are discarded again, so the
    /// caller can set its own options and retry. If the engine refuses to open
    /// the store its error is returned unchanged and `database` stays unopened.
    ///
    /// # Errors
    /// * [`Error::AlreadyOpen`] - `database` already holds a connection; it is
    ///   left untouched
    /// * [`Error::BackendMismatch`] - the database's options come from another `Level`
    pub fn open_database(&self, database: &mut Database<B>, path: impl AsRef<Path>) -> Result<()> {
        database.bind(self, path.as_ref())
    }

    /// Open the store at `path` with `options` into a new Database.
    pub fn open(&self, path: impl AsRef<Path>, options: Options<B>) -> Result<Database<B>> {
        let mut database = Database::new();
        database.set_options(options)?;
        self.open_database(&mut database, path)?;
        Ok(database)
    }

    /// Remove the store at `path`.
    ///
    /// Optional for engines: those without support return [`Error::Unsupported`].
    pub fn destroy_database(&self, path: impl AsRef<Path>, options: &mut Options<B>) -> Result<()> {
        let path = path.as_ref();
        options.check_origin(self.id)?;
        self.backend.destroy_database(path, options.bind()?)?;
        debug!("destroyed {} store at {}", self.backend.name(), path.display());
        Ok(())
    }

    /// Try to recover a damaged store at `path`.
    ///
    /// Optional for engines: those without support return [`Error::Unsupported`].
    pub fn repair_database(&self, path: impl AsRef<Path>, options: &mut Options<B>) -> Result<()> {
        let path = path.as_ref();
        options.check_origin(self.id)?;
        self.backend.repair_database(path, options.bind()?)?;
        debug!("repaired {} store at {}", self.backend.name(), path.display());
        Ok(())
    }
}
