//! # levelkv
//!
//! One API for an ordered, embedded key-value store, over interchangeable
//! storage engines chosen at configuration time.
//!
//! A [`Level`] wraps one engine adapter (anything implementing [`Backend`]).
//! It creates unbound configuration objects, which only allocate engine
//! resources when first used, and opens stores into a [`Database`]. Single
//! keys are read and written through the database; grouped writes are built
//! into an [`Atom`] and applied all-or-nothing.
//!
//! ```rust
//! use levelkv::{MEGABYTE, Database, Level, MemoryBackend};
//!
//! let level = Level::new(MemoryBackend::new());
//! let mut options = level.new_options();
//! options.set_create_if_missing(true).set_cache_size(500 * MEGABYTE);
//!
//! let mut db = Database::new();
//! db.set_options(options)?;
//! level.open_database(&mut db, "leveldb")?;
//!
//! let mut atom = level.new_atom();
//! atom.put("Alpha", "x").put("Beta", "y");
//! db.commit(&mut atom)?;
//! assert_eq!(db.get("Alpha")?, Some(b"x".to_vec()));
//!
//! db.close()?;
//! # Ok::<(), levelkv::Error>(())
//! ```
//!
//! Engines shipped with the crate live in [`backends`]. Several engines can
//! be used side by side in one process; each `Level` only ever accepts the
//! wrappers it created itself.

pub mod atom;
pub mod backend;
pub mod backends;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod level;
pub mod options;
mod resource;

pub use atom::{Atom, MarshalKey, MarshalValue, ObjectAtom};
pub use backend::{
    Backend, BatchHandle, CacheHandle, Closer, Connection, Key, OptionsHandle, ReadOptionsHandle,
    Value, WriteOptionsHandle,
};
pub use backends::{MemoryBackend, SledBackend};
pub use cache::{BytesSize, Cache, BYTE, KILOBYTE, MEGABYTE};
pub use config::{EngineKind, Store, StoreConfig};
pub use database::Database;
pub use error::{Error, Result};
pub use level::Level;
pub use options::{Options, ReadOptions, WriteOptions};
pub use resource::State;
