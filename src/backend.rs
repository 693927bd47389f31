//! # Backend Capability Contract
//!
//! This module defines the interface every storage engine adapter implements.
//! The database layer only ever talks to these traits, so engines can be
//! swapped (or run side by side in one process) without changing client code.
//!
//! An adapter provides one [`Backend`] type whose associated types name its
//! native handles. Because the wrappers in this crate are generic over the
//! backend, handles from two different adapter types can never meet inside one
//! `Database`; the compiler rejects it.
//!
//! ## Implementations
//!
//! - `MemoryBackend`: ordered in-memory store, one `BTreeMap` per path
//! - `SledBackend`: persistent storage using the sled embedded database
//!
//! ## Thread Safety
//!
//! This layer adds no locking. Whether a connection or cache may be shared
//! across threads is decided entirely by the adapter's handle types.

use std::path::Path;

use crate::cache::BytesSize;
use crate::error::{Error, Result};

/// A key, as stored by the backend.
pub type Key = Vec<u8>;

/// A value, as returned by the backend.
pub type Value = Vec<u8>;

/// Releases the native resource behind a handle.
///
/// Callers in this crate guarantee `close` is invoked at most once per handle.
#[cfg_attr(test, mockall::automock)]
pub trait Closer {
    fn close(&mut self);
}

/// A block cache sized in bytes.
pub trait CacheHandle: Closer {}

/// Options used when opening, destroying or repairing a store.
pub trait OptionsHandle: Closer {
    type Cache: CacheHandle;

    /// Create the store on open if it does not exist yet.
    fn set_create_if_missing(&mut self, yes: bool);

    /// Use `cache` as the store's block cache. The cache stays owned by the caller.
    fn set_cache(&mut self, cache: &Self::Cache);
}

pub trait ReadOptionsHandle: Closer {
    fn set_verify_checksums(&mut self, yes: bool);
}

pub trait WriteOptionsHandle: Closer {
    /// Block each write until it has been flushed to durable storage.
    fn set_sync(&mut self, sync: bool);
}

/// An ordered sequence of puts and deletes, applied atomically by
/// [`Connection::write`].
pub trait BatchHandle: Closer {
    /// Drop every recorded operation. The handle stays usable.
    fn clear(&mut self);

    fn put(&mut self, key: &[u8], value: &[u8]);

    fn delete(&mut self, key: &[u8]);
}

/// An open store.
pub trait Connection {
    type ReadOptions: ReadOptionsHandle;
    type WriteOptions: WriteOptionsHandle;
    type Batch: BatchHandle;

    /// Retrieve the value stored at `key`.
    ///
    /// # Returns
    /// * `Ok(None)` - The key does not exist. Adapters must translate their
    ///   engine's own not-found signal into this, never into an error.
    fn get(&self, options: &Self::ReadOptions, key: &[u8]) -> Result<Option<Value>>;

    fn put(&self, options: &Self::WriteOptions, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete `key`. Deleting a missing key succeeds.
    fn delete(&self, options: &Self::WriteOptions, key: &[u8]) -> Result<()>;

    /// Apply every operation in `batch`, in order, as one atomic unit.
    ///
    /// On error none of the operations may be visible. The batch itself is
    /// left untouched so it can be retried or closed by the caller.
    fn write(&self, options: &Self::WriteOptions, batch: &Self::Batch) -> Result<()>;

    /// Release the store. Called at most once.
    fn close(&mut self) -> Result<()>;
}

/// A storage engine adapter: the factory for every native handle.
pub trait Backend {
    type Cache: CacheHandle;
    type Options: OptionsHandle<Cache = Self::Cache>;
    type ReadOptions: ReadOptionsHandle;
    type WriteOptions: WriteOptionsHandle;
    type Batch: BatchHandle;
    type Connection: Connection<
        ReadOptions = Self::ReadOptions,
        WriteOptions = Self::WriteOptions,
        Batch = Self::Batch,
    >;

    /// Short engine name, used in diagnostics.
    fn name(&self) -> &'static str;

    fn new_cache(&self, capacity: BytesSize) -> Self::Cache;

    fn new_options(&self) -> Self::Options;

    fn new_read_options(&self) -> Self::ReadOptions;

    fn new_write_options(&self) -> Self::WriteOptions;

    fn new_write_batch(&self) -> Self::Batch;

    /// Open (and with create-if-missing, create) the store at `path`.
    fn open_database(&self, path: &Path, options: &Self::Options) -> Result<Self::Connection>;

    /// Remove the store at `path` and everything in it.
    ///
    /// Optional: adapters that cannot destroy a store keep this default,
    /// which reports [`Error::Unsupported`].
    fn destroy_database(&self, path: &Path, options: &Self::Options) -> Result<()> {
        let _ = (path, options);
        Err(Error::unsupported(self.name(), "destroy"))
    }

    /// Attempt to recover a damaged store at `path`.
    ///
    /// Optional, like [`Backend::destroy_database`].
    fn repair_database(&self, path: &Path, options: &Self::Options) -> Result<()> {
        let _ = (path, options);
        Err(Error::unsupported(self.name(), "repair"))
    }
}
