// src/backends/sled_engine.rs
use std::fs;
use std::io;
use std::path::Path;

use log::{debug, trace};
use sled::{Batch, Db};

use crate::backend::{
    Backend, BatchHandle, CacheHandle, Closer, Connection, OptionsHandle, ReadOptionsHandle,
    Value, WriteOptionsHandle,
};
use crate::cache::BytesSize;
use crate::error::{Error, Result};

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        Error::backend(err)
    }
}

/// Persistent storage on the sled embedded database.
///
/// - the block cache maps to sled's page cache (`cache_capacity`)
/// - sync writes flush the store before returning
/// - sled checksums every page it reads, so `verify_checksums` is recorded only
/// - repair is not offered by sled and reports `Unsupported`
#[derive(Debug, Default, Clone, Copy)]
pub struct SledBackend;

impl SledBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for SledBackend {
    type Cache = SledCache;
    type Options = SledOptions;
    type ReadOptions = SledReadOptions;
    type WriteOptions = SledWriteOptions;
    type Batch = SledBatch;
    type Connection = SledConnection;

    fn name(&self) -> &'static str {
        "sled"
    }

    fn new_cache(&self, capacity: BytesSize) -> SledCache {
        SledCache { capacity }
    }

    fn new_options(&self) -> SledOptions {
        SledOptions::default()
    }

    fn new_read_options(&self) -> SledReadOptions {
        SledReadOptions::default()
    }

    fn new_write_options(&self) -> SledWriteOptions {
        SledWriteOptions::default()
    }

    fn new_write_batch(&self) -> SledBatch {
        SledBatch::default()
    }

    fn open_database(&self, path: &Path, options: &SledOptions) -> Result<SledConnection> {
        if !options.create_if_missing && !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "{}: does not exist (create_if_missing is false)",
                    path.display()
                ),
            )
            .into());
        }

        let mut config = sled::Config::new().path(path);
        if let Some(capacity) = options.cache_capacity {
            config = config.cache_capacity(capacity);
        }
        let db = config.open()?;
        Ok(SledConnection { db })
    }

    fn destroy_database(&self, path: &Path, _options: &SledOptions) -> Result<()> {
        if path.exists() {
            fs::remove_dir_all(path)?;
            debug!("removed sled directory {}", path.display());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SledCache {
    capacity: BytesSize,
}

impl Closer for SledCache {
    fn close(&mut self) {
        self.capacity = 0;
    }
}

impl CacheHandle for SledCache {}

#[derive(Debug, Clone, Default)]
pub struct SledOptions {
    create_if_missing: bool,
    cache_capacity: Option<BytesSize>,
}

impl Closer for SledOptions {
    fn close(&mut self) {
        self.cache_capacity = None;
    }
}

impl OptionsHandle for SledOptions {
    type Cache = SledCache;

    fn set_create_if_missing(&mut self, yes: bool) {
        self.create_if_missing = yes;
    }

    fn set_cache(&mut self, cache: &SledCache) {
        self.cache_capacity = Some(cache.capacity);
    }
}

#[derive(Debug, Clone, Default)]
pub struct SledReadOptions {
    verify_checksums: bool,
}

impl Closer for SledReadOptions {
    fn close(&mut self) {}
}

impl ReadOptionsHandle for SledReadOptions {
    fn set_verify_checksums(&mut self, yes: bool) {
        self.verify_checksums = yes;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SledWriteOptions {
    sync: bool,
}

impl Closer for SledWriteOptions {
    fn close(&mut self) {}
}

impl WriteOptionsHandle for SledWriteOptions {
    fn set_sync(&mut self, sync: bool) {
        self.sync = sync;
    }
}

#[derive(Debug, Default)]
pub struct SledBatch {
    batch: Batch,
}

impl Closer for SledBatch {
    fn close(&mut self) {
        self.batch = Batch::default();
    }
}

impl BatchHandle for SledBatch {
    fn clear(&mut self) {
        self.batch = Batch::default();
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.batch.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.batch.remove(key);
    }
}

pub struct SledConnection {
    db: Db,
}

impl SledConnection {
    fn flush_if(&self, sync: bool) -> Result<()> {
        if sync {
            let bytes = self.db.flush()?;
            trace!("flushed {} bytes", bytes);
        }
        Ok(())
    }
}

impl Connection for SledConnection {
    type ReadOptions = SledReadOptions;
    type WriteOptions = SledWriteOptions;
    type Batch = SledBatch;

    fn get(&self, _options: &SledReadOptions, key: &[u8]) -> Result<Option<Value>> {
        Ok(self.db.get(key)?.map(|ivec| ivec.to_vec()))
    }

    fn put(&self, options: &SledWriteOptions, key: &[u8], value: &[u8]) -> Result<()> {
        self.db.insert(key, value)?;
        self.flush_if(options.sync)
    }

    fn delete(&self, options: &SledWriteOptions, key: &[u8]) -> Result<()> {
        self.db.remove(key)?;
        self.flush_if(options.sync)
    }

    fn write(&self, options: &SledWriteOptions, batch: &SledBatch) -> Result<()> {
        self.db.apply_batch(batch.batch.clone())?;
        self.flush_if(options.sync)
    }

    fn close(&mut self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}
