//! # In-Memory Backend
//!
//! An ordered in-memory engine: each store is a `BTreeMap` behind a
//! `parking_lot::RwLock`, keyed by the path it was opened at. Every connection
//! opened on the same path through the same [`MemoryBackend`] sees the same
//! data, so closing and reopening a store keeps its contents for the lifetime
//! of the backend.
//!
//! ## Thread Safety
//!
//! - **Multiple concurrent readers**: gets take a shared read lock
//! - **Single writer**: puts, deletes and batches take the write lock
//!
//! ## Atomic Batches
//!
//! A batch is applied to a staged copy of the store, which replaces the live
//! store only after every operation went through. A failure part way leaves
//! the store exactly as it was. [`MemoryBackend::fail_next_write_after`] arms
//! such a failure on purpose.
//!
//! **Note**: nothing is persisted. All data is lost when the backend is dropped.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::trace;
use parking_lot::{Mutex, RwLock};

use crate::backend::{
    Backend, BatchHandle, CacheHandle, Closer, Connection, OptionsHandle, ReadOptionsHandle,
    Value, WriteOptionsHandle,
};
use crate::cache::BytesSize;
use crate::error::{Error, Result};

type Tree = BTreeMap<Vec<u8>, Vec<u8>>;

/// Thread-safe in-memory storage engine.
#[derive(Default)]
pub struct MemoryBackend {
    stores: Mutex<HashMap<PathBuf, Arc<RwLock<Tree>>>>,
    /// Operations the next batch write may apply before failing.
    fault: Arc<Mutex<Option<usize>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next batch write on any connection of this backend fail after
    /// staging `operations` operations. The fault fires once, on the next
    /// batch, even when that batch holds `operations` operations or fewer:
    /// it then fails after staging all of them. Nothing is applied either way.
    pub fn fail_next_write_after(&self, operations: usize) {
        *self.fault.lock() = Some(operations);
    }

    /// Whether a store exists at `path`.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.stores.lock().contains_key(path.as_ref())
    }
}

impl Backend for MemoryBackend {
    type Cache = MemoryCache;
    type Options = MemoryOptions;
    type ReadOptions = MemoryReadOptions;
    type WriteOptions = MemoryWriteOptions;
    type Batch = MemoryBatch;
    type Connection = MemoryConnection;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn new_cache(&self, capacity: BytesSize) -> MemoryCache {
        MemoryCache { capacity }
    }

    fn new_options(&self) -> MemoryOptions {
        MemoryOptions::default()
    }

    fn new_read_options(&self) -> MemoryReadOptions {
        MemoryReadOptions::default()
    }

    fn new_write_options(&self) -> MemoryWriteOptions {
        MemoryWriteOptions::default()
    }

    fn new_write_batch(&self) -> MemoryBatch {
        MemoryBatch::default()
    }

    fn open_database(&self, path: &Path, options: &MemoryOptions) -> Result<MemoryConnection> {
        let mut stores = self.stores.lock();
        let tree = match stores.get(path) {
            Some(tree) => Arc::clone(tree),
            None if options.create_if_missing => {
                let tree = Arc::new(RwLock::new(Tree::new()));
                stores.insert(path.to_path_buf(), Arc::clone(&tree));
                tree
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!(
                        "{}: does not exist (create_if_missing is false)",
                        path.display()
                    ),
                )
                .into())
            }
        };
        Ok(MemoryConnection {
            tree,
            fault: Arc::clone(&self.fault),
        })
    }

    fn destroy_database(&self, path: &Path, _options: &MemoryOptions) -> Result<()> {
        self.stores.lock().remove(path);
        Ok(())
    }
}

/// Cache capacity holder; the in-memory engine has no block cache to size.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    capacity: BytesSize,
}

impl MemoryCache {
    pub fn capacity(&self) -> BytesSize {
        self.capacity
    }
}

impl Closer for MemoryCache {
    fn close(&mut self) {
        self.capacity = 0;
    }
}

impl CacheHandle for MemoryCache {}

#[derive(Debug, Clone, Default)]
pub struct MemoryOptions {
    create_if_missing: bool,
    cache_capacity: Option<BytesSize>,
}

impl MemoryOptions {
    pub fn create_if_missing(&self) -> bool {
        self.create_if_missing
    }

    pub fn cache_capacity(&self) -> Option<BytesSize> {
        self.cache_capacity
    }
}

impl Closer for MemoryOptions {
    fn close(&mut self) {
        self.cache_capacity = None;
    }
}

impl OptionsHandle for MemoryOptions {
    type Cache = MemoryCache;

    fn set_create_if_missing(&mut self, yes: bool) {
        self.create_if_missing = yes;
    }

    fn set_cache(&mut self, cache: &MemoryCache) {
        self.cache_capacity = Some(cache.capacity);
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryReadOptions {
    verify_checksums: bool,
}

impl MemoryReadOptions {
    pub fn verify_checksums(&self) -> bool {
        self.verify_checksums
    }
}

impl Closer for MemoryReadOptions {
    fn close(&mut self) {}
}

impl ReadOptionsHandle for MemoryReadOptions {
    fn set_verify_checksums(&mut self, yes: bool) {
        self.verify_checksums = yes;
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryWriteOptions {
    sync: bool,
}

impl MemoryWriteOptions {
    pub fn sync(&self) -> bool {
        self.sync
    }
}

impl Closer for MemoryWriteOptions {
    fn close(&mut self) {}
}

impl WriteOptionsHandle for MemoryWriteOptions {
    fn set_sync(&mut self, sync: bool) {
        self.sync = sync;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// Recorded batch operations, in order.
#[derive(Debug, Clone, Default)]
pub struct MemoryBatch {
    ops: Vec<BatchOp>,
}

impl MemoryBatch {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Closer for MemoryBatch {
    fn close(&mut self) {
        self.ops = Vec::new();
    }
}

impl BatchHandle for MemoryBatch {
    fn clear(&mut self) {
        self.ops.clear();
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.ops.push(BatchOp::Put(key.to_vec(), value.to_vec()));
    }

    fn delete(&mut self, key: &[u8]) {
        self.ops.push(BatchOp::Delete(key.to_vec()));
    }
}

/// An open in-memory store.
pub struct MemoryConnection {
    tree: Arc<RwLock<Tree>>,
    fault: Arc<Mutex<Option<usize>>>,
}

impl Connection for MemoryConnection {
    type ReadOptions = MemoryReadOptions;
    type WriteOptions = MemoryWriteOptions;
    type Batch = MemoryBatch;

    fn get(&self, _options: &MemoryReadOptions, key: &[u8]) -> Result<Option<Value>> {
        Ok(self.tree.read().get(key).cloned())
    }

    fn put(&self, _options: &MemoryWriteOptions, key: &[u8], value: &[u8]) -> Result<()> {
        self.tree.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, _options: &MemoryWriteOptions, key: &[u8]) -> Result<()> {
        self.tree.write().remove(key);
        Ok(())
    }

    fn write(&self, _options: &MemoryWriteOptions, batch: &MemoryBatch) -> Result<()> {
        let mut tree = self.tree.write();
        let fail_after = self.fault.lock().take();

        let mut staged = tree.clone();
        for (applied, op) in batch.ops.iter().enumerate() {
            if fail_after == Some(applied) {
                return Err(injected_fault(applied));
            }
            match op {
                BatchOp::Put(key, value) => {
                    staged.insert(key.clone(), value.clone());
                }
                BatchOp::Delete(key) => {
                    staged.remove(key);
                }
            }
        }
        // a fault armed past the end of the batch still fires, once every
        // operation has been staged
        if let Some(applied) = fail_after.filter(|&n| n >= batch.ops.len()) {
            return Err(injected_fault(applied.min(batch.ops.len())));
        }
        *tree = staged;
        trace!("applied batch of {} operations", batch.ops.len());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

fn injected_fault(applied: usize) -> Error {
    io::Error::new(
        io::ErrorKind::Other,
        format!("injected write fault after {} operations", applied),
    )
    .into()
}
