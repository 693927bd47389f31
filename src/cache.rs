//! # Block Cache
//!
//! A [`Cache`] records a byte capacity and lazily asks the backend for a block
//! cache of that size the first time a store is opened with it.
//!
//! ```rust
//! use levelkv::{MEGABYTE, Level, MemoryBackend};
//!
//! let level = Level::new(MemoryBackend::new());
//! let cache = level.new_cache(500 * MEGABYTE);
//! assert_eq!(cache.capacity(), 524_288_000);
//! ```

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::level::Level;
use crate::resource::{Resource, State};

/// A number of bytes, for sizing caches.
pub type BytesSize = u64;

pub const BYTE: BytesSize = 1;
pub const KILOBYTE: BytesSize = 1 << 10;
pub const MEGABYTE: BytesSize = 1 << 20;

/// A backend block cache of fixed capacity.
///
/// Once attached to [`Options`](crate::Options) the cache is owned by them and
/// closed together with them.
pub struct Cache<B: Backend> {
    level: Level<B>,
    capacity: BytesSize,
    handle: Resource<B::Cache>,
}

impl<B: Backend> Cache<B> {
    pub(crate) fn new(level: Level<B>, capacity: BytesSize) -> Self {
        Self {
            level,
            capacity,
            handle: Resource::unbound(),
        }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> BytesSize {
        self.capacity
    }

    pub fn state(&self) -> State {
        self.handle.state()
    }

    /// The backend cache, created on first call.
    pub(crate) fn handle(&self) -> Result<&B::Cache> {
        let level = &self.level;
        let capacity = self.capacity;
        self.handle
            .get_or_init(|| level.backend().new_cache(capacity))
            .ok_or(Error::Released { resource: "cache" })
    }

    pub(crate) fn origin(&self) -> u64 {
        self.level.id()
    }

    /// Release the backend cache. Safe to call repeatedly, and on a cache
    /// that was never used.
    pub fn close(&mut self) {
        self.handle.close();
    }
}
