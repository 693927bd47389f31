//! # Configuration Objects
//!
//! [`Options`], [`ReadOptions`] and [`WriteOptions`] wrap the backend's own
//! option handles. They are created unbound by a [`Level`] and only ask the
//! backend for a handle on the first configuring call (or when a store needs
//! them), so an untouched default costs nothing.
//!
//! Setters return `&mut Self` and can be chained:
//!
//! ```rust
//! use levelkv::{MEGABYTE, Level, MemoryBackend};
//!
//! let level = Level::new(MemoryBackend::new());
//! let mut options = level.new_options();
//! options.set_create_if_missing(true).set_cache_size(500 * MEGABYTE);
//! ```

use crate::backend::{Backend, OptionsHandle, ReadOptionsHandle, WriteOptionsHandle};
use crate::cache::{BytesSize, Cache};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::resource::{Resource, State};

fn check_origin(expected: u64, found: u64) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::BackendMismatch { expected, found })
    }
}

/// Options for opening a store.
pub struct Options<B: Backend> {
    level: Level<B>,
    handle: Resource<B::Options>,
    cache: Option<Cache<B>>,
}

impl<B: Backend> Options<B> {
    pub(crate) fn new(level: Level<B>) -> Self {
        Self {
            level,
            handle: Resource::unbound(),
            cache: None,
        }
    }

    /// Cause opening a store to also create it if it does not exist.
    pub fn set_create_if_missing(&mut self, yes: bool) -> &mut Self {
        let level = &self.level;
        if let Some(handle) = self
            .handle
            .get_mut_or_init(|| level.backend().new_options())
        {
            handle.set_create_if_missing(yes);
        }
        self
    }

    /// Use `cache` as the store's block cache. Any previously attached cache
    /// is closed.
    pub fn set_cache(&mut self, cache: Cache<B>) -> &mut Self {
        if let Some(mut previous) = self.cache.replace(cache) {
            previous.close();
        }
        self
    }

    /// Attach a new cache of `size` bytes.
    pub fn set_cache_size(&mut self, size: BytesSize) -> &mut Self {
        let cache = self.level.new_cache(size);
        self.set_cache(cache)
    }

    pub fn cache(&self) -> Option<&Cache<B>> {
        self.cache.as_ref()
    }

    pub fn state(&self) -> State {
        self.handle.state()
    }

    pub(crate) fn check_origin(&self, expected: u64) -> Result<()> {
        check_origin(expected, self.level.id())?;
        match &self.cache {
            Some(cache) => check_origin(expected, cache.origin()),
            None => Ok(()),
        }
    }

    /// The backend handle with the attached cache bound into it.
    pub(crate) fn bind(&mut self) -> Result<&B::Options> {
        let level = &self.level;
        let handle = self
            .handle
            .get_mut_or_init(|| level.backend().new_options())
            .ok_or(Error::Released {
                resource: "options",
            })?;
        if let Some(cache) = &self.cache {
            handle.set_cache(cache.handle()?);
        }
        Ok(&*handle)
    }

    /// Release the backend options and the attached cache.
    pub fn close(&mut self) {
        self.handle.close();
        if let Some(cache) = self.cache.as_mut() {
            cache.close();
        }
    }
}

/// Options applied to every read of a store.
pub struct ReadOptions<B: Backend> {
    level: Level<B>,
    handle: Resource<B::ReadOptions>,
}

impl<B: Backend> ReadOptions<B> {
    pub(crate) fn new(level: Level<B>) -> Self {
        Self {
            level,
            handle: Resource::unbound(),
        }
    }

    /// Verify block checksums on every read.
    pub fn set_verify_checksums(&mut self, yes: bool) -> &mut Self {
        let level = &self.level;
        if let Some(handle) = self
            .handle
            .get_mut_or_init(|| level.backend().new_read_options())
        {
            handle.set_verify_checksums(yes);
        }
        self
    }

    pub fn state(&self) -> State {
        self.handle.state()
    }

    pub(crate) fn check_origin(&self, expected: u64) -> Result<()> {
        check_origin(expected, self.level.id())
    }

    pub(crate) fn handle(&self) -> Result<&B::ReadOptions> {
        let level = &self.level;
        self.handle
            .get_or_init(|| level.backend().new_read_options())
            .ok_or(Error::Released {
                resource: "read options",
            })
    }

    pub fn close(&mut self) {
        self.handle.close();
    }
}

/// Options applied to every write to a store.
pub struct WriteOptions<B: Backend> {
    level: Level<B>,
    handle: Resource<B::WriteOptions>,
}

impl<B: Backend> WriteOptions<B> {
    pub(crate) fn new(level: Level<B>) -> Self {
        Self {
            level,
            handle: Resource::unbound(),
        }
    }

    /// Set whether writes are flushed from the buffer cache before returning.
    /// This slows down writes but has better crash semantics.
    pub fn set_sync(&mut self, sync: bool) -> &mut Self {
        let level = &self.level;
        if let Some(handle) = self
            .handle
            .get_mut_or_init(|| level.backend().new_write_options())
        {
            handle.set_sync(sync);
        }
        self
    }

    pub fn state(&self) -> State {
        self.handle.state()
    }

    pub(crate) fn check_origin(&self, expected: u64) -> Result<()> {
        check_origin(expected, self.level.id())
    }

    pub(crate) fn handle(&self) -> Result<&B::WriteOptions> {
        let level = &self.level;
        self.handle
            .get_or_init(|| level.backend().new_write_options())
            .ok_or(Error::Released {
                resource: "write options",
            })
    }

    pub fn close(&mut self) {
        self.handle.close();
    }
}
