//! # Atoms
//!
//! An [`Atom`] is an ordered series of puts and deletes that is applied to a
//! database as a whole: either every operation becomes visible or none does.
//! Nothing recorded in an atom is durable until it is passed to
//! [`Database::write`](crate::Database::write) or
//! [`Database::commit`](crate::Database::commit).
//!
//! ```rust
//! use levelkv::{Level, MemoryBackend};
//!
//! let level = Level::new(MemoryBackend::new());
//! let mut options = level.new_options();
//! options.set_create_if_missing(true);
//! let db = level.open("store", options)?;
//!
//! let mut atom = level.new_atom();
//! atom.put("beans", "can").put("peas", "pod").delete("carrots");
//! db.commit(&mut atom)?;
//!
//! assert_eq!(db.get("beans")?, Some(b"can".to_vec()));
//! assert!(atom.is_closed());
//! # Ok::<(), levelkv::Error>(())
//! ```
//!
//! Values that know how to serialize themselves can be recorded through
//! [`Atom::object`], see [`MarshalKey`] and [`MarshalValue`].

use crate::backend::{Backend, BatchHandle, Key, Value};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::resource::{Resource, State};

/// A group of writes and deletions that all succeed or all fail.
///
/// An atom belongs to a single writer; its mutators take `&mut self`.
pub struct Atom<B: Backend> {
    level: Level<B>,
    batch: Resource<B::Batch>,
    len: usize,
}

impl<B: Backend> Atom<B> {
    pub(crate) fn new(level: Level<B>) -> Self {
        Self {
            level,
            batch: Resource::unbound(),
            len: 0,
        }
    }

    /// Store `value` at `key`.
    ///
    /// # Panics
    ///
    /// If the atom has been closed.
    pub fn put(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> &mut Self {
        self.batch_mut().put(key.as_ref(), value.as_ref());
        self.len += 1;
        self
    }

    /// Delete the value at `key`.
    ///
    /// # Panics
    ///
    /// If the atom has been closed.
    pub fn delete(&mut self, key: impl AsRef<[u8]>) -> &mut Self {
        self.batch_mut().delete(key.as_ref());
        self.len += 1;
        self
    }

    /// Empty the writes and deletes of this atom. The backend batch is kept
    /// for reuse.
    ///
    /// # Panics
    ///
    /// If the atom has been closed.
    pub fn clear(&mut self) -> &mut Self {
        assert!(!self.is_closed(), "atom used after close");
        if let Some(batch) = self.batch.get_mut() {
            batch.clear();
        }
        self.len = 0;
        self
    }

    /// Release the backend batch. Closing twice is a no-op.
    ///
    /// A closed atom can no longer be used: mutators panic and
    /// [`Database::write`](crate::Database::write) rejects it with
    /// [`Error::Released`].
    pub fn close(&mut self) -> &mut Self {
        self.batch.close();
        self.len = 0;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.batch.state() == State::Released
    }

    /// Number of operations recorded since the last clear.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The backend batch, if one has been created.
    pub fn inner(&self) -> Option<&B::Batch> {
        self.batch.get()
    }

    /// A view of this atom that accepts self-serializing keys and values.
    pub fn object(&mut self) -> ObjectAtom<'_, B> {
        ObjectAtom { atom: self }
    }

    fn batch_mut(&mut self) -> &mut B::Batch {
        let level = &self.level;
        match self
            .batch
            .get_mut_or_init(|| level.backend().new_write_batch())
        {
            Some(batch) => batch,
            None => panic!("atom used after close"),
        }
    }

    pub(crate) fn origin(&self) -> u64 {
        self.level.id()
    }

    /// The batch to hand to the backend. An atom that was never mutated gets
    /// an empty batch.
    pub(crate) fn handle(&self) -> Result<&B::Batch> {
        let level = &self.level;
        self.batch
            .get_or_init(|| level.backend().new_write_batch())
            .ok_or(Error::Released { resource: "atom" })
    }
}

/// Produces the key a value is stored under.
pub trait MarshalKey {
    fn marshal_key(&self) -> Key;
}

/// Produces the bytes a value is stored as.
pub trait MarshalValue {
    fn marshal_value(&self) -> Value;
}

impl MarshalKey for [u8] {
    fn marshal_key(&self) -> Key {
        self.to_vec()
    }
}

impl MarshalValue for [u8] {
    fn marshal_value(&self) -> Value {
        self.to_vec()
    }
}

impl MarshalKey for Vec<u8> {
    fn marshal_key(&self) -> Key {
        self.clone()
    }
}

impl MarshalValue for Vec<u8> {
    fn marshal_value(&self) -> Value {
        self.clone()
    }
}

impl MarshalKey for str {
    fn marshal_key(&self) -> Key {
        self.as_bytes().to_vec()
    }
}

impl MarshalValue for str {
    fn marshal_value(&self) -> Value {
        self.as_bytes().to_vec()
    }
}

impl MarshalKey for String {
    fn marshal_key(&self) -> Key {
        self.as_bytes().to_vec()
    }
}

impl MarshalValue for String {
    fn marshal_value(&self) -> Value {
        self.as_bytes().to_vec()
    }
}

/// An [`Atom`] that records [`MarshalKey`] / [`MarshalValue`] types directly.
///
/// Obtained from [`Atom::object`]; every operation lands in the underlying atom
/// and, like the atom's own mutators, panics once that atom is closed.
pub struct ObjectAtom<'a, B: Backend> {
    atom: &'a mut Atom<B>,
}

impl<B: Backend> ObjectAtom<'_, B> {
    pub fn delete<K: MarshalKey + ?Sized>(&mut self, key: &K) -> &mut Self {
        self.atom.delete(key.marshal_key());
        self
    }

    pub fn put<K, V>(&mut self, key: &K, value: &V) -> &mut Self
    where
        K: MarshalKey + ?Sized,
        V: MarshalValue + ?Sized,
    {
        self.atom.put(key.marshal_key(), value.marshal_value());
        self
    }

    /// Store a value under the key it produces itself.
    pub fn place<T: MarshalKey + MarshalValue + ?Sized>(&mut self, item: &T) -> &mut Self {
        self.atom.put(item.marshal_key(), item.marshal_value());
        self
    }
}
