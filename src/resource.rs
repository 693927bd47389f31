//! # Resource Lifecycle
//!
//! Every configuration object (and the batch behind an `Atom`) wraps a native
//! backend handle that is created lazily and released exactly once:
//!
//! ```text
//! Unbound --(first configuring call)--> Bound --(close)--> Released
//! ```
//!
//! `Released` is terminal. Closing again is a no-op, closing an `Unbound`
//! slot releases it without ever allocating a handle, and nothing brings a
//! released handle back.

use once_cell::sync::OnceCell;

use crate::backend::Closer;

/// Where a [`Resource`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unbound,
    Bound,
    Released,
}

/// A lazily created, close-once slot for a backend handle.
pub(crate) struct Resource<H: Closer> {
    handle: OnceCell<H>,
    released: bool,
}

impl<H: Closer> Resource<H> {
    pub(crate) const fn unbound() -> Self {
        Self {
            handle: OnceCell::new(),
            released: false,
        }
    }

    pub(crate) fn state(&self) -> State {
        if self.released {
            State::Released
        } else if self.handle.get().is_some() {
            State::Bound
        } else {
            State::Unbound
        }
    }

    /// The live handle, creating it with `init` on first use.
    /// `None` once the slot has been released.
    pub(crate) fn get_or_init(&self, init: impl FnOnce() -> H) -> Option<&H> {
        if self.released {
            return None;
        }
        Some(self.handle.get_or_init(init))
    }

    pub(crate) fn get_mut_or_init(&mut self, init: impl FnOnce() -> H) -> Option<&mut H> {
        if self.released {
            return None;
        }
        self.handle.get_or_init(init);
        self.handle.get_mut()
    }

    /// The handle if it has already been created.
    pub(crate) fn get(&self) -> Option<&H> {
        self.handle.get()
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut H> {
        self.handle.get_mut()
    }

    /// Release the handle. Returns `true` if a live handle was closed.
    pub(crate) fn close(&mut self) -> bool {
        self.released = true;
        match self.handle.take() {
            Some(mut handle) => {
                handle.close();
                true
            }
            None => false,
        }
    }
}

impl<H: Closer> Drop for Resource<H> {
    fn drop(&mut self) {
        self.close();
    }
}
