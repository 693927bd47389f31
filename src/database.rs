//! # Database
//!
//! A [`Database`] owns one open backend connection together with the
//! [`Options`] (and through them the cache), [`ReadOptions`] and
//! [`WriteOptions`] it uses. It starts out empty, is bound to a store exactly
//! once by [`Level::open_database`], and releases everything it owns on
//! [`Database::close`] or when dropped.
//!
//! ## Thread Safety
//!
//! No locking is added here. Sharing a `Database` between threads is possible
//! exactly when the backend's connection and option handles allow it, and is
//! as safe as the backend makes it.

use std::path::Path;

use log::{debug, trace, warn};

use crate::atom::Atom;
use crate::backend::{Backend, Connection, Value};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::options::{Options, ReadOptions, WriteOptions};

/// A store opened through a storage engine.
pub struct Database<B: Backend> {
    connection: Option<B::Connection>,
    origin: Option<u64>,
    closed: bool,
    options: Option<Options<B>>,
    read_options: Option<ReadOptions<B>>,
    write_options: Option<WriteOptions<B>>,
}

impl<B: Backend> Default for Database<B> {
    fn default() -> Self {
        Self {
            connection: None,
            origin: None,
            closed: false,
            options: None,
            read_options: None,
            write_options: None,
        }
    }
}

impl<B: Backend> Database<B> {
    /// An unopened database with no options attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Options used to open this database.
    ///
    /// # Errors
    /// * [`Error::OptionsAlreadySet`] - Options were set before, or the
    ///   database has been opened (which fills in defaults)
    pub fn set_options(&mut self, options: Options<B>) -> Result<&mut Self> {
        if self.options.is_some() {
            return Err(Error::OptionsAlreadySet { which: "options" });
        }
        self.options = Some(options);
        Ok(self)
    }

    pub fn set_read_options(&mut self, read_options: ReadOptions<B>) -> Result<&mut Self> {
        if self.read_options.is_some() {
            return Err(Error::OptionsAlreadySet {
                which: "read options",
            });
        }
        self.read_options = Some(read_options);
        Ok(self)
    }

    pub fn set_write_options(&mut self, write_options: WriteOptions<B>) -> Result<&mut Self> {
        if self.write_options.is_some() {
            return Err(Error::OptionsAlreadySet {
                which: "write options",
            });
        }
        self.write_options = Some(write_options);
        Ok(self)
    }

    pub fn options(&self) -> Option<&Options<B>> {
        self.options.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    /// The backend connection.
    ///
    /// # Errors
    /// * [`Error::NotOpened`] - the database has not been opened, or was closed
    pub fn inner(&self) -> Result<&B::Connection> {
        self.connection.as_ref().ok_or(Error::NotOpened)
    }

    pub(crate) fn bind(&mut self, level: &Level<B>, path: &Path) -> Result<()> {
        if self.connection.is_some() {
            return Err(Error::AlreadyOpen);
        }
        if self.closed {
            return Err(Error::Released {
                resource: "database",
            });
        }

        let defaulted = (
            self.options.is_none(),
            self.read_options.is_none(),
            self.write_options.is_none(),
        );
        let connection = match self.connect(level, path) {
            Ok(connection) => connection,
            Err(e) => {
                // defaults only stick once a store is open
                if defaulted.0 {
                    self.options = None;
                }
                if defaulted.1 {
                    self.read_options = None;
                }
                if defaulted.2 {
                    self.write_options = None;
                }
                return Err(e);
            }
        };
        debug!(
            "opened {} store at {}",
            level.backend().name(),
            path.display()
        );
        self.connection = Some(connection);
        self.origin = Some(level.id());
        Ok(())
    }

    fn connect(&mut self, level: &Level<B>, path: &Path) -> Result<B::Connection> {
        let options = self.options.get_or_insert_with(|| level.new_options());
        let read_options = self
            .read_options
            .get_or_insert_with(|| level.new_read_options());
        let write_options = self
            .write_options
            .get_or_insert_with(|| level.new_write_options());
        options.check_origin(level.id())?;
        read_options.check_origin(level.id())?;
        write_options.check_origin(level.id())?;

        level.backend().open_database(path, options.bind()?)
    }

    fn read_handle(&self) -> Result<&B::ReadOptions> {
        self.read_options
            .as_ref()
            .ok_or(Error::NotOpened)?
            .handle()
    }

    fn write_handle(&self) -> Result<&B::WriteOptions> {
        self.write_options
            .as_ref()
            .ok_or(Error::NotOpened)?
            .handle()
    }

    /// Get the value stored at `key`, or `None` if there is none.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<Value>> {
        let connection = self.inner()?;
        connection.get(self.read_handle()?, key.as_ref())
    }

    /// Put a single value. For grouped writes, use an [`Atom`].
    pub fn put(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<()> {
        let connection = self.inner()?;
        connection.put(self.write_handle()?, key.as_ref(), value.as_ref())
    }

    /// Delete a single value. For grouped deletions, use an [`Atom`].
    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        let connection = self.inner()?;
        connection.delete(self.write_handle()?, key.as_ref())
    }

    /// Apply every operation of `atom` in one backend batch.
    ///
    /// The atom stays usable afterwards; see [`Database::commit`] to release it.
    ///
    /// # Errors
    /// * [`Error::NotOpened`] - the database is not open
    /// * [`Error::Released`] - the atom was closed
    /// * [`Error::BackendMismatch`] - the atom comes from another `Level`
    pub fn write(&self, atom: &Atom<B>) -> Result<()> {
        let connection = self.inner()?;
        if let Some(expected) = self.origin {
            if atom.origin() != expected {
                return Err(Error::BackendMismatch {
                    expected,
                    found: atom.origin(),
                });
            }
        }
        trace!("writing atom of {} operations", atom.len());
        connection.write(self.write_handle()?, atom.handle()?)
    }

    /// Write `atom`, then close it whether or not the write succeeded.
    pub fn commit(&self, atom: &mut Atom<B>) -> Result<()> {
        let result = self.write(atom);
        atom.close();
        result
    }

    /// Release the connection and every option, read option, write option
    /// and cache this database owns.
    ///
    /// Closing again, or closing a database that was never opened, does
    /// nothing. If the backend fails to close the connection, everything is
    /// still released and that error is returned.
    pub fn close(&mut self) -> Result<()> {
        let result = match self.connection.take() {
            Some(mut connection) => {
                debug!("closing store");
                connection.close()
            }
            None => Ok(()),
        };
        if let Some(options) = self.options.as_mut() {
            options.close();
        }
        if let Some(read_options) = self.read_options.as_mut() {
            read_options.close();
        }
        if let Some(write_options) = self.write_options.as_mut() {
            write_options.close();
        }
        self.closed = true;
        result
    }
}

impl<B: Backend> Drop for Database<B> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to close database: {}", e);
        }
    }
}
