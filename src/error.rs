//! # Error Types
//!
//! Every fallible operation in levelkv returns [`Result`]. Lifecycle misuse is
//! reported with dedicated variants; anything raised by a storage engine is
//! carried through untouched in [`Error::Backend`].

use thiserror::Error;

/// Result type alias for levelkv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the database layer and its backends.
#[derive(Error, Debug)]
pub enum Error {
    /// `open_database` was called on a Database that already holds a connection.
    /// Open a fresh Database instead of retrying on this one.
    #[error("database was already open")]
    AlreadyOpen,

    /// A data operation was attempted before a successful open, or after close.
    #[error("database has not yet been opened")]
    NotOpened,

    /// Options of this kind were already attached to the Database.
    #[error("{which} already set on this database")]
    OptionsAlreadySet { which: &'static str },

    /// A resource was used after it had been closed.
    #[error("{resource} used after close")]
    Released { resource: &'static str },

    /// A wrapper created by one backend instance was handed to another.
    #[error("handle created by backend #{found} used with backend #{expected}")]
    BackendMismatch { expected: u64, found: u64 },

    /// The backend does not provide this optional operation.
    #[error("backend `{backend}` does not support {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// An error raised by the storage engine, passed through unmodified.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl Error {
    /// Wrap any engine error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend(anyhow::Error::new(err))
    }

    /// Create an unsupported-operation error
    pub fn unsupported(backend: &'static str, operation: &'static str) -> Self {
        Error::Unsupported { backend, operation }
    }

    /// Whether this error came from the storage engine rather than this layer.
    pub fn is_backend(&self) -> bool {
        matches!(self, Error::Backend(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::backend(err)
    }
}
