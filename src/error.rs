//! Error types for geodat.

use thiserror::Error;

/// Error type for geodat operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The input string is not a well-formed IPv4/IPv6 address.
    #[error("invalid IP address: {0}")]
    InvalidAddress(String),

    /// The address family does not match the database edition.
    #[error("address family not served by this database: {0}")]
    WrongFamily(String),

    /// A database file holds a different edition than the caller expects.
    #[error("expected a {expected} country database: {path}")]
    WrongEdition {
        expected: &'static str,
        path: String,
    },

    /// The structure marker names an edition this crate does not read.
    #[error("unsupported database edition: {0}")]
    UnsupportedEdition(u8),

    /// The file ends before the data the format promises.
    #[error("truncated database file: {0}")]
    Truncated(String),

    /// The tree encoding is internally inconsistent.
    #[error("corrupt database: {0}")]
    Corrupt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The global lookup proxy was initialized twice.
    #[error("global lookup proxy already initialized")]
    AlreadyInitialized,
}

/// Result type alias for geodat operations.
pub type Result<T> = std::result::Result<T, Error>;
