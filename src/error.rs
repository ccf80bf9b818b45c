//! Error types for redferry operations.

use thiserror::Error;

/// Result type alias for redferry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while talking to a store.
#[derive(Error, Debug)]
pub enum Error {
    /// Opening the transport to the endpoint failed or timed out.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// The `host:port` address that was dialed.
        addr: String,
        /// The underlying client error.
        #[source]
        source: redis::RedisError,
    },

    /// The endpoint rejected the configured password.
    ///
    /// The half-open connection is closed before this error is returned.
    #[error("authentication failed for {addr}: {source}")]
    Auth {
        /// The `host:port` address that was dialed.
        addr: String,
        /// The underlying client error.
        #[source]
        source: redis::RedisError,
    },

    /// Selecting the configured logical database failed.
    ///
    /// The connection is closed before this error is returned.
    #[error("selecting database {db} on {addr} failed: {source}")]
    Select {
        /// The `host:port` address that was dialed.
        addr: String,
        /// The logical database index that was selected.
        db: u32,
        /// The underlying client error.
        #[source]
        source: redis::RedisError,
    },

    /// The store rejected or failed a command on an established connection.
    #[error("command error: {0}")]
    Command(#[from] redis::RedisError),

    /// A key enumeration aborted before the cursor wrapped back to zero.
    ///
    /// The keys accumulated before the failure are carried in `keys`; the
    /// sequence is incomplete but not lost.
    #[error("scan of '{pattern}' aborted after {} keys: {source}", .keys.len())]
    ScanAborted {
        /// The match pattern the scan was enumerating.
        pattern: String,
        /// Keys collected before the scan failed.
        keys: Vec<String>,
        /// The underlying client error.
        #[source]
        source: redis::RedisError,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns `true` if this error occurred while establishing a connection
    /// (dial, authentication, or database selection).
    #[inline]
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            Error::Connect { .. } | Error::Auth { .. } | Error::Select { .. }
        )
    }

    /// Returns `true` if this error is a command failure on an established
    /// connection.
    #[inline]
    pub fn is_command(&self) -> bool {
        matches!(self, Error::Command(_))
    }

    /// Returns `true` if this error is an aborted key enumeration.
    #[inline]
    pub fn is_scan_aborted(&self) -> bool {
        matches!(self, Error::ScanAborted { .. })
    }

    /// Returns `true` if this error is a configuration error.
    #[inline]
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Returns the keys accumulated before an aborted enumeration, if any.
    pub fn partial_keys(&self) -> Option<&[String]> {
        match self {
            Error::ScanAborted { keys, .. } => Some(keys),
            _ => None,
        }
    }
}
