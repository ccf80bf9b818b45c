//! # redferry - Redis Key Migration & Connection Pooling
//!
//! Copies keys between Redis-compatible stores, preserving each key's native
//! data structure, over a managed synchronous connection pool.
//!
//! ## Features
//!
//! - **Typed Migration**: Each key is copied with the commands native to its
//!   structure, so strings, hashes, and sets survive as what they are
//! - **Structured Outcomes**: A per-key [`MigrationReport`] instead of
//!   fire-and-forget logging; one key's failure never stops the pass
//! - **Managed Pool**: Lazy dialing, AUTH and SELECT baked into every
//!   connection, liveness probes on reuse, idle reclamation, and blocking
//!   checkout at the active-connection cap
//! - **Key Enumeration**: Cursored SCAN over a match pattern, safe for large
//!   keyspaces
//! - **Pub/Sub Relay**: A dedicated-connection subscribe loop that hands every
//!   message to your handler
//! - **Runtime Agnostic**: Fully synchronous; no async runtime required
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redferry::{keys, migrate_keys, Pool};
//!
//! let source = Pool::connect("127.0.0.1:6379")?;
//! let dest = Pool::connect("10.0.0.2:6379")?;
//!
//! // Move everything under sessions:* to the destination.
//! let session_keys = keys(&source, "sessions:*")?;
//! let report = migrate_keys(&source, &dest, &session_keys)?;
//!
//! println!(
//!     "{} migrated, {} skipped, {} failed",
//!     report.migrated(),
//!     report.skipped(),
//!     report.failed()
//! );
//! # Ok::<(), redferry::Error>(())
//! ```
//!
//! ## Migration Semantics
//!
//! Migration is additive and idempotent, never destructive:
//!
//! - **Strings** overwrite the destination value verbatim.
//! - **Hashes** merge field by field; destination fields absent from the
//!   source are left in place.
//! - **Sets** union their members into the destination set.
//! - **Anything else** (lists, sorted sets, streams) is recorded as skipped;
//!   the destination is not touched.
//!
//! Re-running a pass is safe. The trade-off: a migrated hash or set can end
//! up a superset of its source, and stale destination entries are never
//! cleared. Delete the destination key first if you need an exact copy.
//!
//! ## Connection Management
//!
//! A [`Pool`] hands out connections that are already authenticated and on
//! the configured database. Short borrows go through [`Pool::get`] and
//! return to the pool on drop; open-ended borrows (subscriptions) go through
//! [`Pool::dedicated`] and close on drop. Run one-off commands with
//! [`execute`]:
//!
//! ```rust,no_run
//! use redferry::{execute, Pool};
//!
//! let pool = Pool::connect("127.0.0.1:6379")?;
//! let dbsize: i64 = execute(&pool, &redis::cmd("DBSIZE"))?;
//! # Ok::<(), redferry::Error>(())
//! ```
//!
//! ## Configuration
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use redferry::{Config, Pool};
//!
//! let config = Config::new("10.0.0.1:6380")
//!     .db(2)
//!     .password("hunter2")
//!     .max_idle(8)
//!     .max_active(32)
//!     .connect_timeout(Duration::from_secs(2));
//!
//! let pool = Pool::with_config(config)?;
//! # Ok::<(), redferry::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

mod commands;
mod config;
mod error;
mod migrate;
mod pool;
mod pubsub;
mod types;

pub use commands::{execute, keys, scan_keys};
pub use config::Config;
pub use error::{Error, Result};
pub use migrate::{migrate, migrate_keys, migrate_with};
pub use pool::{DedicatedConn, Pool, PooledConn};
pub use pubsub::subscribe;
pub use types::{KeyOutcome, KeyReport, KeyType, MigrationReport, PoolStatus};

/// Re-export of the underlying client crate, so callers can build
/// [`Cmd`](redis::Cmd)s and decode replies without declaring their own
/// `redis` dependency.
pub use redis;

/// Prelude module for convenient imports.
///
/// ```rust,no_run
/// use redferry::prelude::*;
/// ```
pub mod prelude {
    pub use crate::commands::{execute, keys, scan_keys};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::migrate::{migrate, migrate_keys, migrate_with};
    pub use crate::pool::{DedicatedConn, Pool, PooledConn};
    pub use crate::pubsub::subscribe;
    pub use crate::types::{KeyOutcome, KeyReport, KeyType, MigrationReport, PoolStatus};
}
