//! Key migration between two stores.
//!
//! Keys are copied one at a time, each with the read and write commands
//! native to its data structure, so values land on the destination as the
//! same structure they had at the source. The pass is best-effort: one key's
//! failure never stops the others, and every key's fate is recorded in the
//! returned [`MigrationReport`].

use redis::Connection;

use crate::config::Config;
use crate::error::Result;
use crate::pool::Pool;
use crate::types::{KeyOutcome, KeyReport, KeyType, MigrationReport};

/// Migrates the given keys between two endpoints using default endpoint
/// parameters.
///
/// Builds a pool per endpoint and delegates to [`migrate_keys`]; see there
/// for the per-key contract.
///
/// # Example
///
/// ```rust,no_run
/// let report = redferry::migrate(
///     "127.0.0.1:6379",
///     "10.0.0.2:6379",
///     &["user:1", "user:2", "banner"],
/// )?;
/// assert!(report.is_clean());
/// # Ok::<(), redferry::Error>(())
/// ```
pub fn migrate(
    source_addr: impl Into<String>,
    dest_addr: impl Into<String>,
    keys: &[impl AsRef<str>],
) -> Result<MigrationReport> {
    migrate_with(Config::new(source_addr), Config::new(dest_addr), keys)
}

/// Migrates the given keys between two endpoints described by explicit
/// configurations.
///
/// Use this when either side needs a password, a non-default database, or
/// tuned timeouts.
///
/// # Example
///
/// ```rust,no_run
/// use redferry::Config;
///
/// let source = Config::new("127.0.0.1:6379").db(3);
/// let dest = Config::new("10.0.0.2:6379").password("hunter2");
/// let report = redferry::migrate_with(source, dest, &["user:1"])?;
/// # Ok::<(), redferry::Error>(())
/// ```
pub fn migrate_with(
    source: Config,
    dest: Config,
    keys: &[impl AsRef<str>],
) -> Result<MigrationReport> {
    let source = Pool::with_config(source)?;
    let dest = Pool::with_config(dest)?;
    migrate_keys(&source, &dest, keys)
}

/// Migrates the given keys between two caller-owned pools.
///
/// One connection is borrowed from each pool for the whole pass. For each
/// key, in input order:
///
/// - The key's type is read at the source. Strings are copied with GET and
///   SET, overwriting any destination value. Hashes are copied field by
///   field with HGETALL and HSET. Sets are copied with SMEMBERS and a single
///   SADD carrying every member.
/// - Hash and set copies are additive: destination fields or members absent
///   from the source are left in place, so re-running a pass never deletes
///   data. It also means the destination hash or set may end up a superset
///   of the source.
/// - Keys of any other type (lists, sorted sets, streams) are recorded as
///   skipped and the destination is not touched.
/// - A failure is confined to its key: the outcome is recorded as
///   [`KeyOutcome::Failed`] and the pass moves on. A hash copy that fails
///   partway leaves the fields already written.
///
/// Destination writes are not read back for verification. The returned
/// report has one entry per input key, in input order; errors are also
/// logged as they happen, but the report is the authoritative outcome.
pub fn migrate_keys(
    source: &Pool,
    dest: &Pool,
    keys: &[impl AsRef<str>],
) -> Result<MigrationReport> {
    let mut from = source.get()?;
    let mut to = dest.get()?;

    let mut report = MigrationReport::default();
    for key in keys {
        let key = key.as_ref();
        let outcome = copy_key(&mut from, &mut to, key);
        if let KeyOutcome::Failed(err) = &outcome {
            tracing::warn!("migration of '{}' failed: {}", key, err);
        }
        report.keys.push(KeyReport {
            key: key.to_string(),
            outcome,
        });
    }

    tracing::info!(
        "migrated {} of {} key(s) to {} ({} skipped, {} failed)",
        report.migrated(),
        report.len(),
        dest.config().addr,
        report.skipped(),
        report.failed()
    );
    Ok(report)
}

/// Copies one key, dispatching on its reported type.
fn copy_key(source: &mut Connection, dest: &mut Connection, key: &str) -> KeyOutcome {
    let kind = match redis::cmd("TYPE").arg(key).query::<String>(source) {
        Ok(reply) => KeyType::from_type_reply(&reply),
        Err(err) => return KeyOutcome::Failed(err.into()),
    };

    let copied = match kind {
        KeyType::String => copy_string(source, dest, key),
        KeyType::Hash => copy_hash(source, dest, key),
        KeyType::Set => copy_set(source, dest, key),
        KeyType::Unsupported => {
            tracing::debug!("skipping '{}': unsupported type", key);
            return KeyOutcome::Skipped(kind);
        }
    };

    match copied {
        Ok(()) => KeyOutcome::Migrated(kind),
        Err(err) => KeyOutcome::Failed(err),
    }
}

fn copy_string(source: &mut Connection, dest: &mut Connection, key: &str) -> Result<()> {
    let value: Vec<u8> = redis::cmd("GET").arg(key).query(source)?;
    redis::cmd("SET").arg(key).arg(value).query::<()>(dest)?;
    Ok(())
}

fn copy_hash(source: &mut Connection, dest: &mut Connection, key: &str) -> Result<()> {
    let fields: Vec<(Vec<u8>, Vec<u8>)> = redis::cmd("HGETALL").arg(key).query(source)?;
    for (field, value) in fields {
        redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query::<()>(dest)?;
    }
    Ok(())
}

fn copy_set(source: &mut Connection, dest: &mut Connection, key: &str) -> Result<()> {
    let members: Vec<Vec<u8>> = redis::cmd("SMEMBERS").arg(key).query(source)?;
    // SADD needs at least one member; the set may have vanished since TYPE.
    if members.is_empty() {
        return Ok(());
    }
    redis::cmd("SADD").arg(key).arg(members).query::<()>(dest)?;
    Ok(())
}
