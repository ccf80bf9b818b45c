//! One-shot command execution and key enumeration.

use redis::{Cmd, Connection, FromRedisValue};

use crate::error::{Error, Result};
use crate::pool::Pool;

/// Hint passed to SCAN for how many keys to examine per round trip.
const SCAN_BATCH: usize = 10_000;

/// Runs one command on a pooled connection and decodes the reply.
///
/// The connection is borrowed for exactly this command and returned to the
/// pool afterwards, whether the command succeeds or fails. Pick the reply
/// type the command calls for; use `()` to discard it.
///
/// # Example
///
/// ```rust,no_run
/// use redferry::{execute, Pool};
///
/// let pool = Pool::connect("127.0.0.1:6379")?;
/// execute::<()>(&pool, redis::cmd("SET").arg("greeting").arg("hello"))?;
/// let greeting: String = execute(&pool, redis::cmd("GET").arg("greeting"))?;
/// assert_eq!(greeting, "hello");
/// # Ok::<(), redferry::Error>(())
/// ```
pub fn execute<T: FromRedisValue>(pool: &Pool, cmd: &Cmd) -> Result<T> {
    let mut conn = pool.get()?;
    let value = cmd.query(&mut *conn)?;
    Ok(value)
}

/// Collects every key matching `pattern`, borrowing one connection from the
/// pool for the whole enumeration.
///
/// See [`scan_keys`] for the enumeration contract.
pub fn keys(pool: &Pool, pattern: &str) -> Result<Vec<String>> {
    let mut conn = pool.get()?;
    scan_keys(&mut conn, pattern)
}

/// Walks the keyspace with cursored SCAN and returns every key matching
/// `pattern`.
///
/// The cursor starts at 0 and the walk ends only when the server hands the
/// cursor back at 0; an empty batch mid-walk does not terminate it. SCAN
/// may report a key more than once; no deduplication is applied here.
///
/// If a round trip fails mid-walk, the error is [`Error::ScanAborted`] and
/// carries the keys collected before the failure. Key names are decoded as
/// UTF-8; a matching key whose name is not valid UTF-8 fails its page's
/// decode and aborts the walk the same way. Names stay `String` rather than
/// being converted lossily, since a mangled name would later address the
/// wrong key.
pub fn scan_keys(conn: &mut Connection, pattern: &str) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut cursor: u64 = 0;

    loop {
        let reply = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_BATCH)
            .query::<(u64, Vec<String>)>(conn);

        let (next, mut batch) = match reply {
            Ok(reply) => reply,
            Err(source) => {
                return Err(Error::ScanAborted {
                    pattern: pattern.to_string(),
                    keys,
                    source,
                });
            }
        };

        keys.append(&mut batch);
        cursor = next;
        if cursor == 0 {
            break;
        }
    }

    tracing::debug!("scan of '{}' matched {} key(s)", pattern, keys.len());
    Ok(keys)
}
