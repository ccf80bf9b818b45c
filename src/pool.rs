//! Connection pool for one store endpoint.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use redis::{
    Client, Connection, ConnectionAddr, ConnectionInfo, ConnectionLike, RedisConnectionInfo,
};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::PoolStatus;

/// Idle connections unused for this long are closed on the next acquisition.
const IDLE_TIMEOUT: Duration = Duration::from_secs(240);

/// A pool of authenticated, database-selected connections to one endpoint.
///
/// Connections are dialed lazily: building a pool performs no network I/O.
/// Every connection handed out has already been authenticated (if a password
/// is configured) and switched to the configured logical database, and a
/// reused idle connection has answered a liveness probe. Callers never
/// repeat those steps.
///
/// The handle is cheap to clone and safe to share across threads; all clones
/// drive the same underlying pool.
///
/// # Example
///
/// ```rust,no_run
/// use redferry::{Config, Pool};
///
/// let pool = Pool::with_config(Config::new("10.0.0.1:6379").db(2))?;
///
/// let mut conn = pool.get()?;
/// let pong: String = redis::cmd("PING").query(&mut *conn)?;
/// assert_eq!(pong, "PONG");
/// // Dropping `conn` returns it to the pool.
/// # Ok::<(), redferry::Error>(())
/// ```
#[derive(Clone)]
pub struct Pool {
    shared: Arc<Shared>,
}

struct Shared {
    config: Config,
    client: Client,
    state: Mutex<State>,
    released: Condvar,
}

struct State {
    idle: Vec<Idle>,
    /// Live connections, borrowed and idle combined. Bounded by
    /// `max_active` unless that is 0 (unbounded).
    open: usize,
    dialed: u64,
}

struct Idle {
    conn: Connection,
    since: Instant,
}

/// Decision made under the state lock: reuse a parked connection, or dial
/// into a reserved slot.
enum Candidate {
    Reuse(Connection),
    Dial,
}

impl Pool {
    /// Creates a pool for the given `host:port` address with the default
    /// endpoint parameters.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use redferry::Pool;
    ///
    /// let pool = Pool::connect("127.0.0.1:6379")?;
    /// # Ok::<(), redferry::Error>(())
    /// ```
    pub fn connect(addr: impl Into<String>) -> Result<Self> {
        Self::with_config(Config::new(addr))
    }

    /// Creates a pool with custom configuration.
    ///
    /// The configuration is validated but no connection is dialed until the
    /// first acquisition.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use redferry::{Config, Pool};
    ///
    /// let config = Config::new("10.0.0.1:6379").db(1).max_active(16);
    /// let pool = Pool::with_config(config)?;
    /// # Ok::<(), redferry::Error>(())
    /// ```
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let (host, port) = config.host_port()?;

        // Credentials stay out of the client handle; the dial sequence
        // issues AUTH and SELECT itself.
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(host, port),
            redis: RedisConnectionInfo::default(),
        };
        let client = Client::open(info).map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                client,
                state: Mutex::new(State {
                    idle: Vec::new(),
                    open: 0,
                    dialed: 0,
                }),
                released: Condvar::new(),
            }),
        })
    }

    /// Acquires a connection for a short borrow.
    ///
    /// Reuses an idle connection when one passes its liveness probe,
    /// otherwise dials a new one. When `max_active` live connections exist,
    /// this blocks until one is released: acquisition applies backpressure
    /// instead of failing.
    ///
    /// The returned guard puts the connection back into the pool when
    /// dropped, on every exit path.
    pub fn get(&self) -> Result<PooledConn> {
        let conn = self.shared.acquire()?;
        Ok(PooledConn {
            shared: Arc::clone(&self.shared),
            conn: Some(conn),
        })
    }

    /// Acquires a connection for an open-ended borrow, such as a pub/sub
    /// subscription.
    ///
    /// The acquisition path is the same as [`Pool::get`], counting against
    /// `max_active` and blocking at saturation, but the returned guard closes
    /// the connection when dropped instead of recycling it, since a session
    /// that spent its life in subscription state is not reusable for
    /// ordinary commands.
    pub fn dedicated(&self) -> Result<DedicatedConn> {
        let conn = self.shared.acquire()?;
        Ok(DedicatedConn {
            shared: Arc::clone(&self.shared),
            conn: Some(conn),
        })
    }

    /// Returns a snapshot of the pool's bookkeeping.
    pub fn status(&self) -> PoolStatus {
        let state = self.shared.lock_state();
        PoolStatus {
            open: state.open,
            idle: state.idle.len(),
            dialed: state.dialed,
        }
    }

    /// Returns a reference to the configuration the pool was built from.
    pub fn config(&self) -> &Config {
        &self.shared.config
    }
}

// redis::Connection has no Debug impl, so these are spelled out by hand.
impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.status();
        f.debug_struct("Pool")
            .field("addr", &self.shared.config.addr)
            .field("open", &status.open)
            .field("idle", &status.idle)
            .field("dialed", &status.dialed)
            .finish()
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Produces a validated connection, retrying internally for as long as
    /// idle candidates keep failing their probe.
    fn acquire(&self) -> Result<Connection> {
        loop {
            match self.next_candidate() {
                Candidate::Reuse(mut conn) => {
                    // A reused connection must answer PING before it is
                    // handed out; a dead one is discarded, never resold.
                    if conn.check_connection() {
                        return Ok(conn);
                    }
                    tracing::warn!(
                        "idle connection to {} failed its liveness probe; discarding",
                        self.config.addr
                    );
                    self.discard(conn);
                }
                Candidate::Dial => match self.dial() {
                    Ok(conn) => return Ok(conn),
                    Err(err) => {
                        self.release_slot();
                        return Err(err);
                    }
                },
            }
        }
    }

    /// Picks the next candidate under the lock, blocking while the pool is
    /// saturated. A `Dial` decision reserves a slot in `open` so the cap is
    /// respected without holding the lock through the dial.
    fn next_candidate(&self) -> Candidate {
        let mut state = self.lock_state();
        loop {
            let reaped = state.reap_stale();
            if reaped > 0 {
                tracing::debug!(
                    "closed {} idle connection(s) to {} past the idle timeout",
                    reaped,
                    self.config.addr
                );
            }

            if let Some(idle) = state.idle.pop() {
                return Candidate::Reuse(idle.conn);
            }

            if self.config.max_active == 0 || state.open < self.config.max_active {
                state.open += 1;
                return Candidate::Dial;
            }

            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Dials a fresh connection: transport open under the connect timeout,
    /// socket deadlines, then AUTH and SELECT. A failure at any step closes
    /// the partially-open connection by dropping it.
    fn dial(&self) -> Result<Connection> {
        let addr = &self.config.addr;

        let mut conn = self
            .client
            .get_connection_with_timeout(self.config.connect_timeout)
            .map_err(|source| Error::Connect {
                addr: addr.clone(),
                source,
            })?;

        conn.set_read_timeout(Some(self.config.read_timeout))
            .map_err(|source| Error::Connect {
                addr: addr.clone(),
                source,
            })?;
        conn.set_write_timeout(Some(self.config.write_timeout))
            .map_err(|source| Error::Connect {
                addr: addr.clone(),
                source,
            })?;

        if let Some(password) = &self.config.password {
            redis::cmd("AUTH")
                .arg(password)
                .query::<()>(&mut conn)
                .map_err(|source| Error::Auth {
                    addr: addr.clone(),
                    source,
                })?;
        }

        redis::cmd("SELECT")
            .arg(self.config.db)
            .query::<()>(&mut conn)
            .map_err(|source| Error::Select {
                addr: addr.clone(),
                db: self.config.db,
                source,
            })?;

        self.lock_state().dialed += 1;
        tracing::debug!("dialed connection to {} (db {})", addr, self.config.db);
        Ok(conn)
    }

    /// Returns a connection to the idle set, or closes it if the session is
    /// no longer open or the idle set is full. Wakes one waiter either way.
    fn put_back(&self, conn: Connection) {
        let mut state = self.lock_state();
        if conn.is_open() && state.idle.len() < self.config.max_idle {
            state.idle.push(Idle {
                conn,
                since: Instant::now(),
            });
        } else {
            state.open -= 1;
        }
        drop(state);
        self.released.notify_one();
    }

    /// Closes a connection without returning it to the idle set.
    fn discard(&self, conn: Connection) {
        drop(conn);
        self.release_slot();
    }

    /// Gives up a slot in `open` and wakes one waiter.
    fn release_slot(&self) {
        let mut state = self.lock_state();
        state.open -= 1;
        drop(state);
        self.released.notify_one();
    }
}

impl State {
    /// Closes idle connections past [`IDLE_TIMEOUT`]; returns how many.
    fn reap_stale(&mut self) -> usize {
        let before = self.idle.len();
        self.idle.retain(|idle| idle.since.elapsed() < IDLE_TIMEOUT);
        let reaped = before - self.idle.len();
        self.open -= reaped;
        reaped
    }
}

/// A connection borrowed from a [`Pool`] for one short interaction.
///
/// Dereferences to [`redis::Connection`]. Dropping the guard returns the
/// connection to the pool's idle set (or closes it if the session died or
/// the idle set is full); the return happens on every exit path, including
/// unwinding.
pub struct PooledConn {
    shared: Arc<Shared>,
    conn: Option<Connection>,
}

impl Deref for PooledConn {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConn {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.shared.put_back(conn);
        }
    }
}

impl fmt::Debug for PooledConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConn").finish_non_exhaustive()
    }
}

/// A connection acquired from a [`Pool`] for the lifetime of one long-lived
/// use, such as a subscription.
///
/// Unlike [`PooledConn`], dropping this guard closes the connection instead
/// of recycling it. It still occupies one of the pool's `max_active` slots
/// while alive, and its release wakes blocked acquirers.
pub struct DedicatedConn {
    shared: Arc<Shared>,
    conn: Option<Connection>,
}

impl Deref for DedicatedConn {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for DedicatedConn {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for DedicatedConn {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.shared.discard(conn);
        }
    }
}

impl fmt::Debug for DedicatedConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DedicatedConn").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Unit tests that don't require a live server. Port 1 on localhost is
    // assumed closed, which makes dial attempts fail fast.

    #[test]
    fn test_build_is_lazy() {
        let pool = Pool::connect("127.0.0.1:1").unwrap();
        let status = pool.status();
        assert_eq!(status.open, 0);
        assert_eq!(status.idle, 0);
        assert_eq!(status.dialed, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Pool::connect("").unwrap_err();
        assert!(err.is_config());

        let err = Pool::with_config(Config::new("host-without-port")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_failed_dial_releases_slot() {
        let pool = Pool::with_config(
            Config::new("127.0.0.1:1")
                .max_active(1)
                .connect_timeout(Duration::from_millis(200)),
        )
        .unwrap();

        let err = pool.get().unwrap_err();
        assert!(err.is_connection());

        // The reserved slot must have been given back, or the next attempt
        // would block forever against max_active = 1.
        assert_eq!(pool.status().open, 0);
        let err = pool.get().unwrap_err();
        assert!(err.is_connection());
    }

    #[test]
    fn test_clones_share_state() {
        let pool = Pool::connect("127.0.0.1:1").unwrap();
        let clone = pool.clone();
        let _ = pool.get().unwrap_err();
        assert_eq!(pool.status(), clone.status());
    }

    #[test]
    fn test_debug_shows_address_and_counters() {
        let pool = Pool::connect("127.0.0.1:1").unwrap();
        let rendered = format!("{:?}", pool);
        assert!(rendered.contains("127.0.0.1:1"));
        assert!(rendered.contains("dialed: 0"));
    }
}
