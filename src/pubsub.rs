//! Channel subscription over a dedicated connection.

use std::fmt::Display;

use crate::error::Result;
use crate::pool::Pool;

/// Subscribes to `channel` and delivers every published message to
/// `handler`, blocking the calling thread for the life of the subscription.
///
/// The subscription runs on a [`DedicatedConn`](crate::pool::DedicatedConn):
/// it counts against the pool's `max_active` while alive and the connection
/// is closed, not recycled, when the subscription ends. The socket read
/// deadline is cleared first, since a subscribed connection may legitimately
/// sit quiet for longer than any command timeout.
///
/// The handler is invoked with the raw payload bytes of each message, in
/// arrival order, on this thread. A handler error is logged and the loop
/// keeps receiving; delivery is fire-and-forget.
///
/// This function does not return while the subscription is healthy. It
/// returns only the error that ended it (a failed acquisition or SUBSCRIBE,
/// or the transport failing mid-receive), never `Ok`. There is no
/// cooperative shutdown: the loop ends when the connection dies.
///
/// # Example
///
/// ```rust,no_run
/// use redferry::Pool;
///
/// let pool = Pool::connect("127.0.0.1:6379")?;
/// redferry::subscribe(&pool, "events", |payload| {
///     println!("event: {}", String::from_utf8_lossy(payload));
///     Ok::<(), redferry::Error>(())
/// })?;
/// # Ok::<(), redferry::Error>(())
/// ```
pub fn subscribe<F, E>(pool: &Pool, channel: &str, mut handler: F) -> Result<()>
where
    F: FnMut(&[u8]) -> std::result::Result<(), E>,
    E: Display,
{
    let mut conn = pool.dedicated()?;
    conn.set_read_timeout(None)?;

    let mut sub = conn.as_pubsub();
    sub.subscribe(channel)?;
    tracing::info!("subscribed to '{}'", channel);

    loop {
        let msg = match sub.get_message() {
            Ok(msg) => msg,
            Err(err) => {
                tracing::warn!("subscription to '{}' lost: {}", channel, err);
                return Err(err.into());
            }
        };

        if let Err(err) = handler(msg.get_payload_bytes()) {
            tracing::warn!("handler for '{}' failed: {}", channel, err);
        }
    }
}
