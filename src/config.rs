//! Configuration types for redferry.

use std::time::Duration;

use crate::{Error, Result};

/// Configuration for one store endpoint and the pool built on top of it.
///
/// A `Config` is immutable once a pool is built from it; the pool keeps its
/// own copy. All fields have compiled-in defaults, so a bare
/// `Config::new(addr)` is a working configuration.
///
/// # Example
///
/// ```rust,no_run
/// use redferry::Config;
/// use std::time::Duration;
///
/// let config = Config::new("10.0.0.1:6379")
///     .db(2)
///     .password("hunter2")
///     .max_idle(8)
///     .max_active(32)
///     .connect_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint address as `host:port`.
    pub(crate) addr: String,

    /// Logical database index selected after connecting.
    pub(crate) db: u32,

    /// Password sent after connecting, if the endpoint requires one.
    pub(crate) password: Option<String>,

    /// Maximum number of idle connections kept warm in the pool.
    pub(crate) max_idle: usize,

    /// Maximum number of live connections; 0 means unbounded.
    pub(crate) max_active: usize,

    /// Timeout for opening the transport.
    pub(crate) connect_timeout: Duration,

    /// Read deadline applied to each connection's socket.
    pub(crate) read_timeout: Duration,

    /// Write deadline applied to each connection's socket.
    pub(crate) write_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:6379".to_string(),
            db: 0,
            password: None,
            max_idle: 3,
            max_active: 0, // unbounded
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(180),
            write_timeout: Duration::from_secs(3),
        }
    }
}

impl Config {
    /// Creates a configuration for the given `host:port` address with the
    /// default endpoint parameters.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use redferry::Config;
    ///
    /// let config = Config::new("172.18.3.227:6379");
    /// ```
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Sets the logical database index.
    ///
    /// Default: `0`
    pub fn db(mut self, db: u32) -> Self {
        self.db = db;
        self
    }

    /// Sets the password sent after connecting.
    ///
    /// Default: none (no authentication step)
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the maximum number of idle connections kept warm.
    ///
    /// Default: `3`
    pub fn max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// Sets the maximum number of live connections.
    ///
    /// When the limit is reached, acquisition blocks until a connection is
    /// released rather than failing.
    ///
    /// Default: `0` (unbounded)
    pub fn max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    /// Sets the timeout for opening the transport.
    ///
    /// Default: 5 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read deadline applied to each connection's socket.
    ///
    /// Default: 180 seconds
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the write deadline applied to each connection's socket.
    ///
    /// Default: 3 seconds
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Splits the address into host and port.
    pub(crate) fn host_port(&self) -> Result<(String, u16)> {
        let (host, port) = self.addr.rsplit_once(':').ok_or_else(|| {
            Error::Config(format!("invalid address '{}': expected host:port", self.addr))
        })?;

        // Tolerate bracketed IPv6 literals like [::1]:6379.
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(Error::Config(format!(
                "invalid address '{}': empty host",
                self.addr
            )));
        }

        let port = port.parse::<u16>().map_err(|_| {
            Error::Config(format!("invalid address '{}': bad port '{}'", self.addr, port))
        })?;

        Ok((host.to_string(), port))
    }

    /// Validates the configuration.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.addr.is_empty() {
            return Err(Error::Config("address cannot be empty".into()));
        }

        self.host_port()?;

        if self.connect_timeout.is_zero() {
            return Err(Error::Config("connect_timeout must be non-zero".into()));
        }

        if self.read_timeout.is_zero() {
            return Err(Error::Config("read_timeout must be non-zero".into()));
        }

        if self.write_timeout.is_zero() {
            return Err(Error::Config("write_timeout must be non-zero".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::new("127.0.0.1:6379");
        assert_eq!(config.addr, "127.0.0.1:6379");
        assert_eq!(config.db, 0);
        assert_eq!(config.password, None);
        assert_eq!(config.max_idle, 3);
        assert_eq!(config.max_active, 0);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(180));
        assert_eq!(config.write_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new("10.1.2.3:6380")
            .db(5)
            .password("secret")
            .max_idle(10)
            .max_active(20)
            .connect_timeout(Duration::from_millis(500))
            .read_timeout(Duration::from_secs(30))
            .write_timeout(Duration::from_secs(10));

        assert_eq!(config.addr, "10.1.2.3:6380");
        assert_eq!(config.db, 5);
        assert_eq!(config.password, Some("secret".to_string()));
        assert_eq!(config.max_idle, 10);
        assert_eq!(config.max_active, 20);
        assert_eq!(config.connect_timeout, Duration::from_millis(500));
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert_eq!(config.write_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_host_port() {
        let (host, port) = Config::new("example.com:6379").host_port().unwrap();
        assert_eq!(host, "example.com");
        assert_eq!(port, 6379);

        let (host, port) = Config::new("[::1]:6380").host_port().unwrap();
        assert_eq!(host, "::1");
        assert_eq!(port, 6380);

        assert!(Config::new("no-port").host_port().is_err());
        assert!(Config::new(":6379").host_port().is_err());
        assert!(Config::new("host:notaport").host_port().is_err());
        assert!(Config::new("host:99999").host_port().is_err());
    }

    #[test]
    fn test_validation() {
        let config = Config::new("");
        assert!(config.validate().is_err());

        let config = Config::new("127.0.0.1");
        assert!(config.validate().is_err());

        let config = Config::new("127.0.0.1:6379").connect_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = Config::new("127.0.0.1:6379").read_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = Config::new("127.0.0.1:6379").write_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = Config::new("127.0.0.1:6379");
        assert!(config.validate().is_ok());
    }
}
