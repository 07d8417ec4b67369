//! Connection string parsing.
//!
//! Parses libpq-style `key=value` connection strings into a validated
//! [`ConnectionConfig`]. Parsing is pure: nothing here touches the network or
//! the filesystem, so a bad string is always reported before any connection
//! attempt.
//!
//! Supported syntax:
//! - tokens separated by spaces or tabs, whitespace around `=` allowed
//! - values may be single-quoted to contain whitespace; inside quotes `\'` is a
//!   literal quote and `\\` a literal backslash
//! - when a key repeats, the last occurrence wins
//!
//! Unknown keys are rejected so that typos fail fast.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::DbError;

/// Connect timeout used when the string has no `connect_timeout` key.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Server-side statement timeout applied to every session.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest statement timeout the server accepts, in milliseconds.
pub const MAX_QUERY_TIMEOUT_MS: u64 = i32::MAX as u64;

/// A password that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw secret. Only the driver layer should need this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(********)")
    }
}

/// TLS negotiation policy requested by the connection string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
    Disable,
    #[default]
    Prefer,
    Require,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
        }
    }
}

/// Validated connection parameters.
///
/// Built only through [`ConnectionConfig::parse`], so a value of this type
/// always has non-empty `host`, `dbname` and `user`, and a port in `1..=65535`
/// when one is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    host: String,
    dbname: String,
    user: String,
    password: Option<Secret>,
    port: Option<u16>,
    connect_timeout: Duration,
    query_timeout: Duration,
    application_name: Option<String>,
    options: Option<String>,
    ssl_mode: SslMode,
    keepalives: bool,
    keepalives_idle: Option<Duration>,
    keepalives_interval: Option<Duration>,
    keepalives_count: Option<u32>,
}

impl ConnectionConfig {
    /// Parse a libpq-style connection string.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] when a required key is missing, a value
    /// fails validation, a token is malformed, or a key is not recognized.
    pub fn parse(raw: &str) -> Result<Self, DbError> {
        let mut host = None;
        let mut dbname = None;
        let mut user = None;
        let mut password = None;
        let mut port = None;
        let mut connect_timeout = DEFAULT_CONNECT_TIMEOUT;
        let mut application_name = None;
        let mut options = None;
        let mut ssl_mode = SslMode::default();
        let mut keepalives = true;
        let mut keepalives_idle = None;
        let mut keepalives_interval = None;
        let mut keepalives_count = None;

        for (key, value) in tokenize(raw)? {
            match key.as_str() {
                "host" => host = non_empty(value),
                "dbname" => dbname = non_empty(value),
                "user" => user = non_empty(value),
                "password" => password = non_empty(value).map(Secret),
                "port" => port = Some(parse_port(&value)?),
                "connect_timeout" => connect_timeout = parse_seconds(&key, &value)?,
                "application_name" => application_name = non_empty(value),
                "options" => options = non_empty(value),
                "sslmode" => ssl_mode = parse_ssl_mode(&value)?,
                "keepalives" => keepalives = parse_bool(&key, &value)?,
                "keepalives_idle" => keepalives_idle = Some(parse_seconds(&key, &value)?),
                "keepalives_interval" => {
                    keepalives_interval = Some(parse_seconds(&key, &value)?)
                }
                "keepalives_count" => keepalives_count = Some(parse_count(&key, &value)?),
                _ => return Err(DbError::config(format!("unknown key {}", key))),
            }
        }

        Ok(Self {
            host: host.ok_or_else(|| missing("host"))?,
            dbname: dbname.ok_or_else(|| missing("dbname"))?,
            user: user.ok_or_else(|| missing("user"))?,
            password,
            port,
            connect_timeout,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            application_name,
            options,
            ssl_mode,
            keepalives,
            keepalives_idle,
            keepalives_interval,
            keepalives_count,
        })
    }

    /// Override the per-statement timeout applied to the session.
    ///
    /// The value is rounded up to whole milliseconds and clamped to
    /// `1..=MAX_QUERY_TIMEOUT_MS`; a zero statement timeout would disable it.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Duration::from_millis(query_timeout_millis(timeout));
        self
    }

    /// Override the timeout bounding connection establishment. Rounded up to
    /// whole seconds, at least one.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self.connect_timeout = Duration::from_secs(secs.max(1));
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> Option<&Secret> {
        self.password.as_ref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub fn application_name(&self) -> Option<&str> {
        self.application_name.as_deref()
    }

    pub fn options(&self) -> Option<&str> {
        self.options.as_deref()
    }

    pub fn ssl_mode(&self) -> SslMode {
        self.ssl_mode
    }

    pub fn keepalives(&self) -> bool {
        self.keepalives
    }

    pub fn keepalives_idle(&self) -> Option<Duration> {
        self.keepalives_idle
    }

    pub fn keepalives_interval(&self) -> Option<Duration> {
        self.keepalives_interval
    }

    pub fn keepalives_count(&self) -> Option<u32> {
        self.keepalives_count
    }
}

/// Statement timeout in milliseconds, never zero and never above what the
/// server accepts.
pub fn query_timeout_millis(timeout: Duration) -> u64 {
    let nanos = timeout.as_nanos();
    let millis = nanos / 1_000_000 + u128::from(nanos % 1_000_000 > 0);
    u64::try_from(millis)
        .unwrap_or(MAX_QUERY_TIMEOUT_MS)
        .clamp(1, MAX_QUERY_TIMEOUT_MS)
}

impl FromStr for ConnectionConfig {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Renders the config back as a connection string with the password masked.
impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host={} dbname={} user={}", quote(&self.host), quote(&self.dbname), quote(&self.user))?;
        if self.password.is_some() {
            f.write_str(" password=********")?;
        }
        if let Some(port) = self.port {
            write!(f, " port={}", port)?;
        }
        write!(f, " connect_timeout={}", self.connect_timeout.as_secs())?;
        if let Some(name) = &self.application_name {
            write!(f, " application_name={}", quote(name))?;
        }
        if let Some(options) = &self.options {
            write!(f, " options={}", quote(options))?;
        }
        write!(f, " sslmode={}", self.ssl_mode.as_str())?;
        if !self.keepalives {
            f.write_str(" keepalives=0")?;
        }
        if let Some(idle) = self.keepalives_idle {
            write!(f, " keepalives_idle={}", idle.as_secs())?;
        }
        if let Some(interval) = self.keepalives_interval {
            write!(f, " keepalives_interval={}", interval.as_secs())?;
        }
        if let Some(count) = self.keepalives_count {
            write!(f, " keepalives_count={}", count)?;
        }
        Ok(())
    }
}

fn missing(field: &str) -> DbError {
    DbError::config(format!("missing field {}", field))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn quote(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '\t', '\'', '\\']) {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    } else {
        value.to_string()
    }
}

fn parse_port(value: &str) -> Result<u16, DbError> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(DbError::config("invalid port")),
    }
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration, DbError> {
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(DbError::config(format!("invalid value for {}", key))),
    }
}

fn parse_count(key: &str, value: &str) -> Result<u32, DbError> {
    match value.parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(DbError::config(format!("invalid value for {}", key))),
    }
}

fn parse_ssl_mode(value: &str) -> Result<SslMode, DbError> {
    match value {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        _ => Err(DbError::config("invalid value for sslmode")),
    }
}

/// PostgreSQL boolean spellings, case-insensitive.
fn parse_bool(key: &str, value: &str) -> Result<bool, DbError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(DbError::config(format!("invalid value for {}", key))),
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Split a connection string into `(key, value)` pairs in input order.
fn tokenize(raw: &str) -> Result<Vec<(String, String)>, DbError> {
    let mut pairs = Vec::new();
    let mut chars = raw.chars().peekable();

    loop {
        while chars.next_if(|c| is_blank(*c)).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !is_blank(*c)) {
            key.push(c);
        }
        while chars.next_if(|c| is_blank(*c)).is_some() {}
        if chars.next_if_eq(&'=').is_none() {
            return Err(DbError::config(format!("malformed token '{}'", key)));
        }
        if key.is_empty() {
            return Err(DbError::config("malformed token '='"));
        }
        while chars.next_if(|c| is_blank(*c)).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'\'').is_some() {
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => value.push(escaped),
                        None => break,
                    },
                    '\'' => {
                        closed = true;
                        break;
                    }
                    c => value.push(c),
                }
            }
            if !closed {
                return Err(DbError::config(format!(
                    "unterminated quoted value for {}",
                    key
                )));
            }
        } else {
            while let Some(c) = chars.next_if(|c| !is_blank(*c)) {
                value.push(c);
            }
        }

        pairs.push((key, value));
    }

    Ok(pairs)
}
