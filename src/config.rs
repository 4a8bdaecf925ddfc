//! Connection and fetch configuration
//!
//! Supports Oracle EZConnect format:
//! - `host:port/service_name`
//! - `host/service_name`
//! - `host:port:sid`

use std::fmt;
use std::str::FromStr;

use crate::constants::charset;
use crate::error::{Error, Result};
use crate::identity::ConnectIdentity;

/// Default Oracle port
pub const DEFAULT_PORT: u16 = 1521;

/// Default SDU size
pub const DEFAULT_SDU: u32 = 8192;

/// Default number of rows returned with the execute round-trip
pub const DEFAULT_PREFETCH_ROWS: u32 = 2;

/// Default number of rows requested per fetch round-trip
pub const DEFAULT_ARRAY_SIZE: u32 = 100;

/// Service identification method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceMethod {
    /// Connect using service name
    ServiceName(String),
    /// Connect using SID (legacy)
    Sid(String),
}

impl ServiceMethod {
    /// Service name or SID, whichever is set
    pub fn as_str(&self) -> &str {
        match self {
            ServiceMethod::ServiceName(s) | ServiceMethod::Sid(s) => s,
        }
    }
}

/// Options controlling how result sets are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Rows the server sends back with the execute call
    pub prefetch_rows: u32,
    /// Rows requested per subsequent fetch
    pub array_size: u32,
    /// Fetch LOB columns as locators; when false they are fetched inline as
    /// LONG / LONG RAW
    pub fetch_lobs: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            prefetch_rows: DEFAULT_PREFETCH_ROWS,
            array_size: DEFAULT_ARRAY_SIZE,
            fetch_lobs: true,
        }
    }
}

/// Connection configuration
///
/// ```rust
/// use tns_core::{Config, FetchOptions};
///
/// let config = Config::new("localhost", 1521, "FREEPDB1", "scott")
///     .fetch_options(FetchOptions { array_size: 500, ..Default::default() })
///     .sdu(16384);
/// assert_eq!(config.to_string(), "localhost:1521/FREEPDB1");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to connect to
    pub host: String,
    /// Port to connect to
    pub port: u16,
    /// Service name or SID
    pub service: ServiceMethod,
    /// Database user
    pub username: String,
    /// SDU (Session Data Unit) size
    pub sdu: u32,
    /// Client charset ID
    pub charset_id: u16,
    /// National charset ID
    pub ncharset_id: u16,
    /// Result set fetch options
    pub fetch: FetchOptions,
}

impl Config {
    /// Create a new configuration with service name
    pub fn new(
        host: impl Into<String>,
        port: u16,
        service_name: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            service: ServiceMethod::ServiceName(service_name.into()),
            username: username.into(),
            ..Self::default()
        }
    }

    /// Create a new configuration with SID
    pub fn with_sid(
        host: impl Into<String>,
        port: u16,
        sid: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            service: ServiceMethod::Sid(sid.into()),
            ..Self::new(host, port, String::new(), username)
        }
    }

    /// Set fetch options
    pub fn fetch_options(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }

    /// Set SDU size
    pub fn sdu(mut self, sdu: u32) -> Self {
        self.sdu = sdu;
        self
    }

    /// Service name or SID used in the cookie key
    pub fn service_key(&self) -> Option<&str> {
        match self.service.as_str() {
            "" => None,
            s => Some(s),
        }
    }

    /// Identity of this connection target for the cookie cache
    pub fn connection_identity(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }

    /// Build a TNS connect descriptor carrying the client identity
    pub fn build_connect_string(&self, identity: &ConnectIdentity) -> String {
        let service_part = match &self.service {
            ServiceMethod::ServiceName(name) => format!("(SERVICE_NAME={})", name),
            ServiceMethod::Sid(sid) => format!("(SID={})", sid),
        };
        format!(
            "(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST={})(PORT={}))(CONNECT_DATA={}{}))",
            self.host,
            self.port,
            service_part,
            identity.cid()
        )
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            service: ServiceMethod::ServiceName("FREEPDB1".to_string()),
            username: String::new(),
            sdu: DEFAULT_SDU,
            charset_id: charset::UTF8,
            ncharset_id: charset::UTF16,
            fetch: FetchOptions::default(),
        }
    }
}

fn parse_port(s: &str) -> Result<u16> {
    s.parse()
        .map_err(|_| Error::InvalidConnectionString(format!("invalid port number {:?}", s)))
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().trim_start_matches('/');
        if s.is_empty() {
            return Err(Error::InvalidConnectionString(
                "empty connection string".to_string(),
            ));
        }
        if s.starts_with('(') {
            return Err(Error::InvalidConnectionString(
                "connect descriptors are not accepted, use EZConnect".to_string(),
            ));
        }

        let mut config = Config::default();

        if let Some((host_port, service_name)) = s.split_once('/') {
            if service_name.is_empty() {
                return Err(Error::InvalidConnectionString(
                    "missing service name after /".to_string(),
                ));
            }
            config.service = ServiceMethod::ServiceName(service_name.to_string());
            match host_port.split_once(':') {
                Some((host, port)) => {
                    config.host = host.to_string();
                    config.port = parse_port(port)?;
                }
                None => config.host = host_port.to_string(),
            }
        } else {
            let parts: Vec<&str> = s.split(':').collect();
            match parts.as_slice() {
                [host] => config.host = host.to_string(),
                [host, port] => {
                    config.host = host.to_string();
                    config.port = parse_port(port)?;
                }
                [host, port, sid] => {
                    config.host = host.to_string();
                    config.port = parse_port(port)?;
                    config.service = ServiceMethod::Sid(sid.to_string());
                }
                _ => {
                    return Err(Error::InvalidConnectionString(
                        "too many colons in connection string".to_string(),
                    ))
                }
            }
        }

        if config.host.is_empty() {
            return Err(Error::InvalidConnectionString("missing host".to_string()));
        }
        Ok(config)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.service {
            ServiceMethod::ServiceName(name) => write!(f, "{}:{}/{}", self.host, self.port, name),
            ServiceMethod::Sid(sid) => write!(f, "{}:{}:{}", self.host, self.port, sid),
        }
    }
}
