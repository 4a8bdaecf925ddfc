//! Server cookie cache
//!
//! After a successful handshake the negotiated session parameters can be
//! kept and offered again on the next connect to the same target, letting
//! the server skip renegotiation. The cache is an explicit object, shared
//! behind an `Arc` by whatever establishes connections.

use dashmap::DashMap;
use tracing::trace;

/// Negotiated session parameters remembered between connects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionCookie {
    /// Negotiated protocol version
    pub protocol_version: u16,
    /// Server banner bytes from the protocol exchange
    pub server_banner: Vec<u8>,
    /// Database character set id
    pub charset_id: u16,
    /// National character set id
    pub ncharset_id: u16,
    /// Server flag byte
    pub flags: u8,
    /// Compile-time capability vector
    pub compile_caps: Vec<u8>,
    /// Runtime capability vector
    pub runtime_caps: Vec<u8>,
    /// Whether the cookie holds a complete negotiation
    pub populated: bool,
}

/// Build the cache key: identity followed by service name or SID
pub fn cookie_key(identity: &str, service: Option<&str>) -> String {
    let service = service.unwrap_or_default();
    let mut key = String::with_capacity(identity.len() + service.len());
    key.push_str(identity);
    key.push_str(service);
    key
}

/// Concurrent cache of connection cookies
///
/// Reads and writes lock per shard, so concurrent connects never observe a
/// partially written entry. Entries live until removed.
#[derive(Debug, Default)]
pub struct CookieCache {
    entries: DashMap<String, ConnectionCookie>,
}

impl CookieCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cookie for an identity and service
    pub fn get(&self, identity: &str, service: Option<&str>) -> Option<ConnectionCookie> {
        let key = cookie_key(identity, service);
        let found = self.entries.get(&key).map(|entry| entry.value().clone());
        trace!(key = %key, hit = found.is_some(), "cookie lookup");
        found
    }

    /// Store or replace the cookie for an identity and service
    pub fn put(&self, identity: &str, service: Option<&str>, cookie: ConnectionCookie) {
        let key = cookie_key(identity, service);
        trace!(key = %key, "cookie stored");
        self.entries.insert(key, cookie);
    }

    /// Drop the cookie for an identity and service
    pub fn remove(&self, identity: &str, service: Option<&str>) -> Option<ConnectionCookie> {
        self.entries
            .remove(&cookie_key(identity, service))
            .map(|(_, cookie)| cookie)
    }

    /// Drop every cookie
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached cookies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
