//! Negotiated connection capabilities
//!
//! Holds the compile-time (CCAP) and runtime (RCAP) capability vectors and
//! the values derived from them that the decode paths consult, most
//! importantly the TTC field version. A [`ConnectionCookie`] captures the
//! same state so a later connect can reuse it.

use crate::constants::{ccap_index, ccap_value, charset, rcap_index, rcap_value, version};
use crate::cookie::ConnectionCookie;

/// Capabilities negotiated between client and server
#[derive(Debug, Clone)]
pub struct Capabilities {
    /// Negotiated protocol version
    pub protocol_version: u16,
    /// Character set ID for database communication
    pub charset_id: u16,
    /// National character set ID
    pub ncharset_id: u16,
    /// Compile-time capabilities array (CCAP)
    pub compile_caps: Vec<u8>,
    /// Runtime capabilities array (RCAP)
    pub runtime_caps: Vec<u8>,
    /// TTC field version, the lower of client and server
    pub ttc_field_version: u8,
    /// Server flag byte from the protocol exchange
    pub server_flags: u8,
    /// Server banner from the protocol exchange
    pub server_banner: Vec<u8>,
    /// Maximum string size (4000 or 32767)
    pub max_string_size: u32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl Capabilities {
    /// Create capabilities with the client's own defaults
    pub fn new() -> Self {
        let mut compile_caps = vec![0; ccap_index::MAX];
        compile_caps[ccap_index::FIELD_VERSION] = ccap_value::FIELD_VERSION_MAX;
        let mut runtime_caps = vec![0; rcap_index::MAX];
        runtime_caps[rcap_index::TTC] = rcap_value::TTC_32K;

        Self {
            protocol_version: 0,
            charset_id: charset::UTF8,
            ncharset_id: charset::UTF16,
            compile_caps,
            runtime_caps,
            ttc_field_version: ccap_value::FIELD_VERSION_MAX,
            server_flags: 0,
            server_banner: Vec::new(),
            max_string_size: 4000,
        }
    }

    /// Restore capabilities from a cached cookie
    pub fn from_cookie(cookie: &ConnectionCookie) -> Self {
        let mut caps = Self::new();
        caps.protocol_version = cookie.protocol_version;
        caps.charset_id = cookie.charset_id;
        caps.ncharset_id = cookie.ncharset_id;
        caps.server_flags = cookie.flags;
        caps.server_banner = cookie.server_banner.clone();
        caps.adjust_for_server_compile_caps(&cookie.compile_caps);
        caps.adjust_for_server_runtime_caps(&cookie.runtime_caps);
        caps
    }

    /// Capture the negotiated state for the cookie cache
    pub fn to_cookie(&self) -> ConnectionCookie {
        ConnectionCookie {
            protocol_version: self.protocol_version,
            server_banner: self.server_banner.clone(),
            charset_id: self.charset_id,
            ncharset_id: self.ncharset_id,
            flags: self.server_flags,
            compile_caps: self.compile_caps.clone(),
            runtime_caps: self.runtime_caps.clone(),
            populated: self.protocol_version != 0,
        }
    }

    /// Adjust field version to the minimum of client and server
    pub fn adjust_for_server_compile_caps(&mut self, server_caps: &[u8]) {
        if let Some(&server_version) = server_caps.get(ccap_index::FIELD_VERSION) {
            if server_version < self.ttc_field_version {
                self.ttc_field_version = server_version;
                self.compile_caps[ccap_index::FIELD_VERSION] = server_version;
            }
        }
    }

    /// Pick up the maximum string size from the server's runtime capabilities
    pub fn adjust_for_server_runtime_caps(&mut self, server_caps: &[u8]) {
        if let Some(&ttc) = server_caps.get(rcap_index::TTC) {
            self.max_string_size = if ttc & rcap_value::TTC_32K != 0 {
                32767
            } else {
                4000
            };
        }
    }

    /// Whether packet lengths use four bytes
    pub fn uses_large_sdu(&self) -> bool {
        self.protocol_version >= version::MIN_LARGE_SDU
    }

    /// Whether the server ends responses with an END_OF_RESPONSE message
    pub fn supports_end_of_response(&self) -> bool {
        self.protocol_version >= version::MIN_END_OF_RESPONSE
    }

    /// Whether the BOOLEAN column type is available (23.1+)
    pub fn supports_bool(&self) -> bool {
        self.ttc_field_version >= ccap_value::FIELD_VERSION_23_1
    }
}
