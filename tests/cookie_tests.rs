//! Cookie cache and client identity tests

use std::sync::Arc;
use std::thread;

use tns_core::constants::ccap_value;
use tns_core::identity::sanitize;
use tns_core::{Capabilities, Config, ConnectIdentity, ConnectionCookie, CookieCache};

fn negotiated() -> Capabilities {
    let mut caps = Capabilities::new();
    caps.protocol_version = 319;
    caps.charset_id = 873;
    caps.ncharset_id = 2000;
    caps.server_banner = b"Oracle Database 19c".to_vec();
    let mut server_compile = vec![0u8; 8];
    server_compile[7] = ccap_value::FIELD_VERSION_19_1;
    caps.adjust_for_server_compile_caps(&server_compile);
    caps
}

#[test]
fn test_reconnect_reuses_negotiated_state() {
    let cache = CookieCache::new();
    let config = Config::new("db.internal", 1521, "ORCLPDB1", "app");
    let identity = config.connection_identity();

    assert!(cache.get(&identity, config.service_key()).is_none());

    let caps = negotiated();
    cache.put(&identity, config.service_key(), caps.to_cookie());

    let cookie = cache.get(&identity, config.service_key()).unwrap();
    assert!(cookie.populated);
    let restored = Capabilities::from_cookie(&cookie);
    assert_eq!(restored.protocol_version, 319);
    assert_eq!(restored.charset_id, 873);
    assert_eq!(restored.ncharset_id, 2000);
    assert_eq!(restored.ttc_field_version, ccap_value::FIELD_VERSION_19_1);
    assert_eq!(restored.server_banner, caps.server_banner);
}

#[test]
fn test_cookies_are_per_target() {
    let cache = CookieCache::new();
    let a = Config::new("db.internal", 1521, "SALES", "app");
    let b = Config::new("db.internal", 1521, "HR", "app");
    let sid = Config::with_sid("db.internal", 1521, "ORCL", "app");

    cache.put(&a.connection_identity(), a.service_key(), negotiated().to_cookie());
    assert!(cache.get(&b.connection_identity(), b.service_key()).is_none());
    assert!(cache.get(&sid.connection_identity(), sid.service_key()).is_none());

    let replacement = ConnectionCookie {
        protocol_version: 318,
        populated: true,
        ..Default::default()
    };
    cache.put(&a.connection_identity(), a.service_key(), replacement.clone());
    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache.get(&a.connection_identity(), a.service_key()),
        Some(replacement)
    );
}

#[test]
fn test_concurrent_connects_share_the_cache() {
    let cache = Arc::new(CookieCache::new());
    let handles: Vec<_> = (0..8u16)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let identity = format!("user{}@db:1521", i % 4);
                for round in 0..100u16 {
                    let cookie = ConnectionCookie {
                        protocol_version: 300 + round,
                        compile_caps: vec![i as u8; 40],
                        populated: true,
                        ..Default::default()
                    };
                    cache.put(&identity, Some("SVC"), cookie);
                    let seen = cache.get(&identity, Some("SVC")).unwrap();
                    // entries are replaced whole, never torn
                    assert_eq!(seen.compile_caps.len(), 40);
                    assert!(seen.compile_caps.iter().all(|&b| b == seen.compile_caps[0]));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(cache.len(), 4);
}

#[test]
fn test_connect_string_carries_sanitized_identity() {
    let identity = ConnectIdentity::new("report(v2).exe", "build=01", "ops", 4242);
    let config = Config::new("db.internal", 1522, "ORCLPDB1", "app");
    let descriptor = config.build_connect_string(&identity);
    assert!(descriptor.contains("(SERVICE_NAME=ORCLPDB1)"));
    assert!(descriptor.contains("(CID=(PROGRAM=report?v2?.exe)(HOST=build?01)(USER=ops))"));
    assert_eq!(identity.terminal(), "unknown");
    assert_eq!(identity.pid(), 4242);
}

#[test]
fn test_current_identity_is_computed_once() {
    let first = ConnectIdentity::current();
    let second = ConnectIdentity::current();
    assert!(std::ptr::eq(first, second));
    assert_eq!(first.pid(), std::process::id());
    for field in [first.program(), first.machine(), first.user()] {
        assert_eq!(sanitize(field), field);
    }
}
