//! Process-wide lookup proxy.
//!
//! Most services want exactly one proxy for their lifetime; this module
//! holds it so call sites do not have to thread a handle around.

use once_cell::sync::OnceCell;
use std::path::Path;

use crate::error::{Error, Result};
use crate::proxy::{GeoProxy, ProxyConfig};

static GLOBAL_PROXY: OnceCell<GeoProxy> = OnceCell::new();

/// Initialize the global proxy from an IPv4 country database.
///
/// Fails if the first load fails or if already initialized.
pub fn init(v4_path: impl AsRef<Path>) -> Result<()> {
    install(GeoProxy::open(v4_path)?)
}

/// Initialize the global proxy from a split IPv4/IPv6 database pair.
pub fn init_dual(v4_path: impl AsRef<Path>, v6_path: impl AsRef<Path>) -> Result<()> {
    install(GeoProxy::open_dual(v4_path, v6_path)?)
}

/// Initialize the global proxy with explicit options.
pub fn init_with_config(v4_path: impl AsRef<Path>, config: ProxyConfig) -> Result<()> {
    install(GeoProxy::with_config(v4_path, config)?)
}

fn install(proxy: GeoProxy) -> Result<()> {
    GLOBAL_PROXY
        .set(proxy)
        .map_err(|_| Error::AlreadyInitialized)
}

/// Whether [`init`] or a sibling has run successfully.
pub fn is_initialized() -> bool {
    GLOBAL_PROXY.get().is_some()
}

/// Country code via the global proxy; `"--"` when uninitialized.
pub fn lookup_country(address: &str) -> &'static str {
    match GLOBAL_PROXY.get() {
        Some(proxy) => proxy.country_code(address),
        None => crate::country::UNKNOWN_COUNTRY_CODE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::COUNTRY_BEGIN;
    use std::fs;

    // One test for the whole module: OnceCell state is process-global.
    #[test]
    fn test_global_lifecycle() {
        assert!(!is_initialized());
        assert_eq!(lookup_country("1.2.3.4"), "--");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v4.dat");
        let mut image = Vec::new();
        for child in [COUNTRY_BEGIN + 225, COUNTRY_BEGIN] {
            image.extend_from_slice(&child.to_le_bytes()[..3]);
        }
        image.extend_from_slice(&[0xFF, 0xFF, 0xFF, 1]);
        fs::write(&path, image).unwrap();

        init(&path).unwrap();
        assert!(is_initialized());
        assert_eq!(lookup_country("4.2.2.2"), "US");
        assert_eq!(lookup_country("not an ip"), "--");

        assert!(matches!(init(&path), Err(Error::AlreadyInitialized)));
    }
}
