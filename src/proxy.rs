//! Hot-reload proxy over one or two lookup engines.
//!
//! The proxy owns an atomically replaceable engine per address family
//! and a background thread that polls the source files' modification
//! times. A changed file is rebuilt off the read path and published with
//! a single pointer swap; lookups already holding the previous snapshot
//! finish against it and the old engine drops with its last reference.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

use arc_swap::ArcSwap;
use parking_lot::{Condvar, Mutex};

use crate::addr;
use crate::country::UNKNOWN_COUNTRY_CODE;
use crate::db::Edition;
use crate::engine::{Backend, Lookup, LookupEngine};
use crate::error::{Error, Result};

/// Default reload check interval: one hour.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(3600);

/// Proxy construction options.
#[derive(Debug, Clone, Copy)]
pub struct ProxyConfig {
    /// Storage backend used for every engine the proxy builds.
    pub backend: Backend,
    /// How often the background thread checks for a changed file.
    pub reload_interval: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            reload_interval: DEFAULT_RELOAD_INTERVAL,
        }
    }
}

/// One replaceable engine bound to its source file.
struct EngineSlot {
    path: PathBuf,
    engine: ArcSwap<LookupEngine>,
    loaded_mtime: Mutex<SystemTime>,
}

impl EngineSlot {
    /// Synchronous first load; the slot does not exist without it.
    fn load(path: &Path, backend: Backend, edition: Edition) -> Result<Self> {
        let engine = LookupEngine::open(path, backend)?;
        if engine.header().edition != edition {
            return Err(Error::WrongEdition {
                expected: edition.family(),
                path: path.display().to_string(),
            });
        }
        let mtime = file_mtime(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            engine: ArcSwap::from_pointee(engine),
            loaded_mtime: Mutex::new(mtime),
        })
    }

    /// Swap in a fresh engine if the file changed; keep serving the old
    /// snapshot on any failure.
    fn check_reload(&self, backend: Backend) {
        let mtime = match file_mtime(&self.path) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("cannot stat {}: {}", self.path.display(), e);
                return;
            }
        };
        if mtime <= *self.loaded_mtime.lock() {
            log::debug!("{} unchanged, keeping current engine", self.path.display());
            return;
        }
        match LookupEngine::open(&self.path, backend) {
            Ok(new_engine) => {
                self.engine.store(Arc::new(new_engine));
                *self.loaded_mtime.lock() = mtime;
                log::info!("hot reloaded {}", self.path.display());
            }
            Err(e) => {
                // Next interval retries; the old snapshot stays live.
                log::warn!("reload of {} failed: {}", self.path.display(), e);
            }
        }
    }

    /// One consistent snapshot for the whole call.
    fn snapshot(&self) -> Arc<LookupEngine> {
        self.engine.load_full()
    }
}

fn file_mtime(path: &Path) -> Result<SystemTime> {
    Ok(std::fs::metadata(path)?.modified()?)
}

struct Shared {
    v4: EngineSlot,
    v6: Option<EngineSlot>,
    config: ProxyConfig,
    stopped: Mutex<bool>,
    wakeup: Condvar,
}

/// Transparent lookup front-end with background database reloads.
pub struct GeoProxy {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl GeoProxy {
    /// Serve an IPv4 country database with default options.
    pub fn open(v4_path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(v4_path, ProxyConfig::default())
    }

    /// Serve an IPv4 country database with explicit options.
    pub fn with_config(v4_path: impl AsRef<Path>, config: ProxyConfig) -> Result<Self> {
        let v4 = EngineSlot::load(v4_path.as_ref(), config.backend, Edition::Country)?;
        Self::start(v4, None, config)
    }

    /// Serve a split IPv4/IPv6 database pair with default options.
    pub fn open_dual(v4_path: impl AsRef<Path>, v6_path: impl AsRef<Path>) -> Result<Self> {
        Self::open_dual_with_config(v4_path, v6_path, ProxyConfig::default())
    }

    /// Serve a split IPv4/IPv6 database pair with explicit options.
    pub fn open_dual_with_config(
        v4_path: impl AsRef<Path>,
        v6_path: impl AsRef<Path>,
        config: ProxyConfig,
    ) -> Result<Self> {
        let v4 = EngineSlot::load(v4_path.as_ref(), config.backend, Edition::Country)?;
        let v6 = EngineSlot::load(v6_path.as_ref(), config.backend, Edition::CountryV6)?;
        Self::start(v4, Some(v6), config)
    }

    fn start(v4: EngineSlot, v6: Option<EngineSlot>, config: ProxyConfig) -> Result<Self> {
        let shared = Arc::new(Shared {
            v4,
            v6,
            config,
            stopped: Mutex::new(false),
            wakeup: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("geodat-reload".to_string())
            .spawn(move || reload_loop(worker_shared))?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Country code for an IPv4 or IPv6 address; total, never fails.
    ///
    /// An IPv6 query against a v4-only proxy resolves to `"--"`.
    pub fn country_code(&self, address: &str) -> &'static str {
        match self.slot_for(address) {
            Some(slot) => slot.snapshot().country_code(address),
            None => UNKNOWN_COUNTRY_CODE,
        }
    }

    /// Strict variant of [`country_code`](Self::country_code).
    pub fn lookup(&self, address: &str) -> Result<Lookup> {
        match self.slot_for(address) {
            Some(slot) => slot.snapshot().lookup(address),
            None => Err(Error::WrongFamily(address.to_string())),
        }
    }

    fn slot_for(&self, address: &str) -> Option<&EngineSlot> {
        if addr::is_v6_literal(address) {
            self.shared.v6.as_ref()
        } else {
            Some(&self.shared.v4)
        }
    }

    /// Stop the reload thread. In-flight lookups are unaffected.
    pub fn stop(&mut self) {
        *self.shared.stopped.lock() = true;
        self.shared.wakeup.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for GeoProxy {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reload_loop(shared: Arc<Shared>) {
    loop {
        {
            let mut stopped = shared.stopped.lock();
            if !*stopped {
                shared
                    .wakeup
                    .wait_for(&mut stopped, shared.config.reload_interval);
            }
            if *stopped {
                return;
            }
        }
        shared.v4.check_reload(shared.config.backend);
        if let Some(v6) = &shared.v6 {
            v6.check_reload(shared.config.backend);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::COUNTRY_BEGIN;
    use std::fs;

    fn v4_image(left: u32, right: u32) -> Vec<u8> {
        let mut out = Vec::new();
        for child in [left, right] {
            out.extend_from_slice(&child.to_le_bytes()[..3]);
        }
        out.extend_from_slice(&[0xFF, 0xFF, 0xFF, 1]);
        out
    }

    #[test]
    fn test_proxy_requires_valid_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.dat");
        assert!(GeoProxy::open(&missing).is_err());

        let bad = dir.path().join("bad.dat");
        fs::write(&bad, [0xFF, 0xFF, 0xFF, 6]).unwrap();
        assert!(matches!(
            GeoProxy::open(&bad),
            Err(Error::UnsupportedEdition(6))
        ));
    }

    #[test]
    fn test_proxy_rejects_wrong_edition_slot() {
        let dir = tempfile::tempdir().unwrap();
        let v6_file = dir.path().join("v6.dat");
        let mut image = vec![0u8; 6];
        image.extend_from_slice(&[0xFF, 0xFF, 0xFF, 12]);
        fs::write(&v6_file, image).unwrap();
        assert!(matches!(
            GeoProxy::open(&v6_file),
            Err(Error::WrongEdition { .. })
        ));
    }

    #[test]
    fn test_proxy_routes_by_family() {
        let dir = tempfile::tempdir().unwrap();
        let v4_file = dir.path().join("v4.dat");
        fs::write(&v4_file, v4_image(COUNTRY_BEGIN + 225, COUNTRY_BEGIN)).unwrap();

        let mut proxy = GeoProxy::open(&v4_file).unwrap();
        assert_eq!(proxy.country_code("4.2.2.2"), "US");
        // No v6 slot configured.
        assert_eq!(proxy.country_code("2001:db8::1"), "--");
        assert!(matches!(
            proxy.lookup("2001:db8::1"),
            Err(Error::WrongFamily(_))
        ));
        proxy.stop();
    }

    #[test]
    fn test_stop_is_idempotent_and_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let v4_file = dir.path().join("v4.dat");
        fs::write(&v4_file, v4_image(COUNTRY_BEGIN, COUNTRY_BEGIN)).unwrap();

        // Hour-long interval: stop must not wait for the tick.
        let mut proxy = GeoProxy::open(&v4_file).unwrap();
        proxy.stop();
        proxy.stop();
    }
}
