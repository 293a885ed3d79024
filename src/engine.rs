//! One-shot lookup engine over a loaded database.

use std::fs::File;
use std::path::Path;

use crate::addr::{self, IpBits};
use crate::country::{self, UNKNOWN_COUNTRY_CODE};
use crate::db::store::DEFAULT_INDEX_CACHE_BYTES;
use crate::db::{walker, DatabaseHeader, FileStore, IndexCacheStore, MemoryStore, NodeStore};
use crate::error::{Error, Result};

/// Storage strategy, chosen once at engine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Whole file copied into one immutable in-memory buffer.
    Memory,
    /// Upper tree levels in memory, positioned file reads below.
    IndexCache {
        /// Byte budget for the cached node region.
        max_bytes: usize,
    },
    /// Positioned file reads for every node.
    File,
}

impl Backend {
    /// Index-cache backend with the default byte budget.
    pub fn index_cache() -> Self {
        Backend::IndexCache {
            max_bytes: DEFAULT_INDEX_CACHE_BYTES,
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Memory
    }
}

/// Result of one strict lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookup {
    /// Resolved 2-letter code, `"--"` for unassigned ranges.
    pub code: &'static str,
    /// Netmask bits matched before the descent reached a leaf.
    pub prefix_len: u32,
    /// Raw leaf value, for callers correlating against the record space.
    pub record_index: u32,
}

/// An immutable database snapshot plus the traversal machinery.
///
/// Construction does all the work; afterwards the engine is read-only and
/// safe for unlimited concurrent callers. Replacing a stale engine is the
/// proxy's job, not the engine's.
pub struct LookupEngine {
    header: DatabaseHeader,
    store: Box<dyn NodeStore>,
}

impl LookupEngine {
    /// Open a database file with the given storage backend.
    pub fn open(path: &Path, backend: Backend) -> Result<Self> {
        let mut file = File::open(path)?;
        let header = DatabaseHeader::read_from(&mut file)?;
        drop(file);

        let node_size = header.node_size();
        let store: Box<dyn NodeStore> = match backend {
            Backend::Memory => Box::new(MemoryStore::from_file(path, node_size)?),
            Backend::IndexCache { max_bytes } => {
                Box::new(IndexCacheStore::open(path, node_size, max_bytes)?)
            }
            Backend::File => Box::new(FileStore::open(path, node_size)?),
        };

        let engine = Self { header, store };
        engine.check_root()?;
        log::info!(
            "loaded {} country database from {} ({:?})",
            header.edition.family(),
            path.display(),
            backend
        );
        Ok(engine)
    }

    /// Build a memory-backed engine from an owned database image.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = DatabaseHeader::parse(data)?;
        let store = MemoryStore::from_bytes(data, header.node_size())?;
        let engine = Self {
            header,
            store: Box::new(store),
        };
        engine.check_root()?;
        Ok(engine)
    }

    /// A database without even a root node can never answer anything;
    /// reject it at construction instead of per lookup.
    fn check_root(&self) -> Result<()> {
        let mut buf = vec![0u8; self.header.node_size()];
        match self.store.read_node(0, &mut buf) {
            Ok(()) => Ok(()),
            Err(Error::Corrupt(_)) | Err(Error::Truncated(_)) => Err(Error::Truncated(
                "file smaller than one tree node".to_string(),
            )),
            Err(e) => Err(e),
        }
    }

    /// The parsed database header.
    pub fn header(&self) -> &DatabaseHeader {
        &self.header
    }

    /// Strict lookup: distinguishes bad input from database trouble.
    pub fn lookup(&self, address: &str) -> Result<Lookup> {
        let bits = addr::encode(address)?;
        let is_v6_query = matches!(bits, IpBits::V6(_));
        if is_v6_query != self.header.edition.is_v6() {
            return Err(Error::WrongFamily(address.to_string()));
        }

        let octets = bits.octets();
        let walk = match bits {
            IpBits::V4(_) => walker::walk(self.store.as_ref(), &self.header, &octets[..4], 32)?,
            IpBits::V6(_) => walker::walk(self.store.as_ref(), &self.header, &octets, 128)?,
        };
        let code = country::resolve(walk.record_index, &self.header)?;
        Ok(Lookup {
            code,
            prefix_len: walk.prefix_len,
            record_index: walk.record_index,
        })
    }

    /// Total lookup for the hot path: never fails.
    ///
    /// Malformed or wrong-family input resolves to `"--"` silently;
    /// database corruption and read failures also resolve to `"--"` but
    /// are logged, since silently inventing a plausible code would be
    /// worse than admitting ignorance.
    pub fn country_code(&self, address: &str) -> &'static str {
        match self.lookup(address) {
            Ok(lookup) => lookup.code,
            Err(Error::InvalidAddress(_)) | Err(Error::WrongFamily(_)) => UNKNOWN_COUNTRY_CODE,
            Err(e) => {
                log::error!("lookup failed for {}: {}", address, e);
                UNKNOWN_COUNTRY_CODE
            }
        }
    }
}
