//! Storage backends supplying raw node bytes.
//!
//! All three backends answer the same question: the `2 * record_width`
//! byte block for node N. Results are byte-identical across backends;
//! only the I/O strategy differs.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use memmap2::Mmap;
use parking_lot::Mutex;

use crate::error::{Error, Result};

/// Capability shared by all storage backends: fetch node bytes by index.
pub trait NodeStore: Send + Sync {
    /// Fill `buf` with the node's byte block, `buf.len()` = node size.
    fn read_node(&self, index: u32, buf: &mut [u8]) -> Result<()>;
}

fn node_out_of_range(index: u32) -> Error {
    Error::Corrupt(format!("node {} lies beyond the tree data", index))
}

/// Positioned read on a shared file handle.
///
/// The seek and the read happen under one lock so concurrent lookups can
/// never interleave on the shared cursor and read each other's bytes.
fn read_at(file: &Mutex<File>, offset: u64, buf: &mut [u8]) -> Result<()> {
    let mut file = file.lock();
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Truncated(format!("short read at offset {}", offset))
        } else {
            Error::Io(e)
        }
    })
}

/// Whole database held as one immutable in-process buffer.
///
/// Loading copies the file, so an engine snapshot keeps serving the
/// bytes it was built from even when the file is rewritten in place
/// underneath it; only a proxy swap retires the snapshot. Mapping the
/// live file instead would make the buffer a window onto mutable data.
pub struct MemoryStore {
    data: MemoryBuf,
    node_size: usize,
}

enum MemoryBuf {
    /// Owned copy of the database file.
    Owned(Vec<u8>),
    /// Map of an unlinked temp file, which nothing else can rewrite.
    Mapped(Mmap),
}

impl MemoryBuf {
    fn as_slice(&self) -> &[u8] {
        match self {
            MemoryBuf::Owned(data) => data,
            MemoryBuf::Mapped(map) => map,
        }
    }
}

impl MemoryStore {
    /// Read the whole database file into an owned buffer.
    pub fn from_file(path: &Path, node_size: usize) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self {
            data: MemoryBuf::Owned(data),
            node_size,
        })
    }

    /// Build a store from owned bytes by spilling them to a temp file
    /// and mapping that; the unlinked temp file cannot change under
    /// the map, and the mapping outlives the handle.
    pub fn from_bytes(bytes: &[u8], node_size: usize) -> Result<Self> {
        let mut temp = tempfile::tempfile()?;
        temp.write_all(bytes)?;
        let data = unsafe { Mmap::map(&temp)? };
        Ok(Self {
            data: MemoryBuf::Mapped(data),
            node_size,
        })
    }
}

impl NodeStore for MemoryStore {
    fn read_node(&self, index: u32, buf: &mut [u8]) -> Result<()> {
        let data = self.data.as_slice();
        let offset = index as usize * self.node_size;
        let end = offset + buf.len();
        if end > data.len() {
            return Err(node_out_of_range(index));
        }
        buf.copy_from_slice(&data[offset..end]);
        Ok(())
    }
}

/// Default byte budget for the index cache: the upper tree levels carry
/// almost all traversal traffic.
pub const DEFAULT_INDEX_CACHE_BYTES: usize = 2 * 1024 * 1024;

/// Upper tree levels in an immutable heap buffer, file fallback below.
pub struct IndexCacheStore {
    cache: Vec<u8>,
    cached_nodes: u32,
    node_size: usize,
    file: Mutex<File>,
    file_len: u64,
}

impl IndexCacheStore {
    /// Open the file and preload up to `max_bytes` of leading node data.
    pub fn open(path: &Path, node_size: usize, max_bytes: usize) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_len = file.seek(SeekFrom::End(0))?;

        let budget_nodes = max_bytes / node_size;
        let file_nodes = (file_len / node_size as u64) as usize;
        let cached_nodes = budget_nodes.min(file_nodes);

        let mut cache = vec![0u8; cached_nodes * node_size];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut cache)?;

        Ok(Self {
            cache,
            cached_nodes: cached_nodes as u32,
            node_size,
            file: Mutex::new(file),
            file_len,
        })
    }

    #[cfg(test)]
    pub(crate) fn cached_nodes(&self) -> u32 {
        self.cached_nodes
    }
}

impl NodeStore for IndexCacheStore {
    fn read_node(&self, index: u32, buf: &mut [u8]) -> Result<()> {
        if index < self.cached_nodes {
            let offset = index as usize * self.node_size;
            buf.copy_from_slice(&self.cache[offset..offset + buf.len()]);
            return Ok(());
        }
        let offset = index as u64 * self.node_size as u64;
        if offset + buf.len() as u64 > self.file_len {
            return Err(node_out_of_range(index));
        }
        read_at(&self.file, offset, buf)
    }
}

/// No cache: every fetch is a positioned read on the shared file.
pub struct FileStore {
    file: Mutex<File>,
    node_size: usize,
    file_len: u64,
}

impl FileStore {
    /// Open the database file for direct reads.
    pub fn open(path: &Path, node_size: usize) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_len = file.seek(SeekFrom::End(0))?;
        Ok(Self {
            file: Mutex::new(file),
            node_size,
            file_len,
        })
    }
}

impl NodeStore for FileStore {
    fn read_node(&self, index: u32, buf: &mut [u8]) -> Result<()> {
        let offset = index as u64 * self.node_size as u64;
        if offset + buf.len() as u64 > self.file_len {
            return Err(node_out_of_range(index));
        }
        read_at(&self.file, offset, buf)
    }
}
