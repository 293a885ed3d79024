//! Legacy GeoIP database format: header, storage backends, tree descent.
//!
//! # File Structure
//!
//! ```text
//! +---------------------+
//! |     TREE NODES      |  segment_count nodes, 2 * record_width bytes each
//! +---------------------+
//! |    LEAF RECORDS     |  not needed for country-only resolution
//! +---------------------+
//! |   STRUCTURE INFO    |  FF FF FF marker + edition byte, near EOF
//! +---------------------+
//! ```

pub mod format;
pub mod store;
pub mod walker;

pub use format::{DatabaseHeader, Edition, COUNTRY_BEGIN};
pub use store::{FileStore, IndexCacheStore, MemoryStore, NodeStore, DEFAULT_INDEX_CACHE_BYTES};
pub use walker::{walk, Walk};
