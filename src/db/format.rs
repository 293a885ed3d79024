//! Constants and header parsing for the legacy GeoIP binary format.
//!
//! A database file is a sequence of tree nodes (two little-endian unsigned
//! child pointers of `record_width` bytes each), followed by the leaf record
//! space and a trailing structure-info section. The structure info is found
//! by scanning backwards from the end of the file for a `FF FF FF` marker;
//! the byte after the marker names the database edition.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result};

/// Leaf base and segment count for country editions.
pub const COUNTRY_BEGIN: u32 = 16_776_960;

/// Child pointer width for country editions, in bytes.
pub const STANDARD_RECORD_LENGTH: usize = 3;

/// Largest child pointer width of any legacy edition.
pub const MAX_RECORD_LENGTH: usize = 4;

/// How many positions the backward marker scan may try.
pub const STRUCTURE_INFO_MAX_SIZE: usize = 20;

/// Edition byte for the IPv4 country database.
pub const COUNTRY_EDITION: u8 = 1;

/// Edition byte for the IPv6 country database.
pub const COUNTRY_EDITION_V6: u8 = 12;

const STRUCTURE_MARKER: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// Bytes of file tail that can contain the structure info we care about.
const TAIL_SIZE: usize = STRUCTURE_INFO_MAX_SIZE + STRUCTURE_MARKER.len() + 1;

/// Database edition, as named by the structure-info type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edition {
    /// IPv4 country database.
    Country,
    /// IPv6 country database.
    CountryV6,
}

impl Edition {
    /// Whether this edition keys on IPv6 addresses.
    pub fn is_v6(&self) -> bool {
        matches!(self, Edition::CountryV6)
    }

    /// Human-readable family name, used in error messages.
    pub fn family(&self) -> &'static str {
        match self {
            Edition::Country => "IPv4",
            Edition::CountryV6 => "IPv6",
        }
    }
}

/// Parsed once at load; immutable for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseHeader {
    /// Which edition the structure info named.
    pub edition: Edition,
    /// Bytes per child pointer.
    pub record_width: usize,
    /// Node indices below this are internal; values at or above are leaves.
    pub segment_count: u32,
}

impl DatabaseHeader {
    /// Bytes per tree node: two child pointers, left then right.
    pub fn node_size(&self) -> usize {
        2 * self.record_width
    }

    /// Parse the header from a fully loaded database buffer.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let start = data.len().saturating_sub(TAIL_SIZE);
        Self::parse_tail(&data[start..])
    }

    /// Parse the header by reading the tail of an open database file.
    pub fn read_from(file: &mut File) -> Result<Self> {
        let len = file.seek(SeekFrom::End(0))?;
        let tail_len = (len as usize).min(TAIL_SIZE);
        file.seek(SeekFrom::Start(len - tail_len as u64))?;
        let mut tail = [0u8; TAIL_SIZE];
        file.read_exact(&mut tail[..tail_len])?;
        Self::parse_tail(&tail[..tail_len])
    }

    /// Scan the file tail backwards for the structure marker.
    ///
    /// A file without a marker is, per the legacy format, an IPv4 country
    /// database; the country editions use fixed record geometry rather
    /// than storing it in the file.
    fn parse_tail(tail: &[u8]) -> Result<Self> {
        if tail.len() >= STRUCTURE_MARKER.len() {
            let mut pos = tail.len() - STRUCTURE_MARKER.len();
            for _ in 0..STRUCTURE_INFO_MAX_SIZE {
                if tail[pos..pos + 3] == STRUCTURE_MARKER {
                    let edition_at = pos + 3;
                    if edition_at >= tail.len() {
                        return Err(Error::Truncated(
                            "structure marker with no edition byte".to_string(),
                        ));
                    }
                    return Self::for_edition(tail[edition_at]);
                }
                if pos == 0 {
                    break;
                }
                pos -= 1;
            }
        }
        Self::for_edition(COUNTRY_EDITION)
    }

    fn for_edition(raw: u8) -> Result<Self> {
        // Editions were renumbered at +105 in one era of the format.
        let edition = if raw >= 106 { raw - 105 } else { raw };
        let edition = match edition {
            COUNTRY_EDITION => Edition::Country,
            COUNTRY_EDITION_V6 => Edition::CountryV6,
            other => return Err(Error::UnsupportedEdition(other)),
        };
        Ok(DatabaseHeader {
            edition,
            record_width: STANDARD_RECORD_LENGTH,
            segment_count: COUNTRY_BEGIN,
        })
    }
}

/// Decode an N-byte little-endian unsigned integer.
///
/// The single widening point for all node and header arithmetic; every
/// byte is an unsigned 0..=255 regardless of how the producing tool
/// declared its byte type.
#[inline]
pub fn read_uint_le(bytes: &[u8]) -> u32 {
    debug_assert!(bytes.len() <= MAX_RECORD_LENGTH);
    let mut value = 0u32;
    for (i, b) in bytes.iter().enumerate() {
        value |= u32::from(*b) << (8 * i);
    }
    value
}
