//! Binary-tree descent over the node encoding.

use crate::error::{Error, Result};

use super::format::{read_uint_le, DatabaseHeader, MAX_RECORD_LENGTH};
use super::store::NodeStore;

/// Outcome of one tree descent.
///
/// `prefix_len` is returned per call rather than kept on shared engine
/// state, so concurrent lookups cannot observe each other's walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walk {
    /// Leaf value that terminated the descent.
    pub record_index: u32,
    /// Address bits consumed before the leaf: the matched netmask width.
    pub prefix_len: u32,
}

/// Descend the tree along the address bits, MSB first.
///
/// `bits` holds the address octets in network order; `bit_width` is 32
/// for IPv4 and 128 for IPv6. A descent that consumes every bit without
/// reaching a leaf means the node encoding is inconsistent, which is an
/// error rather than a partial answer.
pub fn walk(
    store: &dyn NodeStore,
    header: &DatabaseHeader,
    bits: &[u8],
    bit_width: u32,
) -> Result<Walk> {
    debug_assert!(bits.len() * 8 >= bit_width as usize);

    let width = header.record_width;
    let mut buf = [0u8; 2 * MAX_RECORD_LENGTH];
    let node_buf = &mut buf[..2 * width];

    let mut node: u32 = 0;
    for depth in (0..bit_width).rev() {
        store.read_node(node, node_buf)?;

        let pos = bit_width - 1 - depth;
        let set = bits[(pos >> 3) as usize] & (0x80 >> (pos & 7)) != 0;
        let child = if set {
            read_uint_le(&node_buf[width..])
        } else {
            read_uint_le(&node_buf[..width])
        };

        if child >= header.segment_count {
            return Ok(Walk {
                record_index: child,
                prefix_len: bit_width - depth,
            });
        }
        node = child;
    }

    Err(Error::Corrupt(format!(
        "descent exhausted all {} levels without reaching a leaf",
        bit_width
    )))
}
