//! Synthetic country-database builder shared by the integration tests.
//!
//! Produces byte-exact legacy images: tree nodes with 3-byte little-endian
//! child pointers, followed by the `FF FF FF` structure marker and the
//! edition byte.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use geodat::db::format::{COUNTRY_EDITION, COUNTRY_EDITION_V6};
use geodat::db::COUNTRY_BEGIN;

const RECORD_WIDTH: usize = 3;

pub struct DatBuilder {
    nodes: Vec<[u32; 2]>,
    edition: u8,
}

impl DatBuilder {
    pub fn v4() -> Self {
        Self::new(COUNTRY_EDITION)
    }

    pub fn v6() -> Self {
        Self::new(COUNTRY_EDITION_V6)
    }

    fn new(edition: u8) -> Self {
        Self {
            // Root resolves everything to the unknown sentinel until
            // prefixes are inserted.
            nodes: vec![[COUNTRY_BEGIN, COUNTRY_BEGIN]],
            edition,
        }
    }

    /// Map `prefix_len` leading bits of `addr` to a country table index.
    pub fn insert(&mut self, addr: &[u8], prefix_len: u32, country: u32) -> &mut Self {
        assert!(prefix_len >= 1);
        assert!(country < 256);

        let mut node = 0usize;
        for pos in 0..prefix_len {
            let bit = (addr[(pos >> 3) as usize] >> (7 - (pos & 7))) & 1;
            let side = bit as usize;
            if pos == prefix_len - 1 {
                self.nodes[node][side] = COUNTRY_BEGIN + country;
            } else {
                let child = self.nodes[node][side];
                if child >= COUNTRY_BEGIN {
                    // Push the covering leaf down one level.
                    let next = self.nodes.len();
                    self.nodes.push([child, child]);
                    self.nodes[node][side] = next as u32;
                    node = next;
                } else {
                    node = child as usize;
                }
            }
        }
        self
    }

    /// Convenience for dotted-quad prefixes.
    pub fn insert_v4(&mut self, prefix: &str, prefix_len: u32, country: u32) -> &mut Self {
        let addr = geodat::encode_v4(prefix).unwrap().to_be_bytes();
        self.insert(&addr, prefix_len, country)
    }

    /// Convenience for IPv6 prefixes.
    pub fn insert_v6(&mut self, prefix: &str, prefix_len: u32, country: u32) -> &mut Self {
        let addr = geodat::encode_v6(prefix).unwrap();
        self.insert(&addr, prefix_len, country)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.nodes.len() * 2 * RECORD_WIDTH + 4);
        for node in &self.nodes {
            for child in node {
                out.extend_from_slice(&child.to_le_bytes()[..RECORD_WIDTH]);
            }
        }
        out.extend_from_slice(&[0xFF, 0xFF, 0xFF, self.edition]);
        out
    }

    pub fn write(&self, path: &Path) {
        fs::write(path, self.build()).unwrap();
    }
}

/// Country table indices used across the test corpus.
pub const IDX_GB: u32 = 77;
pub const IDX_US: u32 = 225;
pub const IDX_DE: u32 = 56;
pub const IDX_FR: u32 = 74;
pub const IDX_JP: u32 = 111;
