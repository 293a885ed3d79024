//! Textual IP address classification and bit encoding.
//!
//! The tree walk consumes address bits most-significant first, so both
//! families are reduced to a fixed-width big-endian value here. IPv4 uses a
//! hand-rolled decimal parser to keep the hot path allocation-free; IPv6
//! defers to the standard textual grammar.

use std::net::Ipv6Addr;

use crate::error::{Error, Result};

/// An address reduced to the bit sequence the tree walk descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpBits {
    /// IPv4 address packed MSB-first.
    V4(u32),
    /// IPv6 address octets in network order.
    V6([u8; 16]),
}

impl IpBits {
    /// Number of tree levels this address can descend.
    pub fn bit_width(&self) -> u32 {
        match self {
            IpBits::V4(_) => 32,
            IpBits::V6(_) => 128,
        }
    }

    /// Address octets in network order.
    pub fn octets(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        match self {
            IpBits::V4(v) => out[..4].copy_from_slice(&v.to_be_bytes()),
            IpBits::V6(o) => out.copy_from_slice(o),
        }
        out
    }
}

/// Returns true if the text looks like an IPv6 literal.
///
/// Family detection is purely textual: a `:` anywhere or a leading `[`
/// marks IPv6, everything else is treated as dotted-quad IPv4.
pub fn is_v6_literal(text: &str) -> bool {
    text.contains(':') || text.starts_with('[')
}

/// Classify and encode a textual address.
///
/// Malformed input is an explicit error; it never silently encodes as
/// `0.0.0.0`, so callers can tell "unroutable address" from "bad input".
pub fn encode(text: &str) -> Result<IpBits> {
    if is_v6_literal(text) {
        encode_v6(text).map(IpBits::V6)
    } else {
        encode_v4(text).map(IpBits::V4)
    }
}

/// Parse a dotted-quad IPv4 address into an MSB-first `u32`.
///
/// Accepts exactly four non-empty decimal groups in `0..=255`. Leading
/// zeros are allowed, matching the database's historical inputs.
pub fn encode_v4(text: &str) -> Result<u32> {
    let invalid = || Error::InvalidAddress(text.to_string());

    let mut num: u32 = 0;
    let mut groups = 0u32;
    for group in text.split('.') {
        if groups == 4 || group.is_empty() {
            return Err(invalid());
        }
        let mut octet: u32 = 0;
        for b in group.bytes() {
            if !b.is_ascii_digit() {
                return Err(invalid());
            }
            octet = octet * 10 + u32::from(b - b'0');
            if octet > 255 {
                return Err(invalid());
            }
        }
        num = (num << 8) | octet;
        groups += 1;
    }
    if groups != 4 {
        return Err(invalid());
    }
    Ok(num)
}

/// Parse an IPv6 literal, with or without URL-style brackets.
pub fn encode_v6(text: &str) -> Result<[u8; 16]> {
    let inner = if let Some(stripped) = text.strip_prefix('[') {
        stripped
            .strip_suffix(']')
            .ok_or_else(|| Error::InvalidAddress(text.to_string()))?
    } else {
        text
    };

    inner
        .parse::<Ipv6Addr>()
        .map(|a| a.octets())
        .map_err(|_| Error::InvalidAddress(text.to_string()))
}
