//! geodat - country-level IP geolocation over the legacy GeoIP binary
//! database format.
//!
//! This crate walks the binary search tree stored in legacy country
//! database files and resolves IPv4/IPv6 addresses to 2-letter country
//! codes, keeping the database hot in long-running services by reloading
//! it transparently when the backing file changes.
//!
//! # Features
//!
//! - **Three storage backends**: full in-memory copy, partial index cache,
//!   or direct positioned file reads — byte-identical results from all
//!   three, selected at construction
//! - **Dual stack**: IPv4 and IPv6 country editions, with a proxy that
//!   routes queries by address family
//! - **Hot reload**: a background thread watches file modification times
//!   and swaps in a fresh engine atomically; lookups in flight finish
//!   against the snapshot they started with
//! - **Total hot-path API**: malformed input resolves to `"--"` instead
//!   of raising, with a strict variant for callers that need to tell
//!   "unknown country" from "bad input"
//!
//! # Quick Start
//!
//! ```ignore
//! use geodat::{GeoProxy, UNKNOWN_COUNTRY_CODE};
//!
//! let proxy = GeoProxy::open_dual("GeoIP.dat", "GeoIPv6.dat")?;
//!
//! assert_eq!(proxy.country_code("4.2.2.2"), "US");
//! assert_eq!(proxy.country_code("2a01:7e00::f03c:91ff:fedf:3a21"), "GB");
//! assert_eq!(proxy.country_code("127.0.0.1"), UNKNOWN_COUNTRY_CODE);
//! ```
//!
//! For one-shot use without reloading, open a [`LookupEngine`] directly:
//!
//! ```ignore
//! use geodat::{Backend, LookupEngine};
//!
//! let engine = LookupEngine::open("GeoIP.dat".as_ref(), Backend::Memory)?;
//! let hit = engine.lookup("4.2.2.2")?;
//! println!("{} (/{})", hit.code, hit.prefix_len);
//! ```

mod addr;
mod country;
mod engine;
mod error;
mod global;
mod proxy;

pub mod db;

// Re-export core types
pub use error::{Error, Result};

pub use addr::{encode, encode_v4, encode_v6, is_v6_literal, IpBits};
pub use country::UNKNOWN_COUNTRY_CODE;
pub use engine::{Backend, Lookup, LookupEngine};
pub use proxy::{GeoProxy, ProxyConfig, DEFAULT_RELOAD_INTERVAL};

// Re-export the process-wide convenience API
pub use global::{init, init_dual, init_with_config, is_initialized, lookup_country};
