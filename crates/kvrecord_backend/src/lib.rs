//! # kvrecord Backend
//!
//! Key-value backend trait and implementations for kvrecord.
//!
//! This crate provides the lowest-level store abstraction for kvrecord.
//! Backends speak a small, Redis-shaped command surface over string keys
//! and string values. They know nothing about models, properties or
//! identifiers - kvrecord owns all key naming and interpretation.
//!
//! ## Design Principles
//!
//! - Backends expose plain commands (strings, hashes, sorted sets, lists, sets)
//! - Every call is synchronous and blocking
//! - Must be `Send + Sync` so a single connection can be shared
//! - `incr` is the one command that must be atomic
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`RespBackend`] - Blocking RESP2 client for Redis-compatible servers
//!
//! ## Example
//!
//! ```rust
//! use kvrecord_backend::{KvBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.set("user:id:1", "1").unwrap();
//! assert_eq!(backend.get("user:id:1").unwrap().as_deref(), Some("1"));
//! assert_eq!(backend.incr("user:counter").unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod resp;

pub use backend::KvBackend;
pub use error::{BackendError, BackendResult};
pub use memory::InMemoryBackend;
pub use resp::{Reply, RespBackend, RespConfig};
