//! # kvrecord Testkit
//!
//! Test utilities for kvrecord.
//!
//! This crate provides:
//! - Registry fixtures over in-memory backends
//! - Property-based test generators using proptest
//! - Stress helpers for concurrent allocation and claims
//! - Tracing setup for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kvrecord_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_registry() {
//!     with_registry(|fx| {
//!         let users = fx.user_model();
//!         let mut user = users.new_record();
//!         user.set("name", "steve").unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
