//! Uniqueness index for searchable properties.
//!
//! Each claimed value of a searchable property is a string key
//! `{type}:{property}:{value}` holding the owning record's id. The index
//! gives both uniqueness enforcement on write and equality lookup.
//!
//! # Warning
//!
//! Check and claim are separate backend calls. With conditional claims
//! the claim itself cannot be stolen, but the index is still advisory:
//! nothing stops a raw backend write from bypassing it.

mod unique;

pub use unique::UniquenessIndex;
