//! High-level operations.
//!
//! Convenience layer over the synthesizer: decides whether an object needs
//! wrapping at all, and finds the real object behind an adapter.

pub mod coerce;

pub use coerce::{coerce, coerce_with, revert, CoerceExt};
