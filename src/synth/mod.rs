//! Adapter synthesis.
//!
//! Flow for one request: [`Synthesizer::wrap`] looks up the
//! (contract, source type) key in the [`AdapterCache`]; on a miss the
//! contract is flattened, every requirement is bound by the [`Matcher`], and
//! the [`AdapterGenerator`] emits the forwarding type, which is published to
//! the cache and instantiated around the real object.

pub mod cache;
pub mod contracted;
pub mod errors;
pub mod flatten;
pub mod generator;
pub mod matcher;
pub mod synthesizer;

pub use cache::{AdapterCache, AdapterKey};
pub use contracted::Contracted;
pub use errors::SynthesisError;
pub use flatten::{flatten, Requirement};
pub use generator::{AdapterGenerator, AdapterType, Binding};
pub use matcher::{MatchMode, Matcher};
pub use synthesizer::Synthesizer;
