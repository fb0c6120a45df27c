//! duckwrap - runtime structural adapters
//!
//! Makes an object usable through a contract (a set of required members) it
//! never declared, by generating an adapter type that forwards every
//! contract member to the same-named, same-shaped member of the real object.
//! Adapter types are generated once per (contract, source type) pair and
//! cached for the life of the process.

pub mod core;
pub mod ops;
pub mod synth;
pub mod util;

/// Test fixtures shared by unit tests.
#[cfg(test)]
pub mod test_support;

pub use core::{
    contract::{Contract, ContractBuilder, PropertyAccess},
    invocation::{Arg, CallError},
    object::{Object, Reflect, TypeBuilder},
    shape::Shape,
    signature::Signature,
    value::{Callback, Value},
};

pub use ops::{coerce, revert, CoerceExt};
pub use synth::{Contracted, SynthesisError, Synthesizer};
pub use util::Config;
