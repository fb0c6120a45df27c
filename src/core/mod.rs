//! Core data structures.
//!
//! - Shapes and member signatures
//! - Contracts (what an adapter must provide)
//! - Runtime values and invocations
//! - The reflective object model every adaptable type describes itself with

pub mod contract;
pub mod invocation;
pub mod object;
pub mod shape;
pub mod signature;
pub mod value;

pub use contract::{Contract, ContractBuilder, ContractError, ContractId, PropertyAccess};
pub use invocation::{Arg, CallError, Invocation};
pub use object::{descriptor_of, Member, Object, Reflect, TypeBuilder, TypeDescriptor, TypeKey};
pub use shape::{Shape, Shaped};
pub use signature::{MemberKind, Param, PassMode, Signature, SignatureKey};
pub use value::{Callback, Value};
