//! Values typed as a contract.

use std::sync::Arc;

use anyhow::Result;

use crate::core::contract::Contract;
use crate::core::invocation::{Arg, CallError, Invocation};
use crate::core::object::{select_overload, Object, Reflect};
use crate::core::shape::Shape;
use crate::core::signature::Signature;
use crate::core::value::{Callback, Value};
use crate::synth::generator::AdapterState;

/// An object seen through a contract: either an adapter instance or, on the
/// native fast path, the real object itself.
///
/// Only members of the contract's flattened member set can be called.
#[derive(Debug, Clone)]
pub struct Contracted {
    contract: Arc<Contract>,
    object: Object,
}

impl Contracted {
    pub(crate) fn new(contract: Arc<Contract>, object: Object) -> Self {
        Contracted { contract, object }
    }

    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    pub fn object(&self) -> &Object {
        &self.object
    }

    pub fn into_object(self) -> Object {
        self.object
    }

    /// Whether calls go through a generated adapter.
    pub fn is_adapter(&self) -> bool {
        self.object.downcast_ref::<AdapterState>().is_some()
    }

    /// Call a non-generic member by name.
    pub fn call(&self, name: &str, args: &mut [Arg<'_>]) -> Result<Value> {
        self.call_generic(name, &[], args)
    }

    /// Call a member by name, supplying its type arguments.
    pub fn call_generic(&self, name: &str, type_args: &[Shape], args: &mut [Arg<'_>]) -> Result<Value> {
        let requirements = self.contract.flattened();
        let signature = select_overload(
            &self.contract,
            requirements.iter().map(|r| &r.signature),
            name,
            type_args.len(),
            args,
        )?
        .clone();

        self.invoke(&signature, type_args, args)
    }

    /// Call the contract member with exactly this signature.
    pub fn invoke(&self, signature: &Signature, type_args: &[Shape], args: &mut [Arg<'_>]) -> Result<Value> {
        let key = signature.key();

        if !self
            .contract
            .flattened()
            .iter()
            .any(|r| r.signature.key() == key)
        {
            return Err(CallError::NoSuchMember {
                contract: self.contract.display_name(),
                member: signature.to_string(),
            }
            .into());
        }

        if args.len() != signature.params().len() {
            return Err(CallError::ArityMismatch {
                member: signature.to_string(),
                expected: signature.params().len(),
                found: args.len(),
            }
            .into());
        }
        for (index, (param, arg)) in signature.params().iter().zip(args.iter()).enumerate() {
            arg.check_mode(signature, index, param.mode)?;
        }
        if type_args.len() != signature.generic_arity() {
            return Err(CallError::GenericArityMismatch {
                member: signature.to_string(),
                expected: signature.generic_arity(),
                found: type_args.len(),
            }
            .into());
        }

        tracing::trace!(
            contract = %self.contract,
            member = %signature.close_generic(type_args),
            "invoking contract member"
        );
        self.object
            .dispatch(signature, &mut Invocation::new(type_args, args))
    }

    /// Read a property through its `get_` accessor.
    pub fn get(&self, property: &str) -> Result<Value> {
        self.call(&format!("get_{}", property), &mut [])
    }

    /// Write a property through its `set_` accessor.
    pub fn set(&self, property: &str, value: impl Into<Value>) -> Result<()> {
        self.call(&format!("set_{}", property), &mut [Arg::val(value)])?;
        Ok(())
    }

    /// Register `handler` through the event's `add_` accessor.
    pub fn subscribe(&self, event: &str, handler: &Callback) -> Result<()> {
        self.call(&format!("add_{}", event), &mut [Arg::val(handler.clone())])?;
        Ok(())
    }

    /// Remove `handler` through the event's `remove_` accessor.
    pub fn unsubscribe(&self, event: &str, handler: &Callback) -> Result<()> {
        self.call(&format!("remove_{}", event), &mut [Arg::val(handler.clone())])?;
        Ok(())
    }

    /// The real object as `T`, see [`crate::ops::revert`].
    pub fn revert<T: Reflect>(&self) -> Option<Arc<T>> {
        crate::ops::revert::<T>(&self.object)
    }
}
