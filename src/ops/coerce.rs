//! Coercing objects to contracts and back.
//!
//! ```ignore
//! let tester = Object::new(MyTester::default());
//! let wrapped = tester.coerce(&itester)?;
//! wrapped.call("Repsond", &mut [Arg::val("Foo")])?;
//!
//! let back: Arc<MyTester> = wrapped.revert().unwrap();
//! ```

use std::sync::Arc;

use crate::core::contract::Contract;
use crate::core::object::{Object, Reflect};
use crate::synth::{Contracted, SynthesisError, Synthesizer};

/// View `value` as `contract`, using the process-wide synthesizer.
pub fn coerce(value: &Object, contract: &Arc<Contract>) -> Result<Contracted, SynthesisError> {
    coerce_with(Synthesizer::global(), value, contract)
}

/// View `value` as `contract`.
///
/// When the value's type natively implements the contract the value itself
/// is returned and nothing is generated; the type's members are still
/// checked against the contract the first time. Otherwise it is wrapped in
/// an adapter from `synth`.
pub fn coerce_with(
    synth: &Synthesizer,
    value: &Object,
    contract: &Arc<Contract>,
) -> Result<Contracted, SynthesisError> {
    if value.type_descriptor().implements(contract.id()) {
        synth.verify_native(contract, value.type_descriptor())?;
        tracing::debug!(
            source = %value.type_descriptor().name(),
            contract = %contract.display_name(),
            "native implementation, not wrapping"
        );
        return Ok(Contracted::new(Arc::clone(contract), value.clone()));
    }

    synth.wrap(contract, value)
}

/// The real object behind `value` as `T`.
///
/// `value` itself when it is a `T`, otherwise the object held by the adapter
/// (through any number of adapter layers), otherwise `None`.
pub fn revert<T: Reflect>(value: &Object) -> Option<Arc<T>> {
    let mut current = value.clone();
    loop {
        if let Some(real) = current.downcast_arc::<T>() {
            return Some(real);
        }
        current = Synthesizer::unwrap(&current)?;
    }
}

/// Method syntax for [`coerce`] and [`revert`].
pub trait CoerceExt {
    fn coerce(&self, contract: &Arc<Contract>) -> Result<Contracted, SynthesisError>;

    fn revert<T: Reflect>(&self) -> Option<Arc<T>>;
}

impl CoerceExt for Object {
    fn coerce(&self, contract: &Arc<Contract>) -> Result<Contracted, SynthesisError> {
        coerce(self, contract)
    }

    fn revert<T: Reflect>(&self) -> Option<Arc<T>> {
        revert::<T>(self)
    }
}
