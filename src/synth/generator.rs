//! Adapter type generation.
//!
//! An adapter type is a [`TypeDescriptor`] whose members forward to the
//! members of one source type. Its instances hold exactly one field, the real
//! object. A forwarding member hands the caller's [`Invocation`] to the bound
//! real member untouched: by-reference arguments keep pointing at the
//! caller's storage, type arguments of generic members pass straight through,
//! and whatever the real member returns (value or error) is returned as is.
//!
//! [`Invocation`]: crate::core::invocation::Invocation

use std::fmt::Write as _;
use std::sync::Arc;

use crate::core::contract::Contract;
use crate::core::invocation::CallError;
use crate::core::object::{invoker, Invoker, Member, Object, TypeDescriptor};
use crate::core::signature::Signature;
use crate::synth::errors::SynthesisError;
use crate::synth::flatten::Requirement;
use crate::synth::matcher::{MatchMode, Matcher};
use crate::util::config::SynthesisConfig;
use crate::util::hash::Fingerprint;
use crate::util::Symbol;

/// The single field of every adapter instance.
#[derive(Debug)]
pub(crate) struct AdapterState {
    real: Object,
}

impl AdapterState {
    pub(crate) fn real(&self) -> &Object {
        &self.real
    }
}

/// How one required member was bound.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Member as the contract declares it
    pub required: Signature,
    /// Member of the source type it forwards to
    pub bound: Signature,
    /// Type that declared the bound member
    pub declared_on: Symbol,
    /// Contract that declared the requirement
    pub owner: String,
}

/// A generated adapter type for one (contract, source type) pair.
#[derive(Debug)]
pub struct AdapterType {
    name: Symbol,
    contract: Arc<Contract>,
    source: Arc<TypeDescriptor>,
    descriptor: Arc<TypeDescriptor>,
    bindings: Vec<Binding>,
    fingerprint: String,
}

impl AdapterType {
    pub fn name(&self) -> Symbol {
        self.name
    }

    pub fn contract(&self) -> &Arc<Contract> {
        &self.contract
    }

    /// Descriptor of the source type the adapter forwards to.
    pub fn source(&self) -> &Arc<TypeDescriptor> {
        &self.source
    }

    /// Descriptor of the adapter type itself.
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// SHA-256 over the adapter's layout. Equal for equal layouts.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Human-readable layout of the generated type.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "adapter {} : {}", self.name, self.contract.display_name());
        let _ = writeln!(out, "  real: {}", self.source.name());
        for binding in &self.bindings {
            let _ = writeln!(
                out,
                "  {} => {}::{}",
                binding.required, binding.declared_on, binding.bound
            );
        }
        out
    }

    /// Bind a new adapter instance to `real`.
    pub(crate) fn instantiate(&self, real: Object) -> Object {
        debug_assert_eq!(real.type_key(), self.source.key());
        Object::from_parts(Arc::new(AdapterState { real }), Arc::clone(&self.descriptor))
    }
}

/// Emits adapter types.
#[derive(Debug, Clone, Copy)]
pub struct AdapterGenerator<'c> {
    config: &'c SynthesisConfig,
}

impl<'c> AdapterGenerator<'c> {
    pub fn new(config: &'c SynthesisConfig) -> Self {
        AdapterGenerator { config }
    }

    /// Bind every requirement to exactly one member of `source`.
    ///
    /// With `report_all_missing` every failure is collected, otherwise the
    /// first one is returned.
    pub fn resolve_all<'r, 't>(
        &self,
        contract: &Contract,
        source: &'t TypeDescriptor,
        requirements: &'r [Requirement],
    ) -> Result<Vec<(&'r Requirement, &'t Member)>, SynthesisError> {
        let matcher = Matcher::new(source).strict_returns(self.config.strict_returns);

        let mut resolved = Vec::with_capacity(requirements.len());
        let mut failures = Vec::new();
        for requirement in requirements {
            match matcher.resolve(requirement) {
                Ok(member) => resolved.push((requirement, member)),
                Err(err) if self.config.report_all_missing => failures.push(err),
                Err(err) => return Err(err),
            }
        }
        if !failures.is_empty() {
            tracing::debug!(
                contract = %contract.display_name(),
                source = %source.name(),
                failures = failures.len(),
                "members could not be bound"
            );
            return Err(SynthesisError::multiple(failures));
        }

        Ok(resolved)
    }

    /// Generate the adapter making `source` satisfy `contract`.
    ///
    /// Every requirement is bound before anything is built, so a failure
    /// leaves nothing behind.
    pub fn generate(
        &self,
        contract: &Arc<Contract>,
        source: &Arc<TypeDescriptor>,
    ) -> Result<AdapterType, SynthesisError> {
        if contract.is_open() {
            return Err(SynthesisError::OpenContract {
                contract: contract.display_name(),
            });
        }

        let requirements = contract.flattened();
        let resolved = self.resolve_all(contract, source, &requirements)?;

        let name = Symbol::intern(format!(
            "{}_{}_{}",
            contract.display_name(),
            source.name(),
            self.config.adapter_suffix
        ));

        let mut fingerprint = Fingerprint::new();
        fingerprint
            .update_str(&contract.display_name())
            .update_str(&source.name());

        let mut members = Vec::with_capacity(resolved.len());
        let mut bindings = Vec::with_capacity(resolved.len());
        for (requirement, member) in resolved {
            let required = &requirement.signature;
            members.push(Member::new(required.clone(), forwarder(member), name));

            let mode = MatchMode::of(required);
            fingerprint
                .update_str(&required.to_string())
                .update_str(&member.signature().to_string())
                .update_bool(mode == MatchMode::Erased);

            bindings.push(Binding {
                required: required.clone(),
                bound: member.signature().clone(),
                declared_on: member.declared_on(),
                owner: requirement.owner.clone(),
            });
        }

        let descriptor = Arc::new(TypeDescriptor::synthesized(
            name,
            members,
            Arc::clone(contract),
        ));

        let adapter = AdapterType {
            name,
            contract: Arc::clone(contract),
            source: Arc::clone(source),
            descriptor,
            bindings,
            fingerprint: fingerprint.finish(),
        };

        tracing::info!(
            adapter = %adapter.name,
            members = adapter.bindings.len(),
            fingerprint = %adapter.fingerprint,
            "generated adapter type"
        );

        Ok(adapter)
    }
}

/// Forward to `target` on the real object held by the adapter instance.
fn forwarder(target: &Member) -> Invoker {
    let target = Arc::clone(target.invoker());
    invoker(move |this, inv| {
        let state = this
            .downcast_ref::<AdapterState>()
            .ok_or_else(|| CallError::ReceiverMismatch {
                expected: "adapter instance".to_string(),
            })?;
        target(state.real().as_any(), inv)
    })
}
