//! Member matching.
//!
//! Binds one required member to exactly one member of a source type.
//! Non-generic requirements compare literal shapes; generic requirements
//! compare their generic definition, where the member's own type parameters
//! are erased to positional placeholders. A generic member never satisfies a
//! non-generic requirement, or the other way round.

use crate::core::object::{Member, TypeDescriptor};
use crate::core::signature::Signature;
use crate::synth::errors::SynthesisError;
use crate::synth::flatten::Requirement;

/// How a requirement is compared against candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Name, by-ref flags and literal parameter shapes.
    Literal,
    /// Name, generic arity, by-ref flags and parameter shapes with the
    /// member's own type parameters compared by position.
    Erased,
}

impl MatchMode {
    pub fn of(signature: &Signature) -> MatchMode {
        if signature.is_generic() {
            MatchMode::Erased
        } else {
            MatchMode::Literal
        }
    }
}

/// Matches requirements against one source type.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'t> {
    source: &'t TypeDescriptor,
    strict_returns: bool,
}

impl<'t> Matcher<'t> {
    pub fn new(source: &'t TypeDescriptor) -> Self {
        Matcher {
            source,
            strict_returns: false,
        }
    }

    /// Also require equal return shapes.
    pub fn strict_returns(mut self, strict: bool) -> Self {
        self.strict_returns = strict;
        self
    }

    fn accepts(&self, mode: MatchMode, required: &Signature, candidate: &Signature) -> bool {
        if candidate.name() != required.name()
            || candidate.params().len() != required.params().len()
        {
            return false;
        }

        let arity_ok = match mode {
            MatchMode::Literal => !candidate.is_generic(),
            MatchMode::Erased => candidate.generic_arity() == required.generic_arity(),
        };
        if !arity_ok {
            return false;
        }

        // Placeholders are already positional, so equal shapes under
        // `Erased` mean equal generic definitions.
        let params_ok = required
            .params()
            .iter()
            .zip(candidate.params())
            .all(|(r, c)| r.mode.is_by_ref() == c.mode.is_by_ref() && r.shape == c.shape);

        params_ok && (!self.strict_returns || required.ret() == candidate.ret())
    }

    /// The single member satisfying `requirement`.
    pub fn resolve(&self, requirement: &Requirement) -> Result<&'t Member, SynthesisError> {
        let required = &requirement.signature;
        let mode = MatchMode::of(required);

        let candidates: Vec<&'t Member> = self
            .source
            .members()
            .iter()
            .filter(|m| self.accepts(mode, required, m.signature()))
            .collect();

        match candidates.as_slice() {
            [member] => {
                tracing::trace!(
                    required = %required,
                    bound = %member.signature(),
                    declared_on = %member.declared_on(),
                    ?mode,
                    "matched member"
                );
                Ok(*member)
            }
            [] => Err(SynthesisError::MissingMember {
                member: required.to_string(),
                contract: requirement.owner.clone(),
                source_type: self.source.name().to_string(),
            }),
            many => Err(SynthesisError::AmbiguousMember {
                member: required.to_string(),
                contract: requirement.owner.clone(),
                source_type: self.source.name().to_string(),
                candidates: many.iter().map(|m| m.signature().to_string()).collect(),
            }),
        }
    }
}
