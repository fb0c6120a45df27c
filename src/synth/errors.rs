//! Synthesis error types and diagnostics.

use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Error while generating an adapter for a (contract, source type) pair.
///
/// Raised before any adapter exists, never on a later call.
#[derive(Debug, Clone, Error, PartialEq, Eq, miette::Diagnostic)]
pub enum SynthesisError {
    #[error("`{source_type}` has no member matching `{member}` required by `{contract}`")]
    #[diagnostic(
        code(duckwrap::synth::missing_member),
        help("add a member with the same name, parameter shapes and pass modes")
    )]
    MissingMember {
        member: String,
        contract: String,
        source_type: String,
    },

    #[error("`{member}` required by `{contract}` matches more than one member of `{source_type}`")]
    #[diagnostic(
        code(duckwrap::synth::ambiguous_member),
        help("remove or rename all but one candidate member")
    )]
    AmbiguousMember {
        member: String,
        contract: String,
        source_type: String,
        candidates: Vec<String>,
    },

    #[error("contract `{contract}` still has unbound type parameters")]
    #[diagnostic(
        code(duckwrap::synth::open_contract),
        help("instantiate the contract with concrete type arguments first")
    )]
    OpenContract { contract: String },

    #[error("{} members could not be bound", .0.len())]
    #[diagnostic(code(duckwrap::synth::multiple))]
    Multiple(Vec<SynthesisError>),
}

impl SynthesisError {
    /// Collapse a list of failures; a single failure is returned as itself.
    pub fn multiple(mut errors: Vec<SynthesisError>) -> SynthesisError {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            SynthesisError::Multiple(errors)
        }
    }

    /// Each underlying failure.
    pub fn errors(&self) -> Vec<&SynthesisError> {
        match self {
            SynthesisError::Multiple(errors) => errors.iter().flat_map(|e| e.errors()).collect(),
            single => vec![single],
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            SynthesisError::MissingMember {
                member,
                contract,
                source_type,
            } => Diagnostic::error(format!(
                "cannot adapt `{}` to `{}`: missing member `{}`",
                source_type, contract, member
            ))
            .with_context(format!("`{}` requires `{}`", contract, member))
            .with_suggestion(format!("Add `{}` to `{}`", member, source_type))
            .with_suggestion(
                "Check that by-reference parameters are declared by reference on both sides",
            ),

            SynthesisError::AmbiguousMember {
                member,
                contract,
                source_type,
                candidates,
            } => {
                let mut diag = Diagnostic::error(format!(
                    "cannot adapt `{}` to `{}`: `{}` is ambiguous",
                    source_type, contract, member
                ));
                for candidate in candidates {
                    diag = diag.with_context(format!("candidate: {}", candidate));
                }
                diag.with_suggestion(format!(
                    "Remove or rename all but one candidate on `{}`",
                    source_type
                ))
            }

            SynthesisError::OpenContract { contract } => {
                Diagnostic::error(format!("cannot adapt to open contract `{}`", contract))
                    .with_suggestion(format!("Instantiate `{}` first", contract))
            }

            SynthesisError::Multiple(errors) => errors.iter().fold(
                Diagnostic::error(format!("{} members could not be bound", errors.len())),
                |diag, e| diag.absorb(e.to_diagnostic()),
            ),
        }
    }
}
