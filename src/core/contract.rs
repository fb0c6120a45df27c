//! Contracts: named sets of required members.
//!
//! A contract is the structural interface an adapter makes an object satisfy.
//! Contracts are immutable once built and shared behind `Arc`. Identity is a
//! build serial plus type arguments, never the name: two contracts that happen
//! to share a name are still different cache keys.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::core::shape::Shape;
use crate::core::signature::Signature;
use crate::synth::flatten::{self, Requirement};
use crate::util::Symbol;

static NEXT_CONTRACT: AtomicU64 = AtomicU64::new(1);

/// Errors from building or instantiating a contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("contract `{contract}` is not a generic definition")]
    NotGeneric { contract: String },

    #[error("contract `{contract}` takes {expected} type argument(s), got {found}")]
    ArityMismatch {
        contract: String,
        expected: usize,
        found: usize,
    },
}

/// Process-unique identity of a (possibly instantiated) contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractId {
    origin: u64,
    args: Arc<[Shape]>,
}

impl ContractId {
    fn fresh() -> Self {
        ContractId {
            origin: NEXT_CONTRACT.fetch_add(1, Ordering::Relaxed),
            args: Arc::from(Vec::new()),
        }
    }

    /// Type arguments this contract was instantiated with.
    pub fn args(&self) -> &[Shape] {
        &self.args
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.origin)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

/// Which accessors a property requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyAccess {
    Read,
    Write,
    ReadWrite,
}

/// A contract definition or instantiation.
#[derive(Debug)]
pub struct Contract {
    id: ContractId,
    name: Symbol,
    type_params: Vec<Symbol>,
    extends: Vec<Arc<Contract>>,
    members: Vec<Signature>,
    flat: OnceLock<Arc<[Requirement]>>,
}

impl Contract {
    pub fn id(&self) -> &ContractId {
        &self.id
    }

    pub fn name(&self) -> Symbol {
        self.name
    }

    /// Name with type arguments (or parameter names for a definition).
    pub fn display_name(&self) -> String {
        if self.type_params.is_empty() {
            return self.name.to_string();
        }
        let args: Vec<String> = if self.id.args.is_empty() {
            self.type_params.iter().map(|p| p.to_string()).collect()
        } else {
            self.id.args.iter().map(|a| a.to_string()).collect()
        };
        format!("{}<{}>", self.name, args.join(", "))
    }

    /// Members declared directly on this contract.
    pub fn members(&self) -> &[Signature] {
        &self.members
    }

    /// Contracts this one extends directly.
    pub fn extends(&self) -> &[Arc<Contract>] {
        &self.extends
    }

    pub fn type_arity(&self) -> usize {
        self.type_params.len()
    }

    /// An uninstantiated generic definition, or an instantiation whose
    /// arguments still mention contract-level placeholders.
    pub fn is_open(&self) -> bool {
        (!self.type_params.is_empty() && self.id.args.is_empty())
            || self.id.args.iter().any(Shape::has_type_params)
    }

    /// Every member this contract requires, including inherited ones.
    ///
    /// Computed once per contract and shared afterwards.
    pub fn flattened(&self) -> Arc<[Requirement]> {
        self.flat
            .get_or_init(|| Arc::from(flatten::flatten(self)))
            .clone()
    }

    /// Whether this contract is `other` or extends it, transitively.
    pub fn is_or_extends(&self, other: &ContractId) -> bool {
        let mut visited: HashSet<&ContractId> = HashSet::new();
        let mut pending: Vec<&Contract> = vec![self];
        while let Some(contract) = pending.pop() {
            if contract.id == *other {
                return true;
            }
            if visited.insert(&contract.id) {
                pending.extend(contract.extends.iter().map(|c| c.as_ref()));
            }
        }
        false
    }

    /// Instantiate a generic definition with concrete type arguments.
    pub fn instantiate(self: &Arc<Self>, args: &[Shape]) -> Result<Arc<Contract>, ContractError> {
        if self.type_params.is_empty() || !self.id.args.is_empty() {
            return Err(ContractError::NotGeneric {
                contract: self.display_name(),
            });
        }
        if args.len() != self.type_params.len() {
            return Err(ContractError::ArityMismatch {
                contract: self.display_name(),
                expected: self.type_params.len(),
                found: args.len(),
            });
        }

        let mut rebuilt = HashMap::new();
        Ok(Arc::new(Contract {
            id: ContractId {
                origin: self.id.origin,
                args: Arc::from(args.to_vec()),
            },
            name: self.name,
            type_params: self.type_params.clone(),
            extends: self
                .extends
                .iter()
                .map(|c| c.substitute(args, &mut rebuilt))
                .collect(),
            members: self
                .members
                .iter()
                .map(|m| m.substitute_type_params(args))
                .collect(),
            flat: OnceLock::new(),
        }))
    }

    /// Push outer type arguments through an extended contract.
    ///
    /// `rebuilt` holds the contracts already substituted during this
    /// instantiation, so an ancestor shared by several paths is rebuilt once.
    fn substitute(
        self: &Arc<Self>,
        args: &[Shape],
        rebuilt: &mut HashMap<ContractId, Arc<Contract>>,
    ) -> Arc<Contract> {
        if let Some(done) = rebuilt.get(&self.id) {
            return Arc::clone(done);
        }

        let touched = self.id.args.iter().any(Shape::has_type_params)
            || self.members.iter().any(Signature::has_type_params)
            || self.extends.iter().any(|c| c.is_open());
        if !touched {
            return Arc::clone(self);
        }

        let id_args = if self.id.args.is_empty() && !self.type_params.is_empty() {
            // Extending a bare definition binds its parameters positionally.
            args.iter().take(self.type_params.len()).cloned().collect::<Vec<_>>()
        } else {
            self.id
                .args
                .iter()
                .map(|a| a.substitute_type_params(args))
                .collect()
        };

        let extends = self
            .extends
            .iter()
            .map(|c| c.substitute(args, rebuilt))
            .collect();
        let contract = Arc::new(Contract {
            id: ContractId {
                origin: self.id.origin,
                args: Arc::from(id_args),
            },
            name: self.name,
            type_params: self.type_params.clone(),
            extends,
            members: self
                .members
                .iter()
                .map(|m| m.substitute_type_params(args))
                .collect(),
            flat: OnceLock::new(),
        });
        rebuilt.insert(self.id.clone(), Arc::clone(&contract));
        contract
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Builder for [`Contract`].
///
/// Properties and events are decomposed into accessor members here, so the
/// rest of the engine only ever sees plain signatures.
#[derive(Debug)]
pub struct ContractBuilder {
    name: Symbol,
    type_params: Vec<Symbol>,
    extends: Vec<Arc<Contract>>,
    members: Vec<Signature>,
}

impl ContractBuilder {
    pub fn new(name: impl Into<Symbol>) -> Self {
        ContractBuilder {
            name: name.into(),
            type_params: Vec::new(),
            extends: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Make this a generic definition. Refer to the parameters in member
    /// shapes with [`Shape::type_param`].
    pub fn generic(mut self, names: &[&str]) -> Self {
        self.type_params = names.iter().map(|n| Symbol::intern(n)).collect();
        self
    }

    pub fn extends(mut self, contract: &Arc<Contract>) -> Self {
        self.extends.push(Arc::clone(contract));
        self
    }

    pub fn method(mut self, signature: Signature) -> Self {
        self.members.push(signature);
        self
    }

    pub fn property(mut self, name: &str, shape: Shape, access: PropertyAccess) -> Self {
        if matches!(access, PropertyAccess::Read | PropertyAccess::ReadWrite) {
            self.members.push(Signature::getter(name, shape.clone()));
        }
        if matches!(access, PropertyAccess::Write | PropertyAccess::ReadWrite) {
            self.members.push(Signature::setter(name, shape));
        }
        self
    }

    pub fn event(mut self, name: &str, handler: Shape) -> Self {
        self.members.push(Signature::adder(name, handler.clone()));
        self.members.push(Signature::remover(name, handler));
        self
    }

    pub fn build(self) -> Arc<Contract> {
        Arc::new(Contract {
            id: ContractId::fresh(),
            name: self.name,
            type_params: self.type_params,
            extends: self.extends,
            members: self.members,
            flat: OnceLock::new(),
        })
    }
}
