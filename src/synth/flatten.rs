//! Contract flattening.
//!
//! Collects every member a contract requires, its own and everything it
//! extends, transitively. Extension chains can be arbitrarily deep, so the
//! traversal is an explicit work-list rather than recursion.

use std::collections::{HashSet, VecDeque};

use crate::core::contract::{Contract, ContractId};
use crate::core::signature::{Signature, SignatureKey};

/// One member a contract requires, with the contract that declared it.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub owner: String,
    pub signature: Signature,
}

/// Flatten `contract` into its complete, de-duplicated member set.
///
/// Order is deterministic: the contract's own members first, then extended
/// contracts breadth-first in declaration order. A member reachable through
/// several paths (a diamond) is kept at its first occurrence; a contract
/// reachable through several paths is visited once.
pub fn flatten(contract: &Contract) -> Vec<Requirement> {
    let mut out = Vec::new();
    let mut seen: HashSet<SignatureKey> = HashSet::new();
    let mut visited: HashSet<ContractId> = HashSet::new();
    let mut pending: VecDeque<&Contract> = VecDeque::new();
    pending.push_back(contract);

    while let Some(current) = pending.pop_front() {
        if !visited.insert(current.id().clone()) {
            continue;
        }

        let owner = current.display_name();
        for signature in current.members() {
            if seen.insert(signature.key()) {
                out.push(Requirement {
                    owner: owner.clone(),
                    signature: signature.clone(),
                });
            }
        }

        pending.extend(current.extends().iter().map(|c| c.as_ref()));
    }

    tracing::debug!(
        contract = %contract.display_name(),
        members = out.len(),
        contracts = visited.len(),
        "flattened contract"
    );

    out
}
