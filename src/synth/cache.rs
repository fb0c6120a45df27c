//! Generated adapter type cache.
//!
//! Entries live for the whole process; there is no eviction. Generation is
//! single-flight per key: the first caller generates while holding the key's
//! slot lock, later callers for the same key block on that lock and then see
//! the published type. Callers for other keys are never blocked by it.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::contract::ContractId;
use crate::core::object::TypeKey;
use crate::synth::errors::SynthesisError;
use crate::synth::generator::AdapterType;

/// (contract identity, source type identity)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdapterKey {
    pub contract: ContractId,
    pub source: TypeKey,
}

type Slot = Arc<Mutex<Option<Arc<AdapterType>>>>;

#[derive(Debug, Default)]
pub struct AdapterCache {
    slots: Mutex<HashMap<AdapterKey, Slot>>,
}

impl AdapterCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &AdapterKey) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// The published adapter for `key`, if any. Waits for an in-flight
    /// generation of the same key to finish.
    pub fn lookup(&self, key: &AdapterKey) -> Option<Arc<AdapterType>> {
        let slot = self.slots.lock().get(key).cloned()?;
        let published = slot.lock().clone();
        published
    }

    /// Publish `adapter` for `key`, replacing any previous entry.
    pub fn store(&self, key: AdapterKey, adapter: Arc<AdapterType>) {
        let slot = self.slot(&key);
        *slot.lock() = Some(adapter);
    }

    /// The adapter for `key`, running `generate` at most once across all
    /// concurrent callers. A failed generation publishes nothing, so the next
    /// caller runs `generate` again.
    pub fn get_or_generate<F>(&self, key: &AdapterKey, generate: F) -> Result<Arc<AdapterType>, SynthesisError>
    where
        F: FnOnce() -> Result<AdapterType, SynthesisError>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock();

        if let Some(adapter) = entry.as_ref() {
            tracing::debug!(adapter = %adapter.name(), "adapter cache hit");
            return Ok(Arc::clone(adapter));
        }

        tracing::debug!(contract = %key.contract, source = %key.source, "adapter cache miss");
        let adapter = match generate() {
            Ok(adapter) => Arc::new(adapter),
            Err(err) => {
                drop(entry);
                self.discard(key, &slot);
                return Err(err);
            }
        };
        *entry = Some(Arc::clone(&adapter));
        Ok(adapter)
    }

    /// Drop the empty slot of a failed key unless another caller is still
    /// waiting on it. Clones are only made under the map lock, so the count
    /// cannot grow while it is held.
    fn discard(&self, key: &AdapterKey, slot: &Slot) {
        let mut slots = self.slots.lock();
        if Arc::strong_count(slot) == 2 && slot.lock().is_none() {
            slots.remove(key);
        }
    }

    /// Whether an adapter has been published for `key`.
    pub fn contains(&self, key: &AdapterKey) -> bool {
        self.lookup(key).is_some()
    }

    /// Number of published adapters.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = self.slots.lock().values().cloned().collect();
        slots.iter().filter(|s| s.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
