//! Layout fingerprints for generated adapter types.

use sha2::{Digest, Sha256};

/// Incremental SHA-256 over a sequence of layout components.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component, terminated so `ab`+`c` differs from `a`+`bc`.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0");
        self
    }

    pub fn update_bool(&mut self, b: bool) -> &mut Self {
        self.hasher.update([b as u8]);
        self
    }

    /// Finalize as a lowercase hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}
