//! Test utilities for duckwrap unit tests.
//!
//! Only compiled for `cfg(test)`. Provides the tester fixtures (source types
//! and the contracts they are adapted to) and a tracing setup that routes
//! engine logs to the test harness.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::test_support::{init_tracing, tester_contract, MyTester};
//!
//! #[test]
//! fn test_example() {
//!     init_tracing();
//!     let wrapped = Synthesizer::new()
//!         .wrap(&tester_contract(), &Object::new(MyTester::default()))
//!         .unwrap();
//! }
//! ```

pub mod fixtures;

use tracing_subscriber::EnvFilter;

// Re-export fixtures for convenience
pub use fixtures::*;

/// Send `duckwrap` debug logs to the test writer. Safe to call from every
/// test; only the first call installs the subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("duckwrap=debug")),
        )
        .with_test_writer()
        .try_init();
}
