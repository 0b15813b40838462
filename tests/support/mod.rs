// tests/support/mod.rs
// Shared by several integration test binaries; each binary only uses part
// of it.
#[allow(dead_code, unused_imports)]
pub mod mocks;

#[allow(dead_code, unused_imports)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mocks::*;
