// src/infrastructure/persistence/mod.rs
pub mod memory;
pub mod seed;

pub use memory::InMemoryDatabase;
