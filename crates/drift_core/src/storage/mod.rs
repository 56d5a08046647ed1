//! Repository implementations bundled with the core crate

mod memory;

pub use memory::MemoryStore;
