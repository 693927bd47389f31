//! # Storage Engine Adapters
//!
//! Reference implementations of the [`Backend`](crate::Backend) contract:
//!
//! - **`memory`**: ordered in-memory stores behind `parking_lot` locks, with
//!   atomic staged batches and an injectable write fault
//! - **`sled_engine`**: persistent storage using the sled embedded database
//!
//! ## Design Philosophy
//!
//! Adapters are thin. They translate the contract onto their engine and
//! nothing more. Lifecycle rules and default options live in the database
//! layer, so every adapter behaves the same from the caller's side. Adapters
//! differ only where their engine does (for example, neither engine here can
//! repair a store, and sled cannot skip checksums).

pub mod memory;
pub mod sled_engine;

pub use memory::MemoryBackend;
pub use sled_engine::SledBackend;
