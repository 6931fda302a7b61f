//! In-memory storage backend for Shelterline.
//!
//! One process-local store implements every storage trait behind
//! `tokio::sync::RwLock`s, giving each individual operation atomic
//! semantics. Multi-step compositions (allocate, cancel, check-in) are
//! serialized by the engine's critical section on top of these primitives.
//!
//! This is the sole shipped backend; the trait seams in
//! `shelterline-storage` are where a SQL backend would plug in.

mod storage;

pub use storage::InMemoryShelterStore;
