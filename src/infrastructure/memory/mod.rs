// src/infrastructure/memory/mod.rs
mod memory_repository;

pub use memory_repository::MemoryRepository;
use std::sync::Arc;

/// Creates an empty in-process user store.
///
/// Contents are lost on restart. Intended for tests and local development
/// without a database.
pub fn create_memory_repository() -> crate::domain::RepositoryPtr {
    Arc::new(MemoryRepository::new())
}
