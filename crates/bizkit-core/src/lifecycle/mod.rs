//! Lifecycle ledger — durable per-module status with audit fields.
//!
//! ## Components
//! - **types** — `ModuleLifecycleRecord`, `ModuleStatus`
//! - **store** — the `LifecycleStore` contract every backend implements
//! - **memory** — `InMemoryLifecycleStore`, a process-local backend for tests and embedding

pub mod memory;
pub mod store;
pub mod types;

pub use memory::InMemoryLifecycleStore;
pub use store::LifecycleStore;
pub use types::{ModuleLifecycleRecord, ModuleStatus};
