//! Note-store contract and the in-memory reference backend.

mod memory;
mod traits;

pub use memory::InMemoryTargetStore;
pub use traits::{StorageError, TargetSource};
