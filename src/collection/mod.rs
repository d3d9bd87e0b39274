// Collection module - persistence of per-user "found" blueprint flags
// The recognizer only needs to mark items found; everything else about
// user collections lives outside this crate.

pub mod error;
pub mod json_file;
pub mod memory;
pub mod types;

// Re-export the main types for easy access
pub use error::{StoreError, StoreResult};
pub use json_file::JsonFileStore;
pub use memory::{MarkFoundCall, MemoryStore};
pub use types::BlueprintStore;
