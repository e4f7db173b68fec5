//! Persistence collaborators for the match store.
//!
//! The contract mirrors the external persistence boundary: load everything
//! at startup, save everything after each mutating operation. Saves are
//! atomic per call and idempotent (re-saving unchanged state is observably
//! a no-op in the file implementation).

mod error;
mod file;
mod memory;
mod traits;

pub use error::RepositoryError;
pub use file::FileGameRepo;
pub use memory::InMemoryGameRepo;
pub use traits::{GameRepository, Result};
