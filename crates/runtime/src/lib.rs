//! Runtime orchestration for the skirmish engine.
//!
//! This crate wires the rules engine to its collaborators: the persistence
//! repository (load-all/save-all game records), the topic-based event bus
//! feeding the presentation layer, and oracle implementations backed by
//! loaded content. All mutation funnels through a single command worker per
//! process, so handlers for one game run to completion and persistence
//! writes are serialized.
//!
//! Modules by responsibility:
//! - [`runtime`] hosts the assembly and configuration
//! - [`handle`] exposes the client-facing facade
//! - [`events`] provides the topic-based event bus
//! - [`oracle`] adapts loaded content to the core oracle traits
//! - [`repository`] and [`store`] persist and own the game records

pub mod error;
pub mod events;
pub mod handle;
pub mod oracle;
pub mod repository;
pub mod runtime;
pub mod store;

mod worker;

pub use error::{Result, RuntimeError};
pub use events::{BoardSnapshot, CombatUpdate, Event, EventBus, FigureRender, LogLines, Topic};
pub use handle::RuntimeHandle;
pub use oracle::{MapView, OracleManager};
pub use repository::{FileGameRepo, GameRepository, InMemoryGameRepo, RepositoryError};
pub use runtime::{Runtime, RuntimeConfig};
pub use store::GameStore;
