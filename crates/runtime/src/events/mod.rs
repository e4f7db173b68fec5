//! Topic-based event bus for the presentation collaborator.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{BoardSnapshot, CombatUpdate, FigureRender, LogLines};
