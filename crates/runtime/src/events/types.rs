//! Render-data payloads published to the presentation collaborator.
//!
//! The engine never depends on what the consumer renders; these carry only
//! the minimal data a board/hand/combat view needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skirmish_core::{GameState, Side};

/// One figure on the board: key, top-left cell, footprint dims, owning side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureRender {
    pub key: String,
    pub cell: (i32, i32),
    pub size: (i32, i32),
    pub side: Side,
}

/// Minimal board view for rendering a snapshot image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub game_id: String,
    pub round: u32,
    pub figures: Vec<FigureRender>,
    pub open_doors: Vec<u16>,
}

impl BoardSnapshot {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            game_id: state.game_id.clone(),
            round: state.current_round,
            figures: state
                .board
                .render_entries()
                .map(|(key, cell, size, side)| FigureRender {
                    key: key.to_string(),
                    cell: (cell.x, cell.y),
                    size,
                    side,
                })
                .collect(),
            open_doors: state.board.open_doors.iter().copied().collect(),
        }
    }
}

/// Combat-thread update: current phase plus the dice/log breakdown lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatUpdate {
    pub game_id: String,
    pub phase: Option<String>,
    pub lines: Vec<String>,
}

/// Plain log lines with a wall-clock stamp for the match transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLines {
    pub game_id: String,
    pub at: DateTime<Utc>,
    pub lines: Vec<String>,
}
