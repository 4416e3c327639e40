//! Board model: edges, boxes, the undo stack and chain analysis.

pub mod board;
pub mod chains;
pub mod state;

pub use board::{BoardError, BoardState, ClosedBoxes, DEFAULT_BOARD_SIZE, MAX_BOARD_SIZE};
pub use chains::{decompose, Analysis, Chain};
pub use state::{
    GameAction, GameSnapshot, GridKind, Move, Orientation, ParseOrientationError, Player, Position,
    SnapshotError, Tile,
};
