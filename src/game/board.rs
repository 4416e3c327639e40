use std::fmt;

use once_cell::unsync::OnceCell;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::chains::{self, Analysis, Chain};
use super::state::{Move, Orientation, Player, Tile};

pub const DEFAULT_BOARD_SIZE: usize = 3;
pub const MAX_BOARD_SIZE: usize = 9;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum BoardError {
    #[error("edge {mv} is already drawn or lies off the board")]
    IllegalMove { mv: Move },
    #[error("no move left to revert")]
    EmptyStack,
    #[error("board size {size} is not supported (1..={max})")]
    UnsupportedSize { size: usize, max: usize },
}

/// Boxes completed by a single move. An edge borders at most two boxes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClosedBoxes {
    tiles: [Tile; 2],
    len: u8,
}

impl ClosedBoxes {
    fn push(&mut self, tile: Tile) {
        self.tiles[usize::from(self.len)] = tile;
        self.len += 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        self.tiles[..self.len()].iter().copied()
    }
}

/// Mutable Dots-and-Boxes position with an undo stack.
///
/// Edges and boxes are stored row-major. `play` and `revert` are exact inverses:
/// besides edges, ownership and the turn, `revert` also hands back the chain/loop
/// analysis that was cached before the matching `play`, so a search that walks
/// down and back up never recomputes an analysis it already had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    size: usize,
    rows: Vec<bool>,
    cols: Vec<bool>,
    boxes: Vec<i8>,
    to_move: Player,
    move_stack: Vec<Move>,
    closed_stack: Vec<ClosedBoxes>,
    analysis_stack: Vec<Option<Analysis>>,
    analysis: OnceCell<Analysis>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    /// Empty 3x3 board, `Player::First` to move.
    pub fn new() -> Self {
        Self::empty(DEFAULT_BOARD_SIZE, Player::First)
    }

    pub fn with_size(size: usize, to_move: Player) -> Result<Self, BoardError> {
        if size == 0 || size > MAX_BOARD_SIZE {
            return Err(BoardError::UnsupportedSize {
                size,
                max: MAX_BOARD_SIZE,
            });
        }
        Ok(Self::empty(size, to_move))
    }

    fn empty(size: usize, to_move: Player) -> Self {
        Self {
            size,
            rows: vec![false; (size + 1) * size],
            cols: vec![false; size * (size + 1)],
            boxes: vec![0; size * size],
            to_move,
            move_stack: Vec::new(),
            closed_stack: Vec::new(),
            analysis_stack: Vec::new(),
            analysis: OnceCell::new(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn player_to_move(&self) -> Player {
        self.to_move
    }

    #[inline]
    pub fn move_count(&self) -> usize {
        self.move_stack.len()
    }

    pub fn move_stack(&self) -> &[Move] {
        &self.move_stack
    }

    pub fn closed_stack(&self) -> &[ClosedBoxes] {
        &self.closed_stack
    }

    fn edge_index(&self, mv: Move) -> Option<usize> {
        let (x, y) = (mv.position.x, mv.position.y);
        match mv.orientation {
            Orientation::Row if x <= self.size && y < self.size => Some(x * self.size + y),
            Orientation::Col if x < self.size && y <= self.size => Some(x * (self.size + 1) + y),
            _ => None,
        }
    }

    fn edges_mut(&mut self, orientation: Orientation) -> &mut Vec<bool> {
        match orientation {
            Orientation::Row => &mut self.rows,
            Orientation::Col => &mut self.cols,
        }
    }

    /// True if the edge is drawn. Off-board edges read as absent.
    pub fn has_edge(&self, mv: Move) -> bool {
        let Some(index) = self.edge_index(mv) else {
            return false;
        };
        match mv.orientation {
            Orientation::Row => self.rows[index],
            Orientation::Col => self.cols[index],
        }
    }

    #[inline]
    fn tile_index(&self, tile: Tile) -> usize {
        debug_assert!(self.is_valid_tile(tile));
        tile.x * self.size + tile.y
    }

    #[inline]
    pub fn is_valid_tile(&self, tile: Tile) -> bool {
        tile.x < self.size && tile.y < self.size
    }

    /// Score mark stored in the box, `0` when unowned or off the board.
    pub fn box_mark(&self, tile: Tile) -> i8 {
        if !self.is_valid_tile(tile) {
            return 0;
        }
        self.boxes[self.tile_index(tile)]
    }

    pub fn owner(&self, tile: Tile) -> Option<Player> {
        Player::from_mark(self.box_mark(tile))
    }

    pub fn squares(&self, player: Player) -> usize {
        let mark = player.mark();
        self.boxes.iter().filter(|&&b| b == mark).count()
    }

    pub fn tiles(&self) -> impl Iterator<Item = Tile> {
        let size = self.size;
        (0..size).flat_map(move |x| (0..size).map(move |y| Tile::new(x, y)))
    }

    /// The four edges bounding a tile: top, bottom, left, right.
    pub fn tile_edges(tile: Tile) -> [Move; 4] {
        [
            Move::row(tile.x, tile.y),
            Move::row(tile.x + 1, tile.y),
            Move::col(tile.x, tile.y),
            Move::col(tile.x, tile.y + 1),
        ]
    }

    /// Number of the tile's four edges still absent, in `0..=4`.
    pub fn opening_count(&self, tile: Tile) -> u8 {
        let drawn = Self::tile_edges(tile)
            .iter()
            .filter(|&&edge| self.has_edge(edge))
            .count();
        (4 - drawn) as u8
    }

    /// One or two openings: not fully open and not yet completed.
    pub fn chainable(&self, tile: Tile) -> bool {
        matches!(self.opening_count(tile), 1 | 2)
    }

    /// On-board neighbours in [up, down, left, right] order.
    pub fn neighbors(&self, tile: Tile) -> [Option<Tile>; 4] {
        let up = (tile.x > 0).then(|| Tile::new(tile.x - 1, tile.y));
        let down = (tile.x + 1 < self.size).then(|| Tile::new(tile.x + 1, tile.y));
        let left = (tile.y > 0).then(|| Tile::new(tile.x, tile.y - 1));
        let right = (tile.y + 1 < self.size).then(|| Tile::new(tile.x, tile.y + 1));
        [up, down, left, right]
    }

    /// Two tiles are connected when they are orthogonally adjacent and the edge
    /// between them is absent.
    pub fn connected(&self, a: Tile, b: Tile) -> bool {
        if a.x == b.x && a.y.abs_diff(b.y) == 1 {
            return !self.has_edge(Move::col(a.x, a.y.max(b.y)));
        }
        if a.y == b.y && a.x.abs_diff(b.x) == 1 {
            return !self.has_edge(Move::row(a.x.max(b.x), a.y));
        }
        false
    }

    /// Boxes on either side of an edge; border edges have one.
    pub fn adjacent_tiles(&self, mv: Move) -> [Option<Tile>; 2] {
        let (x, y) = (mv.position.x, mv.position.y);
        let (near, far) = match mv.orientation {
            Orientation::Row => (
                Tile::new(x, y),
                x.checked_sub(1).map(|above| Tile::new(above, y)),
            ),
            Orientation::Col => (
                Tile::new(x, y),
                y.checked_sub(1).map(|left| Tile::new(x, left)),
            ),
        };
        [
            Some(near).filter(|&tile| self.is_valid_tile(tile)),
            far.filter(|&tile| self.is_valid_tile(tile)),
        ]
    }

    /// Absent edges: the row grid first, then the col grid, each row-major.
    pub fn available_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(self.available_count());
        for x in 0..=self.size {
            for y in 0..self.size {
                if !self.rows[x * self.size + y] {
                    moves.push(Move::row(x, y));
                }
            }
        }
        for x in 0..self.size {
            for y in 0..=self.size {
                if !self.cols[x * (self.size + 1) + y] {
                    moves.push(Move::col(x, y));
                }
            }
        }
        moves
    }

    /// Same set as [`BoardState::available_moves`], shuffled with the caller's RNG.
    pub fn available_moves_shuffled<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Move> {
        let mut moves = self.available_moves();
        moves.shuffle(rng);
        moves
    }

    pub fn available_count(&self) -> usize {
        self.rows.iter().chain(self.cols.iter()).filter(|&&e| !e).count()
    }

    pub fn ended(&self) -> bool {
        self.available_count() == 0
    }

    /// Draws an edge and applies the box/turn rules.
    ///
    /// Returns the boxes this move completed. When it completed any, the mover
    /// keeps the turn.
    pub fn play(&mut self, mv: Move) -> Result<ClosedBoxes, BoardError> {
        let Some(index) = self.edge_index(mv) else {
            return Err(BoardError::IllegalMove { mv });
        };
        let edges = self.edges_mut(mv.orientation);
        if edges[index] {
            return Err(BoardError::IllegalMove { mv });
        }
        edges[index] = true;

        let mover = self.to_move;
        let mut closed = ClosedBoxes::default();
        for tile in self.adjacent_tiles(mv).into_iter().flatten() {
            if self.opening_count(tile) == 0 {
                let slot = self.tile_index(tile);
                self.boxes[slot] = mover.mark();
                closed.push(tile);
            }
        }
        if closed.is_empty() {
            self.to_move = mover.opponent();
        }

        self.move_stack.push(mv);
        self.closed_stack.push(closed);
        self.analysis_stack.push(self.analysis.take());
        Ok(closed)
    }

    /// Undoes the last `play`, returning the move it removed.
    pub fn revert(&mut self) -> Result<Move, BoardError> {
        let Some(mv) = self.move_stack.pop() else {
            return Err(BoardError::EmptyStack);
        };
        let closed = self.closed_stack.pop().unwrap_or_default();
        let cached = self.analysis_stack.pop().flatten();

        if closed.is_empty() {
            self.to_move = self.to_move.opponent();
        } else {
            for tile in closed.iter() {
                let slot = self.tile_index(tile);
                self.boxes[slot] = 0;
            }
        }
        if let Some(index) = self.edge_index(mv) {
            self.edges_mut(mv.orientation)[index] = false;
        }
        self.analysis = match cached {
            Some(analysis) => OnceCell::with_value(analysis),
            None => OnceCell::new(),
        };
        Ok(mv)
    }

    /// Draws an edge outside the undo history, used when loading a position.
    pub(crate) fn place_edge(&mut self, mv: Move) {
        if let Some(index) = self.edge_index(mv) {
            self.edges_mut(mv.orientation)[index] = true;
            self.analysis.take();
        }
    }

    pub(crate) fn mark_box(&mut self, tile: Tile, owner: Player) {
        let slot = self.tile_index(tile);
        self.boxes[slot] = owner.mark();
    }

    /// Chain/loop decomposition of the current edges, computed on first use.
    pub fn analysis(&self) -> &Analysis {
        self.analysis.get_or_init(|| chains::decompose(self))
    }

    pub fn chains(&self) -> &[Chain] {
        &self.analysis().chains
    }

    pub fn loops(&self) -> &[Chain] {
        &self.analysis().loops
    }

    pub fn is_analysis_stale(&self) -> bool {
        self.analysis.get().is_none()
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for x in 0..=self.size {
            for y in 0..self.size {
                let edge = if self.has_edge(Move::row(x, y)) { "---" } else { "   " };
                write!(f, "+{edge}")?;
            }
            writeln!(f, "+")?;
            if x == self.size {
                break;
            }
            for y in 0..=self.size {
                let edge = if self.has_edge(Move::col(x, y)) { '|' } else { ' ' };
                write!(f, "{edge}")?;
                if y < self.size {
                    match self.owner(Tile::new(x, y)) {
                        Some(player) => write!(f, " {player} ")?,
                        None => write!(f, "   ")?,
                    }
                }
            }
            writeln!(f)?;
        }
        write!(f, "Player {} to play", self.to_move)
    }
}
