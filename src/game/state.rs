use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::{BoardError, BoardState, MAX_BOARD_SIZE};

/// Box-status tally that marks a completed box in the external game.
const COMPLETED_TALLY: i8 = 4;

fn is_completed(tally: i8) -> bool {
    tally.unsigned_abs() == COMPLETED_TALLY.unsigned_abs()
}

/// One of the two symmetric players.
///
/// The score mark doubles as the value written into an owned box, so box
/// ownership and scoring share one integer domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    First,
    Second,
}

impl Player {
    #[inline]
    pub const fn mark(self) -> i8 {
        match self {
            Player::First => -COMPLETED_TALLY,
            Player::Second => COMPLETED_TALLY,
        }
    }

    #[inline]
    pub fn from_mark(mark: i8) -> Option<Self> {
        match mark {
            m if m == Player::First.mark() => Some(Player::First),
            m if m == Player::Second.mark() => Some(Player::Second),
            _ => None,
        }
    }

    /// Player 1 of the external game is `First`.
    #[inline]
    pub const fn from_turn(player1_turn: bool) -> Self {
        if player1_turn {
            Player::First
        } else {
            Player::Second
        }
    }

    #[inline]
    pub const fn opponent(self) -> Self {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::First => f.write_str("1"),
            Player::Second => f.write_str("2"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Horizontal edge, lives in the `(N + 1) x N` grid.
    Row,
    /// Vertical edge, lives in the `N x (N + 1)` grid.
    Col,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Row => f.write_str("row"),
            Orientation::Col => f.write_str("col"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown edge orientation `{0}`")]
pub struct ParseOrientationError(pub String);

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "row" | "h" | "horizontal" => Ok(Orientation::Row),
            "col" | "v" | "vertical" => Ok(Orientation::Col),
            other => Err(ParseOrientationError(other.to_string())),
        }
    }
}

/// Matrix coordinate inside an edge grid: `x` is the grid row, `y` the grid column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    #[inline]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Move {
    pub orientation: Orientation,
    pub position: Position,
}

impl Move {
    #[inline]
    pub const fn new(orientation: Orientation, position: Position) -> Self {
        Self {
            orientation,
            position,
        }
    }

    #[inline]
    pub const fn row(x: usize, y: usize) -> Self {
        Self::new(Orientation::Row, Position::new(x, y))
    }

    #[inline]
    pub const fn col(x: usize, y: usize) -> Self {
        Self::new(Orientation::Col, Position::new(x, y))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, {})",
            self.orientation, self.position.x, self.position.y
        )
    }
}

/// Box coordinate, `0 <= x, y < N`, matrix indexing like [`Position`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tile {
    pub x: usize,
    pub y: usize,
}

impl Tile {
    #[inline]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GridKind {
    Row,
    Col,
    Box,
}

impl fmt::Display for GridKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridKind::Row => f.write_str("row_status"),
            GridKind::Col => f.write_str("col_status"),
            GridKind::Box => f.write_str("board_status"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum SnapshotError {
    #[error("board size {size} is not supported (1..={max})")]
    UnsupportedSize { size: usize, max: usize },
    #[error("{grid} must be {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    ShapeMismatch {
        grid: GridKind,
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
    #[error("box at screen ({x}, {y}) disagrees with its edges")]
    BoxStatusMismatch { x: usize, y: usize },
    #[error("board rejected the snapshot: {error}")]
    Board { error: BoardError },
}

/// Game state as the external Dots-and-Boxes game hands it to a bot.
///
/// Every grid is indexed `[y][x]` with `x` the horizontal screen coordinate.
/// `board_status` holds signed edge tallies; `-4` / `+4` mark a box completed by
/// player 1 / player 2.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSnapshot {
    pub board_status: Vec<Vec<i8>>,
    pub row_status: Vec<Vec<u8>>,
    pub col_status: Vec<Vec<u8>>,
    pub player1_turn: bool,
}

impl GameSnapshot {
    /// Fresh game with player 1 to move.
    pub fn empty(size: usize) -> Self {
        Self {
            board_status: vec![vec![0; size]; size],
            row_status: vec![vec![0; size]; size + 1],
            col_status: vec![vec![0; size + 1]; size],
            player1_turn: true,
        }
    }

    pub fn size(&self) -> usize {
        self.board_status.len()
    }

    pub fn player_to_move(&self) -> Player {
        Player::from_turn(self.player1_turn)
    }

    pub fn integrity_check(&self) -> Result<(), SnapshotError> {
        let size = self.size();
        if size == 0 || size > MAX_BOARD_SIZE {
            return Err(SnapshotError::UnsupportedSize {
                size,
                max: MAX_BOARD_SIZE,
            });
        }
        check_shape(GridKind::Box, &self.board_status, size, size)?;
        check_shape(GridKind::Row, &self.row_status, size + 1, size)?;
        check_shape(GridKind::Col, &self.col_status, size, size + 1)?;

        for (y, line) in self.board_status.iter().enumerate() {
            for (x, &tally) in line.iter().enumerate() {
                let enclosed = self.row_status[y][x] != 0
                    && self.row_status[y + 1][x] != 0
                    && self.col_status[y][x] != 0
                    && self.col_status[y][x + 1] != 0;
                let completed = is_completed(tally);
                if enclosed != completed {
                    return Err(SnapshotError::BoxStatusMismatch { x, y });
                }
            }
        }
        Ok(())
    }

    /// Builds the internal board. Screen `[y][x]` becomes internal `(x = y, y = x)`;
    /// this and [`GameAction::from_move`] are the only places the axes swap.
    pub fn to_board(&self) -> Result<BoardState, SnapshotError> {
        self.integrity_check()?;
        let size = self.size();
        let mut board = BoardState::with_size(size, self.player_to_move())
            .map_err(|error| SnapshotError::Board { error })?;

        for (row, line) in self.row_status.iter().enumerate() {
            for (col, &status) in line.iter().enumerate() {
                if status != 0 {
                    board.place_edge(Move::row(row, col));
                }
            }
        }
        for (row, line) in self.col_status.iter().enumerate() {
            for (col, &status) in line.iter().enumerate() {
                if status != 0 {
                    board.place_edge(Move::col(row, col));
                }
            }
        }
        for (row, line) in self.board_status.iter().enumerate() {
            for (col, &tally) in line.iter().enumerate() {
                if is_completed(tally) {
                    let owner = if tally < 0 {
                        Player::First
                    } else {
                        Player::Second
                    };
                    board.mark_box(Tile::new(row, col), owner);
                }
            }
        }
        Ok(board)
    }

    /// Inverse of [`GameSnapshot::to_board`]. Tallies of unfinished boxes are
    /// not tracked internally, so they come back as zero.
    pub fn from_board(board: &BoardState) -> Self {
        let size = board.size();
        let mut snapshot = Self::empty(size);
        for x in 0..=size {
            for y in 0..size {
                snapshot.row_status[x][y] = u8::from(board.has_edge(Move::row(x, y)));
            }
        }
        for x in 0..size {
            for y in 0..=size {
                snapshot.col_status[x][y] = u8::from(board.has_edge(Move::col(x, y)));
            }
        }
        for x in 0..size {
            for y in 0..size {
                snapshot.board_status[x][y] = board.box_mark(Tile::new(x, y));
            }
        }
        snapshot.player1_turn = board.player_to_move() == Player::First;
        snapshot
    }
}

fn check_shape<T>(
    grid: GridKind,
    rows: &[Vec<T>],
    expected_rows: usize,
    expected_cols: usize,
) -> Result<(), SnapshotError> {
    let bad = rows
        .iter()
        .map(Vec::len)
        .find(|&cols| cols != expected_cols);
    if rows.len() != expected_rows || bad.is_some() {
        return Err(SnapshotError::ShapeMismatch {
            grid,
            expected_rows,
            expected_cols,
            rows: rows.len(),
            cols: bad.unwrap_or(expected_cols),
        });
    }
    Ok(())
}

/// Move in the external game's coordinates: `position` is `(x, y)` on screen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameAction {
    pub action_type: Orientation,
    pub position: (usize, usize),
}

impl GameAction {
    pub fn from_move(mv: Move) -> Self {
        Self {
            action_type: mv.orientation,
            position: (mv.position.y, mv.position.x),
        }
    }

    pub fn to_move(self) -> Move {
        let (x, y) = self.position;
        Move::new(self.action_type, Position::new(y, x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_marks_round_trip() {
        for player in [Player::First, Player::Second] {
            assert_eq!(Player::from_mark(player.mark()), Some(player));
            assert_eq!(player.opponent().opponent(), player);
        }
        assert_eq!(Player::from_mark(0), None);
        assert_eq!(Player::from_mark(3), None);
        assert_eq!(Player::from_turn(true), Player::First);
    }

    #[test]
    fn action_swaps_axes_once() {
        let mv = Move::row(3, 1);
        let action = GameAction::from_move(mv);
        assert_eq!(action.position, (1, 3));
        assert_eq!(action.to_move(), mv);
    }

    #[test]
    fn snapshot_translates_screen_coordinates() {
        let mut snapshot = GameSnapshot::empty(3);
        // Screen x = 2, y = 0: the top edge of the top-right box.
        snapshot.row_status[0][2] = 1;
        snapshot.player1_turn = false;

        let board = snapshot.to_board().expect("snapshot should be valid");
        assert!(board.has_edge(Move::row(0, 2)));
        assert!(!board.has_edge(Move::row(2, 0)));
        assert_eq!(board.player_to_move(), Player::Second);
        assert_eq!(GameSnapshot::from_board(&board), snapshot);
    }

    #[test]
    fn snapshot_reads_completed_boxes() {
        let mut snapshot = GameSnapshot::empty(3);
        snapshot.row_status[1][0] = 1;
        snapshot.row_status[2][0] = 1;
        snapshot.col_status[1][0] = 1;
        snapshot.col_status[1][1] = 1;
        snapshot.board_status[1][0] = -4;

        let board = snapshot.to_board().expect("snapshot should be valid");
        assert_eq!(board.owner(Tile::new(1, 0)), Some(Player::First));
        assert_eq!(board.squares(Player::First), 1);
        assert_eq!(board.squares(Player::Second), 0);
    }

    #[test]
    fn snapshot_rejects_bad_shapes() {
        let mut snapshot = GameSnapshot::empty(3);
        snapshot.col_status[0].pop();
        assert!(matches!(
            snapshot.integrity_check(),
            Err(SnapshotError::ShapeMismatch {
                grid: GridKind::Col,
                ..
            })
        ));

        let empty = GameSnapshot {
            board_status: Vec::new(),
            row_status: Vec::new(),
            col_status: Vec::new(),
            player1_turn: true,
        };
        assert!(matches!(
            empty.integrity_check(),
            Err(SnapshotError::UnsupportedSize { size: 0, .. })
        ));
    }

    #[test]
    fn snapshot_rejects_unmarked_enclosed_box() {
        let mut snapshot = GameSnapshot::empty(2);
        snapshot.row_status[0][0] = 1;
        snapshot.row_status[1][0] = 1;
        snapshot.col_status[0][0] = 1;
        snapshot.col_status[0][1] = 1;
        assert_eq!(
            snapshot.integrity_check(),
            Err(SnapshotError::BoxStatusMismatch { x: 0, y: 0 })
        );
    }

    #[test]
    fn snapshot_rejects_extreme_tallies() {
        let json = r#"{
            "board_status": [[-128, 0], [0, 127]],
            "row_status": [[0, 0], [0, 0], [0, 0]],
            "col_status": [[0, 0, 0], [0, 0, 0]],
            "player1_turn": true
        }"#;
        let snapshot: GameSnapshot = serde_json::from_str(json).expect("tallies fit in i8");
        assert_eq!(snapshot.integrity_check(), Ok(()));
        assert!(snapshot.to_board().is_ok());

        let mut closed = GameSnapshot::empty(1);
        closed.row_status = vec![vec![1], vec![1]];
        closed.col_status = vec![vec![1, 1]];
        closed.board_status[0][0] = i8::MIN;
        assert_eq!(
            closed.integrity_check(),
            Err(SnapshotError::BoxStatusMismatch { x: 0, y: 0 })
        );
    }

    #[test]
    fn snapshot_json_matches_external_shape() {
        let json = r#"{
            "board_status": [[0, 0], [0, 0]],
            "row_status": [[1, 0], [0, 0], [0, 0]],
            "col_status": [[0, 0, 0], [0, 0, 0]],
            "player1_turn": false
        }"#;
        let snapshot: GameSnapshot = serde_json::from_str(json).expect("valid snapshot json");
        assert_eq!(snapshot.size(), 2);
        assert_eq!(snapshot.player_to_move(), Player::Second);

        let action = GameAction::from_move(Move::col(1, 2));
        let encoded = serde_json::to_string(&action).expect("action should encode");
        assert_eq!(encoded, r#"{"action_type":"col","position":[2,1]}"#);
    }
}
