//! Static evaluation of a position from one player's point of view.
//!
//! The heuristic adds a structural term to the box difference: free squares
//! and short closed chains favour the player to move, while open long chains
//! and loops are liabilities for whoever has to open them.

use serde::Serialize;

use crate::game::{BoardState, Player};

pub fn utility(board: &BoardState, player: Player) -> i32 {
    board.squares(player) as i32 - board.squares(player.opponent()) as i32
}

/// Tiles one edge from completion that belong to no chain or loop.
pub fn free_squares(board: &BoardState) -> i32 {
    let analysis = board.analysis();
    board
        .tiles()
        .filter(|&tile| board.opening_count(tile) == 1 && !analysis.is_chain_part(tile))
        .count() as i32
}

/// Chain lengths bucketed by shape. An endpoint with two openings is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChainTally {
    pub open_short: i32,
    pub half_open_short: i32,
    pub half_open_count: i32,
    pub closed_short: i32,
    pub open_long: i32,
    pub open_long_count: i32,
    pub closed_long: i32,
}

impl ChainTally {
    pub fn of(board: &BoardState) -> Self {
        let mut tally = Self::default();
        for chain in board.chains() {
            let (Some(&head), Some(&tail)) = (chain.first(), chain.last()) else {
                continue;
            };
            let head_open = board.opening_count(head) == 2;
            let tail_open = board.opening_count(tail) == 2;
            let length = chain.len() as i32;
            if chain.len() == 2 {
                if head_open && tail_open {
                    tally.open_short += length;
                } else if head_open || tail_open {
                    tally.half_open_short += length;
                    tally.half_open_count += 1;
                } else {
                    tally.closed_short += length;
                }
            } else if head_open && tail_open {
                tally.open_long += length;
                tally.open_long_count += 1;
            } else {
                tally.closed_long += length;
            }
        }
        tally
    }

    pub fn value(&self) -> i32 {
        let open_long_value = if self.open_long_count == 0 {
            0
        } else {
            self.open_long - 4 * self.open_long_count + 4
        };
        let parity = if self.half_open_count % 2 == 1 { -1 } else { 1 };
        self.closed_short + self.half_open_short - self.open_short + self.closed_long
            - open_long_value * parity
    }
}

pub fn chain_value(board: &BoardState) -> i32 {
    ChainTally::of(board).value()
}

pub fn loop_value(board: &BoardState) -> i32 {
    -board.loops().iter().map(|l| l.len() as i32).sum::<i32>()
}

/// Heuristic evaluation. The structural term counts for the player to move.
pub fn eval(board: &BoardState, player: Player) -> i32 {
    let sign = if board.player_to_move() == player { 1 } else { -1 };
    utility(board, player) + sign * (chain_value(board) + free_squares(board) + loop_value(board))
}

pub fn objective(board: &BoardState, player: Player, use_heuristic: bool) -> i32 {
    if use_heuristic {
        eval(board, player)
    } else {
        utility(board, player)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvalBreakdown {
    pub player: Player,
    pub utility: i32,
    pub free_squares: i32,
    pub chain_value: i32,
    pub loop_value: i32,
    pub chains: usize,
    pub loops: usize,
    pub eval: i32,
}

pub fn breakdown(board: &BoardState, player: Player) -> EvalBreakdown {
    EvalBreakdown {
        player,
        utility: utility(board, player),
        free_squares: free_squares(board),
        chain_value: chain_value(board),
        loop_value: loop_value(board),
        chains: board.chains().len(),
        loops: board.loops().len(),
        eval: eval(board, player),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Move;

    fn board_after(moves: &[Move]) -> BoardState {
        let mut board = BoardState::new();
        for &mv in moves {
            board.play(mv).expect("test move should be legal");
        }
        board
    }

    #[test]
    fn empty_board_is_neutral() {
        let board = BoardState::new();
        assert_eq!(utility(&board, Player::First), 0);
        assert_eq!(eval(&board, Player::First), 0);
        assert_eq!(eval(&board, Player::Second), 0);
    }

    #[test]
    fn enclosed_box_counts_for_its_owner() {
        let board = board_after(&[
            Move::row(0, 0),
            Move::row(1, 0),
            Move::col(0, 0),
            Move::col(0, 1),
        ]);
        assert_eq!(board.squares(Player::Second), 1);
        assert_eq!(utility(&board, Player::Second), 1);
        assert_eq!(utility(&board, Player::First), -1);
        assert_eq!(objective(&board, Player::Second, false), 1);
    }

    #[test]
    fn open_long_chain_is_a_liability_for_the_mover() {
        let board = board_after(&[
            Move::row(0, 0),
            Move::row(0, 1),
            Move::row(0, 2),
            Move::row(1, 0),
            Move::row(1, 1),
            Move::row(1, 2),
        ]);
        let tally = ChainTally::of(&board);
        assert_eq!(tally.open_long, 3);
        assert_eq!(tally.open_long_count, 1);
        assert_eq!(chain_value(&board), -3);
        assert_eq!(free_squares(&board), 0);
        assert_eq!(board.player_to_move(), Player::First);
        assert_eq!(eval(&board, Player::First), -3);
        assert_eq!(eval(&board, Player::Second), 3);
    }

    #[test]
    fn loops_count_against_the_mover() {
        let board = board_after(&[
            Move::row(0, 0),
            Move::row(0, 1),
            Move::row(2, 0),
            Move::row(2, 1),
            Move::col(0, 0),
            Move::col(1, 0),
            Move::col(0, 2),
            Move::col(1, 2),
        ]);
        assert_eq!(loop_value(&board), -4);
        assert_eq!(eval(&board, Player::First), -4);
        assert_eq!(eval(&board, Player::Second), 4);
    }

    #[test]
    fn free_square_favours_the_mover() {
        let board = board_after(&[Move::row(2, 2), Move::row(3, 2), Move::col(2, 2)]);
        assert_eq!(free_squares(&board), 1);
        assert_eq!(board.player_to_move(), Player::Second);
        assert_eq!(eval(&board, Player::Second), 1);
        assert_eq!(objective(&board, Player::Second, false), 0);
    }

    #[test]
    fn half_open_short_chain() {
        let board = board_after(&[
            Move::row(3, 1),
            Move::row(3, 2),
            Move::row(2, 1),
            Move::row(2, 2),
            Move::col(2, 3),
        ]);
        let tally = ChainTally::of(&board);
        assert_eq!(tally.half_open_short, 2);
        assert_eq!(tally.half_open_count, 1);
        assert_eq!(chain_value(&board), 2);
        assert_eq!(eval(&board, Player::Second), 2);
    }

    #[test]
    fn open_short_chain() {
        let board = board_after(&[
            Move::row(0, 0),
            Move::row(0, 1),
            Move::row(1, 0),
            Move::row(1, 1),
        ]);
        assert_eq!(ChainTally::of(&board).open_short, 2);
        assert_eq!(chain_value(&board), -2);
        assert_eq!(eval(&board, Player::First), -2);
    }

    #[test]
    fn odd_half_open_count_flips_open_long_term() {
        let tally = ChainTally {
            half_open_short: 2,
            half_open_count: 1,
            open_long: 5,
            open_long_count: 1,
            ..ChainTally::default()
        };
        assert_eq!(tally.value(), 2 + 5);
        let even = ChainTally {
            half_open_count: 2,
            half_open_short: 4,
            ..tally
        };
        assert_eq!(even.value(), 4 - 5);
    }

    #[test]
    fn breakdown_matches_terms() {
        let board = board_after(&[Move::row(2, 2), Move::row(3, 2), Move::col(2, 2)]);
        let report = breakdown(&board, Player::Second);
        assert_eq!(report.free_squares, 1);
        assert_eq!(report.chains, 0);
        assert_eq!(report.loops, 0);
        assert_eq!(report.eval, eval(&board, Player::Second));
    }
}
