//! Move selection: alpha-beta minimax, a sampled one-ply search and a random
//! baseline, all behind the [`Agent`] trait.

pub mod clock;
pub mod config;
pub mod eval;
pub mod local_search;
pub mod minimax;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{BoardError, BoardState, Move, Player};
use crate::trace::Tracer;

pub use clock::{Deadline, Instant};
pub use config::{AiConfig, AiDifficulty, AiStrategy, UnknownOption, DEFAULT_SAMPLE_FRACTION};
pub use eval::{breakdown, objective, EvalBreakdown};
pub use local_search::LocalSearchAgent;
pub use minimax::{depth_for_branching, MinimaxAgent};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Maximize,
    Minimize,
}

impl Role {
    /// Maximize exactly when `player` is the one to move.
    pub fn for_player(board: &BoardState, player: Player) -> Self {
        if board.player_to_move() == player {
            Role::Maximize
        } else {
            Role::Minimize
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Role::Maximize => Role::Minimize,
            Role::Minimize => Role::Maximize,
        }
    }

    /// Role of a child node: unchanged when the mover keeps the turn.
    pub fn after_move(self, mover: Player, next_to_move: Player) -> Self {
        if mover == next_to_move {
            self
        } else {
            self.flipped()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum SearchError {
    #[error("{expected:?} node at depth {depth} found {actual:?} to move")]
    RoleInvariantViolation {
        expected: Role,
        actual: Role,
        depth: u8,
    },
    #[error("board rejected a search step: {error}")]
    Board {
        #[from]
        error: BoardError,
    },
    #[error("no legal moves left")]
    NoLegalMoves,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    /// Depth limit the search ran with.
    pub max_depth: u8,
    pub depth_reached: u8,
    pub timed_out: bool,
    /// The move was drawn at random because no candidate finished in time.
    pub fallback: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Decision {
    pub mv: Move,
    pub score: i32,
    pub strategy: AiStrategy,
    pub stats: SearchStats,
}

pub trait Agent {
    /// Picks a move for `player`. The board is returned in the state it was
    /// passed in, whatever the outcome.
    fn search(
        &mut self,
        board: &mut BoardState,
        player: Player,
        tracer: &Tracer,
    ) -> Result<Decision, SearchError>;
}

pub(crate) fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Uniformly random legal move, scored 0.
pub fn random_move(board: &BoardState, rng: &mut SmallRng) -> Result<Move, SearchError> {
    board
        .available_moves()
        .choose(rng)
        .copied()
        .ok_or(SearchError::NoLegalMoves)
}

/// Replaces an empty search result with a random move.
pub(crate) fn fallback_decision(
    board: &BoardState,
    rng: &mut SmallRng,
    strategy: AiStrategy,
    mut stats: SearchStats,
    tracer: &Tracer,
) -> Result<Decision, SearchError> {
    let mv = random_move(board, rng)?;
    stats.fallback = true;
    tracer.debug(|| format!("No move selected in time, playing random {mv}"));
    Ok(Decision {
        mv,
        score: 0,
        strategy,
        stats,
    })
}

pub struct RandomAgent {
    rng: SmallRng,
}

impl RandomAgent {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seeded_rng(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn search(
        &mut self,
        board: &mut BoardState,
        _player: Player,
        _tracer: &Tracer,
    ) -> Result<Decision, SearchError> {
        let deadline = Deadline::unbounded();
        let mv = random_move(board, &mut self.rng)?;
        Ok(Decision {
            mv,
            score: 0,
            strategy: AiStrategy::Random,
            stats: SearchStats {
                nodes: 1,
                max_depth: 1,
                depth_reached: 1,
                duration_ms: deadline.elapsed_ms(),
                ..SearchStats::default()
            },
        })
    }
}

/// Agent for the configured strategy.
pub fn build_agent(config: &AiConfig) -> Box<dyn Agent> {
    match config.strategy {
        AiStrategy::Minimax => Box::new(MinimaxAgent::new(config.clone())),
        AiStrategy::LocalSearch => Box::new(LocalSearchAgent::new(config.clone())),
        AiStrategy::Random => Box::new(RandomAgent::new(config.seed)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_follows_turn_continuation() {
        assert_eq!(
            Role::Maximize.after_move(Player::First, Player::First),
            Role::Maximize
        );
        assert_eq!(
            Role::Maximize.after_move(Player::First, Player::Second),
            Role::Minimize
        );
        assert_eq!(
            Role::Minimize.after_move(Player::Second, Player::First),
            Role::Maximize
        );
        let board = BoardState::new();
        assert_eq!(Role::for_player(&board, Player::First), Role::Maximize);
        assert_eq!(Role::for_player(&board, Player::Second), Role::Minimize);
    }

    #[test]
    fn random_agent_plays_legal_moves() {
        let mut board = BoardState::new();
        let mut agent = RandomAgent::new(Some(11));
        let decision = agent
            .search(&mut board, Player::First, &Tracer::silent())
            .expect("board has moves");
        assert!(!board.has_edge(decision.mv));
        assert_eq!(decision.score, 0);
        assert_eq!(decision.strategy, AiStrategy::Random);
        assert!(board.play(decision.mv).is_ok());
    }

    #[test]
    fn random_move_on_full_board_fails() {
        let mut board = BoardState::with_size(1, Player::First).expect("1x1 is supported");
        for mv in board.available_moves() {
            board.play(mv).expect("edge is free");
        }
        let mut rng = seeded_rng(Some(1));
        assert_eq!(random_move(&board, &mut rng), Err(SearchError::NoLegalMoves));
    }

    #[test]
    fn search_error_serializes_tagged() {
        let error = SearchError::from(BoardError::EmptyStack);
        let json = serde_json::to_value(&error).expect("error should serialize");
        assert_eq!(json["type"], "Board");
        assert_eq!(json["error"]["type"], "EmptyStack");
    }
}
