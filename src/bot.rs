//! Adapter between the external game's snapshots and the search agents.

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::{
    build_agent, random_move, seeded_rng, AiConfig, AiStrategy, Deadline, Decision, SearchStats,
};
use crate::game::{GameAction, GameSnapshot, SnapshotError};
use crate::trace::Tracer;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum BotError {
    #[error("invalid game state: {error}")]
    InvalidSnapshot {
        #[from]
        error: SnapshotError,
    },
    #[error("the game is already over")]
    GameOver,
}

pub trait Bot {
    fn get_action(&mut self, snapshot: &GameSnapshot) -> Result<GameAction, BotError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotDecision {
    pub action: GameAction,
    pub decision: Decision,
}

/// Bot driven by an [`AiConfig`]. Each call rebuilds the board from the
/// snapshot, so one bot can serve either seat.
pub struct DotsBot {
    config: AiConfig,
    tracer: Tracer,
    rng: SmallRng,
}

impl DotsBot {
    pub fn new(config: AiConfig) -> Self {
        let tracer = Tracer::to_log(config.trace);
        Self::with_tracer(config, tracer)
    }

    pub fn with_tracer(config: AiConfig, tracer: Tracer) -> Self {
        let rng = seeded_rng(config.seed.map(|seed| seed.wrapping_add(1)));
        Self {
            config,
            tracer,
            rng,
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn decide(&mut self, snapshot: &GameSnapshot) -> Result<BotDecision, BotError> {
        let mut board = snapshot.to_board()?;
        if board.ended() {
            return Err(BotError::GameOver);
        }
        let player = snapshot.player_to_move();
        let clock = Deadline::unbounded();

        let mut agent = build_agent(&self.config);
        let decision = match agent.search(&mut board, player, &self.tracer) {
            Ok(decision) => decision,
            Err(error) => {
                self.tracer
                    .debug(|| format!("Search failed ({error}), playing a random move"));
                // A failed search may have been cut off mid-walk.
                let board = snapshot.to_board()?;
                let mv = random_move(&board, &mut self.rng).map_err(|_| BotError::GameOver)?;
                Decision {
                    mv,
                    score: 0,
                    strategy: AiStrategy::Random,
                    stats: SearchStats {
                        fallback: true,
                        ..SearchStats::default()
                    },
                }
            }
        };

        self.tracer
            .debug(|| format!("Best move: {}. Eval: {}", decision.mv, decision.score));
        self.tracer.perf(|| {
            format!(
                "Thinking time: {:.2}s",
                clock.elapsed().as_secs_f64()
            )
        });

        Ok(BotDecision {
            action: GameAction::from_move(decision.mv),
            decision,
        })
    }
}

impl Bot for DotsBot {
    fn get_action(&mut self, snapshot: &GameSnapshot) -> Result<GameAction, BotError> {
        self.decide(snapshot).map(|decided| decided.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{BoardState, Move, Orientation};
    use crate::trace::{MemorySink, TraceConfig};

    fn snapshot_after(moves: &[Move]) -> GameSnapshot {
        let mut board = BoardState::new();
        for &mv in moves {
            board.play(mv).expect("test move should be legal");
        }
        GameSnapshot::from_board(&board)
    }

    #[test]
    fn completes_the_open_box_in_screen_coordinates() {
        // Internal col(0, 1) is the vertical edge at screen x = 1, y = 0.
        let snapshot = snapshot_after(&[Move::row(0, 0), Move::row(1, 0), Move::col(0, 0)]);
        let config = AiConfig {
            max_depth: Some(2),
            ..AiConfig::from_names(Some("hard"), None).with_seed(1)
        };
        let mut bot = DotsBot::with_tracer(config, Tracer::silent());
        let action = bot.get_action(&snapshot).expect("bot should move");
        assert_eq!(action.action_type, Orientation::Col);
        assert_eq!(action.position, (1, 0));
    }

    #[test]
    fn finished_game_is_an_error() {
        let mut board = BoardState::with_size(1, crate::game::Player::First)
            .expect("1x1 is supported");
        for mv in board.available_moves() {
            board.play(mv).expect("edge is free");
        }
        let snapshot = GameSnapshot::from_board(&board);
        let mut bot = DotsBot::with_tracer(AiConfig::default(), Tracer::silent());
        assert_eq!(bot.get_action(&snapshot), Err(BotError::GameOver));
    }

    #[test]
    fn malformed_snapshot_is_rejected() {
        let mut snapshot = GameSnapshot::empty(3);
        snapshot.row_status.pop();
        let mut bot = DotsBot::with_tracer(AiConfig::default(), Tracer::silent());
        assert!(matches!(
            bot.get_action(&snapshot),
            Err(BotError::InvalidSnapshot { .. })
        ));
    }

    #[test]
    fn traces_best_move_and_thinking_time() {
        let sink = MemorySink::new();
        let tracer = Tracer::new(
            TraceConfig {
                debug: true,
                verbose: false,
                perf: true,
            },
            sink.clone(),
        );
        let mut bot = DotsBot::with_tracer(
            AiConfig::from_names(Some("easy"), None).with_seed(8),
            tracer,
        );
        let decided = bot
            .decide(&GameSnapshot::empty(3))
            .expect("bot should move");
        assert_eq!(decided.action, GameAction::from_move(decided.decision.mv));
        assert!(sink.contains("Best move: "));
        assert!(sink.contains("Thinking time: "));
    }
}
