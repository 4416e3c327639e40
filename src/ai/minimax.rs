use rand::rngs::SmallRng;

use super::clock::Deadline;
use super::config::{AiConfig, AiStrategy};
use super::eval::objective;
use super::{fallback_decision, seeded_rng, Agent, Decision, Role, SearchError, SearchStats};
use crate::game::{BoardState, Move, Player};
use crate::trace::Tracer;

/// Depth limit for a root with `moves` legal moves. Narrow endgames are
/// searched deeper.
pub fn depth_for_branching(moves: usize) -> u8 {
    match moves {
        m if m > 18 => 4,
        m if m > 14 => 5,
        m if m > 10 => 6,
        _ => 8,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Node {
    mv: Option<Move>,
    score: i32,
}

struct Search<'a> {
    player: Player,
    max_depth: u8,
    use_heuristic: bool,
    randomize: bool,
    pruning: bool,
    deadline: Deadline,
    rng: &'a mut SmallRng,
    stats: SearchStats,
}

impl Search<'_> {
    fn minimax(
        &mut self,
        board: &mut BoardState,
        mut alpha: i32,
        mut beta: i32,
        depth: u8,
        role: Role,
    ) -> Result<Node, SearchError> {
        self.stats.nodes += 1;
        self.stats.depth_reached = self.stats.depth_reached.max(depth);

        let actual = Role::for_player(board, self.player);
        if actual != role {
            return Err(SearchError::RoleInvariantViolation {
                expected: role,
                actual,
                depth,
            });
        }

        if board.ended() || depth >= self.max_depth {
            return Ok(Node {
                mv: None,
                score: objective(board, self.player, self.use_heuristic),
            });
        }

        let moves = if self.randomize {
            board.available_moves_shuffled(&mut *self.rng)
        } else {
            board.available_moves()
        };

        let mut best = Node {
            mv: None,
            score: match role {
                Role::Maximize => i32::MIN,
                Role::Minimize => i32::MAX,
            },
        };

        for mv in moves {
            if self.deadline.expired() {
                self.stats.timed_out = true;
                break;
            }

            let mover = board.player_to_move();
            board.play(mv)?;
            let child_role = role.after_move(mover, board.player_to_move());
            let child = self.minimax(board, alpha, beta, depth + 1, child_role);
            board.revert()?;
            let child = child?;

            // The child stopped early; its score is not a real bound.
            if self.stats.timed_out {
                break;
            }

            match role {
                Role::Maximize => {
                    if child.score > best.score {
                        best = Node {
                            mv: Some(mv),
                            score: child.score,
                        };
                    }
                    alpha = alpha.max(best.score);
                }
                Role::Minimize => {
                    if child.score < best.score {
                        best = Node {
                            mv: Some(mv),
                            score: child.score,
                        };
                    }
                    beta = beta.min(best.score);
                }
            }

            if self.pruning && beta <= alpha {
                break;
            }
        }
        Ok(best)
    }
}

/// Depth-limited alpha-beta search with a cooperative deadline.
pub struct MinimaxAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl MinimaxAgent {
    pub fn new(config: AiConfig) -> Self {
        let rng = seeded_rng(config.seed);
        Self { config, rng }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }
}

impl Agent for MinimaxAgent {
    fn search(
        &mut self,
        board: &mut BoardState,
        player: Player,
        tracer: &Tracer,
    ) -> Result<Decision, SearchError> {
        if board.ended() {
            return Err(SearchError::NoLegalMoves);
        }
        let deadline = Deadline::from_millis(self.config.time_limit_ms);
        let max_depth = self
            .config
            .max_depth
            .unwrap_or_else(|| depth_for_branching(board.available_count()))
            .max(1);

        let mut search = Search {
            player,
            max_depth,
            use_heuristic: self.config.use_heuristic,
            randomize: self.config.randomize,
            pruning: self.config.pruning,
            deadline,
            rng: &mut self.rng,
            stats: SearchStats {
                max_depth,
                ..SearchStats::default()
            },
        };
        let role = Role::for_player(board, player);
        let root = search.minimax(board, i32::MIN, i32::MAX, 0, role)?;
        let mut stats = search.stats;
        stats.duration_ms = deadline.elapsed_ms();
        tracer.debug(|| format!("Evaluated {} states", stats.nodes));

        match root.mv {
            Some(mv) => Ok(Decision {
                mv,
                score: root.score,
                strategy: AiStrategy::Minimax,
                stats,
            }),
            None => fallback_decision(board, &mut self.rng, AiStrategy::Minimax, stats, tracer),
        }
    }
}
