use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use super::clock::Deadline;
use super::config::{AiConfig, AiStrategy};
use super::eval::{breakdown, objective};
use super::{fallback_decision, seeded_rng, Agent, Decision, SearchError, SearchStats};
use crate::game::{BoardState, Move, Player};
use crate::trace::{TraceLevel, Tracer};

/// One-ply search: scores each reply with the static evaluation and keeps the
/// best. A random share of the moves is tried first, then the rest in board
/// order, so a deadline cuts the sweep short without biasing it toward one
/// corner of the board.
pub struct LocalSearchAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl LocalSearchAgent {
    pub fn new(config: AiConfig) -> Self {
        let rng = seeded_rng(config.seed);
        Self { config, rng }
    }

    fn candidate_order(&mut self, board: &BoardState) -> Vec<Move> {
        let mut moves = board.available_moves();
        let fraction = self.config.effective_sample_fraction();
        let amount = (((moves.len() as f64) * fraction).ceil() as usize).min(moves.len());
        let (sampled, rest) = moves.partial_shuffle(&mut self.rng, amount);
        rest.sort_unstable();
        let mut order = Vec::with_capacity(sampled.len() + rest.len());
        order.extend_from_slice(sampled);
        order.extend_from_slice(rest);
        order
    }
}

impl Agent for LocalSearchAgent {
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
        let mut stats = SearchStats {
            max_depth: 1,
            ..SearchStats::default()
        };

        let mut best: Option<(Move, i32)> = None;
        for mv in self.candidate_order(board) {
            if deadline.expired() {
                stats.timed_out = true;
                break;
            }
            board.play(mv)?;
            let score = objective(board, player, self.config.use_heuristic);
            board.revert()?;

            stats.nodes += 1;
            stats.depth_reached = 1;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((mv, score));
            }
        }
        stats.duration_ms = deadline.elapsed_ms();
        tracer.debug(|| format!("Evaluated {} states", stats.nodes));

        let Some((mv, score)) = best else {
            return fallback_decision(board, &mut self.rng, AiStrategy::LocalSearch, stats, tracer);
        };

        if tracer.enabled(TraceLevel::Verbose) {
            board.play(mv)?;
            let report = breakdown(board, player);
            board.revert()?;
            tracer.verbose(|| format!("Free squares: {}", report.free_squares));
            tracer.verbose(|| format!("Chains: {}", report.chains));
            tracer.verbose(|| format!("Loops: {}", report.loops));
        }

        Ok(Decision {
            mv,
            score,
            strategy: AiStrategy::LocalSearch,
            stats,
        })
    }
}
