use std::time::{Duration, Instant};

use log::{debug, error, info};
use num_format::{Locale, ToFormattedString};

use crate::{
    board::Board,
    evaluate::{DRAW_VALUE, MATE_VALUE},
    game_outcome::GameOutcome,
    moves::Move,
};

pub const DEFAULT_SEARCH_DEPTH: u8 = 4;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SearchConfig {
    /// Plies searched below the root, values below 1 are treated as 1
    pub depth: u8,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_SEARCH_DEPTH,
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct SearchStats {
    pub nodes: u64,
    pub leaf_nodes: u64,
    pub cutoffs: u64,
    pub depth: u8,
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub best_move: Move,
    /// From white's point of view, like [`Board::evaluate`]
    pub score: i32,
    pub stats: SearchStats,
    /// Every root move in generation order with the score the search gave it.
    /// Moves that could not beat the best move found before them may carry a bound rather than an exact score.
    pub root_scores: Vec<(Move, i32)>,
    pub elapsed: Duration,
}

impl Board {
    /// Minimax search with alpha-beta pruning to `depth` plies.
    ///
    /// White maximizes and black minimizes, so the result is chosen from the point of view of the side to move at
    /// the root. Ties keep the first move in generation order. Returns `None` if there are no legal moves.
    /// The board is restored before returning.
    pub fn best_move(&mut self, depth: u8) -> Option<SearchResult> {
        let depth = depth.max(1);
        let start_time = Instant::now();
        let mut stats = SearchStats {
            depth,
            ..Default::default()
        };

        let moves = self.legal_moves();
        if moves.is_empty() {
            error!("Tried to search on a position but found no moves. Position: {:#?}", self);
            return None;
        }

        let maximizing = self.white_to_move;
        let mut alpha = -MATE_VALUE;
        let mut beta = MATE_VALUE;
        let mut best: Option<(Move, i32)> = None;
        let mut root_scores = Vec::with_capacity(moves.len());

        for m in moves {
            self.make_move(&m);
            let score = self.alpha_beta(alpha, beta, depth - 1, 1, &mut stats);
            self.unmake_move();

            root_scores.push((m, score));

            let improves = match best {
                None => true,
                Some((_, best_score)) if maximizing => score > best_score,
                Some((_, best_score)) => score < best_score,
            };
            if improves {
                best = Some((m, score));
                if maximizing {
                    alpha = alpha.max(score);
                } else {
                    beta = beta.min(score);
                }
            }
        }

        let (best_move, score) = best?;
        let elapsed = start_time.elapsed();
        log_search_info(&best_move, score, &stats, &elapsed);

        Some(SearchResult {
            best_move,
            score,
            stats,
            root_scores,
            elapsed,
        })
    }

    pub fn best_move_with_config(&mut self, config: &SearchConfig) -> Option<SearchResult> {
        self.best_move(config.depth)
    }

    /// `ply` is the distance from the root to this node
    fn alpha_beta(&mut self, mut alpha: i32, mut beta: i32, depth: u8, ply: u8, stats: &mut SearchStats) -> i32 {
        stats.nodes += 1;

        let moves = self.legal_moves();
        match self.outcome_given(!moves.is_empty()) {
            GameOutcome::Checkmate { .. } => {
                stats.leaf_nodes += 1;
                return self.evaluate_checkmate_at_ply(ply);
            }
            GameOutcome::Stalemate | GameOutcome::Draw(_) => {
                stats.leaf_nodes += 1;
                return DRAW_VALUE;
            }
            GameOutcome::Ongoing => {}
        }

        if depth == 0 {
            stats.leaf_nodes += 1;
            return self.evaluate_material_and_position();
        }

        if self.white_to_move {
            let mut best_value = -MATE_VALUE;
            for m in moves {
                self.make_move(&m);
                let result = self.alpha_beta(alpha, beta, depth - 1, ply + 1, stats);
                self.unmake_move();

                best_value = best_value.max(result);
                alpha = alpha.max(result);
                if beta <= alpha {
                    stats.cutoffs += 1;
                    break;
                }
            }
            best_value
        } else {
            let mut best_value = MATE_VALUE;
            for m in moves {
                self.make_move(&m);
                let result = self.alpha_beta(alpha, beta, depth - 1, ply + 1, stats);
                self.unmake_move();

                best_value = best_value.min(result);
                beta = beta.min(result);
                if beta <= alpha {
                    stats.cutoffs += 1;
                    break;
                }
            }
            best_value
        }
    }
}

fn log_search_info(best_move: &Move, score: i32, stats: &SearchStats, elapsed: &Duration) {
    let nps = stats.nodes as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
    info!(
        "depth {} score {} nodes {} leaves {} cutoffs {} nps {} time {}ms best {}",
        stats.depth,
        score,
        stats.nodes.to_formatted_string(&Locale::en),
        stats.leaf_nodes.to_formatted_string(&Locale::en),
        stats.cutoffs.to_formatted_string(&Locale::en),
        (nps as u64).to_formatted_string(&Locale::en),
        elapsed.as_millis(),
        best_move.coordinate_notation()
    );
    debug!("best move {:?}", best_move);
}
