//! Move selection policies an engine-controlled side can use.
//!
//! Both policies report what they are doing as plain text lines on a [`ThinkingTrace`]. The trace is only for display
//! and never influences which move is picked.

use std::{
    fmt::Display,
    sync::mpsc::{self, Receiver, Sender},
};

use log::{debug, error};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    board::{Board, PieceType},
    moves::Move,
    search::SearchConfig,
};

const TRACE_SEPARATOR_WIDTH: usize = 60;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum StrategyKind {
    Random,
    AlphaBeta,
}

impl StrategyKind {
    pub fn label(self) -> &'static str {
        match self {
            StrategyKind::Random => "Random",
            StrategyKind::AlphaBeta => "Alpha-Beta",
        }
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Append-only sink for human readable reasoning lines
#[derive(Clone, Debug, Default)]
pub struct ThinkingTrace {
    sender: Option<Sender<String>>,
}

impl ThinkingTrace {
    pub fn new(sender: Sender<String>) -> ThinkingTrace {
        ThinkingTrace { sender: Some(sender) }
    }

    /// A trace that only logs
    pub fn disabled() -> ThinkingTrace {
        ThinkingTrace::default()
    }

    pub fn channel() -> (ThinkingTrace, Receiver<String>) {
        let (sender, receiver) = mpsc::channel();
        (ThinkingTrace::new(sender), receiver)
    }

    pub fn emit(&self, line: impl Into<String>) {
        let line = line.into();
        debug!("{}", line);

        if let Some(sender) = &self.sender {
            // The reader going away only means nobody is watching anymore
            let _ = sender.send(line);
        }
    }

    fn separator(&self) {
        self.emit("-".repeat(TRACE_SEPARATOR_WIDTH));
    }
}

pub trait MoveStrategy: Send {
    fn kind(&self) -> StrategyKind;

    /// Picks a move for the side to move, `None` if it has no legal move.
    /// The board is left as it was given.
    fn choose_move(&mut self, board: &mut Board, trace: &ThinkingTrace) -> Option<Move>;
}

/// Uniformly random legal move with a uniformly random promotion piece
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    /// A fixed seed makes the sequence of choices repeatable
    pub fn new(seed: Option<u64>) -> RandomStrategy {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RandomStrategy { rng }
    }
}

impl MoveStrategy for RandomStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Random
    }

    fn choose_move(&mut self, board: &mut Board, trace: &ThinkingTrace) -> Option<Move> {
        let moves = board.legal_moves();
        if moves.is_empty() {
            error!("Random strategy was asked to move in a position with no legal moves");
            return None;
        }

        let index = self.rng.gen_range(0..moves.len());
        let mut selected = moves[index];

        trace.separator();
        trace.emit(format!(
            "AI {} [{}] is thinking...",
            board.side_to_move().name(),
            self.kind().label()
        ));
        trace.emit(format!("Possible moves: [{}]", join_moves(&moves)));
        trace.emit(format!("Selected move of index [{}] -> {}", index, selected));

        if selected.is_pawn_promotion() {
            let piece = *PieceType::PROMOTION_CHOICES.choose(&mut self.rng)?;
            selected.set_promotion(piece);
            trace.emit(format!("Selected promotion piece -> {}", piece.letter()));
        }
        trace.separator();

        Some(selected)
    }
}

/// Minimax search with alpha-beta pruning, promotions left to the default piece
pub struct AlphaBetaStrategy {
    config: SearchConfig,
}

impl AlphaBetaStrategy {
    pub fn new(config: SearchConfig) -> AlphaBetaStrategy {
        AlphaBetaStrategy { config }
    }
}

impl MoveStrategy for AlphaBetaStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::AlphaBeta
    }

    fn choose_move(&mut self, board: &mut Board, trace: &ThinkingTrace) -> Option<Move> {
        let move_count = board.legal_moves().len();

        trace.separator();
        trace.emit(format!(
            "AI {} [{}] is analyzing...",
            board.side_to_move().name(),
            self.kind().label()
        ));
        trace.emit(format!(
            "Analyzing {} possible moves at depth {}",
            move_count,
            self.config.depth.max(1)
        ));

        let Some(result) = board.best_move_with_config(&self.config) else {
            trace.emit("No legal moves to analyze");
            trace.separator();
            return None;
        };

        for (m, score) in &result.root_scores {
            trace.emit(format!("Move {}: Score = {}", m, format_score(*score)));
        }
        trace.emit(format!(
            "Best move selected: {} (Score: {})",
            result.best_move,
            format_score(result.score)
        ));
        trace.separator();

        Some(result.best_move)
    }
}

pub fn strategy_for(kind: StrategyKind, config: SearchConfig, seed: Option<u64>) -> Box<dyn MoveStrategy> {
    match kind {
        StrategyKind::Random => Box::new(RandomStrategy::new(seed)),
        StrategyKind::AlphaBeta => Box::new(AlphaBetaStrategy::new(config)),
    }
}

/// Scores are kept in tenths of a pawn, show them in pawns
fn format_score(score: i32) -> String {
    format!("{:.1}", score as f64 / 10.0)
}

fn join_moves(moves: &[Move]) -> String {
    moves.iter().map(|m| m.to_string()).collect::<Vec<String>>().join(", ")
}

#[cfg(test)]
mod strategy_tests {
    use crate::{STARTING_FEN, evaluate::MATE_VALUE};

    use super::*;

    #[test]
    pub fn seeded_random_is_repeatable() {
        let mut board = Board::from_fen(STARTING_FEN).unwrap();
        let trace = ThinkingTrace::disabled();

        let mut a = RandomStrategy::new(Some(42));
        let mut b = RandomStrategy::new(Some(42));
        for _ in 0..10 {
            let picked = a.choose_move(&mut board, &trace).unwrap();
            assert_eq!(picked, b.choose_move(&mut board, &trace).unwrap());
            assert!(board.legal_moves().iter().any(|m| m.same_squares(&picked)));
        }
    }

    #[test]
    pub fn random_playout_stays_legal() {
        let mut board = Board::from_fen(STARTING_FEN).unwrap();
        let mut strategy = RandomStrategy::new(Some(7));
        let trace = ThinkingTrace::disabled();

        for _ in 0..200 {
            if board.is_game_over() {
                break;
            }

            let before = board.plies_played();
            let m = strategy.choose_move(&mut board, &trace).unwrap();
            board.apply_move(&m);
            assert_eq!(before + 1, board.plies_played());
        }
    }

    #[test]
    pub fn random_promotion_picks_a_piece() {
        let mut board = Board::from_fen("4k3/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let (trace, receiver) = ThinkingTrace::channel();

        let mut strategy = RandomStrategy::new(Some(3));
        let mut seen_promotion = false;
        for _ in 0..100 {
            let m = strategy.choose_move(&mut board, &trace).unwrap();
            if m.is_pawn_promotion() {
                seen_promotion = true;
                assert!(m.promotion().is_some_and(|p| p.is_promotion_choice()));
            }
        }
        drop(trace);

        let lines: Vec<String> = receiver.iter().collect();
        assert!(seen_promotion);
        assert!(lines.iter().any(|l| l.starts_with("Selected promotion piece -> ")));
        assert!(lines.iter().any(|l| l == "AI White [Random] is thinking..."));
    }

    #[test]
    pub fn alpha_beta_trace_lists_every_root_move() {
        let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let move_count = board.legal_moves().len();
        let (trace, receiver) = ThinkingTrace::channel();

        let mut strategy = AlphaBetaStrategy::new(SearchConfig { depth: 2 });
        let chosen = strategy.choose_move(&mut board, &trace).unwrap();
        drop(trace);

        let lines: Vec<String> = receiver.iter().collect();
        assert_eq!("a1a8", chosen.coordinate_notation());
        assert_eq!("-".repeat(60), lines[0]);
        assert_eq!("AI White [Alpha-Beta] is analyzing...", lines[1]);
        assert_eq!(format!("Analyzing {move_count} possible moves at depth 2"), lines[2]);
        assert_eq!(move_count, lines.iter().filter(|l| l.starts_with("Move ")).count());
        assert!(lines.contains(&format!("Best move selected: Ra8 (Score: {})", format_score(MATE_VALUE))));
        assert_eq!("-".repeat(60), lines[lines.len() - 1]);
    }

    #[test]
    pub fn trace_does_not_change_choice() {
        let mut board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        let (trace, _receiver) = ThinkingTrace::channel();

        let mut strategy = strategy_for(StrategyKind::AlphaBeta, SearchConfig { depth: 2 }, None);
        let traced = strategy.choose_move(&mut board, &trace);
        let silent = strategy.choose_move(&mut board, &ThinkingTrace::disabled());

        assert_eq!(traced, silent);
    }

    #[test]
    pub fn no_moves_gives_none() {
        let mut board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let trace = ThinkingTrace::disabled();

        assert!(RandomStrategy::new(None).choose_move(&mut board, &trace).is_none());
        assert!(AlphaBetaStrategy::new(SearchConfig::default()).choose_move(&mut board, &trace).is_none());
    }
}
