use std::time::Instant;

use log::info;
use num_format::{Locale, ToFormattedString};

use crate::{
    board::{Board, PieceType},
    moves::Move,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerftStats {
    pub nodes: u64,
    pub captures: u64,
    pub eps: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
}

impl Board {
    /// Counts leaf positions `depth` plies ahead, logging the rate. With `divide` the count below each root move is
    /// printed on stdout.
    pub fn start_perft(&mut self, depth: u8, divide: bool) -> PerftStats {
        let start_time = Instant::now();
        let stats = if divide {
            let mut total = PerftStats::default();
            for (m, nodes) in self.perft_divide(depth) {
                println!("{} {}", m.coordinate_notation(), nodes);
                total.nodes += nodes;
            }
            println!("\n{}", total.nodes);
            total
        } else {
            self.perft(depth)
        };
        let elapsed = start_time.elapsed();

        let nps = stats.nodes as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        info!(
            "depth {depth} in {elapsed:#?}. Nodes: {}. Nodes per second: {}",
            stats.nodes.to_formatted_string(&Locale::en),
            (nps as u64).to_formatted_string(&Locale::en)
        );
        info!("{:?}", stats);

        stats
    }

    pub fn perft(&mut self, depth: u8) -> PerftStats {
        let mut stats = PerftStats::default();
        do_perft(depth, self, &mut stats);
        stats
    }

    /// Leaf count below each root move, promotions listed once per piece
    pub fn perft_divide(&mut self, depth: u8) -> Vec<(Move, u64)> {
        if depth == 0 {
            return Vec::new();
        }

        let mut result = Vec::new();
        for m in expanded_legal_moves(self) {
            let mut stats = PerftStats::default();
            self.make_move(&m);
            do_perft(depth - 1, self, &mut stats);
            self.unmake_move();
            result.push((m, stats.nodes));
        }
        result
    }
}

/// Legal moves with each promotion repeated for every piece it can become
fn expanded_legal_moves(board: &Board) -> Vec<Move> {
    let mut result = Vec::new();
    for m in board.legal_moves() {
        if m.is_pawn_promotion() {
            result.extend(PieceType::PROMOTION_CHOICES.iter().map(|kind| m.with_promotion(*kind)));
        } else {
            result.push(m);
        }
    }
    result
}

// Code referenced from https://www.chessprogramming.org/Perft
fn do_perft(draft: u8, board: &mut Board, stats: &mut PerftStats) {
    if draft == 0 {
        stats.nodes += 1;
        return;
    }

    for m in expanded_legal_moves(board) {
        if draft == 1 {
            count_perft_stats(&m, stats);
        }

        board.make_move(&m);
        if draft == 1 && board.is_in_check() {
            stats.checks += 1;
        }
        do_perft(draft - 1, board, stats);
        board.unmake_move();
    }
}

fn count_perft_stats(m: &Move, stats: &mut PerftStats) {
    if m.is_capture() {
        stats.captures += 1;

        if m.is_en_passant() {
            stats.eps += 1;
        }
    } else if m.is_castle() {
        stats.castles += 1;
    }

    if m.is_pawn_promotion() {
        stats.promotions += 1;
    }
}

#[cfg(test)]
mod perft_tests {
    use crate::STARTING_FEN;

    use super::*;

    const KIWIPETE_FEN: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    macro_rules! perft_test {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (fen, depth, expected_nodes) = $value;

                    let mut board = Board::from_fen(fen).unwrap();
                    let before = board.clone();

                    assert_eq!(expected_nodes, board.perft(depth).nodes);
                    assert_eq!(before, board);
                }
            )*
        }
    }

    // Counts from https://www.chessprogramming.org/Perft_Results
    perft_test! {
        start_depth_1: (STARTING_FEN, 1, 20),
        start_depth_2: (STARTING_FEN, 2, 400),
        start_depth_3: (STARTING_FEN, 3, 8_902),
        start_depth_4: (STARTING_FEN, 4, 197_281),
        kiwipete_depth_1: (KIWIPETE_FEN, 1, 48),
        kiwipete_depth_2: (KIWIPETE_FEN, 2, 2_039),
        kiwipete_depth_3: (KIWIPETE_FEN, 3, 97_862),
        position_3_depth_1: ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 1, 14),
        position_3_depth_2: ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 2, 191),
        position_3_depth_3: ("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 3, 2_812),
        position_4_depth_1: ("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1", 1, 6),
        position_4_depth_2: ("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1", 2, 264),
        position_4_depth_3: ("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1", 3, 9_467),
        position_5_depth_1: ("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", 1, 44),
        position_5_depth_2: ("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8", 2, 1_486),
    }

    #[test]
    pub fn kiwipete_depth_2_details() {
        let mut board = Board::from_fen(KIWIPETE_FEN).unwrap();
        let stats = board.perft(2);

        assert_eq!(351, stats.captures);
        assert_eq!(1, stats.eps);
        assert_eq!(91, stats.castles);
        assert_eq!(0, stats.promotions);
        assert_eq!(3, stats.checks);
    }

    #[test]
    pub fn divide_sums_to_total() {
        let mut board = Board::from_fen(KIWIPETE_FEN).unwrap();
        let divided = board.perft_divide(2);

        assert_eq!(48, divided.len());
        assert_eq!(2_039, divided.iter().map(|(_, nodes)| nodes).sum::<u64>());
    }

    #[test]
    pub fn promotions_expand_to_four_moves() {
        let mut board = Board::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let stats = board.perft(1);

        assert_eq!(9, stats.nodes);
        assert_eq!(4, stats.promotions);
    }
}
