use crate::board::{Board, Color, PieceType, Square};

const SEVENTY_FIVE_MOVE_HALFMOVES: u16 = 150;
const FIVEFOLD_REPETITION: u8 = 5;
const THREEFOLD_REPETITION: u8 = 3;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DrawReason {
    InsufficientMaterial,
    SeventyFiveMoveRule,
    FivefoldRepetition,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
pub enum GameOutcome {
    #[default]
    Ongoing,
    Checkmate {
        winner: Color,
    },
    Stalemate,
    Draw(DrawReason),
}

impl GameOutcome {
    pub fn is_game_over(self) -> bool {
        self != GameOutcome::Ongoing
    }

    /// Text shown to players when the game ends
    pub fn describe(self) -> String {
        match self {
            GameOutcome::Ongoing => String::from("Game in progress"),
            GameOutcome::Checkmate { winner } => format!("{} wins by checkmate", winner.name()),
            GameOutcome::Stalemate => String::from("Stalemate"),
            GameOutcome::Draw(DrawReason::InsufficientMaterial) => String::from("Draw due to insufficient material"),
            GameOutcome::Draw(DrawReason::SeventyFiveMoveRule) => String::from("Draw due to the 75-move rule"),
            GameOutcome::Draw(DrawReason::FivefoldRepetition) => String::from("Draw due to repetition"),
        }
    }
}

impl Board {
    pub fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    pub fn is_checkmate(&self) -> bool {
        matches!(self.outcome, GameOutcome::Checkmate { .. })
    }

    /// True for stalemate and every other drawn ending
    pub fn is_stalemate(&self) -> bool {
        matches!(self.outcome, GameOutcome::Stalemate | GameOutcome::Draw(_))
    }

    /// True only for draws other than stalemate
    pub fn is_draw(&self) -> bool {
        matches!(self.outcome, GameOutcome::Draw(_))
    }

    pub fn is_game_over(&self) -> bool {
        self.outcome.is_game_over()
    }

    pub fn compute_outcome(&self) -> GameOutcome {
        self.outcome_given(self.has_legal_moves())
    }

    /// Classifies the position when the caller already knows whether the side to move has a legal move
    pub(crate) fn outcome_given(&self, has_moves: bool) -> GameOutcome {
        if !has_moves {
            return if self.is_in_check() {
                GameOutcome::Checkmate {
                    winner: self.side_to_move().opponent(),
                }
            } else {
                GameOutcome::Stalemate
            };
        }

        if self.is_insufficient_material() {
            GameOutcome::Draw(DrawReason::InsufficientMaterial)
        } else if self.halfmove_clock >= SEVENTY_FIVE_MOVE_HALFMOVES {
            GameOutcome::Draw(DrawReason::SeventyFiveMoveRule)
        } else if self.repetition_count() >= FIVEFOLD_REPETITION {
            GameOutcome::Draw(DrawReason::FivefoldRepetition)
        } else {
            GameOutcome::Ongoing
        }
    }

    /// Neither side can possibly deliver checkmate
    pub fn is_insufficient_material(&self) -> bool {
        self.has_insufficient_material(Color::White) && self.has_insufficient_material(Color::Black)
    }

    fn has_insufficient_material(&self, color: Color) -> bool {
        let mut own = [0u8; 6];
        let mut opponent_non_royal = 0;
        let mut pawns_or_knights = 0;
        let mut bishops_on_light = false;
        let mut bishops_on_dark = false;

        for square in Square::all() {
            let Some(piece) = self.piece_at(square) else {
                continue;
            };

            if piece.color == color {
                own[piece.kind.index()] += 1;
            } else if piece.kind != PieceType::King && piece.kind != PieceType::Queen {
                opponent_non_royal += 1;
            }

            match piece.kind {
                PieceType::Pawn | PieceType::Knight => pawns_or_knights += 1,
                PieceType::Bishop if (square.file() + square.rank()) % 2 == 0 => bishops_on_dark = true,
                PieceType::Bishop => bishops_on_light = true,
                _ => {}
            }
        }

        let count = |kind: PieceType| own[kind.index()];
        if count(PieceType::Pawn) + count(PieceType::Rook) + count(PieceType::Queen) > 0 {
            return false;
        }

        if count(PieceType::Knight) > 0 {
            let total: u8 = own.iter().sum();
            return total <= 2 && opponent_non_royal == 0;
        }

        if count(PieceType::Bishop) > 0 {
            return !(bishops_on_dark && bishops_on_light) && pawns_or_knights == 0;
        }

        true
    }

    /// How many times the current position has occurred, including now
    pub fn repetition_count(&self) -> u8 {
        self.repetitions.current_count()
    }

    pub fn is_threefold_repetition(&self) -> bool {
        self.repetition_count() >= THREEFOLD_REPETITION
    }
}

#[cfg(test)]
mod game_outcome_tests {
    use super::*;

    macro_rules! insufficient_material_test {
        ($($name:ident: $fen:expr, $expected:expr,)*) => {
            $(
                #[test]
                pub fn $name() {
                    let board = Board::from_fen($fen).unwrap();
                    assert_eq!($expected, board.is_insufficient_material(), "{}", $fen);
                }
            )*
        }
    }

    insufficient_material_test! {
        bare_kings: "4k3/8/8/8/8/8/8/4K3 w - - 0 1", true,
        king_and_knight: "4k3/8/8/8/8/8/8/4KN2 w - - 0 1", true,
        king_and_bishop: "4k3/8/8/8/8/8/8/4KB2 w - - 0 1", true,
        same_coloured_bishops: "4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1", true,
        opposite_coloured_bishops: "4k1b1/8/8/8/8/8/8/2B1K3 w - - 0 1", false,
        two_knights: "4k3/8/8/8/8/8/8/3NKN2 w - - 0 1", false,
        knight_against_rook: "4k2r/8/8/8/8/8/8/4KN2 w - - 0 1", false,
        knight_against_knight: "4kn2/8/8/8/8/8/8/4KN2 w - - 0 1", false,
        lone_pawn: "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1", false,
        lone_rook: "4k3/8/8/8/8/8/8/R3K3 w - - 0 1", false,
    }

    #[test]
    pub fn fools_mate_is_checkmate() {
        let mut board = Board::default();
        for text in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            let m = board.parse_coordinate_move(text).unwrap();
            board.apply_move(&m);
        }

        assert!(board.is_checkmate());
        assert!(!board.is_stalemate());
        assert!(board.is_game_over());
        assert_eq!(GameOutcome::Checkmate { winner: Color::Black }, board.outcome());
        assert_eq!("Black wins by checkmate", board.outcome().describe());
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    pub fn stalemate_is_not_checkmate() {
        let board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();

        assert!(board.is_stalemate());
        assert!(!board.is_checkmate());
        assert!(!board.is_draw());
        assert_eq!("Stalemate", board.outcome().describe());
    }

    #[test]
    pub fn seventy_five_move_rule() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 150 120").unwrap();
        assert_eq!(GameOutcome::Draw(DrawReason::SeventyFiveMoveRule), board.outcome());
        assert!(board.is_stalemate());
        assert!(board.is_draw());

        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 149 120").unwrap();
        assert_eq!(GameOutcome::Ongoing, board.outcome());
    }

    #[test]
    pub fn checkmate_beats_seventy_five_move_rule() {
        let board = Board::from_fen("R3k3/8/4K3/8/8/8/8/8 b - - 160 120").unwrap();
        assert_eq!(GameOutcome::Checkmate { winner: Color::White }, board.outcome());
    }

    #[test]
    pub fn fivefold_repetition_ends_the_game() {
        let mut board = Board::default();

        for round in 1..=4 {
            for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                let m = board.parse_coordinate_move(text).unwrap();
                board.apply_move(&m);
            }
            assert_eq!(round + 1, board.repetition_count());
            assert_eq!(round >= 2, board.is_threefold_repetition());
        }

        assert_eq!(GameOutcome::Draw(DrawReason::FivefoldRepetition), board.outcome());
        assert_eq!("Draw due to repetition", board.outcome().describe());

        let before = board.clone();
        let m = Board::default().parse_coordinate_move("e2e4").unwrap();
        board.apply_move(&m);
        assert_eq!(before, board);

        board.undo_move();
        assert_eq!(GameOutcome::Ongoing, board.outcome());
    }

    #[test]
    pub fn insufficient_material_is_reported_as_draw() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4KB2 w - - 0 1").unwrap();
        assert_eq!(GameOutcome::Draw(DrawReason::InsufficientMaterial), board.outcome());
        assert!(board.is_stalemate());
    }
}
