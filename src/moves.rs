use std::{fmt::Display, sync::LazyLock};

use log::debug;
use regex::Regex;

use crate::{
    board::{
        Board, CASTLE_BLACK_KING_FLAG, CASTLE_BLACK_QUEEN_FLAG, CASTLE_WHITE_KING_FLAG, CASTLE_WHITE_QUEEN_FLAG, Color,
        Grid, Piece, PieceType, Square,
    },
    game_outcome::GameOutcome,
};

pub const MOVE_FLAG_CAPTURE: u8 = 1;
pub const MOVE_FLAG_EP_CAPTURE: u8 = 1 << 1;
pub const MOVE_FLAG_CASTLE: u8 = 1 << 2;
pub const MOVE_FLAG_PROMOTION: u8 = 1 << 3;
pub const MOVE_FLAG_DOUBLE_PAWN: u8 = 1 << 4;

/// Squares whose rook or king moving away, or being captured, removes castling rights
const CASTLING_RIGHTS_SQUARES: [(u8, u8); 6] = [
    (0, CASTLE_WHITE_QUEEN_FLAG),
    (4, CASTLE_WHITE_QUEEN_FLAG | CASTLE_WHITE_KING_FLAG),
    (7, CASTLE_WHITE_KING_FLAG),
    (56, CASTLE_BLACK_QUEEN_FLAG),
    (60, CASTLE_BLACK_QUEEN_FLAG | CASTLE_BLACK_KING_FLAG),
    (63, CASTLE_BLACK_KING_FLAG),
];

static COORDINATE_MOVE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-h][1-8])-?([a-h][1-8])=?([qrbnQRBN])?$").unwrap());

/// A single ply.
///
/// The moved and captured pieces are snapshots of the board the move was generated from.
/// Identity is the start square, the end square and, for promotions, the piece the pawn becomes
/// (an unset choice counts as a queen).
#[derive(Clone, Copy)]
pub struct Move {
    from: Square,
    to: Square,
    piece_moved: Piece,
    piece_captured: Option<Piece>,
    flags: u8,
    promotion: Option<PieceType>,
}

impl Move {
    pub(crate) fn new(from: Square, to: Square, piece_moved: Piece, piece_captured: Option<Piece>, flags: u8) -> Move {
        Move {
            from,
            to,
            piece_moved,
            piece_captured,
            flags,
            promotion: None,
        }
    }

    /// Builds the move a user described by clicking two squares, given as `(row, col)` with row 0 at rank 8.
    ///
    /// Returns `None` if either coordinate is off the board or the start square is empty. The result
    /// still has to be matched against the legal moves before it can be played.
    pub fn from_clicks(start: (usize, usize), end: (usize, usize), grid: &Grid) -> Option<Move> {
        let from = Square::from_row_col(u8::try_from(start.0).ok()?, u8::try_from(start.1).ok()?)?;
        let to = Square::from_row_col(u8::try_from(end.0).ok()?, u8::try_from(end.1).ok()?)?;
        let piece_moved = grid[start.0][start.1]?;
        let mut piece_captured = grid[end.0][end.1];
        let mut flags = 0;

        let file_distance = (from.file() as i8 - to.file() as i8).abs();
        let rank_distance = (from.rank() as i8 - to.rank() as i8).abs();
        match piece_moved.kind {
            PieceType::King if file_distance == 2 && rank_distance == 0 => flags |= MOVE_FLAG_CASTLE,
            PieceType::Pawn => {
                if file_distance == 1 && piece_captured.is_none() {
                    // Capturing the pawn beside the start square
                    piece_captured = grid[start.0][end.1];
                    flags |= MOVE_FLAG_EP_CAPTURE;
                }
                if rank_distance == 2 {
                    flags |= MOVE_FLAG_DOUBLE_PAWN;
                }
                if to.rank() == 0 || to.rank() == 7 {
                    flags |= MOVE_FLAG_PROMOTION;
                }
            }
            _ => {}
        }

        if piece_captured.is_some() {
            flags |= MOVE_FLAG_CAPTURE;
        }

        Some(Move::new(from, to, piece_moved, piece_captured, flags))
    }

    pub fn from(&self) -> Square {
        self.from
    }

    pub fn to(&self) -> Square {
        self.to
    }

    pub fn piece_moved(&self) -> Piece {
        self.piece_moved
    }

    pub fn piece_captured(&self) -> Option<Piece> {
        self.piece_captured
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn is_capture(&self) -> bool {
        self.flags & MOVE_FLAG_CAPTURE != 0
    }

    pub fn is_en_passant(&self) -> bool {
        self.flags & MOVE_FLAG_EP_CAPTURE != 0
    }

    pub fn is_castle(&self) -> bool {
        self.flags & MOVE_FLAG_CASTLE != 0
    }

    pub fn is_king_side_castle(&self) -> bool {
        self.is_castle() && self.to.file() == 6
    }

    pub fn is_pawn_promotion(&self) -> bool {
        self.flags & MOVE_FLAG_PROMOTION != 0
    }

    pub fn is_double_pawn_push(&self) -> bool {
        self.flags & MOVE_FLAG_DOUBLE_PAWN != 0
    }

    /// The promotion piece exactly as chosen, `None` until something picks one
    pub fn promotion(&self) -> Option<PieceType> {
        self.promotion
    }

    /// The piece the pawn becomes when this move is played, `None` for non-promotions
    pub fn promotion_piece(&self) -> Option<PieceType> {
        if self.is_pawn_promotion() {
            Some(self.promotion.unwrap_or(PieceType::Queen))
        } else {
            None
        }
    }

    /// Choose the promotion piece. Kings and pawns are not valid choices and are ignored.
    pub fn set_promotion(&mut self, kind: PieceType) {
        if kind.is_promotion_choice() {
            self.promotion = Some(kind);
        } else {
            debug!("Ignoring promotion choice {:?} for {}", kind, self.coordinate_notation());
        }
    }

    pub fn with_promotion(mut self, kind: PieceType) -> Move {
        self.set_promotion(kind);
        self
    }

    /// Compares only the start and end squares
    pub fn same_squares(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to
    }

    /// Long algebraic text like `e2e4` or `e7e8q`
    pub fn coordinate_notation(&self) -> String {
        let result = format!("{}{}", self.from, self.to);

        match self.promotion_piece() {
            Some(kind) => format!("{}{}", result, kind.letter().to_ascii_lowercase()),
            None => result,
        }
    }

    pub(crate) fn rook_castle_squares(&self) -> (Square, Square) {
        let rank = self.to.rank();
        if self.to.file() == 6 {
            (square(7, rank), square(5, rank))
        } else {
            (square(0, rank), square(3, rank))
        }
    }

    pub(crate) fn en_passant_capture_square(&self) -> Square {
        square(self.to.file(), self.from.rank())
    }
}

#[inline]
fn square(file: u8, rank: u8) -> Square {
    Square::from_index_unchecked(rank * 8 + file)
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.same_squares(other) && self.promotion_piece() == other.promotion_piece()
    }
}

impl Eq for Move {}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_castle() {
            return f.write_str(if self.to.file() == 6 { "O-O" } else { "O-O-O" });
        }

        let capture = if self.is_capture() { "x" } else { "" };
        match self.piece_moved.kind {
            PieceType::Pawn if self.is_capture() => write!(f, "{}x{}", self.from.file_char(), self.to),
            PieceType::Pawn => write!(f, "{}", self.to),
            kind => write!(f, "{}{}{}", kind.letter(), capture, self.to),
        }
    }
}

impl std::fmt::Debug for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Move from: {} to: {} flags: {:#07b} promotion: {:?} Pretty: {}",
            self.from,
            self.to,
            self.flags,
            self.promotion_piece(),
            self
        )
    }
}

/// What `unmake_move` needs to restore the position before a move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RollbackEntry {
    pub m: Move,
    pub castling_rights: u8,
    pub ep_target: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_counter: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveRollback {
    entries: Vec<RollbackEntry>,
}

impl MoveRollback {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn moves(&self) -> impl DoubleEndedIterator<Item = &Move> {
        self.entries.iter().map(|entry| &entry.m)
    }

    fn push(&mut self, entry: RollbackEntry) {
        self.entries.push(entry);
    }

    fn pop(&mut self) -> Option<RollbackEntry> {
        self.entries.pop()
    }
}

impl Board {
    /// Plays `requested` if a legal move with the same start and end squares exists, otherwise does nothing.
    ///
    /// The requested promotion choice is honoured, defaulting to a queen. Game over positions accept no moves.
    pub fn apply_move(&mut self, requested: &Move) {
        if self.outcome.is_game_over() {
            debug!(
                "Ignoring move {} because the game is over: {:?}",
                requested.coordinate_notation(),
                self.outcome
            );
            return;
        }

        let Some(mut chosen) = self.legal_moves().into_iter().find(|m| m.same_squares(requested)) else {
            debug!("Ignoring move {} which is not legal", requested.coordinate_notation());
            return;
        };

        if chosen.is_pawn_promotion() {
            chosen.set_promotion(requested.promotion.unwrap_or(PieceType::Queen));
        }

        self.make_move(&chosen);
        self.outcome = self.compute_outcome();
    }

    /// Takes back the last move. Does nothing if no moves have been played.
    pub fn undo_move(&mut self) {
        match self.unmake_move() {
            Some(m) => debug!("Took back {}", m.coordinate_notation()),
            None => debug!("Nothing to undo"),
        }
        self.outcome = GameOutcome::Ongoing;
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.rollback.moves().next_back()
    }

    pub fn move_history(&self) -> impl DoubleEndedIterator<Item = &Move> {
        self.rollback.moves()
    }

    pub fn plies_played(&self) -> usize {
        self.rollback.len()
    }

    /// Parses text like `e2e4` or `e7e8n` and returns the matching legal move, promotion bound.
    pub fn parse_coordinate_move(&self, text: &str) -> Option<Move> {
        let captures = COORDINATE_MOVE_PATTERN.captures(text.trim())?;
        let from = Square::from_name(&captures[1])?;
        let to = Square::from_name(&captures[2])?;
        let promotion = captures
            .get(3)
            .and_then(|c| c.as_str().chars().next())
            .and_then(PieceType::from_letter);

        let found = self
            .legal_moves()
            .into_iter()
            .find(|m| m.from() == from && m.to() == to)?;

        if found.is_pawn_promotion() {
            Some(found.with_promotion(promotion.unwrap_or(PieceType::Queen)))
        } else if promotion.is_some() {
            None
        } else {
            Some(found)
        }
    }

    /// Plays a move generated for this position without checking legality or updating the outcome.
    pub(crate) fn make_move(&mut self, m: &Move) {
        let from = m.from();
        let to = m.to();
        let color = self.side_to_move();

        self.rollback.push(RollbackEntry {
            m: *m,
            castling_rights: self.castling_rights,
            ep_target: self.en_passant_target,
            halfmove_clock: self.halfmove_clock,
            fullmove_counter: self.fullmove_counter,
        });

        if m.is_castle() {
            let (rook_from, rook_to) = m.rook_castle_squares();
            self.write_piece(from, None);
            self.write_piece(rook_from, None);
            self.write_piece(to, Some(Piece::new(PieceType::King, color)));
            self.write_piece(rook_to, Some(Piece::new(PieceType::Rook, color)));
        } else {
            if m.is_en_passant() {
                self.write_piece(m.en_passant_capture_square(), None);
            }

            let placed = match m.promotion_piece() {
                Some(kind) => Piece::new(kind, color),
                None => m.piece_moved(),
            };
            self.write_piece(from, None);
            self.write_piece(to, Some(placed));
        }

        self.en_passant_target = if m.is_double_pawn_push() {
            Some(square(from.file(), (from.rank() + to.rank()) / 2))
        } else {
            None
        };

        if self.castling_rights != 0 {
            for (corner, rights) in CASTLING_RIGHTS_SQUARES {
                if from.index() == corner as usize || to.index() == corner as usize {
                    self.castling_rights &= !rights;
                }
            }
        }

        if m.is_capture() || m.piece_moved().kind == PieceType::Pawn {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        if color == Color::Black {
            self.fullmove_counter = self.fullmove_counter.saturating_add(1);
        }
        self.white_to_move = !self.white_to_move;

        self.repetitions.make_move(self.fingerprint());
    }

    /// Restores the position before the last `make_move`, returning the move taken back
    pub(crate) fn unmake_move(&mut self) -> Option<Move> {
        let entry = self.rollback.pop()?;
        self.repetitions.unmake_move();

        self.white_to_move = !self.white_to_move;
        let color = self.side_to_move();
        let m = entry.m;

        if m.is_castle() {
            let (rook_from, rook_to) = m.rook_castle_squares();
            self.write_piece(m.to(), None);
            self.write_piece(rook_to, None);
            self.write_piece(m.from(), Some(Piece::new(PieceType::King, color)));
            self.write_piece(rook_from, Some(Piece::new(PieceType::Rook, color)));
        } else if m.is_en_passant() {
            self.write_piece(m.to(), None);
            self.write_piece(m.from(), Some(m.piece_moved()));
            self.write_piece(m.en_passant_capture_square(), m.piece_captured());
        } else {
            self.write_piece(m.to(), m.piece_captured());
            self.write_piece(m.from(), Some(m.piece_moved()));
        }

        self.castling_rights = entry.castling_rights;
        self.en_passant_target = entry.ep_target;
        self.halfmove_clock = entry.halfmove_clock;
        self.fullmove_counter = entry.fullmove_counter;

        Some(m)
    }
}
