use std::fmt::{Debug, Display};

use array_macro::array;

use crate::{game_outcome::GameOutcome, moves::MoveRollback, repetition_tracker::RepetitionTracker};

const OFFBOARD: u8 = 0xFF;

// little endian rank-file mapping https://www.chessprogramming.org/Square_Mapping_Considerations
/// 10x12 mailbox index of each of the 64 squares
pub(crate) static MAILBOX_64: [u8; 64] = array![i => (21 + (i / 8) * 10 + i % 8) as u8; 64];
/// Square index of each mailbox cell, `OFFBOARD` for the border
pub(crate) static MAILBOX_120: [u8; 120] = array![i => mailbox_to_square_index(i); 120];

const fn mailbox_to_square_index(mailbox_index: usize) -> u8 {
    let mailbox_rank = mailbox_index / 10;
    let mailbox_file = mailbox_index % 10;
    if mailbox_rank < 2 || mailbox_rank > 9 || mailbox_file == 0 || mailbox_file == 9 {
        OFFBOARD
    } else {
        ((mailbox_rank - 2) * 8 + mailbox_file - 1) as u8
    }
}

pub const CASTLE_WHITE_KING_FLAG: u8 = 1 << CastlingValue::WhiteKing as u8;
pub const CASTLE_WHITE_QUEEN_FLAG: u8 = 1 << CastlingValue::WhiteQueen as u8;
pub const CASTLE_BLACK_KING_FLAG: u8 = 1 << CastlingValue::BlackKing as u8;
pub const CASTLE_BLACK_QUEEN_FLAG: u8 = 1 << CastlingValue::BlackQueen as u8;
pub const CASTLE_ALL: u8 = CASTLE_WHITE_KING_FLAG | CASTLE_WHITE_QUEEN_FLAG | CASTLE_BLACK_KING_FLAG | CASTLE_BLACK_QUEEN_FLAG;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum CastlingValue {
    WhiteKing = 0,
    WhiteQueen,
    BlackKing,
    BlackQueen,
}

impl CastlingValue {
    pub fn flag(self) -> u8 {
        1 << self as u8
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::White => "White",
            Color::Black => "Black",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Pieces a pawn may become, in the order they are offered
    pub const PROMOTION_CHOICES: [PieceType; 4] =
        [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Upper case letter used in FEN and move text
    pub fn letter(self) -> char {
        match self {
            PieceType::Pawn => 'P',
            PieceType::Knight => 'N',
            PieceType::Bishop => 'B',
            PieceType::Rook => 'R',
            PieceType::Queen => 'Q',
            PieceType::King => 'K',
        }
    }

    pub fn from_letter(c: char) -> Option<PieceType> {
        match c.to_ascii_uppercase() {
            'P' => Some(PieceType::Pawn),
            'N' => Some(PieceType::Knight),
            'B' => Some(PieceType::Bishop),
            'R' => Some(PieceType::Rook),
            'Q' => Some(PieceType::Queen),
            'K' => Some(PieceType::King),
            _ => None,
        }
    }

    pub fn is_promotion_choice(self) -> bool {
        Self::PROMOTION_CHOICES.contains(&self)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceType,
}

impl Piece {
    pub const fn new(kind: PieceType, color: Color) -> Piece {
        Piece { color, kind }
    }

    pub fn to_fen_char(self) -> char {
        match self.color {
            Color::White => self.kind.letter(),
            Color::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }

    pub fn from_fen_char(c: char) -> Option<Piece> {
        let kind = PieceType::from_letter(c)?;
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        Some(Piece::new(kind, color))
    }
}

/// One of the 64 squares, indexed little endian rank-file (a1 = 0, h1 = 7, h8 = 63).
///
/// The UI-facing coordinates are `row`/`col` where row 0 is rank 8, the top of a board viewed by white.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Square(u8);

impl Square {
    pub fn new(index: u8) -> Option<Square> {
        (index < 64).then_some(Square(index))
    }

    pub(crate) const fn from_index_unchecked(index: u8) -> Square {
        Square(index)
    }

    /// file and rank are both 0 based
    pub fn from_file_rank(file: u8, rank: u8) -> Option<Square> {
        (file < 8 && rank < 8).then_some(Square(rank * 8 + file))
    }

    pub fn from_row_col(row: u8, col: u8) -> Option<Square> {
        if row > 7 {
            return None;
        }
        Square::from_file_rank(col, 7 - row)
    }

    /// Parses names like `e4`
    pub fn from_name(name: &str) -> Option<Square> {
        let bytes = name.as_bytes();
        if bytes.len() != 2 {
            return None;
        }

        match (bytes[0], bytes[1]) {
            (file @ b'a'..=b'h', rank @ b'1'..=b'8') => Square::from_file_rank(file - b'a', rank - b'1'),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn file(self) -> u8 {
        self.0 % 8
    }

    pub fn rank(self) -> u8 {
        self.0 / 8
    }

    pub fn row(self) -> u8 {
        7 - self.rank()
    }

    pub fn col(self) -> u8 {
        self.file()
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file()) as char
    }

    pub fn name(self) -> String {
        format!("{}{}", self.file_char(), self.rank() + 1)
    }

    /// Same file, other side of the board. Maps a1 to a8.
    pub fn flip_rank(self) -> Square {
        Square(self.0 ^ 0b0011_1000)
    }

    pub(crate) fn mailbox(self) -> usize {
        MAILBOX_64[self.0 as usize] as usize
    }

    pub(crate) fn from_mailbox(mailbox_index: usize) -> Option<Square> {
        match MAILBOX_120.get(mailbox_index) {
            Some(&OFFBOARD) | None => None,
            Some(&index) => Some(Square(index)),
        }
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank() + 1)
    }
}

/// Contents of one cell of the 10x12 mailbox
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) enum Cell {
    Offboard,
    Empty,
    Occupied(Piece),
}

impl Cell {
    pub(crate) fn piece(self) -> Option<Piece> {
        match self {
            Cell::Occupied(piece) => Some(piece),
            _ => None,
        }
    }
}

pub(crate) static EMPTY_MAILBOX: [Cell; 120] = array![i => if mailbox_to_square_index(i) == OFFBOARD { Cell::Offboard } else { Cell::Empty }; 120];

/// Canonical text of a position used for repetition detection.
///
/// Holds piece placement, side to move, castling rights and the en passant square when a capture
/// onto it is possible, so two boards reached by different move orders compare equal.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 8x8 grid of pieces, row 0 is rank 8
pub type Grid = [[Option<Piece>; 8]; 8];

#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    pub(crate) cells: [Cell; 120],
    pub(crate) white_to_move: bool,
    pub(crate) castling_rights: u8,
    pub(crate) en_passant_target: Option<Square>,
    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_counter: u16,
    pub(crate) rollback: MoveRollback,
    pub(crate) repetitions: RepetitionTracker,
    pub(crate) outcome: GameOutcome,
}

impl Board {
    /// Board without any pieces, white to move. Useful for setting up test positions.
    pub fn empty() -> Board {
        Board {
            cells: EMPTY_MAILBOX,
            white_to_move: true,
            castling_rights: 0,
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_counter: 1,
            rollback: MoveRollback::default(),
            repetitions: RepetitionTracker::default(),
            outcome: GameOutcome::Ongoing,
        }
    }

    pub fn starting_position() -> Board {
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        let mut board = Board::empty();
        for (file, kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            board.write_piece(Square(file), Some(Piece::new(*kind, Color::White)));
            board.write_piece(Square(8 + file), Some(Piece::new(PieceType::Pawn, Color::White)));
            board.write_piece(Square(48 + file), Some(Piece::new(PieceType::Pawn, Color::Black)));
            board.write_piece(Square(56 + file), Some(Piece::new(*kind, Color::Black)));
        }
        board.castling_rights = CASTLE_ALL;
        board.repetitions.add_start_position(board.fingerprint());

        board
    }

    pub fn from_fen(fen: &str) -> Result<Board, String> {
        if !fen.is_ascii() {
            return Err(String::from("Expected FEN to only contain ASCII characters"));
        }

        let fen_pieces: Vec<&str> = fen.split_ascii_whitespace().collect();
        if fen_pieces.len() != 6 && fen_pieces.len() != 4 {
            return Err(format!(
                "Expected FEN to have 4 or 6 space-delimited parts but it had {}",
                fen_pieces.len()
            ));
        }

        let mut board = Board::empty();

        let ranks: Vec<&str> = fen_pieces[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(format!(
                "Expected piece placement to have 8 ranks but it had {}",
                ranks.len()
            ));
        }

        for (row, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file: u8 = 0;
            for c in rank_text.chars() {
                match c {
                    '1'..='8' => {
                        file += c as u8 - b'0';
                        if file > 8 {
                            return Err(format!("Rank {} of the piece placement has more than 8 files", rank + 1));
                        }
                    }
                    _ => {
                        let Some(piece) = Piece::from_fen_char(c) else {
                            return Err(format!(
                                "Encountered unexpected character {} while processing piece placement",
                                c
                            ));
                        };
                        let Some(square) = Square::from_file_rank(file, rank) else {
                            return Err(format!("Rank {} of the piece placement has more than 8 files", rank + 1));
                        };
                        board.write_piece(square, Some(piece));
                        file += 1;
                    }
                }
            }

            if file != 8 {
                return Err(format!(
                    "Expected rank {} of the piece placement to cover 8 files but it covered {}",
                    rank + 1,
                    file
                ));
            }
        }

        board.white_to_move = match fen_pieces[1] {
            "w" => true,
            "b" => false,
            other => return Err(format!("Encountered unexpected Side to move value '{}'", other)),
        };

        if fen_pieces[2] != "-" {
            for c in fen_pieces[2].chars() {
                board.castling_rights |= match c {
                    'K' => CASTLE_WHITE_KING_FLAG,
                    'Q' => CASTLE_WHITE_QUEEN_FLAG,
                    'k' => CASTLE_BLACK_KING_FLAG,
                    'q' => CASTLE_BLACK_QUEEN_FLAG,
                    _ => {
                        return Err(format!(
                            "Encountered unexpected character {} while processing castling rights",
                            c
                        ));
                    }
                };
            }
        }

        if fen_pieces[3] != "-" {
            let Some(ep_square) = Square::from_name(fen_pieces[3]) else {
                return Err(format!(
                    "Expected en passant target square to be a square name but it was '{}'",
                    fen_pieces[3]
                ));
            };
            if ep_square.rank() != 2 && ep_square.rank() != 5 {
                return Err(format!(
                    "Expected en passant target square to be on rank 3 or 6 but it was '{}'",
                    fen_pieces[3]
                ));
            }
            board.en_passant_target = Some(ep_square);
        }

        if fen_pieces.len() == 6 {
            board.halfmove_clock = fen_pieces[4].parse::<u16>().map_err(|e| {
                format!(
                    "Encountered error while parsing halfmove counter value '{}' as u16: {}",
                    fen_pieces[4], e
                )
            })?;

            board.fullmove_counter = fen_pieces[5].parse::<u16>().map_err(|e| {
                format!(
                    "Encountered error while parsing fullmove counter value '{}' as u16: {}",
                    fen_pieces[5], e
                )
            })?;
        }

        board.repetitions.add_start_position(board.fingerprint());
        board.outcome = board.compute_outcome();

        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {}",
            self.fen_position_fields(self.en_passant_target),
            self.halfmove_clock,
            self.fullmove_counter
        )
    }

    fn fen_position_fields(&self, ep: Option<Square>) -> String {
        let mut result = String::with_capacity(72);

        for row in 0..8u8 {
            let mut empty_run = 0;
            for col in 0..8u8 {
                let square = Square((7 - row) * 8 + col);
                match self.piece_at(square) {
                    Some(piece) => {
                        if empty_run > 0 {
                            result.push((b'0' + empty_run) as char);
                            empty_run = 0;
                        }
                        result.push(piece.to_fen_char());
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                result.push((b'0' + empty_run) as char);
            }
            if row != 7 {
                result.push('/');
            }
        }

        result.push(' ');
        result.push(if self.white_to_move { 'w' } else { 'b' });
        result.push(' ');

        if self.castling_rights == 0 {
            result.push('-');
        } else {
            for (flag, c) in [
                (CASTLE_WHITE_KING_FLAG, 'K'),
                (CASTLE_WHITE_QUEEN_FLAG, 'Q'),
                (CASTLE_BLACK_KING_FLAG, 'k'),
                (CASTLE_BLACK_QUEEN_FLAG, 'q'),
            ] {
                if self.castling_rights & flag != 0 {
                    result.push(c);
                }
            }
        }

        result.push(' ');
        match ep {
            Some(square) => result.push_str(&square.name()),
            None => result.push('-'),
        }

        result
    }

    pub fn fingerprint(&self) -> Fingerprint {
        let ep = self.en_passant_target.filter(|target| self.en_passant_capture_possible(*target));
        Fingerprint(self.fen_position_fields(ep))
    }

    /// True if a pawn of the side to move stands next to the pawn that just advanced two squares
    fn en_passant_capture_possible(&self, target: Square) -> bool {
        let capturer = Piece::new(PieceType::Pawn, self.side_to_move());
        let capturer_rank = if self.white_to_move { 4 } else { 3 };
        [-1i8, 1]
            .iter()
            .filter_map(|df| Square::from_file_rank((target.file() as i8 + df) as u8, capturer_rank))
            .any(|square| self.piece_at(square) == Some(capturer))
    }

    #[inline]
    pub(crate) fn get_cell(&self, mailbox_index: usize) -> Cell {
        self.cells[mailbox_index]
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.cells[square.mailbox()].piece()
    }

    pub fn write_piece(&mut self, square: Square, piece: Option<Piece>) {
        self.cells[square.mailbox()] = match piece {
            Some(p) => Cell::Occupied(p),
            None => Cell::Empty,
        };
    }

    pub fn board_as_grid(&self) -> Grid {
        let mut grid = [[None; 8]; 8];
        for square in Square::all() {
            grid[square.row() as usize][square.col() as usize] = self.piece_at(square);
        }
        grid
    }

    pub fn king_location(&self, color: Color) -> Option<Square> {
        let king = Piece::new(PieceType::King, color);
        Square::all().find(|square| self.piece_at(*square) == Some(king))
    }

    pub fn white_to_move(&self) -> bool {
        self.white_to_move
    }

    pub fn side_to_move(&self) -> Color {
        if self.white_to_move { Color::White } else { Color::Black }
    }

    pub fn can_castle(&self, castling: CastlingValue) -> bool {
        self.castling_rights & castling.flag() != 0
    }

    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    pub fn fullmove_counter(&self) -> u16 {
        self.fullmove_counter
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::starting_position()
    }
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (row, pieces) in self.board_as_grid().iter().enumerate() {
            write!(f, "{} ", 8 - row)?;
            for piece in pieces {
                let c = piece.map_or('.', Piece::to_fen_char);
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   a b c d e f g h")?;
        write!(f, "{} to move", self.side_to_move().name())
    }
}

impl Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("fen", &self.to_fen())
            .field("castling_rights", &format_args!("{:#06b}", self.castling_rights))
            .field("plies_played", &self.rollback.len())
            .field("outcome", &self.outcome)
            .finish()?;

        write!(f, "\n{}", self)
    }
}

#[cfg(test)]
mod board_tests {
    use crate::STARTING_FEN;

    use super::*;

    #[test]
    pub fn mailbox_tables_are_inverse() {
        for square in Square::all() {
            assert_eq!(Square::from_mailbox(square.mailbox()), Some(square));
        }

        let on_board = (0..120).filter(|i| Square::from_mailbox(*i).is_some()).count();
        assert_eq!(64, on_board);
    }

    #[test]
    pub fn starting_position_matches_fen() {
        let from_fen = Board::from_fen(STARTING_FEN).unwrap();

        assert_eq!(Board::default(), from_fen);
        assert_eq!(STARTING_FEN, Board::default().to_fen());
    }

    #[test]
    pub fn fen_round_trip_keeps_all_fields() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R b Kq e3 7 23";
        let board = Board::from_fen(fen).unwrap();

        assert_eq!(fen, board.to_fen());
        assert!(!board.white_to_move());
        assert!(board.can_castle(CastlingValue::WhiteKing));
        assert!(!board.can_castle(CastlingValue::WhiteQueen));
        assert!(!board.can_castle(CastlingValue::BlackKing));
        assert!(board.can_castle(CastlingValue::BlackQueen));
        assert_eq!(Square::from_name("e3"), board.en_passant_target());
        assert_eq!(7, board.halfmove_clock());
        assert_eq!(23, board.fullmove_counter());
    }

    #[test]
    pub fn four_field_fen_defaults_clocks() {
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();

        assert_eq!(0, board.halfmove_clock());
        assert_eq!(1, board.fullmove_counter());
    }

    #[test]
    pub fn malformed_fens_are_rejected() {
        assert!(Board::from_fen("").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkz - 0 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1").is_err());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/44/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_ok());
        assert!(Board::from_fen("rnbqkbnr/pppppppp/81/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
        assert!(Board::from_fen(&format!("{}/8/8/8/8/8/8/8 w - - 0 1", "8".repeat(40))).is_err());
    }

    #[test]
    pub fn grid_row_zero_is_rank_eight() {
        let grid = Board::default().board_as_grid();

        assert_eq!(Some(Piece::new(PieceType::Rook, Color::Black)), grid[0][0]);
        assert_eq!(Some(Piece::new(PieceType::King, Color::Black)), grid[0][4]);
        assert_eq!(Some(Piece::new(PieceType::Pawn, Color::White)), grid[6][3]);
        assert_eq!(Some(Piece::new(PieceType::Queen, Color::White)), grid[7][3]);
        assert_eq!(None, grid[4][4]);
    }

    #[test]
    pub fn square_coordinates() {
        let e4 = Square::from_name("e4").unwrap();

        assert_eq!(28, e4.index());
        assert_eq!(4, e4.row());
        assert_eq!(4, e4.col());
        assert_eq!(Some(e4), Square::from_row_col(4, 4));
        assert_eq!("e4", e4.to_string());
        assert_eq!(Square::from_name("e5"), Some(e4.flip_rank()));
        assert_eq!(None, Square::from_name("i1"));
        assert_eq!(None, Square::from_row_col(8, 0));
    }

    #[test]
    pub fn king_locations() {
        let board = Board::from_fen("8/8/8/1k6/8/8/8/4K3 w - - 0 1").unwrap();

        assert_eq!(Square::from_name("e1"), board.king_location(Color::White));
        assert_eq!(Square::from_name("b5"), board.king_location(Color::Black));
        assert_eq!(None, Board::empty().king_location(Color::White));
    }

    #[test]
    pub fn fingerprint_ignores_uncapturable_en_passant_square() {
        let with_ep = Board::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1").unwrap();
        let without_ep = Board::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(with_ep.fingerprint(), without_ep.fingerprint());

        let capturable = Board::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1").unwrap();
        let not_capturable = Board::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - - 0 1").unwrap();
        assert_ne!(capturable.fingerprint(), not_capturable.fingerprint());
    }
}
