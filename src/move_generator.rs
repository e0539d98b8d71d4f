use crate::{
    board::{
        Board, CASTLE_BLACK_KING_FLAG, CASTLE_BLACK_QUEEN_FLAG, CASTLE_WHITE_KING_FLAG, CASTLE_WHITE_QUEEN_FLAG, Cell,
        Color, Piece, PieceType, Square,
    },
    moves::{
        MOVE_FLAG_CAPTURE, MOVE_FLAG_CASTLE, MOVE_FLAG_DOUBLE_PAWN, MOVE_FLAG_EP_CAPTURE, MOVE_FLAG_PROMOTION, Move,
    },
};

/// Values from https://www.chessprogramming.org/10x12_Board under TSCP
/// If the piece can slide through squares when moving
const SLIDES: [bool; 5] = [false, true, true, true, false];
#[rustfmt::skip]
/// 10x12 repr offsets for moving in each piece's valid directions
const OFFSET: [[isize; 8]; 5] = [
	[ -21, -19,-12, -8, 8, 12, 19, 21 ], /* KNIGHT */
	[ -11,  -9,  9, 11, 0,  0,  0,  0 ], /* BISHOP */
	[ -10,  -1,  1, 10, 0,  0,  0,  0 ], /* ROOK */
	[ -11, -10, -9, -1, 1,  9, 10, 11 ], /* QUEEN */
	[ -11, -10, -9, -1, 1,  9, 10, 11 ]  /* KING */
];

const WHITE_KING_START: usize = 25;
const BLACK_KING_START: usize = 95;

#[inline]
fn offset_row(kind: PieceType) -> usize {
    kind.index() - 1
}

#[inline]
fn step(index: usize, offset: isize) -> usize {
    index.wrapping_add_signed(offset)
}

impl Board {
    /// Square and occupant of a mailbox cell, `None` for the border
    #[inline]
    fn on_board(&self, mailbox_index: usize) -> Option<(Square, Option<Piece>)> {
        let square = Square::from_mailbox(mailbox_index)?;
        Some((square, self.get_cell(mailbox_index).piece()))
    }

    /// Every legal move for the side to move.
    ///
    /// Each promotion appears once with no piece chosen yet, see [`Move::promotion_piece`].
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = self.pseudo_legal_moves();
        moves.retain(|m| self.is_pseudo_legal_move_legal(m));
        moves
    }

    pub fn has_legal_moves(&self) -> bool {
        self.pseudo_legal_moves().iter().any(|m| self.is_pseudo_legal_move_legal(m))
    }

    /// True if some legal move shares the start and end squares of `m`
    pub fn is_legal(&self, m: &Move) -> bool {
        self.legal_moves().iter().any(|legal| legal.same_squares(m))
    }

    pub fn is_in_check(&self) -> bool {
        let color = self.side_to_move();
        match self.king_location(color) {
            Some(king) => is_attacked(&self.cells, king.mailbox(), color.opponent()),
            None => false,
        }
    }

    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        is_attacked(&self.cells, square.mailbox(), by)
    }

    fn is_pseudo_legal_move_legal(&self, m: &Move) -> bool {
        if m.is_castle() {
            let color = self.side_to_move();
            let from = m.from().mailbox();
            let passed = if m.is_king_side_castle() { from + 1 } else { from - 1 };

            if is_attacked(&self.cells, from, color.opponent()) || is_attacked(&self.cells, passed, color.opponent()) {
                return false;
            }
        }

        self.leaves_king_safe(m)
    }

    /// Plays the move on a copy of the cells and checks the mover's king is not attacked afterwards.
    /// A side without a king has nothing to leave in check.
    fn leaves_king_safe(&self, m: &Move) -> bool {
        let color = self.side_to_move();
        let mut cells = self.cells;
        let mover = match m.promotion_piece() {
            Some(kind) => Piece::new(kind, color),
            None => m.piece_moved(),
        };

        cells[m.from().mailbox()] = Cell::Empty;
        if m.is_en_passant() {
            cells[m.en_passant_capture_square().mailbox()] = Cell::Empty;
        }
        if m.is_castle() {
            let (rook_from, rook_to) = m.rook_castle_squares();
            cells[rook_from.mailbox()] = Cell::Empty;
            cells[rook_to.mailbox()] = Cell::Occupied(Piece::new(PieceType::Rook, color));
        }
        cells[m.to().mailbox()] = Cell::Occupied(mover);

        let king = Cell::Occupied(Piece::new(PieceType::King, color));
        match cells.iter().position(|cell| *cell == king) {
            Some(king_index) => !is_attacked(&cells, king_index, color.opponent()),
            None => true,
        }
    }

    pub(crate) fn pseudo_legal_moves(&self) -> Vec<Move> {
        let mut result = Vec::new();
        let color = self.side_to_move();
        let ep_target = self.en_passant_target.map(|square| square.mailbox());

        for from_square in Square::all() {
            let i = from_square.mailbox();
            let Some(piece) = self.get_cell(i).piece() else {
                continue;
            };
            if piece.color != color {
                continue;
            }

            if piece.kind == PieceType::Pawn {
                self.pawn_moves(from_square, piece, ep_target, &mut result);
                continue;
            }

            let row = offset_row(piece.kind);
            for offset in OFFSET[row] {
                if offset == 0 {
                    break;
                }

                let mut cur_pos = i;
                loop {
                    cur_pos = step(cur_pos, offset);
                    let Some((to, occupant)) = self.on_board(cur_pos) else {
                        break;
                    };
                    match occupant {
                        None => {
                            result.push(Move::new(from_square, to, piece, None, 0));
                        }
                        Some(target) => {
                            if target.color != color {
                                result.push(Move::new(
                                    from_square,
                                    to,
                                    piece,
                                    Some(target),
                                    MOVE_FLAG_CAPTURE,
                                ));
                            }
                            break;
                        }
                    }

                    if !SLIDES[row] {
                        break;
                    }
                }
            }

            if piece.kind == PieceType::King {
                self.castling_moves(from_square, piece, &mut result);
            }
        }

        result
    }

    fn pawn_moves(&self, from: Square, piece: Piece, ep_target: Option<usize>, result: &mut Vec<Move>) {
        let i = from.mailbox();
        let (direction_sign, start_rank, last_rank): (isize, u8, u8) = match piece.color {
            Color::White => (1, 1, 7),
            Color::Black => (-1, 6, 0),
        };

        let one_step = step(i, 10 * direction_sign);
        if let Some((to, None)) = self.on_board(one_step) {
            let flags = if to.rank() == last_rank { MOVE_FLAG_PROMOTION } else { 0 };
            result.push(Move::new(from, to, piece, None, flags));

            if from.rank() == start_rank {
                if let Some((two_steps, None)) = self.on_board(step(one_step, 10 * direction_sign)) {
                    result.push(Move::new(from, two_steps, piece, None, MOVE_FLAG_DOUBLE_PAWN));
                }
            }
        }

        for offset in [9, 11] {
            let target_pos = step(i, offset * direction_sign);
            let Some(to) = self.on_board(target_pos) else {
                continue;
            };

            match to {
                (to, Some(target)) if target.color != piece.color => {
                    let mut flags = MOVE_FLAG_CAPTURE;
                    if to.rank() == last_rank {
                        flags |= MOVE_FLAG_PROMOTION;
                    }
                    result.push(Move::new(from, to, piece, Some(target), flags));
                }
                (to, None) if ep_target == Some(target_pos) => {
                    let captured = self.get_cell(step(target_pos, -10 * direction_sign)).piece();
                    result.push(Move::new(
                        from,
                        to,
                        piece,
                        captured,
                        MOVE_FLAG_CAPTURE | MOVE_FLAG_EP_CAPTURE,
                    ));
                }
                _ => {}
            }
        }
    }

    fn castling_moves(&self, from: Square, king: Piece, result: &mut Vec<Move>) {
        let i = from.mailbox();
        let (start, king_flag, queen_flag) = match king.color {
            Color::White => (WHITE_KING_START, CASTLE_WHITE_KING_FLAG, CASTLE_WHITE_QUEEN_FLAG),
            Color::Black => (BLACK_KING_START, CASTLE_BLACK_KING_FLAG, CASTLE_BLACK_QUEEN_FLAG),
        };
        if i != start {
            return;
        }

        let friendly_rook = Cell::Occupied(Piece::new(PieceType::Rook, king.color));
        for (offset, flag) in [(1isize, king_flag), (-1, queen_flag)] {
            if self.castling_rights & flag == 0 {
                continue;
            }

            let mut cur_pos = i;
            loop {
                cur_pos = step(cur_pos, offset);
                let cell = self.get_cell(cur_pos);
                if cell == Cell::Empty {
                    continue;
                }

                let corner = if offset == 1 { start + 3 } else { start - 4 };
                if cell == friendly_rook && cur_pos == corner {
                    if let Some(to) = Square::from_mailbox(step(i, offset * 2)) {
                        result.push(Move::new(from, to, king, None, MOVE_FLAG_CASTLE));
                    }
                }
                break;
            }
        }
    }
}

/// True if any piece of color `by` attacks the mailbox cell `target`, ignoring pins
pub(crate) fn is_attacked(cells: &[Cell; 120], target: usize, by: Color) -> bool {
    let queen = Cell::Occupied(Piece::new(PieceType::Queen, by));
    let king = Cell::Occupied(Piece::new(PieceType::King, by));

    for (kind, slider) in [(PieceType::Rook, PieceType::Rook), (PieceType::Bishop, PieceType::Bishop)] {
        let slider = Cell::Occupied(Piece::new(slider, by));
        for offset in OFFSET[offset_row(kind)] {
            if offset == 0 {
                break;
            }

            let mut current_pos = target;
            let mut first = true;
            loop {
                current_pos = step(current_pos, offset);
                let cell = cells[current_pos];
                if cell != Cell::Empty {
                    if cell == queen || cell == slider || (first && cell == king) {
                        return true;
                    }
                    break;
                }
                first = false;
            }
        }
    }

    let knight = Cell::Occupied(Piece::new(PieceType::Knight, by));
    if OFFSET[offset_row(PieceType::Knight)]
        .iter()
        .any(|offset| cells[step(target, *offset)] == knight)
    {
        return true;
    }

    // Pawns of `by` sit behind the target from their own point of view
    let pawn = Cell::Occupied(Piece::new(PieceType::Pawn, by));
    let direction_sign = match by {
        Color::White => -1,
        Color::Black => 1,
    };
    [9, 11].iter().any(|offset| cells[step(target, offset * direction_sign)] == pawn)
}

#[cfg(test)]
mod move_generator_tests {
    use crate::STARTING_FEN;

    use super::*;

    fn coordinates(board: &Board) -> Vec<String> {
        let mut moves: Vec<String> = board.legal_moves().iter().map(|m| m.coordinate_notation()).collect();
        moves.sort();
        moves
    }

    #[test]
    pub fn starting_position_has_twenty_moves() {
        let board = Board::from_fen(STARTING_FEN).unwrap();
        assert_eq!(20, board.legal_moves().len());
        assert!(!board.is_in_check());
    }

    #[test]
    pub fn pinned_piece_cannot_move() {
        let board = Board::from_fen("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        assert!(board.legal_moves().iter().all(|m| m.piece_moved().kind == PieceType::King));
    }

    #[test]
    pub fn check_must_be_answered() {
        let board = Board::from_fen("4k3/8/8/8/8/8/4r3/R3K3 w - - 0 1").unwrap();
        assert!(board.is_in_check());

        assert_eq!(vec!["e1d1", "e1e2", "e1f1"], coordinates(&board));
    }

    #[test]
    pub fn cannot_castle_out_of_or_through_check() {
        let through = Board::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = coordinates(&through);
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        let out_of = Board::from_fen("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = coordinates(&out_of);
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(!moves.contains(&"e1c1".to_string()));

        // b1 may be attacked, only the king's path matters
        let rook_path = Board::from_fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        assert!(coordinates(&rook_path).contains(&"e1c1".to_string()));
    }

    #[test]
    pub fn cannot_castle_through_pieces_or_without_rights() {
        let blocked = Board::from_fen("4k3/8/8/8/8/8/8/RN2K1NR w KQ - 0 1").unwrap();
        let moves = coordinates(&blocked);
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(!moves.contains(&"e1c1".to_string()));

        let no_rights = Board::from_fen("4k3/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
        assert!(no_rights.legal_moves().iter().all(|m| !m.is_castle()));
    }

    #[test]
    pub fn promotions_are_listed_once() {
        let board = Board::from_fen("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let promotions: Vec<String> = board
            .legal_moves()
            .iter()
            .filter(|m| m.is_pawn_promotion())
            .map(|m| m.coordinate_notation())
            .collect();

        assert_eq!(vec!["a7a8q", "a7b8q"], promotions);
    }

    #[test]
    pub fn en_passant_is_generated_only_for_target() {
        let board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let ep: Vec<Move> = board.legal_moves().into_iter().filter(|m| m.is_en_passant()).collect();
        assert_eq!(1, ep.len());
        assert_eq!(Some(Piece::new(PieceType::Pawn, Color::Black)), ep[0].piece_captured());

        let stale_target = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(stale_target.legal_moves().iter().all(|m| !m.is_en_passant()));
    }

    #[test]
    pub fn en_passant_that_exposes_king_is_illegal() {
        let board = Board::from_fen("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1").unwrap();
        assert!(board.legal_moves().iter().all(|m| !m.is_en_passant()));
    }

    #[test]
    pub fn attack_detection() {
        let board = Board::from_fen(STARTING_FEN).unwrap();
        let f3 = Square::from_name("f3").unwrap();
        let e4 = Square::from_name("e4").unwrap();
        let f6 = Square::from_name("f6").unwrap();

        assert!(board.is_square_attacked(f3, Color::White));
        assert!(!board.is_square_attacked(e4, Color::White));
        assert!(board.is_square_attacked(f6, Color::Black));
        assert!(!board.is_square_attacked(f3, Color::Black));
    }

    #[test]
    pub fn position_without_king_still_generates() {
        let board = Board::from_fen("8/8/8/8/8/8/8/R7 w - - 0 1").unwrap();
        assert_eq!(14, board.legal_moves().len());
        assert!(!board.is_in_check());
    }

    #[test]
    pub fn edge_pieces_only_reach_real_squares() {
        // Pawns already on the last rank have nowhere to go
        let board = Board::from_fen("P6P/8/8/8/8/8/8/N6K w - - 0 1").unwrap();

        assert_eq!(vec!["a1b3", "a1c2", "h1g1", "h1g2", "h1h2"], coordinates(&board));
        assert!(board.legal_moves().iter().all(|m| m.to() != m.from()));
    }
}
