use array_macro::array;

// Values are in tenths of a pawn. Tables are laid out as seen by white, a8 first.

/// Indexed with `PieceType::index`
pub const PIECE_VALUES: [i32; 6] = [10, 30, 30, 50, 90, 0];

#[rustfmt::skip]
const PAWN_SQUARE_TABLE: [i32; 64] = [
    8, 8, 8, 8, 8, 8, 8, 8,
    8, 8, 8, 8, 8, 8, 8, 8,
    5, 6, 6, 7, 7, 6, 6, 5,
    2, 3, 3, 5, 5, 3, 3, 2,
    1, 2, 3, 4, 4, 3, 2, 1,
    1, 1, 2, 3, 3, 2, 1, 1,
    1, 1, 1, 0, 0, 1, 1, 1,
    0, 0, 0, 0, 0, 0, 0, 0,
];

#[rustfmt::skip]
const KNIGHT_SQUARE_TABLE: [i32; 64] = [
    1, 1, 1, 1, 1, 1, 1, 1,
    1, 2, 2, 2, 2, 2, 2, 1,
    1, 2, 3, 3, 3, 3, 2, 1,
    1, 2, 3, 4, 4, 3, 2, 1,
    1, 2, 3, 4, 4, 3, 2, 1,
    1, 2, 3, 3, 3, 3, 2, 1,
    1, 2, 2, 2, 2, 2, 2, 1,
    1, 1, 1, 1, 1, 1, 1, 1,
];

#[rustfmt::skip]
const BISHOP_SQUARE_TABLE: [i32; 64] = [
    4, 3, 2, 1, 1, 2, 3, 4,
    3, 4, 3, 2, 2, 3, 4, 3,
    2, 3, 4, 3, 3, 4, 3, 2,
    1, 2, 3, 4, 4, 3, 2, 1,
    1, 2, 3, 4, 4, 3, 2, 1,
    2, 3, 4, 3, 3, 4, 3, 2,
    3, 4, 3, 2, 2, 3, 4, 3,
    4, 3, 2, 1, 1, 2, 3, 4,
];

#[rustfmt::skip]
const ROOK_SQUARE_TABLE: [i32; 64] = [
    4, 3, 4, 4, 4, 4, 3, 4,
    4, 4, 4, 4, 4, 4, 4, 4,
    1, 1, 2, 3, 3, 2, 1, 1,
    1, 2, 3, 4, 4, 3, 2, 1,
    1, 2, 3, 4, 4, 3, 2, 1,
    1, 1, 2, 2, 2, 2, 1, 1,
    4, 4, 4, 4, 4, 4, 4, 4,
    4, 3, 2, 1, 1, 2, 3, 4,
];

#[rustfmt::skip]
const QUEEN_SQUARE_TABLE: [i32; 64] = [
    1, 1, 1, 3, 1, 1, 1, 1,
    1, 2, 3, 3, 3, 1, 1, 1,
    1, 4, 3, 3, 3, 4, 2, 1,
    1, 2, 3, 3, 3, 2, 2, 1,
    1, 2, 3, 3, 3, 2, 2, 1,
    1, 4, 3, 3, 3, 4, 2, 1,
    1, 1, 2, 3, 3, 1, 1, 1,
    1, 1, 1, 3, 1, 1, 1, 1,
];

// Kings are only scored through checkmate
const KING_SQUARE_TABLE: [i32; 64] = [0; 64];

const ALL_PIECE_SQUARE_TABLES: [[i32; 64]; 6] = [
    PAWN_SQUARE_TABLE,
    KNIGHT_SQUARE_TABLE,
    BISHOP_SQUARE_TABLE,
    ROOK_SQUARE_TABLE,
    QUEEN_SQUARE_TABLE,
    KING_SQUARE_TABLE,
];

/// Material plus placement for every piece on every square, indexed `[color][piece][square]`
pub static PIECE_SQUARE_TABLES: [[[i32; 64]; 6]; 2] = [
    // vertically flip each table for white
    array![x => array![y => PIECE_VALUES[x] + ALL_PIECE_SQUARE_TABLES[x][y ^ 0b00111000]; 64]; 6],
    // Evaluate from white's perspective so negate each score for black
    array![x => array![y => -(PIECE_VALUES[x] + ALL_PIECE_SQUARE_TABLES[x][y]); 64]; 6],
];
