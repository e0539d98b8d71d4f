use crate::{
    board::{Board, Color, Square},
    eval_values::PIECE_SQUARE_TABLES,
    game_outcome::GameOutcome,
};

/// Score of a checkmated position, positive when white delivered the mate
pub const MATE_VALUE: i32 = 10_000;
pub const DRAW_VALUE: i32 = 0;

impl Board {
    /// Static evaluation from white's point of view in tenths of a pawn.
    ///
    /// Finished games score `MATE_VALUE` signed for the winner or exactly `DRAW_VALUE`.
    pub fn evaluate(&self) -> i32 {
        match self.outcome {
            GameOutcome::Checkmate { .. } => self.evaluate_checkmate(),
            GameOutcome::Stalemate | GameOutcome::Draw(_) => DRAW_VALUE,
            GameOutcome::Ongoing => self.evaluate_material_and_position(),
        }
    }

    /// Sum of piece values and piece-square bonuses, ignoring whether the game is over
    pub fn evaluate_material_and_position(&self) -> i32 {
        Square::all()
            .filter_map(|square| self.piece_at(square).map(|piece| (square, piece)))
            .map(|(square, piece)| {
                let color = match piece.color {
                    Color::White => 0,
                    Color::Black => 1,
                };
                PIECE_SQUARE_TABLES[color][piece.kind.index()][square.index()]
            })
            .sum()
    }

    /// Score for the side to move having been checkmated
    pub fn evaluate_checkmate(&self) -> i32 {
        self.evaluate_checkmate_at_ply(1)
    }

    /// Checkmate score found `ply` plies below a search root. A mate delivered by the root move (ply 1) scores
    /// exactly `MATE_VALUE` and every further ply costs one point, so faster mates are preferred.
    pub fn evaluate_checkmate_at_ply(&self, ply: u8) -> i32 {
        let distance = i32::from(ply.saturating_sub(1));
        if self.white_to_move {
            -MATE_VALUE + distance
        } else {
            MATE_VALUE - distance
        }
    }
}
