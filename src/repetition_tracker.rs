use std::{collections::HashMap, fmt::Debug};

use log::error;

use crate::board::Fingerprint;

/// Counts how often each position has occurred in the game.
///
/// `history` holds the fingerprint of every position in order, starting with the position the game began from,
/// so the position being left can be found again when a move is taken back.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RepetitionTracker {
    counts: HashMap<Fingerprint, u8>,
    history: Vec<Fingerprint>,
}

impl RepetitionTracker {
    /// Records the position reached by a move and returns how many times it has now occurred
    pub fn make_move(&mut self, fingerprint: Fingerprint) -> u8 {
        let count = self.counts.entry(fingerprint.clone()).or_default();
        *count = count.saturating_add(1);
        let result = *count;

        self.history.push(fingerprint);
        result
    }

    pub fn unmake_move(&mut self) {
        if self.history.len() <= 1 {
            error!(
                "RepetitionTracker unmake_move: history length is {} which cannot go lower",
                self.history.len()
            );
            return;
        }

        if let Some(fingerprint) = self.history.pop() {
            self.forget(&fingerprint);
        }
    }

    /// Starts tracking a new game from `fingerprint`
    pub fn add_start_position(&mut self, fingerprint: Fingerprint) {
        self.clear();
        self.counts.insert(fingerprint.clone(), 1);
        self.history.push(fingerprint);
    }

    pub fn count(&self, fingerprint: &Fingerprint) -> u8 {
        self.counts.get(fingerprint).copied().unwrap_or(0)
    }

    /// Occurrences of the latest position
    pub fn current_count(&self) -> u8 {
        self.history.last().map(|fingerprint| self.count(fingerprint)).unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.counts.clear();
        self.history.clear();
    }

    fn forget(&mut self, fingerprint: &Fingerprint) {
        match self.counts.get_mut(fingerprint) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.counts.remove(fingerprint);
            }
            None => error!("RepetitionTracker has no count for position {}", fingerprint.as_str()),
        }
    }
}

impl Debug for RepetitionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepetitionTracker")
            .field("positions", &self.history.len())
            .field("distinct", &self.counts.len())
            .field("current_count", &self.current_count())
            .finish()
    }
}

#[cfg(test)]
mod repetition_tracker_tests {
    use crate::board::Board;

    use super::*;

    fn knight_shuffle(board: &mut Board) {
        for text in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let m = board.parse_coordinate_move(text).unwrap();
            board.apply_move(&m);
        }
    }

    #[test]
    pub fn counts_positions_reached_again() {
        let mut board = Board::default();
        assert_eq!(1, board.repetitions.current_count());

        knight_shuffle(&mut board);
        assert_eq!(2, board.repetitions.current_count());
        assert_eq!(2, board.repetitions.count(&Board::default().fingerprint()));

        knight_shuffle(&mut board);
        assert_eq!(3, board.repetitions.current_count());
    }

    #[test]
    pub fn unmake_restores_counts() {
        let mut board = Board::default();
        let fresh = board.repetitions.clone();

        knight_shuffle(&mut board);
        for _ in 0..4 {
            board.undo_move();
        }

        assert_eq!(fresh, board.repetitions);
    }

    #[test]
    pub fn unmake_past_start_is_ignored() {
        let mut tracker = RepetitionTracker::default();
        let start = Board::default().fingerprint();
        tracker.add_start_position(start.clone());

        tracker.unmake_move();

        assert_eq!(1, tracker.count(&start));
    }

    #[test]
    pub fn make_move_returns_new_count() {
        let mut tracker = RepetitionTracker::default();
        let start = Board::default().fingerprint();
        tracker.add_start_position(start.clone());

        assert_eq!(2, tracker.make_move(start.clone()));
        assert_eq!(3, tracker.make_move(start.clone()));
        tracker.unmake_move();
        assert_eq!(2, tracker.count(&start));
    }
}
