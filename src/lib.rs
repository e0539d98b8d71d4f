//! Chess rules engine and alpha-beta player.
//!
//! The [`board::Board`] owns the position, generates legal moves and applies/undoes them.
//! [`search`] and [`evaluate`] pick moves for an engine player, [`strategy`] wraps them
//! behind a common interface, and [`search_worker`] runs a strategy on its own thread
//! against a copy of the board.

pub mod board;
pub mod eval_values;
pub mod evaluate;
pub mod game_outcome;
pub mod move_generator;
pub mod moves;
pub mod perft;
pub mod repetition_tracker;
pub mod search;
pub mod search_worker;
pub mod session;
pub mod strategy;

pub static STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
