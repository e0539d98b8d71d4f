//! Runs a strategy on its own thread against a copy of the board so the caller stays responsive.

use std::{
    sync::mpsc::{Receiver, TryRecvError, sync_channel},
    thread,
};

use log::{debug, error};

use crate::{
    board::Board,
    moves::Move,
    strategy::{MoveStrategy, ThinkingTrace},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SearchPoll {
    Pending,
    /// `None` when the worker had no move to offer or went away without answering
    Ready(Option<Move>),
}

/// Handle to a move being chosen on a worker thread.
///
/// The handle owns the receiving end of the worker's thinking trace as well as its result, so dropping it
/// abandons both and nothing the worker reports afterwards reaches anyone.
#[derive(Debug)]
pub struct PendingMove {
    receiver: Receiver<Option<Move>>,
    trace_receiver: Receiver<String>,
}

impl PendingMove {
    pub fn try_result(&self) -> SearchPoll {
        match self.receiver.try_recv() {
            Ok(m) => SearchPoll::Ready(m),
            Err(TryRecvError::Empty) => SearchPoll::Pending,
            Err(TryRecvError::Disconnected) => SearchPoll::Ready(None),
        }
    }

    /// Blocks until the worker answers
    pub fn wait(&self) -> Option<Move> {
        self.receiver.recv().ok().flatten()
    }

    /// Trace lines the worker has reported since the last call
    pub fn take_trace(&self) -> Vec<String> {
        self.trace_receiver.try_iter().collect()
    }

    /// Stops waiting for the result. The worker finishes on its own copy of the board and everything it still
    /// reports is dropped.
    pub fn abandon(self) {
        debug!("Abandoning pending search");
    }
}

/// Starts choosing a move for the side to move in `board`.
///
/// The worker owns a clone of the board and the strategy it was given, so nothing it does can reach the caller's
/// state except through the returned handle. Every trace line is sent before the result.
pub fn spawn_search(board: &Board, mut strategy: Box<dyn MoveStrategy>) -> PendingMove {
    let mut board = board.clone();
    let (sender, receiver) = sync_channel(1);
    let (trace, trace_receiver) = ThinkingTrace::channel();

    let spawned = thread::Builder::new().name(String::from("search")).spawn(move || {
        let chosen = strategy.choose_move(&mut board, &trace);

        if sender.send(chosen).is_err() {
            debug!("Search result discarded because nobody is waiting for it");
        }
    });

    if let Err(e) = spawned {
        error!("Failed to start search thread: {}", e);
    }

    PendingMove {
        receiver,
        trace_receiver,
    }
}

#[cfg(test)]
mod search_worker_tests {
    use std::time::Duration;

    use crate::{
        search::SearchConfig,
        strategy::{AlphaBetaStrategy, RandomStrategy},
    };

    use super::*;

    #[test]
    pub fn worker_finds_mate_without_touching_board() {
        let board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let before = board.clone();

        let pending = spawn_search(&board, Box::new(AlphaBetaStrategy::new(SearchConfig { depth: 3 })));
        let chosen = pending.wait().unwrap();

        assert_eq!("a1a8", chosen.coordinate_notation());
        assert_eq!(before, board);
    }

    #[test]
    pub fn polling_eventually_returns_move() {
        let board = Board::default();
        let pending = spawn_search(&board, Box::new(RandomStrategy::new(Some(1))));

        let chosen = loop {
            match pending.try_result() {
                SearchPoll::Pending => thread::sleep(Duration::from_millis(5)),
                SearchPoll::Ready(m) => break m,
            }
        };

        assert!(chosen.is_some_and(|m| board.is_legal(&m)));
    }

    #[test]
    pub fn trace_lines_arrive_before_result() {
        let board = Board::default();

        let pending = spawn_search(&board, Box::new(RandomStrategy::new(Some(9))));
        assert!(pending.wait().is_some());

        let lines = pending.take_trace();
        assert_eq!("AI White [Random] is thinking...", lines[1]);
        assert_eq!("-".repeat(60), lines[lines.len() - 1]);
        assert!(pending.take_trace().is_empty());
    }

    #[test]
    pub fn abandoned_search_does_not_hold_up_the_next() {
        let mut board = Board::default();

        let pending = spawn_search(&board, Box::new(AlphaBetaStrategy::new(SearchConfig { depth: 4 })));
        pending.abandon();

        let m = board.parse_coordinate_move("e2e4").unwrap();
        board.apply_move(&m);

        let next = spawn_search(&board, Box::new(RandomStrategy::new(Some(4))));
        let reply = next.wait().unwrap();
        assert_eq!(crate::board::Color::Black, reply.piece_moved().color);

        let lines = next.take_trace();
        assert!(lines.iter().all(|l| !l.contains("Alpha-Beta")));
        assert!(lines.contains(&String::from("AI Black [Random] is thinking...")));
    }

    #[test]
    pub fn no_legal_moves_reports_none() {
        let board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let pending = spawn_search(&board, Box::new(RandomStrategy::new(None)));

        assert_eq!(None, pending.wait());
    }
}
