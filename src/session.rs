//! A game between two players, each a human or an engine strategy.
//!
//! The session owns the primary board and the display state around it: the log of played moves and the lines the
//! engines reported while thinking. Engine turns run on a worker thread against a copy of the board.

use log::{debug, info, warn};

use crate::{
    board::{Board, Color, PieceType},
    moves::Move,
    search::SearchConfig,
    search_worker::{PendingMove, SearchPoll, spawn_search},
    strategy::{MoveStrategy, RandomStrategy, StrategyKind, ThinkingTrace, strategy_for},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Player {
    Human,
    Engine(StrategyKind),
}

impl Player {
    pub fn label(self) -> &'static str {
        match self {
            Player::Human => "Human",
            Player::Engine(kind) => kind.label(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub white: Player,
    pub black: Player,
    pub search: SearchConfig,
    /// Seed for random strategies, each search derives its own stream from it and the ply it is played at
    pub seed: Option<u64>,
    /// Position to start from instead of the standard one
    pub start_fen: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            white: Player::Human,
            black: Player::Engine(StrategyKind::AlphaBeta),
            search: SearchConfig::default(),
            seed: None,
            start_fen: None,
        }
    }
}

/// One row of the move list: move number, white's move and black's reply if played
pub type MoveLogRow = (usize, String, Option<String>);

pub struct GameSession {
    config: SessionConfig,
    start: Board,
    board: Board,
    fallback: RandomStrategy,
    move_log: Vec<String>,
    thinking_log: Vec<String>,
    pending: Option<PendingMove>,
    engine_paused: bool,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> Result<GameSession, String> {
        let start = match &config.start_fen {
            Some(fen) => Board::from_fen(fen)?,
            None => Board::starting_position(),
        };

        info!(
            "New game: White {} vs Black {}, search depth {}",
            config.white.label(),
            config.black.label(),
            config.search.depth
        );

        Ok(GameSession {
            fallback: RandomStrategy::new(config.seed),
            board: start.clone(),
            start,
            move_log: Vec::new(),
            thinking_log: Vec::new(),
            pending: None,
            engine_paused: false,
            config,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn player(&self, color: Color) -> Player {
        match color {
            Color::White => self.config.white,
            Color::Black => self.config.black,
        }
    }

    pub fn player_to_move(&self) -> Player {
        self.player(self.board.side_to_move())
    }

    pub fn is_human_turn(&self) -> bool {
        self.player_to_move() == Player::Human
    }

    pub fn is_engine_thinking(&self) -> bool {
        self.pending.is_some()
    }

    /// Engines stay paused after an undo until a move is played or [`GameSession::resume_engine`] is called
    pub fn is_engine_paused(&self) -> bool {
        self.engine_paused
    }

    pub fn resume_engine(&mut self) {
        self.engine_paused = false;
    }

    pub fn move_log(&self) -> &[String] {
        &self.move_log
    }

    pub fn move_log_rows(&self) -> Vec<MoveLogRow> {
        self.move_log
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| (i + 1, pair[0].clone(), pair.get(1).cloned()))
            .collect()
    }

    pub fn thinking_log(&self) -> &[String] {
        &self.thinking_log
    }

    /// Moves the lines the running search has reported so far into the thinking log and returns how many arrived.
    /// Searches that were abandoned never report here.
    pub fn drain_trace(&mut self) -> usize {
        let Some(pending) = &self.pending else {
            return 0;
        };

        let lines = pending.take_trace();
        let count = lines.len();
        self.thinking_log.extend(lines);
        count
    }

    /// Plays a human move written like `e2e4` or `e7e8n`. Returns false if it is not a legal move right now.
    pub fn play_text(&mut self, text: &str) -> bool {
        if !self.accepts_human_move() {
            return false;
        }

        match self.board.parse_coordinate_move(text) {
            Some(m) => self.play(&m),
            None => {
                debug!("Rejected move text '{}'", text);
                false
            }
        }
    }

    /// Plays a human move given by the `(row, col)` squares clicked, row 0 being rank 8
    pub fn play_clicks(&mut self, start: (usize, usize), end: (usize, usize), promotion: Option<PieceType>) -> bool {
        if !self.accepts_human_move() {
            return false;
        }

        let Some(candidate) = Move::from_clicks(start, end, &self.board.board_as_grid()) else {
            return false;
        };
        let Some(mut m) = self.board.legal_moves().into_iter().find(|legal| *legal == candidate) else {
            debug!("Rejected clicked move {}", candidate.coordinate_notation());
            return false;
        };

        if let Some(kind) = promotion {
            m.set_promotion(kind);
        }
        self.play(&m)
    }

    /// Starts the engine thinking if it is an engine's turn. Returns true if a search is running afterwards.
    pub fn start_engine_turn(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }
        if self.board.is_game_over() || self.engine_paused {
            return false;
        }

        let Player::Engine(kind) = self.player_to_move() else {
            return false;
        };

        // A fresh strategy per search, seeded by the ply so a seeded game replays the same way
        let seed = self.config.seed.map(|seed| seed.wrapping_add(self.board.plies_played() as u64));
        let strategy = strategy_for(kind, self.config.search, seed);
        self.pending = Some(spawn_search(&self.board, strategy));
        true
    }

    /// Checks on a running engine search and plays its move once it is ready
    pub fn poll_engine(&mut self) -> Option<Move> {
        self.drain_trace();

        let answer = match self.pending.as_ref()?.try_result() {
            SearchPoll::Pending => return None,
            SearchPoll::Ready(answer) => answer,
        };
        // Every trace line was sent before the result
        self.drain_trace();
        self.pending = None;
        self.finish_engine_turn(answer)
    }

    /// Blocks until the running engine search answers and plays its move
    pub fn wait_for_engine(&mut self) -> Option<Move> {
        let answer = self.pending.as_ref()?.wait();
        self.drain_trace();
        self.pending = None;
        self.finish_engine_turn(answer)
    }

    /// Takes back one ply. A running search is abandoned and engines pause.
    pub fn undo(&mut self) {
        self.abandon_search();
        if self.board.plies_played() == 0 {
            return;
        }

        self.board.undo_move();
        self.move_log.pop();
        self.engine_paused = true;
    }

    /// Back to the starting position with empty logs
    pub fn reset(&mut self) {
        self.abandon_search();
        self.board = self.start.clone();
        self.move_log.clear();
        self.thinking_log.clear();
        self.engine_paused = false;
    }

    pub fn status_text(&self) -> String {
        if self.board.is_game_over() {
            return self.board.outcome().describe();
        }

        let side = self.board.side_to_move();
        let mut text = format!("{} ({}) to move", side.name(), self.player(side).label());
        if self.board.is_in_check() {
            text.push_str(", in check");
        }
        if self.board.is_threefold_repetition() {
            text.push_str(&format!(", position repeated {} times", self.board.repetition_count()));
        }
        text
    }

    fn accepts_human_move(&self) -> bool {
        self.is_human_turn() && self.pending.is_none() && !self.board.is_game_over()
    }

    fn finish_engine_turn(&mut self, answer: Option<Move>) -> Option<Move> {
        let m = match answer {
            Some(m) => m,
            None if self.board.is_game_over() => return None,
            None => {
                warn!("Engine returned no move, falling back to a random one");
                let (trace, receiver) = ThinkingTrace::channel();
                let chosen = self.fallback.choose_move(&mut self.board, &trace);
                self.thinking_log.extend(receiver.try_iter());
                chosen?
            }
        };

        self.play(&m).then_some(m)
    }

    fn play(&mut self, m: &Move) -> bool {
        let before = self.board.plies_played();
        self.board.apply_move(m);
        if self.board.plies_played() == before {
            return false;
        }

        if let Some(played) = self.board.last_move() {
            info!("{} played {}", played.piece_moved().color.name(), played);
            self.move_log.push(played.to_string());
        }
        self.engine_paused = false;

        if self.board.is_game_over() {
            info!("{}", self.board.outcome().describe());
        }
        true
    }

    fn abandon_search(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abandon();
        }
    }
}
