use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
    time::SystemTime,
};

use chess_duel::{
    STARTING_FEN,
    board::Board,
    search::{DEFAULT_SEARCH_DEPTH, SearchConfig},
    session::{GameSession, Player, SessionConfig},
    strategy::StrategyKind,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, error, info};

build_info::build_info!(fn build_info);

#[derive(Parser, Debug)]
#[command(version, about = "Play chess against a random mover or a minimax engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// Also write log output to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a game in the terminal
    Play(PlayArgs),
    /// Count leaf positions to check move generation
    Perft(PerftArgs),
}

#[derive(Args, Debug, Default)]
struct PlayArgs {
    #[arg(long, value_enum, default_value_t = PlayerArg::Human)]
    white: PlayerArg,

    #[arg(long, value_enum, default_value_t = PlayerArg::AlphaBeta)]
    black: PlayerArg,

    /// Search depth in plies for the alpha-beta engine
    #[arg(long, default_value_t = DEFAULT_SEARCH_DEPTH)]
    depth: u8,

    /// Seed for the random engine
    #[arg(long)]
    seed: Option<u64>,

    /// Start from this position instead of the standard one
    #[arg(long)]
    fen: Option<String>,

    /// Stop after this many plies
    #[arg(long)]
    max_plies: Option<usize>,
}

#[derive(Args, Debug)]
struct PerftArgs {
    #[arg(long, default_value_t = 4)]
    depth: u8,

    #[arg(long)]
    fen: Option<String>,

    /// Print the count below each root move
    #[arg(long)]
    divide: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum PlayerArg {
    #[default]
    Human,
    Random,
    AlphaBeta,
}

impl From<PlayerArg> for Player {
    fn from(value: PlayerArg) -> Self {
        match value {
            PlayerArg::Human => Player::Human,
            PlayerArg::Random => Player::Engine(StrategyKind::Random),
            PlayerArg::AlphaBeta => Player::Engine(StrategyKind::AlphaBeta),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_logger(cli.log_level, cli.log_file.as_ref()) {
        eprintln!("Failed to set up logging: {e}");
        return ExitCode::FAILURE;
    }
    log_panics::init();

    let info = build_info();
    info!("{} v{}", info.crate_info.name, info.crate_info.version);

    let result = match cli.command {
        Some(Command::Perft(args)) => run_perft(args),
        Some(Command::Play(args)) => run_play(args),
        None => run_play(PlayArgs {
            black: PlayerArg::AlphaBeta,
            depth: DEFAULT_SEARCH_DEPTH,
            ..Default::default()
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logger(level: LevelFilter, log_file: Option<&PathBuf>) -> Result<(), String> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{}] [{}] {}",
                humantime::format_rfc3339(SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr());

    if let Some(path) = log_file {
        let file = fern::log_file(path).map_err(|e| format!("Could not open log file {}: {e}", path.display()))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().map_err(|e| e.to_string())
}

fn run_perft(args: PerftArgs) -> Result<(), String> {
    let mut board = Board::from_fen(args.fen.as_deref().unwrap_or(STARTING_FEN))?;
    let stats = board.start_perft(args.depth, args.divide);

    if !args.divide {
        println!("{}", stats.nodes);
    }
    Ok(())
}

fn run_play(args: PlayArgs) -> Result<(), String> {
    let mut session = GameSession::new(SessionConfig {
        white: args.white.into(),
        black: args.black.into(),
        search: SearchConfig { depth: args.depth },
        seed: args.seed,
        start_fen: args.fen,
    })?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut shown_thinking = 0;
    let mut show_board = true;

    println!("Enter moves like e2e4 or e7e8q. Type 'help' for commands.");

    loop {
        if show_board {
            println!("\n{}", session.board());
            println!("{}", session.status_text());
            show_board = false;
        }

        if args.max_plies.is_some_and(|max| session.board().plies_played() >= max) {
            info!("Stopping after {} plies", session.board().plies_played());
            break;
        }

        let game_over = session.board().is_game_over();
        if !game_over && !session.is_human_turn() && !session.is_engine_paused() {
            session.start_engine_turn();
            let played = session.wait_for_engine();
            shown_thinking = print_new_thinking(&session, shown_thinking);

            match played {
                Some(m) => println!("{} plays {}", session.board().side_to_move().opponent().name(), m),
                None => {
                    error!("Engine could not find a move");
                    break;
                }
            }
            show_board = true;
            continue;
        }

        let prompt = if game_over {
            "Game over. undo, reset or quit"
        } else if session.is_human_turn() {
            "Your move"
        } else {
            "Engine paused. go, undo, reset or quit"
        };
        print!("{prompt}> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.map_err(|e| e.to_string())?;

        match line.trim() {
            "" => {}
            "quit" | "exit" => break,
            "help" => print_help(),
            "undo" => {
                session.undo();
                show_board = true;
            }
            "reset" => {
                session.reset();
                shown_thinking = 0;
                show_board = true;
            }
            "go" => session.resume_engine(),
            "board" => show_board = true,
            "fen" => println!("{}", session.board().to_fen()),
            "log" => print_move_log(&session),
            "moves" => {
                let moves: Vec<String> = session
                    .board()
                    .legal_moves()
                    .iter()
                    .map(|m| m.coordinate_notation())
                    .collect();
                println!("{}", moves.join(" "));
            }
            text => {
                if session.play_text(text) {
                    show_board = true;
                } else {
                    println!("'{text}' is not a legal move here");
                }
            }
        }
    }

    print_move_log(&session);
    println!("{}", session.status_text());
    Ok(())
}

fn print_new_thinking(session: &GameSession, already_shown: usize) -> usize {
    let lines = session.thinking_log();
    for line in lines.iter().skip(already_shown) {
        println!("{line}");
    }
    lines.len()
}

fn print_move_log(session: &GameSession) {
    for (number, white, black) in session.move_log_rows() {
        println!("{number:>3}. {white:<8} {}", black.unwrap_or_default());
    }
}

fn print_help() {
    println!("e2e4      play a move, add q/r/b/n to choose a promotion piece");
    println!("moves     list legal moves");
    println!("undo      take back one ply, engines wait for 'go' afterwards");
    println!("go        let a paused engine move");
    println!("reset     start over");
    println!("board     show the board");
    println!("fen       show the position as FEN");
    println!("log       show the moves played");
    println!("quit      leave");
}
