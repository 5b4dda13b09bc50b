/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use anyhow::{bail, Context, Result};
use uci_parser::{UciCommand, UciOption, UciParseError, UciResponse};

use crate::{
    perft, splitperft, EngineCommand, Evaluator, Game, Move, Search, SearchConfig, SearchResult,
    TTable,
};

/// The rampart chess engine.
///
/// Two threads of control cooperate here: the input thread reads commands
/// from stdin, and the event loop executes them. Searches run on a third,
/// short-lived thread that exclusively owns a copy of the [`Game`] and holds
/// the transposition table lock for its duration. The two communicate through
/// the `is_searching` flag, which the reader clears to request cancellation
/// and the worker clears when it exits.
pub struct Engine {
    /// The current state of the chess board, as known to the engine.
    ///
    /// Modified whenever moves are played or new positions are given, and
    /// reset whenever the engine is told to start a new game.
    game: Game,

    /// One half of a channel, responsible for sending commands to the engine.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands to execute.
    receiver: Receiver<EngineCommand>,

    /// Atomic flag to determine whether a search is currently running.
    is_searching: Arc<AtomicBool>,

    /// Handle to the currently-running search thread, if one exists.
    search_thread: Option<JoinHandle<SearchResult>>,

    /// Transposition table, owned by the search thread while searching.
    ttable: Arc<Mutex<TTable>>,

    /// Whether to display extra information during execution.
    debug: bool,
}

impl Engine {
    /// Constructs a new [`Engine`] instance to be executed with [`Engine::run`].
    pub fn new() -> Self {
        let (sender, receiver) = channel();

        Self {
            game: Game::default(),
            sender,
            receiver,
            is_searching: Arc::default(),
            search_thread: None,
            ttable: Arc::default(),
            debug: false,
        }
    }

    /// Returns a string of the engine's name and current version.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Returns a string of all authors of this engine.
    #[inline(always)]
    pub fn authors(&self) -> String {
        env!("CARGO_PKG_AUTHORS").replace(':', ", ")
    }

    /// Sends an [`EngineCommand`] to the engine to be executed.
    #[inline(always)]
    pub fn send_command(&self, command: EngineCommand) {
        // The receiver lives as long as the engine, so this cannot fail
        self.sender
            .send(command)
            .expect("failed to send a command to the engine");
    }

    /// Entrypoint of the engine.
    ///
    /// Spawns the stdin thread, then loops on received commands until told to
    /// quit.
    pub fn run(&mut self) {
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                eprintln!("Input thread stopping after fatal error: {err:#}");
            }
        });

        while let Ok(cmd) = self.receiver.recv() {
            match cmd {
                EngineCommand::Display => println!("{:?}", self.game.position()),

                EngineCommand::Eval => println!("{}", Evaluator::new(&self.game).eval()),

                EngineCommand::Fen => println!("{}", self.game.position()),

                EngineCommand::Perft { depth } => {
                    let mut game = self.game.clone();
                    println!("{}", perft(&mut game, depth));
                }

                EngineCommand::Splitperft { depth } => {
                    let mut game = self.game.clone();
                    splitperft(&mut game, depth);
                }

                EngineCommand::Quit => {
                    self.stop_search();
                    break;
                }

                EngineCommand::Uci(cmd) => {
                    // The UCI spec states to continue execution on errors
                    if let Err(err) = self.handle_uci_command(cmd) {
                        println!("info string {err}");
                    }
                }
            }
        }
    }

    /// Handles the execution of a single [`UciCommand`].
    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<()> {
        use UciCommand::*;
        match uci {
            Uci => self.uci(),

            Debug(status) => self.debug = status,

            IsReady => {
                self.stop_search();
                println!("{}", UciResponse::<&str>::ReadyOk);
            }

            UciNewGame => {
                self.stop_search();
                self.game = Game::default();
                self.ttable().clear();
            }

            Position { fen, moves } => {
                self.stop_search();
                self.position(fen, moves);
            }

            Go(options) => self.go(options),

            Stop => {
                self.stop_search();
            }

            SetOption { name, value } => self.set_option(&name, value),

            PonderHit => println!("info string ponderhit not supported"),

            Quit => self.send_command(EngineCommand::Quit),

            _ => bail!("{} does not support UCI command {uci:?}", self.name()),
        }

        Ok(())
    }

    /// Called when the engine receives the `uci` command: prints the engine's
    /// identification and options, concluding with `uciok`.
    fn uci(&self) {
        println!("id name {}", self.name());
        println!("id author {}", self.authors());
        println!(
            "{}",
            UciResponse::Option(UciOption::spin(
                "Hash",
                TTable::DEFAULT_SIZE as i32,
                TTable::MIN_SIZE as i32,
                TTable::MAX_SIZE as i32,
            ))
        );
        println!("{}", UciResponse::<&str>::UciOk);
    }

    /// Sets the position from an optional FEN (startpos if absent) and plays
    /// the provided long-algebraic moves.
    ///
    /// A rejected FEN keeps the previous position. A rejected move leaves the
    /// engine on the last consistent position, the one before the bad move.
    fn position(&mut self, fen: Option<String>, moves: Vec<String>) {
        let mut game = match fen {
            Some(fen) => match Game::from_fen(&fen) {
                Ok(game) => game,
                Err(_) => {
                    println!("info string invalid fen supplied");
                    return;
                }
            },
            None => Game::default(),
        };

        for mv_str in moves {
            match Move::from_uci(&game, &mv_str) {
                Ok(mv) => game.make_move(mv),
                Err(_) => {
                    println!("info string illegal move {mv_str}");
                    break;
                }
            }
        }

        self.game = game;
    }

    /// Starts the search worker on the current position.
    fn go(&mut self, options: uci_parser::UciSearchOptions) {
        if self.is_searching() {
            println!("info string search already running");
            return;
        }

        let mut config = SearchConfig::new(options, &self.game);
        config.debug = self.debug;

        self.set_is_searching(true);

        // The worker owns its copy of the game and the table lock while the
        // search runs; the event loop must not touch either until it joins
        let mut game = self.game.clone();
        let ttable = Arc::clone(&self.ttable);
        let is_searching = Arc::clone(&self.is_searching);

        self.search_thread = Some(thread::spawn(move || {
            let mut ttable = ttable
                .lock()
                .expect("failed to acquire the transposition table for search");

            Search::new(&mut game, &mut ttable, is_searching, config).start()
        }));
    }

    /// Requests cancellation of any running search and blocks until the
    /// worker has exited (emitting its `bestmove` on the way out).
    ///
    /// Every command that mutates engine state must pass through here first.
    fn stop_search(&mut self) -> Option<SearchResult> {
        self.set_is_searching(false);

        let handle = self.search_thread.take()?;
        let id = handle.thread().id();
        match handle.join() {
            Ok(result) => Some(result),
            Err(_) => {
                println!("info string failed to join search thread {id:?}");
                None
            }
        }
    }

    /// Handles `setoption name <name> [value <value>]`.
    fn set_option(&mut self, name: &str, value: Option<String>) {
        match name {
            "Hash" => {
                let value = value.unwrap_or_default();
                match value.parse::<usize>() {
                    Ok(mb) if (TTable::MIN_SIZE..=TTable::MAX_SIZE).contains(&mb) => {
                        self.stop_search();
                        self.ttable().resize(mb);
                    }
                    _ => println!("info string invalid hash size {value}"),
                }
            }

            _ => println!("info string unsupported option {name}"),
        }
    }

    /// Sets the search flag to signal that the engine is starting/stopping a
    /// search.
    #[inline(always)]
    fn set_is_searching(&mut self, status: bool) {
        self.is_searching.store(status, Ordering::Relaxed);
    }

    /// Returns `true` if the engine is currently executing a search.
    #[inline(always)]
    fn is_searching(&self) -> bool {
        self.is_searching.load(Ordering::Relaxed)
    }

    /// Helper to fetch the transposition table, panicking if impossible.
    #[inline(always)]
    fn ttable(&self) -> std::sync::MutexGuard<'_, TTable> {
        self.ttable
            .lock()
            .expect("a thread holding the transposition table panicked")
    }
}

impl Default for Engine {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// Loops endlessly awaiting input on stdin, sending all successfully-parsed
/// commands through the supplied `sender`.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("failed to read line from stdin")?;

        // Ctrl+D / closed stdin
        if bytes == 0 {
            sender
                .send(EngineCommand::Quit)
                .context("failed to send quit after empty input")?;
            bail!("engine received input of 0 bytes and is quitting");
        }

        let buf = buffer.trim();
        if buf.is_empty() {
            continue;
        }

        // Try UCI first, since that is the engine's primary protocol
        match UciCommand::new(buf) {
            Ok(cmd) => sender
                .send(EngineCommand::Uci(cmd))
                .context("failed to send UCI command to engine")?,

            // If it's not a UCI command, check if it's an engine command
            Err(UciParseError::UnrecognizedCommand { cmd: _ }) => match buf.parse() {
                Ok(cmd) => sender
                    .send(cmd)
                    .context("failed to send command to engine")?,

                Err(_) => println!("info string unknown command {buf:?}"),
            },

            // Recognized UCI command with malformed arguments
            Err(err) => println!("info string {err}"),
        }
    }
}
