/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Board representation: bitboards, squares, pieces, attack tables, Zobrist
/// hashing, move encoding, position state, and legal move generation.
mod board;

/// Commands the engine accepts on its command line, and how to parse them.
mod cli;

/// The engine's event loop: UCI handling, input thread, and search thread glue.
mod engine;

/// Evaluation of chess positions.
mod eval;

/// Piece-square tables used by the evaluator.
mod psqt;

/// Types and utilities for rating how good/bad a position is.
mod score;

/// Main engine logic; all search related code.
mod search;

/// The transposition table.
mod ttable;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use eval::*;
pub use score::*;
pub use search::*;
pub use ttable::*;

/// FEN string for the starting position of chess.
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// FEN string for the "Kiwipete" position, a dense move-generation benchmark.
pub const FEN_KIWIPETE: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
