/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use uci_parser::UciCommand;

/// Parser wrapper for engine-specific commands.
///
/// `multicall` lets the first token act as the command name, so input lines
/// like `perft 5` parse directly.
#[derive(Debug, Parser)]
#[command(multicall = true, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: EngineCommand,
}

/// A command to be sent to the engine.
///
/// UCI commands arrive through the [`EngineCommand::Uci`] variant; everything
/// else is a convenience for offline use and debugging.
#[derive(Debug, Subcommand)]
pub enum EngineCommand {
    /// Print a visual representation of the current position.
    Display,

    /// Print an evaluation of the current position.
    Eval,

    /// Generate a FEN string for the current position.
    Fen,

    /// Count all leaf nodes reachable at the given depth.
    Perft {
        #[arg(default_value = "1")]
        depth: usize,
    },

    /// Like perft, but printing the node count of each root move.
    Splitperft {
        #[arg(default_value = "1")]
        depth: usize,
    },

    /// Quit the program.
    #[command(alias = "exit")]
    Quit,

    /// A standard UCI command.
    #[command(skip)]
    Uci(UciCommand),
}

impl FromStr for EngineCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cli::try_parse_from(s.split_ascii_whitespace())
            .map(|cli| cli.command)
            .map_err(|err| anyhow!("{err}"))
    }
}
