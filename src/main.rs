/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::Parser;
use rampart::{Cli, Engine, EngineCommand};

fn main() {
    // Sliding-piece attacks are unsound if this fails, so it aborts rather
    // than returning
    rampart::init_attack_tables();

    let mut engine = Engine::new();
    println!("{} by {}", engine.name(), engine.authors());

    // If a command was provided on the command line, run it and exit
    if let Ok(cli) = Cli::try_parse_from(std::env::args_os().skip(1)) {
        engine.send_command(cli.command);
        engine.send_command(EngineCommand::Quit);
    }

    // Run the engine's main event loop
    engine.run();
}
