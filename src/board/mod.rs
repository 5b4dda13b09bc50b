/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

mod attacks;
mod bitboard;
mod game;
mod moves;
mod piece;
mod position;
mod square;
mod zobrist;

pub use attacks::*;
pub use bitboard::*;
pub use game::*;
pub use moves::*;
pub use piece::*;
pub use position::*;
pub use square::*;
pub use zobrist::*;
