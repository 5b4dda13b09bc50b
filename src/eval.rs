/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{psqt::psqt_value, Color, Game, PieceKind, Score};

/// A static evaluator of chess positions.
///
/// Sums material and piece-square values for both sides. The score returned
/// by [`Evaluator::eval`] is from the perspective of the side to move, as
/// negamax requires.
pub struct Evaluator<'a> {
    game: &'a Game,
}

impl<'a> Evaluator<'a> {
    #[inline(always)]
    pub fn new(game: &'a Game) -> Self {
        Self { game }
    }

    /// Evaluates the position, in centipawns relative to the side to move.
    pub fn eval(&self) -> Score {
        let white = self.score_for(Color::White);
        let black = self.score_for(Color::Black);

        let score = Score::from(white - black);
        match self.game.side_to_move() {
            Color::White => score,
            Color::Black => -score,
        }
    }

    /// Material plus piece-square value of all of `color`'s pieces.
    fn score_for(&self, color: Color) -> i32 {
        let mut score = 0;

        for kind in PieceKind::all() {
            let pieces = self.game.kind(kind) & self.game.color(color);
            score += pieces.population() as i32 * kind.value();
            for square in pieces {
                score += psqt_value(kind, square, color) as i32;
            }
        }

        score
    }
}
