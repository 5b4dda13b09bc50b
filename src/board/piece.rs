/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

/// The color of a player or piece.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Color {
    White = 0,
    Black = 1,
}

impl Color {
    pub const COUNT: usize = 2;

    /// An array of both colors, White first.
    #[inline(always)]
    pub const fn all() -> [Self; 2] {
        [Self::White, Self::Black]
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// The other color.
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        matches!(self, Self::White)
    }

    /// Parses `w` or `b`.
    pub fn from_uci(s: &str) -> Result<Self> {
        match s {
            "w" | "W" => Ok(Self::White),
            "b" | "B" => Ok(Self::Black),
            _ => bail!("Invalid color string: {s:?}"),
        }
    }
}

impl fmt::Display for Color {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.is_white() { 'w' } else { 'b' })
    }
}

/// The kind of a chess piece, without its color.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    pub const COUNT: usize = 6;

    /// All piece kinds, in index order.
    #[inline(always)]
    pub const fn all() -> [Self; 6] {
        [
            Self::Pawn,
            Self::Knight,
            Self::Bishop,
            Self::Rook,
            Self::Queen,
            Self::King,
        ]
    }

    /// The four kinds a pawn may promote to.
    #[inline(always)]
    pub const fn promotions() -> [Self; 4] {
        [Self::Knight, Self::Bishop, Self::Rook, Self::Queen]
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Constructs a [`PieceKind`] from its index. Panics on values above 5.
    #[inline(always)]
    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Pawn,
            1 => Self::Knight,
            2 => Self::Bishop,
            3 => Self::Rook,
            4 => Self::Queen,
            5 => Self::King,
            _ => panic!("PieceKind index out of range"),
        }
    }

    /// Material value of this kind, in centipawns.
    ///
    /// The King has no exchange value; it scores 0 here so that capture
    /// ordering never considers it a victim worth trading for.
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        match self {
            Self::Pawn => 100,
            Self::Knight => 320,
            Self::Bishop => 330,
            Self::Rook => 500,
            Self::Queen => 900,
            Self::King => 0,
        }
    }

    /// Lowercase UCI character for this kind.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    /// Parses a (case-insensitive) UCI piece character.
    pub fn from_char(c: char) -> Result<Self> {
        match c.to_ascii_lowercase() {
            'p' => Ok(Self::Pawn),
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            'k' => Ok(Self::King),
            _ => bail!("Invalid piece character: {c:?}"),
        }
    }
}

impl fmt::Display for PieceKind {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

/// A colored chess piece.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
}

impl Piece {
    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Index into the 12-entry Zobrist piece table: White P,N,B,R,Q,K then
    /// Black P,N,B,R,Q,K.
    #[inline(always)]
    pub const fn zobrist_index(&self) -> usize {
        self.color.index() * PieceKind::COUNT + self.kind.index()
    }

    /// UCI character: uppercase for White, lowercase for Black.
    #[inline(always)]
    pub const fn char(&self) -> char {
        let c = self.kind.char();
        if self.color.is_white() {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }

    /// Parses a FEN piece character.
    pub fn from_uci(c: char) -> Result<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Ok(Self::new(color, PieceKind::from_char(c)?))
    }
}

impl fmt::Display for Piece {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zobrist_index() {
        assert_eq!(Piece::new(Color::White, PieceKind::Pawn).zobrist_index(), 0);
        assert_eq!(Piece::new(Color::White, PieceKind::King).zobrist_index(), 5);
        assert_eq!(Piece::new(Color::Black, PieceKind::Pawn).zobrist_index(), 6);
        assert_eq!(Piece::new(Color::Black, PieceKind::King).zobrist_index(), 11);
    }

    #[test]
    fn test_piece_chars() {
        let wn = Piece::from_uci('N').unwrap();
        assert_eq!(wn.color(), Color::White);
        assert_eq!(wn.kind(), PieceKind::Knight);
        assert_eq!(wn.char(), 'N');

        let bq = Piece::from_uci('q').unwrap();
        assert_eq!(bq.color(), Color::Black);
        assert_eq!(bq.char(), 'q');

        assert!(Piece::from_uci('x').is_err());
    }
}
