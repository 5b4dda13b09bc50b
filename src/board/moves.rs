/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, Result};

use super::{Game, PieceKind, Square};

/// Maximum possible number of moves in a given chess position.
///
/// Found [here](https://www.chessprogramming.org/Chess_Position#cite_note-4)
pub const MAX_NUM_MOVES: usize = 218;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// Represents the different kinds of moves that can be made during a chess game.
///
/// The discriminants are the classic
/// [from-to encoding flags](https://www.chessprogramming.org/Encoding_Moves#From-To_Based),
/// pre-shifted into the flag bits of a [`Move`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u32)]
pub enum MoveKind {
    /// A single piece moves without changing the quantity or kind of any piece.
    Quiet = 0 << Move::FLG_BITS,

    /// A pawn's first move, advancing two squares.
    DoublePush = 1 << Move::FLG_BITS,

    /// The King and the h-file Rook castle.
    KingCastle = 2 << Move::FLG_BITS,

    /// The King and the a-file Rook castle.
    QueenCastle = 3 << Move::FLG_BITS,

    /// A piece moves onto a square occupied by an enemy piece, removing it.
    Capture = 4 << Move::FLG_BITS,

    /// A pawn captures the pawn that just double-pushed past it.
    EnPassant = 5 << Move::FLG_BITS,

    /// A pawn reaches its promotion rank and becomes a Knight.
    PromoKnight = 8 << Move::FLG_BITS,

    /// A pawn reaches its promotion rank and becomes a Bishop.
    PromoBishop = 9 << Move::FLG_BITS,

    /// A pawn reaches its promotion rank and becomes a Rook.
    PromoRook = 10 << Move::FLG_BITS,

    /// A pawn reaches its promotion rank and becomes a Queen.
    PromoQueen = 11 << Move::FLG_BITS,

    /// A capture that also promotes to a Knight.
    PromoKnightCapture = 12 << Move::FLG_BITS,

    /// A capture that also promotes to a Bishop.
    PromoBishopCapture = 13 << Move::FLG_BITS,

    /// A capture that also promotes to a Rook.
    PromoRookCapture = 14 << Move::FLG_BITS,

    /// A capture that also promotes to a Queen.
    PromoQueenCapture = 15 << Move::FLG_BITS,
}

impl MoveKind {
    /// Creates a promotion (or promotion-capture) kind for `promotion`.
    ///
    /// # Panics
    /// If `promotion` is not a Knight, Bishop, Rook, or Queen.
    #[inline(always)]
    pub const fn promotion(promotion: PieceKind, is_capture: bool) -> Self {
        match (promotion, is_capture) {
            (PieceKind::Knight, false) => Self::PromoKnight,
            (PieceKind::Bishop, false) => Self::PromoBishop,
            (PieceKind::Rook, false) => Self::PromoRook,
            (PieceKind::Queen, false) => Self::PromoQueen,
            (PieceKind::Knight, true) => Self::PromoKnightCapture,
            (PieceKind::Bishop, true) => Self::PromoBishopCapture,
            (PieceKind::Rook, true) => Self::PromoRookCapture,
            (PieceKind::Queen, true) => Self::PromoQueenCapture,
            _ => panic!("Invalid promotion piece"),
        }
    }
}

/// Represents a move made on a chess board.
///
/// Internally encoded as a packed 32-bit word:
/// ```text
///     0000 0000 0000 0000 0000 000000 000000
///                    |     |     |      |
///                    |     |     |      +- Target ("to") square.
///                    |     |     +- Source ("from") square.
///                    |     +- Move flag (promotion, castling, etc.).
///                    +- Kind of the captured piece, if any.
/// ```
/// Flag values follow the [Chess Programming Wiki](https://www.chessprogramming.org/Encoding_Moves#From-To_Based);
/// the captured-piece nibble lets unmake restore captures without consulting
/// any other state. The encoding is opaque to callers; only the accessors
/// below are contractual.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Move(u32);

impl Move {
    /// Mask for the destination ("to") bits.
    const DST_MASK: u32 = 0x0000_003F;
    /// Mask for the source ("from") bits.
    const SRC_MASK: u32 = 0x0000_0FC0;
    /// Mask for the flag bits.
    const FLG_MASK: u32 = 0x0000_F000;
    /// Mask for the captured-piece bits.
    const CAP_MASK: u32 = 0x000F_0000;
    /// Start index of source bits.
    const SRC_BITS: u32 = 6;
    /// Start index of flag bits.
    const FLG_BITS: u32 = 12;
    /// Start index of captured-piece bits.
    const CAP_BITS: u32 = 16;

    /// Flag bit present on every capturing kind (capture, en passant,
    /// promotion-captures).
    const FLAG_CAPTURE_BIT: u32 = 4 << Self::FLG_BITS;
    /// Flag bit present on every promoting kind.
    const FLAG_PROMO_BIT: u32 = 8 << Self::FLG_BITS;

    /// A move that moves nothing; used as the empty slot in tables.
    pub const NONE: Self = Self(0);

    /// Creates a new [`Move`] from the given [`Square`]s, [`MoveKind`], and
    /// captured piece.
    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind, captured: Option<PieceKind>) -> Self {
        let captured_bits = match captured {
            Some(kind) => kind as u32 + 1,
            None => 0,
        };

        Self(
            kind as u32
                | captured_bits << Self::CAP_BITS
                | (from.inner() as u32) << Self::SRC_BITS
                | to.inner() as u32,
        )
    }

    /// Builds a [`Move`], inferring its [`MoveKind`] from the circumstances:
    ///
    /// - A non-empty `promotion` yields a promotion or promotion-capture.
    /// - A pawn landing on the en-passant square without a victim on it is an
    ///   en-passant capture.
    /// - A non-empty `captured` piece yields a capture.
    /// - A pawn moving two ranks is a double push.
    /// - A king moving two files is a castle, king-side iff `to` is a g-file
    ///   square.
    /// - Anything else is quiet.
    pub fn build(
        from: Square,
        to: Square,
        ep_square: Option<Square>,
        piece: PieceKind,
        captured: Option<PieceKind>,
        promotion: Option<PieceKind>,
    ) -> Self {
        let is_pawn = matches!(piece, PieceKind::Pawn);

        if let Some(promotion) = promotion {
            return Self::new(from, to, MoveKind::promotion(promotion, captured.is_some()), captured);
        }

        if is_pawn && captured.is_none() && ep_square == Some(to) {
            return Self::new(from, to, MoveKind::EnPassant, None);
        }

        if captured.is_some() {
            return Self::new(from, to, MoveKind::Capture, captured);
        }

        if is_pawn && from.distance_ranks(to) == 2 {
            return Self::new(from, to, MoveKind::DoublePush, None);
        }

        if matches!(piece, PieceKind::King) && from.distance_files(to) == 2 {
            let kind = if matches!(to, Square::G1 | Square::G8) {
                MoveKind::KingCastle
            } else {
                MoveKind::QueenCastle
            };
            return Self::new(from, to, kind, None);
        }

        Self::new(from, to, MoveKind::Quiet, None)
    }

    /// Fetches the source (or "from") part of this [`Move`].
    #[inline(always)]
    pub const fn from(&self) -> Square {
        Square::from_index_unchecked(((self.0 & Self::SRC_MASK) >> Self::SRC_BITS) as u8)
    }

    /// Fetches the destination (or "to") part of this [`Move`].
    #[inline(always)]
    pub const fn to(&self) -> Square {
        Square::from_index_unchecked((self.0 & Self::DST_MASK) as u8)
    }

    /// Fetches the [`MoveKind`] part of this [`Move`].
    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        match (self.0 & Self::FLG_MASK) >> Self::FLG_BITS {
            0 => MoveKind::Quiet,
            1 => MoveKind::DoublePush,
            2 => MoveKind::KingCastle,
            3 => MoveKind::QueenCastle,
            4 => MoveKind::Capture,
            5 => MoveKind::EnPassant,
            8 => MoveKind::PromoKnight,
            9 => MoveKind::PromoBishop,
            10 => MoveKind::PromoRook,
            11 => MoveKind::PromoQueen,
            12 => MoveKind::PromoKnightCapture,
            13 => MoveKind::PromoBishopCapture,
            14 => MoveKind::PromoRookCapture,
            15 => MoveKind::PromoQueenCapture,
            _ => unreachable!(),
        }
    }

    /// Fetches the kind of the piece standing on this [`Move`]'s destination
    /// square that it captures, if any.
    ///
    /// En passant records no victim here, since the captured Pawn does not
    /// stand on the destination square; derive it from [`Move::is_en_passant`]
    /// and one rank behind [`Move::to`] relative to the mover, as make/unmake
    /// do.
    #[inline(always)]
    pub const fn captured(&self) -> Option<PieceKind> {
        match (self.0 & Self::CAP_MASK) >> Self::CAP_BITS {
            0 => None,
            bits => Some(PieceKind::from_index(bits as usize - 1)),
        }
    }

    /// Fetches the piece this [`Move`] promotes to, if any.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        if self.0 & Self::FLAG_PROMO_BIT == 0 {
            return None;
        }
        Some(match (self.0 & Self::FLG_MASK) >> Self::FLG_BITS & 0b11 {
            0 => PieceKind::Knight,
            1 => PieceKind::Bishop,
            2 => PieceKind::Rook,
            _ => PieceKind::Queen,
        })
    }

    /// Returns `true` if this [`Move`] is a capture of any kind.
    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.0 & Self::FLAG_CAPTURE_BIT != 0
    }

    /// Returns `true` if this [`Move`] is a non-capture.
    #[inline(always)]
    pub const fn is_quiet(&self) -> bool {
        self.0 & Self::FLAG_CAPTURE_BIT == 0
    }

    /// Returns `true` if this [`Move`] is en passant.
    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        self.0 & Self::FLG_MASK == MoveKind::EnPassant as u32
    }

    /// Returns `true` if this [`Move`] is a pawn double push.
    #[inline(always)]
    pub const fn is_double_push(&self) -> bool {
        self.0 & Self::FLG_MASK == MoveKind::DoublePush as u32
    }

    /// Returns `true` if this [`Move`] is a king-side castle.
    #[inline(always)]
    pub const fn is_kingside_castle(&self) -> bool {
        self.0 & Self::FLG_MASK == MoveKind::KingCastle as u32
    }

    /// Returns `true` if this [`Move`] is a queen-side castle.
    #[inline(always)]
    pub const fn is_queenside_castle(&self) -> bool {
        self.0 & Self::FLG_MASK == MoveKind::QueenCastle as u32
    }

    /// Returns `true` if this [`Move`] is a castle of either side.
    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        self.is_kingside_castle() || self.is_queenside_castle()
    }

    /// Returns `true` if this [`Move`] is a promotion of any kind.
    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        self.0 & Self::FLAG_PROMO_BIT != 0
    }

    /// Returns `true` if this is not [`Move::NONE`].
    #[inline(always)]
    pub const fn is_some(&self) -> bool {
        self.0 != 0
    }

    /// Converts the provided string into a [`Move`], resolving it against the
    /// legal moves of `game`.
    ///
    /// Strings are in [long algebraic notation](https://en.wikipedia.org/wiki/Algebraic_notation_(chess)#Long_algebraic_notation):
    /// `from` square, `to` square, optional promotion character in `nbrq`.
    pub fn from_uci(game: &Game, mv_str: &str) -> Result<Self> {
        if mv_str.len() < 4 {
            return Err(anyhow!("Move string {mv_str:?} is too short"));
        }

        game.legal_moves()
            .into_iter()
            .find(|mv| mv.to_string() == mv_str)
            .ok_or(anyhow!("Move {mv_str:?} is not legal in the current position"))
    }
}

impl fmt::Display for Move {
    /// Formats this move in long algebraic notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(promotion) = self.promotion() {
            write!(f, "{}", promotion.char())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:?}, captures {:?})", self.kind(), self.captured())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_round_trip() {
        let mv = Move::new(
            Square::E2,
            Square::D3,
            MoveKind::Capture,
            Some(PieceKind::Knight),
        );
        assert_eq!(mv.from(), Square::E2);
        assert_eq!(mv.to(), Square::D3);
        assert_eq!(mv.kind(), MoveKind::Capture);
        assert_eq!(mv.captured(), Some(PieceKind::Knight));
        assert!(mv.is_capture());
        assert!(!mv.is_promotion());
    }

    #[test]
    fn test_build_inference() {
        // Double push
        let mv = Move::build(Square::E2, Square::E4, None, PieceKind::Pawn, None, None);
        assert_eq!(mv.kind(), MoveKind::DoublePush);

        // En passant: pawn to the ep square with no victim on it
        let mv = Move::build(
            Square::E5,
            Square::D6,
            Some(Square::D6),
            PieceKind::Pawn,
            None,
            None,
        );
        assert_eq!(mv.kind(), MoveKind::EnPassant);
        assert!(mv.is_capture());

        // Castling both ways
        let mv = Move::build(Square::E1, Square::G1, None, PieceKind::King, None, None);
        assert_eq!(mv.kind(), MoveKind::KingCastle);
        let mv = Move::build(Square::E8, Square::C8, None, PieceKind::King, None, None);
        assert_eq!(mv.kind(), MoveKind::QueenCastle);

        // Promotion with and without capture
        let mv = Move::build(
            Square::B7,
            Square::B8,
            None,
            PieceKind::Pawn,
            None,
            Some(PieceKind::Queen),
        );
        assert_eq!(mv.kind(), MoveKind::PromoQueen);
        assert_eq!(mv.promotion(), Some(PieceKind::Queen));
        assert_eq!(mv.to_string(), "b7b8q");

        let mv = Move::build(
            Square::B7,
            Square::A8,
            None,
            PieceKind::Pawn,
            Some(PieceKind::Rook),
            Some(PieceKind::Knight),
        );
        assert_eq!(mv.kind(), MoveKind::PromoKnightCapture);
        assert_eq!(mv.captured(), Some(PieceKind::Rook));
        assert_eq!(mv.to_string(), "b7a8n");

        // A king moving one square is quiet
        let mv = Move::build(Square::E1, Square::E2, None, PieceKind::King, None, None);
        assert_eq!(mv.kind(), MoveKind::Quiet);
    }

    #[test]
    fn test_none_move() {
        assert!(!Move::NONE.is_some());
        assert!(Move::NONE.captured().is_none());
        assert!(Move::NONE.promotion().is_none());
    }
}
