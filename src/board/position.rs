/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, bail, Result};

use super::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks, Bitboard, Color,
    File, Move, Piece, PieceKind, Rank, Square, ZobristKey,
};

/// Packed game-state word.
///
/// ```text
///  bits 17-31   bit 14-16   bit 13   bits 5-12   bits 1-4   bit 0
///  fullmove     EP file     EP set   halfmove    castling   side (1 = White)
/// ```
/// The halfmove clock is stored in 8 bits (saturating at 255) so the
/// fifty-move comparison against 100 always has headroom.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct GameInfo(u32);

impl GameInfo {
    const SIDE: u32 = 1 << 0;

    const WHITE_KINGSIDE: u32 = 1 << 1;
    const WHITE_QUEENSIDE: u32 = 1 << 2;
    const BLACK_KINGSIDE: u32 = 1 << 3;
    const BLACK_QUEENSIDE: u32 = 1 << 4;
    const CASTLING_MASK: u32 = 0b1111 << 1;

    const HALFMOVE_BITS: u32 = 5;
    const HALFMOVE_MASK: u32 = 0xFF << Self::HALFMOVE_BITS;

    const EP_SET: u32 = 1 << 13;
    const EP_FILE_BITS: u32 = 14;
    const EP_FILE_MASK: u32 = 0b111 << Self::EP_FILE_BITS;

    const FULLMOVE_BITS: u32 = 17;
    const FULLMOVE_MASK: u32 = 0x7FFF << Self::FULLMOVE_BITS;

    /// The player whose turn it is.
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        if self.0 & Self::SIDE != 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    #[inline(always)]
    fn set_side_to_move(&mut self, color: Color) {
        match color {
            Color::White => self.0 |= Self::SIDE,
            Color::Black => self.0 &= !Self::SIDE,
        }
    }

    #[inline(always)]
    fn flip_side_to_move(&mut self) {
        self.0 ^= Self::SIDE;
    }

    #[inline(always)]
    const fn kingside_bit(color: Color) -> u32 {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    #[inline(always)]
    const fn queenside_bit(color: Color) -> u32 {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    /// Returns `true` if `color` may still castle king-side.
    #[inline(always)]
    pub const fn can_castle_kingside(&self, color: Color) -> bool {
        self.0 & Self::kingside_bit(color) != 0
    }

    /// Returns `true` if `color` may still castle queen-side.
    #[inline(always)]
    pub const fn can_castle_queenside(&self, color: Color) -> bool {
        self.0 & Self::queenside_bit(color) != 0
    }

    #[inline(always)]
    fn grant_kingside(&mut self, color: Color) {
        self.0 |= Self::kingside_bit(color);
    }

    #[inline(always)]
    fn grant_queenside(&mut self, color: Color) {
        self.0 |= Self::queenside_bit(color);
    }

    #[inline(always)]
    fn revoke_kingside(&mut self, color: Color) {
        self.0 &= !Self::kingside_bit(color);
    }

    #[inline(always)]
    fn revoke_queenside(&mut self, color: Color) {
        self.0 &= !Self::queenside_bit(color);
    }

    #[inline(always)]
    fn revoke_all_castling(&mut self, color: Color) {
        self.0 &= !(Self::kingside_bit(color) | Self::queenside_bit(color));
    }

    /// Index into the 16 Zobrist castling-combination keys.
    #[inline(always)]
    pub const fn castling_index(&self) -> usize {
        ((self.0 & Self::CASTLING_MASK) >> 1) as usize
    }

    /// Plies since the last capture or pawn move.
    #[inline(always)]
    pub const fn halfmove(&self) -> u32 {
        (self.0 & Self::HALFMOVE_MASK) >> Self::HALFMOVE_BITS
    }

    #[inline(always)]
    fn set_halfmove(&mut self, halfmove: u32) {
        let clamped = if halfmove > 0xFF { 0xFF } else { halfmove };
        self.0 = (self.0 & !Self::HALFMOVE_MASK) | (clamped << Self::HALFMOVE_BITS);
    }

    /// The file of the en-passant destination, if a double push just occurred.
    #[inline(always)]
    pub const fn ep_file(&self) -> Option<File> {
        if self.0 & Self::EP_SET != 0 {
            Some(File::new_unchecked(
                ((self.0 & Self::EP_FILE_MASK) >> Self::EP_FILE_BITS) as u8,
            ))
        } else {
            None
        }
    }

    #[inline(always)]
    fn set_ep_file(&mut self, file: File) {
        self.0 = (self.0 & !Self::EP_FILE_MASK)
            | Self::EP_SET
            | ((file.inner() as u32) << Self::EP_FILE_BITS);
    }

    #[inline(always)]
    fn clear_ep(&mut self) {
        self.0 &= !(Self::EP_SET | Self::EP_FILE_MASK);
    }

    /// Number of completed move pairs, starting at 1.
    #[inline(always)]
    pub const fn fullmove(&self) -> u32 {
        (self.0 & Self::FULLMOVE_MASK) >> Self::FULLMOVE_BITS
    }

    #[inline(always)]
    fn set_fullmove(&mut self, fullmove: u32) {
        let clamped = if fullmove > 0x7FFF { 0x7FFF } else { fullmove };
        self.0 = (self.0 & !Self::FULLMOVE_MASK) | (clamped << Self::FULLMOVE_BITS);
    }
}

impl fmt::Debug for GameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GameInfo(side={}, castling={:04b}, halfmove={}, ep={:?}, fullmove={})",
            self.side_to_move(),
            self.castling_index(),
            self.halfmove(),
            self.ep_file(),
            self.fullmove()
        )
    }
}

/// Everything needed to reverse one call to [`Position::make`].
///
/// The mover's original kind is recorded so unmaking a promotion restores a
/// Pawn; captures are restored from the move's captured-piece field.
#[derive(Clone, Copy, Debug)]
pub struct Undo {
    /// Game info before the move.
    pub info: GameInfo,

    /// Zobrist key before the move.
    pub key: ZobristKey,

    /// The move that was made.
    pub mv: Move,

    /// The kind of the piece on the move's `from` square before any promotion.
    pub moved: PieceKind,
}

impl Default for Undo {
    #[inline(always)]
    fn default() -> Self {
        Self {
            info: GameInfo::default(),
            key: ZobristKey::default(),
            mv: Move::NONE,
            moved: PieceKind::Pawn,
        }
    }
}

/// The full state of a chess position.
///
/// Eight bitboards (two color-occupancy boards and six piece-kind boards)
/// describe piece placement: a square holds piece `P` of color `C` iff both
/// the `P` board and the `C` board have that bit set. The packed [`GameInfo`]
/// word and the incrementally-maintained [`ZobristKey`] complete the state.
///
/// [`Position::make`] and [`Position::unmake`] are the only mutation path
/// after FEN setup.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Position {
    colors: [Bitboard; Color::COUNT],
    pieces: [Bitboard; PieceKind::COUNT],
    info: GameInfo,
    key: ZobristKey,
}

impl Position {
    /// Creates a new, empty [`Position`] with White to move and no castling
    /// rights.
    #[inline(always)]
    pub fn new() -> Self {
        let mut info = GameInfo::default();
        info.set_side_to_move(Color::White);
        info.set_fullmove(1);

        Self {
            colors: [Bitboard::EMPTY_BOARD; Color::COUNT],
            pieces: [Bitboard::EMPTY_BOARD; PieceKind::COUNT],
            info,
            key: ZobristKey::default(),
        }
    }

    /// Creates a new [`Position`] from the provided FEN string.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut pos = Self::new();
        let mut split = fen.trim().split_ascii_whitespace();

        let placements = split
            .next()
            .ok_or(anyhow!("FEN string must have piece placements"))?;
        if placements.matches('/').count() != 7 {
            bail!("FEN placements must describe all 8 ranks");
        }

        // Ranks come 8 down to 1, so reverse to fill White's side first
        for (rank, placements) in placements.split('/').rev().enumerate() {
            let mut file = 0u8;
            for c in placements.chars() {
                if let Some(empty) = c.to_digit(10) {
                    file += empty as u8;
                } else {
                    let piece = Piece::from_uci(c)?;
                    if file >= 8 {
                        bail!("FEN rank {} describes more than 8 files", rank + 1);
                    }
                    let square =
                        Square::new(File::new_unchecked(file), Rank::new_unchecked(rank as u8));
                    pos.set_piece(square, piece.kind(), piece.color());
                    file += 1;
                }
            }
        }

        let side = split.next().unwrap_or("w");
        pos.info.set_side_to_move(Color::from_uci(side)?);

        let castling = split.next().unwrap_or("-");
        if castling != "-" {
            for c in castling.chars() {
                match c {
                    'K' => pos.info.grant_kingside(Color::White),
                    'Q' => pos.info.grant_queenside(Color::White),
                    'k' => pos.info.grant_kingside(Color::Black),
                    'q' => pos.info.grant_queenside(Color::Black),
                    _ => bail!("Invalid castling character: {c:?}"),
                }
            }
        }

        let ep = split.next().unwrap_or("-");
        if ep != "-" {
            pos.info.set_ep_file(Square::from_uci(ep)?.file());
        }

        let halfmove = split.next().unwrap_or("0");
        pos.info.set_halfmove(
            halfmove
                .parse()
                .or(Err(anyhow!("Invalid halfmove counter: {halfmove:?}")))?,
        );

        let fullmove = split.next().unwrap_or("1");
        pos.info.set_fullmove(
            fullmove
                .parse()
                .or(Err(anyhow!("Invalid fullmove counter: {fullmove:?}")))?,
        );

        for color in Color::all() {
            if pos.king(color).population() > 1 {
                bail!("FEN must not place more than one {color} king");
            }
        }

        pos.key = ZobristKey::new(&pos);

        Ok(pos)
    }

    /// All squares occupied by `color`.
    #[inline(always)]
    pub const fn color(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// All squares occupied by a piece of `kind`, of either color.
    #[inline(always)]
    pub const fn kind(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    /// All occupied squares.
    #[inline(always)]
    pub const fn occupied(&self) -> Bitboard {
        self.colors[0].or(self.colors[1])
    }

    /// All squares that are empty or hold a piece of `color`'s opponent.
    #[inline(always)]
    pub const fn enemy_or_empty(&self, color: Color) -> Bitboard {
        self.color(color).not()
    }

    #[inline(always)]
    pub const fn pawns(&self, color: Color) -> Bitboard {
        self.kind(PieceKind::Pawn).and(self.color(color))
    }

    #[inline(always)]
    pub const fn knights(&self, color: Color) -> Bitboard {
        self.kind(PieceKind::Knight).and(self.color(color))
    }

    #[inline(always)]
    pub const fn bishops(&self, color: Color) -> Bitboard {
        self.kind(PieceKind::Bishop).and(self.color(color))
    }

    #[inline(always)]
    pub const fn king(&self, color: Color) -> Bitboard {
        self.kind(PieceKind::King).and(self.color(color))
    }

    /// All of `color`'s Rooks and Queens.
    #[inline(always)]
    pub const fn orthogonal_sliders(&self, color: Color) -> Bitboard {
        self.kind(PieceKind::Rook)
            .or(self.kind(PieceKind::Queen))
            .and(self.color(color))
    }

    /// All of `color`'s Bishops and Queens.
    #[inline(always)]
    pub const fn diagonal_sliders(&self, color: Color) -> Bitboard {
        self.kind(PieceKind::Bishop)
            .or(self.kind(PieceKind::Queen))
            .and(self.color(color))
    }

    /// The kind of the piece at `square`, if any.
    #[inline(always)]
    pub fn piece_kind_at(&self, square: Square) -> Option<PieceKind> {
        if !self.occupied().contains(square) {
            return None;
        }
        PieceKind::all()
            .into_iter()
            .find(|kind| self.kind(*kind).contains(square))
    }

    /// The color of the piece at `square`, if any.
    #[inline(always)]
    pub fn color_at(&self, square: Square) -> Option<Color> {
        if self.color(Color::White).contains(square) {
            Some(Color::White)
        } else if self.color(Color::Black).contains(square) {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// The piece at `square`, if any.
    #[inline(always)]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        Some(Piece::new(self.color_at(square)?, self.piece_kind_at(square)?))
    }

    /// The player whose turn it is.
    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.info.side_to_move()
    }

    /// The packed game-state word.
    #[inline(always)]
    pub const fn info(&self) -> GameInfo {
        self.info
    }

    /// The Zobrist key of this position.
    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    /// Plies since the last capture or pawn move.
    #[inline(always)]
    pub const fn halfmove(&self) -> u32 {
        self.info.halfmove()
    }

    /// If en passant is available, the square a capturing pawn would land on.
    #[inline(always)]
    pub fn ep_square(&self) -> Option<Square> {
        let file = self.info.ep_file()?;
        Some(Square::new(file, Rank::ep_destination(self.side_to_move())))
    }

    /// Returns `true` if `square` is attacked by any piece of `attacker`.
    ///
    /// Works by looking outward from `square`: a Knight on a
    /// knight-attack square of `square` attacks it, and so on. Pawns use the
    /// *defender's* attack table, which mirrors the attacker's reach.
    pub fn is_attacked(&self, square: Square, attacker: Color) -> bool {
        let occupied = self.occupied();

        (knight_attacks(square) & self.knights(attacker)).is_nonempty()
            || (pawn_attacks(square, attacker.opponent()) & self.pawns(attacker)).is_nonempty()
            || (king_attacks(square) & self.king(attacker)).is_nonempty()
            || (rook_attacks(square, occupied) & self.orthogonal_sliders(attacker)).is_nonempty()
            || (bishop_attacks(square, occupied) & self.diagonal_sliders(attacker)).is_nonempty()
    }

    /// Returns `true` if `color`'s King is attacked.
    ///
    /// A board with no King (possible in hand-built test positions) is never
    /// in check.
    #[inline(always)]
    pub fn in_check(&self, color: Color) -> bool {
        match self.king(color).lsb() {
            Some(king) => self.is_attacked(king, color.opponent()),
            None => false,
        }
    }

    /// Sets a piece on a square, without touching the hash.
    #[inline(always)]
    pub(crate) fn set_piece(&mut self, square: Square, kind: PieceKind, color: Color) {
        self.pieces[kind.index()] |= square;
        self.colors[color.index()] |= square;
    }

    /// Clears a piece from a square, without touching the hash.
    #[inline(always)]
    pub(crate) fn clear_piece(&mut self, square: Square, kind: PieceKind, color: Color) {
        self.pieces[kind.index()] &= !square.bitboard();
        self.colors[color.index()] &= !square.bitboard();
    }

    /// Sets a piece on a square and hashes it in.
    #[inline(always)]
    fn place(&mut self, square: Square, kind: PieceKind, color: Color) {
        self.set_piece(square, kind, color);
        self.key.hash_piece(square, Piece::new(color, kind));
    }

    /// Clears a piece from a square and hashes it out.
    #[inline(always)]
    fn take(&mut self, square: Square, kind: PieceKind, color: Color) {
        self.clear_piece(square, kind, color);
        self.key.hash_piece(square, Piece::new(color, kind));
    }

    /// Applies the castling, en-passant, and side-to-move hash deltas after
    /// the game-info word has reached its post-move value.
    ///
    /// Keeping every non-piece XOR here makes the incremental-hash invariant
    /// checkable against [`ZobristKey::new`] by reading one function.
    #[inline(always)]
    fn rehash_info(&mut self, old: GameInfo) {
        if old.castling_index() != self.info.castling_index() {
            self.key.hash_castling(old.castling_index());
            self.key.hash_castling(self.info.castling_index());
        }

        if old.ep_file() != self.info.ep_file() {
            if let Some(file) = old.ep_file() {
                self.key.hash_ep_file(file);
            }
            if let Some(file) = self.info.ep_file() {
                self.key.hash_ep_file(file);
            }
        }

        // The side to move always flips on make
        self.key.toggle_side_to_move();
    }

    /// Applies `mv` to this position, returning the [`Undo`] record that
    /// reverses it.
    ///
    /// No enforcement of legality; callers provide moves from the legal move
    /// generator. Calling this on a move whose `from` square is empty is an
    /// engine bug and panics.
    pub fn make(&mut self, mv: Move) -> Undo {
        let from = mv.from();
        let to = mv.to();
        let us = self.side_to_move();
        let them = us.opponent();

        let piece = self
            .piece_kind_at(from)
            .expect("make() called with an empty from-square");

        let undo = Undo {
            info: self.info,
            key: self.key,
            mv,
            moved: piece,
        };
        let old_info = self.info;

        self.take(from, piece, us);

        if mv.is_capture() {
            if mv.is_en_passant() {
                // The victim stands one rank behind the destination
                let victim_square = to
                    .backward_by(us, 1)
                    .expect("en passant destination has a square behind it");
                self.take(victim_square, PieceKind::Pawn, them);
            } else {
                let victim = mv
                    .captured()
                    .expect("capture move must record its victim");
                self.take(to, victim, them);

                // Capturing a rook on its home corner kills that right
                match to {
                    Square::A1 => self.info.revoke_queenside(Color::White),
                    Square::H1 => self.info.revoke_kingside(Color::White),
                    Square::A8 => self.info.revoke_queenside(Color::Black),
                    Square::H8 => self.info.revoke_kingside(Color::Black),
                    _ => {}
                }
            }
        }

        self.info.clear_ep();

        if let Some(promotion) = mv.promotion() {
            self.place(to, promotion, us);
        } else {
            self.place(to, piece, us);
            if mv.is_double_push() {
                self.info.set_ep_file(from.file());
            }
        }

        if mv.is_kingside_castle() {
            match us {
                Color::White => {
                    self.take(Square::H1, PieceKind::Rook, us);
                    self.place(Square::F1, PieceKind::Rook, us);
                }
                Color::Black => {
                    self.take(Square::H8, PieceKind::Rook, us);
                    self.place(Square::F8, PieceKind::Rook, us);
                }
            }
        } else if mv.is_queenside_castle() {
            match us {
                Color::White => {
                    self.take(Square::A1, PieceKind::Rook, us);
                    self.place(Square::D1, PieceKind::Rook, us);
                }
                Color::Black => {
                    self.take(Square::A8, PieceKind::Rook, us);
                    self.place(Square::D8, PieceKind::Rook, us);
                }
            }
        }

        if mv.is_capture() || matches!(piece, PieceKind::Pawn) {
            self.info.set_halfmove(0);
        } else {
            self.info.set_halfmove(self.info.halfmove() + 1);
        }

        match piece {
            PieceKind::King => self.info.revoke_all_castling(us),
            PieceKind::Rook => match from {
                Square::A1 => self.info.revoke_queenside(Color::White),
                Square::H1 => self.info.revoke_kingside(Color::White),
                Square::A8 => self.info.revoke_queenside(Color::Black),
                Square::H8 => self.info.revoke_kingside(Color::Black),
                _ => {}
            },
            _ => {}
        }

        if !us.is_white() {
            self.info.set_fullmove(self.info.fullmove() + 1);
        }

        self.info.flip_side_to_move();
        self.rehash_info(old_info);

        undo
    }

    /// Reverses the move recorded in `undo`.
    ///
    /// Game info and hash are restored verbatim; piece transitions are
    /// reversed with raw board edits since the restored hash already matches.
    pub fn unmake(&mut self, undo: Undo) {
        self.info = undo.info;
        self.key = undo.key;

        let mv = undo.mv;
        let from = mv.from();
        let to = mv.to();
        let us = self.side_to_move();
        let them = us.opponent();

        // The piece currently on `to` differs from the mover for promotions
        let on_to = mv.promotion().unwrap_or(undo.moved);
        self.clear_piece(to, on_to, us);
        self.set_piece(from, undo.moved, us);

        if mv.is_en_passant() {
            let victim_square = to
                .backward_by(us, 1)
                .expect("en passant destination has a square behind it");
            self.set_piece(victim_square, PieceKind::Pawn, them);
        } else if mv.is_capture() {
            let victim = mv
                .captured()
                .expect("capture move must record its victim");
            self.set_piece(to, victim, them);
        } else if mv.is_kingside_castle() {
            match us {
                Color::White => {
                    self.clear_piece(Square::F1, PieceKind::Rook, us);
                    self.set_piece(Square::H1, PieceKind::Rook, us);
                }
                Color::Black => {
                    self.clear_piece(Square::F8, PieceKind::Rook, us);
                    self.set_piece(Square::H8, PieceKind::Rook, us);
                }
            }
        } else if mv.is_queenside_castle() {
            match us {
                Color::White => {
                    self.clear_piece(Square::D1, PieceKind::Rook, us);
                    self.set_piece(Square::A1, PieceKind::Rook, us);
                }
                Color::Black => {
                    self.clear_piece(Square::D8, PieceKind::Rook, us);
                    self.set_piece(Square::A8, PieceKind::Rook, us);
                }
            }
        }
    }
}

impl Position {
    /// Exposes the castling-combination index for hashing.
    #[inline(always)]
    pub(crate) const fn castling_index(&self) -> usize {
        self.info.castling_index()
    }
}

impl Default for Position {
    #[inline(always)]
    fn default() -> Self {
        // The startpos FEN is always valid
        Self::from_fen(crate::FEN_STARTPOS).unwrap()
    }
}

impl std::str::FromStr for Position {
    type Err = anyhow::Error;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self> {
        Self::from_fen(s)
    }
}

impl fmt::Display for Position {
    /// Displays this position's FEN string, all six fields.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                let square = Square::new(File::new_unchecked(file), Rank::new_unchecked(rank));
                if let Some(piece) = self.piece_at(square) {
                    if empty > 0 {
                        write!(f, "{empty}")?;
                        empty = 0;
                    }
                    write!(f, "{piece}")?;
                } else {
                    empty += 1;
                }
            }
            if empty > 0 {
                write!(f, "{empty}")?;
            }
            if rank > 0 {
                write!(f, "/")?;
            }
        }

        write!(f, " {} ", self.side_to_move())?;

        if self.info.castling_index() == 0 {
            write!(f, "-")?;
        } else {
            if self.info.can_castle_kingside(Color::White) {
                write!(f, "K")?;
            }
            if self.info.can_castle_queenside(Color::White) {
                write!(f, "Q")?;
            }
            if self.info.can_castle_kingside(Color::Black) {
                write!(f, "k")?;
            }
            if self.info.can_castle_queenside(Color::Black) {
                write!(f, "q")?;
            }
        }

        match self.ep_square() {
            Some(square) => write!(f, " {square}")?,
            None => write!(f, " -")?,
        }

        write!(f, " {} {}", self.halfmove(), self.info.fullmove())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            write!(f, "{}|", rank + 1)?;
            for file in 0..8 {
                let square = Square::new(File::new_unchecked(file), Rank::new_unchecked(rank));
                let c = self.piece_at(square).map(|p| p.char()).unwrap_or('.');
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, " +----------------")?;
        writeln!(f, "   a b c d e f g h")?;
        writeln!(f, "FEN: {self}")?;
        write!(f, "Key: {}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FEN_KIWIPETE, FEN_STARTPOS};

    fn assert_consistent(pos: &Position) {
        // Color boards are disjoint and union to the piece boards
        assert!(pos.color(Color::White).is_disjoint(pos.color(Color::Black)));
        let piece_union = PieceKind::all()
            .into_iter()
            .fold(Bitboard::EMPTY_BOARD, |acc, kind| acc | pos.kind(kind));
        assert_eq!(pos.occupied(), piece_union);

        // Exactly one king per color
        assert_eq!(pos.king(Color::White).population(), 1);
        assert_eq!(pos.king(Color::Black).population(), 1);

        // Stored hash equals the definitional hash
        assert_eq!(pos.key(), ZobristKey::new(pos));
    }

    #[test]
    fn test_fen_round_trip() {
        for fen in [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            "8/8/8/3pP3/8/8/8/R3K2R w KQ - 4 30",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        ] {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.to_string(), fen, "FEN round-trip failed");
            assert_consistent(&pos);
        }
    }

    #[test]
    fn test_fen_rejects_garbage() {
        assert!(Position::from_fen("not a fen").is_err());
        // Missing a rank
        assert!(Position::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        // Two white kings
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/2K1K3 w - - 0 1").is_err());
    }

    #[test]
    fn test_startpos_properties() {
        let pos = Position::default();
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.occupied().population(), 32);
        assert_eq!(pos.halfmove(), 0);
        assert!(pos.info().can_castle_kingside(Color::White));
        assert!(pos.info().can_castle_queenside(Color::Black));
        assert!(pos.ep_square().is_none());
        assert!(!pos.in_check(Color::White));
    }

    #[test]
    fn test_make_unmake_round_trip() {
        let mut pos = Position::default();
        let before = pos;

        // e2e4 sets the en-passant file and hashes it in
        let e2e4 = Move::build(
            Square::E2,
            Square::E4,
            None,
            PieceKind::Pawn,
            None,
            None,
        );
        let undo = pos.make(e2e4);

        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.ep_square(), Some(Square::E3));
        assert_eq!(pos.key(), ZobristKey::new(&pos));
        assert_ne!(pos.key(), before.key());

        pos.unmake(undo);
        assert!(pos == before, "unmake must restore the position bit-exactly");
    }

    #[test]
    fn test_make_capture_and_promotion() {
        // White pawn on b7 can capture the rook on a8 and promote
        let mut pos = Position::from_fen("r3k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let before = pos;

        let mv = Move::build(
            Square::B7,
            Square::A8,
            None,
            PieceKind::Pawn,
            Some(PieceKind::Rook),
            Some(PieceKind::Queen),
        );
        let undo = pos.make(mv);

        assert_eq!(pos.piece_kind_at(Square::A8), Some(PieceKind::Queen));
        assert!(pos.pawns(Color::White).is_empty());
        // Capturing the a8 rook revokes Black's queenside right
        assert!(!pos.info().can_castle_queenside(Color::Black));
        assert_eq!(pos.key(), ZobristKey::new(&pos));

        pos.unmake(undo);
        assert!(pos == before);
        assert_eq!(pos.piece_kind_at(Square::B7), Some(PieceKind::Pawn));
        assert_eq!(pos.piece_kind_at(Square::A8), Some(PieceKind::Rook));
    }

    #[test]
    fn test_make_castle_moves_rook() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let before = pos;

        let mv = Move::build(Square::E1, Square::G1, None, PieceKind::King, None, None);
        let undo = pos.make(mv);

        assert_eq!(pos.piece_kind_at(Square::G1), Some(PieceKind::King));
        assert_eq!(pos.piece_kind_at(Square::F1), Some(PieceKind::Rook));
        assert!(pos.piece_kind_at(Square::H1).is_none());
        assert!(!pos.info().can_castle_kingside(Color::White));
        assert!(!pos.info().can_castle_queenside(Color::White));
        assert!(pos.info().can_castle_kingside(Color::Black));
        assert_eq!(pos.key(), ZobristKey::new(&pos));

        pos.unmake(undo);
        assert!(pos == before);
    }

    #[test]
    fn test_make_en_passant() {
        let mut pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let before = pos;

        let mv = Move::build(
            Square::E5,
            Square::D6,
            pos.ep_square(),
            PieceKind::Pawn,
            None,
            None,
        );
        assert!(mv.is_en_passant());

        let undo = pos.make(mv);
        assert_eq!(pos.piece_kind_at(Square::D6), Some(PieceKind::Pawn));
        assert!(pos.piece_kind_at(Square::D5).is_none(), "victim pawn removed");
        assert_eq!(pos.key(), ZobristKey::new(&pos));

        pos.unmake(undo);
        assert!(pos == before);
    }

    #[test]
    fn test_halfmove_clock() {
        let mut pos = Position::default();

        let mv = Move::build(Square::G1, Square::F3, None, PieceKind::Knight, None, None);
        pos.make(mv);
        assert_eq!(pos.halfmove(), 1);

        let mv = Move::build(Square::B8, Square::C6, None, PieceKind::Knight, None, None);
        pos.make(mv);
        assert_eq!(pos.halfmove(), 2);
        assert_eq!(pos.info().fullmove(), 2);

        // A pawn move resets the clock
        let mv = Move::build(Square::E2, Square::E4, None, PieceKind::Pawn, None, None);
        pos.make(mv);
        assert_eq!(pos.halfmove(), 0);
    }

    #[test]
    fn test_incremental_hash_over_sequence() {
        let mut pos = Position::default();
        let moves = [
            (Square::E2, Square::E4, PieceKind::Pawn),
            (Square::E7, Square::E5, PieceKind::Pawn),
            (Square::G1, Square::F3, PieceKind::Knight),
            (Square::B8, Square::C6, PieceKind::Knight),
            (Square::F1, Square::B5, PieceKind::Bishop),
        ];

        for (from, to, kind) in moves {
            let mv = Move::build(from, to, pos.ep_square(), kind, pos.piece_kind_at(to), None);
            pos.make(mv);
            assert_eq!(
                pos.key(),
                ZobristKey::new(&pos),
                "incremental hash diverged after {mv}"
            );
        }
    }
}
