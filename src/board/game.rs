/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Deref, str::FromStr};

use anyhow::Result;

use super::{
    bishop_attacks, bishop_rays, king_attacks, knight_attacks, pawn_attacks, pawn_pushes,
    ray_between, ray_containing, rook_attacks, rook_rays, Bitboard, Color, Move, MoveList,
    PieceKind, Position, Rank, Square, Undo, ZobristKey,
};

/// Capacity of the fixed search history stack.
///
/// Covers the search depth cap plus the longest plausible quiescence chain.
pub const MAX_SEARCH_HISTORY: usize = 128;

/// The outcome status of a game.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum GameState {
    /// The game is still being played.
    Ongoing,

    /// The side to move has no legal moves and is in check.
    Checkmate,

    /// The side to move has no legal moves and is not in check.
    Stalemate,

    /// The same position occurred three times.
    DrawRepetition,

    /// One hundred plies passed without a capture or pawn move.
    DrawFiftyMoves,

    /// Neither side can possibly deliver checkmate.
    DrawInsufficientMaterial,
}

impl GameState {
    /// Returns `true` if the game has ended.
    #[inline(always)]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ongoing)
    }

    /// Returns `true` if the game ended in a draw.
    #[inline(always)]
    pub const fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::Stalemate
                | Self::DrawRepetition
                | Self::DrawFiftyMoves
                | Self::DrawInsufficientMaterial
        )
    }
}

/// Per-call move generation state for the side to move.
struct MovegenContext {
    us: Color,

    /// The friendly King's square, if one is on the board.
    king: Option<Square>,

    /// Squares attacked by the enemy, computed with the friendly King removed
    /// from the occupancy so sliders "see through" him. Required so the King
    /// cannot legally retreat along a checking ray.
    enemy_attacks: Bitboard,

    /// Enemy pieces currently attacking the friendly King.
    checkers: Bitboard,

    /// When in single check, the squares a non-King move may land on: the
    /// checker itself plus the ray between it and the King. Full otherwise.
    checkmask: Bitboard,

    /// Friendly pieces that are the sole blocker between the King and an
    /// enemy slider.
    pinned: Bitboard,

    /// Squares a non-King piece may target: anything but friendly pieces and
    /// the enemy King.
    targets: Bitboard,
}

/// A game of chess.
///
/// Wraps a [`Position`] with the move histories needed for unmake and
/// repetition detection, a cache of the derived [`GameState`], and the legal
/// move generator.
///
/// Two histories back make/unmake: a growable list for game play and a
/// fixed-capacity stack for search, selected by "fast mode". Per-ply
/// allocation would otherwise dominate search cost.
#[derive(Clone)]
pub struct Game {
    position: Position,

    /// History of the game's moves, used outside of search.
    history: Vec<Undo>,

    /// Fixed-capacity history used while fast mode is enabled.
    stack: Box<[Undo; MAX_SEARCH_HISTORY]>,
    stack_len: usize,

    /// When set, make/unmake use the fixed stack instead of the list.
    fast_mode: bool,

    /// Cached game state, keyed by the position's hash.
    state_cache: Option<(ZobristKey, GameState)>,

    /// Cached result of the rule-draw predicate, keyed by the hash.
    draw_cache: Option<(ZobristKey, bool)>,
}

impl Game {
    /// Creates a new [`Game`] from the provided [`Position`].
    pub fn new(position: Position) -> Self {
        Self {
            position,
            history: Vec::with_capacity(512),
            stack: Box::new([Undo::default(); MAX_SEARCH_HISTORY]),
            stack_len: 0,
            fast_mode: false,
            state_cache: None,
            draw_cache: None,
        }
    }

    /// Creates a new [`Game`] from the provided FEN string.
    #[inline(always)]
    pub fn from_fen(fen: &str) -> Result<Self> {
        Ok(Self::new(Position::from_fen(fen)?))
    }

    /// Fetch the internal [`Position`] of this [`Game`].
    #[inline(always)]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    /// Returns `true` if the side to move is in check.
    #[inline(always)]
    pub fn is_in_check(&self) -> bool {
        self.position.in_check(self.position.side_to_move())
    }

    /// Applies the provided [`Move`] and records it in the active history.
    ///
    /// No enforcement of legality.
    pub fn make_move(&mut self, mv: Move) {
        let undo = self.position.make(mv);

        if self.fast_mode {
            assert!(
                self.stack_len < MAX_SEARCH_HISTORY,
                "search history stack overflow"
            );
            self.stack[self.stack_len] = undo;
            self.stack_len += 1;
        } else {
            self.history.push(undo);
        }

        self.invalidate_caches();
    }

    /// Reverses the most recent move in the active history.
    ///
    /// # Panics
    /// If the active history is empty; popping a move that was never made is
    /// an engine bug.
    pub fn unmake_move(&mut self) {
        let undo = if self.fast_mode {
            assert!(self.stack_len > 1, "no search history to unmake");
            self.stack_len -= 1;
            self.stack[self.stack_len]
        } else {
            self.history.pop().expect("no game history to unmake")
        };

        self.position.unmake(undo);
        self.invalidate_caches();
    }

    /// Switches make/unmake onto the fixed-size stack, seeding it with the
    /// current state.
    pub fn enable_fast_mode(&mut self) {
        self.fast_mode = true;
        self.stack[0] = Undo {
            info: self.position.info(),
            key: self.position.key(),
            mv: Move::NONE,
            moved: PieceKind::Pawn,
        };
        self.stack_len = 1;
    }

    /// Switches make/unmake back onto the growable game history.
    #[inline(always)]
    pub fn disable_fast_mode(&mut self) {
        self.fast_mode = false;
    }

    #[inline(always)]
    fn invalidate_caches(&mut self) {
        self.state_cache = None;
        self.draw_cache = None;
    }

    /// Returns `true` if the current position occurred at least three times.
    ///
    /// Walks the search stack newest-first and then the game history,
    /// comparing stored hashes. Positions older than the halfmove clock are
    /// unreachable by repetition, so the walk stops there.
    ///
    /// The stack's seed entry always mirrors its most recent counterpart
    /// (the position the search started from), so it is never counted; that
    /// keeps the entry shared by the two histories from being counted twice.
    pub fn is_repetition(&self) -> bool {
        let current = self.position.key();
        let mut count = 1;
        let mut remaining = self.position.halfmove() as i32;

        if remaining < 2 {
            return false;
        }

        if self.fast_mode {
            for i in (1..self.stack_len).rev() {
                if self.stack[i].key == current {
                    count += 1;
                    if count >= 3 {
                        return true;
                    }
                }
                remaining -= 1;
                if remaining <= 0 {
                    return false;
                }
            }
        }

        for undo in self.history.iter().rev() {
            if undo.key == current {
                count += 1;
                if count >= 3 {
                    return true;
                }
            }
            remaining -= 1;
            if remaining <= 0 {
                return false;
            }
        }

        false
    }

    /// Returns `true` if one hundred plies passed without a capture or pawn
    /// move.
    #[inline(always)]
    pub fn is_fifty_move_rule(&self) -> bool {
        self.position.halfmove() >= 100
    }

    /// Returns `true` if neither side can possibly deliver checkmate.
    ///
    /// Classifies K vs K, K+B vs K, K+N vs K, and K+B vs K+B with both
    /// bishops on the same square color as dead. Everything else (including
    /// K+N+N vs K, which is legal to play on) is treated as sufficient.
    pub fn is_insufficient_material(&self) -> bool {
        let pos = &self.position;

        // Any Queen, Rook, or Pawn leaves mating chances
        if (pos.kind(PieceKind::Queen) | pos.kind(PieceKind::Rook) | pos.kind(PieceKind::Pawn))
            .is_nonempty()
        {
            return false;
        }

        let wb = pos.bishops(Color::White);
        let wn = pos.knights(Color::White);
        let bb = pos.bishops(Color::Black);
        let bn = pos.knights(Color::Black);

        match (
            wb.population(),
            wn.population(),
            bb.population(),
            bn.population(),
        ) {
            // Lone kings...
            (0, 0, 0, 0) |
            // ...or a single bishop...
            (1, 0, 0, 0) | (0, 0, 1, 0) |
            // ...or a single knight...
            (0, 1, 0, 0) | (0, 0, 0, 1) => true,

            // ...or each side has one bishop, both on the same square color
            (1, 0, 1, 0) => {
                wb.to_square_unchecked().color() == bb.to_square_unchecked().color()
            }

            _ => false,
        }
    }

    /// Returns `true` if the position is drawn by rule (fifty moves,
    /// repetition, or insufficient material). The result is cached until the
    /// next make/unmake.
    pub fn is_draw(&mut self) -> bool {
        let key = self.position.key();
        if let Some((cached_key, draw)) = self.draw_cache {
            if cached_key == key {
                return draw;
            }
        }

        let draw =
            self.is_fifty_move_rule() || self.is_repetition() || self.is_insufficient_material();
        self.draw_cache = Some((key, draw));
        draw
    }

    /// Derives the [`GameState`] of the current position. The result is
    /// cached until the next make/unmake.
    pub fn game_state(&mut self) -> GameState {
        let key = self.position.key();
        if let Some((cached_key, state)) = self.state_cache {
            if cached_key == key {
                return state;
            }
        }

        let state = self.compute_game_state();
        self.state_cache = Some((key, state));
        state
    }

    fn compute_game_state(&self) -> GameState {
        if self.is_fifty_move_rule() {
            return GameState::DrawFiftyMoves;
        }
        if self.is_insufficient_material() {
            return GameState::DrawInsufficientMaterial;
        }
        if self.is_repetition() {
            return GameState::DrawRepetition;
        }

        if self.legal_moves().is_empty() {
            if self.is_in_check() {
                GameState::Checkmate
            } else {
                GameState::Stalemate
            }
        } else {
            GameState::Ongoing
        }
    }

    /// Generate all legal moves from the current position.
    ///
    /// The returned set is exactly the set of moves after which the side that
    /// just moved is not in check.
    #[inline(always)]
    pub fn legal_moves(&self) -> MoveList {
        self.generate_moves(false)
    }

    /// Generate only the legal capturing moves (including en passant and
    /// promotion-captures). This is what quiescence search consumes.
    #[inline(always)]
    pub fn capture_moves(&self) -> MoveList {
        self.generate_moves(true)
    }

    fn generate_moves(&self, captures_only: bool) -> MoveList {
        let ctx = self.movegen_context();
        let mut moves = MoveList::default();

        self.generate_king_moves(&ctx, captures_only, &mut moves);

        // In double check, only the King may move
        if ctx.checkers.population() > 1 {
            return moves;
        }

        self.generate_pawn_moves(&ctx, captures_only, &mut moves);
        self.generate_knight_moves(&ctx, captures_only, &mut moves);
        self.generate_slider_moves(&ctx, captures_only, &mut moves);

        moves
    }

    /// Computes the enemy attack map, checkers, checkmask, and pin set for
    /// the side to move.
    fn movegen_context(&self) -> MovegenContext {
        let pos = &self.position;
        let us = pos.side_to_move();
        let them = us.opponent();
        let occupied = pos.occupied();

        let king = pos.king(us).lsb();

        // Remove our King before computing enemy attacks, so sliders cover
        // the squares behind him along their checking rays.
        let occ_sans_king = match king {
            Some(k) => occupied ^ k.bitboard(),
            None => occupied,
        };

        let mut enemy_attacks = Bitboard::EMPTY_BOARD;
        for from in pos.pawns(them) {
            enemy_attacks |= pawn_attacks(from, them);
        }
        for from in pos.knights(them) {
            enemy_attacks |= knight_attacks(from);
        }
        for from in pos.king(them) {
            enemy_attacks |= king_attacks(from);
        }
        for from in pos.diagonal_sliders(them) {
            enemy_attacks |= bishop_attacks(from, occ_sans_king);
        }
        for from in pos.orthogonal_sliders(them) {
            enemy_attacks |= rook_attacks(from, occ_sans_king);
        }

        let mut checkers = Bitboard::EMPTY_BOARD;
        let mut pinned = Bitboard::EMPTY_BOARD;
        let mut checkmask = Bitboard::FULL_BOARD;

        if let Some(k) = king {
            checkers = (knight_attacks(k) & pos.knights(them))
                | (pawn_attacks(k, us) & pos.pawns(them))
                | (rook_attacks(k, occupied) & pos.orthogonal_sliders(them))
                | (bishop_attacks(k, occupied) & pos.diagonal_sliders(them));

            // Any enemy slider with exactly one friendly piece on its ray to
            // the King pins that piece to the ray.
            let aligned_sliders = (rook_rays(k) & pos.orthogonal_sliders(them))
                | (bishop_rays(k) & pos.diagonal_sliders(them));
            for slider in aligned_sliders {
                let blockers = ray_between(k, slider) & occupied;
                if blockers.population() == 1 {
                    pinned |= blockers & pos.color(us);
                }
            }

            if checkers.is_nonempty() {
                checkmask = checkers;
                for checker in checkers {
                    checkmask |= ray_between(k, checker);
                }
            }
        }

        // Never target friendly pieces, and never capture the enemy King
        let targets = pos.enemy_or_empty(us) ^ pos.king(them);

        MovegenContext {
            us,
            king,
            enemy_attacks,
            checkers,
            checkmask,
            pinned,
            targets,
        }
    }

    /// Builds a move from `from` to `to`, reading the victim off the board
    /// and inferring the move kind.
    #[inline(always)]
    fn push_move(
        &self,
        from: Square,
        to: Square,
        piece: PieceKind,
        promotion: Option<PieceKind>,
        moves: &mut MoveList,
    ) {
        moves.push(Move::build(
            from,
            to,
            self.position.ep_square(),
            piece,
            self.position.piece_kind_at(to),
            promotion,
        ));
    }

    fn generate_king_moves(&self, ctx: &MovegenContext, captures_only: bool, moves: &mut MoveList) {
        let Some(from) = ctx.king else {
            return;
        };
        let pos = &self.position;
        let us = ctx.us;

        let mut attacks = king_attacks(from) & ctx.targets & !ctx.enemy_attacks;
        if captures_only {
            attacks &= pos.color(us.opponent());
        }
        for to in attacks {
            self.push_move(from, to, PieceKind::King, None, moves);
        }

        // Castling: the right must be held, the squares between King and Rook
        // must be empty, and the King's path (start, middle, destination)
        // must not be attacked. Being in check fails the "start" condition.
        if captures_only || ctx.checkers.is_nonempty() {
            return;
        }

        let occupied = pos.occupied();
        let info = pos.info();

        let (kingside_empty, kingside_safe, kingside_to) = match us {
            Color::White => (
                Square::F1.bitboard() | Square::G1,
                Square::E1.bitboard() | Square::F1 | Square::G1,
                Square::G1,
            ),
            Color::Black => (
                Square::F8.bitboard() | Square::G8,
                Square::E8.bitboard() | Square::F8 | Square::G8,
                Square::G8,
            ),
        };
        if info.can_castle_kingside(us)
            && (occupied & kingside_empty).is_empty()
            && (ctx.enemy_attacks & kingside_safe).is_empty()
        {
            self.push_move(from, kingside_to, PieceKind::King, None, moves);
        }

        let (queenside_empty, queenside_safe, queenside_to) = match us {
            Color::White => (
                Square::B1.bitboard() | Square::C1 | Square::D1,
                Square::C1.bitboard() | Square::D1 | Square::E1,
                Square::C1,
            ),
            Color::Black => (
                Square::B8.bitboard() | Square::C8 | Square::D8,
                Square::C8.bitboard() | Square::D8 | Square::E8,
                Square::C8,
            ),
        };
        if info.can_castle_queenside(us)
            && (occupied & queenside_empty).is_empty()
            && (ctx.enemy_attacks & queenside_safe).is_empty()
        {
            self.push_move(from, queenside_to, PieceKind::King, None, moves);
        }
    }

    fn generate_pawn_moves(&self, ctx: &MovegenContext, captures_only: bool, moves: &mut MoveList) {
        let pos = &self.position;
        let us = ctx.us;
        let occupied = pos.occupied();

        for from in pos.pawns(us) {
            let pin_ray = match (ctx.pinned.contains(from), ctx.king) {
                (true, Some(k)) => ray_containing(from, k),
                _ => Bitboard::FULL_BOARD,
            };

            let mut targets = pawn_attacks(from, us) & pos.color(us.opponent()) & ctx.targets;

            if !captures_only {
                // The double push is masked off when the intermediate square
                // is blocked: shifting every other piece forward one rank
                // projects single-push blockers onto the double-push square.
                let all_but_this_pawn = occupied ^ from;
                let double_push_mask =
                    all_but_this_pawn | all_but_this_pawn.forward_by(us, 1);
                targets |= pawn_pushes(from, us) & !double_push_mask & !occupied;
            }

            targets &= ctx.checkmask & pin_ray;

            for to in targets {
                if to.rank() == Rank::eighth(us) {
                    for promotion in PieceKind::promotions() {
                        self.push_move(from, to, PieceKind::Pawn, Some(promotion), moves);
                    }
                } else {
                    self.push_move(from, to, PieceKind::Pawn, None, moves);
                }
            }

            // En passant sidesteps the masks above: the captured pawn is not
            // on the destination square, so neither the checkmask nor the pin
            // ray models it correctly (the "discovered check through both
            // pawns" corner case). Verify each candidate by making it.
            if let Some(ep_square) = pos.ep_square() {
                if pawn_attacks(from, us).contains(ep_square) {
                    let mv = Move::build(
                        from,
                        ep_square,
                        Some(ep_square),
                        PieceKind::Pawn,
                        None,
                        None,
                    );
                    if self.en_passant_is_legal(mv) {
                        moves.push(mv);
                    }
                }
            }
        }
    }

    /// Applies an en-passant candidate to a scratch copy of the position and
    /// checks that the mover's King did not end up in check.
    #[inline(always)]
    fn en_passant_is_legal(&self, mv: Move) -> bool {
        let mut scratch = self.position;
        let us = scratch.side_to_move();
        scratch.make(mv);
        !scratch.in_check(us)
    }

    fn generate_knight_moves(
        &self,
        ctx: &MovegenContext,
        captures_only: bool,
        moves: &mut MoveList,
    ) {
        let pos = &self.position;

        for from in pos.knights(ctx.us) {
            let mut targets = knight_attacks(from) & ctx.targets & ctx.checkmask;

            // A pinned knight can never stay on its pin ray
            if ctx.pinned.contains(from) {
                if let Some(k) = ctx.king {
                    targets &= ray_containing(from, k);
                }
            }
            if captures_only {
                targets &= pos.color(ctx.us.opponent());
            }

            for to in targets {
                self.push_move(from, to, PieceKind::Knight, None, moves);
            }
        }
    }

    fn generate_slider_moves(
        &self,
        ctx: &MovegenContext,
        captures_only: bool,
        moves: &mut MoveList,
    ) {
        let pos = &self.position;
        let occupied = pos.occupied();

        for (sliders, orthogonal) in [
            (pos.orthogonal_sliders(ctx.us), true),
            (pos.diagonal_sliders(ctx.us), false),
        ] {
            for from in sliders {
                let attacks = if orthogonal {
                    rook_attacks(from, occupied)
                } else {
                    bishop_attacks(from, occupied)
                };

                let mut targets = attacks & ctx.targets & ctx.checkmask;
                if ctx.pinned.contains(from) {
                    if let Some(k) = ctx.king {
                        targets &= ray_containing(from, k);
                    }
                }
                if captures_only {
                    targets &= pos.color(ctx.us.opponent());
                }

                // Queens appear in both slider sets; report their own kind
                let piece = pos
                    .piece_kind_at(from)
                    .expect("slider generation from an empty square");

                for to in targets {
                    self.push_move(from, to, piece, None, moves);
                }
            }
        }
    }
}

impl Deref for Game {
    type Target = Position;

    /// A [`Game`] immutably dereferences to its [`Position`], for simplicity.
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.position
    }
}

impl Default for Game {
    /// Standard starting position for chess.
    #[inline(always)]
    fn default() -> Self {
        Self::new(Position::default())
    }
}

impl FromStr for Game {
    type Err = anyhow::Error;

    /// Wrapper for [`Game::from_fen`].
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self> {
        Self::from_fen(s)
    }
}

impl fmt::Display for Game {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.position)
    }
}

/// Recursively makes all legal moves until `depth`, returning the number of
/// leaf nodes reached.
pub fn perft(game: &mut Game, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = game.legal_moves();

    // The legal generator makes bulk counting at the horizon free
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves {
        game.make_move(mv);
        nodes += perft(game, depth - 1);
        game.unmake_move();
    }
    nodes
}

/// Like [`perft`], but prints the node count of each root move, as most GUIs
/// and debugging workflows expect.
pub fn splitperft(game: &mut Game, depth: usize) -> u64 {
    let mut nodes = 0;

    for mv in game.legal_moves() {
        game.make_move(mv);
        let count = if depth > 1 { perft(game, depth - 1) } else { 1 };
        game.unmake_move();

        println!("{mv}: {count}");
        nodes += count;
    }

    println!();
    println!("{nodes}");
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{File, MoveKind, FEN_STARTPOS};

    #[test]
    fn test_startpos_has_twenty_moves() {
        let game = Game::default();
        assert_eq!(game.legal_moves().len(), 20);
        assert!(game.capture_moves().is_empty());
    }

    #[test]
    fn test_make_unmake_restores_through_history() {
        let mut game = Game::default();
        let key_before = game.key();

        for mv_str in ["e2e4", "c7c5", "g1f3"] {
            let mv = Move::from_uci(&game, mv_str).unwrap();
            game.make_move(mv);
        }
        for _ in 0..3 {
            game.unmake_move();
        }

        assert_eq!(game.key(), key_before);
        assert_eq!(game.to_string(), Game::default().to_string());
    }

    #[test]
    fn test_fast_mode_stack_round_trip() {
        let mut game = Game::from_fen(FEN_STARTPOS).unwrap();
        game.enable_fast_mode();

        let key_before = game.key();
        let mv = Move::from_uci(&game, "d2d4").unwrap();
        game.make_move(mv);
        game.unmake_move();
        assert_eq!(game.key(), key_before);

        game.disable_fast_mode();
    }

    #[test]
    #[should_panic(expected = "no game history")]
    fn test_unmake_with_no_history_panics() {
        let mut game = Game::default();
        game.unmake_move();
    }

    #[test]
    fn test_threefold_repetition() {
        let mut game = Game::default();

        // Shuffle the knights back and forth until the start position has
        // occurred three times
        for mv_str in [
            "g1f3", "g8f6", "f3g1", "f6g8", // startpos x2
            "g1f3", "g8f6", "f3g1", "f6g8", // startpos x3
        ] {
            assert!(!game.is_repetition());
            let mv = Move::from_uci(&game, mv_str).unwrap();
            game.make_move(mv);
        }

        assert!(game.is_repetition());
        assert_eq!(game.game_state(), GameState::DrawRepetition);
    }

    #[test]
    fn test_threefold_spans_both_histories() {
        let mut game = Game::default();

        // Two occurrences in game history...
        for mv_str in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1"] {
            let mv = Move::from_uci(&game, mv_str).unwrap();
            game.make_move(mv);
        }

        // ...and the third found while searching on the fixed stack
        game.enable_fast_mode();
        let mv = Move::from_uci(&game, "f6g8").unwrap();
        game.make_move(mv);
        assert!(game.is_repetition());

        game.unmake_move();
        game.disable_fast_mode();
    }

    #[test]
    fn test_fifty_move_rule() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w - - 100 80").unwrap();
        assert!(game.is_fifty_move_rule());
        assert_eq!(game.game_state(), GameState::DrawFiftyMoves);
    }

    #[test]
    fn test_insufficient_material() {
        for fen in [
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",          // K vs K
            "4k3/8/8/8/8/8/5B2/4K3 w - - 0 1",        // K+B vs K
            "4k3/8/2n5/8/8/8/8/4K3 w - - 0 1",        // K vs K+N
            "4k3/2b5/8/8/8/8/5B2/4K3 w - - 0 1",      // same-color bishops
        ] {
            let game = Game::from_fen(fen).unwrap();
            assert!(game.is_insufficient_material(), "{fen} should be dead");
        }

        for fen in [
            FEN_STARTPOS,
            "4k3/3b4/8/8/8/8/5B2/4K3 w - - 0 1", // opposite-color bishops
            "4k3/8/8/8/8/8/5P2/4K3 w - - 0 1",   // a pawn can promote
        ] {
            let game = Game::from_fen(fen).unwrap();
            assert!(!game.is_insufficient_material(), "{fen} is not dead");
        }
    }

    #[test]
    fn test_checkmate_and_stalemate_detection() {
        // Fool's-mate mirror: White is checkmated
        let mut game =
            Game::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 3")
                .unwrap();
        assert!(game.legal_moves().is_empty());
        assert_eq!(game.game_state(), GameState::Checkmate);

        // Black is stalemated
        let mut game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(game.legal_moves().is_empty());
        assert_eq!(game.game_state(), GameState::Stalemate);
    }

    #[test]
    fn test_en_passant_appears() {
        let game = Game::from_fen("8/8/8/3pP3/8/8/8/8 w - d6 0 1").unwrap();
        let moves = game.legal_moves();
        assert!(
            moves.iter().any(|mv| mv.kind() == MoveKind::EnPassant),
            "en passant should be generated: {moves:?}"
        );
    }

    #[test]
    fn test_en_passant_through_horizontal_pin_is_illegal() {
        // Capturing en passant would clear both pawns off the fifth rank,
        // exposing the white king to the rook
        let game = Game::from_fen("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1").unwrap();
        let moves = game.legal_moves();
        assert!(
            moves.iter().all(|mv| mv.kind() != MoveKind::EnPassant),
            "en passant must be rejected: {moves:?}"
        );
    }

    #[test]
    fn test_castling_both_ways() {
        let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let moves = game.legal_moves();
        assert!(moves.iter().any(|mv| mv.kind() == MoveKind::KingCastle));
        assert!(moves.iter().any(|mv| mv.kind() == MoveKind::QueenCastle));
    }

    #[test]
    fn test_castling_blocked_by_attack() {
        // The rook on f8 attacks f1, so White may only castle long
        let game = Game::from_fen("5r2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = game.legal_moves();
        assert!(moves.iter().all(|mv| mv.kind() != MoveKind::KingCastle));
        assert!(moves.iter().any(|mv| mv.kind() == MoveKind::QueenCastle));
    }

    #[test]
    fn test_pinned_piece_restricted_to_ray() {
        // Rook on e8 pins the bishop on e2 to the e-file; bishops cannot move
        // along files, so the bishop is frozen
        let game = Game::from_fen("4r3/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        let moves = game.legal_moves();
        assert!(
            moves.iter().all(|mv| mv.from() != Square::E2),
            "pinned bishop must be frozen: {moves:?}"
        );

        // A rook pinned on a file may still slide along it
        let game = Game::from_fen("4r3/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        let moves = game.legal_moves();
        assert!(moves.iter().any(|mv| mv.from() == Square::E2 && mv.to() == Square::E5));
        assert!(moves.iter().all(|mv| mv.from() != Square::E2 || mv.to().file() == File::E));
    }

    #[test]
    fn test_king_cannot_retreat_along_checking_ray() {
        // The rook checks along the e-file; e1 is "behind" the king but still
        // on the ray, so the king may not step there
        let game = Game::from_fen("4r3/8/8/8/8/8/4K3/8 w - - 0 1").unwrap();
        let moves = game.legal_moves();
        assert!(moves.iter().all(|mv| mv.to() != Square::E1));
        assert!(moves.iter().any(|mv| mv.to() == Square::D3));
    }

    #[test]
    fn test_double_check_only_king_moves() {
        // Knight on f6 and rook on e8 both check the king on e4
        let game = Game::from_fen("4r3/8/5n2/8/4K3/8/8/8 w - - 0 1").unwrap();
        let moves = game.legal_moves();
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|mv| mv.from() == Square::E4));
    }

    #[test]
    fn test_capture_only_mode_is_subset() {
        let game = Game::from_fen(crate::FEN_KIWIPETE).unwrap();
        let all = game.legal_moves();
        let captures = game.capture_moves();

        assert!(!captures.is_empty());
        for mv in &captures {
            assert!(mv.is_capture());
            assert!(all.contains(mv), "{mv} missing from full move list");
        }
        for mv in &all {
            if mv.is_capture() {
                assert!(captures.contains(mv), "{mv} missing from capture list");
            }
        }
    }
}
