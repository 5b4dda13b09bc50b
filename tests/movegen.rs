/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use rampart::{
    Bitboard, Color, Game, GameState, MoveKind, PieceKind, Square, ZobristKey, FEN_KIWIPETE,
};

/// After every make, the board representation must stay coherent and the
/// incremental hash must still equal the definitional hash.
fn assert_position_invariants(game: &Game) {
    assert!(
        game.color(Color::White).is_disjoint(game.color(Color::Black)),
        "color boards must be disjoint"
    );

    let piece_union = PieceKind::all()
        .into_iter()
        .fold(Bitboard::EMPTY_BOARD, |acc, kind| acc | game.kind(kind));
    assert_eq!(
        game.occupied(),
        piece_union,
        "color boards and piece boards must describe the same occupancy"
    );

    assert_eq!(game.king(Color::White).population(), 1);
    assert_eq!(game.king(Color::Black).population(), 1);

    assert_eq!(
        game.key(),
        ZobristKey::new(game.position()),
        "incremental hash must match the full recomputation"
    );
}

#[test]
fn test_make_unmake_round_trip_on_kiwipete() {
    let mut game = Game::from_fen(FEN_KIWIPETE).unwrap();
    let before_key = game.key();
    let before_fen = game.position().to_string();

    for mv in game.legal_moves() {
        game.make_move(mv);
        assert_position_invariants(&game);
        game.unmake_move();

        assert_eq!(game.key(), before_key, "hash not restored after {mv}");
        assert_eq!(
            game.position().to_string(),
            before_fen,
            "position not restored after {mv}"
        );
    }
}

#[test]
fn test_deep_make_unmake_round_trip() {
    // Walk the first legal move at every ply for a while, then unwind fully
    let mut game = Game::from_fen(FEN_KIWIPETE).unwrap();
    let before_fen = game.position().to_string();

    let mut made = 0;
    for _ in 0..24 {
        let moves = game.legal_moves();
        let Some(&mv) = moves.first() else { break };
        game.make_move(mv);
        assert_position_invariants(&game);
        made += 1;
    }

    for _ in 0..made {
        game.unmake_move();
    }
    assert_eq!(game.position().to_string(), before_fen);
}

#[test]
fn test_checkmate_has_no_moves() {
    // Fool's-mate mirror
    let mut game =
        Game::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 3").unwrap();
    assert_eq!(game.legal_moves().len(), 0);
    assert_eq!(game.game_state(), GameState::Checkmate);
}

#[test]
fn test_stalemate_has_no_moves() {
    let mut game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(game.legal_moves().len(), 0);
    assert_eq!(game.game_state(), GameState::Stalemate);
}

#[test]
fn test_en_passant_is_generated() {
    let game = Game::from_fen("8/8/8/3pP3/8/8/8/8 w - d6 0 1").unwrap();
    assert!(game
        .legal_moves()
        .iter()
        .any(|mv| mv.kind() == MoveKind::EnPassant));
}

#[test]
fn test_no_en_passant_without_target() {
    // Same pawns, but no en-passant square is recorded
    let game = Game::from_fen("8/8/8/3pP3/8/8/8/R3K2R w KQ - 0 1").unwrap();
    assert!(game
        .legal_moves()
        .iter()
        .all(|mv| mv.kind() != MoveKind::EnPassant));
}

#[test]
fn test_en_passant_exposing_king_is_rejected() {
    // The rook on h5 would check the king on a5 once both pawns leave the rank
    let game = Game::from_fen("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1").unwrap();
    assert!(game
        .legal_moves()
        .iter()
        .all(|mv| mv.kind() != MoveKind::EnPassant));
}

#[test]
fn test_both_castles_available() {
    let game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let moves = game.legal_moves();

    let castle = |kind: MoveKind| moves.iter().find(|mv| mv.kind() == kind).copied();
    let short = castle(MoveKind::KingCastle).expect("kingside castle must be legal");
    let long = castle(MoveKind::QueenCastle).expect("queenside castle must be legal");

    assert_eq!(short.to_string(), "e1g1");
    assert_eq!(long.to_string(), "e1c1");
}

#[test]
fn test_castling_preconditions() {
    // A knight on b1 blocks only the queenside path
    let game = Game::from_fen("4k3/8/8/8/8/8/8/RN2K2R w KQ - 0 1").unwrap();
    let moves = game.legal_moves();
    assert!(moves.iter().any(|mv| mv.kind() == MoveKind::KingCastle));
    assert!(moves.iter().all(|mv| mv.kind() != MoveKind::QueenCastle));

    // In check, neither castle is available
    let game = Game::from_fen("4r3/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
    let moves = game.legal_moves();
    assert!(moves.iter().all(|mv| !mv.is_castle()));
}

#[test]
fn test_pinned_bishop_cannot_leave_file() {
    // The rook on e8 pins the e2 bishop against the king; a bishop cannot
    // move along a file, so it has no legal moves at all
    let game = Game::from_fen("4r3/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
    assert!(game.legal_moves().iter().all(|mv| mv.from() != Square::E2));
}

#[test]
fn test_every_generated_move_is_reversible_and_legal() {
    // The legality invariant, stated directly: a generated move never leaves
    // its own side in check, and unmake restores the state bit-exactly
    for fen in [
        FEN_KIWIPETE,
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    ] {
        let mut game = Game::from_fen(fen).unwrap();
        let mover = game.side_to_move();
        let before_key = game.key();

        for mv in game.legal_moves() {
            game.make_move(mv);
            assert!(
                !game.position().in_check(mover),
                "move {mv} on {fen} leaves the mover in check"
            );
            game.unmake_move();
            assert_eq!(game.key(), before_key);
        }
    }
}
