/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use rampart::{perft, Game, FEN_KIWIPETE, FEN_STARTPOS};

fn test_perft_fen_nodes(depth: usize, fen: &str, expected: u64) {
    let mut game = Game::from_fen(fen).unwrap();
    let nodes = perft(&mut game, depth);
    assert_eq!(nodes, expected, "perft({depth}) failed on {fen}");
}

mod startpos_perft {
    use super::*;

    #[test]
    fn test_startpos_perft_1() {
        test_perft_fen_nodes(1, FEN_STARTPOS, 20);
    }

    #[test]
    fn test_startpos_perft_2() {
        test_perft_fen_nodes(2, FEN_STARTPOS, 400);
    }

    #[test]
    fn test_startpos_perft_3() {
        test_perft_fen_nodes(3, FEN_STARTPOS, 8_902);
    }

    #[test]
    fn test_startpos_perft_4() {
        test_perft_fen_nodes(4, FEN_STARTPOS, 197_281);
    }

    /// Anchor node: the full rules must agree here.
    #[test]
    fn test_startpos_perft_5() {
        test_perft_fen_nodes(5, FEN_STARTPOS, 4_865_609);
    }
}

mod kiwipete_perft {
    use super::*;

    #[test]
    fn test_kiwipete_perft_1() {
        test_perft_fen_nodes(1, FEN_KIWIPETE, 48);
    }

    #[test]
    fn test_kiwipete_perft_2() {
        test_perft_fen_nodes(2, FEN_KIWIPETE, 2_039);
    }

    #[test]
    fn test_kiwipete_perft_3() {
        test_perft_fen_nodes(3, FEN_KIWIPETE, 97_862);
    }

    /// Anchor node: castling, en passant, promotions, and pins all interact.
    #[test]
    fn test_kiwipete_perft_4() {
        test_perft_fen_nodes(4, FEN_KIWIPETE, 4_085_603);
    }
}

/// Positions from <https://www.chessprogramming.org/Perft_Results>.
mod tricky_perft {
    use super::*;

    /// En passant discoveries and promotion underflow.
    const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

    /// Mirrored castling rights with promotion threats.
    const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";

    /// A bugcatcher: promotions, blocked castling, and checks.
    const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

    #[test]
    fn test_position_3_shallow() {
        test_perft_fen_nodes(1, POSITION_3, 14);
        test_perft_fen_nodes(2, POSITION_3, 191);
        test_perft_fen_nodes(3, POSITION_3, 2_812);
        test_perft_fen_nodes(4, POSITION_3, 43_238);
    }

    #[test]
    fn test_position_3_deep() {
        test_perft_fen_nodes(5, POSITION_3, 674_624);
    }

    #[test]
    fn test_position_4() {
        test_perft_fen_nodes(1, POSITION_4, 6);
        test_perft_fen_nodes(2, POSITION_4, 264);
        test_perft_fen_nodes(3, POSITION_4, 9_467);
        test_perft_fen_nodes(4, POSITION_4, 422_333);
    }

    #[test]
    fn test_position_5() {
        test_perft_fen_nodes(1, POSITION_5, 44);
        test_perft_fen_nodes(2, POSITION_5, 1_486);
        test_perft_fen_nodes(3, POSITION_5, 62_379);
        test_perft_fen_nodes(4, POSITION_5, 2_103_487);
    }
}

mod promotion_perft {
    use super::*;

    const PROMOTIONS: &str = "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1";

    #[test]
    fn test_promotion_perft_shallow() {
        test_perft_fen_nodes(1, PROMOTIONS, 24);
        test_perft_fen_nodes(2, PROMOTIONS, 496);
        test_perft_fen_nodes(3, PROMOTIONS, 9_483);
    }

    #[test]
    fn test_promotion_perft_deep() {
        test_perft_fen_nodes(4, PROMOTIONS, 182_838);
    }
}
