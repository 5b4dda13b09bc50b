/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use uci_parser::{UciInfo, UciResponse, UciSearchOptions};

use crate::{Bitboard, Bound, Evaluator, Game, Move, ProbeResult, Score, TTable};

/// Maximum depth that can be searched.
pub const MAX_DEPTH: usize = 50;

/// Margin for delta pruning in quiescence: a queen's worth of swing.
const DELTA_MARGIN: i32 = 900;

/// The result of a search, containing the best move found, score, and total
/// nodes searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Best move found during the search.
    pub bestmove: Option<Move>,

    /// Evaluation of the position after `bestmove` is made.
    pub score: Score,

    /// Deepest fully-attempted iteration.
    pub depth: usize,
}

impl Default for SearchResult {
    /// A default search result initializes to a *very bad* score, since there
    /// is not yet a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: -Score::INF,
            depth: 0,
        }
    }
}

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum depth to execute the search.
    pub max_depth: usize,

    /// Node allowance; the search exits as soon as possible once exceeded.
    pub max_nodes: u64,

    /// Start time of the search.
    pub starttime: Instant,

    /// Time budget. The search cancels cooperatively once it is exhausted.
    pub budget: Duration,

    /// If non-empty, the root only considers these moves.
    pub searchmoves: Vec<Move>,

    /// Whether to emit extra diagnostics when the search concludes.
    pub debug: bool,
}

impl SearchConfig {
    /// Constructs a new [`SearchConfig`] from UCI `go` options.
    ///
    /// The [`Game`] determines the side to move for clock selection and
    /// resolves `searchmoves` strings against the legal moves.
    pub fn new(options: UciSearchOptions, game: &Game) -> Self {
        let mut config = Self::default();

        if let Some(depth) = options.depth {
            config.max_depth = depth as usize;
        }

        if let Some(nodes) = options.nodes {
            config.max_nodes = nodes as u64;
        }

        config.budget = if let Some(movetime) = options.movetime {
            movetime
        } else if options.infinite || options.ponder {
            Duration::MAX
        } else {
            // Divide the remaining clock into slices, spend one slice plus
            // the increment, and keep a safety margin for I/O latency.
            let (time, inc) = if game.side_to_move().is_white() {
                (options.wtime, options.winc)
            } else {
                (options.btime, options.binc)
            };

            match time {
                Some(remaining) => {
                    let moves_to_go = options.movestogo.map(|mtg| mtg as u32).unwrap_or(30).max(1);
                    let slice = remaining / moves_to_go;
                    let inc = inc.unwrap_or(Duration::ZERO);
                    (slice + inc)
                        .saturating_sub(Duration::from_millis(50))
                        .max(Duration::from_millis(10))
                }
                // No clock at all; pick something reasonable
                None => Duration::from_millis(2_000),
            }
        };

        for mv_str in &options.searchmoves {
            match Move::from_uci(game, mv_str) {
                Ok(mv) => config.searchmoves.push(mv),
                Err(_) => println!("info string ignoring unknown searchmove {mv_str}"),
            }
        }

        config
    }
}

impl Default for SearchConfig {
    /// A default [`SearchConfig`] permits an effectively infinite search.
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_nodes: u64::MAX,
            starttime: Instant::now(),
            budget: Duration::MAX,
            searchmoves: Vec::new(),
            debug: false,
        }
    }
}

/// Executes a search on a game of chess.
///
/// The search owns mutable access to the [`Game`] and the [`TTable`] for its
/// whole lifetime, per the engine's threading model.
pub struct Search<'a> {
    /// The game to search. Moves are applied with make/unmake on the game's
    /// fixed-size search history.
    game: &'a mut Game,

    /// Transposition table used to cache search results.
    ttable: &'a mut TTable,

    /// Configuration variables for this instance of the search.
    config: SearchConfig,

    /// An atomic flag polled cooperatively; when cleared, the search exits as
    /// soon as possible.
    is_searching: Arc<AtomicBool>,

    /// Number of nodes searched.
    nodes: u64,

    /// Set once any cancellation condition fires; sticky for the rest of the
    /// search.
    aborted: bool,

    /// Two killer-move slots per ply, for ordering moves with no recorded
    /// victim that caused a beta cutoff in sibling subtrees.
    killers: [[Move; 2]; MAX_DEPTH],

    /// Transposition table probe/hit counters.
    tt_probes: u64,
    tt_hits: u64,
}

impl<'a> Search<'a> {
    /// Construct a new [`Search`] instance to execute.
    #[inline(always)]
    pub fn new(
        game: &'a mut Game,
        ttable: &'a mut TTable,
        is_searching: Arc<AtomicBool>,
        config: SearchConfig,
    ) -> Self {
        Self {
            game,
            ttable,
            config,
            is_searching,
            nodes: 0,
            aborted: false,
            killers: [[Move::NONE; 2]; MAX_DEPTH],
            tt_probes: 0,
            tt_hits: 0,
        }
    }

    /// Start the search, returning its result.
    ///
    /// This is the entrypoint of the search: it switches the game onto its
    /// search history, runs iterative deepening, emits exactly one `bestmove`
    /// line, and clears the search flag on exit.
    pub fn start(mut self) -> SearchResult {
        self.reset_search_stats();
        self.game.enable_fast_mode();

        let result = self.iterative_deepening();

        self.game.disable_fast_mode();

        if self.config.debug {
            let hit_rate = self.tt_hits as f64 / self.tt_probes.max(1) as f64 * 100.0;
            self.send_info(UciInfo::new().string(format!(
                "nodes {} tt {}/{} ({hit_rate:.1}%)",
                self.nodes, self.tt_hits, self.tt_probes
            )));
        }

        // Exactly one bestmove line, "0000" when nothing was found
        let bestmove = result
            .bestmove
            .map(|mv| mv.to_string())
            .unwrap_or_else(|| String::from("0000"));
        println!("{}", UciResponse::BestMove {
            bestmove: Some(bestmove),
            ponder: None,
        });

        // Alert the driver that we are no longer searching
        self.is_searching.store(false, Ordering::Relaxed);

        result
    }

    /// Clears the counters, killer slots, and cancellation state.
    fn reset_search_stats(&mut self) {
        self.nodes = 0;
        self.tt_probes = 0;
        self.tt_hits = 0;
        self.aborted = false;
        self.killers = [[Move::NONE; 2]; MAX_DEPTH];
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening),
    /// searching at increasing depths until the budget, node, or depth limit
    /// is reached.
    ///
    /// If a cancellation fires mid-iteration, the iteration is abandoned and
    /// the best move completed so far is kept.
    fn iterative_deepening(&mut self) -> SearchResult {
        // Seed with the first root move, so even an instantly-cancelled
        // search emits something legal
        let mut result = SearchResult {
            bestmove: self.root_moves().first().copied(),
            ..Default::default()
        };
        let target_depth = self.config.max_depth.clamp(1, MAX_DEPTH);

        for depth in 1..=target_depth {
            if let Some((bestmove, score)) = self.search_at_depth(depth) {
                result.bestmove = Some(bestmove);
                result.score = score;
                result.depth = depth;

                let elapsed = self.config.starttime.elapsed();
                self.send_info(
                    UciInfo::new()
                        .depth(depth)
                        .nodes(self.nodes)
                        .score(score.into_uci())
                        .nps((self.nodes as f32 / elapsed.as_secs_f32().max(1e-6)).trunc())
                        .time(elapsed.as_millis()),
                );
            }

            if self.search_cancelled() {
                break;
            }
        }

        result.nodes = self.nodes;
        result
    }

    /// The legal moves the root may consider, honoring `searchmoves`.
    fn root_moves(&self) -> crate::MoveList {
        let mut moves = self.game.legal_moves();
        if !self.config.searchmoves.is_empty() {
            moves.retain(|mv| self.config.searchmoves.contains(mv));
        }
        moves
    }

    /// Searches every root move at `depth` with a full window, returning the
    /// best move and score over the moves that completed.
    fn search_at_depth(&mut self, depth: usize) -> Option<(Move, Score)> {
        let alpha = -Score::INF;
        let beta = Score::INF;
        let mut best: Option<(Move, Score)> = None;

        for mv in self.root_moves() {
            if self.time_up() {
                break;
            }

            self.game.make_move(mv);
            let score = -self.negamax(-beta, -alpha, depth as i32 - 1, 1);
            self.game.unmake_move();

            // A score propagated out of a cancelled subtree is meaningless
            // and must not displace a completed move
            if self.aborted {
                break;
            }

            if best.is_none() || score > best.unwrap().1 {
                best = Some((mv, score));
            }
        }

        best
    }

    /// [Negamax](https://www.chessprogramming.org/Negamax) alpha-beta search.
    fn negamax(&mut self, mut alpha: Score, beta: Score, depth: i32, ply: i32) -> Score {
        self.nodes += 1;

        // When the search is cancelled, unwind with the static eval; the root
        // discards these values anyway.
        if self.time_up() {
            return self.eval();
        }

        let key = self.game.key();

        self.tt_probes += 1;
        let tt_move = match self.ttable.probe(key, depth, alpha, beta) {
            ProbeResult::Cutoff(score) => {
                self.tt_hits += 1;
                return score.relative(ply);
            }
            ProbeResult::Hit(mv) => Some(mv),
            ProbeResult::Miss => None,
        };

        let mut moves = self.game.legal_moves();

        // No legal moves: mate or stalemate
        if moves.is_empty() {
            let score = if self.game.is_in_check() {
                // Prefer shorter mates
                Score::mated_in(ply)
            } else {
                Score::DRAW
            };

            if depth > 0 {
                self.ttable
                    .store(key, Move::NONE, score.absolute(ply), depth, Bound::Exact);
            }
            return score;
        }

        // At the horizon, resolve captures before trusting the static eval
        if depth <= 0 {
            return self.quiescence(alpha, beta, ply);
        }

        if self.game.is_draw() {
            return Score::DRAW;
        }

        moves.sort_by_cached_key(|mv| -self.order_score(mv, tt_move, ply));

        let original_alpha = alpha;
        let mut best = -Score::INF;
        let mut bestmove = moves[0];

        for mv in moves {
            if self.time_up() {
                break;
            }

            self.game.make_move(mv);
            let score = -self.negamax(-beta, -alpha, depth - 1, ply + 1);
            self.game.unmake_move();

            if score > best {
                best = score;
                bestmove = mv;
            }

            if score > alpha {
                alpha = score;
            }

            if alpha >= beta {
                // A non-capturing move strong enough to refute this line is
                // worth trying early in sibling subtrees. Eligibility follows
                // the captured-piece field, so en passant (which records no
                // victim) qualifies.
                if mv.captured().is_none() {
                    self.store_killer(mv, ply);
                }
                break;
            }
        }

        // A cancelled iteration may hold a partial, meaningless score; it
        // must not poison the table
        if self.aborted {
            return best;
        }

        let bound = if best <= original_alpha {
            Bound::Upper
        } else if best >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.ttable
            .store(key, bestmove, best.absolute(ply), depth, bound);

        best
    }

    /// [Quiescence search](https://www.chessprogramming.org/Quiescence_Search):
    /// extends the horizon along capture chains so the evaluation is only
    /// trusted on quiet positions.
    fn quiescence(&mut self, mut alpha: Score, beta: Score, ply: i32) -> Score {
        self.nodes += 1;

        if self.time_up() {
            return self.eval();
        }

        let key = self.game.key();

        self.tt_probes += 1;
        let tt_move = match self.ttable.probe(key, 0, alpha, beta) {
            ProbeResult::Cutoff(score) => {
                self.tt_hits += 1;
                return score.relative(ply);
            }
            ProbeResult::Hit(mv) => Some(mv),
            ProbeResult::Miss => None,
        };

        let original_alpha = alpha;
        let stand_pat = self.eval();

        // Delta prune: if even a queen swing cannot reach alpha, stop here
        if stand_pat + DELTA_MARGIN < alpha {
            return stand_pat;
        }

        if stand_pat >= beta {
            self.ttable
                .store(key, Move::NONE, stand_pat, 0, Bound::Lower);
            return stand_pat;
        }

        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut captures = self.game.capture_moves();
        if captures.is_empty() {
            self.ttable.store(key, Move::NONE, stand_pat, 0, Bound::Exact);
            return stand_pat;
        }

        captures.sort_by_cached_key(|mv| -self.order_score(mv, tt_move, ply));

        let mut best = stand_pat;
        let mut bestmove = Move::NONE;

        for mv in captures {
            if self.time_up() {
                break;
            }

            self.game.make_move(mv);
            let score = -self.quiescence(-beta, -alpha, ply + 1);
            self.game.unmake_move();

            if score >= beta {
                self.ttable
                    .store(key, Move::NONE, score.absolute(ply), 0, Bound::Lower);
                return score;
            }

            if score > best {
                best = score;
                bestmove = mv;
            }

            if score > alpha {
                alpha = score;
            }
        }

        if self.aborted {
            return best;
        }

        let bound = if best <= original_alpha {
            Bound::Upper
        } else {
            Bound::Exact
        };
        self.ttable
            .store(key, bestmove, best.absolute(ply), 0, bound);

        best
    }

    /// Scores a move for ordering. Higher scores are searched first.
    fn order_score(&self, mv: &Move, tt_move: Option<Move>, ply: i32) -> i32 {
        // The table's best move gets top priority
        if tt_move == Some(*mv) {
            return 10_000;
        }

        // MVV-LVA: most valuable victim first, least valuable attacker
        // breaking ties
        if let Some(victim) = mv.captured() {
            let attacker = self
                .game
                .piece_kind_at(mv.from())
                .expect("ordering a move with no piece on its from-square");
            return 1_000 + (victim.value() / 100) * 10 - attacker.value() / 100;
        }

        if self.is_killer(*mv, ply) {
            return 900;
        }

        if mv.is_promotion() {
            return 800;
        }

        if mv.is_castle() {
            return 700;
        }

        if Bitboard::CENTER.contains(mv.to()) {
            return 100;
        }

        0
    }

    /// Promotes `mv` into killer slot 0 for `ply`, shifting the previous
    /// occupant into slot 1 if distinct.
    #[inline(always)]
    fn store_killer(&mut self, mv: Move, ply: i32) {
        let Some(slots) = self.killers.get_mut(ply as usize) else {
            return;
        };
        if slots[0] != mv {
            slots[1] = slots[0];
            slots[0] = mv;
        }
    }

    /// Returns `true` if `mv` occupies a killer slot at `ply`.
    #[inline(always)]
    fn is_killer(&self, mv: Move, ply: i32) -> bool {
        self.killers
            .get(ply as usize)
            .is_some_and(|slots| slots[0] == mv || slots[1] == mv)
    }

    /// Cooperative cancellation check, evaluated every 1024 nodes.
    ///
    /// Once any condition fires the result is sticky, so the search unwinds
    /// without re-checking the clock at every node.
    #[inline(always)]
    fn time_up(&mut self) -> bool {
        if !self.aborted && self.nodes % 1024 == 0 && self.search_cancelled() {
            self.aborted = true;
        }
        self.aborted
    }

    /// Checks all cancellation conditions, without the 1024-node gate. Used
    /// between root iterations.
    #[inline(always)]
    fn search_cancelled(&self) -> bool {
        self.aborted
            || self.config.starttime.elapsed() >= self.config.budget
            || !self.is_searching.load(Ordering::Relaxed)
            || self.nodes >= self.config.max_nodes
    }

    /// Static evaluation of the current position, from the side to move.
    #[inline(always)]
    fn eval(&self) -> Score {
        Evaluator::new(self.game).eval()
    }

    /// Sends a [`UciInfo`] message to `stdout`.
    #[inline(always)]
    fn send_info(&self, info: UciInfo) {
        let resp = UciResponse::<String>::Info(Box::new(info));
        println!("{resp}");
    }
}

impl fmt::Debug for Search<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Search")
            .field("nodes", &self.nodes)
            .field("aborted", &self.aborted)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameState;

    fn run_search(fen: &str, config: SearchConfig) -> SearchResult {
        let mut game: Game = fen.parse().unwrap();
        let mut ttable = TTable::new(TTable::MIN_SIZE);
        let is_searching = Arc::new(AtomicBool::new(true));

        Search::new(&mut game, &mut ttable, is_searching, config).start()
    }

    fn depth_config(depth: usize) -> SearchConfig {
        SearchConfig {
            max_depth: depth,
            ..Default::default()
        }
    }

    #[test]
    fn test_white_mate_in_1() {
        let fen = "k7/8/KQ6/8/8/8/8/8 w - - 0 1";
        let res = run_search(fen, depth_config(2));

        assert!(res.score.is_mate(), "expected mate, got {:?}", res.score);
        assert_eq!(res.score.moves_to_mate(), 1);

        // The chosen move must actually deliver checkmate
        let mut game: Game = fen.parse().unwrap();
        game.make_move(res.bestmove.unwrap());
        assert_eq!(game.game_state(), GameState::Checkmate);
    }

    #[test]
    fn test_black_is_mated_in_1() {
        let fen = "1k6/8/KQ6/2Q5/8/8/8/8 b - - 0 1";
        let res = run_search(fen, depth_config(3));

        assert!(res.score.is_mate());
        assert_eq!(res.score.moves_to_mate(), -1);
    }

    #[test]
    fn test_mate_in_2_ladder() {
        // 1.Rg7 (any) 2.Rh8#
        let fen = "k7/8/7R/6R1/8/8/8/K7 w - - 0 1";
        let res = run_search(fen, depth_config(4));

        assert!(res.score.is_mate(), "expected mate, got {:?}", res.score);
        assert_eq!(res.score.moves_to_mate(), 2);
    }

    #[test]
    fn test_stalemate_search() {
        let fen = "k7/8/KQ6/8/8/8/8/8 b - - 0 1";
        let res = run_search(fen, depth_config(3));

        assert!(res.bestmove.is_none());
        assert_eq!(res.score, -Score::INF);
    }

    #[test]
    fn test_obvious_capture_promote() {
        // The pawn should take the queen and promote to a queen
        let fen = "3q1n2/4P3/8/8/8/8/k7/7K w - - 0 1";
        let res = run_search(fen, depth_config(1));
        assert_eq!(res.bestmove.unwrap().to_string(), "e7d8q");
    }

    #[test]
    fn test_quick_search_finds_a_move() {
        // Any legal move should be emitted regardless of the budget
        let config = SearchConfig {
            budget: Duration::ZERO,
            ..Default::default()
        };
        let res = run_search(crate::FEN_STARTPOS, config);
        assert!(res.bestmove.is_some());
    }

    #[test]
    fn test_searchmoves_filters_root() {
        let game = Game::default();
        let mv = Move::from_uci(&game, "a2a3").unwrap();

        let config = SearchConfig {
            max_depth: 2,
            searchmoves: vec![mv],
            ..Default::default()
        };
        let res = run_search(crate::FEN_STARTPOS, config);
        assert_eq!(res.bestmove, Some(mv));
    }

    #[test]
    fn test_fifty_move_draw_scores_zero() {
        let fen = "4k3/8/8/8/8/8/8/4K2R w - - 100 80";
        let res = run_search(fen, depth_config(3));
        assert_eq!(res.score, Score::DRAW);
    }
}
