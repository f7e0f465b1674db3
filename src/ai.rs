use std::time::{Duration, Instant};

use log::{debug, trace};
use rayon::prelude::*;

use crate::board::Player;
use crate::config::EngineConfig;
use crate::error::SenetError;
use crate::evaluation::{Evaluator, SenetEvaluator};
use crate::rules::{apply_move, is_terminal, legal_moves, Move, MoveList};
use crate::search_stats::{NodeType, SearchStats};
use crate::state::GameState;
use crate::sticks::{probability, Roll, ROLLS};

pub const MIN_SEARCH_DEPTH: u8 = 1;
pub const MAX_SEARCH_DEPTH: u8 = 10;

/// ルートでの探索結果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    /// 探索で得た評価値。合法手が0か1つで探索しなかった場合は`None`
    pub value: Option<f64>,
    /// 最後まで探索し終えた深さ
    pub completed_depth: u8,
}

/// CHANCEノードの期待値の集計。±∞は吸収的に扱い、NaNを作らない。
///
/// +∞と-∞が同じノードに混在した場合は確率の大きい側を採用し、同じなら有限部分を返す。
#[derive(Clone, Copy, Debug, Default)]
struct Expectation {
    finite: f64,
    win_mass: f64,
    loss_mass: f64,
}

impl Expectation {
    fn add(&mut self, probability: f64, value: f64) {
        if value == f64::INFINITY {
            self.win_mass += probability;
        } else if value == f64::NEG_INFINITY {
            self.loss_mass += probability;
        } else {
            self.finite += probability * value;
        }
    }

    fn value(&self) -> f64 {
        match (self.win_mass > 0.0, self.loss_mass > 0.0) {
            (false, false) => self.finite,
            (true, false) => f64::INFINITY,
            (false, true) => f64::NEG_INFINITY,
            (true, true) => {
                if self.win_mass > self.loss_mass {
                    f64::INFINITY
                } else if self.loss_mass > self.win_mass {
                    f64::NEG_INFINITY
                } else {
                    self.finite
                }
            }
        }
    }
}

fn validate_depth(max_depth: u8) -> Result<(), SenetError> {
    if (MIN_SEARCH_DEPTH..=MAX_SEARCH_DEPTH).contains(&max_depth) {
        Ok(())
    } else {
        Err(SenetError::InvalidDepth {
            depth: max_depth,
            min: MIN_SEARCH_DEPTH,
            max: MAX_SEARCH_DEPTH,
        })
    }
}

/// セネトのエクスペクティミニマックス探索（アルファベータ枝刈り付き）を管理する構造体
pub struct SenetAI<E: Evaluator> {
    pub evaluator: E,
    stats: SearchStats,
    root_player: Player,
    root_depth: u8,
    start_time: Option<Instant>,
    time_limit: Option<Duration>,
}

impl<E: Evaluator> SenetAI<E> {
    pub fn new(evaluator: E) -> Self {
        SenetAI {
            evaluator,
            stats: SearchStats::new(),
            root_player: Player::White,
            root_depth: 0,
            start_time: None,
            time_limit: None,
        }
    }

    /// 探索の持ち時間。指定すると反復深化になり、時間切れ時は最後に完了した深さの手を返す。
    pub fn with_time_limit(mut self, time_limit_ms: Option<u64>) -> Self {
        self.time_limit = time_limit_ms.map(Duration::from_millis);
        self
    }

    /// 直前の探索の統計
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    fn is_time_up(&self) -> bool {
        if let (Some(start), Some(limit)) = (self.start_time, self.time_limit) {
            start.elapsed() >= limit
        } else {
            false
        }
    }

    fn begin_search(&mut self, state: &GameState) {
        self.stats.reset();
        self.start_time = Some(Instant::now());
        self.root_player = state.current_player();
    }

    fn finish_search(&mut self) {
        if let Some(start) = self.start_time {
            self.stats.elapsed = start.elapsed();
        }
    }

    /// 現在の局面と既に投げた出目から最善手を探す。合法手が無ければ`None`（手番を飛ばす）。
    pub fn find_best_move(
        &mut self,
        state: &GameState,
        roll: Roll,
        max_depth: u8,
    ) -> Result<Option<Move>, SenetError> {
        Ok(self.find_best_move_with_value(state, roll, max_depth)?.best_move)
    }

    pub fn find_best_move_with_value(
        &mut self,
        state: &GameState,
        roll: Roll,
        max_depth: u8,
    ) -> Result<SearchResult, SenetError> {
        validate_depth(max_depth)?;
        self.begin_search(state);

        let moves = legal_moves(state, roll);
        if moves.len() <= 1 {
            self.finish_search();
            return Ok(SearchResult {
                best_move: moves.first().copied(),
                value: None,
                completed_depth: 0,
            });
        }

        let mut result = SearchResult {
            best_move: Some(moves[0]),
            value: None,
            completed_depth: 0,
        };

        // 持ち時間が無ければ最大深さを一度だけ探索する
        let first_depth = if self.time_limit.is_some() { 1 } else { max_depth };
        for depth in first_depth..=max_depth {
            match self.search_root(state, &moves, depth) {
                Some((mv, value)) => {
                    result = SearchResult {
                        best_move: Some(mv),
                        value: Some(value),
                        completed_depth: depth,
                    };
                }
                None => {
                    trace!("search interrupted at depth {}", depth);
                    break;
                }
            }
        }

        self.finish_search();
        debug!(
            "best move {:?} value {:?} (depth {}, {} nodes)",
            result.best_move, result.value, result.completed_depth, self.stats.nodes_explored
        );
        Ok(result)
    }

    /// ルートの各手を評価し、値が厳密に最大の手を返す（同値なら先に見つかった手）。
    /// ルートの子はすべて全幅の窓で探索する。時間切れなら`None`。
    fn search_root(&mut self, state: &GameState, moves: &MoveList, depth: u8) -> Option<(Move, f64)> {
        self.root_depth = depth;
        let mut best: Option<(Move, f64)> = None;

        for mv in moves {
            let mut next_state = apply_move(state, mv);
            next_state.switch_player();

            let value = self.chance_node(&next_state, depth - 1, f64::NEG_INFINITY, f64::INFINITY)?;
            debug!("depth {} root move [{}] -> {}", depth, mv, value);

            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((*mv, value)),
            }
        }

        best
    }

    /// 出目の確率で重み付けした期待値。深さ0か終局なら評価関数を返す。
    fn chance_node(&mut self, state: &GameState, depth: u8, alpha: f64, beta: f64) -> Option<f64> {
        if self.is_time_up() {
            return None;
        }

        self.stats.increment_node(NodeType::Chance);
        self.stats.update_max_depth(self.root_depth.saturating_sub(depth));

        if depth == 0 || is_terminal(state) {
            return Some(self.evaluator.evaluate(state, self.root_player));
        }

        let maximizing = state.current_player() == self.root_player;
        let mut expectation = Expectation::default();
        for roll in ROLLS {
            let value = if maximizing {
                self.max_node(state, depth, alpha, beta, roll)?
            } else {
                self.min_node(state, depth, alpha, beta, roll)?
            };
            expectation.add(probability(roll), value);
        }

        Some(expectation.value())
    }

    fn max_node(&mut self, state: &GameState, depth: u8, mut alpha: f64, beta: f64, roll: Roll) -> Option<f64> {
        self.stats.increment_node(NodeType::Max);

        let moves = legal_moves(state, roll);
        if moves.is_empty() {
            // 手番を飛ばして相手のCHANCEノードへ
            let mut next_state = *state;
            next_state.switch_player();
            return self.chance_node(&next_state, depth - 1, alpha, beta);
        }

        let mut max_value = f64::NEG_INFINITY;
        for mv in &moves {
            let mut next_state = apply_move(state, mv);
            if is_terminal(&next_state) {
                return Some(self.evaluator.evaluate(&next_state, self.root_player));
            }
            next_state.switch_player();

            let value = self.chance_node(&next_state, depth - 1, alpha, beta)?;
            max_value = max_value.max(value);
            alpha = alpha.max(value);

            if beta <= alpha {
                break;
            }
        }

        Some(max_value)
    }

    fn min_node(&mut self, state: &GameState, depth: u8, alpha: f64, mut beta: f64, roll: Roll) -> Option<f64> {
        self.stats.increment_node(NodeType::Min);

        let moves = legal_moves(state, roll);
        if moves.is_empty() {
            let mut next_state = *state;
            next_state.switch_player();
            return self.chance_node(&next_state, depth - 1, alpha, beta);
        }

        let mut min_value = f64::INFINITY;
        for mv in &moves {
            let mut next_state = apply_move(state, mv);
            if is_terminal(&next_state) {
                return Some(self.evaluator.evaluate(&next_state, self.root_player));
            }
            next_state.switch_player();

            let value = self.chance_node(&next_state, depth - 1, alpha, beta)?;
            min_value = min_value.min(value);
            beta = beta.min(value);

            if beta <= alpha {
                break;
            }
        }

        Some(min_value)
    }
}

impl SenetAI<SenetEvaluator> {
    pub fn from_config(config: &EngineConfig) -> Self {
        SenetAI::new(SenetEvaluator::new(config.weights)).with_time_limit(config.time_limit_ms)
    }
}

impl<E: Evaluator + Clone + Send + Sync> SenetAI<E> {
    /// 探索途中の状態を引き継いだ作業用の探索器
    fn worker(&self) -> SenetAI<E> {
        SenetAI {
            evaluator: self.evaluator.clone(),
            stats: SearchStats::new(),
            root_player: self.root_player,
            root_depth: self.root_depth,
            start_time: self.start_time,
            time_limit: self.time_limit,
        }
    }

    /// ルートの各手をrayonで並列に評価する。ルートの子は逐次版でも全幅の窓で探索するので、
    /// 時間切れが無ければ結果は`find_best_move`と一致する。
    ///
    /// 持ち時間がある場合は反復深化せず、時間内に評価し終えた手の中から選ぶ。
    pub fn find_best_move_parallel(
        &mut self,
        state: &GameState,
        roll: Roll,
        max_depth: u8,
    ) -> Result<Option<Move>, SenetError> {
        validate_depth(max_depth)?;
        self.begin_search(state);
        self.root_depth = max_depth;

        let moves = legal_moves(state, roll);
        if moves.len() <= 1 {
            self.finish_search();
            return Ok(moves.first().copied());
        }

        let results: Vec<(Move, Option<f64>, SearchStats)> = moves
            .as_slice()
            .par_iter()
            .map(|mv| {
                let mut worker = self.worker();
                let mut next_state = apply_move(state, mv);
                next_state.switch_player();
                let value = worker.chance_node(&next_state, max_depth - 1, f64::NEG_INFINITY, f64::INFINITY);
                (*mv, value, worker.stats)
            })
            .collect();

        let mut best: Option<(Move, f64)> = None;
        for (mv, value, stats) in &results {
            self.stats.merge(stats);
            let Some(value) = *value else {
                trace!("parallel root move [{}] timed out", mv);
                continue;
            };
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((*mv, value)),
            }
        }

        self.finish_search();
        Ok(Some(best.map(|(mv, _)| mv).unwrap_or(moves[0])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::evaluation::HeuristicWeights;

    fn roll(v: u8) -> Roll {
        Roll::new(v).unwrap()
    }

    fn state_with(white: &[u8], black: &[u8], to_move: Player, white_exited: u8, black_exited: u8) -> GameState {
        let mut board = Board::empty();
        for &sq in white {
            board.set_piece_at(sq, Player::White);
        }
        for &sq in black {
            board.set_piece_at(sq, Player::Black);
        }
        GameState::from_parts(board, to_move, white_exited, black_exited).unwrap()
    }

    fn new_ai() -> SenetAI<SenetEvaluator> {
        SenetAI::new(SenetEvaluator::default())
    }

    #[test]
    fn test_rejects_out_of_range_depth() {
        let mut ai = new_ai();
        let state = GameState::new();
        assert!(matches!(
            ai.find_best_move(&state, roll(2), 0),
            Err(SenetError::InvalidDepth { depth: 0, .. })
        ));
        assert!(matches!(
            ai.find_best_move(&state, roll(2), 11),
            Err(SenetError::InvalidDepth { depth: 11, .. })
        ));
    }

    #[test]
    fn test_no_legal_move_returns_none() {
        // 28にいる駒は3以外では動けない
        let state = state_with(&[28], &[5], Player::White, 6, 0);
        let mut ai = new_ai();
        assert_eq!(ai.find_best_move(&state, roll(1), 3).unwrap(), None);
    }

    #[test]
    fn test_single_move_is_returned_without_search() {
        let state = state_with(&[1], &[2], Player::White, 6, 6);
        let mut ai = new_ai();
        let mv = ai.find_best_move(&state, roll(1), 1).unwrap().unwrap();
        assert_eq!((mv.from, mv.to), (1, 2));
        assert!(mv.is_swap);
        assert_eq!(ai.stats().nodes_explored, 0);
        assert_eq!(ai.stats().chance_nodes, 0);
    }

    #[test]
    fn test_avoids_water_at_depth_one() {
        let state = state_with(&[25, 10], &[3], Player::White, 0, 0);
        let mut ai = new_ai();
        let mv = ai.find_best_move(&state, roll(2), 1).unwrap().unwrap();
        assert_eq!((mv.from, mv.to), (10, 12));
        // 深さ1ではルートの子のCHANCEノードだけを訪れる
        assert_eq!(ai.stats().chance_nodes, 2);
        assert_eq!(ai.stats().max_nodes + ai.stats().min_nodes, 0);
    }

    #[test]
    fn test_depth_one_matches_static_evaluation() {
        let state = GameState::new();
        let mut ai = new_ai();
        let result = ai.find_best_move_with_value(&state, roll(3), 1).unwrap();
        let best = result.best_move.unwrap();

        let moves = legal_moves(&state, roll(3));
        let scores: Vec<f64> = moves
            .iter()
            .map(|mv| {
                let mut next = apply_move(&state, mv);
                next.switch_player();
                SenetEvaluator::default().evaluate(&next, Player::White)
            })
            .collect();
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let first_best = scores.iter().position(|&s| s == max).unwrap();
        assert_eq!(best, moves[first_best]);
        assert_eq!(result.value, Some(max));
    }

    #[test]
    fn test_ties_keep_first_move() {
        // 対称な2手は同じ評価値になり、先に列挙された手が選ばれる
        let state = state_with(&[3, 8], &[20], Player::White, 0, 0);
        let mut ai = SenetAI::new(SenetEvaluator::new(HeuristicWeights {
            advancement: 0.0,
            ..HeuristicWeights::default()
        }));
        let mv = ai.find_best_move(&state, roll(1), 1).unwrap().unwrap();
        assert_eq!(mv.from, 3);
    }

    #[test]
    fn test_search_is_deterministic() {
        let state = GameState::new();
        let mut a = new_ai();
        let mut b = new_ai();
        let ra = a.find_best_move_with_value(&state, roll(3), 3).unwrap();
        let rb = b.find_best_move_with_value(&state, roll(3), 3).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a.stats().nodes_explored, b.stats().nodes_explored);
    }

    #[test]
    fn test_search_does_not_mutate_root_state() {
        let state = GameState::new();
        let before = state;
        let mut ai = new_ai();
        ai.find_best_move(&state, roll(3), 3).unwrap();
        assert_eq!(state, before);
    }

    #[test]
    fn test_stats_track_node_kinds_and_depth() {
        let state = GameState::new();
        let mut ai = new_ai();
        ai.find_best_move(&state, roll(3), 3).unwrap();
        let stats = *ai.stats();
        assert!(stats.chance_nodes > 0);
        assert!(stats.max_nodes > 0);
        assert!(stats.min_nodes > 0);
        assert_eq!(stats.nodes_explored, stats.chance_nodes + stats.max_nodes + stats.min_nodes);
        assert_eq!(stats.max_depth_reached, 3);
    }

    #[test]
    fn test_mixed_infinities_do_not_produce_nan() {
        // 白は3でしか上がれず、それ以外では黒が必ず上がって勝つ
        let state = state_with(&[28], &[30], Player::White, 6, 6);
        let mut ai = new_ai();
        ai.root_player = Player::White;
        ai.root_depth = 2;
        let value = ai.chance_node(&state, 2, f64::NEG_INFINITY, f64::INFINITY).unwrap();
        assert!(!value.is_nan());
        assert_eq!(value, f64::NEG_INFINITY);
    }

    #[test]
    fn test_immediate_win_short_circuits() {
        let state = state_with(&[30], &[5], Player::White, 6, 0);
        let mut ai = new_ai();
        ai.root_player = Player::White;
        ai.root_depth = 3;
        let value = ai.max_node(&state, 3, f64::NEG_INFINITY, f64::INFINITY, roll(4)).unwrap();
        assert_eq!(value, f64::INFINITY);
        assert_eq!(ai.stats().chance_nodes, 0);
    }

    /// 枝刈りなしで同じ木をたどった場合に訪れるノード数
    fn unpruned_chance_nodes(state: &GameState, depth: u8) -> u64 {
        let mut count = 1;
        if depth == 0 || is_terminal(state) {
            return count;
        }
        for r in ROLLS {
            count += 1;
            let moves = legal_moves(state, r);
            if moves.is_empty() {
                let mut next = *state;
                next.switch_player();
                count += unpruned_chance_nodes(&next, depth - 1);
                continue;
            }
            for mv in &moves {
                let mut next = apply_move(state, mv);
                if is_terminal(&next) {
                    break;
                }
                next.switch_player();
                count += unpruned_chance_nodes(&next, depth - 1);
            }
        }
        count
    }

    fn unpruned_root_nodes(state: &GameState, r: Roll, depth: u8) -> u64 {
        legal_moves(state, r)
            .iter()
            .map(|mv| {
                let mut next = apply_move(state, mv);
                next.switch_player();
                unpruned_chance_nodes(&next, depth - 1)
            })
            .sum()
    }

    #[test]
    fn test_shallow_search_visits_the_whole_tree() {
        // 深さ2までは窓が狭まらないので、枝刈りなしの木と同じノード数になる
        let state = GameState::new();
        for depth in [1, 2] {
            let mut ai = new_ai();
            ai.find_best_move(&state, roll(3), depth).unwrap();
            assert_eq!(ai.stats().nodes_explored, unpruned_root_nodes(&state, roll(3), depth), "depth {}", depth);
        }
    }

    #[test]
    fn test_alpha_beta_prunes_at_depth_three() {
        let state = GameState::new();
        let mut ai = new_ai();
        ai.find_best_move(&state, roll(3), 3).unwrap();
        let pruned = ai.stats().nodes_explored;
        let full = unpruned_root_nodes(&state, roll(3), 3);
        assert!(pruned < full, "pruned {} full {}", pruned, full);
    }

    #[test]
    fn test_min_node_cuts_remaining_children() {
        // 黒番で2手あり、どちらの子もαを下回るので1手目で打ち切る
        let state = state_with(&[20], &[2, 8], Player::Black, 0, 0);
        let mut ai = new_ai();
        ai.root_player = Player::White;
        ai.root_depth = 1;

        let full = ai.min_node(&state, 1, f64::NEG_INFINITY, f64::INFINITY, roll(1)).unwrap();
        assert_eq!(ai.stats().chance_nodes, 2);

        let mut first = apply_move(&state, &legal_moves(&state, roll(1))[0]);
        first.switch_player();
        let first_value = SenetEvaluator::default().evaluate(&first, Player::White);

        ai.stats.reset();
        let cut = ai.min_node(&state, 1, f64::MAX, f64::INFINITY, roll(1)).unwrap();
        assert_eq!(ai.stats().chance_nodes, 1);
        assert_eq!(cut, first_value);
        assert!(full <= cut);
    }

    #[test]
    fn test_max_node_cuts_remaining_children() {
        let state = state_with(&[2, 8], &[20], Player::White, 0, 0);
        let mut ai = new_ai();
        ai.root_player = Player::White;
        ai.root_depth = 1;

        let full = ai.max_node(&state, 1, f64::NEG_INFINITY, f64::INFINITY, roll(1)).unwrap();
        assert_eq!(ai.stats().chance_nodes, 2);

        ai.stats.reset();
        let cut = ai.max_node(&state, 1, f64::NEG_INFINITY, f64::MIN, roll(1)).unwrap();
        assert_eq!(ai.stats().chance_nodes, 1);
        assert!(cut <= full);
    }

    #[test]
    fn test_expectation_rules() {
        let mut e = Expectation::default();
        e.add(0.25, 8.0);
        e.add(0.75, 4.0);
        assert_eq!(e.value(), 5.0);

        let mut e = Expectation::default();
        e.add(0.25, f64::INFINITY);
        e.add(0.75, 4.0);
        assert_eq!(e.value(), f64::INFINITY);

        let mut e = Expectation::default();
        e.add(0.375, f64::INFINITY);
        e.add(0.25, f64::NEG_INFINITY);
        assert_eq!(e.value(), f64::INFINITY);

        let mut e = Expectation::default();
        e.add(0.25, f64::INFINITY);
        e.add(0.25, f64::NEG_INFINITY);
        e.add(0.5, 2.0);
        assert_eq!(e.value(), 1.0);
    }

    #[test]
    fn test_skipped_turns_still_consume_depth() {
        // 28の駒は3以外で動けず、黒も出目によっては動けない。手番を飛ばしても深さは減る
        let state = state_with(&[20, 28], &[21, 22], Player::White, 5, 5);
        let mut ai = new_ai();
        let result = ai.find_best_move_with_value(&state, roll(3), 4).unwrap();
        assert!(result.best_move.is_some());
        assert_eq!(result.completed_depth, 4);
        assert!(!result.value.unwrap().is_nan());
        assert!(ai.stats().max_depth_reached <= 4);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut state = GameState::new();
        let opening = legal_moves(&state, roll(1))[6];
        state = apply_move(&state, &opening);
        state.switch_player();

        for r in [roll(1), roll(2), roll(3)] {
            let mut seq = new_ai();
            let mut par = new_ai();
            let a = seq.find_best_move(&state, r, 2).unwrap();
            let b = par.find_best_move_parallel(&state, r, 2).unwrap();
            assert_eq!(a, b, "roll {}", r);
            assert_eq!(seq.stats().nodes_explored, par.stats().nodes_explored);
        }
    }

    #[test]
    fn test_zero_time_budget_falls_back_to_first_move() {
        let state = GameState::new();
        let mut ai = new_ai().with_time_limit(Some(0));
        let result = ai.find_best_move_with_value(&state, roll(3), 5).unwrap();
        assert_eq!(result.completed_depth, 0);
        assert_eq!(result.best_move, Some(legal_moves(&state, roll(3))[0]));
        assert_eq!(result.value, None);
    }

    #[test]
    fn test_generous_time_budget_completes_all_depths() {
        let state = GameState::new();
        let mut ai = new_ai().with_time_limit(Some(60_000));
        let result = ai.find_best_move_with_value(&state, roll(3), 2).unwrap();
        assert_eq!(result.completed_depth, 2);

        let mut plain = new_ai();
        assert_eq!(plain.find_best_move(&state, roll(3), 2).unwrap(), result.best_move);
    }
}
