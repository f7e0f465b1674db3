use serde::{Deserialize, Serialize};

use crate::board::{
    Board, Player, HOUSE_OF_HAPPINESS, HOUSE_OF_HORUS, HOUSE_OF_REBIRTH, HOUSE_OF_RE_ATOUM,
    HOUSE_OF_THREE_TRUTHS, HOUSE_OF_WATER,
};
use crate::rules::is_terminal;
use crate::state::GameState;

// --- Evaluator Trait ---
pub trait Evaluator {
    /// `perspective`から見た局面の評価値。終局なら勝者側に+∞、それ以外に-∞。
    fn evaluate(&self, state: &GameState, perspective: Player) -> f64;
}

/// 前進度の計算方法
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancementMode {
    /// マス番号の和
    Linear,
    /// マス番号の二乗和。ゴール付近の駒をより重視する
    Quadratic,
}

/// 評価関数の重み。値そのものは調整用で、各項の符号だけが意味を持つ。
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    pub exited: f64,
    pub advancement: f64,
    pub advancement_mode: AdvancementMode,
    pub safety: f64,
    /// 16〜25にいる駒1枚あたりの安全点
    pub safe_zone_bonus: f64,
    /// 26以降にいる駒1枚あたりの安全点
    pub home_stretch_bonus: f64,
    pub special_square: f64,
    /// 0なら阻止項は計算しない
    pub blocking: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        HeuristicWeights {
            exited: 250.0,
            advancement: 5.0,
            advancement_mode: AdvancementMode::Linear,
            safety: 2.0,
            safe_zone_bonus: 0.5,
            home_stretch_bonus: 2.0,
            special_square: 10.0,
            blocking: 0.0,
        }
    }
}

impl HeuristicWeights {
    /// 二乗前進度と阻止項を使う攻撃的な設定
    pub fn aggressive() -> Self {
        HeuristicWeights {
            exited: 10_000.0,
            advancement: 10.0,
            advancement_mode: AdvancementMode::Quadratic,
            safety: 5.0,
            safe_zone_bonus: 1.0,
            home_stretch_bonus: 3.0,
            special_square: 20.0,
            blocking: 15.0,
        }
    }
}

/// 特殊マスに自駒がいるときの点数（重み掛け前）
fn special_square_value(square: u8) -> f64 {
    match square {
        HOUSE_OF_WATER => -5.0,
        HOUSE_OF_HAPPINESS => 4.0,
        HOUSE_OF_THREE_TRUTHS => 3.0,
        HOUSE_OF_RE_ATOUM => 4.0,
        HOUSE_OF_HORUS => 5.0,
        _ => 0.0,
    }
}

/// セネト用の静的評価関数
#[derive(Clone, Copy, Debug, Default)]
pub struct SenetEvaluator {
    pub weights: HeuristicWeights,
}

impl SenetEvaluator {
    pub fn new(weights: HeuristicWeights) -> Self {
        SenetEvaluator { weights }
    }

    fn advancement(&self, board: &Board, player: Player) -> f64 {
        let sum = |p: Player| -> f64 {
            board
                .piece_positions(p)
                .map(|sq| {
                    let sq = sq as f64;
                    match self.weights.advancement_mode {
                        AdvancementMode::Linear => sq,
                        AdvancementMode::Quadratic => sq * sq,
                    }
                })
                .sum()
        };
        (sum(player) - sum(player.opponent())) * self.weights.advancement
    }

    fn safety(&self, board: &Board, player: Player) -> f64 {
        let score: f64 = board
            .piece_positions(player)
            .map(|sq| {
                if sq >= HOUSE_OF_HAPPINESS {
                    self.weights.home_stretch_bonus
                } else if sq > HOUSE_OF_REBIRTH {
                    self.weights.safe_zone_bonus
                } else {
                    0.0
                }
            })
            .sum();
        score * self.weights.safety
    }

    fn special_squares(&self, board: &Board, player: Player) -> f64 {
        let score: f64 = board.piece_positions(player).map(special_square_value).sum();
        score * self.weights.special_square
    }

    /// 相手の駒の5マス以内前方にいる自駒の組の数
    fn blocking(&self, board: &Board, player: Player) -> f64 {
        if self.weights.blocking == 0.0 {
            return 0.0;
        }
        let mut pairs = 0usize;
        for opp in board.piece_positions(player.opponent()) {
            pairs += board
                .piece_positions(player)
                .filter(|&mine| mine > opp && mine - opp <= 5)
                .count();
        }
        pairs as f64 * self.weights.blocking
    }
}

impl Evaluator for SenetEvaluator {
    fn evaluate(&self, state: &GameState, perspective: Player) -> f64 {
        if is_terminal(state) {
            return if state.winner() == Some(perspective) {
                f64::INFINITY
            } else {
                f64::NEG_INFINITY
            };
        }

        let board = state.board();
        let exited_diff = state.exited(perspective) as f64 - state.exited(perspective.opponent()) as f64;

        exited_diff * self.weights.exited
            + self.advancement(board, perspective)
            + self.safety(board, perspective)
            + self.special_squares(board, perspective)
            + self.blocking(board, perspective)
    }
}

/// 既定の重みで評価する
pub fn evaluate(state: &GameState, perspective: Player) -> f64 {
    SenetEvaluator::default().evaluate(state, perspective)
}
