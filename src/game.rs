use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::ai::SenetAI;
use crate::board::Player;
use crate::config::AppConfig;
use crate::error::SenetError;
use crate::evaluation::{Evaluator, SenetEvaluator};
use crate::rules::{apply_move, has_legal_moves, Move};
use crate::search_stats::SearchStats;
use crate::state::GameState;
use crate::sticks::{throw_sticks, Roll};
use crate::utils::{draw_evaluation_graph, move_to_record, pass_to_record};

/// 1手分の記録。`mv`が`None`なら手番を飛ばした
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordedTurn {
    pub turn: usize,
    pub player: Player,
    pub roll: Roll,
    pub mv: Option<Move>,
}

impl RecordedTurn {
    pub fn notation(&self) -> String {
        match &self.mv {
            Some(mv) => move_to_record(mv, self.roll, self.turn),
            None => pass_to_record(self.player.glyph(), self.roll, self.turn),
        }
    }
}

/// 自己対局1局分の記録
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub turns: Vec<RecordedTurn>,
    pub winner: Option<Player>,
    pub final_state: GameState,
    /// 各AIの評価関数による白視点の評価値
    pub white_evaluation: Vec<(usize, f64)>,
    pub black_evaluation: Vec<(usize, f64)>,
    pub white_stats: SearchStats,
    pub black_stats: SearchStats,
}

/// 設定に従って白黒のAI同士で1局指す。棒の乱数は`rng`から引く。
pub fn play_game<R: Rng + ?Sized>(config: &AppConfig, rng: &mut R) -> Result<GameRecord, SenetError> {
    config.validate()?;

    let mut ai_white = SenetAI::from_config(&config.white);
    let mut ai_black = SenetAI::from_config(&config.black);

    let mut state = GameState::new();
    let mut turns = Vec::new();
    let mut white_evaluation = Vec::new();
    let mut black_evaluation = Vec::new();
    let mut white_stats = SearchStats::new();
    let mut black_stats = SearchStats::new();

    for turn in 1..=config.max_turns as usize {
        if state.is_game_over() {
            break;
        }

        white_evaluation.push((turn, ai_white.evaluator.evaluate(&state, Player::White)));
        black_evaluation.push((turn, ai_black.evaluator.evaluate(&state, Player::White)));

        let player = state.current_player();
        let throw = throw_sticks(rng);
        let engine = config.engine(player);

        let current_ai = match player {
            Player::White => &mut ai_white,
            Player::Black => &mut ai_black,
        };
        let best_move = if has_legal_moves(&state, throw.roll) {
            let mv = choose_move(current_ai, &state, throw.roll, engine.max_depth, engine.parallel_root)?;
            let stats = *current_ai.stats();
            match player {
                Player::White => white_stats.merge(&stats),
                Player::Black => black_stats.merge(&stats),
            }
            mv
        } else {
            None
        };

        if let Some(mv) = best_move {
            state = apply_move(&state, &mv);
        }
        let recorded = RecordedTurn { turn, player, roll: throw.roll, mv: best_move };
        info!("{}", recorded.notation());
        turns.push(recorded);

        state.switch_player();
    }

    Ok(GameRecord {
        turns,
        winner: state.winner(),
        final_state: state,
        white_evaluation,
        black_evaluation,
        white_stats,
        black_stats,
    })
}

fn choose_move(
    ai: &mut SenetAI<SenetEvaluator>,
    state: &GameState,
    roll: Roll,
    max_depth: u8,
    parallel_root: bool,
) -> Result<Option<Move>, SenetError> {
    if parallel_root {
        ai.find_best_move_parallel(state, roll, max_depth)
    } else {
        ai.find_best_move(state, roll, max_depth)
    }
}

/// 棋譜をテキストで書き出す
pub fn write_game_record(record: &GameRecord, path: &Path) -> Result<(), SenetError> {
    let mut file = File::create(path)?;
    writeln!(file, "白：AI_White {}", Player::White.glyph())?;
    writeln!(file, "黒：AI_Black {}", Player::Black.glyph())?;
    writeln!(file)?;
    for turn in &record.turns {
        writeln!(file, "{}", turn.notation())?;
    }
    match record.winner {
        Some(winner) => writeln!(file, "\n勝者：{}", winner)?,
        None => writeln!(file, "\n勝者：なし（最大ターン数）")?,
    }
    Ok(())
}

fn make_rng(seed: Option<u64>) -> ChaCha20Rng {
    match seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    }
}

/// 既定のバイナリの本体。設定ファイル（引数、なければ`senet.json`）を読んで1局指す。
pub fn run() -> anyhow::Result<()> {
    println!("--- SenetAI 自己対局 ---");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "senet.json".to_string());
    let config = AppConfig::load_or_default(Path::new(&config_path))?;

    println!(
        "白 探索深さ: {}, 黒 探索深さ: {}",
        config.white.max_depth, config.black.max_depth
    );

    let mut rng = make_rng(config.seed);
    let record = play_game(&config, &mut rng)?;

    for turn in &record.turns {
        println!("{}", turn.notation());
    }

    match record.winner {
        Some(winner) => println!("\n勝者: {} ({} ターン)", winner, record.turns.len()),
        None => println!("\n最大ターン数に達しました。対局終了。"),
    }
    println!(
        "上がった駒: 白 {} / 黒 {}",
        record.final_state.exited(Player::White),
        record.final_state.exited(Player::Black)
    );
    println!(
        "残り駒: 白 {} / 黒 {}",
        record.final_state.remaining(Player::White),
        record.final_state.remaining(Player::Black)
    );

    println!("\n[白AIの探索統計]\n{}", record.white_stats);
    println!("\n[黒AIの探索統計]\n{}", record.black_stats);

    if let Some(path) = &config.record_path {
        write_game_record(&record, path)?;
        println!("\n棋譜を {} に出力しました。", path.display());
    }

    if let Some(path) = &config.graph_path {
        if let Err(e) = draw_evaluation_graph(&record.white_evaluation, &record.black_evaluation, &path.to_string_lossy()) {
            eprintln!("評価値グラフの生成に失敗しました: {}", e);
        }
    }

    Ok(())
}
