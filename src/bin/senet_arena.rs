use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;

use senet_ai::board::Player;
use senet_ai::config::AppConfig;
use senet_ai::game::{play_game, GameRecord};
use senet_ai::search_stats::SearchStats;

/// 白黒の設定で`games`局を並列に指し、勝率を集計する
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "senet.json".to_string());
    let config = AppConfig::load_or_default(Path::new(&config_path))
        .with_context(|| format!("failed to load config '{}'", config_path))?;

    let base_seed = config.seed.unwrap_or_else(rand::random);
    println!(
        "--- Senet 対局場: {} 局 (白 深さ{} / 黒 深さ{}, seed {}) ---",
        config.games, config.white.max_depth, config.black.max_depth, base_seed
    );

    let pb = ProgressBar::new(config.games as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} games ({eta})")?
            .progress_chars("=>-"),
    );

    let start_time = Instant::now();
    let records: Vec<GameRecord> = (0..config.games as u64)
        .into_par_iter()
        .map(|i| {
            // 局ごとに種をずらすので、同じ設定なら結果は再現する
            let mut rng = ChaCha20Rng::seed_from_u64(base_seed.wrapping_add(i));
            let record = play_game(&config, &mut rng);
            pb.inc(1);
            record
        })
        .collect::<Result<Vec<_>, _>>()?;
    pb.finish_with_message("done");

    let mut white_wins = 0usize;
    let mut black_wins = 0usize;
    let mut unfinished = 0usize;
    let mut total_turns = 0usize;
    let mut white_stats = SearchStats::new();
    let mut black_stats = SearchStats::new();
    for record in &records {
        match record.winner {
            Some(Player::White) => white_wins += 1,
            Some(Player::Black) => black_wins += 1,
            None => unfinished += 1,
        }
        total_turns += record.turns.len();
        white_stats.merge(&record.white_stats);
        black_stats.merge(&record.black_stats);
    }

    let games = records.len().max(1) as f64;
    println!("\n対局数: {} ({:.2} 秒)", records.len(), start_time.elapsed().as_secs_f64());
    println!("白 勝ち: {} ({:.1}%)", white_wins, white_wins as f64 * 100.0 / games);
    println!("黒 勝ち: {} ({:.1}%)", black_wins, black_wins as f64 * 100.0 / games);
    println!("未決着: {} ({:.1}%)", unfinished, unfinished as f64 * 100.0 / games);
    let finished = white_wins + black_wins;
    if finished > 0 {
        println!(
            "決着した局の白勝率: {:.1}%",
            white_wins as f64 * 100.0 / finished as f64
        );
    }
    if unfinished * 2 > records.len() {
        println!(
            "半数以上が {} ターンで決着しませんでした。交換の応酬が続く場合は探索深さか max_turns を見直してください。",
            config.max_turns
        );
    }
    println!("平均ターン数: {:.1}", total_turns as f64 / games);
    println!("\n[白AIの探索統計]\n{}", white_stats);
    println!("\n[黒AIの探索統計]\n{}", black_stats);

    Ok(())
}
