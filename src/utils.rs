use plotters::prelude::*;

use crate::board::House;
use crate::rules::Move;
use crate::sticks::Roll;

/// 棋譜1行分の表記。例: `12 ● 3 14→17 (swap)`
pub fn move_to_record(mv: &Move, roll: Roll, turn: usize) -> String {
    let mut record = format!("{} {} {} ", turn, mv.player.glyph(), roll);

    if mv.is_exit {
        record.push_str(&format!("{}→off", mv.from));
    } else {
        record.push_str(&format!("{}→{}", mv.from, mv.to));
        let house = House::at(mv.to);
        if house.is_special() {
            record.push_str(house.glyph());
        }
    }
    if mv.is_swap {
        record.push_str(" (swap)");
    }
    record
}

/// 手番を飛ばした場合の棋譜表記
pub fn pass_to_record(player_glyph: &str, roll: Roll, turn: usize) -> String {
    format!("{} {} {} pass", turn, player_glyph, roll)
}

/// 描画できる（有限の）評価値だけを残す。終局の±∞はここで落ちる
fn finite_points(data: &[(usize, f64)]) -> Vec<(i32, f64)> {
    data.iter()
        .filter(|(_, score)| score.is_finite())
        .map(|&(turn, score)| (turn as i32, score))
        .collect()
}

/// 横軸の最大ターンと縦軸の範囲。描く点が無ければ`None`
fn graph_bounds(white: &[(i32, f64)], black: &[(i32, f64)]) -> Option<(i32, f64, f64)> {
    let mut points = white.iter().chain(black.iter()).peekable();
    points.peek()?;

    let (max_turn, mut low, mut high) = points.fold(
        (0, f64::INFINITY, f64::NEG_INFINITY),
        |(turn, low, high), &(t, score)| (turn.max(t), low.min(score), high.max(score)),
    );
    if low == high {
        low -= 1.0;
        high += 1.0;
    }
    Some((max_turn, low, high))
}

/// 白黒それぞれのAIが見た評価値の推移をPNGに描く
pub fn draw_evaluation_graph(white_data: &[(usize, f64)], black_data: &[(usize, f64)], path: &str) -> anyhow::Result<()> {
    let white = finite_points(white_data);
    let black = finite_points(black_data);
    let Some((max_turn, low, high)) = graph_bounds(&white, &black) else {
        return Ok(());
    };

    let root = BitMapBackend::new(path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Senet 評価値（白視点）", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0..max_turn + 1, low..high)?;

    chart.configure_mesh().x_desc("turn").y_desc("score").draw()?;

    for (points, color, label) in [(&white, &BLUE, "白AI"), (&black, &RED, "黒AI")] {
        if points.is_empty() {
            continue;
        }
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart.configure_series_labels().border_style(&BLACK).draw()?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Player;

    fn roll(v: u8) -> Roll {
        Roll::new(v).unwrap()
    }

    #[test]
    fn test_swap_record() {
        let mv = Move { from: 14, to: 17, player: Player::White, is_swap: true, is_exit: false };
        assert_eq!(move_to_record(&mv, roll(3), 12), "12 ● 3 14→17 (swap)");
    }

    #[test]
    fn test_record_marks_houses() {
        let mv = Move { from: 24, to: 26, player: Player::Black, is_swap: false, is_exit: false };
        assert_eq!(move_to_record(&mv, roll(2), 40), "40 ○ 2 24→26⚮");
    }

    #[test]
    fn test_exit_record() {
        let mv = Move { from: 30, to: 34, player: Player::White, is_swap: false, is_exit: true };
        assert_eq!(move_to_record(&mv, roll(4), 99), "99 ● 4 30→off");
    }

    #[test]
    fn test_graph_bounds_skip_infinite_scores() {
        let white = finite_points(&[(1, 10.0), (2, -4.0), (3, f64::INFINITY)]);
        let black = finite_points(&[(1, 2.0), (5, f64::NEG_INFINITY)]);
        assert_eq!(white.len(), 2);
        assert_eq!(black.len(), 1);
        assert_eq!(graph_bounds(&white, &black), Some((2, -4.0, 10.0)));
    }

    #[test]
    fn test_graph_bounds_widen_flat_series() {
        let white = finite_points(&[(1, 3.0), (4, 3.0)]);
        assert_eq!(graph_bounds(&white, &[]), Some((4, 2.0, 4.0)));
        assert_eq!(graph_bounds(&[], &[]), None);
    }

    #[test]
    fn test_graph_without_finite_points_writes_nothing() {
        let path = std::env::temp_dir().join(format!("senet_graph_empty_{}.png", std::process::id()));
        draw_evaluation_graph(&[(1, f64::INFINITY)], &[], &path.to_string_lossy()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_graph_is_written_to_png() {
        let path = std::env::temp_dir().join(format!("senet_graph_{}.png", std::process::id()));
        let white: Vec<(usize, f64)> = (1..=20).map(|t| (t, t as f64 * 1.5)).collect();
        let black: Vec<(usize, f64)> = (1..=20).map(|t| (t, -(t as f64))).collect();
        // フォントの無い環境では文字の描画で失敗しうるので、成功したときだけ中身を確かめる
        if draw_evaluation_graph(&white, &black, &path.to_string_lossy()).is_ok() {
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
            std::fs::remove_file(&path).unwrap();
        }
    }

    #[test]
    fn test_pass_record() {
        assert_eq!(pass_to_record(Player::Black.glyph(), roll(1), 5), "5 ○ 1 pass");
    }
}
