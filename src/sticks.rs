use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SenetError;

pub const NUM_STICKS: usize = 4;
pub const MIN_ROLL: u8 = 1;
pub const MAX_ROLL: u8 = 5;

/// 棒を投げた結果の出目（1〜5）。範囲外の値は作れない。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Roll(u8);

impl Roll {
    pub fn new(value: u8) -> Result<Self, SenetError> {
        if (MIN_ROLL..=MAX_ROLL).contains(&value) {
            Ok(Roll(value))
        } else {
            Err(SenetError::InvalidRoll(value))
        }
    }

    /// 黒い面の数から出目へ。0本なら5。
    pub fn from_dark_count(dark: usize) -> Roll {
        match dark {
            1 => Roll(1),
            2 => Roll(2),
            3 => Roll(3),
            4 => Roll(4),
            _ => Roll(5),
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Roll {
    type Error = SenetError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Roll::new(value)
    }
}

impl From<Roll> for u8 {
    fn from(roll: Roll) -> u8 {
        roll.0
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// すべての出目
pub const ROLLS: [Roll; 5] = [Roll(1), Roll(2), Roll(3), Roll(4), Roll(5)];

/// 出目の確率。4本の棒の表裏（各1/2）から求めた閉形式の値で、探索はこれだけを使う。
///
/// | 出目 | 黒の本数 | 組合せ | 確率 |
/// |---|---|---|---|
/// | 1 | 1 | 4 | 4/16 |
/// | 2 | 2 | 6 | 6/16 |
/// | 3 | 3 | 4 | 4/16 |
/// | 4 | 4 | 1 | 1/16 |
/// | 5 | 0 | 1 | 1/16 |
pub fn probability(roll: Roll) -> f64 {
    match roll.0 {
        1 => 4.0 / 16.0,
        2 => 6.0 / 16.0,
        3 => 4.0 / 16.0,
        _ => 1.0 / 16.0,
    }
}

pub fn distribution() -> [(Roll, f64); 5] {
    ROLLS.map(|roll| (roll, probability(roll)))
}

/// 実際の投擲結果。`true`が黒い面。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Throw {
    pub sticks: [bool; NUM_STICKS],
    pub roll: Roll,
}

impl fmt::Display for Throw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces: Vec<&str> = self.sticks.iter().map(|&dark| if dark { "■" } else { "□" }).collect();
        write!(f, "Sticks: [{}] → Roll: {}", faces.join(" "), self.roll)
    }
}

/// 4本の棒を投げる。乱数源は呼び出し側が渡す。
pub fn throw_sticks<R: Rng + ?Sized>(rng: &mut R) -> Throw {
    let mut sticks = [false; NUM_STICKS];
    for stick in sticks.iter_mut() {
        *stick = rng.gen_bool(0.5);
    }
    let dark = sticks.iter().filter(|&&s| s).count();
    Throw { sticks, roll: Roll::from_dark_count(dark) }
}
