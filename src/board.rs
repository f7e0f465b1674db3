use std::fmt;

use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: u8 = 30;
pub const PIECES_PER_PLAYER: u8 = 7;

pub const HOUSE_OF_REBIRTH: u8 = 15;
pub const HOUSE_OF_HAPPINESS: u8 = 26;
pub const HOUSE_OF_WATER: u8 = 27;
pub const HOUSE_OF_THREE_TRUTHS: u8 = 28;
pub const HOUSE_OF_RE_ATOUM: u8 = 29;
pub const HOUSE_OF_HORUS: u8 = 30;

/// 対局者。白が先手。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Player {
    White,
    Black,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// 盤面表示用の記号
    pub fn glyph(self) -> &'static str {
        match self {
            Player::White => "●",
            Player::Black => "○",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Player::White => "White",
            Player::Black => "Black",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Player::White => 0,
            Player::Black => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.glyph())
    }
}

/// 特殊マス（家）の種類。位置から静的に引くだけで、局面ごとには保持しない。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum House {
    Normal,
    Rebirth,
    Happiness,
    Water,
    ThreeTruths,
    ReAtoum,
    Horus,
}

impl House {
    pub fn at(square: u8) -> House {
        match square {
            HOUSE_OF_REBIRTH => House::Rebirth,
            HOUSE_OF_HAPPINESS => House::Happiness,
            HOUSE_OF_WATER => House::Water,
            HOUSE_OF_THREE_TRUTHS => House::ThreeTruths,
            HOUSE_OF_RE_ATOUM => House::ReAtoum,
            HOUSE_OF_HORUS => House::Horus,
            _ => House::Normal,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            House::Normal => " ",
            House::Rebirth => "☥",
            House::Happiness => "⚮",
            House::Water => "≈",
            House::ThreeTruths => "⚶",
            House::ReAtoum => "☉",
            House::Horus => "⊙",
        }
    }

    pub fn is_special(self) -> bool {
        self != House::Normal
    }
}

/// 30マスのトラック。マス番号は1始まり。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Board {
    squares: [Option<Player>; BOARD_SIZE as usize],
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    /// 初期配置: 1〜14に白黒交互（奇数マスが白）。
    pub fn new() -> Self {
        let mut board = Board::empty();
        for square in 1..=14u8 {
            let player = if square % 2 == 1 { Player::White } else { Player::Black };
            board.set_piece_at(square, player);
        }
        board
    }

    pub fn empty() -> Self {
        Board { squares: [None; BOARD_SIZE as usize] }
    }

    pub fn piece_at(&self, square: u8) -> Option<Player> {
        if (1..=BOARD_SIZE).contains(&square) {
            self.squares[(square - 1) as usize]
        } else {
            None
        }
    }

    /// 範囲外のマスへの書き込みは無視される
    pub fn set_piece_at(&mut self, square: u8, player: Player) {
        if (1..=BOARD_SIZE).contains(&square) {
            self.squares[(square - 1) as usize] = Some(player);
        }
    }

    pub fn remove_piece_at(&mut self, square: u8) {
        if (1..=BOARD_SIZE).contains(&square) {
            self.squares[(square - 1) as usize] = None;
        }
    }

    pub fn is_empty(&self, square: u8) -> bool {
        self.piece_at(square).is_none()
    }

    /// 指定した対局者の駒があるマスを昇順で返す
    pub fn piece_positions(&self, player: Player) -> impl Iterator<Item = u8> + '_ {
        (1..=BOARD_SIZE).filter(move |&sq| self.piece_at(sq) == Some(player))
    }

    pub fn count_pieces(&self, player: Player) -> u8 {
        self.piece_positions(player).count() as u8
    }

    /// 水の家から戻される先。15が空いていれば15、そうでなければ14から下へ最初の空きマス、
    /// どこも空いていなければ1。
    pub fn rebirth_square(&self) -> u8 {
        if self.is_empty(HOUSE_OF_REBIRTH) {
            return HOUSE_OF_REBIRTH;
        }
        (1..HOUSE_OF_REBIRTH).rev().find(|&sq| self.is_empty(sq)).unwrap_or(1)
    }
}
