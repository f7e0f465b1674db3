use std::fmt;

use arrayvec::ArrayVec;

use crate::board::{
    Player, BOARD_SIZE, HOUSE_OF_HAPPINESS, HOUSE_OF_HORUS, HOUSE_OF_RE_ATOUM,
    HOUSE_OF_THREE_TRUTHS, HOUSE_OF_WATER, PIECES_PER_PLAYER,
};
use crate::sticks::Roll;
use crate::state::GameState;

/// 指し手。一度作られたら変更されない。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub player: Player,
    pub is_swap: bool,
    pub is_exit: bool,
}

impl Move {
    fn ordinary(from: u8, to: u8, player: Player) -> Self {
        Move { from, to, player, is_swap: false, is_exit: false }
    }

    fn swap(from: u8, to: u8, player: Player) -> Self {
        Move { from, to, player, is_swap: true, is_exit: false }
    }

    fn exit(from: u8, to: u8, player: Player) -> Self {
        Move { from, to, player, is_swap: false, is_exit: true }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = if self.is_exit {
            "EXIT"
        } else if self.is_swap {
            "SWAP"
        } else {
            "MOVE"
        };
        if self.is_exit {
            write!(f, "{}: {} from {} off the board", action, self.player.glyph(), self.from)
        } else {
            write!(f, "{}: {} from {} to {}", action, self.player.glyph(), self.from, self.to)
        }
    }
}

/// 駒は最大7枚なので、合法手も最大7手
pub type MoveList = ArrayVec<Move, { PIECES_PER_PLAYER as usize }>;

/// 最後の5マスにいる駒の家ごとの規則。`Some`ならその手だけが生成され、通常の移動は調べない。
///
/// 28と29は決められた出目でしか動けず、それ以外の出目では駒はその場に留まる。
enum HouseRule {
    Exit,
    Stay,
    Ordinary,
}

fn house_rule(from: u8, roll: Roll) -> HouseRule {
    let target = from + roll.value();
    match from {
        HOUSE_OF_HAPPINESS if target > BOARD_SIZE => HouseRule::Exit,
        HOUSE_OF_THREE_TRUTHS => {
            if roll.value() == 3 {
                HouseRule::Exit
            } else {
                HouseRule::Stay
            }
        }
        HOUSE_OF_RE_ATOUM => {
            if roll.value() == 2 {
                HouseRule::Exit
            } else {
                HouseRule::Stay
            }
        }
        HOUSE_OF_HORUS => HouseRule::Exit,
        _ => HouseRule::Ordinary,
    }
}

/// 手番の対局者の合法手を、駒のあるマスの昇順で列挙する。局面は変更しない。
pub fn legal_moves(state: &GameState, roll: Roll) -> MoveList {
    let mut moves = MoveList::new();
    if state.is_game_over() {
        return moves;
    }

    let player = state.current_player();
    let board = state.board();

    for from in board.piece_positions(player) {
        let to = from + roll.value();

        if from >= HOUSE_OF_HAPPINESS {
            match house_rule(from, roll) {
                HouseRule::Exit => {
                    moves.push(Move::exit(from, to, player));
                    continue;
                }
                HouseRule::Stay => continue,
                HouseRule::Ordinary => {}
            }
        }

        if to > BOARD_SIZE {
            moves.push(Move::exit(from, to, player));
        } else {
            match board.piece_at(to) {
                None => moves.push(Move::ordinary(from, to, player)),
                Some(occupant) if occupant != player => moves.push(Move::swap(from, to, player)),
                Some(_) => {}
            }
        }
    }

    moves
}

pub fn has_legal_moves(state: &GameState, roll: Roll) -> bool {
    !legal_moves(state, roll).is_empty()
}

/// 指し手を適用した新しい局面を返す。手番の交代は呼び出し側が行う。
pub fn apply_move(state: &GameState, mv: &Move) -> GameState {
    let mut next = *state;
    let player = mv.player;

    if mv.is_exit {
        next.board.remove_piece_at(mv.from);
        next.record_exit(player);
    } else if mv.is_swap {
        next.board.set_piece_at(mv.from, player.opponent());
        next.board.set_piece_at(mv.to, player);
    } else {
        next.board.remove_piece_at(mv.from);
        next.board.set_piece_at(mv.to, player);
        if mv.to == HOUSE_OF_WATER {
            next.board.remove_piece_at(HOUSE_OF_WATER);
            let rebirth = next.board.rebirth_square();
            next.board.set_piece_at(rebirth, player);
        }
    }

    next
}

pub fn is_terminal(state: &GameState) -> bool {
    state.is_game_over()
}
