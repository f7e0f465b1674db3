use crate::board::{Board, Player, PIECES_PER_PLAYER};
use crate::error::SenetError;

/// 局面。探索中は分岐ごとに丸ごとコピーされ、共有された局面が書き換えられることはない。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GameState {
    pub(crate) board: Board,
    pub(crate) current_player: Player,
    pub(crate) exited: [u8; 2],
    pub(crate) winner: Option<Player>,
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

impl GameState {
    /// 初期局面（白番）
    pub fn new() -> Self {
        GameState {
            board: Board::new(),
            current_player: Player::White,
            exited: [0, 0],
            winner: None,
        }
    }

    /// 任意の局面を組み立てる。盤上の駒数と上がった駒数の合計が7を超える場合はエラー。
    /// 上がり数が7に達している側がいればその対局者を勝者とする。
    pub fn from_parts(
        board: Board,
        current_player: Player,
        white_exited: u8,
        black_exited: u8,
    ) -> Result<Self, SenetError> {
        for (player, exited) in [(Player::White, white_exited), (Player::Black, black_exited)] {
            let on_board = board.count_pieces(player);
            if exited.saturating_add(on_board) > PIECES_PER_PLAYER {
                return Err(SenetError::InvalidState(format!(
                    "{} has {} pieces on board and {} exited (max {})",
                    player.name(),
                    on_board,
                    exited,
                    PIECES_PER_PLAYER
                )));
            }
        }
        if white_exited == PIECES_PER_PLAYER && black_exited == PIECES_PER_PLAYER {
            return Err(SenetError::InvalidState("both players cannot have won".to_string()));
        }

        let winner = if white_exited == PIECES_PER_PLAYER {
            Some(Player::White)
        } else if black_exited == PIECES_PER_PLAYER {
            Some(Player::Black)
        } else {
            None
        };

        Ok(GameState {
            board,
            current_player,
            exited: [white_exited, black_exited],
            winner,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn switch_player(&mut self) {
        self.current_player = self.current_player.opponent();
    }

    pub fn exited(&self, player: Player) -> u8 {
        self.exited[player.index()]
    }

    /// まだ上がっていない駒の数
    pub fn remaining(&self, player: Player) -> u8 {
        PIECES_PER_PLAYER - self.exited(player)
    }

    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub(crate) fn record_exit(&mut self, player: Player) {
        let count = &mut self.exited[player.index()];
        *count += 1;
        if *count >= PIECES_PER_PLAYER {
            self.winner = Some(player);
        }
    }
}
