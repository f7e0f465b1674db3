pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod rules;
pub mod search_stats;
pub mod state;
pub mod sticks;
pub mod utils;

pub use ai::{SearchResult, SenetAI};
pub use board::{Board, Player};
pub use error::SenetError;
pub use evaluation::{evaluate, Evaluator, HeuristicWeights, SenetEvaluator};
pub use rules::{apply_move, legal_moves, Move};
pub use state::GameState;
pub use sticks::{throw_sticks, Roll};
