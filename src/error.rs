use std::path::PathBuf;

/// ライブラリ全体のエラー型。合法手が無いことはエラーではなく、空のリストや`None`で表す。
#[derive(Debug, thiserror::Error)]
pub enum SenetError {
    #[error("invalid roll {0}: must be between 1 and 5")]
    InvalidRoll(u8),

    #[error("invalid search depth {depth}: must be between {min} and {max}")]
    InvalidDepth { depth: u8, min: u8, max: u8 },

    #[error("invalid game state: {0}")]
    InvalidState(String),

    #[error("config validation error: {0}")]
    InvalidConfig(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
