use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::ai::{MAX_SEARCH_DEPTH, MIN_SEARCH_DEPTH};
use crate::board::Player;
use crate::error::SenetError;
use crate::evaluation::HeuristicWeights;

/// 片側のAIの設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_depth: u8,
    /// 1手あたりの持ち時間（ミリ秒）。`None`なら無制限
    pub time_limit_ms: Option<u64>,
    /// ルートの手をrayonで並列に評価する
    pub parallel_root: bool,
    pub weights: HeuristicWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_depth: 3,
            time_limit_ms: None,
            parallel_root: false,
            weights: HeuristicWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), SenetError> {
        if !(MIN_SEARCH_DEPTH..=MAX_SEARCH_DEPTH).contains(&self.max_depth) {
            return Err(SenetError::InvalidConfig(format!(
                "max_depth must be between {} and {}, got {}",
                MIN_SEARCH_DEPTH, MAX_SEARCH_DEPTH, self.max_depth
            )));
        }
        let w = &self.weights;
        let all = [w.exited, w.advancement, w.safety, w.safe_zone_bonus, w.home_stretch_bonus, w.special_square, w.blocking];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(SenetError::InvalidConfig("heuristic weights must be finite".to_string()));
        }
        Ok(())
    }
}

/// 自己対局と対局場の設定。JSONから読み込む。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub white: EngineConfig,
    pub black: EngineConfig,
    /// 棒の乱数の種。`None`ならエントロピーから
    pub seed: Option<u64>,
    pub max_turns: u32,
    /// 対局場で指す局数
    pub games: usize,
    pub record_path: Option<PathBuf>,
    pub graph_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            white: EngineConfig::default(),
            black: EngineConfig::default(),
            seed: None,
            max_turns: 1000,
            games: 100,
            record_path: None,
            graph_path: None,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, SenetError> {
        let content = std::fs::read_to_string(path).map_err(|e| SenetError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// ファイルが無ければ既定値を使う
    pub fn load_or_default(path: &Path) -> Result<Self, SenetError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SenetError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SenetError> {
        self.white.validate()?;
        self.black.validate()?;
        if self.max_turns == 0 {
            return Err(SenetError::InvalidConfig("max_turns must be > 0".to_string()));
        }
        if self.games == 0 {
            return Err(SenetError::InvalidConfig("games must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn engine(&self, player: Player) -> &EngineConfig {
        match player {
            Player::White => &self.white,
            Player::Black => &self.black,
        }
    }
}
