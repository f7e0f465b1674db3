use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// 探索木のノードの種類
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum NodeType {
    /// 自分の手番。評価値を最大化する
    Max,
    /// 相手の手番。評価値を最小化する
    Min,
    /// 棒を投げる直前。出目の確率で期待値を取る
    Chance,
}

/// 1回の探索で訪れたノード数などの集計。探索の結果には影響しない。
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SearchStats {
    pub nodes_explored: u64,
    pub max_nodes: u64,
    pub min_nodes: u64,
    pub chance_nodes: u64,
    /// ルートから数えた到達プライ数
    pub max_depth_reached: u8,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl SearchStats {
    pub fn new() -> Self {
        SearchStats::default()
    }

    pub fn reset(&mut self) {
        *self = SearchStats::default();
    }

    pub fn increment_node(&mut self, node_type: NodeType) {
        self.nodes_explored += 1;
        match node_type {
            NodeType::Max => self.max_nodes += 1,
            NodeType::Min => self.min_nodes += 1,
            NodeType::Chance => self.chance_nodes += 1,
        }
    }

    pub fn update_max_depth(&mut self, ply: u8) {
        self.max_depth_reached = self.max_depth_reached.max(ply);
    }

    /// 並列探索や対局全体での集計用
    pub fn merge(&mut self, other: &SearchStats) {
        self.nodes_explored += other.nodes_explored;
        self.max_nodes += other.max_nodes;
        self.min_nodes += other.min_nodes;
        self.chance_nodes += other.chance_nodes;
        self.max_depth_reached = self.max_depth_reached.max(other.max_depth_reached);
        self.elapsed += other.elapsed;
    }
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total nodes explored: {}", self.nodes_explored)?;
        writeln!(f, "  - MAX nodes:        {}", self.max_nodes)?;
        writeln!(f, "  - MIN nodes:        {}", self.min_nodes)?;
        writeln!(f, "  - CHANCE nodes:     {}", self.chance_nodes)?;
        writeln!(f, "Max depth reached:    {}", self.max_depth_reached)?;
        write!(f, "Time taken:           {} ms", self.elapsed.as_millis())
    }
}
