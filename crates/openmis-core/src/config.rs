//! 配置管理

use serde::{Deserialize, Serialize};

use crate::vertex::VertexId;

/// 协议运行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// 每个代理收件信道的容量
    pub channel_capacity: usize,
    /// 起始顶点；缺省时取图中第一个顶点
    pub start_vertex: Option<VertexId>,
    /// 候选路径的选取策略
    pub selection: SelectionKind,
    /// 随机策略的种子；缺省时由系统熵初始化
    pub seed: Option<u64>,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            start_vertex: None,
            selection: SelectionKind::Uniform,
            seed: None,
        }
    }
}

impl ProtocolConfig {
    pub fn with_start_vertex(mut self, vertex: impl Into<VertexId>) -> Self {
        self.start_vertex = Some(vertex.into());
        self
    }

    pub fn with_selection(mut self, selection: SelectionKind) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

/// 候选路径选取策略
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum SelectionKind {
    /// 均匀随机选取
    #[default]
    Uniform,
    /// 总是取第一条候选路径，用于确定性运行
    First,
}

impl std::fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionKind::Uniform => write!(f, "uniform"),
            SelectionKind::First => write!(f, "first"),
        }
    }
}

impl std::str::FromStr for SelectionKind {
    type Err = crate::error::OpenMisError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(SelectionKind::Uniform),
            "first" => Ok(SelectionKind::First),
            other => Err(crate::error::OpenMisError::Config(format!(
                "unknown selection policy: {other}"
            ))),
        }
    }
}
