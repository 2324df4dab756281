//! 运行结果

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use openmis_core::VertexId;
use openmis_protocol::MarkedEntry;

/// 一次完整运行的产出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MisResult {
    /// 本次运行的标识
    pub run_id: Uuid,
    /// 被选入 MIS 的顶点，按标记顺序
    pub selected: Vec<MarkedEntry>,
    /// 图的顶点总数
    pub vertex_count: usize,
    /// 墙钟耗时（毫秒）
    pub elapsed_ms: u64,
}

impl MisResult {
    /// 按标记顺序返回顶点 ID
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.selected
            .iter()
            .map(|entry| entry.vertex.clone())
            .collect()
    }

    /// 标记/搜索轮数，等于被选顶点数
    pub fn rounds(&self) -> usize {
        self.selected.len()
    }
}
