//! 顶点类型定义
//!
//! 顶点标识、顶点状态机、搜索路径与单深度延迟调用。

use serde::{Deserialize, Serialize};

/// 顶点 ID 类型
pub type VertexId = String;

/// 协调者的保留标识，不参与图拓扑
pub const COORDINATOR_ID: &str = "coordinator";

/// 从搜索 root 到某个 NORMAL 顶点的有序路由
pub type SearchPath = Vec<VertexId>;

/// 顶点状态
///
/// 状态迁移是单向的：`Normal -> Vertex` 或 `Normal -> Out`，
/// 两者都是终态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum VertexState {
    /// 初始状态，仍可被选入 MIS
    #[default]
    Normal,
    /// 已被选入 MIS
    Vertex,
    /// 某个 Vertex 的邻居，被排除
    Out,
}

impl VertexState {
    /// 是否仍可被选入 MIS
    pub fn is_eligible(&self) -> bool {
        matches!(self, VertexState::Normal)
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        !self.is_eligible()
    }
}

impl std::fmt::Display for VertexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VertexState::Normal => write!(f, "NORMAL"),
            VertexState::Vertex => write!(f, "VERTEX"),
            VertexState::Out => write!(f, "OUT"),
        }
    }
}

/// 单深度延迟调用
///
/// 每个顶点代理同一时刻最多持有一个待执行的顶层操作，
/// 由消息处理器写入、由该代理自己的调度循环消费。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingCall {
    /// 无待执行操作
    #[default]
    Idle,
    /// 下一步执行 mark()
    RunMark,
    /// 下一步以给定路径参与搜索，并把结果回给 `reply_to`
    RunSearch {
        path: SearchPath,
        reply_to: VertexId,
    },
}

impl PendingCall {
    pub fn is_idle(&self) -> bool {
        matches!(self, PendingCall::Idle)
    }
}
