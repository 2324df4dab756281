//! 协议消息定义
//!
//! 顶点间的协议消息与发往协调者的通知。所有交互都通过消息完成，
//! 任何代理都不直接读写其他代理的状态。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::vertex::{SearchPath, VertexId};

/// 顶点间协议消息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolMessage {
    /// 标记协议：要求接收者把自己置为 OUT
    Exclude,
    /// 标记协议：对 Exclude 的确认
    ExcludeAck,
    /// 搜索协议：洪泛推进，`path` 为从 root 到接收者的路由
    Flood { path: SearchPath },
    /// 搜索协议：回波，携带零或多条候选路径
    FloodReply { paths: Vec<SearchPath> },
    /// 移交协议：源路由的"下一个标记者"指派
    HandOff { path: SearchPath },
    /// 协调者广播的停机信号
    Shutdown,
}

/// 带发送者的消息信封
///
/// 协议依赖逐对 FIFO 投递；同一信道上的信封不丢失、不乱序。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    /// 发送者 ID
    pub from: VertexId,
    /// 消息载荷
    pub payload: ProtocolMessage,
}

impl Envelope {
    pub fn new(from: impl Into<VertexId>, payload: ProtocolMessage) -> Self {
        Self {
            from: from.into(),
            payload,
        }
    }

    pub fn exclude(from: impl Into<VertexId>) -> Self {
        Self::new(from, ProtocolMessage::Exclude)
    }

    pub fn exclude_ack(from: impl Into<VertexId>) -> Self {
        Self::new(from, ProtocolMessage::ExcludeAck)
    }

    pub fn flood(from: impl Into<VertexId>, path: SearchPath) -> Self {
        Self::new(from, ProtocolMessage::Flood { path })
    }

    pub fn flood_reply(from: impl Into<VertexId>, paths: Vec<SearchPath>) -> Self {
        Self::new(from, ProtocolMessage::FloodReply { paths })
    }

    pub fn hand_off(from: impl Into<VertexId>, path: SearchPath) -> Self {
        Self::new(from, ProtocolMessage::HandOff { path })
    }

    pub fn shutdown(from: impl Into<VertexId>) -> Self {
        Self::new(from, ProtocolMessage::Shutdown)
    }
}

/// 发往协调者的通知
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// 某顶点完成 `Normal -> Vertex` 迁移
    Marked {
        vertex: VertexId,
        at: DateTime<Utc>,
    },
    /// 某顶点的搜索返回空候选集，算法结束
    Finished { vertex: VertexId },
}

impl Notification {
    pub fn marked(vertex: impl Into<VertexId>) -> Self {
        Notification::Marked {
            vertex: vertex.into(),
            at: Utc::now(),
        }
    }

    pub fn finished(vertex: impl Into<VertexId>) -> Self {
        Notification::Finished {
            vertex: vertex.into(),
        }
    }
}
