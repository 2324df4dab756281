//! 协调者 - 启动、输出收集与停机广播
//!
//! 唯一的特权代理：向起始顶点发送空路径移交以启动算法，把各顶点的
//! `Marked` 通知累积成只追加的输出日志，收到 `Finished` 后向所有
//! 顶点广播停机。协调者在装配期就知道全部顶点集合，这是有意保留的
//! 全局知识捷径。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use openmis_core::{
    COORDINATOR_ID, Envelope, Notification, OpenMisError, ProtocolMessage, Result, VertexId,
};

/// 输出日志的一条记录：某顶点完成 `Normal -> Vertex` 迁移
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkedEntry {
    pub vertex: VertexId,
    pub at: DateTime<Utc>,
}

/// 协调者
pub struct Coordinator {
    /// 广播顺序，与图的顶点插入顺序一致
    vertices: Vec<VertexId>,
    senders: HashMap<VertexId, mpsc::Sender<Envelope>>,
    inbox: mpsc::Receiver<Notification>,
    start: VertexId,
    /// 只追加的输出日志，仅由收到的通知填充
    log: Vec<MarkedEntry>,
}

impl Coordinator {
    pub fn new(
        vertices: Vec<VertexId>,
        senders: HashMap<VertexId, mpsc::Sender<Envelope>>,
        inbox: mpsc::Receiver<Notification>,
        start: impl Into<VertexId>,
    ) -> Self {
        Self {
            vertices,
            senders,
            inbox,
            start: start.into(),
            log: Vec::new(),
        }
    }

    /// 执行一次完整运行，返回被选入 MIS 的顶点日志
    pub async fn run(mut self) -> Result<Vec<MarkedEntry>> {
        if !self.senders.contains_key(&self.start) {
            return Err(OpenMisError::Config(format!(
                "start vertex {} is not in the graph",
                self.start
            )));
        }

        info!("coordinator kicks off at vertex {}", self.start);
        self.send_to(&self.start, ProtocolMessage::HandOff { path: Vec::new() })
            .await?;

        loop {
            match self.inbox.recv().await {
                Some(Notification::Marked { vertex, at }) => {
                    info!("vertex {vertex} joined the MIS");
                    self.log.push(MarkedEntry { vertex, at });
                }
                Some(Notification::Finished { vertex }) => {
                    info!("vertex {vertex} reported completion, broadcasting shutdown");
                    break;
                }
                None => {
                    return Err(OpenMisError::Channel(
                        "all vertex agents disconnected before finishing".to_string(),
                    ));
                }
            }
        }

        for vertex in &self.vertices {
            if let Err(err) = self.send_to(vertex, ProtocolMessage::Shutdown).await {
                warn!("failed to deliver shutdown to {vertex}: {err}");
            }
        }

        info!(
            "run complete: {} of {} vertices selected",
            self.log.len(),
            self.vertices.len()
        );
        Ok(self.log)
    }

    async fn send_to(&self, target: &str, payload: ProtocolMessage) -> Result<()> {
        let sender = self.senders.get(target).ok_or_else(|| {
            OpenMisError::Channel(format!("coordinator has no channel to {target}"))
        })?;
        sender
            .send(Envelope::new(COORDINATOR_ID, payload))
            .await
            .map_err(|_| OpenMisError::Channel(format!("channel to {target} is closed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_coordinator(
        vertex_ids: &[&str],
        start: &str,
    ) -> (
        Coordinator,
        HashMap<String, mpsc::Receiver<Envelope>>,
        mpsc::Sender<Notification>,
    ) {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for vertex in vertex_ids {
            let (tx, rx) = mpsc::channel(64);
            senders.insert(vertex.to_string(), tx);
            receivers.insert(vertex.to_string(), rx);
        }
        let (notify_tx, notify_rx) = mpsc::channel(64);
        let vertices = vertex_ids.iter().map(|v| v.to_string()).collect();
        let coordinator = Coordinator::new(vertices, senders, notify_rx, start);
        (coordinator, receivers, notify_tx)
    }

    #[tokio::test]
    async fn test_kickoff_collect_and_shutdown() {
        let (coordinator, mut receivers, notify_tx) = test_coordinator(&["a", "b"], "a");
        let handle = tokio::spawn(coordinator.run());

        // 起始顶点收到空路径移交
        let kickoff = receivers.get_mut("a").unwrap().recv().await.unwrap();
        assert_eq!(kickoff.from, COORDINATOR_ID);
        assert_eq!(kickoff.payload, ProtocolMessage::HandOff { path: vec![] });

        notify_tx.send(Notification::marked("a")).await.unwrap();
        notify_tx.send(Notification::marked("b")).await.unwrap();
        notify_tx.send(Notification::finished("b")).await.unwrap();

        let log = handle.await.unwrap().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].vertex, "a");
        assert_eq!(log[1].vertex, "b");

        // 每个顶点都收到停机广播
        for vertex in ["a", "b"] {
            let last = receivers.get_mut(vertex).unwrap().recv().await.unwrap();
            assert_eq!(last.payload, ProtocolMessage::Shutdown);
        }
    }

    #[tokio::test]
    async fn test_unknown_start_vertex_rejected() {
        let (coordinator, _receivers, _notify_tx) = test_coordinator(&["a"], "missing");
        assert!(coordinator.run().await.is_err());
    }

    #[tokio::test]
    async fn test_disconnect_before_finish_is_error() {
        let (coordinator, mut receivers, notify_tx) = test_coordinator(&["a"], "a");
        let handle = tokio::spawn(coordinator.run());

        receivers.get_mut("a").unwrap().recv().await.unwrap();
        drop(notify_tx);

        assert!(handle.await.unwrap().is_err());
    }
}
