//! 装配与运行
//!
//! 每个顶点一个收件信道与一个 tokio 任务；有边的两个代理互相持有
//! 对方的发送端，协调者持有全部发送端。进程内 mpsc 信道天然满足
//! 协议要求的可靠、FIFO、无丢失投递。

use std::collections::HashMap;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info};

use openmis_core::{Envelope, OpenMisError, ProtocolConfig, Result, VertexId};
use openmis_graph::Graph;
use openmis_protocol::{Coordinator, VertexAgent, policy_from_config};

use crate::result::MisResult;

/// 一次 MIS 运行的装配器
pub struct MisRuntime {
    graph: Graph,
    config: ProtocolConfig,
}

impl MisRuntime {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            config: ProtocolConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProtocolConfig) -> Self {
        self.config = config;
        self
    }

    /// 装配全部代理并执行一次完整运行
    pub async fn run(self) -> Result<MisResult> {
        self.graph.validate()?;

        let start = match &self.config.start_vertex {
            Some(vertex) => {
                if !self.graph.contains(vertex) {
                    return Err(OpenMisError::Config(format!(
                        "start vertex {vertex} is not in the graph"
                    )));
                }
                vertex.clone()
            }
            // 缺省取第一个顶点，保证确定性策略下运行可复现
            None => self.graph.vertices()[0].clone(),
        };

        let capacity = self.config.channel_capacity;
        let mut senders: HashMap<VertexId, mpsc::Sender<Envelope>> = HashMap::new();
        let mut inboxes: HashMap<VertexId, mpsc::Receiver<Envelope>> = HashMap::new();
        for vertex in self.graph.vertices() {
            let (tx, rx) = mpsc::channel(capacity);
            senders.insert(vertex.clone(), tx);
            inboxes.insert(vertex.clone(), rx);
        }
        let (notify_tx, notify_rx) = mpsc::channel(capacity);

        info!(
            "bootstrapping {} vertex agents, start vertex {start}",
            self.graph.vertex_count()
        );

        let mut handles = Vec::with_capacity(self.graph.vertex_count());
        for vertex in self.graph.vertices() {
            let edges = self.graph.edges_of(vertex)?.clone();
            let mut neighbor_senders = HashMap::new();
            for neighbor in edges.keys() {
                let sender = senders.get(neighbor).ok_or_else(|| {
                    OpenMisError::Runtime(format!("missing channel for neighbor {neighbor}"))
                })?;
                neighbor_senders.insert(neighbor.clone(), sender.clone());
            }
            let inbox = inboxes
                .remove(vertex)
                .ok_or_else(|| OpenMisError::Runtime(format!("missing inbox for {vertex}")))?;
            let agent = VertexAgent::new(
                vertex.clone(),
                edges,
                neighbor_senders,
                notify_tx.clone(),
                inbox,
            )
            .with_policy(policy_from_config(&self.config));
            debug!("spawning vertex agent {vertex}");
            handles.push(tokio::spawn(agent.run()));
        }
        // 代理各自持有克隆；释放装配期的发送端，让信道随代理退出而关闭
        drop(notify_tx);

        let coordinator = Coordinator::new(
            self.graph.vertices().to_vec(),
            senders,
            notify_rx,
            start,
        );

        let started = Instant::now();
        let selected = coordinator.run().await?;
        for joined in join_all(handles).await {
            joined.map_err(|err| OpenMisError::Runtime(format!("agent task failed: {err}")))??;
        }

        Ok(MisResult {
            run_id: uuid::Uuid::new_v4(),
            selected,
            vertex_count: self.graph.vertex_count(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openmis_core::SelectionKind;
    use std::time::Duration;
    use tokio::time::timeout;

    const RUN_DEADLINE: Duration = Duration::from_secs(10);

    fn cycle4() -> Graph {
        let mut graph = Graph::new();
        graph.add_edge("a", "b", 1.0).unwrap();
        graph.add_edge("b", "c", 1.0).unwrap();
        graph.add_edge("c", "d", 1.0).unwrap();
        graph.add_edge("d", "a", 1.0).unwrap();
        graph
    }

    async fn run_to_completion(graph: Graph, config: ProtocolConfig) -> MisResult {
        // 对任意有限连通图，协议必须在有界轮数内到达停机
        timeout(
            RUN_DEADLINE,
            MisRuntime::new(graph).with_config(config).run(),
        )
        .await
        .expect("protocol must terminate")
        .expect("run must succeed")
    }

    fn assert_is_mis(graph: &Graph, result: &MisResult) {
        let selected = result.vertex_ids();
        assert!(
            graph.is_independent_set(&selected),
            "independence violated: {selected:?}"
        );
        assert!(
            graph.is_maximal_independent_set(&selected),
            "maximality violated: {selected:?}"
        );
        assert!(result.rounds() <= graph.vertex_count());
    }

    /// 规约场景：4-环 A-B-C-D-A，从 A 启动，结果恒为 {A, C}
    #[tokio::test]
    async fn test_cycle4_from_a_selects_a_and_c() {
        let graph = cycle4();
        let config = ProtocolConfig::default()
            .with_start_vertex("a")
            .with_selection(SelectionKind::First);
        let result = run_to_completion(graph.clone(), config).await;

        assert_eq!(result.vertex_ids(), vec!["a".to_string(), "c".to_string()]);
        assert_is_mis(&graph, &result);
    }

    #[tokio::test]
    async fn test_cycle4_random_policy_still_yields_mis() {
        let graph = cycle4();
        let config = ProtocolConfig::default().with_seed(7);
        let result = run_to_completion(graph.clone(), config).await;
        assert_is_mis(&graph, &result);
        // 4-环上任何 MIS 恰为两个相对的顶点
        assert_eq!(result.rounds(), 2);
    }

    #[tokio::test]
    async fn test_path_graph_deterministic() {
        let mut graph = Graph::new();
        graph.add_edge("a", "b", 1.0).unwrap();
        graph.add_edge("b", "c", 1.0).unwrap();
        graph.add_edge("c", "d", 1.0).unwrap();
        graph.add_edge("d", "e", 1.0).unwrap();
        let config = ProtocolConfig::default()
            .with_start_vertex("a")
            .with_selection(SelectionKind::First);
        let result = run_to_completion(graph.clone(), config).await;

        assert_eq!(
            result.vertex_ids(),
            vec!["a".to_string(), "c".to_string(), "e".to_string()]
        );
        assert_is_mis(&graph, &result);
    }

    #[tokio::test]
    async fn test_star_from_center() {
        let mut graph = Graph::new();
        for leaf in ["l1", "l2", "l3", "l4"] {
            graph.add_edge("hub", leaf, 1.0).unwrap();
        }
        let config = ProtocolConfig::default().with_start_vertex("hub");
        let result = run_to_completion(graph.clone(), config).await;

        assert_eq!(result.vertex_ids(), vec!["hub".to_string()]);
        assert_is_mis(&graph, &result);
    }

    #[tokio::test]
    async fn test_star_from_leaf_selects_all_leaves() {
        let mut graph = Graph::new();
        for leaf in ["l1", "l2", "l3", "l4"] {
            graph.add_edge("hub", leaf, 1.0).unwrap();
        }
        let config = ProtocolConfig::default().with_start_vertex("l1").with_seed(3);
        let result = run_to_completion(graph.clone(), config).await;

        assert_eq!(result.rounds(), 4);
        assert_is_mis(&graph, &result);
    }

    #[tokio::test]
    async fn test_complete_graph_selects_one() {
        let mut graph = Graph::new();
        let ids = ["a", "b", "c", "d"];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                graph.add_edge(*a, *b, 1.0).unwrap();
            }
        }
        let result = run_to_completion(graph.clone(), ProtocolConfig::default()).await;

        assert_eq!(result.rounds(), 1);
        assert_is_mis(&graph, &result);
    }

    #[tokio::test]
    async fn test_single_vertex_graph() {
        let mut graph = Graph::new();
        graph.add_vertex("solo");
        let result = run_to_completion(graph.clone(), ProtocolConfig::default()).await;

        assert_eq!(result.vertex_ids(), vec!["solo".to_string()]);
        assert_is_mis(&graph, &result);
    }

    /// 带环与弦的稠密图：洪泛经多条边到达同一顶点，按 root 去重后
    /// 每个会话仍恰好结束
    #[tokio::test]
    async fn test_chorded_cycle_terminates_with_mis() {
        let mut graph = Graph::new();
        graph.add_edge("a", "b", 1.0).unwrap();
        graph.add_edge("b", "c", 1.0).unwrap();
        graph.add_edge("c", "d", 1.0).unwrap();
        graph.add_edge("d", "e", 1.0).unwrap();
        graph.add_edge("e", "f", 1.0).unwrap();
        graph.add_edge("f", "a", 1.0).unwrap();
        graph.add_edge("a", "d", 1.0).unwrap();
        graph.add_edge("b", "e", 1.0).unwrap();
        let config = ProtocolConfig::default().with_seed(11);
        let result = run_to_completion(graph.clone(), config).await;
        assert_is_mis(&graph, &result);
    }

    #[tokio::test]
    async fn test_grid_graph_seeded_runs() {
        // 3x3 网格
        let mut graph = Graph::new();
        for row in 0..3 {
            for col in 0..3 {
                if col + 1 < 3 {
                    graph
                        .add_edge(format!("v{row}{col}"), format!("v{row}{}", col + 1), 1.0)
                        .unwrap();
                }
                if row + 1 < 3 {
                    graph
                        .add_edge(format!("v{row}{col}"), format!("v{}{col}", row + 1), 1.0)
                        .unwrap();
                }
            }
        }
        for seed in [1, 2, 3] {
            let config = ProtocolConfig::default().with_seed(seed);
            let result = run_to_completion(graph.clone(), config).await;
            assert_is_mis(&graph, &result);
        }
    }

    #[tokio::test]
    async fn test_unknown_start_vertex_is_config_error() {
        let graph = cycle4();
        let config = ProtocolConfig::default().with_start_vertex("zz");
        let outcome = MisRuntime::new(graph).with_config(config).run().await;
        assert!(matches!(outcome, Err(OpenMisError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_graph_is_rejected_before_spawn() {
        let outcome = MisRuntime::new(Graph::new()).run().await;
        assert!(matches!(outcome, Err(OpenMisError::Graph(_))));
    }
}
