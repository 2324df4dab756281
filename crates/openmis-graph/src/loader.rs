//! 图描述文件加载
//!
//! JSON 格式的边列表；顶点列表可选，缺省时由边推导。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use openmis_core::{OpenMisError, Result, VertexId};

use crate::graph::Graph;

/// 图描述文件
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphFile {
    /// 显式顶点列表，可为空
    #[serde(default)]
    pub vertices: Vec<VertexId>,
    /// 无向边列表
    pub edges: Vec<EdgeEntry>,
}

/// 一条无向边
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub from: VertexId,
    pub to: VertexId,
    /// 边权，协议不使用，仅作为配置保留
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl GraphFile {
    /// 构建并校验 [`Graph`]
    pub fn build(&self) -> Result<Graph> {
        let mut graph = Graph::new();
        for vertex in &self.vertices {
            graph.add_vertex(vertex.clone());
        }
        for edge in &self.edges {
            graph.add_edge(edge.from.clone(), edge.to.clone(), edge.weight)?;
        }
        graph.validate()?;
        Ok(graph)
    }
}

/// 从 JSON 文件加载并校验图
pub fn load_graph(path: impl AsRef<Path>) -> Result<Graph> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let file: GraphFile = serde_json::from_str(&raw)?;
    let graph = file.build()?;
    info!(
        "loaded graph from {}: {} vertices, {} edges",
        path.display(),
        graph.vertex_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// 从 JSON 字符串加载并校验图
pub fn parse_graph(raw: &str) -> Result<Graph> {
    let file: GraphFile = serde_json::from_str(raw)?;
    file.build()
}

impl std::str::FromStr for GraphFile {
    type Err = OpenMisError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(serde_json::from_str(s)?)
    }
}
