//! 无向图邻接结构

use std::collections::{HashMap, HashSet, VecDeque};

use openmis_core::{OpenMisError, Result, VertexId};

/// 无向图
///
/// 运行期间静态不变；顶点保持插入顺序，保证确定性运行可复现。
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adjacency: HashMap<VertexId, HashMap<VertexId, f64>>,
    order: Vec<VertexId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加顶点；重复添加是幂等的
    pub fn add_vertex(&mut self, id: impl Into<VertexId>) {
        let id = id.into();
        if !self.adjacency.contains_key(&id) {
            self.adjacency.insert(id.clone(), HashMap::new());
            self.order.push(id);
        }
    }

    /// 添加无向边，两端顶点不存在时自动创建
    pub fn add_edge(
        &mut self,
        a: impl Into<VertexId>,
        b: impl Into<VertexId>,
        weight: f64,
    ) -> Result<()> {
        let a = a.into();
        let b = b.into();
        if a == b {
            return Err(OpenMisError::Graph(format!("self-loop on vertex {a}")));
        }
        self.add_vertex(a.clone());
        self.add_vertex(b.clone());
        if let Some(edges) = self.adjacency.get_mut(&a) {
            edges.insert(b.clone(), weight);
        }
        if let Some(edges) = self.adjacency.get_mut(&b) {
            edges.insert(a, weight);
        }
        Ok(())
    }

    /// 按插入顺序返回所有顶点
    pub fn vertices(&self) -> &[VertexId] {
        &self.order
    }

    pub fn vertex_count(&self) -> usize {
        self.order.len()
    }

    /// 无向边数
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|edges| edges.len()).sum::<usize>() / 2
    }

    pub fn contains(&self, id: &str) -> bool {
        self.adjacency.contains_key(id)
    }

    /// 某顶点的邻居到边权的映射
    pub fn edges_of(&self, id: &str) -> Result<&HashMap<VertexId, f64>> {
        self.adjacency
            .get(id)
            .ok_or_else(|| OpenMisError::Graph(format!("unknown vertex: {id}")))
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|edges| edges.contains_key(b))
    }

    /// 从任一顶点 BFS 判定连通性
    pub fn is_connected(&self) -> bool {
        let Some(start) = self.order.first() else {
            return false;
        };
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start.clone());
        queue.push_back(start.clone());
        while let Some(current) = queue.pop_front() {
            if let Some(edges) = self.adjacency.get(&current) {
                for neighbor in edges.keys() {
                    if visited.insert(neighbor.clone()) {
                        queue.push_back(neighbor.clone());
                    }
                }
            }
        }
        visited.len() == self.order.len()
    }

    /// 校验图可用于协议运行：非空且连通
    pub fn validate(&self) -> Result<()> {
        if self.order.is_empty() {
            return Err(OpenMisError::Graph("graph has no vertices".to_string()));
        }
        if !self.is_connected() {
            return Err(OpenMisError::Graph("graph is not connected".to_string()));
        }
        Ok(())
    }

    /// 独立性：集合内任意两顶点不相邻
    pub fn is_independent_set(&self, set: &[VertexId]) -> bool {
        for (i, a) in set.iter().enumerate() {
            for b in &set[i + 1..] {
                if self.has_edge(a, b) {
                    return false;
                }
            }
        }
        true
    }

    /// 极大性：集合外每个顶点至少有一个集合内邻居
    pub fn is_maximal_independent_set(&self, set: &[VertexId]) -> bool {
        if !self.is_independent_set(set) {
            return false;
        }
        let selected: HashSet<&VertexId> = set.iter().collect();
        self.order.iter().all(|vertex| {
            selected.contains(vertex)
                || self.adjacency[vertex]
                    .keys()
                    .any(|neighbor| selected.contains(neighbor))
        })
    }
}
