//! OpenMIS Protocol - 分布式贪心 MIS 协议核心
//!
//! 每个图顶点一个顺序执行的代理，只与图邻居（和协调者）交换消息，
//! 共同模拟顺序贪心 MIS 算法：取一个未标记顶点、标记、排除其邻居、
//! 重复直至不再有合格顶点。
//!
//! - [`agent::VertexAgent`] — 顶点状态机、标记/排除协议、洪泛搜索
//! - [`coordinator::Coordinator`] — 启动、输出收集、停机广播
//! - [`selection`] — 可插拔的候选路径选取策略

pub mod agent;
pub mod coordinator;
pub mod selection;

pub use agent::VertexAgent;
pub use coordinator::{Coordinator, MarkedEntry};
pub use selection::{FirstCandidate, SelectionPolicy, UniformRandom, policy_from_config};
