//! OpenMIS Runtime - 装配与运行
//!
//! 引导协作者：为每个图顶点创建一个代理任务和收件信道，按图的边
//! 建立代理间信道，装配协调者，运行一次完整的协议并收集结果。

pub mod bootstrap;
pub mod result;

pub use bootstrap::*;
pub use result::*;
