//! 统一错误处理

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenMisError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("图结构错误: {0}")]
    Graph(String),

    #[error("消息通道错误: {0}")]
    Channel(String),

    #[error("协议错误: {0}")]
    Protocol(String),

    #[error("运行时错误: {0}")]
    Runtime(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OpenMisError>;
