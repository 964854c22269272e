//! 规则组装错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("无效的规则输入: {0}")]
    InvalidInput(String),

    #[error("规则定义无效: {0}")]
    DefinitionError(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("配置加载失败: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;
