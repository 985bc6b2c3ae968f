//! 引擎错误类型
//!
//! 只有构造期（配置 / 词表 / 权重）会失败；决策路径上的越界输入一律钳制，协作者失败一律降级。

use thiserror::Error;

/// 构造与配置阶段可能出现的错误（快速失败，不静默忽略）
#[derive(Error, Debug)]
pub enum BrainError {
    #[error("Config error: {0}")]
    Config(String),

    /// 指令词表中出现空短语
    #[error("Command map keys must be non-empty strings")]
    InvalidCommandKey,

    /// 线性权重表 / 策略文档格式不合法
    #[error("Invalid policy weights: {0}")]
    InvalidWeights(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid key path: {0}")]
    InvalidKeyPath(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// 宿主层（异步包装）错误：截止时间与后台任务
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Decision exceeded latency budget of {0} ms")]
    DeadlineExceeded(u64),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<config::ConfigError> for BrainError {
    fn from(err: config::ConfigError) -> Self {
        BrainError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BrainError {
    fn from(err: serde_json::Error) -> Self {
        BrainError::Serialize(err.to_string())
    }
}

/// 外部协作者（语音识别 / 合成 / 执行器）的可恢复错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 后端不可用（未安装、未配置、硬件缺失）
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    /// 后端存在但本次调用失败
    #[error("Engine call failed: {0}")]
    Failed(String),
}
