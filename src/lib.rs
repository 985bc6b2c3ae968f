//! RoboDog - 语音指令驱动的行为决策引擎
//!
//! 模块划分：
//! - **behavior**: 行为特征、自适应评分网络（单隐层，在线训练）、策略
//! - **command**: 指令文本归一化与词表匹配
//! - **config**: 配置加载（TOML / JSON / YAML + 环境变量）与写回
//! - **core**: 错误类型、决策状态、行为编排器 RoboDogBrain
//! - **engines**: 语音识别 / 语音合成 / 奖励执行器后端
//! - **host**: 异步宿主包装（串行化访问、截止时间、后台训练）
//! - **observability**: tracing 日志与 Prometheus 指标
//! - **reward**: 奖励治理（冷却 + 信任守卫）
//! - **simulation**: 闭环仿真环境

pub mod behavior;
pub mod command;
pub mod config;
pub mod core;
pub mod engines;
pub mod host;
pub mod observability;
pub mod reward;
pub mod simulation;

pub use crate::config::RoboDogSettings;
pub use crate::core::{BrainError, CommandContext, Decision, RoboDogBrain};
pub use crate::host::SharedBrain;
