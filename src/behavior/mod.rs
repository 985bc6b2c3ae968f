//! 行为层：特征、评分网络、策略

pub mod inputs;
pub mod network;
pub mod policy;

pub use inputs::{BehaviorInputs, BehaviorVector, TrainingExample, FEATURE_COUNT, FEATURE_NAMES};
pub use network::{AdaptiveMlp, Matrix, NetworkParameters};
pub use policy::{BehaviorPolicy, PolicyConfig, TrainingRecord, DEFAULT_WEIGHTS};
