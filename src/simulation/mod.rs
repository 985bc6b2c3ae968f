//! 闭环仿真：无硬件验证策略

pub mod env;

pub use env::{Decider, DogEnv, EnvState, EpisodeReport, Observation, StepOutcome, DEFAULT_SEED};
