//! 核心编排层：错误、时钟、决策状态、行为编排器

pub mod clock;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::{BrainError, EngineError, HostError};
pub use orchestrator::RoboDogBrain;
pub use state::{CommandContext, Decision};
