//! 奖励治理：冷却、信任守卫与奖励时间戳

pub mod governor;
pub mod guard;

pub use governor::{RewardGovernor, REWARD_DURATION_S};
pub use guard::{CooldownGuard, TrustGuard};
