//! 奖励治理：动作资格 + 冷却 / 信任守卫裁决，记录最近一次奖励时间
//!
//! 判定顺序：
//! 1. 动作在 reward_triggers 中标记为可奖励，否则拒绝
//! 2. 守卫 `can_reward(now, action, score, cooldown)` 放行
//!
//! 拒绝是静默的：调用方只会得到 `rewarded = false`。

use std::collections::HashMap;

use crate::reward::guard::{CooldownGuard, TrustGuard};

/// 奖励执行器触发时长（秒）
pub const REWARD_DURATION_S: f64 = 0.4;

/// 奖励治理状态：单一权威的 last_reward_ts，由所属编排器独占
pub struct RewardGovernor {
    triggers: HashMap<String, bool>,
    cooldown_s: f64,
    /// 0.0 表示从未发放过奖励
    last_reward_ts: f64,
    guard: Box<dyn TrustGuard>,
}

impl std::fmt::Debug for RewardGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewardGovernor")
            .field("triggers", &self.triggers)
            .field("cooldown_s", &self.cooldown_s)
            .field("last_reward_ts", &self.last_reward_ts)
            .finish_non_exhaustive()
    }
}

impl RewardGovernor {
    /// 使用默认冷却守卫；trigger 键统一转大写
    pub fn new(triggers: HashMap<String, bool>, cooldown_s: f64) -> Self {
        Self::with_guard(triggers, cooldown_s, Box::new(CooldownGuard::new()))
    }

    pub fn with_guard(
        triggers: HashMap<String, bool>,
        cooldown_s: f64,
        guard: Box<dyn TrustGuard>,
    ) -> Self {
        let triggers = triggers
            .into_iter()
            .map(|(k, v)| (k.trim().to_uppercase(), v))
            .collect();
        Self {
            triggers,
            cooldown_s: cooldown_s.max(0.0),
            last_reward_ts: 0.0,
            guard,
        }
    }

    pub fn is_eligible(&self, action: &str) -> bool {
        self.triggers.get(action).copied().unwrap_or(false)
    }

    pub fn should_reward(&self, action: &str, score: f64, now: f64) -> bool {
        if !self.is_eligible(action) {
            return false;
        }
        self.guard.can_reward(now, action, score, self.cooldown_s)
    }

    /// 奖励已执行：通知守卫并更新时间戳
    pub fn record_reward(&mut self, now: f64) {
        self.guard.note_reward(now);
        self.last_reward_ts = now;
    }

    pub fn cooldown_s(&self) -> f64 {
        self.cooldown_s
    }

    pub fn last_reward_ts(&self) -> Option<f64> {
        (self.last_reward_ts != 0.0).then_some(self.last_reward_ts)
    }

    /// 距上次奖励的秒数；从未奖励时按一个冷却周期计
    pub fn time_since_reward(&self, now: f64) -> f64 {
        match self.last_reward_ts() {
            Some(last) => now - last,
            None => self.cooldown_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor() -> RewardGovernor {
        RewardGovernor::new(
            HashMap::from([("sit".to_string(), true), ("NONE".to_string(), false)]),
            3.0,
        )
    }

    #[test]
    fn test_ineligible_action_rejected() {
        let g = governor();
        assert!(g.should_reward("SIT", 0.8, 1000.0));
        assert!(!g.should_reward("NONE", 0.99, 1000.0));
        assert!(!g.should_reward("BARK", 0.99, 1000.0));
    }

    #[test]
    fn test_cooldown_between_rewards() {
        let mut g = governor();
        assert!(g.should_reward("SIT", 0.8, 1000.0));
        g.record_reward(1000.0);
        assert!(!g.should_reward("SIT", 0.8, 1001.0));
        assert!(g.should_reward("SIT", 0.8, 1003.5));
        assert_eq!(g.last_reward_ts(), Some(1000.0));
    }

    #[test]
    fn test_time_since_reward_bootstrap() {
        let mut g = governor();
        assert_eq!(g.time_since_reward(5000.0), 3.0);
        g.record_reward(4990.0);
        assert_eq!(g.time_since_reward(5000.0), 10.0);
    }

    struct DenyAll;

    impl TrustGuard for DenyAll {
        fn can_reward(&self, _now: f64, _action: &str, _score: f64, _cooldown_s: f64) -> bool {
            false
        }

        fn note_reward(&mut self, _now: f64) {}
    }

    #[test]
    fn test_guard_veto() {
        let g = RewardGovernor::with_guard(
            HashMap::from([("SIT".to_string(), true)]),
            0.0,
            Box::new(DenyAll),
        );
        assert!(!g.should_reward("SIT", 1.0, 10.0));
    }
}
