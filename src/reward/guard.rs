//! 信任 / 伦理守卫：在冷却时间之外再裁决一次奖励是否放行
//!
//! 引擎只依赖 `can_reward` 的布尔结论与 `note_reward` 回调；具体策略可替换。

use std::collections::VecDeque;

/// 守卫 trait：由 RewardGovernor 持有
pub trait TrustGuard: Send {
    /// 是否允许在 `now` 时刻为 `action`（得分 `score`）发放奖励
    fn can_reward(&self, now: f64, action: &str, score: f64, cooldown_s: f64) -> bool;

    /// 奖励已发放
    fn note_reward(&mut self, now: f64);
}

/// 默认守卫：冷却时间 + 可选滑动窗口上限
#[derive(Debug, Clone, Default)]
pub struct CooldownGuard {
    last_reward: Option<f64>,
    /// 窗口内最多放行次数；None 表示不限
    max_per_window: Option<usize>,
    window_s: f64,
    recent: VecDeque<f64>,
}

impl CooldownGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 限制 `window_s` 秒内最多 `max` 次奖励
    pub fn with_window_limit(mut self, max: usize, window_s: f64) -> Self {
        self.max_per_window = Some(max);
        self.window_s = window_s.max(0.0);
        self
    }

    fn rewards_in_window(&self, now: f64) -> usize {
        self.recent
            .iter()
            .filter(|ts| now - **ts < self.window_s)
            .count()
    }
}

impl TrustGuard for CooldownGuard {
    fn can_reward(&self, now: f64, action: &str, score: f64, cooldown_s: f64) -> bool {
        if let Some(last) = self.last_reward {
            if now - last < cooldown_s {
                tracing::debug!(action, score, since = now - last, "reward within cooldown");
                return false;
            }
        }
        if let Some(max) = self.max_per_window {
            if self.rewards_in_window(now) >= max {
                tracing::debug!(action, score, max, "reward window limit reached");
                return false;
            }
        }
        true
    }

    fn note_reward(&mut self, now: f64) {
        self.last_reward = Some(now);
        if self.max_per_window.is_some() {
            let window = self.window_s;
            self.recent.retain(|ts| now - *ts < window);
            self.recent.push_back(now);
        }
    }
}
