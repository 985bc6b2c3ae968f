//! Prometheus 指标：指令计数、奖励结果、指令处理延迟
//!
//! 每个引擎实例持有自己的 Registry，由宿主决定如何暴露（见 `gather_text`）。

use std::sync::Arc;

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, Encoder,
    HistogramVec, IntCounterVec, Registry, TextEncoder,
};

/// 引擎指标
#[derive(Clone)]
pub struct BrainMetrics {
    /// 按来源（api / host / cli / simulation / wav）统计的指令数
    pub commands_total: IntCounterVec,
    /// 按动作与结果（rewarded / skipped）统计的奖励
    pub rewards_total: IntCounterVec,
    pub command_latency_seconds: HistogramVec,
    registry: Arc<Registry>,
}

impl BrainMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let commands_total = register_int_counter_vec_with_registry!(
            "robodog_commands_total",
            "Commands processed by the behavior engine",
            &["source"],
            registry
        )
        .unwrap();

        let rewards_total = register_int_counter_vec_with_registry!(
            "robodog_rewards_total",
            "Reward actuator outcomes",
            &["action", "outcome"],
            registry
        )
        .unwrap();

        let command_latency_seconds = register_histogram_vec_with_registry!(
            "robodog_command_latency_seconds",
            "Time spent handling commands",
            &["endpoint"],
            vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            registry
        )
        .unwrap();

        Self {
            commands_total,
            rewards_total,
            command_latency_seconds,
            registry: Arc::new(registry),
        }
    }

    pub fn record_command(&self, source: &str) {
        self.commands_total.with_label_values(&[source]).inc();
    }

    pub fn record_reward(&self, action: &str, rewarded: bool) {
        let action = if action.is_empty() { "UNKNOWN" } else { action };
        let outcome = if rewarded { "rewarded" } else { "skipped" };
        self.rewards_total.with_label_values(&[action, outcome]).inc();
    }

    pub fn observe_latency(&self, endpoint: &str, seconds: f64) {
        self.command_latency_seconds
            .with_label_values(&[endpoint])
            .observe(seconds);
    }

    pub fn command_count(&self, source: &str) -> u64 {
        self.commands_total.with_label_values(&[source]).get()
    }

    pub fn reward_count(&self, action: &str, rewarded: bool) -> u64 {
        let outcome = if rewarded { "rewarded" } else { "skipped" };
        self.rewards_total.with_label_values(&[action, outcome]).get()
    }

    /// Prometheus 文本格式导出
    pub fn gather_text(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "metrics encode failed");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for BrainMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BrainMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrainMetrics").finish_non_exhaustive()
    }
}
