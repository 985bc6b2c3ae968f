//! 墙钟时间（秒，浮点），奖励冷却与疲劳推导共用

/// 当前 Unix 时间（秒，毫秒精度）
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// 钳制到 [low, high]；NaN 视为 low
pub fn clamp_range(value: f64, low: f64, high: f64) -> f64 {
    if value.is_nan() {
        return low;
    }
    value.max(low).min(high)
}

/// 钳制到 [0, 1]
pub fn clamp01(value: f64) -> f64 {
    clamp_range(value, 0.0, 1.0)
}
