//! 行为特征：8 个有界标量，送入评分网络前统一归一化到 [0, 1]

use serde::{Deserialize, Serialize};

use crate::core::clock::clamp01;

/// 特征名（顺序即网络输入顺序）
pub const FEATURE_NAMES: [&str; 8] = [
    "stimulus",
    "confidence",
    "reward_bias",
    "mood",
    "stress",
    "fatigue",
    "environmental_complexity",
    "social_engagement",
];

/// 网络输入维度
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// 一次决策的上下文特征；mood 原生区间为 -1..1，其余为 0..1（越界值在归一化时钳制）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviorInputs {
    pub stimulus: f64,
    pub confidence: f64,
    pub reward_bias: f64,
    pub mood: f64,
    #[serde(default)]
    pub stress: f64,
    #[serde(default)]
    pub fatigue: f64,
    #[serde(default)]
    pub environmental_complexity: f64,
    #[serde(default)]
    pub social_engagement: f64,
}

impl BehaviorInputs {
    /// 归一化后的特征向量，每一维都在 [0, 1]
    pub fn as_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            clamp01(self.stimulus),
            clamp01(self.confidence),
            clamp01(self.reward_bias),
            clamp01((self.mood + 1.0) / 2.0),
            clamp01(self.stress),
            clamp01(self.fatigue),
            clamp01(self.environmental_complexity),
            clamp01(self.social_engagement),
        ]
    }
}

/// 评分结果：动作标签 + [0, 1] 内的分数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehaviorVector {
    pub action: String,
    pub score: f64,
}

/// 训练样本：(特征, 目标分数)
pub type TrainingExample = (BehaviorInputs, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_vector_clamps_and_normalizes_mood() {
        let inputs = BehaviorInputs {
            stimulus: 2.0,
            confidence: -1.0,
            reward_bias: 0.5,
            mood: 0.0,
            stress: 0.25,
            fatigue: 1.5,
            environmental_complexity: f64::NAN,
            social_engagement: 0.7,
        };
        let v = inputs.as_vector();
        assert_eq!(v, [1.0, 0.0, 0.5, 0.5, 0.25, 1.0, 0.0, 0.7]);
        assert!(v.iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn test_mood_extremes() {
        let mut inputs = BehaviorInputs {
            stimulus: 1.0,
            confidence: 1.0,
            reward_bias: 1.0,
            mood: -1.0,
            stress: 0.0,
            fatigue: 0.0,
            environmental_complexity: 0.0,
            social_engagement: 0.0,
        };
        assert_eq!(inputs.as_vector()[3], 0.0);
        inputs.mood = 5.0;
        assert_eq!(inputs.as_vector()[3], 1.0);
    }
}
