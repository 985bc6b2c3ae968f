//! 决策请求上下文与决策结果

use serde::{Deserialize, Serialize};

use crate::behavior::BehaviorInputs;

/// 单次指令的调用方上下文；fatigue 缺省时由奖励时间推导
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandContext {
    pub confidence: f64,
    pub reward_bias: f64,
    /// -1..1
    pub mood: f64,
    pub fatigue: Option<f64>,
}

impl Default for CommandContext {
    fn default() -> Self {
        Self {
            confidence: 0.85,
            reward_bias: 0.5,
            mood: 0.0,
            fatigue: None,
        }
    }
}

impl CommandContext {
    pub fn new(confidence: f64, reward_bias: f64) -> Self {
        Self {
            confidence,
            reward_bias,
            ..Self::default()
        }
    }

    pub fn with_mood(mut self, mood: f64) -> Self {
        self.mood = mood;
        self
    }

    pub fn with_fatigue(mut self, fatigue: f64) -> Self {
        self.fatigue = Some(fatigue);
        self
    }
}

/// 决策结果 {action, score, rewarded}；inputs 为本次送入网络的特征（不序列化）
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Decision {
    pub action: String,
    pub score: f64,
    pub rewarded: bool,
    #[serde(skip)]
    pub inputs: Option<BehaviorInputs>,
}

impl Decision {
    /// 未识别到任何指令时的结果
    pub fn unrecognized() -> Self {
        Self {
            action: crate::command::NONE_ACTION.to_string(),
            score: 0.0,
            rewarded: false,
            inputs: None,
        }
    }
}
