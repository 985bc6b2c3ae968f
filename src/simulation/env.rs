//! 行为仿真环境：疲劳 / 情绪 / 奖励历史的随机状态转移
//!
//! 每一步先用步前状态调用决策者，再把 (action, score) 反馈给环境动力学。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::behavior::TrainingExample;
use crate::core::clock::{clamp01, clamp_range};
use crate::core::{CommandContext, Decision, RoboDogBrain};

pub const DEFAULT_SEED: u64 = 42;

/// 环境驱动的决策者；RoboDogBrain 是唯一的生产实现
pub trait Decider {
    fn decide(&mut self, text: &str, ctx: &CommandContext) -> Decision;
}

impl Decider for RoboDogBrain {
    fn decide(&mut self, text: &str, ctx: &CommandContext) -> Decision {
        self.decide_as("simulation", text, ctx)
    }
}

/// 狗的内部状态
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EnvState {
    pub fatigue: f64,
    /// -1..1
    pub mood: f64,
    /// 近期成功率的 EMA
    #[serde(rename = "reward_hist")]
    pub reward_history: f64,
}

impl Default for EnvState {
    fn default() -> Self {
        Self {
            fatigue: 0.0,
            mood: 0.0,
            reward_history: 0.5,
        }
    }
}

/// step 之后的观测：新状态 + 本步结果
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Observation {
    #[serde(flatten)]
    pub state: EnvState,
    pub success: bool,
    pub reward: f64,
    pub success_probability: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct StepOutcome {
    pub brain: Decision,
    pub state: Observation,
}

#[derive(Clone, Debug, Serialize)]
pub struct EpisodeReport {
    pub history: Vec<StepOutcome>,
    pub success_rate: f64,
    pub final_state: EnvState,
}

impl EpisodeReport {
    /// 以本回合结果（1 / 0）为目标的训练样本；无特征记录的步骤跳过
    pub fn training_examples(&self) -> Vec<TrainingExample> {
        self.history
            .iter()
            .filter_map(|o| o.brain.inputs.map(|inputs| (inputs, o.state.reward)))
            .collect()
    }
}

/// 闭环仿真环境
#[derive(Debug)]
pub struct DogEnv {
    rng: StdRng,
    state: EnvState,
}

impl Default for DogEnv {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl DogEnv {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            state: EnvState::default(),
        }
    }

    /// 回到中性状态（RNG 不重置）
    pub fn reset(&mut self) -> EnvState {
        self.state = EnvState::default();
        self.observe()
    }

    pub fn observe(&self) -> EnvState {
        self.state
    }

    /// 推进一步：一次均匀抽样决定成败，再更新疲劳 / 情绪 / 奖励历史
    pub fn step(&mut self, action: &str, score: f64) -> Observation {
        let success_p = 0.5 + 0.4 * score - 0.25 * self.state.fatigue + 0.1 * self.state.mood;
        let success = self.rng.gen::<f64>() < clamp_range(success_p, 0.05, 0.95);

        let fatigue_gain = if success { 0.10 } else { 0.05 };
        self.state.fatigue = clamp01(self.state.fatigue + fatigue_gain);

        let mood_change = if success {
            0.15
        } else {
            -0.10 - 0.05 * self.state.fatigue
        };
        self.state.mood = clamp_range(self.state.mood + mood_change, -1.0, 1.0);

        let reward = if success { 1.0 } else { 0.0 };
        self.state.reward_history = 0.8 * self.state.reward_history + 0.2 * reward;

        tracing::debug!(action, score, success, success_p, "simulation step");
        Observation {
            state: self.state,
            success,
            reward,
            success_probability: clamp01(success_p),
        }
    }

    /// 闭环一步：以步前 mood / fatigue 调用决策者，再推进环境
    pub fn run_brain_step<D: Decider + ?Sized>(
        &mut self,
        brain: &mut D,
        command: &str,
        confidence: f64,
        reward_bias: f64,
    ) -> StepOutcome {
        let current = self.observe();
        let ctx = CommandContext::new(confidence, reward_bias)
            .with_mood(current.mood)
            .with_fatigue(current.fatigue);
        let decision = brain.decide(command, &ctx);
        let observation = self.step(&decision.action, decision.score);
        StepOutcome {
            brain: decision,
            state: observation,
        }
    }

    /// 批量执行指令，统计成功率；空列表成功率为 0
    pub fn run_episode<D, S>(
        &mut self,
        brain: &mut D,
        commands: &[S],
        confidence: f64,
        reward_bias: f64,
    ) -> EpisodeReport
    where
        D: Decider + ?Sized,
        S: AsRef<str>,
    {
        let history: Vec<StepOutcome> = commands
            .iter()
            .map(|text| self.run_brain_step(brain, text.as_ref(), confidence, reward_bias))
            .collect();
        let successes = history.iter().filter(|o| o.state.success).count();
        let success_rate = if history.is_empty() {
            0.0
        } else {
            successes as f64 / history.len() as f64
        };
        tracing::info!(steps = history.len(), success_rate, "simulation episode finished");
        EpisodeReport {
            history,
            success_rate,
            final_state: self.observe(),
        }
    }
}
