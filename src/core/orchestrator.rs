//! 行为编排器：文本 → 动作 → 特征 → 评分 → 奖励裁决
//!
//! RoboDogBrain 独占评分网络参数与奖励时间戳，本身不加锁；
//! 并发宿主需串行化访问（见 `crate::host::SharedBrain`）。

use std::path::Path;
use std::time::Instant;

use uuid::Uuid;

use crate::behavior::{BehaviorInputs, BehaviorPolicy, TrainingExample};
use crate::command::{CommandInterpreter, NONE_ACTION};
use crate::config::RoboDogSettings;
use crate::core::clock::{clamp01, now_secs};
use crate::core::state::{CommandContext, Decision};
use crate::core::BrainError;
use crate::engines::{
    create_actuator, create_recognizer, create_synthesizer, RewardActuator, RuleBasedStt,
    SpeechRecognizer, SpeechSynthesizer,
};
use crate::observability::BrainMetrics;
use crate::reward::{CooldownGuard, RewardGovernor, TrustGuard, REWARD_DURATION_S};

/// 直接调用 decide / decide_at 时的指令来源
pub const DEFAULT_SOURCE: &str = "api";

/// 行为决策引擎
pub struct RoboDogBrain {
    settings: RoboDogSettings,
    interpreter: CommandInterpreter,
    policy: BehaviorPolicy,
    governor: RewardGovernor,
    stt: Box<dyn SpeechRecognizer>,
    tts: Box<dyn SpeechSynthesizer>,
    actuator: Box<dyn RewardActuator>,
    metrics: BrainMetrics,
    simulate: bool,
}

impl RoboDogBrain {
    /// 从配置文件构建；path 为 None 时读取默认配置
    pub fn load(cfg_path: Option<&Path>, gpio_pin: Option<u32>, simulate: bool) -> Result<Self, BrainError> {
        let settings = RoboDogSettings::load(cfg_path)?;
        Self::from_settings(settings, gpio_pin, simulate)
    }

    /// 从已校验的配置构建：词表 / 策略网络 / 奖励治理 / 协作者后端
    pub fn from_settings(
        settings: RoboDogSettings,
        gpio_pin: Option<u32>,
        simulate: bool,
    ) -> Result<Self, BrainError> {
        let interpreter = CommandInterpreter::new(settings.commands_map.iter().cloned())?;
        let policy = BehaviorPolicy::from_value(&settings.policy_config())?;

        let mut guard = CooldownGuard::new();
        if let Some(max) = settings.guard.max_rewards_per_window {
            guard = guard.with_window_limit(max, settings.guard.window_s);
        }
        let triggers = settings
            .reward_triggers
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        let governor =
            RewardGovernor::with_guard(triggers, settings.reward_cooldown_s, Box::new(guard));

        let stt = create_recognizer(&settings.engines);
        let tts = create_synthesizer(&settings.engines, simulate);
        let actuator = create_actuator(&settings.engines, gpio_pin, simulate);
        tracing::info!(
            phrases = interpreter.len(),
            cooldown_s = settings.reward_cooldown_s,
            stt = stt.name(),
            actuator = actuator.name(),
            simulate,
            "behavior engine ready"
        );

        Ok(Self {
            settings,
            interpreter,
            policy,
            governor,
            stt,
            tts,
            actuator,
            metrics: BrainMetrics::new(),
            simulate,
        })
    }

    pub fn with_recognizer(mut self, stt: Box<dyn SpeechRecognizer>) -> Self {
        self.stt = stt;
        self
    }

    pub fn with_synthesizer(mut self, tts: Box<dyn SpeechSynthesizer>) -> Self {
        self.tts = tts;
        self
    }

    pub fn with_actuator(mut self, actuator: Box<dyn RewardActuator>) -> Self {
        self.actuator = actuator;
        self
    }

    /// 替换信任守卫（奖励时间戳随之清零）
    pub fn with_guard(mut self, guard: Box<dyn TrustGuard>) -> Self {
        let triggers = self
            .settings
            .reward_triggers
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        self.governor = RewardGovernor::with_guard(triggers, self.settings.reward_cooldown_s, guard);
        self
    }

    /// 文本 → 动作标签
    pub fn resolve(&self, text: &str) -> String {
        self.interpreter.resolve(text)
    }

    /// 按当前墙钟时间决策（指令来源记为 api）
    pub fn decide(&mut self, text: &str, ctx: &CommandContext) -> Decision {
        self.decide_at(text, ctx, now_secs())
    }

    /// 默认上下文（confidence 0.85 / reward_bias 0.5 / mood 0）下的决策
    pub fn handle_command(&mut self, text: &str) -> Decision {
        self.decide(text, &CommandContext::default())
    }

    /// 按当前时间决策，并以 `source` 计入指令计数（host / cli / simulation ...）
    pub fn decide_as(&mut self, source: &str, text: &str, ctx: &CommandContext) -> Decision {
        self.decide_from(source, text, ctx, now_secs())
    }

    /// 在给定时刻决策
    pub fn decide_at(&mut self, text: &str, ctx: &CommandContext, now: f64) -> Decision {
        self.decide_from(DEFAULT_SOURCE, text, ctx, now)
    }

    /// 组装特征 → 网络评分 → 奖励裁决 → 反馈播报；每次调用计一条指令
    pub fn decide_from(&mut self, source: &str, text: &str, ctx: &CommandContext, now: f64) -> Decision {
        let span = tracing::info_span!("decision", decision_id = %Uuid::new_v4(), source);
        let _enter = span.enter();
        let started = Instant::now();
        self.metrics.record_command(source);

        let action = self.interpreter.resolve(text);
        let inputs = self.build_inputs(&action, ctx, now);
        let vector = self.policy.decide(&action, &inputs);
        let rewarded = self.maybe_reward(&vector.action, vector.score, now);

        let feedback = format!(
            "Дія: {} score={:.2}{}",
            vector.action,
            vector.score,
            if rewarded { " — ✅ винагорода" } else { "" }
        );
        if let Err(e) = self.tts.speak(&feedback) {
            tracing::warn!(error = %e, "feedback speech failed");
        }
        tracing::info!(
            action = %vector.action,
            score = vector.score,
            rewarded,
            fatigue = inputs.fatigue,
            "{}",
            feedback
        );
        self.metrics.record_reward(&vector.action, rewarded);
        self.metrics
            .observe_latency("decide", started.elapsed().as_secs_f64());

        Decision {
            action: vector.action,
            score: vector.score,
            rewarded,
            inputs: Some(inputs),
        }
    }

    /// 特征推导：stimulus / stress / fatigue（缺省时按奖励间隔）/ 环境上下文
    fn build_inputs(&self, action: &str, ctx: &CommandContext, now: f64) -> BehaviorInputs {
        let fatigue = match ctx.fatigue {
            Some(f) => clamp01(f),
            None => {
                let cooldown = self.governor.cooldown_s();
                clamp01(self.governor.time_since_reward(now) / (cooldown * 2.0).max(1.0))
            }
        };
        BehaviorInputs {
            stimulus: if action != NONE_ACTION { 1.0 } else { 0.0 },
            confidence: ctx.confidence,
            reward_bias: ctx.reward_bias,
            mood: ctx.mood,
            stress: clamp01(1.0 - ctx.confidence),
            fatigue,
            environmental_complexity: clamp01(self.settings.context_value("complexity")),
            social_engagement: clamp01(self.settings.context_value("social_engagement")),
        }
    }

    /// 资格 + 守卫放行后触发执行器并记录奖励时间
    fn maybe_reward(&mut self, action: &str, score: f64, now: f64) -> bool {
        if !self.governor.should_reward(action, score, now) {
            return false;
        }
        // 执行器失败不改变裁决：冷却照常生效，避免对故障硬件反复触发
        if let Err(e) = self.actuator.trigger(REWARD_DURATION_S) {
            tracing::warn!(actuator = self.actuator.name(), error = %e, "reward actuator failed");
        }
        self.governor.record_reward(now);
        true
    }

    /// 音频 → 文本 → 决策；识别引擎失败时切换到规则识别并重试
    pub fn run_once_from_wav(&mut self, wav_path: &Path) -> Decision {
        let text = match self.stt.transcribe(Some(wav_path), false) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(engine = self.stt.name(), error = %e, "STT engine failed; switching to rule-based fallback");
                self.stt = Box::new(RuleBasedStt);
                self.stt.transcribe(Some(wav_path), false).unwrap_or_default()
            }
        };
        if text.trim().is_empty() {
            self.metrics.record_command("wav");
            if let Err(e) = self.tts.speak("Команду не розпізнано") {
                tracing::warn!(error = %e, "feedback speech failed");
            }
            return Decision::unrecognized();
        }
        self.decide_as("wav", &text, &CommandContext::default())
    }

    /// 在线 / 离线训练评分网络（阻塞、CPU 密集）
    pub fn train(&mut self, dataset: &mut [TrainingExample], epochs: usize) -> Vec<f64> {
        self.policy.train(dataset, epochs)
    }

    pub fn settings(&self) -> &RoboDogSettings {
        &self.settings
    }

    pub fn policy(&self) -> &BehaviorPolicy {
        &self.policy
    }

    pub fn governor(&self) -> &RewardGovernor {
        &self.governor
    }

    pub fn metrics(&self) -> &BrainMetrics {
        &self.metrics
    }

    pub fn recognizer_name(&self) -> &str {
        self.stt.name()
    }

    pub fn is_simulated(&self) -> bool {
        self.simulate
    }
}
