//! 行为策略：把策略配置文档装配成评分网络，并提供训练 / 评分入口
//!
//! 配置文档两种形态：
//! - 扁平数值表（旧版线性权重，如 `{confidence = 0.9, bias = 0.1}`）→ 线性热启动
//! - 结构化超参（weights / learning_rate / hidden_size / seed / training_data / epochs）

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::Value;

use crate::behavior::inputs::{BehaviorInputs, BehaviorVector, TrainingExample, FEATURE_COUNT, FEATURE_NAMES};
use crate::behavior::network::AdaptiveMlp;
use crate::core::clock::clamp01;
use crate::core::BrainError;

/// 旧版线性策略的默认逐特征权重
pub const DEFAULT_WEIGHTS: [(&str, f64); FEATURE_COUNT] = [
    ("stimulus", 0.4),
    ("confidence", 0.3),
    ("reward_bias", 0.2),
    ("mood", 0.1),
    ("stress", -0.1),
    ("fatigue", -0.1),
    ("environmental_complexity", -0.05),
    ("social_engagement", 0.05),
];

fn default_learning_rate() -> f64 {
    0.05
}

fn default_hidden_size() -> usize {
    FEATURE_COUNT
}

fn default_epochs() -> usize {
    150
}

/// 结构化策略配置
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub training_data: Vec<TrainingRecord>,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            weights: HashMap::new(),
            learning_rate: default_learning_rate(),
            hidden_size: default_hidden_size(),
            seed: None,
            training_data: Vec::new(),
            epochs: default_epochs(),
        }
    }
}

/// 配置中的训练样本：`{inputs = {...}, target = 0.9}`，`score` 作为 `target` 的别名
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingRecord {
    pub inputs: BehaviorInputs,
    #[serde(alias = "score")]
    pub target: f64,
}

impl PolicyConfig {
    /// 解析策略文档；全部为数值的对象视为旧版线性权重表
    pub fn from_value(value: &Value) -> Result<Self, BrainError> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(map) if map.is_empty() => Ok(Self::default()),
            Value::Object(map) if map.values().all(Value::is_number) => {
                let weights = map
                    .iter()
                    .map(|(k, v)| {
                        v.as_f64()
                            .map(|w| (k.clone(), w))
                            .ok_or_else(|| BrainError::InvalidWeights(format!("{k} is not a float")))
                    })
                    .collect::<Result<HashMap<_, _>, _>>()?;
                Ok(Self {
                    weights,
                    ..Self::default()
                })
            }
            Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| BrainError::InvalidWeights(e.to_string())),
            other => Err(BrainError::InvalidWeights(format!(
                "policy must be a mapping, got {other}"
            ))),
        }
    }
}

/// 行为策略：持有评分网络与其随机源（初始化 + 每轮洗牌）
#[derive(Debug)]
pub struct BehaviorPolicy {
    model: AdaptiveMlp,
    rng: StdRng,
    trained: bool,
    /// 历次训练的逐轮平均损失，跨多次 train 累积
    pub training_history: Vec<f64>,
}

impl BehaviorPolicy {
    pub fn new(config: PolicyConfig) -> Result<Self, BrainError> {
        if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
            return Err(BrainError::InvalidWeights(format!(
                "learning_rate must be positive, got {}",
                config.learning_rate
            )));
        }
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let hidden_size = config.hidden_size.max(FEATURE_COUNT);
        let model = AdaptiveMlp::new(FEATURE_COUNT, hidden_size, config.learning_rate, &mut rng);
        let mut policy = Self {
            model,
            rng,
            trained: false,
            training_history: Vec::new(),
        };

        if !config.weights.is_empty() {
            policy.warm_start_from_weights(&config.weights)?;
        }

        if !config.training_data.is_empty() {
            let mut dataset: Vec<TrainingExample> = config
                .training_data
                .iter()
                .map(|r| (r.inputs, clamp01(r.target)))
                .collect();
            let history = policy.train(&mut dataset, config.epochs);
            tracing::info!(
                examples = dataset.len(),
                epochs = history.len(),
                final_loss = history.last().copied().unwrap_or_default(),
                "policy trained from configuration"
            );
        }
        Ok(policy)
    }

    /// 从策略配置文档构建（见模块说明的两种形态）
    pub fn from_value(value: &Value) -> Result<Self, BrainError> {
        Self::new(PolicyConfig::from_value(value)?)
    }

    /// 逐特征线性权重热启动；缺失特征取默认权重，`bias` 键为输出偏置
    fn warm_start_from_weights(&mut self, weights: &HashMap<String, f64>) -> Result<(), BrainError> {
        if let Some(bad) = weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(BrainError::InvalidWeights(format!("{} = {}", bad.0, bad.1)));
        }
        let features: Vec<f64> = DEFAULT_WEIGHTS
            .iter()
            .map(|(name, default)| weights.get(*name).copied().unwrap_or(*default))
            .collect();
        let bias = weights.get("bias").copied().unwrap_or(0.0);
        for key in weights.keys() {
            if key != "bias" && !FEATURE_NAMES.contains(&key.as_str()) {
                tracing::warn!(feature = %key, "unknown feature in weight map ignored");
            }
        }
        self.model.set_linear_mapping(&features, bias);
        Ok(())
    }

    /// 在线训练：每轮原地洗牌后逐样本更新，返回本次各轮平均损失；空数据集为 no-op
    pub fn train(&mut self, dataset: &mut [TrainingExample], epochs: usize) -> Vec<f64> {
        if dataset.is_empty() {
            return Vec::new();
        }
        let mut history = Vec::with_capacity(epochs.max(1));
        for _ in 0..epochs.max(1) {
            dataset.shuffle(&mut self.rng);
            let total: f64 = dataset
                .iter()
                .map(|(inputs, target)| self.model.train_step(&inputs.as_vector(), clamp01(*target)))
                .sum();
            history.push(total / dataset.len() as f64);
        }
        self.training_history.extend_from_slice(&history);
        self.trained = true;
        history
    }

    /// 为动作打分（NONE 也照常打分）
    pub fn decide(&self, action: &str, inputs: &BehaviorInputs) -> BehaviorVector {
        let score = clamp01(self.model.predict(&inputs.as_vector()));
        BehaviorVector {
            action: action.to_string(),
            score,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn model(&self) -> &AdaptiveMlp {
        &self.model
    }
}
