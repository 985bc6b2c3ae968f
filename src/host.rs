//! 异步宿主包装：多请求共享一个决策引擎
//!
//! 引擎本身同步且不加锁，这里用一把 tokio Mutex 串行化访问；
//! 决策与训练都在 spawn_blocking 中执行，截止时间包住整个调用（含排队）。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::behavior::TrainingExample;
use crate::core::{CommandContext, Decision, HostError, RoboDogBrain};

/// 可克隆的共享引擎句柄
#[derive(Clone)]
pub struct SharedBrain {
    inner: Arc<Mutex<RoboDogBrain>>,
    deadline: Option<Duration>,
}

impl SharedBrain {
    /// 截止时间取自配置 latency_budget_ms；0 表示不限
    pub fn new(brain: RoboDogBrain) -> Self {
        let budget_ms = brain.settings().latency_budget_ms;
        Self {
            inner: Arc::new(Mutex::new(brain)),
            deadline: (budget_ms > 0).then(|| Duration::from_millis(budget_ms)),
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// 串行化的决策调用
    pub async fn decide(&self, text: impl Into<String>, ctx: CommandContext) -> Result<Decision, HostError> {
        let text = text.into();
        let inner = self.inner.clone();
        self.with_deadline_of(async move {
            let mut brain = inner.lock_owned().await;
            tokio::task::spawn_blocking(move || brain.decide_as("host", &text, &ctx)).await
        })
        .await
    }

    /// 音频文件 → 决策
    pub async fn handle_wav(&self, wav_path: PathBuf) -> Result<Decision, HostError> {
        let inner = self.inner.clone();
        self.with_deadline_of(async move {
            let mut brain = inner.lock_owned().await;
            tokio::task::spawn_blocking(move || brain.run_once_from_wav(&wav_path)).await
        })
        .await
    }

    /// 后台训练；不受决策截止时间约束，训练期间决策请求排队等待
    pub async fn train(&self, mut dataset: Vec<TrainingExample>, epochs: usize) -> Result<Vec<f64>, HostError> {
        let mut brain = self.inner.clone().lock_owned().await;
        let history = tokio::task::spawn_blocking(move || brain.train(&mut dataset, epochs)).await?;
        tracing::info!(epochs = history.len(), final_loss = history.last().copied(), "background training finished");
        Ok(history)
    }

    /// Prometheus 文本格式的指标快照
    pub async fn metrics_text(&self) -> String {
        self.inner.lock().await.metrics().gather_text()
    }

    async fn with_deadline_of<F>(&self, fut: F) -> Result<Decision, HostError>
    where
        F: std::future::Future<Output = Result<Decision, tokio::task::JoinError>>,
    {
        match self.deadline {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(res) => Ok(res?),
                Err(_) => {
                    let ms = limit.as_millis() as u64;
                    tracing::warn!(budget_ms = ms, "decision exceeded latency budget");
                    Err(HostError::DeadlineExceeded(ms))
                }
            },
            None => Ok(fut.await?),
        }
    }
}
