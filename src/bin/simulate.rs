//! robodog-sim：闭环仿真 + 在线学习
//!
//! 每个回合结束后用回合结果（成功 1 / 失败 0）训练评分网络，观察成功率变化。

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use robodog::config::resolve_config_path;
use robodog::engines::SilentTts;
use robodog::simulation::{DogEnv, DEFAULT_SEED};
use robodog::{observability, RoboDogBrain, RoboDogSettings};

#[derive(Parser)]
#[command(name = "robodog-sim")]
#[command(about = "Closed-loop RoboDog simulation with online policy training", long_about = None)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, num_args = 1.., default_values_t = ["сидіти", "лежати", "до мене"].map(String::from))]
    commands: Vec<String>,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    #[arg(long, default_value_t = 10)]
    episodes: usize,

    /// Training epochs after each episode (0 disables learning)
    #[arg(long, default_value_t = 20)]
    epochs: usize,

    #[arg(long, default_value_t = 0.85)]
    confidence: f64,

    #[arg(long, default_value_t = 0.5)]
    reward_bias: f64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let path = resolve_config_path(args.config);
    let settings = RoboDogSettings::load(path.as_deref()).context("Failed to load configuration")?;
    let _log_guard = observability::init_with(&settings.logging);

    let mut brain = RoboDogBrain::from_settings(settings, None, true)
        .context("Failed to create behavior engine")?
        .with_synthesizer(Box::new(SilentTts));
    let mut env = DogEnv::new(args.seed);

    let mut summary = Vec::with_capacity(args.episodes);
    for episode in 0..args.episodes {
        env.reset();
        let report = env.run_episode(&mut brain, args.commands.as_slice(), args.confidence, args.reward_bias);
        let mut dataset = report.training_examples();
        let loss = if args.epochs > 0 {
            brain.train(&mut dataset, args.epochs).last().copied()
        } else {
            None
        };
        tracing::info!(episode, success_rate = report.success_rate, ?loss, "episode done");
        summary.push(serde_json::json!({
            "episode": episode,
            "success_rate": report.success_rate,
            "final_state": report.final_state,
            "loss": loss,
        }));
    }

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
