//! RoboDog 命令行
//!
//! 无子命令时等同于 `run`：执行一次指令（文本或音频）并打印决策 JSON。

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use robodog::config::{apply_key_path, parse_typed_value, resolve_config_path, split_key_path, LoggingSection};
use robodog::engines::SilentTts;
use robodog::simulation::{DogEnv, DEFAULT_SEED};
use robodog::{observability, CommandContext, RoboDogBrain, RoboDogSettings};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// RoboDog control CLI
#[derive(Parser)]
#[command(name = "robodog")]
#[command(about = "RoboDog behavior engine - voice command to action and reward", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    /// Emit JSON log lines instead of human readable ones
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone)]
struct RunArgs {
    /// Configuration file (TOML / JSON / YAML); falls back to $ROBODOG_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,

    /// Audio file to transcribe
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Command text (default: "сидіти")
    #[arg(long)]
    cmd: Option<String>,

    /// GPIO pin of the reward dispenser
    #[arg(long)]
    gpio_pin: Option<u32>,

    /// Console speech output and simulated dispenser
    #[arg(long)]
    simulate: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the behavior once
    Run(RunArgs),

    /// Inspect or modify configuration
    Config {
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Run the closed-loop simulation
    Simulate {
        #[arg(long)]
        config: Option<PathBuf>,

        /// Commands fed to the brain, in order
        #[arg(long, num_args = 1.., default_values_t = default_commands())]
        commands: Vec<String>,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        #[arg(long, default_value_t = 1)]
        episodes: usize,

        #[arg(long, default_value_t = 0.85)]
        confidence: f64,

        #[arg(long, default_value_t = 0.5)]
        reward_bias: f64,

        /// Include per-step history in the output
        #[arg(long)]
        verbose: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Display the current configuration
    Show {
        #[arg(long)]
        as_json: bool,
    },

    /// Update a configuration value (dot separated key path, e.g. commands_map.сидіти)
    Set {
        key: String,
        value: String,
        #[arg(long = "type", default_value = "str", value_parser = ["str", "int", "float", "bool", "json"])]
        value_type: String,
    },
}

fn default_commands() -> Vec<String> {
    ["сидіти", "лежати", "до мене", "голос", "сидіти"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = observability::init_with(&logging_settings(&cli));

    match cli.command {
        None => run(cli.run),
        Some(Commands::Run(args)) => run(args),
        Some(Commands::Config { config, action }) => match action {
            ConfigCommands::Show { as_json } => config_show(config, as_json),
            ConfigCommands::Set {
                key,
                value,
                value_type,
            } => config_set(config, &key, &value, &value_type),
        },
        Some(Commands::Simulate {
            config,
            commands,
            seed,
            episodes,
            confidence,
            reward_bias,
            verbose,
        }) => simulate(config, &commands, seed, episodes, confidence, reward_bias, verbose),
    }
}

/// 日志配置先于其余配置读取；读取失败时退回默认（仅标准输出），错误留给后续加载报告
fn logging_settings(cli: &Cli) -> LoggingSection {
    let explicit = match &cli.command {
        None => cli.run.config.clone(),
        Some(Commands::Run(args)) => args.config.clone(),
        Some(Commands::Config { config, .. }) | Some(Commands::Simulate { config, .. }) => config.clone(),
    };
    let path = resolve_config_path(explicit);
    let mut logging = RoboDogSettings::load(path.as_deref())
        .map(|settings| settings.logging)
        .unwrap_or_default();
    if cli.json_logs {
        logging.json = true;
    }
    logging
}

fn load_brain(config: Option<PathBuf>, gpio_pin: Option<u32>, simulate: bool) -> anyhow::Result<RoboDogBrain> {
    let path = resolve_config_path(config);
    RoboDogBrain::load(path.as_deref(), gpio_pin, simulate).context("Failed to create behavior engine")
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut brain = load_brain(args.config, args.gpio_pin, args.simulate)?;
    let decision = match &args.wav {
        Some(wav) => brain.run_once_from_wav(wav),
        None => brain.decide_as(
            "cli",
            args.cmd.as_deref().unwrap_or("сидіти"),
            &CommandContext::default(),
        ),
    };
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn config_show(config: Option<PathBuf>, as_json: bool) -> anyhow::Result<()> {
    let path = resolve_config_path(config);
    let settings = RoboDogSettings::load(path.as_deref()).context("Failed to load configuration")?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        print!("{}", toml::to_string_pretty(&settings).context("Failed to render configuration")?);
    }
    Ok(())
}

fn config_set(config: Option<PathBuf>, key: &str, raw: &str, value_type: &str) -> anyhow::Result<()> {
    let path = resolve_config_path(config).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let settings = if path.exists() {
        RoboDogSettings::load(Some(&path))
            .with_context(|| format!("Failed to load {}", path.display()))?
    } else {
        RoboDogSettings::default()
    };
    let value = parse_typed_value(raw, value_type)?;
    let updated = apply_key_path(&settings, &split_key_path(key), value)
        .with_context(|| format!("Failed to set {key}"))?;
    updated
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✅ Updated {} in {}", key, path.display());
    Ok(())
}

fn simulate(
    config: Option<PathBuf>,
    commands: &[String],
    seed: u64,
    episodes: usize,
    confidence: f64,
    reward_bias: f64,
    verbose: bool,
) -> anyhow::Result<()> {
    let mut brain = load_brain(config, None, true)?.with_synthesizer(Box::new(SilentTts));
    let mut env = DogEnv::new(seed);
    let mut reports = Vec::with_capacity(episodes);
    for episode in 0..episodes.max(1) {
        env.reset();
        let report = env.run_episode(&mut brain, commands, confidence, reward_bias);
        let mut entry = serde_json::json!({
            "episode": episode,
            "success_rate": report.success_rate,
            "final_state": report.final_state,
        });
        if verbose {
            entry["history"] = serde_json::to_value(&report.history)?;
        }
        reports.push(entry);
    }
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
