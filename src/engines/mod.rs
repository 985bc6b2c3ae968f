//! 外部协作者：语音识别、语音合成、奖励执行器
//!
//! 后端在构造期按配置选择（[engines] 段），运行期只通过 trait 调用。

pub mod actuator;
pub mod stt;
pub mod tts;

pub use actuator::{RewardActuator, SimulatedActuator, SysfsGpioActuator};
pub use stt::{CommandStt, RuleBasedStt, SpeechRecognizer};
pub use tts::{CommandTts, ConsoleTts, SilentTts, SpeechSynthesizer};

use crate::config::EnginesSection;

/// 按配置创建语音识别器；未知或缺参数时回落到规则识别
pub fn create_recognizer(cfg: &EnginesSection) -> Box<dyn SpeechRecognizer> {
    match cfg.stt.to_lowercase().as_str() {
        "command" => match cfg.stt_command.as_deref().and_then(CommandStt::from_command_line) {
            Some(stt) => Box::new(stt),
            None => {
                tracing::warn!("stt = command but stt_command not set, using rule-based engine");
                Box::new(RuleBasedStt)
            }
        },
        "rule_based" => Box::new(RuleBasedStt),
        other => {
            tracing::warn!(engine = %other, "unknown STT engine, using rule-based engine");
            Box::new(RuleBasedStt)
        }
    }
}

/// 按配置创建语音合成器；simulate 模式强制控制台输出
pub fn create_synthesizer(cfg: &EnginesSection, simulate: bool) -> Box<dyn SpeechSynthesizer> {
    if simulate {
        return Box::new(ConsoleTts::default());
    }
    match cfg.tts.to_lowercase().as_str() {
        "silent" => Box::new(SilentTts),
        "command" => match cfg.tts_command.as_deref().and_then(CommandTts::from_command_line) {
            Some(tts) => Box::new(tts),
            None => {
                tracing::warn!("tts = command but tts_command not set, using console output");
                Box::new(ConsoleTts::default())
            }
        },
        _ => Box::new(ConsoleTts::default()),
    }
}

/// 按配置创建执行器；simulate 或未指定引脚时使用模拟执行器
pub fn create_actuator(
    cfg: &EnginesSection,
    gpio_pin: Option<u32>,
    simulate: bool,
) -> Box<dyn RewardActuator> {
    let pin = gpio_pin.or(cfg.gpio_pin);
    match (simulate, pin) {
        (false, Some(pin)) if gpio_pin.is_some() || cfg.actuator.eq_ignore_ascii_case("gpio") => {
            Box::new(SysfsGpioActuator::new(pin))
        }
        _ => Box::new(SimulatedActuator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = EnginesSection::default();
        assert_eq!(create_recognizer(&cfg).name(), "rule_based");
        assert_eq!(create_actuator(&cfg, None, false).name(), "simulated");
    }

    #[test]
    fn test_command_stt_selected() {
        let cfg = EnginesSection {
            stt: "command".to_string(),
            stt_command: Some("whisper-cli --model base".to_string()),
            ..EnginesSection::default()
        };
        assert_eq!(create_recognizer(&cfg).name(), "command");
        let cfg = EnginesSection {
            stt: "command".to_string(),
            ..EnginesSection::default()
        };
        assert_eq!(create_recognizer(&cfg).name(), "rule_based");
    }

    #[test]
    fn test_gpio_selection() {
        let cfg = EnginesSection::default();
        assert_eq!(create_actuator(&cfg, Some(17), false).name(), "gpio");
        assert_eq!(create_actuator(&cfg, Some(17), true).name(), "simulated");
        let cfg = EnginesSection {
            actuator: "gpio".to_string(),
            gpio_pin: Some(4),
            ..EnginesSection::default()
        };
        assert_eq!(create_actuator(&cfg, None, false).name(), "gpio");
    }
}
