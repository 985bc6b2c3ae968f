//! 语音合成后端（尽力而为，失败不向上传播）

use std::process::Command;

use crate::core::EngineError;

/// 语音合成 trait
pub trait SpeechSynthesizer: Send {
    fn speak(&self, text: &str) -> Result<(), EngineError>;
}

/// 打印到 stdout：`[TTS] text`
#[derive(Debug, Clone)]
pub struct ConsoleTts {
    label: String,
}

impl Default for ConsoleTts {
    fn default() -> Self {
        Self {
            label: "TTS".to_string(),
        }
    }
}

impl ConsoleTts {
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl SpeechSynthesizer for ConsoleTts {
    fn speak(&self, text: &str) -> Result<(), EngineError> {
        println!("[{}] {}", self.label, text);
        Ok(())
    }
}

/// 静默输出（批量仿真）
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentTts;

impl SpeechSynthesizer for SilentTts {
    fn speak(&self, _text: &str) -> Result<(), EngineError> {
        Ok(())
    }
}

/// 外部合成程序（如 `espeak-ng -v uk`），文本作为最后一个参数；失败时回落到控制台
#[derive(Debug, Clone)]
pub struct CommandTts {
    program: String,
    args: Vec<String>,
    fallback: ConsoleTts,
}

impl CommandTts {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            fallback: ConsoleTts::default(),
        }
    }

    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    fn run(&self, text: &str) -> Result<(), EngineError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .status()
            .map_err(|e| EngineError::Unavailable(format!("{}: {}", self.program, e)))?;
        if !status.success() {
            return Err(EngineError::Failed(format!("Exit {:?}", status.code())));
        }
        Ok(())
    }
}

impl SpeechSynthesizer for CommandTts {
    fn speak(&self, text: &str) -> Result<(), EngineError> {
        if text.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.run(text) {
            tracing::warn!(program = %self.program, error = %e, "tts unavailable, falling back to console output");
            return self.fallback.speak(text);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_and_silent() {
        assert!(ConsoleTts::with_label("DOG").speak("привіт").is_ok());
        assert!(SilentTts.speak("привіт").is_ok());
    }

    #[test]
    fn test_command_tts_falls_back() {
        let tts = CommandTts::new("robodog-definitely-missing-tts", vec![]);
        assert!(tts.speak("Дія: SIT").is_ok());
        assert!(CommandTts::from_command_line("   ").is_none());
    }
}
