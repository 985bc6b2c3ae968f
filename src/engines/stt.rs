//! 语音识别后端
//!
//! - RuleBasedStt：按音频文件名关键词映射为指令（轻量兜底）
//! - CommandStt：调用外部识别程序（如 whisper CLI），从 stdout 读取转写文本

use std::path::Path;
use std::process::Command;

use crate::core::EngineError;

/// 语音识别 trait
pub trait SpeechRecognizer: Send {
    fn name(&self) -> &str;

    /// 转写音频；不支持的输入返回可恢复错误，由调用方切换兜底引擎
    fn transcribe(&self, wav_path: Option<&Path>, use_mic: bool) -> Result<String, EngineError>;
}

/// 文件名关键词 → 指令文本
const KEYWORDS: &[(&str, &str)] = &[
    ("sydity", "сидіти"),
    ("lezhaty", "лежати"),
    ("do_mene", "до мене"),
    ("bark", "голос"),
];

/// 基于文件名关键词的识别器；麦克风或空路径返回空串
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedStt;

impl SpeechRecognizer for RuleBasedStt {
    fn name(&self) -> &str {
        "rule_based"
    }

    fn transcribe(&self, wav_path: Option<&Path>, use_mic: bool) -> Result<String, EngineError> {
        let Some(path) = wav_path.filter(|_| !use_mic) else {
            return Ok(String::new());
        };
        let name = path.to_string_lossy().to_lowercase();
        Ok(KEYWORDS
            .iter()
            .find(|(k, _)| name.contains(k))
            .map(|(_, v)| v.to_string())
            .unwrap_or_default())
    }
}

/// 外部程序识别器：`program args... <wav>`，stdout 去首尾空白即转写结果
#[derive(Debug, Clone)]
pub struct CommandStt {
    program: String,
    args: Vec<String>,
}

impl CommandStt {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// 从一行命令构建（首词为程序，其余为参数）
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl SpeechRecognizer for CommandStt {
    fn name(&self) -> &str {
        "command"
    }

    fn transcribe(&self, wav_path: Option<&Path>, use_mic: bool) -> Result<String, EngineError> {
        if use_mic {
            return Err(EngineError::Unavailable(
                "microphone capture is not supported by command STT".to_string(),
            ));
        }
        let Some(path) = wav_path else {
            return Ok(String::new());
        };
        tracing::info!(program = %self.program, wav = %path.display(), "command stt transcribe");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|e| EngineError::Unavailable(format!("{}: {}", self.program, e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Failed(format!(
                "Exit {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_based_keywords() {
        let stt = RuleBasedStt;
        let text = stt
            .transcribe(Some(Path::new("data/synthetic/SYDITY.wav")), false)
            .unwrap();
        assert_eq!(text, "сидіти");
        let text = stt.transcribe(Some(Path::new("do_mene.wav")), false).unwrap();
        assert_eq!(text, "до мене");
        assert_eq!(stt.transcribe(Some(Path::new("noise.wav")), false).unwrap(), "");
    }

    #[test]
    fn test_rule_based_mic_and_empty() {
        let stt = RuleBasedStt;
        assert_eq!(stt.transcribe(None, false).unwrap(), "");
        assert_eq!(stt.transcribe(Some(Path::new("bark.wav")), true).unwrap(), "");
    }

    #[test]
    fn test_command_stt_missing_program() {
        let stt = CommandStt::new("robodog-definitely-missing-stt", vec![]);
        let err = stt.transcribe(Some(Path::new("a.wav")), false).unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(_)));
        assert!(matches!(
            stt.transcribe(Some(Path::new("a.wav")), true),
            Err(EngineError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_stt_reads_stdout() {
        let stt = CommandStt::from_command_line("echo  лежати").unwrap();
        let text = stt.transcribe(Some(Path::new("x.wav")), false).unwrap();
        assert_eq!(text, "лежати x.wav");
    }
}
