//! 应用配置：指令词表、奖励触发表、冷却、环境上下文、策略文档与引擎选择
//!
//! 加载顺序：显式传入的配置文件（TOML / JSON / YAML，按扩展名）或默认的 config/default.toml，
//! 再用环境变量 `ROBODOG__*` 覆盖（双下划线表示嵌套，如 `ROBODOG__REWARD_COOLDOWN_S=1.5`）。
//! 词表按声明顺序保存，匹配优先级与文件中的顺序一致。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::FileFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::{clean_action, clean_phrase_key};
use crate::core::BrainError;

/// 配置根
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoboDogSettings {
    /// 单次决策的延迟预算（毫秒），由宿主层强制
    pub latency_budget_ms: u64,
    pub reward_cooldown_s: f64,
    /// 旧版线性权重表
    pub weights: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior_policy: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<Value>,
    /// 短语 → 动作，保持声明顺序
    #[serde(with = "ordered_map")]
    pub commands_map: Vec<(String, String)>,
    pub reward_triggers: BTreeMap<String, bool>,
    /// complexity / social_engagement 等环境上下文
    pub environment_context: BTreeMap<String, f64>,
    pub engines: EnginesSection,
    pub guard: GuardSection,
    pub logging: LoggingSection,
}

impl Default for RoboDogSettings {
    fn default() -> Self {
        Self {
            latency_budget_ms: default_latency_budget_ms(),
            reward_cooldown_s: default_reward_cooldown_s(),
            weights: BTreeMap::new(),
            behavior_policy: None,
            policy: None,
            commands_map: Vec::new(),
            reward_triggers: BTreeMap::new(),
            environment_context: BTreeMap::new(),
            engines: EnginesSection::default(),
            guard: GuardSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

fn default_latency_budget_ms() -> u64 {
    300
}

fn default_reward_cooldown_s() -> f64 {
    3.0
}

/// [engines] 段：语音识别 / 合成 / 执行器后端选择
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnginesSection {
    /// rule_based / command
    pub stt: String,
    /// stt = "command" 时的外部识别命令（wav 路径追加为最后一个参数）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt_command: Option<String>,
    /// console / silent / command
    pub tts: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_command: Option<String>,
    /// simulated / gpio
    pub actuator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpio_pin: Option<u32>,
}

impl Default for EnginesSection {
    fn default() -> Self {
        Self {
            stt: "rule_based".to_string(),
            stt_command: None,
            tts: "console".to_string(),
            tts_command: None,
            actuator: "simulated".to_string(),
            gpio_pin: None,
        }
    }
}

/// [guard] 段：信任守卫的滑动窗口上限
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rewards_per_window: Option<usize>,
    pub window_s: f64,
}

impl Default for GuardSection {
    fn default() -> Self {
        Self {
            max_rewards_per_window: None,
            window_s: 60.0,
        }
    }
}

/// [logging] 段：配置 dir 后额外写入按天滚动的日志文件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// 文件名前缀，实际文件为 `<prefix>.YYYY-MM-DD`
    pub file_prefix: String,
    /// 标准输出使用 JSON 行格式
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: None,
            file_prefix: "robodog.log".to_string(),
            json: false,
        }
    }
}

impl RoboDogSettings {
    /// 加载并校验配置；path 为 None 时使用 config/default.toml（若存在）
    pub fn load(path: Option<&Path>) -> Result<Self, BrainError> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(BrainError::Config(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                let format = file_format(path)?;
                let name = path.to_string_lossy();
                builder = builder.add_source(config::File::new(&name, format));
            }
            None => {
                let default_names = ["config/default", "../config/default"];
                for name in default_names {
                    if Path::new(&format!("{}.toml", name)).exists() {
                        builder = builder
                            .add_source(config::File::new(name, FileFormat::Toml).required(false));
                        break;
                    }
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ROBODOG")
                .separator("__")
                .try_parsing(true),
        );

        let raw: RoboDogSettings = builder.build()?.try_deserialize()?;
        raw.validated()
    }

    /// 规范化并校验：词表键去引号转小写、动作转大写、触发表键转大写、冷却非负
    pub fn validated(mut self) -> Result<Self, BrainError> {
        if !(self.reward_cooldown_s.is_finite() && self.reward_cooldown_s >= 0.0) {
            return Err(BrainError::Config(format!(
                "reward_cooldown_s must be >= 0, got {}",
                self.reward_cooldown_s
            )));
        }
        let mut commands: Vec<(String, String)> = Vec::with_capacity(self.commands_map.len());
        for (phrase, action) in &self.commands_map {
            let phrase = clean_phrase_key(phrase)?;
            let action = clean_action(action);
            // 后出现的同名短语覆盖动作，但保留首次出现的位置
            match commands.iter_mut().find(|(p, _)| *p == phrase) {
                Some(entry) => entry.1 = action,
                None => commands.push((phrase, action)),
            }
        }
        self.commands_map = commands;
        self.reward_triggers = self
            .reward_triggers
            .into_iter()
            .map(|(k, v)| (k.trim().to_uppercase(), v))
            .collect();
        Ok(self)
    }

    /// 策略配置文档：behavior_policy → policy → weights → 空
    pub fn policy_config(&self) -> Value {
        if let Some(p) = &self.behavior_policy {
            return p.clone();
        }
        if let Some(p) = &self.policy {
            return p.clone();
        }
        if !self.weights.is_empty() {
            return serde_json::to_value(&self.weights).unwrap_or(Value::Null);
        }
        Value::Null
    }

    /// 环境上下文取值，缺省 0.5
    pub fn context_value(&self, key: &str) -> f64 {
        self.environment_context.get(key).copied().unwrap_or(0.5)
    }

    /// 按扩展名写回（toml / json / yaml）
    pub fn save(&self, path: &Path) -> Result<(), BrainError> {
        let serialized = match file_format(path)? {
            FileFormat::Json => serde_json::to_string_pretty(self)?,
            FileFormat::Yaml => {
                serde_yaml::to_string(self).map_err(|e| BrainError::Serialize(e.to_string()))?
            }
            _ => toml::to_string_pretty(self).map_err(|e| BrainError::Serialize(e.to_string()))?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

fn file_format(path: &Path) -> Result<FileFormat, BrainError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "yaml" | "yml" | "" => Ok(FileFormat::Yaml),
        other => Err(BrainError::UnsupportedFormat(format!(".{other}"))),
    }
}

/// 设置点分路径上的值（中间段不存在或不是表时新建），返回重新校验后的配置
pub fn apply_key_path(
    settings: &RoboDogSettings,
    key_path: &[&str],
    value: Value,
) -> Result<RoboDogSettings, BrainError> {
    let Some((last, parents)) = key_path.split_last() else {
        return Err(BrainError::InvalidKeyPath("Key path cannot be empty".to_string()));
    };
    let mut data = serde_json::to_value(settings)?;
    let mut target = data
        .as_object_mut()
        .ok_or_else(|| BrainError::InvalidKeyPath("settings root is not a mapping".to_string()))?;
    for part in parents {
        let node = target
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        if !node.is_object() {
            *node = Value::Object(Default::default());
        }
        target = node
            .as_object_mut()
            .ok_or_else(|| BrainError::InvalidKeyPath(part.to_string()))?;
    }
    target.insert(last.to_string(), value);
    let updated: RoboDogSettings = serde_json::from_value(data)?;
    updated.validated()
}

/// 把点分路径拆成段，忽略空段
pub fn split_key_path(path: &str) -> Vec<&str> {
    path.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// 按类型解析命令行传入的值：str / int / float / bool / json
pub fn parse_typed_value(raw: &str, value_type: &str) -> Result<Value, BrainError> {
    let invalid = |e: &dyn std::fmt::Display| BrainError::InvalidValue(format!("{raw}: {e}"));
    match value_type {
        "str" => Ok(Value::String(raw.to_string())),
        "int" => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| invalid(&e)),
        "float" => raw
            .trim()
            .parse::<f64>()
            .map(Value::from)
            .map_err(|e| invalid(&e)),
        "bool" => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "n" | "off" => Ok(Value::Bool(false)),
            _ => Err(BrainError::InvalidValue(format!(
                "Cannot parse boolean value from '{raw}'"
            ))),
        },
        "json" => serde_json::from_str(raw).map_err(|e| invalid(&e)),
        other => Err(BrainError::InvalidValue(format!(
            "Unsupported value type: {other}"
        ))),
    }
}

/// 配置文件路径：显式参数优先，其次 ROBODOG_CONFIG 环境变量
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| std::env::var_os("ROBODOG_CONFIG").map(PathBuf::from))
}

/// 以 map 形式读写、按条目顺序保存的 Vec<(String, String)>
mod ordered_map {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(entries: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (k, v) in entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a mapping of phrase to action")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    entries.push((k, v));
                }
                Ok(entries)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(Vec::new())
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_configuration_and_normalization() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "config.toml",
            r#"
reward_cooldown_s = 1.5

[commands_map]
"Сидіти" = "sit"

[reward_triggers]
sit = true

[weights]
confidence = 0.9
"#,
        );
        let settings = RoboDogSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.reward_cooldown_s, 1.5);
        assert_eq!(settings.commands_map, vec![("сидіти".to_string(), "SIT".to_string())]);
        assert_eq!(settings.reward_triggers.get("SIT"), Some(&true));
        assert_eq!(settings.policy_config(), serde_json::json!({"confidence": 0.9}));
        assert_eq!(settings.latency_budget_ms, 300);
    }

    #[test]
    fn test_logging_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "config.toml",
            "[logging]\ndir = \"/var/log/robodog\"\njson = true\n",
        );
        let settings = RoboDogSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.logging.dir, Some(PathBuf::from("/var/log/robodog")));
        assert_eq!(settings.logging.file_prefix, "robodog.log");
        assert!(settings.logging.json);
        assert!(RoboDogSettings::default().logging.dir.is_none());
    }

    #[test]
    fn test_commands_keep_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "config.toml",
            r#"
[commands_map]
"сидіти" = "SIT"
"лежати" = "LIE_DOWN"
"до мене" = "COME"
"голос" = "BARK"
"#,
        );
        let settings = RoboDogSettings::load(Some(&path)).unwrap();
        let phrases: Vec<&str> = settings.commands_map.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(phrases, vec!["сидіти", "лежати", "до мене", "голос"]);
    }

    #[test]
    fn test_invalid_command_mapping_raises() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "config.yaml", "commands_map:\n  '': SIT\n");
        assert!(RoboDogSettings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_missing_file_and_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RoboDogSettings::load(Some(&dir.path().join("absent.toml"))).is_err());
        let path = write_config(dir.path(), "config.ini", "a=1\n");
        assert!(matches!(
            RoboDogSettings::load(Some(&path)),
            Err(BrainError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_negative_cooldown_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "c.json", r#"{"reward_cooldown_s": -1}"#);
        assert!(RoboDogSettings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_policy_precedence() {
        let mut settings = RoboDogSettings::default();
        assert_eq!(settings.policy_config(), Value::Null);
        settings.weights.insert("mood".to_string(), 0.2);
        settings.policy = Some(serde_json::json!({"learning_rate": 0.1, "training_data": []}));
        assert_eq!(settings.policy_config()["learning_rate"], 0.1);
        settings.behavior_policy = Some(serde_json::json!({"seed": 1, "training_data": []}));
        assert_eq!(settings.policy_config()["seed"], 1);
    }

    #[test]
    fn test_apply_key_path_updates() {
        let settings = RoboDogSettings::default();
        let updated = apply_key_path(
            &settings,
            &["environment_context", "complexity"],
            Value::from(0.7),
        )
        .unwrap();
        assert_eq!(updated.environment_context.get("complexity"), Some(&0.7));

        let updated = apply_key_path(&updated, &split_key_path("commands_map.Сидіти"), Value::from("sit")).unwrap();
        assert_eq!(updated.commands_map, vec![("сидіти".to_string(), "SIT".to_string())]);

        assert!(apply_key_path(&settings, &[], Value::Null).is_err());
    }

    #[test]
    fn test_parse_typed_value() {
        assert_eq!(parse_typed_value("true", "bool").unwrap(), Value::Bool(true));
        assert_eq!(parse_typed_value("3.14", "float").unwrap(), Value::from(3.14));
        assert_eq!(parse_typed_value("42", "int").unwrap(), Value::from(42));
        assert_eq!(
            parse_typed_value("{\"a\": 1}", "json").unwrap(),
            serde_json::json!({"a": 1})
        );
        assert!(parse_typed_value("maybe", "bool").is_err());
        assert!(parse_typed_value("1", "decimal").is_err());
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = RoboDogSettings::default();
        settings.commands_map = vec![
            ("сидіти".to_string(), "SIT".to_string()),
            ("голос".to_string(), "BARK".to_string()),
        ];
        settings.reward_triggers.insert("SIT".to_string(), true);
        for name in ["saved.toml", "saved.json", "saved.yaml"] {
            let path = dir.path().join(name);
            settings.save(&path).unwrap();
            let loaded = RoboDogSettings::load(Some(&path)).unwrap();
            assert_eq!(loaded.commands_map, settings.commands_map);
            assert_eq!(loaded.reward_triggers, settings.reward_triggers);
        }
    }
}
