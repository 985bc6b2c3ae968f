//! 指令解析：自由文本 → 动作标签
//!
//! 归一化：Unicode case folding（ß → ss、ς → σ）后删除所有空白 / 下划线 / 连字符串，"lie-down"、"lie down"、"lie_down" 等价。
//! 匹配：词表短语归一化后作为子串出现在归一化输入中即命中，按配置声明顺序取第一个。

use std::sync::OnceLock;

use regex::Regex;

use crate::core::BrainError;

/// 未识别指令的哨兵动作
pub const NONE_ACTION: &str = "NONE";

static DELIMITER_RE: OnceLock<Regex> = OnceLock::new();

/// 生成便于比较的指令 token
pub fn normalize_phrase(value: &str) -> String {
    let re = DELIMITER_RE.get_or_init(|| Regex::new(r"[\s_\-]+").unwrap());
    re.replace_all(&caseless::default_case_fold_str(value), "").into_owned()
}

/// 词表键清洗：去首尾空白与引号，case fold；清洗后为空则拒绝
pub fn clean_phrase_key(raw: &str) -> Result<String, BrainError> {
    let cleaned = raw.trim().trim_matches(|c: char| c == '\'' || c == '"');
    if cleaned.is_empty() {
        return Err(BrainError::InvalidCommandKey);
    }
    Ok(caseless::default_case_fold_str(cleaned))
}

/// 动作值清洗：去空白转大写，空值记为 NONE
pub fn clean_action(raw: &str) -> String {
    let action = raw.trim().to_uppercase();
    if action.is_empty() {
        NONE_ACTION.to_string()
    } else {
        action
    }
}

#[derive(Debug, Clone)]
struct VocabularyEntry {
    phrase: String,
    normalized: String,
    action: String,
}

/// 有序指令词表
#[derive(Debug, Clone, Default)]
pub struct CommandInterpreter {
    entries: Vec<VocabularyEntry>,
}

impl CommandInterpreter {
    /// 从 (短语, 动作) 序列构建；顺序即匹配优先级
    pub fn new<I, K, V>(vocabulary: I) -> Result<Self, BrainError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut entries = Vec::new();
        for (phrase, action) in vocabulary {
            let phrase = clean_phrase_key(phrase.as_ref())?;
            let normalized = normalize_phrase(&phrase);
            // 仅由分隔符组成的短语归一化后为空，会匹配任意输入
            if normalized.is_empty() {
                return Err(BrainError::InvalidCommandKey);
            }
            entries.push(VocabularyEntry {
                phrase,
                normalized,
                action: clean_action(action.as_ref()),
            });
        }
        Ok(Self { entries })
    }

    /// 解析文本为动作；无命中返回 NONE
    pub fn resolve(&self, text: &str) -> String {
        let normalized_input = normalize_phrase(text);
        self.entries
            .iter()
            .find(|e| normalized_input.contains(&e.normalized))
            .map(|e| e.action.clone())
            .unwrap_or_else(|| NONE_ACTION.to_string())
    }

    /// 词表中的 (短语, 动作)，按声明顺序
    pub fn phrases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| (e.phrase.as_str(), e.action.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synonyms() -> CommandInterpreter {
        CommandInterpreter::new([
            ("сидіти", "SIT"),
            ("сідай", "SIT"),
            ("sit", "SIT"),
            ("до_мене", "COME"),
            ("stay", "STAY"),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_supports_synonyms() {
        let m = synonyms();
        assert_eq!(m.resolve("Сідай, будь ласка"), "SIT");
        assert_eq!(m.resolve("Do me a favour and sit down"), "SIT");
        assert_eq!(m.resolve("Песику, до мене!"), "COME");
        assert_eq!(m.resolve("Please stay here"), "STAY");
    }

    #[test]
    fn test_resolve_normalizes_delimiters() {
        let m = CommandInterpreter::new([("лягай", "lie_down"), ("lie-down", "LIE_DOWN")]).unwrap();
        assert_eq!(m.resolve("Лягай негайно"), "LIE_DOWN");
        assert_eq!(m.resolve("Time to lie down now"), "LIE_DOWN");
        assert_eq!(normalize_phrase("lie-down"), normalize_phrase("lie down"));
        assert_eq!(normalize_phrase("Lie__ -Down"), "liedown");
    }

    #[test]
    fn test_resolve_uses_full_case_folding() {
        let m = CommandInterpreter::new([("straße", "WALK")]).unwrap();
        assert_eq!(m.resolve("STRASSE"), "WALK");
        assert_eq!(m.resolve("go strasse"), "WALK");

        let m = CommandInterpreter::new([("STRASSE", "WALK")]).unwrap();
        assert_eq!(m.resolve("Straße"), "WALK");
        assert_eq!(m.phrases().next(), Some(("strasse", "WALK")));

        assert_eq!(normalize_phrase("ΟΔΟΣ"), normalize_phrase("οδος"));
        assert_eq!(normalize_phrase("ὀδός"), normalize_phrase("ὀδόσ"));
    }

    #[test]
    fn test_unknown_and_degenerate_input() {
        let m = synonyms();
        assert_eq!(m.resolve(""), NONE_ACTION);
        assert_eq!(m.resolve("12345 !!!"), NONE_ACTION);
        assert_eq!(m.resolve("   "), NONE_ACTION);
    }

    #[test]
    fn test_declaration_order_wins() {
        let m = CommandInterpreter::new([("sit", "SIT"), ("sit down", "LIE_DOWN")]).unwrap();
        assert_eq!(m.resolve("sit down"), "SIT");
        let m = CommandInterpreter::new([("sit down", "LIE_DOWN"), ("sit", "SIT")]).unwrap();
        assert_eq!(m.resolve("sit down"), "LIE_DOWN");
    }

    #[test]
    fn test_invalid_keys_rejected() {
        assert!(matches!(
            CommandInterpreter::new([("", "SIT")]),
            Err(BrainError::InvalidCommandKey)
        ));
        assert!(CommandInterpreter::new([("  '' ", "SIT")]).is_err());
        assert!(CommandInterpreter::new([("-_-", "SIT")]).is_err());
    }

    #[test]
    fn test_action_values_cleaned() {
        let m = CommandInterpreter::new([("\"Голос\"", " bark "), ("тихо", "  ")]).unwrap();
        let phrases: Vec<_> = m.phrases().collect();
        assert_eq!(phrases, vec![("голос", "BARK"), ("тихо", "NONE")]);
        assert_eq!(m.resolve("ГОЛОС!"), "BARK");
    }
}
