//! 指令层：文本归一化与词表匹配

pub mod interpreter;

pub use interpreter::{clean_action, clean_phrase_key, normalize_phrase, CommandInterpreter, NONE_ACTION};
