//! 可观测性：tracing 日志初始化与 Prometheus 指标
//!
//! 标准输出始终开启；配置 `[logging] dir` 后再叠加一层按天滚动的文件输出（无 ANSI 颜色）。

pub mod metrics;

pub use metrics::BrainMetrics;

use std::io;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSection;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 按 [logging] 段初始化：默认 info，可通过 RUST_LOG 覆盖；json = true 时每条含 span 字段（如 decision_id）。
/// 返回的 guard 需持有到进程结束，drop 时刷出文件缓冲
pub fn init_with(logging: &LoggingSection) -> Option<WorkerGuard> {
    let (file_layer, guard, file_err) = match file_writer(logging) {
        Ok(Some((writer, guard))) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
            None,
        ),
        Ok(None) => (None, None, None),
        Err(e) => (None, None, Some(e)),
    };
    let plain = (!logging.json).then(fmt::layer);
    let json = logging
        .json
        .then(|| fmt::layer().json().with_current_span(true));

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(plain)
        .with(json)
        .with(file_layer)
        .try_init();

    if let Some(e) = file_err {
        tracing::warn!(dir = ?logging.dir, error = %e, "file logging disabled");
    }
    guard
}

/// 未配置目录时返回 None；目录不存在时先创建
pub fn file_writer(logging: &LoggingSection) -> io::Result<Option<(NonBlocking, WorkerGuard)>> {
    let Some(dir) = logging.dir.as_deref() else {
        return Ok(None);
    };
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(logging.file_prefix.as_str())
        .build(dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    Ok(Some(tracing_appender::non_blocking(appender)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_file_writer_without_dir() {
        assert!(file_writer(&LoggingSection::default()).unwrap().is_none());
    }

    #[test]
    fn test_file_writer_persists_events() {
        let dir = tempfile::tempdir().unwrap();
        let logging = LoggingSection {
            dir: Some(dir.path().join("logs")),
            ..LoggingSection::default()
        };
        let (writer, guard) = file_writer(&logging).unwrap().unwrap();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(action = "SIT", "decision written to file");
        });
        drop(guard);

        let mut contents = String::new();
        for entry in std::fs::read_dir(dir.path().join("logs")).unwrap() {
            let entry = entry.unwrap();
            assert!(entry.file_name().to_string_lossy().starts_with("robodog.log"));
            contents.push_str(&std::fs::read_to_string(entry.path()).unwrap());
        }
        assert!(contents.contains("decision written to file"));
        assert!(contents.contains("SIT"));
    }
}
