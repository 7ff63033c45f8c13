//! Настройка логирования для rustdb-query
//!
//! Исполнитель и планировщик пишут события через `tracing`, слой хранения через `log`;
//! записи `log` перенаправляются в подписчик `tracing` через `tracing-log`.

use crate::common::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Строит фильтр событий: `RUST_LOG` имеет приоритет над уровнем из конфигурации
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(format!("rustdb_query={level}"))
        .map_err(|e| Error::configuration(format!("invalid log level '{}': {}", level, e)))
}

/// Инициализирует глобальный подписчик логирования.
///
/// Повторный вызов ничего не меняет и возвращает `Ok(())`.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = build_filter(level)?;

    if tracing_log::LogTracer::init().is_err() {
        return Ok(());
    }

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        log::debug!("Глобальный подписчик tracing уже установлен");
    }
    Ok(())
}
