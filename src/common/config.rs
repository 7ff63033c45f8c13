//! Конфигурация для rustdb-query
//!
//! Предоставляет структуры конфигурации хранилища, планировщика и логирования

use crate::common::constants::{
    DEFAULT_BLOCK_SIZE, DEFAULT_BUFFER_POOL_SIZE, INT_FIELD_SIZE, SLOT_FLAG_SIZE,
};
use crate::common::{Error, Result};
use crate::planner::settings::{JoinPolicy, JoinStrategy, PlannerSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Основная конфигурация движка запросов
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Конфигурация хранения
    pub storage: StorageConfig,
    /// Конфигурация планировщика
    pub planner: PlannerConfig,
    /// Конфигурация логирования
    pub logging: LoggingConfig,
}

/// Конфигурация хранения
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Размер блока в байтах
    pub block_size: usize,
    /// Размер пула буферов (в блоках)
    pub buffer_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            buffer_pool_size: DEFAULT_BUFFER_POOL_SIZE,
        }
    }
}

/// Конфигурация планировщика
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Политика выбора соединения
    pub join_policy: JoinPolicy,
    /// Разрешенные стратегии соединения
    pub enabled_strategies: Vec<JoinStrategy>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            join_policy: JoinPolicy::CostBased,
            enabled_strategies: JoinStrategy::ALL.to_vec(),
        }
    }
}

/// Конфигурация логирования
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Уровень логирования
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Загружает конфигурацию из TOML файла
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| {
            Error::configuration(format!(
                "failed to parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Сохраняет конфигурацию в TOML файл
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Представляет конфигурацию в виде TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Загружает конфигурацию из переменных окружения
    pub fn from_env() -> Result<Self> {
        let mut config = EngineConfig::default();

        if let Ok(block_size) = std::env::var("RUSTDB_BLOCK_SIZE") {
            config.storage.block_size = parse_env("RUSTDB_BLOCK_SIZE", &block_size)?;
        }

        if let Ok(pool_size) = std::env::var("RUSTDB_BUFFER_POOL_SIZE") {
            config.storage.buffer_pool_size = parse_env("RUSTDB_BUFFER_POOL_SIZE", &pool_size)?;
        }

        if let Ok(policy) = std::env::var("RUSTDB_JOIN_POLICY") {
            config.planner.join_policy = policy.parse()?;
        }

        if let Ok(log_level) = std::env::var("RUSTDB_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        Ok(config)
    }

    /// Объединяет конфигурацию с другой: значения, отличные от умолчаний, побеждают
    pub fn merge(mut self, other: Self) -> Self {
        self.storage = self.storage.merge(other.storage);
        self.planner = self.planner.merge(other.planner);
        self.logging = self.logging.merge(other.logging);
        self
    }

    /// Валидирует конфигурацию
    pub fn validate(&self) -> Result<()> {
        if self.storage.block_size < SLOT_FLAG_SIZE + INT_FIELD_SIZE {
            return Err(Error::validation(format!(
                "Block size must be at least {} bytes",
                SLOT_FLAG_SIZE + INT_FIELD_SIZE
            )));
        }

        if self.storage.buffer_pool_size == 0 {
            return Err(Error::validation(
                "Buffer pool size must be greater than 0",
            ));
        }

        if self.planner.join_policy == JoinPolicy::CostBased
            && self.planner.enabled_strategies.is_empty()
        {
            return Err(Error::validation(
                "Cost-based planning needs at least one enabled join strategy",
            ));
        }

        if self.logging.level.trim().is_empty() {
            return Err(Error::validation("Log level cannot be empty"));
        }

        Ok(())
    }

    /// Настройки планировщика, построенные из конфигурации
    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            join_policy: self.planner.join_policy,
            enabled_strategies: self.planner.enabled_strategies.clone(),
        }
    }
}

impl StorageConfig {
    fn merge(mut self, other: Self) -> Self {
        if other.block_size != DEFAULT_BLOCK_SIZE {
            self.block_size = other.block_size;
        }
        if other.buffer_pool_size != DEFAULT_BUFFER_POOL_SIZE {
            self.buffer_pool_size = other.buffer_pool_size;
        }
        self
    }
}

impl PlannerConfig {
    fn merge(mut self, other: Self) -> Self {
        let defaults = PlannerConfig::default();
        if other.join_policy != defaults.join_policy {
            self.join_policy = other.join_policy;
        }
        if other.enabled_strategies != defaults.enabled_strategies {
            self.enabled_strategies = other.enabled_strategies;
        }
        self
    }
}

impl LoggingConfig {
    fn merge(mut self, other: Self) -> Self {
        if other.level != "info" {
            self.level = other.level;
        }
        self
    }
}

fn parse_env(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|e| Error::configuration(format!("{} = '{}': {}", name, raw, e)))
}
