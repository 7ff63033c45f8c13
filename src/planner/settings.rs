//! Настройки планировщика соединений

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Политика выбора плана соединения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Кандидат с наименьшим числом блоков; при равенстве побеждает более ранний
    #[default]
    CostBased,
    /// Всегда декартово произведение с выборкой
    ProductOnly,
}

impl fmt::Display for JoinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinPolicy::CostBased => write!(f, "cost_based"),
            JoinPolicy::ProductOnly => write!(f, "product_only"),
        }
    }
}

impl FromStr for JoinPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cost_based" => Ok(JoinPolicy::CostBased),
            "product_only" => Ok(JoinPolicy::ProductOnly),
            other => Err(Error::configuration(format!("unknown join policy '{}'", other))),
        }
    }
}

/// Стратегия соединения; порядок вариантов задает порядок кандидатов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    Product,
    Merge,
    Index,
    NestedLoop,
    Hash,
}

impl JoinStrategy {
    /// Все стратегии в порядке перебора кандидатов
    pub const ALL: [JoinStrategy; 5] = [
        JoinStrategy::Product,
        JoinStrategy::Merge,
        JoinStrategy::Index,
        JoinStrategy::NestedLoop,
        JoinStrategy::Hash,
    ];
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinStrategy::Product => "product",
            JoinStrategy::Merge => "merge",
            JoinStrategy::Index => "index",
            JoinStrategy::NestedLoop => "nested_loop",
            JoinStrategy::Hash => "hash",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for JoinStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        JoinStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.to_string() == normalized)
            .ok_or_else(|| Error::configuration(format!("unknown join strategy '{}'", s)))
    }
}

/// Настройки планировщика
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    /// Политика выбора соединения
    pub join_policy: JoinPolicy,
    /// Разрешенные стратегии
    pub enabled_strategies: Vec<JoinStrategy>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            join_policy: JoinPolicy::CostBased,
            enabled_strategies: JoinStrategy::ALL.to_vec(),
        }
    }
}

impl PlannerSettings {
    /// Только произведение с выборкой
    pub fn product_only() -> Self {
        Self {
            join_policy: JoinPolicy::ProductOnly,
            ..Self::default()
        }
    }

    /// Оценка по стоимости среди заданных стратегий
    pub fn only(strategies: &[JoinStrategy]) -> Self {
        Self {
            join_policy: JoinPolicy::CostBased,
            enabled_strategies: strategies.to_vec(),
        }
    }

    pub fn is_enabled(&self, strategy: JoinStrategy) -> bool {
        self.enabled_strategies.contains(&strategy)
    }
}
