//! Базовые типы данных для rustdb-query

use crate::common::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use twox_hash::XxHash64;

/// Seed стабильного хеша значений: одинаковый ключ всегда попадает в один раздел
const VALUE_HASH_SEED: u64 = 0x5253_4442_5155_4552;

/// Тип поля схемы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 32-битное целое число
    Integer,
    /// Строка с максимальной длиной
    Varchar,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Integer => write!(f, "int"),
            FieldType::Varchar => write!(f, "varchar"),
        }
    }
}

/// Значение поля записи.
///
/// Тип значения фиксируется при создании. Сравнение определено только
/// внутри одного типа: `try_cmp` возвращает ошибку для разных типов,
/// `PartialOrd` в этом случае возвращает `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// Целое число
    Int(i32),
    /// Строка
    Str(String),
}

impl Value {
    /// Возвращает тип значения
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Int(_) => FieldType::Integer,
            Value::Str(_) => FieldType::Varchar,
        }
    }

    /// Возвращает целое значение или ошибку типа
    pub fn as_int(&self) -> Result<i32> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Str(s) => Err(Error::type_mismatch(format!(
                "expected int, found string '{}'",
                s
            ))),
        }
    }

    /// Возвращает строковое значение или ошибку типа
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Str(s) => Ok(s),
            Value::Int(v) => Err(Error::type_mismatch(format!(
                "expected string, found int {}",
                v
            ))),
        }
    }

    /// Сравнивает два значения одного типа
    pub fn try_cmp(&self, other: &Value) -> Result<Ordering> {
        self.partial_cmp(other).ok_or_else(|| {
            Error::type_mismatch(format!("cannot compare {} with {}", self, other))
        })
    }

    /// Стабильный хеш значения (не зависит от адресов и запуска процесса)
    pub fn stable_hash(&self) -> u64 {
        let mut bytes = Vec::with_capacity(16);
        match self {
            Value::Int(v) => {
                bytes.push(0u8);
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            Value::Str(s) => {
                bytes.push(1u8);
                bytes.extend_from_slice(s.as_bytes());
            }
        }
        XxHash64::oneshot(VALUE_HASH_SEED, &bytes)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// Запись, буферизованная в памяти (имя поля -> значение)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Значения полей в порядке схемы
    pub values: IndexMap<String, Value>,
}

impl Row {
    /// Создает пустую запись
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }

    /// Устанавливает значение поля
    pub fn set_value(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }

    /// Получает значение поля
    pub fn get_value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Получает значение поля или ошибку отсутствующего поля
    pub fn value(&self, field: &str) -> Result<&Value> {
        self.values
            .get(field)
            .ok_or_else(|| Error::field_not_found(field))
    }

    /// Проверяет, содержит ли запись поле
    pub fn has_field(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
