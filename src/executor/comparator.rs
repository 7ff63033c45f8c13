//! Сравнение записей по нескольким ключам

use crate::common::{Result, Row, Value};
use crate::query::scan::Scan;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Направление сортировки
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Ключ сортировки: поле и направление
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Ключ по возрастанию
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    /// Ключ по убыванию
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Descending)
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{}", self.field),
            SortDirection::Descending => write!(f, "{} desc", self.field),
        }
    }
}

/// Компаратор записей по упорядоченному списку ключей.
///
/// Результат определяется первым ключом, на котором записи различаются;
/// для ключа по убыванию результат инвертируется.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordComparator {
    keys: Vec<SortKey>,
}

impl RecordComparator {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self { keys }
    }

    /// Компаратор по полям, все по возрастанию
    pub fn on_fields(fields: &[String]) -> Self {
        Self::new(fields.iter().map(SortKey::asc).collect())
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Имена полей ключа
    pub fn fields(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.field.clone()).collect()
    }

    /// Сравнивает текущие записи двух курсоров
    pub fn compare(&self, a: &dyn Scan, b: &dyn Scan) -> Result<Ordering> {
        for key in &self.keys {
            let ordering = a.get_val(&key.field)?.try_cmp(&b.get_val(&key.field)?)?;
            if ordering != Ordering::Equal {
                return Ok(key.apply(ordering));
            }
        }
        Ok(Ordering::Equal)
    }

    /// Сравнивает две буферизованные записи
    pub fn compare_rows(&self, a: &Row, b: &Row) -> Result<Ordering> {
        for key in &self.keys {
            let ordering = a.value(&key.field)?.try_cmp(b.value(&key.field)?)?;
            if ordering != Ordering::Equal {
                return Ok(key.apply(ordering));
            }
        }
        Ok(Ordering::Equal)
    }

    /// Значения ключа текущей записи курсора
    pub fn key_of(&self, scan: &dyn Scan) -> Result<Vec<Value>> {
        self.keys.iter().map(|k| scan.get_val(&k.field)).collect()
    }

    /// Сравнивает значения ключа, полученные через [`Self::key_of`]
    pub fn compare_keys(&self, a: &[Value], b: &[Value]) -> Result<Ordering> {
        for ((key, x), y) in self.keys.iter().zip(a).zip(b) {
            let ordering = x.try_cmp(y)?;
            if ordering != Ordering::Equal {
                return Ok(key.apply(ordering));
            }
        }
        Ok(Ordering::Equal)
    }

    /// Различаются ли записи хотя бы в одном поле ключа
    pub fn is_distinct_on(&self, a: &dyn Scan, b: &dyn Scan) -> Result<bool> {
        for key in &self.keys {
            if a.get_val(&key.field)?.try_cmp(&b.get_val(&key.field)?)? != Ordering::Equal {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
