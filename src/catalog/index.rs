//! Интерфейс индексов и индекс в памяти

use crate::catalog::statistics::StatInfo;
use crate::common::constants::HASH_INDEX_BUCKETS;
use crate::common::{Error, FieldType, Result, Value};
use crate::storage::file::Rid;
use crate::storage::layout::{Layout, Schema};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Вид индекса
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Статический хеш-индекс (только поиск на равенство)
    Hash,
    /// B-дерево
    BTree,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Hash => write!(f, "hash"),
            IndexKind::BTree => write!(f, "btree"),
        }
    }
}

/// Курсор по записям индекса с заданным ключом
pub trait Index {
    /// Позиционирует индекс перед первой записью с ключом
    fn before_first(&mut self, key: &Value) -> Result<()>;

    /// Переходит к следующей записи с ключом
    fn next(&mut self) -> Result<bool>;

    /// Идентификатор записи таблицы для текущей записи индекса
    fn data_rid(&self) -> Result<Rid>;

    /// Добавляет запись индекса
    fn insert(&mut self, key: &Value, rid: Rid) -> Result<()>;

    /// Удаляет запись индекса
    fn delete(&mut self, key: &Value, rid: Rid) -> Result<()>;

    fn close(&mut self);
}

/// Общее содержимое индекса в памяти: ключ -> идентификаторы записей
#[derive(Debug, Default)]
pub struct IndexStore {
    entries: RwLock<HashMap<Value, Vec<Rid>>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: Value, rid: Rid) {
        self.entries.write().entry(key).or_default().push(rid);
    }

    pub fn remove(&self, key: &Value, rid: Rid) {
        let mut entries = self.entries.write();
        if let Some(rids) = entries.get_mut(key) {
            rids.retain(|r| *r != rid);
            if rids.is_empty() {
                entries.remove(key);
            }
        }
    }

    /// Идентификаторы записей с ключом
    pub fn lookup(&self, key: &Value) -> Vec<Rid> {
        self.entries.read().get(key).cloned().unwrap_or_default()
    }

    /// Количество записей индекса
    pub fn len(&self) -> usize {
        self.entries.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Индекс в памяти поверх [`IndexStore`]
pub struct MemoryIndex {
    store: Arc<IndexStore>,
    matches: Vec<Rid>,
    position: Option<usize>,
}

impl MemoryIndex {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self {
            store,
            matches: Vec::new(),
            position: None,
        }
    }
}

impl Index for MemoryIndex {
    fn before_first(&mut self, key: &Value) -> Result<()> {
        self.matches = self.store.lookup(key);
        self.matches.sort();
        self.position = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.matches.len()));
        Ok(next < self.matches.len())
    }

    fn data_rid(&self) -> Result<Rid> {
        self.position
            .and_then(|p| self.matches.get(p).copied())
            .ok_or_else(|| Error::query_execution("index is not positioned on an entry"))
    }

    fn insert(&mut self, key: &Value, rid: Rid) -> Result<()> {
        self.store.insert(key.clone(), rid);
        Ok(())
    }

    fn delete(&mut self, key: &Value, rid: Rid) -> Result<()> {
        self.store.remove(key, rid);
        Ok(())
    }

    fn close(&mut self) {
        self.matches.clear();
        self.position = None;
    }
}

/// Сведения об индексе, нужные планировщику
#[derive(Debug, Clone)]
pub struct IndexInfo {
    index_name: String,
    field_name: String,
    kind: IndexKind,
    block_size: usize,
    index_layout: Layout,
    stats: StatInfo,
    store: Arc<IndexStore>,
}

impl IndexInfo {
    /// Создает сведения об индексе по полю таблицы
    pub fn new(
        index_name: &str,
        field_name: &str,
        kind: IndexKind,
        table_schema: &Schema,
        block_size: usize,
        stats: StatInfo,
        store: Arc<IndexStore>,
    ) -> Result<Self> {
        let mut schema = Schema::new();
        schema.add_int_field("block");
        schema.add_int_field("id");
        match table_schema.field_type(field_name)? {
            FieldType::Integer => schema.add_int_field("dataval"),
            FieldType::Varchar => {
                schema.add_string_field("dataval", table_schema.length(field_name)?)
            }
        }
        Ok(Self {
            index_name: index_name.to_string(),
            field_name: field_name.to_string(),
            kind,
            block_size,
            index_layout: Layout::new(schema),
            stats,
            store,
        })
    }

    /// Открывает индекс
    pub fn open(&self) -> Box<dyn Index> {
        Box::new(MemoryIndex::new(Arc::clone(&self.store)))
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Стоимость поиска в индексе (в блоках)
    pub fn blocks_accessed(&self) -> usize {
        let records_per_block = self.index_layout.slots_per_block(self.block_size).max(1);
        let num_blocks = self.stats.records_output() / records_per_block;
        match self.kind {
            IndexKind::Hash => num_blocks / HASH_INDEX_BUCKETS,
            IndexKind::BTree => {
                if num_blocks <= 1 || records_per_block <= 1 {
                    1
                } else {
                    1 + ((num_blocks as f64).ln() / (records_per_block as f64).ln()) as usize
                }
            }
        }
    }

    /// Ожидаемое число записей с одним значением ключа
    pub fn records_output(&self) -> usize {
        self.stats.records_output() / self.stats.distinct_values(&self.field_name).max(1)
    }

    /// Число различных значений поля среди найденных записей
    pub fn distinct_values(&self, field: &str) -> usize {
        if field == self.field_name {
            1
        } else {
            self.stats.distinct_values(field)
        }
    }
}
