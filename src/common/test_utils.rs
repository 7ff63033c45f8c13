//! Общие утилиты для тестирования

use crate::catalog::index::IndexKind;
use crate::catalog::metadata::{Catalog, MetadataRef};
use crate::common::{Result, Row, Value};
use crate::query::scan::Scan;
use crate::storage::layout::Schema;
use crate::storage::transaction::{MemoryTransaction, StorageEngine, TxRef};
use std::sync::Arc;

/// Тестовое окружение: хранилище, транзакция и каталог
pub struct TestEnv {
    pub engine: Arc<StorageEngine>,
    pub mtx: Arc<MemoryTransaction>,
    pub tx: TxRef,
    pub catalog: Arc<Catalog>,
}

impl TestEnv {
    /// Окружение с заданным размером блока и пула
    pub fn new(block_size: usize, buffer_pool_size: usize) -> Self {
        let engine = Arc::new(StorageEngine::new(block_size, buffer_pool_size));
        let mtx = engine.begin();
        let tx: TxRef = mtx.clone();
        let catalog = Arc::new(Catalog::new(tx.clone()));
        Self {
            engine,
            mtx,
            tx,
            catalog,
        }
    }

    /// Маленькие блоки, чтобы таблицы занимали несколько блоков
    pub fn small() -> Self {
        Self::new(64, 8)
    }

    pub fn metadata(&self) -> MetadataRef {
        self.catalog.clone()
    }

    /// Создает таблицу и вставляет записи
    pub fn load_table(&self, name: &str, schema: Schema, rows: &[Row]) -> Result<()> {
        self.catalog.create_table(name, schema)?;
        self.catalog.insert_rows(name, rows)?;
        Ok(())
    }

    pub fn create_index(&self, table: &str, field: &str, kind: IndexKind) -> Result<()> {
        self.catalog
            .create_index(&format!("{}_{}_idx", table, field), table, field, kind)
    }
}

/// Схема из целых полей
pub fn int_schema(fields: &[&str]) -> Schema {
    let mut schema = Schema::new();
    for field in fields {
        schema.add_int_field(field);
    }
    schema
}

/// Запись из пар (поле, значение)
pub fn row<V: Into<Value> + Clone>(pairs: &[(&str, V)]) -> Row {
    pairs
        .iter()
        .map(|(field, value)| (field.to_string(), value.clone().into()))
        .collect()
}

/// Записи из целых значений в порядке полей
pub fn int_rows(fields: &[&str], values: &[Vec<i32>]) -> Vec<Row> {
    values
        .iter()
        .map(|record| {
            fields
                .iter()
                .zip(record)
                .map(|(field, value)| (field.to_string(), Value::Int(*value)))
                .collect()
        })
        .collect()
}

/// Детерминированная псевдослучайная последовательность
pub fn pseudo_random(i: usize, n: usize) -> i32 {
    ((i * 7919) % n.max(1)) as i32
}

pub use crate::demo::run_plan;

/// Читает все записи курсора как кортежи целых значений
pub fn int_tuples(scan: &mut dyn Scan, fields: &[&str]) -> Result<Vec<Vec<i32>>> {
    let mut tuples = Vec::new();
    while scan.next()? {
        let tuple = fields
            .iter()
            .map(|field| scan.get_int(field))
            .collect::<Result<Vec<_>>>()?;
        tuples.push(tuple);
    }
    Ok(tuples)
}
