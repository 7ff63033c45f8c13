//! Интерфейс менеджера метаданных и каталог в памяти

use crate::catalog::index::{IndexInfo, IndexKind, IndexStore};
use crate::catalog::statistics::{StatInfo, StatisticsManager};
use crate::common::{Error, Result, Row};
use crate::query::scan::{Scan, UpdateScan};
use crate::storage::file::Rid;
use crate::storage::layout::{Layout, Schema};
use crate::storage::table_scan::TableScan;
use crate::storage::transaction::TxRef;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Общая ссылка на менеджер метаданных
pub type MetadataRef = Arc<dyn MetadataManager>;

/// Источник раскладок, статистики и индексов для планировщика
pub trait MetadataManager: Send + Sync {
    /// Раскладка записей таблицы
    fn layout(&self, table_name: &str) -> Result<Layout>;

    /// Статистика таблицы
    fn stat_info(&self, table_name: &str, layout: &Layout) -> Result<StatInfo>;

    /// Индексы таблицы по имени индексированного поля
    fn index_info(&self, table_name: &str) -> Result<HashMap<String, IndexInfo>>;
}

#[derive(Debug, Clone)]
struct IndexDef {
    index_name: String,
    field_name: String,
    kind: IndexKind,
    store: Arc<IndexStore>,
}

/// Каталог в памяти: таблицы, индексы и статистика одной транзакции
pub struct Catalog {
    tx: TxRef,
    tables: RwLock<HashMap<String, Layout>>,
    indexes: RwLock<HashMap<String, Vec<IndexDef>>>,
    statistics: StatisticsManager,
}

impl Catalog {
    /// Создает пустой каталог
    pub fn new(tx: TxRef) -> Self {
        Self {
            tx,
            tables: RwLock::new(HashMap::new()),
            indexes: RwLock::new(HashMap::new()),
            statistics: StatisticsManager::new(),
        }
    }

    pub fn tx(&self) -> &TxRef {
        &self.tx
    }

    /// Создает таблицу
    pub fn create_table(&self, table_name: &str, schema: Schema) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.contains_key(table_name) {
            return Err(Error::validation(format!(
                "table {} already exists",
                table_name
            )));
        }
        let layout = Layout::new(schema);
        if layout.slots_per_block(self.tx.block_size()) == 0 {
            return Err(Error::validation(format!(
                "records of table {} ({} bytes) do not fit a {}-byte block",
                table_name,
                layout.slot_size(),
                self.tx.block_size()
            )));
        }
        tables.insert(table_name.to_string(), layout);
        log::info!("Создана таблица {}", table_name);
        Ok(())
    }

    /// Создает индекс по полю таблицы и заполняет его существующими записями
    pub fn create_index(
        &self,
        index_name: &str,
        table_name: &str,
        field_name: &str,
        kind: IndexKind,
    ) -> Result<()> {
        let layout = self.layout(table_name)?;
        if !layout.schema().has_field(field_name) {
            return Err(Error::field_not_found(format!("{}.{}", table_name, field_name)));
        }

        let store = Arc::new(IndexStore::new());
        let mut scan = TableScan::new(self.tx.clone(), table_name, layout)?;
        while scan.next()? {
            store.insert(scan.get_val(field_name)?, scan.rid()?);
        }
        scan.close();

        self.indexes
            .write()
            .entry(table_name.to_string())
            .or_default()
            .push(IndexDef {
                index_name: index_name.to_string(),
                field_name: field_name.to_string(),
                kind,
                store,
            });
        log::info!(
            "Создан {} индекс {} на {}.{}",
            kind,
            index_name,
            table_name,
            field_name
        );
        Ok(())
    }

    /// Вставляет запись в таблицу и обновляет ее индексы
    pub fn insert_row(&self, table_name: &str, row: &Row) -> Result<Rid> {
        let rids = self.insert_rows(table_name, std::slice::from_ref(row))?;
        rids.into_iter()
            .next()
            .ok_or_else(|| Error::storage(format!("insert into {} produced no record", table_name)))
    }

    /// Вставляет записи одним курсором и обновляет индексы таблицы
    pub fn insert_rows(&self, table_name: &str, rows: &[Row]) -> Result<Vec<Rid>> {
        let layout = self.layout(table_name)?;
        let fields = layout.schema().fields();
        for row in rows {
            for field in &fields {
                layout.check_value(field, row.value(field)?)?;
            }
        }
        let mut scan = TableScan::new(self.tx.clone(), table_name, layout)?;
        let mut rids = Vec::with_capacity(rows.len());
        for row in rows {
            scan.insert()?;
            for field in &fields {
                scan.set_val(field, row.value(field)?.clone())?;
            }
            rids.push(scan.rid()?);
        }
        scan.close();

        if let Some(defs) = self.indexes.read().get(table_name) {
            for def in defs {
                for (row, rid) in rows.iter().zip(&rids) {
                    def.store.insert(row.value(&def.field_name)?.clone(), *rid);
                }
            }
        }
        self.statistics.invalidate(table_name);
        Ok(rids)
    }

    /// Имена таблиц каталога (отсортированы)
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn statistics(&self) -> &StatisticsManager {
        &self.statistics
    }
}

impl MetadataManager for Catalog {
    fn layout(&self, table_name: &str) -> Result<Layout> {
        self.tables
            .read()
            .get(table_name)
            .cloned()
            .ok_or_else(|| Error::query_planning(format!("unknown table {}", table_name)))
    }

    fn stat_info(&self, table_name: &str, layout: &Layout) -> Result<StatInfo> {
        self.statistics.stat_info(&self.tx, table_name, layout)
    }

    fn index_info(&self, table_name: &str) -> Result<HashMap<String, IndexInfo>> {
        let defs = match self.indexes.read().get(table_name) {
            Some(defs) => defs.clone(),
            None => return Ok(HashMap::new()),
        };
        let layout = self.layout(table_name)?;
        let stats = self.stat_info(table_name, &layout)?;

        let mut result = HashMap::new();
        for def in defs {
            let info = IndexInfo::new(
                &def.index_name,
                &def.field_name,
                def.kind,
                layout.schema(),
                self.tx.block_size(),
                stats.clone(),
                def.store,
            )?;
            result.insert(def.field_name, info);
        }
        Ok(result)
    }
}
