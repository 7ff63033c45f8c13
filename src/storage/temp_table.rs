//! Временные таблицы для материализации промежуточных результатов

use crate::common::Result;
use crate::storage::file::record_file_name;
use crate::storage::layout::{Layout, Schema};
use crate::storage::table_scan::TableScan;
use crate::storage::transaction::TxRef;
use std::fmt;

/// Временная таблица с уникальным именем `temp<N>`.
///
/// Заполняется один раз через свой курсор, читается сколько угодно раз;
/// файл удаляется, когда таблица уничтожается.
pub struct TempTable {
    tx: TxRef,
    name: String,
    layout: Layout,
}

impl TempTable {
    /// Создает пустую временную таблицу со схемой
    pub fn new(tx: TxRef, schema: Schema) -> Self {
        let name = tx.next_temp_name();
        Self {
            tx,
            name,
            layout: Layout::new(schema),
        }
    }

    /// Открывает курсор по таблице
    pub fn open(&self) -> Result<TableScan> {
        TableScan::new(self.tx.clone(), &self.name, self.layout.clone())
    }

    pub fn table_name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> String {
        record_file_name(&self.name)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Количество блоков таблицы
    pub fn size(&self) -> Result<usize> {
        self.tx.size(&self.file_name())
    }

    /// Количество записей таблицы
    pub fn record_count(&self) -> Result<usize> {
        self.tx.record_count(&self.file_name())
    }
}

impl fmt::Debug for TempTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempTable").field("name", &self.name).finish()
    }
}

impl Drop for TempTable {
    fn drop(&mut self) {
        if let Err(e) = self.tx.drop_file(&self.file_name()) {
            log::warn!("Не удалось удалить временную таблицу {}: {}", self.name, e);
        }
    }
}
