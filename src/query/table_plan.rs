//! План чтения хранимой таблицы

use crate::catalog::metadata::MetadataRef;
use crate::catalog::statistics::StatInfo;
use crate::common::Result;
use crate::query::plan::Plan;
use crate::query::scan::Scan;
use crate::storage::layout::{Layout, Schema};
use crate::storage::table_scan::TableScan;
use crate::storage::transaction::TxRef;

/// План полного сканирования таблицы
pub struct TablePlan {
    tx: TxRef,
    table_name: String,
    layout: Layout,
    stats: StatInfo,
}

impl TablePlan {
    /// Создает план по метаданным таблицы
    pub fn new(tx: TxRef, table_name: &str, metadata: &MetadataRef) -> Result<Self> {
        let layout = metadata.layout(table_name)?;
        let stats = metadata.stat_info(table_name, &layout)?;
        Ok(Self {
            tx,
            table_name: table_name.to_string(),
            layout,
            stats,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Открывает изменяемый курсор по таблице
    pub fn open_table_scan(&self) -> Result<TableScan> {
        TableScan::new(self.tx.clone(), &self.table_name, self.layout.clone())
    }
}

impl Plan for TablePlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        Ok(Box::new(self.open_table_scan()?))
    }

    fn schema(&self) -> &Schema {
        self.layout.schema()
    }

    fn blocks_accessed(&self) -> usize {
        self.stats.blocks_accessed()
    }

    fn records_output(&self) -> usize {
        self.stats.records_output()
    }

    fn distinct_values(&self, field: &str) -> usize {
        self.stats.distinct_values(field)
    }

    fn describe(&self) -> String {
        format!("Table({})", self.table_name)
    }
}
