//! Выборка по индексу: записи таблицы с ключом, равным константе

use crate::catalog::index::{Index, IndexInfo};
use crate::common::{Result, Value};
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::{Scan, UpdateScan};
use crate::query::table_plan::TablePlan;
use crate::storage::layout::Schema;
use crate::storage::table_scan::TableScan;
use std::sync::Arc;

/// План выборки по индексу
pub struct IndexSelectPlan {
    table: Arc<TablePlan>,
    index: IndexInfo,
    value: Value,
}

impl IndexSelectPlan {
    pub fn new(table: Arc<TablePlan>, index: IndexInfo, value: Value) -> Self {
        Self {
            table,
            index,
            value,
        }
    }

    pub fn index(&self) -> &IndexInfo {
        &self.index
    }
}

impl Plan for IndexSelectPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let table = self.table.open_table_scan()?;
        let index = self.index.open();
        Ok(Box::new(IndexSelectScan::new(table, index, self.value.clone())?))
    }

    fn schema(&self) -> &Schema {
        self.table.schema()
    }

    fn blocks_accessed(&self) -> usize {
        self.index
            .blocks_accessed()
            .saturating_add(self.records_output())
    }

    fn records_output(&self) -> usize {
        self.index.records_output()
    }

    fn distinct_values(&self, field: &str) -> usize {
        self.index.distinct_values(field)
    }

    fn describe(&self) -> String {
        format!(
            "IndexSelect({} {} = {})",
            self.index.index_name(),
            self.index.field_name(),
            self.value
        )
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.table.clone() as PlanRef]
    }
}

/// Курсор выборки по индексу
pub struct IndexSelectScan {
    table: TableScan,
    index: Box<dyn Index>,
    value: Value,
}

impl IndexSelectScan {
    pub fn new(table: TableScan, index: Box<dyn Index>, value: Value) -> Result<Self> {
        let mut scan = Self {
            table,
            index,
            value,
        };
        scan.before_first()?;
        Ok(scan)
    }
}

impl Scan for IndexSelectScan {
    fn before_first(&mut self) -> Result<()> {
        self.index.before_first(&self.value)
    }

    fn next(&mut self) -> Result<bool> {
        if !self.index.next()? {
            return Ok(false);
        }
        let rid = self.index.data_rid()?;
        self.table.move_to_rid(rid)?;
        Ok(true)
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        self.table.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.table.has_field(field)
    }

    fn close(&mut self) {
        self.index.close();
        self.table.close();
    }
}
