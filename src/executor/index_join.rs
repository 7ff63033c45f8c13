//! Соединение через индекс правой таблицы

use crate::catalog::index::{Index, IndexInfo};
use crate::common::{Error, Result, Value};
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::{Scan, UpdateScan};
use crate::query::table_plan::TablePlan;
use crate::storage::layout::Schema;
use crate::storage::table_scan::TableScan;
use std::sync::Arc;

/// План соединения через индекс: для каждой записи левого входа
/// индекс таблицы ищет записи с ключом, равным `join_field`
pub struct IndexJoinPlan {
    lhs: PlanRef,
    table: Arc<TablePlan>,
    index: IndexInfo,
    join_field: String,
    schema: Schema,
}

impl IndexJoinPlan {
    pub fn new(
        lhs: PlanRef,
        table: Arc<TablePlan>,
        index: IndexInfo,
        join_field: &str,
    ) -> Result<Self> {
        if !lhs.schema().has_field(join_field) {
            return Err(Error::field_not_found(join_field));
        }
        let mut schema = Schema::new();
        schema.add_all(lhs.schema());
        schema.add_all(table.schema());
        Ok(Self {
            lhs,
            table,
            index,
            join_field: join_field.to_string(),
            schema,
        })
    }
}

impl Plan for IndexJoinPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let lhs = self.lhs.open()?;
        let table = self.table.open_table_scan()?;
        let index = self.index.open();
        Ok(Box::new(IndexJoinScan::new(
            lhs,
            index,
            &self.join_field,
            table,
        )?))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.lhs
            .blocks_accessed()
            .saturating_add(
                self.lhs
                    .records_output()
                    .saturating_mul(self.index.blocks_accessed()),
            )
            .saturating_add(self.records_output())
    }

    fn records_output(&self) -> usize {
        self.lhs
            .records_output()
            .saturating_mul(self.index.records_output())
    }

    fn distinct_values(&self, field: &str) -> usize {
        if self.lhs.schema().has_field(field) {
            self.lhs.distinct_values(field)
        } else {
            self.table.distinct_values(field)
        }
    }

    fn describe(&self) -> String {
        format!(
            "IndexJoin({} = {} via {})",
            self.join_field,
            self.index.field_name(),
            self.index.index_name()
        )
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.lhs.clone(), self.table.clone() as PlanRef]
    }
}

/// Курсор соединения через индекс
pub struct IndexJoinScan {
    lhs: Box<dyn Scan>,
    index: Box<dyn Index>,
    join_field: String,
    table: TableScan,
    has_lhs: bool,
}

impl IndexJoinScan {
    pub fn new(
        lhs: Box<dyn Scan>,
        index: Box<dyn Index>,
        join_field: &str,
        table: TableScan,
    ) -> Result<Self> {
        let mut scan = Self {
            lhs,
            index,
            join_field: join_field.to_string(),
            table,
            has_lhs: false,
        };
        scan.before_first()?;
        Ok(scan)
    }

    fn reset_index(&mut self) -> Result<()> {
        let key = self.lhs.get_val(&self.join_field)?;
        self.index.before_first(&key)
    }
}

impl Scan for IndexJoinScan {
    fn before_first(&mut self) -> Result<()> {
        self.lhs.before_first()?;
        self.has_lhs = self.lhs.next()?;
        if self.has_lhs {
            self.reset_index()?;
        }
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        while self.has_lhs {
            if self.index.next()? {
                let rid = self.index.data_rid()?;
                self.table.move_to_rid(rid)?;
                return Ok(true);
            }
            self.has_lhs = self.lhs.next()?;
            if self.has_lhs {
                self.reset_index()?;
            }
        }
        Ok(false)
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        if self.table.has_field(field) {
            self.table.get_val(field)
        } else {
            self.lhs.get_val(field)
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.table.has_field(field) || self.lhs.has_field(field)
    }

    fn close(&mut self) {
        self.lhs.close();
        self.index.close();
        self.table.close();
    }
}
