//! Соединение слиянием
//!
//! Оба входа сортируются по полям соединения. Группа правых записей с
//! одинаковым ключом повторяется для каждой левой записи с тем же ключом через
//! сохранение и восстановление позиции правого курсора сортировки.

use crate::common::{Error, Result, Value};
use crate::executor::sort::{SortPlan, SortScan};
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::Scan;
use crate::storage::layout::Schema;
use crate::storage::transaction::TxRef;
use std::cmp::Ordering;
use std::sync::Arc;

/// План соединения слиянием
pub struct MergeJoinPlan {
    left: Arc<SortPlan>,
    right: Arc<SortPlan>,
    left_field: String,
    right_field: String,
    schema: Schema,
}

impl MergeJoinPlan {
    pub fn new(
        tx: TxRef,
        left: PlanRef,
        right: PlanRef,
        left_field: &str,
        right_field: &str,
    ) -> Result<Self> {
        let mut schema = Schema::new();
        schema.add_all(left.schema());
        schema.add_all(right.schema());
        let left = SortPlan::on_fields(tx.clone(), left, &[left_field.to_string()])?;
        let right = SortPlan::on_fields(tx, right, &[right_field.to_string()])?;
        Ok(Self {
            left: Arc::new(left),
            right: Arc::new(right),
            left_field: left_field.to_string(),
            right_field: right_field.to_string(),
            schema,
        })
    }
}

impl Plan for MergeJoinPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let left = self.left.open_sorted()?;
        let right = self.right.open_sorted()?;
        Ok(Box::new(MergeJoinScan::new(
            left,
            right,
            &self.left_field,
            &self.right_field,
        )?))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.left
            .blocks_accessed()
            .saturating_add(self.right.blocks_accessed())
    }

    fn records_output(&self) -> usize {
        let max_distinct = self
            .left
            .distinct_values(&self.left_field)
            .max(self.right.distinct_values(&self.right_field))
            .max(1);
        self.left
            .records_output()
            .saturating_mul(self.right.records_output())
            / max_distinct
    }

    fn distinct_values(&self, field: &str) -> usize {
        if self.left.schema().has_field(field) {
            self.left.distinct_values(field)
        } else {
            self.right.distinct_values(field)
        }
    }

    fn describe(&self) -> String {
        format!("MergeJoin({} = {})", self.left_field, self.right_field)
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.left.clone() as PlanRef, self.right.clone() as PlanRef]
    }
}

/// Курсор соединения слиянием
pub struct MergeJoinScan {
    left: SortScan,
    right: SortScan,
    left_field: String,
    right_field: String,
    /// Ключ текущей группы совпадений
    join_value: Option<Value>,
}

impl MergeJoinScan {
    pub fn new(left: SortScan, right: SortScan, left_field: &str, right_field: &str) -> Result<Self> {
        let mut scan = Self {
            left,
            right,
            left_field: left_field.to_string(),
            right_field: right_field.to_string(),
            join_value: None,
        };
        scan.before_first()?;
        Ok(scan)
    }

    fn matches_group(&self, value: &Value) -> bool {
        self.join_value.as_ref() == Some(value)
    }
}

impl Scan for MergeJoinScan {
    fn before_first(&mut self) -> Result<()> {
        self.left.before_first()?;
        self.right.before_first()?;
        self.join_value = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        let mut has_right = self.right.next()?;
        if has_right && self.matches_group(&self.right.get_val(&self.right_field)?) {
            return Ok(true);
        }

        let mut has_left = self.left.next()?;
        if has_left && self.matches_group(&self.left.get_val(&self.left_field)?) {
            self.right.restore_position()?;
            return Ok(true);
        }

        while has_left && has_right {
            let left_value = self.left.get_val(&self.left_field)?;
            let right_value = self.right.get_val(&self.right_field)?;
            match left_value.try_cmp(&right_value)? {
                Ordering::Less => has_left = self.left.next()?,
                Ordering::Greater => has_right = self.right.next()?,
                Ordering::Equal => {
                    self.right.save_position()?;
                    self.join_value = Some(right_value);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        if self.left.has_field(field) {
            self.left.get_val(field)
        } else if self.right.has_field(field) {
            self.right.get_val(field)
        } else {
            Err(Error::field_not_found(field))
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.left.has_field(field) || self.right.has_field(field)
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
    }
}
