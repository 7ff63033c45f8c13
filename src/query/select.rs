//! Выборка записей по предикату

use crate::common::{Result, Value};
use crate::query::plan::{Plan, PlanRef};
use crate::query::predicate::Predicate;
use crate::query::scan::Scan;
use crate::storage::layout::Schema;

/// План выборки
pub struct SelectPlan {
    child: PlanRef,
    predicate: Predicate,
}

impl SelectPlan {
    pub fn new(child: PlanRef, predicate: Predicate) -> Self {
        Self { child, predicate }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl Plan for SelectPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let scan = self.child.open()?;
        Ok(Box::new(SelectScan::new(scan, self.predicate.clone())))
    }

    fn schema(&self) -> &Schema {
        self.child.schema()
    }

    fn blocks_accessed(&self) -> usize {
        self.child.blocks_accessed()
    }

    fn records_output(&self) -> usize {
        self.child.records_output() / self.predicate.reduction_factor(self.child.as_ref())
    }

    fn distinct_values(&self, field: &str) -> usize {
        if self.predicate.equates_with_constant(field).is_some() {
            1
        } else if let Some(other) = self.predicate.equates_with_field(field) {
            self.child
                .distinct_values(field)
                .min(self.child.distinct_values(other))
        } else {
            self.child.distinct_values(field)
        }
    }

    fn describe(&self) -> String {
        format!("Select({})", self.predicate)
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.child.clone()]
    }
}

/// Курсор выборки: пропускает записи, не удовлетворяющие предикату
pub struct SelectScan {
    scan: Box<dyn Scan>,
    predicate: Predicate,
}

impl SelectScan {
    pub fn new(scan: Box<dyn Scan>, predicate: Predicate) -> Self {
        Self { scan, predicate }
    }
}

impl Scan for SelectScan {
    fn before_first(&mut self) -> Result<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        while self.scan.next()? {
            if self.predicate.is_satisfied(self.scan.as_ref())? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        self.scan.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.scan.has_field(field)
    }

    fn close(&mut self) {
        self.scan.close();
    }
}
