//! Декартово произведение двух входов

use crate::common::{Error, Result, Value};
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::Scan;
use crate::storage::layout::Schema;

/// План произведения: правый вход пересканируется для каждой левой записи
pub struct ProductPlan {
    left: PlanRef,
    right: PlanRef,
    schema: Schema,
}

impl ProductPlan {
    pub fn new(left: PlanRef, right: PlanRef) -> Self {
        let mut schema = Schema::new();
        schema.add_all(left.schema());
        schema.add_all(right.schema());
        Self {
            left,
            right,
            schema,
        }
    }
}

impl Plan for ProductPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let left = self.left.open()?;
        let right = self.right.open()?;
        Ok(Box::new(ProductScan::new(left, right)?))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.left.blocks_accessed().saturating_add(
            self.left
                .records_output()
                .saturating_mul(self.right.blocks_accessed()),
        )
    }

    fn records_output(&self) -> usize {
        self.left
            .records_output()
            .saturating_mul(self.right.records_output())
    }

    fn distinct_values(&self, field: &str) -> usize {
        if self.left.schema().has_field(field) {
            self.left.distinct_values(field)
        } else {
            self.right.distinct_values(field)
        }
    }

    fn describe(&self) -> String {
        "Product".to_string()
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.left.clone(), self.right.clone()]
    }
}

/// Курсор произведения
pub struct ProductScan {
    left: Box<dyn Scan>,
    right: Box<dyn Scan>,
    left_valid: bool,
}

impl ProductScan {
    pub fn new(left: Box<dyn Scan>, right: Box<dyn Scan>) -> Result<Self> {
        let mut scan = Self {
            left,
            right,
            left_valid: false,
        };
        scan.before_first()?;
        Ok(scan)
    }
}

impl Scan for ProductScan {
    fn before_first(&mut self) -> Result<()> {
        self.left.before_first()?;
        self.left_valid = self.left.next()?;
        self.right.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        if !self.left_valid {
            return Ok(false);
        }
        if self.right.next()? {
            return Ok(true);
        }
        self.right.before_first()?;
        self.left_valid = self.left.next()?;
        if !self.left_valid {
            return Ok(false);
        }
        self.right.next()
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
