//! Проекция на подмножество полей

use crate::common::{Error, Result, Value};
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::Scan;
use crate::storage::layout::Schema;

/// План проекции
pub struct ProjectPlan {
    child: PlanRef,
    schema: Schema,
}

impl ProjectPlan {
    /// Проекция плана на поля; каждое поле должно быть в схеме плана
    pub fn new(child: PlanRef, fields: &[String]) -> Result<Self> {
        let mut schema = Schema::new();
        for field in fields {
            schema.add(field, child.schema())?;
        }
        Ok(Self { child, schema })
    }
}

impl Plan for ProjectPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let scan = self.child.open()?;
        Ok(Box::new(ProjectScan::new(scan, self.schema.fields())))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.child.blocks_accessed()
    }

    fn records_output(&self) -> usize {
        self.child.records_output()
    }

    fn distinct_values(&self, field: &str) -> usize {
        self.child.distinct_values(field)
    }

    fn describe(&self) -> String {
        format!("Project({})", self.schema.fields().join(", "))
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.child.clone()]
    }
}

/// Курсор проекции
pub struct ProjectScan {
    scan: Box<dyn Scan>,
    fields: Vec<String>,
}

impl ProjectScan {
    pub fn new(scan: Box<dyn Scan>, fields: Vec<String>) -> Self {
        Self { scan, fields }
    }
}

impl Scan for ProjectScan {
    fn before_first(&mut self) -> Result<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        self.scan.next()
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        if self.has_field(field) {
            self.scan.get_val(field)
        } else {
            Err(Error::field_not_found(field))
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn close(&mut self) {
        self.scan.close();
    }
}
