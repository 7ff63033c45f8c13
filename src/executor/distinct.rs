//! Устранение дубликатов внешней сортировкой
//!
//! Вход разбивается на упорядоченные серии. Если серия одна, отдельный проход
//! удаляет из нее дубликаты; иначе серии сливаются попарно с отбрасыванием
//! записей, ключ которых равен последнему выданному в этом слиянии. Выход
//! упорядочен по ключу по возрастанию, по одной записи на ключ.

use crate::common::{Error, Result};
use crate::executor::comparator::RecordComparator;
use crate::executor::materialize::{MaterializePlan, TempTableScan};
use crate::executor::runs::{merge_until, remove_duplicates, split_into_runs, MergeMode};
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::Scan;
use crate::storage::layout::Schema;
use crate::storage::temp_table::TempTable;
use crate::storage::transaction::TxRef;
use tracing::debug;

/// План устранения дубликатов
pub struct DistinctPlan {
    tx: TxRef,
    src: PlanRef,
    comparator: RecordComparator,
}

impl DistinctPlan {
    /// Создает план по ключевым полям; пустой список означает все поля входа
    pub fn new(tx: TxRef, src: PlanRef, fields: Vec<String>) -> Result<Self> {
        let fields = if fields.is_empty() {
            src.schema().fields()
        } else {
            fields
        };
        for field in &fields {
            if !src.schema().has_field(field) {
                return Err(Error::field_not_found(field));
            }
        }
        Ok(Self {
            tx,
            src,
            comparator: RecordComparator::on_fields(&fields),
        })
    }

    /// Ключевые поля
    pub fn fields(&self) -> Vec<String> {
        self.comparator.fields()
    }

    fn deduplicate(&self, runs: Vec<TempTable>) -> Result<TempTable> {
        let mut runs = match runs.len() {
            0 => return Ok(TempTable::new(self.tx.clone(), self.src.schema().clone())),
            1 => {
                debug!("Одна серия: отдельный проход удаления дубликатов");
                vec![remove_duplicates(&self.tx, &runs[0], &self.comparator)?]
            }
            _ => merge_until(&self.tx, runs, 1, &self.comparator, MergeMode::Deduplicate)?,
        };
        runs.pop()
            .ok_or_else(|| Error::query_execution("distinct merge produced no run"))
    }
}

impl Plan for DistinctPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let mut src = self.src.open()?;
        let runs = split_into_runs(&self.tx, src.as_mut(), self.src.schema(), &self.comparator)?;
        src.close();
        let result = self.deduplicate(runs)?;
        Ok(Box::new(TempTableScan::new(result)?))
    }

    fn schema(&self) -> &Schema {
        self.src.schema()
    }

    /// Стоимость материализации входа, без учета сортировки
    fn blocks_accessed(&self) -> usize {
        MaterializePlan::materialized_blocks(&self.tx, self.src.as_ref())
    }

    fn records_output(&self) -> usize {
        self.src.records_output()
    }

    fn distinct_values(&self, field: &str) -> usize {
        self.src.distinct_values(field)
    }

    fn describe(&self) -> String {
        format!("Distinct({})", self.comparator.fields().join(", "))
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.src.clone()]
    }
}
