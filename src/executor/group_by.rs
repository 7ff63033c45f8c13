//! Группировка с агрегатными функциями

use crate::common::{Error, FieldType, Result, Value};
use crate::executor::aggregation::{AggregationFn, AggregationSpec};
use crate::executor::comparator::RecordComparator;
use crate::executor::sort::SortPlan;
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::Scan;
use crate::storage::layout::Schema;
use crate::storage::transaction::TxRef;
use std::cmp::Ordering;
use std::sync::Arc;

/// План группировки: сортирует вход по полям группы и агрегирует группы
pub struct GroupByPlan {
    src: PlanRef,
    group_fields: Vec<String>,
    aggregations: Vec<AggregationSpec>,
    schema: Schema,
}

impl GroupByPlan {
    /// Создает план; без полей группы весь вход образует одну группу
    pub fn new(
        tx: TxRef,
        src: PlanRef,
        group_fields: Vec<String>,
        aggregations: Vec<AggregationSpec>,
    ) -> Result<Self> {
        let mut schema = Schema::new();
        for field in &group_fields {
            schema.add(field, src.schema())?;
        }
        for spec in &aggregations {
            let source = src
                .schema()
                .field_info(&spec.field)
                .ok_or_else(|| Error::field_not_found(&spec.field))?;
            let output = spec.output_field_name();
            if spec.create().is_always_integer() {
                schema.add_int_field(&output);
            } else {
                match source.field_type {
                    FieldType::Integer => schema.add_int_field(&output),
                    FieldType::Varchar => schema.add_string_field(&output, source.length),
                }
            }
        }

        let src: PlanRef = if group_fields.is_empty() {
            src
        } else {
            Arc::new(SortPlan::on_fields(tx, src, &group_fields)?)
        };

        Ok(Self {
            src,
            group_fields,
            aggregations,
            schema,
        })
    }

    pub fn group_fields(&self) -> &[String] {
        &self.group_fields
    }

    pub fn aggregations(&self) -> &[AggregationSpec] {
        &self.aggregations
    }
}

impl Plan for GroupByPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let scan = self.src.open()?;
        Ok(Box::new(GroupByScan::new(
            scan,
            self.group_fields.clone(),
            &self.aggregations,
        )?))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.src.blocks_accessed()
    }

    /// Произведение числа различных значений полей группы, не больше входа
    fn records_output(&self) -> usize {
        if self.group_fields.is_empty() {
            return 1;
        }
        let groups = self
            .group_fields
            .iter()
            .fold(1usize, |acc, f| acc.saturating_mul(self.src.distinct_values(f)));
        groups.min(self.src.records_output()).max(1)
    }

    fn distinct_values(&self, field: &str) -> usize {
        if self.schema.has_field(field) && self.group_fields.iter().any(|f| f == field) {
            self.src.distinct_values(field)
        } else {
            self.records_output()
        }
    }

    fn describe(&self) -> String {
        let aggs: Vec<String> = self.aggregations.iter().map(|a| a.to_string()).collect();
        format!(
            "GroupBy([{}]; {})",
            self.group_fields.join(", "),
            aggs.join(", ")
        )
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.src.clone()]
    }
}

/// Курсор группировки по отсортированному входу
pub struct GroupByScan {
    scan: Box<dyn Scan>,
    group_fields: Vec<String>,
    comparator: RecordComparator,
    functions: Vec<Box<dyn AggregationFn>>,
    group_key: Option<Vec<Value>>,
    more_groups: bool,
}

impl GroupByScan {
    /// Создает курсор со свежими экземплярами агрегатных функций
    pub fn new(
        scan: Box<dyn Scan>,
        group_fields: Vec<String>,
        aggregations: &[AggregationSpec],
    ) -> Result<Self> {
        let comparator = RecordComparator::on_fields(&group_fields);
        let mut group_scan = Self {
            scan,
            group_fields,
            comparator,
            functions: aggregations.iter().map(AggregationSpec::create).collect(),
            group_key: None,
            more_groups: false,
        };
        group_scan.before_first()?;
        Ok(group_scan)
    }
}

impl Scan for GroupByScan {
    fn before_first(&mut self) -> Result<()> {
        self.scan.before_first()?;
        self.group_key = None;
        self.more_groups = self.scan.next()?;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if !self.more_groups {
            self.group_key = None;
            return Ok(false);
        }
        for function in &mut self.functions {
            function.process_first(self.scan.as_ref())?;
        }
        let key = self.comparator.key_of(self.scan.as_ref())?;

        loop {
            self.more_groups = self.scan.next()?;
            if !self.more_groups {
                break;
            }
            let next_key = self.comparator.key_of(self.scan.as_ref())?;
            if self.comparator.compare_keys(&key, &next_key)? != Ordering::Equal {
                break;
            }
            for function in &mut self.functions {
                function.process_next(self.scan.as_ref())?;
            }
        }

        self.group_key = Some(key);
        Ok(true)
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        let key = self
            .group_key
            .as_ref()
            .ok_or_else(|| Error::query_execution("group scan is not positioned on a group"))?;
        if let Some(index) = self.group_fields.iter().position(|f| f == field) {
            return key
                .get(index)
                .cloned()
                .ok_or_else(|| Error::field_not_found(field));
        }
        self.functions
            .iter()
            .find(|function| function.output_field_name() == field)
            .ok_or_else(|| Error::field_not_found(field))?
            .value()
    }

    fn has_field(&self, field: &str) -> bool {
        self.group_fields.iter().any(|f| f == field)
            || self
                .functions
                .iter()
                .any(|function| function.output_field_name() == field)
    }

    fn close(&mut self) {
        self.scan.close();
    }
}
