//! Планирование одной таблицы запроса
//!
//! `TablePlanner` решает, какая часть общего предиката относится к таблице,
//! можно ли читать ее через индекс и каким способом присоединить ее к уже
//! построенному плану.

use crate::catalog::index::{IndexInfo, IndexKind};
use crate::catalog::metadata::MetadataRef;
use crate::common::Result;
use crate::executor::hash_join::HashJoinPlan;
use crate::executor::index_join::IndexJoinPlan;
use crate::executor::index_select::IndexSelectPlan;
use crate::executor::merge_join::MergeJoinPlan;
use crate::executor::multibuffer_product::MultibufferProductPlan;
use crate::executor::nested_loop::NestedLoopJoinPlan;
use crate::planner::settings::{JoinPolicy, JoinStrategy, PlannerSettings};
use crate::query::plan::PlanRef;
use crate::query::predicate::{CompareOp, Predicate};
use crate::query::select::SelectPlan;
use crate::query::table_plan::TablePlan;
use crate::storage::layout::Schema;
use crate::storage::transaction::TxRef;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Планировщик одной таблицы
pub struct TablePlanner {
    tx: TxRef,
    table: Arc<TablePlan>,
    predicate: Predicate,
    schema: Schema,
    indexes: HashMap<String, IndexInfo>,
    settings: PlannerSettings,
}

impl TablePlanner {
    /// `predicate` относится ко всему запросу
    pub fn new(
        table_name: &str,
        predicate: Predicate,
        tx: TxRef,
        metadata: &MetadataRef,
        settings: PlannerSettings,
    ) -> Result<Self> {
        let table = Arc::new(TablePlan::new(tx.clone(), table_name, metadata)?);
        let schema = table.layout().schema().clone();
        let indexes = metadata.index_info(table_name)?;
        Ok(Self {
            tx,
            table,
            predicate,
            schema,
            indexes,
            settings,
        })
    }

    pub fn table_name(&self) -> &str {
        self.table.table_name()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// План выборки из таблицы, через индекс, если это возможно
    pub fn make_select_plan(&self) -> PlanRef {
        let plan = self
            .make_index_select()
            .unwrap_or_else(|| self.table.clone() as PlanRef);
        self.add_select_pred(plan)
    }

    /// План соединения `current` с таблицей.
    ///
    /// `Ok(None)`, если в предикате нет термов, связывающих таблицу с `current`.
    pub fn make_join_plan(&self, current: &PlanRef) -> Result<Option<PlanRef>> {
        let current_schema = current.schema();
        let join_pred = match self.predicate.join_sub_pred(&self.schema, current_schema) {
            Some(pred) => pred,
            None => return Ok(None),
        };

        let product = self.make_product_join(current);
        if self.settings.join_policy == JoinPolicy::ProductOnly {
            debug!("Таблица {}: политика product_only", self.table_name());
            return Ok(Some(product));
        }

        let mut candidates: Vec<(JoinStrategy, PlanRef)> = Vec::new();
        for strategy in JoinStrategy::ALL {
            if !self.settings.is_enabled(strategy) {
                continue;
            }
            let candidate = match strategy {
                JoinStrategy::Product => Some(product.clone()),
                JoinStrategy::Merge => self.make_merge_join(current, &join_pred)?,
                JoinStrategy::Index => self.make_index_join(current)?,
                JoinStrategy::NestedLoop => Some(self.make_nested_loop_join(current, &join_pred)),
                JoinStrategy::Hash => self.make_hash_join(current, &join_pred)?,
            };
            if let Some(plan) = candidate {
                trace!(
                    "Таблица {}: кандидат {} стоит {} блоков",
                    self.table_name(),
                    strategy,
                    plan.blocks_accessed()
                );
                candidates.push((strategy, plan));
            }
        }

        let mut best: Option<(JoinStrategy, PlanRef, usize)> = None;
        for (strategy, plan) in candidates {
            let cost = plan.blocks_accessed();
            if best.as_ref().is_none_or(|(_, _, best_cost)| cost < *best_cost) {
                best = Some((strategy, plan, cost));
            }
        }

        match best {
            Some((strategy, plan, cost)) => {
                info!(
                    "Таблица {}: выбрано соединение {} ({} блоков)",
                    self.table_name(),
                    strategy,
                    cost
                );
                Ok(Some(plan))
            }
            None => {
                debug!(
                    "Таблица {}: ни одна разрешенная стратегия не применима, используется произведение",
                    self.table_name()
                );
                Ok(Some(product))
            }
        }
    }

    /// Произведение `current` и выборки из таблицы
    pub fn make_product_plan(&self, current: &PlanRef) -> PlanRef {
        let rhs = self.add_select_pred(self.table.clone());
        Arc::new(MultibufferProductPlan::new(self.tx.clone(), current.clone(), rhs))
    }

    fn make_index_select(&self) -> Option<PlanRef> {
        let mut fields: Vec<&String> = self.indexes.keys().collect();
        fields.sort();
        for field in fields {
            let Some(value) = self.predicate.equates_with_constant(field) else {
                continue;
            };
            let index = self.indexes.get(field)?;
            if index.kind() == IndexKind::Hash
                && self
                    .predicate
                    .field_comparators(field)
                    .iter()
                    .any(|op| *op != CompareOp::Eq)
            {
                debug!(
                    "Хеш-индекс {} не подходит для сравнений по {}",
                    index.index_name(),
                    field
                );
                return None;
            }
            debug!("Используется индекс {} по полю {}", index.index_name(), field);
            return Some(Arc::new(IndexSelectPlan::new(
                self.table.clone(),
                index.clone(),
                value.clone(),
            )));
        }
        None
    }

    fn make_index_join(&self, current: &PlanRef) -> Result<Option<PlanRef>> {
        let mut fields: Vec<&String> = self.indexes.keys().collect();
        fields.sort();
        for field in fields {
            let Some(outer_field) = self.predicate.equates_with_field(field) else {
                continue;
            };
            if !current.schema().has_field(outer_field) {
                continue;
            }
            let Some(index) = self.indexes.get(field) else {
                continue;
            };
            let plan: PlanRef = Arc::new(IndexJoinPlan::new(
                current.clone(),
                self.table.clone(),
                index.clone(),
                outer_field,
            )?);
            let plan = self.add_select_pred(plan);
            return Ok(Some(self.add_join_pred(plan, current.schema())));
        }
        Ok(None)
    }

    fn make_product_join(&self, current: &PlanRef) -> PlanRef {
        let plan = self.make_product_plan(current);
        self.add_join_pred(plan, current.schema())
    }

    fn make_merge_join(&self, current: &PlanRef, join_pred: &Predicate) -> Result<Option<PlanRef>> {
        let Some((current_field, table_field)) =
            join_pred.equi_join_fields(current.schema(), &self.schema)
        else {
            return Ok(None);
        };
        let plan: PlanRef = Arc::new(MergeJoinPlan::new(
            self.tx.clone(),
            current.clone(),
            self.table.clone(),
            &current_field,
            &table_field,
        )?);
        let plan = self.add_select_pred(plan);
        Ok(Some(self.add_join_pred(plan, current.schema())))
    }

    /// Курсор вложенных циклов сам проверяет предикат соединения
    fn make_nested_loop_join(&self, current: &PlanRef, join_pred: &Predicate) -> PlanRef {
        let plan: PlanRef = Arc::new(NestedLoopJoinPlan::new(
            self.tx.clone(),
            current.clone(),
            self.table.clone(),
            join_pred.clone(),
        ));
        self.add_select_pred(plan)
    }

    fn make_hash_join(&self, current: &PlanRef, join_pred: &Predicate) -> Result<Option<PlanRef>> {
        let Some((current_field, table_field)) =
            join_pred.equi_join_fields(current.schema(), &self.schema)
        else {
            return Ok(None);
        };
        let plan: PlanRef = Arc::new(HashJoinPlan::new(
            &self.tx,
            current.clone(),
            self.table.clone(),
            &current_field,
            &table_field,
        )?);
        let plan = self.add_select_pred(plan);
        Ok(Some(self.add_join_pred(plan, current.schema())))
    }

    fn add_select_pred(&self, plan: PlanRef) -> PlanRef {
        match self.predicate.select_sub_pred(&self.schema) {
            Some(pred) => Arc::new(SelectPlan::new(plan, pred)),
            None => plan,
        }
    }

    fn add_join_pred(&self, plan: PlanRef, current_schema: &Schema) -> PlanRef {
        match self.predicate.join_sub_pred(current_schema, &self.schema) {
            Some(pred) => Arc::new(SelectPlan::new(plan, pred)),
            None => plan,
        }
    }
}
