//! Эвристический планировщик всего запроса
//!
//! Порядок соединений выбирается жадно: сначала таблица с наименьшим выходом,
//! затем на каждом шаге присоединяется таблица, дающая наименьший выход.
//! Таблицы, не связанные предикатом с уже построенным планом, добавляются
//! произведением. Поверх соединений строятся группировка, проекция,
//! устранение дубликатов и сортировка.

use crate::catalog::metadata::MetadataRef;
use crate::common::{Error, Result};
use crate::executor::distinct::DistinctPlan;
use crate::executor::group_by::GroupByPlan;
use crate::executor::sort::SortPlan;
use crate::planner::query_data::QueryData;
use crate::planner::settings::PlannerSettings;
use crate::planner::table_planner::TablePlanner;
use crate::query::plan::PlanRef;
use crate::query::project::ProjectPlan;
use crate::storage::transaction::TxRef;
use std::sync::Arc;
use tracing::{debug, info};

/// Планировщик запросов
pub struct HeuristicQueryPlanner {
    tx: TxRef,
    metadata: MetadataRef,
    settings: PlannerSettings,
}

impl HeuristicQueryPlanner {
    pub fn new(tx: TxRef, metadata: MetadataRef) -> Self {
        Self::with_settings(tx, metadata, PlannerSettings::default())
    }

    pub fn with_settings(tx: TxRef, metadata: MetadataRef, settings: PlannerSettings) -> Self {
        Self {
            tx,
            metadata,
            settings,
        }
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Строит дерево планов запроса
    pub fn create_plan(&self, query: &QueryData) -> Result<PlanRef> {
        query.validate()?;
        debug!("Планирование запроса: {}", query);

        let mut planners = query
            .tables
            .iter()
            .map(|table| {
                TablePlanner::new(
                    table,
                    query.predicate.clone(),
                    self.tx.clone(),
                    &self.metadata,
                    self.settings.clone(),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let mut current = self.lowest_select_plan(&mut planners)?;
        while !planners.is_empty() {
            current = match self.lowest_join_plan(&mut planners, &current)? {
                Some(plan) => plan,
                None => self.lowest_product_plan(&mut planners, &current)?,
            };
        }

        if !query.group_fields.is_empty() || !query.aggregations.is_empty() {
            current = Arc::new(GroupByPlan::new(
                self.tx.clone(),
                current,
                query.group_fields.clone(),
                query.aggregations.clone(),
            )?);
        }

        if !query.fields.is_empty() {
            current = Arc::new(ProjectPlan::new(current, &query.output_fields())?);
        }

        if query.distinct {
            current = Arc::new(DistinctPlan::new(self.tx.clone(), current, Vec::new())?);
        }

        if !query.order_by.is_empty() {
            current = Arc::new(SortPlan::new(
                self.tx.clone(),
                current,
                query.order_by.clone(),
            )?);
        }

        info!(
            "План построен: {} блоков, {} записей",
            current.blocks_accessed(),
            current.records_output()
        );
        Ok(current)
    }

    fn lowest_select_plan(&self, planners: &mut Vec<TablePlanner>) -> Result<PlanRef> {
        let mut best: Option<(usize, PlanRef)> = None;
        for (i, planner) in planners.iter().enumerate() {
            let plan = planner.make_select_plan();
            if best
                .as_ref()
                .is_none_or(|(_, b)| plan.records_output() < b.records_output())
            {
                best = Some((i, plan));
            }
        }
        let (index, plan) = best.ok_or_else(|| Error::query_planning("query has no tables"))?;
        let planner = planners.remove(index);
        debug!("Первая таблица: {}", planner.table_name());
        Ok(plan)
    }

    fn lowest_join_plan(
        &self,
        planners: &mut Vec<TablePlanner>,
        current: &PlanRef,
    ) -> Result<Option<PlanRef>> {
        let mut best: Option<(usize, PlanRef)> = None;
        for (i, planner) in planners.iter().enumerate() {
            if let Some(plan) = planner.make_join_plan(current)? {
                if best
                    .as_ref()
                    .is_none_or(|(_, b)| plan.records_output() < b.records_output())
                {
                    best = Some((i, plan));
                }
            }
        }
        Ok(best.map(|(index, plan)| {
            let planner = planners.remove(index);
            debug!("Присоединена таблица {}", planner.table_name());
            plan
        }))
    }

    fn lowest_product_plan(
        &self,
        planners: &mut Vec<TablePlanner>,
        current: &PlanRef,
    ) -> Result<PlanRef> {
        let mut best: Option<(usize, PlanRef)> = None;
        for (i, planner) in planners.iter().enumerate() {
            let plan = planner.make_product_plan(current);
            if best
                .as_ref()
                .is_none_or(|(_, b)| plan.records_output() < b.records_output())
            {
                best = Some((i, plan));
            }
        }
        let (index, plan) =
            best.ok_or_else(|| Error::query_planning("no table left for a product"))?;
        let planner = planners.remove(index);
        debug!("Таблица {} добавлена произведением", planner.table_name());
        Ok(plan)
    }
}
