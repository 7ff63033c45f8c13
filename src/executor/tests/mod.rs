//! Тесты для исполнителя запросов

mod aggregation_tests;
mod comparator_tests;

use crate::common::test_utils::TestEnv;
use crate::common::Result;
use crate::query::plan::PlanRef;
use crate::query::table_plan::TablePlan;
use std::sync::Arc;

/// План полного сканирования таблицы тестового окружения
fn table(env: &TestEnv, name: &str) -> Result<PlanRef> {
    Ok(Arc::new(TablePlan::new(env.tx.clone(), name, &env.metadata())?))
}
