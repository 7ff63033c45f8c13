//! Тесты для планировщика запросов

mod heuristic_tests;
mod query_data_tests;

use crate::query::plan::Plan;

/// Есть ли в дереве плана узел, описание которого начинается с `prefix`
fn contains_node(plan: &dyn Plan, prefix: &str) -> bool {
    plan.describe().starts_with(prefix)
        || plan
            .children()
            .iter()
            .any(|child| contains_node(child.as_ref(), prefix))
}
