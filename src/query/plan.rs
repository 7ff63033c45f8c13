//! Интерфейс планов запросов

use crate::common::Result;
use crate::query::scan::Scan;
use crate::storage::layout::Schema;
use std::fmt::Write;
use std::sync::Arc;

/// Общая ссылка на план
pub type PlanRef = Arc<dyn Plan>;

/// Узел плана: оценки стоимости и фабрика курсоров
pub trait Plan: Send + Sync {
    /// Открывает курсор по плану
    fn open(&self) -> Result<Box<dyn Scan>>;

    /// Схема выходных записей
    fn schema(&self) -> &Schema;

    /// Оценка числа обращений к блокам
    fn blocks_accessed(&self) -> usize;

    /// Оценка числа выходных записей
    fn records_output(&self) -> usize;

    /// Оценка числа различных значений поля в выходе
    fn distinct_values(&self, field: &str) -> usize;

    /// Однострочное описание узла
    fn describe(&self) -> String;

    /// Дочерние планы
    fn children(&self) -> Vec<PlanRef> {
        Vec::new()
    }
}

/// Дерево плана с оценками по узлам
pub fn explain(plan: &dyn Plan) -> String {
    let mut out = String::new();
    explain_into(plan, 0, &mut out);
    out
}

fn explain_into(plan: &dyn Plan, depth: usize, out: &mut String) {
    let _ = writeln!(
        out,
        "{}{} (blocks: {}, records: {})",
        "  ".repeat(depth),
        plan.describe(),
        plan.blocks_accessed(),
        plan.records_output()
    );
    for child in plan.children() {
        explain_into(child.as_ref(), depth + 1, out);
    }
}
