//! Общие утилиты для интеграционных тестов

use rustdb_query::common::{EngineConfig, Result, Row, Value};
use rustdb_query::demo::{run_plan, DemoDatabase};
use rustdb_query::planner::{PlannerSettings, QueryData};

/// Конфигурация с маленькими блоками и пулом, чтобы таблицы занимали много блоков
pub fn small_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.storage.block_size = 128;
    config.storage.buffer_pool_size = 6;
    config
}

/// Учебная база с дополнительными студентами
pub fn load_demo(config: &EngineConfig, extra_students: usize) -> DemoDatabase {
    DemoDatabase::load_with_extra_students(config, extra_students).expect("demo database loads")
}

/// Планирует и выполняет запрос
pub fn execute(db: &DemoDatabase, settings: PlannerSettings, query: &QueryData) -> Result<Vec<Row>> {
    let plan = db.planner(settings).create_plan(query)?;
    run_plan(plan.as_ref())
}

/// Значения поля по всем записям
pub fn column(rows: &[Row], field: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| row.value(field).expect("field present").clone())
        .collect()
}
