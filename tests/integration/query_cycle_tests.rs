//! Полный цикл запроса на учебной базе

use super::common::{column, execute, load_demo, small_config};
use rustdb_query::common::{EngineConfig, Result, Value};
use rustdb_query::demo::sample_queries;
use rustdb_query::executor::{AggregationSpec, SortKey};
use rustdb_query::planner::{PlannerSettings, QueryData};
use rustdb_query::query::plan::explain;
use rustdb_query::query::predicate::Term;

#[test]
fn test_sample_queries_run() -> Result<()> {
    let db = load_demo(&EngineConfig::default(), 0);
    for sample in sample_queries() {
        let rows = execute(&db, PlannerSettings::default(), &sample.query)?;
        assert!(!rows.is_empty(), "{} returned no rows", sample.name);
    }
    Ok(())
}

#[test]
fn test_join_with_generated_students() -> Result<()> {
    let db = load_demo(&small_config(), 120);
    let query = QueryData::new(["student", "dept"])
        .select(["sid", "dname"])
        .filter(Term::fields_equal("majorid", "did"))
        .order_by(SortKey::asc("sid"));
    let rows = execute(&db, PlannerSettings::default(), &query)?;
    let sids = column(&rows, "sid");
    assert_eq!(sids.len(), 129);
    assert_eq!(sids.first(), Some(&Value::Int(1)));
    assert_eq!(sids.last(), Some(&Value::Int(129)));
    Ok(())
}

#[test]
fn test_group_and_order_on_generated_data() -> Result<()> {
    let db = load_demo(&small_config(), 60);
    let query = QueryData::new(["student"])
        .select(["majorid", "countofsid"])
        .group_by(["majorid"])
        .aggregate(AggregationSpec::count("sid"))
        .order_by(SortKey::desc("countofsid"));
    let rows = execute(&db, PlannerSettings::default(), &query)?;
    let counts: Vec<i32> = column(&rows, "countofsid")
        .iter()
        .map(|v| v.as_int().expect("count is int"))
        .collect();
    assert_eq!(counts.iter().sum::<i32>(), 69);
    assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    Ok(())
}

#[test]
fn test_execution_releases_resources() -> Result<()> {
    let config = small_config();
    let db = load_demo(&config, 80);
    for sample in sample_queries() {
        execute(&db, PlannerSettings::default(), &sample.query)?;
    }
    assert_eq!(db.tx().available_buffers(), config.storage.buffer_pool_size);
    let leftovers: Vec<String> = db
        .engine()
        .file_names()
        .into_iter()
        .filter(|name| name.starts_with("temp"))
        .collect();
    assert!(leftovers.is_empty(), "temporary files left: {:?}", leftovers);
    Ok(())
}

#[test]
fn test_explain_shows_estimates() -> Result<()> {
    let db = load_demo(&EngineConfig::default(), 0);
    for sample in sample_queries() {
        let plan = db
            .planner(PlannerSettings::default())
            .create_plan(&sample.query)?;
        let text = explain(plan.as_ref());
        assert!(text.lines().count() >= 2, "{}", sample.name);
        assert!(text.lines().all(|line| line.contains("(blocks: ")));
    }
    Ok(())
}
