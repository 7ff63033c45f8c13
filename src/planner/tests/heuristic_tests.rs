//! Тесты для эвристического планировщика на учебной базе

use super::contains_node;
use crate::common::test_utils::run_plan;
use crate::common::{EngineConfig, Error, Result, Row, Value};
use crate::demo::{sample_queries, DemoDatabase};
use crate::executor::comparator::SortKey;
use crate::planner::query_data::QueryData;
use crate::planner::settings::{JoinStrategy, PlannerSettings};
use crate::query::predicate::Term;

fn demo() -> DemoDatabase {
    DemoDatabase::load(&EngineConfig::default()).expect("demo database loads")
}

fn run(db: &DemoDatabase, settings: PlannerSettings, query: &QueryData) -> Result<Vec<Row>> {
    let plan = db.planner(settings).create_plan(query)?;
    run_plan(plan.as_ref())
}

fn column(rows: &[Row], field: &str) -> Vec<Value> {
    rows.iter().map(|r| r.value(field).unwrap().clone()).collect()
}

fn query(name: &str) -> QueryData {
    sample_queries()
        .into_iter()
        .find(|q| q.name == name)
        .map(|q| q.query)
        .expect("sample query exists")
}

#[test]
fn test_graduates_use_hash_index() -> Result<()> {
    let db = demo();
    let plan = db
        .planner(PlannerSettings::default())
        .create_plan(&query("graduates_of_2020"))?;
    assert!(contains_node(plan.as_ref(), "IndexSelect(gradyear_idx"));
    let rows = run_plan(plan.as_ref())?;
    assert_eq!(
        column(&rows, "sid"),
        vec![Value::Int(2), Value::Int(5), Value::Int(6)]
    );
    assert_eq!(plan.schema().fields(), vec!["sid", "sname"]);
    Ok(())
}

#[test]
fn test_students_with_departments() -> Result<()> {
    let db = demo();
    let rows = run(&db, PlannerSettings::default(), &query("students_with_departments"))?;
    assert_eq!(rows.len(), 9);
    assert_eq!(rows[0].value("sname")?, &Value::from("amy"));
    assert_eq!(rows[0].value("dname")?, &Value::from("math"));
    assert_eq!(rows[8].value("sname")?, &Value::from("sue"));
    Ok(())
}

#[test]
fn test_majors_statistics() -> Result<()> {
    let db = demo();
    let rows = run(&db, PlannerSettings::default(), &query("majors_statistics"))?;
    assert_eq!(column(&rows, "majorid"), vec![Value::Int(10), Value::Int(20), Value::Int(30)]);
    assert_eq!(column(&rows, "countofsid"), vec![Value::Int(3), Value::Int(4), Value::Int(2)]);
    assert_eq!(
        column(&rows, "avgofgradyear"),
        vec![Value::Int(2021), Value::Int(2020), Value::Int(2020)]
    );
    assert_eq!(
        column(&rows, "maxofsname"),
        vec![Value::from("max"), Value::from("sue"), Value::from("bob")]
    );
    Ok(())
}

#[test]
fn test_distinct_graduation_years() -> Result<()> {
    let db = demo();
    let rows = run(&db, PlannerSettings::default(), &query("graduation_years"))?;
    assert_eq!(
        column(&rows, "gradyear"),
        vec![Value::Int(2022), Value::Int(2021), Value::Int(2020), Value::Int(2019)]
    );
    Ok(())
}

#[test]
fn test_three_way_join() -> Result<()> {
    let db = demo();
    let rows = run(&db, PlannerSettings::default(), &query("courses_of_recent_students"))?;
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].value("sname")?, &Value::from("art"));
    assert_eq!(rows[0].value("dname")?, &Value::from("drama"));
    assert_eq!(rows[0].value("title")?, &Value::from("acting"));
    Ok(())
}

#[test]
fn test_results_independent_of_join_strategy() -> Result<()> {
    let db = demo();
    let mut settings = vec![PlannerSettings::product_only()];
    settings.extend(JoinStrategy::ALL.iter().map(|s| PlannerSettings::only(&[*s])));
    for sample in sample_queries() {
        let expected = run(&db, PlannerSettings::default(), &sample.query)?;
        for setting in &settings {
            let actual = run(&db, setting.clone(), &sample.query)?;
            assert_eq!(actual, expected, "{} with {:?}", sample.name, setting);
        }
    }
    Ok(())
}

#[test]
fn test_tables_without_join_predicate_form_product() -> Result<()> {
    let db = demo();
    let query = QueryData::new(["dept", "course"]).select(["dname", "title"]);
    let plan = db.planner(PlannerSettings::default()).create_plan(&query)?;
    assert!(contains_node(plan.as_ref(), "MultibufferProduct"));
    assert_eq!(run_plan(plan.as_ref())?.len(), 18);
    Ok(())
}

#[test]
fn test_nested_loop_outer_is_smaller_table() -> Result<()> {
    let db = demo();
    let query = QueryData::new(["student", "dept"]).filter(Term::fields_equal("majorid", "did"));
    let plan = db
        .planner(PlannerSettings::only(&[JoinStrategy::NestedLoop]))
        .create_plan(&query)?;
    let children = plan.children();
    let outer = children.first().expect("join has inputs");
    assert!(outer.schema().has_field("did"));
    Ok(())
}

#[test]
fn test_planning_errors() {
    let db = demo();
    let planner = db.planner(PlannerSettings::default());

    let unknown = QueryData::new(["nobody"]);
    assert!(matches!(
        planner.create_plan(&unknown),
        Err(Error::QueryPlanning { .. })
    ));

    let bad_order = QueryData::new(["student"])
        .select(["sname"])
        .order_by(SortKey::asc("gradyear"));
    assert!(matches!(
        planner.create_plan(&bad_order),
        Err(Error::FieldNotFound { .. })
    ));

    let ungrouped = QueryData::new(["student"]).select(["sname"]).group_by(["majorid"]);
    assert!(matches!(
        planner.create_plan(&ungrouped),
        Err(Error::Validation { .. })
    ));
}
