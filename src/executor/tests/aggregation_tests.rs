//! Тесты для агрегатных функций и группировки

use super::table;
use crate::common::test_utils::{int_rows, int_schema, row, run_plan, TestEnv};
use crate::common::{Error, FieldType, Result, Row, Value};
use crate::executor::aggregation::{AggregationFn, AggregationSpec};
use crate::executor::group_by::GroupByPlan;
use crate::query::plan::Plan;
use crate::storage::layout::Schema;
use std::collections::BTreeMap;

fn majors_env() -> Result<TestEnv> {
    let env = TestEnv::small();
    env.load_table(
        "enroll",
        int_schema(&["major", "sid"]),
        &int_rows(&["major", "sid"], &[vec![10, 1], vec![20, 5], vec![10, 3]]),
    )?;
    Ok(env)
}

fn per_group(rows: &[Row], field: &str) -> BTreeMap<i32, i32> {
    rows.iter()
        .map(|r| {
            (
                r.value("major").unwrap().as_int().unwrap(),
                r.value(field).unwrap().as_int().unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_group_by_count_sum_avg() -> Result<()> {
    let env = majors_env()?;
    let plan = GroupByPlan::new(
        env.tx.clone(),
        table(&env, "enroll")?,
        vec!["major".to_string()],
        vec![
            AggregationSpec::count("sid"),
            AggregationSpec::sum("sid"),
            AggregationSpec::avg("sid"),
        ],
    )?;
    assert_eq!(
        plan.schema().fields(),
        vec!["major", "countofsid", "sumofsid", "avgofsid"]
    );

    let rows = run_plan(&plan)?;
    assert_eq!(rows.len(), 2);
    assert_eq!(per_group(&rows, "countofsid"), BTreeMap::from([(10, 2), (20, 1)]));
    assert_eq!(per_group(&rows, "sumofsid"), BTreeMap::from([(10, 4), (20, 5)]));
    assert_eq!(per_group(&rows, "avgofsid"), BTreeMap::from([(10, 2), (20, 5)]));
    Ok(())
}

#[test]
fn test_group_by_rescan_resets_state() -> Result<()> {
    let env = majors_env()?;
    let plan = GroupByPlan::new(
        env.tx.clone(),
        table(&env, "enroll")?,
        vec!["major".to_string()],
        vec![AggregationSpec::sum("sid")],
    )?;
    let mut scan = plan.open()?;
    let mut first = Vec::new();
    while scan.next()? {
        first.push(scan.get_int("sumofsid")?);
    }
    scan.before_first()?;
    let mut second = Vec::new();
    while scan.next()? {
        second.push(scan.get_int("sumofsid")?);
    }
    assert_eq!(first, vec![4, 5]);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_distinct_aggregations() -> Result<()> {
    let env = TestEnv::small();
    env.load_table(
        "t",
        int_schema(&["g", "v"]),
        &int_rows(&["g", "v"], &[vec![1, 2], vec![1, 2], vec![1, 4], vec![1, 5]]),
    )?;
    let plan = GroupByPlan::new(
        env.tx.clone(),
        table(&env, "t")?,
        vec!["g".to_string()],
        vec![
            AggregationSpec::count("v").distinct(),
            AggregationSpec::sum("v").distinct(),
            AggregationSpec::avg("v").distinct(),
        ],
    )?;
    let rows = run_plan(&plan)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value("countofv")?, &Value::Int(3));
    assert_eq!(rows[0].value("sumofv")?, &Value::Int(11));
    assert_eq!(rows[0].value("avgofv")?, &Value::Int(3));
    Ok(())
}

#[test]
fn test_min_max_over_strings() -> Result<()> {
    let env = TestEnv::small();
    let mut schema = Schema::new();
    schema.add_int_field("g");
    schema.add_string_field("name", 6);
    let rows: Vec<Row> = [(1, "kim"), (1, "amy"), (2, "sue"), (1, "pat")]
        .iter()
        .map(|(g, name)| row(&[("g", Value::Int(*g)), ("name", Value::from(*name))]))
        .collect();
    env.load_table("people", schema, &rows)?;

    let plan = GroupByPlan::new(
        env.tx.clone(),
        table(&env, "people")?,
        vec!["g".to_string()],
        vec![AggregationSpec::min("name"), AggregationSpec::max("name")],
    )?;
    assert_eq!(plan.schema().field_type("minofname")?, FieldType::Varchar);

    let rows = run_plan(&plan)?;
    assert_eq!(rows[0].value("minofname")?, &Value::from("amy"));
    assert_eq!(rows[0].value("maxofname")?, &Value::from("pat"));
    assert_eq!(rows[1].value("minofname")?, &Value::from("sue"));
    Ok(())
}

#[test]
fn test_group_by_without_group_fields() -> Result<()> {
    let env = majors_env()?;
    let plan = GroupByPlan::new(
        env.tx.clone(),
        table(&env, "enroll")?,
        Vec::new(),
        vec![AggregationSpec::count("sid"), AggregationSpec::max("sid")],
    )?;
    assert_eq!(plan.records_output(), 1);
    let rows = run_plan(&plan)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value("countofsid")?, &Value::Int(3));
    assert_eq!(rows[0].value("maxofsid")?, &Value::Int(5));
    Ok(())
}

#[test]
fn test_group_by_empty_input() -> Result<()> {
    let env = TestEnv::small();
    env.load_table("t", int_schema(&["g", "v"]), &[])?;
    let plan = GroupByPlan::new(
        env.tx.clone(),
        table(&env, "t")?,
        vec!["g".to_string()],
        vec![AggregationSpec::sum("v")],
    )?;
    assert!(run_plan(&plan)?.is_empty());
    assert!(plan.records_output() >= 1);
    Ok(())
}

#[test]
fn test_group_by_unknown_field() -> Result<()> {
    let env = majors_env()?;
    let result = GroupByPlan::new(
        env.tx.clone(),
        table(&env, "enroll")?,
        vec!["major".to_string()],
        vec![AggregationSpec::sum("missing")],
    );
    assert!(matches!(result, Err(Error::FieldNotFound { .. })));
    Ok(())
}

#[test]
fn test_sum_overflow_is_an_error() -> Result<()> {
    let env = TestEnv::small();
    env.load_table(
        "t",
        int_schema(&["v"]),
        &int_rows(&["v"], &[vec![i32::MAX], vec![1]]),
    )?;
    let plan = GroupByPlan::new(
        env.tx.clone(),
        table(&env, "t")?,
        Vec::new(),
        vec![AggregationSpec::sum("v")],
    )?;
    let mut scan = plan.open()?;
    assert!(scan.next()?);
    assert!(matches!(
        scan.get_val("sumofv"),
        Err(Error::QueryExecution { .. })
    ));
    Ok(())
}

#[test]
fn test_value_before_first_record() {
    for spec in [
        AggregationSpec::count("x"),
        AggregationSpec::sum("x"),
        AggregationSpec::avg("x"),
        AggregationSpec::min("x"),
    ] {
        let function: Box<dyn AggregationFn> = spec.create();
        assert!(matches!(
            function.value(),
            Err(Error::AggregationNotPrimed { .. })
        ));
        assert_eq!(function.source_field_name(), "x");
        assert_eq!(function.output_field_name(), spec.output_field_name());
    }
    assert!(!AggregationSpec::max("x").create().is_always_integer());
    assert!(AggregationSpec::count("x").create().is_always_integer());
}
