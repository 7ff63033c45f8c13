//! Тесты для выборки, проекции и произведения

use crate::common::test_utils::{int_rows, int_schema, int_tuples, TestEnv};
use crate::common::{Error, Result};
use crate::query::plan::{explain, Plan, PlanRef};
use crate::query::predicate::{CompareOp, Expression, Predicate, Term};
use crate::query::product::ProductPlan;
use crate::query::project::ProjectPlan;
use crate::query::select::SelectPlan;
use crate::query::table_plan::TablePlan;
use std::sync::Arc;

fn table(env: &TestEnv, name: &str) -> Result<PlanRef> {
    Ok(Arc::new(TablePlan::new(env.tx.clone(), name, &env.metadata())?))
}

fn setup() -> Result<TestEnv> {
    let env = TestEnv::small();
    let values: Vec<Vec<i32>> = (1..=9).map(|i| vec![i, i % 3]).collect();
    env.load_table("t", int_schema(&["a", "b"]), &int_rows(&["a", "b"], &values))?;
    env.load_table(
        "u",
        int_schema(&["c"]),
        &int_rows(&["c"], &[vec![100], vec![200]]),
    )?;
    env.load_table("empty", int_schema(&["e"]), &[])?;
    Ok(env)
}

#[test]
fn test_table_plan_estimates() -> Result<()> {
    let env = setup()?;
    let plan = table(&env, "t")?;
    assert_eq!(plan.records_output(), 9);
    // 12-байтовый слот, 5 слотов на блок
    assert_eq!(plan.blocks_accessed(), 2);
    assert_eq!(plan.distinct_values("b"), 3);
    assert_eq!(plan.describe(), "Table(t)");
    Ok(())
}

#[test]
fn test_select_filters_records() -> Result<()> {
    let env = setup()?;
    let pred: Predicate = [
        Term::field_equals("b", 1),
        Term::new(Expression::field("a"), CompareOp::Gt, Expression::constant(2)),
    ]
    .into_iter()
    .collect();
    let plan = SelectPlan::new(table(&env, "t")?, pred);

    let mut scan = plan.open()?;
    let tuples = int_tuples(scan.as_mut(), &["a"])?;
    assert_eq!(tuples, vec![vec![4], vec![7]]);
    assert_eq!(plan.records_output(), 9 / 9);
    assert_eq!(plan.distinct_values("b"), 1);
    Ok(())
}

#[test]
fn test_project_restricts_fields() -> Result<()> {
    let env = setup()?;
    let plan = ProjectPlan::new(table(&env, "t")?, &["b".to_string()])?;
    assert_eq!(plan.schema().fields(), vec!["b".to_string()]);

    let mut scan = plan.open()?;
    assert!(scan.next()?);
    assert_eq!(scan.get_int("b")?, 1);
    assert!(!scan.has_field("a"));
    assert!(matches!(
        scan.get_val("a"),
        Err(Error::FieldNotFound { .. })
    ));

    assert!(ProjectPlan::new(table(&env, "t")?, &["missing".to_string()]).is_err());
    Ok(())
}

#[test]
fn test_product_combines_every_pair() -> Result<()> {
    let env = setup()?;
    let plan = ProductPlan::new(table(&env, "u")?, table(&env, "t")?);
    assert_eq!(plan.records_output(), 18);

    let mut scan = plan.open()?;
    let tuples = int_tuples(scan.as_mut(), &["c", "a"])?;
    assert_eq!(tuples.len(), 18);
    assert_eq!(tuples[0], vec![100, 1]);
    assert_eq!(tuples[9], vec![200, 1]);

    scan.before_first()?;
    assert_eq!(int_tuples(scan.as_mut(), &["c", "a"])?.len(), 18);
    Ok(())
}

#[test]
fn test_product_with_empty_side() -> Result<()> {
    let env = setup()?;
    for (left, right) in [("empty", "u"), ("u", "empty")] {
        let plan = ProductPlan::new(table(&env, left)?, table(&env, right)?);
        let mut scan = plan.open()?;
        assert!(!scan.next()?, "{} x {}", left, right);
    }
    Ok(())
}

#[test]
fn test_explain_renders_tree() -> Result<()> {
    let env = setup()?;
    let select = Arc::new(SelectPlan::new(
        table(&env, "t")?,
        Predicate::from_term(Term::field_equals("a", 3)),
    ));
    let plan = ProductPlan::new(select, table(&env, "u")?);
    let text = explain(&plan);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Product"));
    assert!(lines[1].starts_with("  Select(a = 3)"));
    assert!(lines[2].starts_with("    Table(t)"));
    assert!(lines[3].starts_with("  Table(u)"));
    Ok(())
}
