//! Тесты для предикатов

use crate::common::test_utils::{int_rows, int_schema, TestEnv};
use crate::common::{Error, Result, Value};
use crate::query::plan::PlanRef;
use crate::query::predicate::{CompareOp, Expression, Predicate, Term};
use crate::query::scan::Scan;
use crate::query::table_plan::TablePlan;
use std::sync::Arc;

fn term(field: &str, op: CompareOp, value: i32) -> Term {
    Term::new(Expression::field(field), op, Expression::constant(value))
}

#[test]
fn test_compare_ops() {
    use std::cmp::Ordering::*;
    assert!(CompareOp::Eq.matches(Equal));
    assert!(CompareOp::Ne.matches(Less));
    assert!(CompareOp::Le.matches(Equal) && CompareOp::Le.matches(Less));
    assert!(!CompareOp::Gt.matches(Equal));
    assert_eq!(CompareOp::Lt.flipped(), CompareOp::Gt);
    assert_eq!(CompareOp::Eq.flipped(), CompareOp::Eq);
}

#[test]
fn test_sub_predicates() {
    let left = int_schema(&["a", "b"]);
    let right = int_schema(&["c"]);
    let pred: Predicate = [
        Term::field_equals("a", 1),
        Term::fields_equal("b", "c"),
        term("c", CompareOp::Gt, 5),
    ]
    .into_iter()
    .collect();

    let select = pred.select_sub_pred(&left).map(|p| p.to_string());
    assert_eq!(select.as_deref(), Some("a = 1"));

    let join = pred.join_sub_pred(&left, &right).map(|p| p.to_string());
    assert_eq!(join.as_deref(), Some("b = c"));

    assert!(pred.join_sub_pred(&left, &int_schema(&["z"])).is_none());
    assert!(pred.select_sub_pred(&int_schema(&["z"])).is_none());
}

#[test]
fn test_equates_and_comparators() {
    let pred: Predicate = [
        Term::new(Expression::constant(3), CompareOp::Eq, Expression::field("a")),
        Term::fields_equal("b", "c"),
        Term::new(Expression::constant(10), CompareOp::Lt, Expression::field("a")),
    ]
    .into_iter()
    .collect();

    assert_eq!(pred.equates_with_constant("a"), Some(&Value::Int(3)));
    assert_eq!(pred.equates_with_constant("b"), None);
    assert_eq!(pred.equates_with_field("c"), Some("b"));
    assert_eq!(
        pred.field_comparators("a"),
        vec![CompareOp::Eq, CompareOp::Gt]
    );
}

#[test]
fn test_equi_join_fields_oriented_by_schema() {
    let left = int_schema(&["a"]);
    let right = int_schema(&["b"]);
    let pred = Predicate::from_term(Term::fields_equal("b", "a"));

    assert_eq!(
        pred.equi_join_fields(&left, &right),
        Some(("a".to_string(), "b".to_string()))
    );
    assert_eq!(
        pred.equi_join_fields(&right, &left),
        Some(("b".to_string(), "a".to_string()))
    );
    let range = Predicate::from_term(Term::new(
        Expression::field("a"),
        CompareOp::Lt,
        Expression::field("b"),
    ));
    assert!(range.equi_join_fields(&left, &right).is_none());
}

#[test]
fn test_reduction_factors() -> Result<()> {
    let env = TestEnv::small();
    let values: Vec<Vec<i32>> = (0..30).map(|i| vec![i, i % 5]).collect();
    env.load_table("t", int_schema(&["a", "b"]), &int_rows(&["a", "b"], &values))?;
    let plan: PlanRef = Arc::new(TablePlan::new(env.tx.clone(), "t", &env.metadata())?);

    assert_eq!(Term::field_equals("b", 1).reduction_factor(plan.as_ref()), 5);
    assert_eq!(Term::fields_equal("a", "b").reduction_factor(plan.as_ref()), 30);
    assert_eq!(term("a", CompareOp::Ne, 1).reduction_factor(plan.as_ref()), 1);
    assert_eq!(term("a", CompareOp::Lt, 1).reduction_factor(plan.as_ref()), 3);

    let pred: Predicate = [Term::field_equals("b", 1), term("a", CompareOp::Ge, 3)]
        .into_iter()
        .collect();
    assert_eq!(pred.reduction_factor(plan.as_ref()), 15);
    Ok(())
}

#[test]
fn test_is_satisfied_on_scan() -> Result<()> {
    let env = TestEnv::small();
    env.load_table("t", int_schema(&["a"]), &int_rows(&["a"], &[vec![4]]))?;
    let plan = TablePlan::new(env.tx.clone(), "t", &env.metadata())?;
    let mut scan = plan.open_table_scan()?;
    assert!(scan.next()?);

    assert!(Predicate::new().is_satisfied(&scan)?);
    assert!(term("a", CompareOp::Ge, 4).is_satisfied(&scan)?);
    assert!(!term("a", CompareOp::Gt, 4).is_satisfied(&scan)?);
    assert!(matches!(
        Term::field_equals("a", "four").is_satisfied(&scan),
        Err(Error::TypeMismatch { .. })
    ));
    assert!(matches!(
        Term::field_equals("zzz", 1).is_satisfied(&scan),
        Err(Error::FieldNotFound { .. })
    ));
    Ok(())
}
