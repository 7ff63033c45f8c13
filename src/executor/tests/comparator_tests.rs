//! Тесты для компаратора записей

use crate::common::test_utils::{pseudo_random, row};
use crate::common::{Error, Row, Value};
use crate::executor::comparator::{RecordComparator, SortKey};
use std::cmp::Ordering;

fn sample_rows() -> Vec<Row> {
    (0..24)
        .map(|i| {
            row(&[
                ("a", Value::Int(pseudo_random(i, 4))),
                ("b", Value::Int(pseudo_random(i * 3 + 1, 5))),
            ])
        })
        .collect()
}

#[test]
fn test_comparator_is_total_and_antisymmetric() {
    let comparator = RecordComparator::new(vec![SortKey::asc("a"), SortKey::desc("b")]);
    let rows = sample_rows();
    for x in &rows {
        assert_eq!(comparator.compare_rows(x, x).unwrap(), Ordering::Equal);
        for y in &rows {
            let xy = comparator.compare_rows(x, y).unwrap();
            let yx = comparator.compare_rows(y, x).unwrap();
            assert_eq!(xy, yx.reverse());
        }
    }
}

#[test]
fn test_comparator_is_transitive() {
    let comparator = RecordComparator::on_fields(&["a".to_string(), "b".to_string()]);
    let rows = sample_rows();
    for x in &rows {
        for y in &rows {
            for z in &rows {
                let xy = comparator.compare_rows(x, y).unwrap();
                let yz = comparator.compare_rows(y, z).unwrap();
                if xy != Ordering::Greater && yz != Ordering::Greater {
                    assert_ne!(comparator.compare_rows(x, z).unwrap(), Ordering::Greater);
                }
            }
        }
    }
}

#[test]
fn test_first_differing_key_decides() {
    let x = row(&[("a", 1), ("b", 9)]);
    let y = row(&[("a", 2), ("b", 0)]);
    let asc = RecordComparator::new(vec![SortKey::asc("a"), SortKey::asc("b")]);
    assert_eq!(asc.compare_rows(&x, &y).unwrap(), Ordering::Less);

    let desc = RecordComparator::new(vec![SortKey::desc("a"), SortKey::asc("b")]);
    assert_eq!(desc.compare_rows(&x, &y).unwrap(), Ordering::Greater);

    let by_b = RecordComparator::new(vec![SortKey::asc("b")]);
    assert_eq!(by_b.compare_rows(&x, &y).unwrap(), Ordering::Greater);
    assert_eq!(by_b.fields(), vec!["b".to_string()]);
}

#[test]
fn test_compare_keys_matches_compare_rows() {
    let comparator = RecordComparator::new(vec![SortKey::desc("a")]);
    let a = [Value::Int(3)];
    let b = [Value::Int(5)];
    assert_eq!(comparator.compare_keys(&a, &b).unwrap(), Ordering::Greater);
    assert_eq!(comparator.compare_keys(&a, &a).unwrap(), Ordering::Equal);
}

#[test]
fn test_comparing_mixed_types_fails() {
    let comparator = RecordComparator::on_fields(&["a".to_string()]);
    let x = row(&[("a", Value::Int(1))]);
    let y = row(&[("a", Value::from("one"))]);
    assert!(matches!(
        comparator.compare_rows(&x, &y),
        Err(Error::TypeMismatch { .. })
    ));
    let missing = row(&[("z", 1)]);
    assert!(matches!(
        comparator.compare_rows(&x, &missing),
        Err(Error::FieldNotFound { .. })
    ));
}
