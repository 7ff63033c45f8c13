//! Тесты для каталога в памяти

use crate::catalog::index::IndexKind;
use crate::catalog::metadata::MetadataManager;
use crate::common::test_utils::{int_rows, int_schema, TestEnv};
use crate::common::{Error, Result, Value};

#[test]
fn test_create_table_twice_fails() -> Result<()> {
    let env = TestEnv::small();
    env.catalog.create_table("t", int_schema(&["a"]))?;
    assert!(matches!(
        env.catalog.create_table("t", int_schema(&["a"])),
        Err(Error::Validation { .. })
    ));
    assert_eq!(env.catalog.table_names(), vec!["t"]);
    Ok(())
}

#[test]
fn test_unknown_table_is_planning_error() {
    let env = TestEnv::small();
    assert!(matches!(
        env.catalog.layout("nope"),
        Err(Error::QueryPlanning { .. })
    ));
}

#[test]
fn test_index_maintained_on_insert() -> Result<()> {
    let env = TestEnv::small();
    env.load_table(
        "t",
        int_schema(&["id", "grp"]),
        &int_rows(&["id", "grp"], &[vec![1, 10], vec![2, 20]]),
    )?;
    env.create_index("t", "grp", IndexKind::BTree)?;
    env.catalog
        .insert_rows("t", &int_rows(&["id", "grp"], &[vec![3, 10]]))?;

    let indexes = env.catalog.index_info("t")?;
    let info = indexes.get("grp").ok_or_else(|| Error::field_not_found("grp"))?;
    assert_eq!(info.index_name(), "t_grp_idx");

    let mut index = info.open();
    index.before_first(&Value::Int(10))?;
    let mut count = 0;
    while index.next()? {
        count += 1;
    }
    assert_eq!(count, 2);
    Ok(())
}

#[test]
fn test_index_on_missing_field_fails() -> Result<()> {
    let env = TestEnv::small();
    env.catalog.create_table("t", int_schema(&["a"]))?;
    assert!(env.create_index("t", "b", IndexKind::Hash).is_err());
    assert!(env.catalog.index_info("t")?.is_empty());
    Ok(())
}

#[test]
fn test_insert_row_checks_fields() -> Result<()> {
    let env = TestEnv::small();
    env.catalog.create_table("t", int_schema(&["a", "b"]))?;
    let incomplete = int_rows(&["a"], &[vec![1]]);
    assert!(env.catalog.insert_row("t", &incomplete[0]).is_err());
    Ok(())
}
