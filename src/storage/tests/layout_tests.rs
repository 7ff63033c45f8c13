//! Тесты для схемы и раскладки записей

use crate::common::constants::{INT_FIELD_SIZE, SLOT_FLAG_SIZE, STRING_LENGTH_PREFIX_SIZE};
use crate::common::{Error, FieldType, Result, Value};
use crate::storage::layout::{Layout, Schema};

fn student_schema() -> Schema {
    let mut schema = Schema::new();
    schema.add_int_field("sid");
    schema.add_string_field("sname", 10);
    schema.add_int_field("gradyear");
    schema
}

#[test]
fn test_schema_keeps_field_order() {
    let schema = student_schema();
    assert_eq!(schema.fields(), vec!["sid", "sname", "gradyear"]);
    assert_eq!(schema.index_of("gradyear"), Some(2));
    assert_eq!(schema.len(), 3);
    assert!(!schema.is_empty());
}

#[test]
fn test_schema_add_copies_field_info() -> Result<()> {
    let source = student_schema();
    let mut schema = Schema::new();
    schema.add("sname", &source)?;

    assert_eq!(schema.field_type("sname")?, FieldType::Varchar);
    assert_eq!(schema.length("sname")?, 10);
    assert!(matches!(
        schema.add("missing", &source),
        Err(Error::FieldNotFound { .. })
    ));
    Ok(())
}

#[test]
fn test_layout_offsets() -> Result<()> {
    let layout = Layout::new(student_schema());

    assert_eq!(layout.offset("sid")?, SLOT_FLAG_SIZE);
    assert_eq!(layout.offset("sname")?, SLOT_FLAG_SIZE + INT_FIELD_SIZE);
    assert_eq!(
        layout.offset("gradyear")?,
        SLOT_FLAG_SIZE + INT_FIELD_SIZE + STRING_LENGTH_PREFIX_SIZE + 10
    );
    assert_eq!(
        layout.slot_size(),
        SLOT_FLAG_SIZE + 2 * INT_FIELD_SIZE + STRING_LENGTH_PREFIX_SIZE + 10
    );
    Ok(())
}

#[test]
fn test_blocks_for_records() {
    let mut schema = Schema::new();
    schema.add_int_field("a");
    schema.add_int_field("b");
    let layout = Layout::new(schema);

    // 12-байтовый слот: 5 записей в 64-байтовом блоке
    assert_eq!(layout.slots_per_block(64), 5);
    assert_eq!(layout.blocks_for_records(0, 64), 0);
    assert_eq!(layout.blocks_for_records(5, 64), 1);
    assert_eq!(layout.blocks_for_records(6, 64), 2);
}

#[test]
fn test_check_value() {
    let layout = Layout::new(student_schema());

    assert!(layout.check_value("sid", &Value::Int(1)).is_ok());
    assert!(matches!(
        layout.check_value("sid", &Value::from("x")),
        Err(Error::TypeMismatch { .. })
    ));
    assert!(matches!(
        layout.check_value("sname", &Value::from("far too long name")),
        Err(Error::Validation { .. })
    ));
    assert_eq!(
        layout.empty_record(),
        vec![Value::Int(0), Value::from(""), Value::Int(0)]
    );
}
