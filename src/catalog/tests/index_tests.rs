//! Тесты для индексов в памяти

use crate::catalog::index::{Index, IndexInfo, IndexKind, IndexStore, MemoryIndex};
use crate::catalog::statistics::StatInfo;
use crate::common::test_utils::int_schema;
use crate::common::{Result, Value};
use crate::storage::file::Rid;
use std::collections::HashMap;
use std::sync::Arc;

#[test]
fn test_memory_index_lookup_in_rid_order() -> Result<()> {
    let store = Arc::new(IndexStore::new());
    store.insert(Value::Int(7), Rid::new(2, 1));
    store.insert(Value::Int(7), Rid::new(0, 3));
    store.insert(Value::Int(8), Rid::new(1, 0));

    let mut index = MemoryIndex::new(store.clone());
    index.before_first(&Value::Int(7))?;
    let mut rids = Vec::new();
    while index.next()? {
        rids.push(index.data_rid()?);
    }
    assert_eq!(rids, vec![Rid::new(0, 3), Rid::new(2, 1)]);
    assert!(!index.next()?);
    assert!(index.data_rid().is_err());

    index.before_first(&Value::Int(9))?;
    assert!(!index.next()?);
    Ok(())
}

#[test]
fn test_memory_index_insert_and_delete() -> Result<()> {
    let store = Arc::new(IndexStore::new());
    let mut index = MemoryIndex::new(store.clone());
    index.insert(&Value::from("amy"), Rid::new(0, 0))?;
    index.insert(&Value::from("amy"), Rid::new(0, 1))?;
    assert_eq!(store.len(), 2);

    index.delete(&Value::from("amy"), Rid::new(0, 0))?;
    assert_eq!(store.lookup(&Value::from("amy")), vec![Rid::new(0, 1)]);
    index.delete(&Value::from("amy"), Rid::new(0, 1))?;
    assert!(store.is_empty());
    Ok(())
}

#[test]
fn test_index_info_estimates() -> Result<()> {
    let schema = int_schema(&["id", "grp"]);
    let mut stats = StatInfo::new(100, 1000);
    stats.distinct = HashMap::from([("id".to_string(), 1000), ("grp".to_string(), 10)]);
    let store = Arc::new(IndexStore::new());

    let btree = IndexInfo::new("grp_idx", "grp", IndexKind::BTree, &schema, 400, stats.clone(), store.clone())?;
    assert_eq!(btree.records_output(), 100);
    assert_eq!(btree.distinct_values("grp"), 1);
    assert_eq!(btree.distinct_values("id"), 1000);
    assert!(btree.blocks_accessed() >= 1);

    let hash = IndexInfo::new("grp_hash", "grp", IndexKind::Hash, &schema, 400, stats, store)?;
    assert_eq!(hash.kind(), IndexKind::Hash);
    assert!(hash.blocks_accessed() <= btree.blocks_accessed());
    assert!(IndexInfo::new("bad", "missing", IndexKind::Hash, &schema, 400, StatInfo::default(), Arc::new(IndexStore::new())).is_err());
    Ok(())
}
