//! Тесты для описания запроса

use crate::common::Error;
use crate::executor::aggregation::AggregationSpec;
use crate::executor::comparator::SortKey;
use crate::planner::query_data::QueryData;
use crate::query::predicate::Term;

#[test]
fn test_display_renders_query() {
    let query = QueryData::new(["student", "dept"])
        .select(["sname", "dname"])
        .filter(Term::fields_equal("majorid", "did"))
        .filter(Term::field_equals("gradyear", 2020))
        .order_by(SortKey::desc("sname"));
    assert_eq!(
        query.to_string(),
        "select sname, dname from student, dept where majorid = did and gradyear = 2020 order by sname desc"
    );

    let grouped = QueryData::new(["student"])
        .group_by(["majorid"])
        .aggregate(AggregationSpec::count("sid").distinct())
        .distinct();
    assert_eq!(
        grouped.to_string(),
        "select distinct count(distinct sid) from student group by majorid"
    );
}

#[test]
fn test_output_fields_include_aggregates_once() {
    let query = QueryData::new(["student"])
        .select(["majorid", "countofsid"])
        .group_by(["majorid"])
        .aggregate(AggregationSpec::count("sid"))
        .aggregate(AggregationSpec::max("gradyear"));
    assert_eq!(
        query.output_fields(),
        vec!["majorid", "countofsid", "maxofgradyear"]
    );
}

#[test]
fn test_validate_structure() {
    assert!(QueryData::new(["student"]).validate().is_ok());
    assert!(matches!(
        QueryData::new(Vec::<String>::new()).validate(),
        Err(Error::Validation { .. })
    ));
    assert!(matches!(
        QueryData::new(["student", "student"]).validate(),
        Err(Error::Validation { .. })
    ));
    let ungrouped = QueryData::new(["student"])
        .select(["sname"])
        .group_by(["majorid"]);
    assert!(matches!(ungrouped.validate(), Err(Error::Validation { .. })));
}

#[test]
fn test_deserialize_with_defaults() {
    let query: QueryData = serde_json::from_str(
        r#"{"tables": ["student"], "fields": ["sname"], "order_by": [{"field": "sname", "direction": "descending"}]}"#,
    )
    .unwrap();
    assert_eq!(query.tables, vec!["student"]);
    assert!(query.predicate.is_empty());
    assert!(!query.distinct);
    assert_eq!(query.order_by, vec![SortKey::desc("sname")]);
}
