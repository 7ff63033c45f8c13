//! Исполнитель запросов rustdb-query
//!
//! Операторы построены по модели итераторов: каждый план открывает курсор
//! (`Scan`), а курсоры вытягивают записи из дочерних курсоров по одной.

pub mod aggregation;
pub mod buffer_needs;
pub mod chunk;
pub mod comparator;
pub mod distinct;
pub mod group_by;
pub mod hash_join;
pub mod index_join;
pub mod index_select;
pub mod materialize;
pub mod merge_join;
pub mod multibuffer_product;
pub mod nested_loop;
pub mod runs;
pub mod sort;

#[cfg(test)]
mod tests;

pub use aggregation::{AggregationFn, AggregationKind, AggregationSpec};
pub use comparator::{RecordComparator, SortDirection, SortKey};
pub use distinct::DistinctPlan;
pub use group_by::{GroupByPlan, GroupByScan};
pub use hash_join::{HashJoinPlan, HashJoinScan};
pub use index_join::{IndexJoinPlan, IndexJoinScan};
pub use index_select::{IndexSelectPlan, IndexSelectScan};
pub use materialize::{MaterializePlan, TempTableScan};
pub use merge_join::{MergeJoinPlan, MergeJoinScan};
pub use multibuffer_product::{MultibufferProductPlan, MultibufferProductScan};
pub use nested_loop::{BlockNestedLoopScan, NestedLoopForm, NestedLoopJoinPlan, SimpleNestedLoopScan};
pub use sort::{SortPlan, SortScan};
