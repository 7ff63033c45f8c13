//! Планировщик запросов rustdb-query

pub mod heuristic;
pub mod query_data;
pub mod settings;
pub mod table_planner;

#[cfg(test)]
mod tests;

pub use heuristic::HeuristicQueryPlanner;
pub use query_data::{OrderKey, QueryData};
pub use settings::{JoinPolicy, JoinStrategy, PlannerSettings};
pub use table_planner::TablePlanner;
