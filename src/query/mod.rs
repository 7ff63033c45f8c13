//! Реляционные планы и курсоры: интерфейсы, предикаты и базовые операторы

pub mod plan;
pub mod predicate;
pub mod product;
pub mod project;
pub mod scan;
pub mod select;
pub mod table_plan;

#[cfg(test)]
mod tests;

pub use plan::{explain, Plan, PlanRef};
pub use predicate::{CompareOp, Expression, Predicate, Term};
pub use product::{ProductPlan, ProductScan};
pub use project::{ProjectPlan, ProjectScan};
pub use scan::{Scan, UpdateScan};
pub use select::{SelectPlan, SelectScan};
pub use table_plan::TablePlan;
