//! Интеграционные тесты для rustdb-query

pub mod cli_tests;
pub mod common;
pub mod query_cycle_tests;
pub mod strategy_tests;
