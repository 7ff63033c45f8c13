//! Тесты для модуля query

mod plan_tests;
mod predicate_tests;
