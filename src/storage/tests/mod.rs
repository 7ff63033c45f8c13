//! Тесты для модуля storage

pub mod layout_tests;
