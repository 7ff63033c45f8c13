//! Тесты для модуля catalog

mod index_tests;
mod metadata_tests;
