//! rustdb-query - исполнитель запросов и оптимизатор соединений RustDB
//!
//! Крейт строит и выполняет деревья реляционных операторов поверх слоя
//! хранения с блоками и пулом буферов: выборка, проекция, сортировка,
//! устранение дубликатов, группировка с агрегатами и несколько алгоритмов
//! соединения, между которыми планировщик выбирает по оценке стоимости.

pub mod catalog;
pub mod cli;
pub mod common;
pub mod demo;
pub mod executor;
pub mod planner;
pub mod query;
pub mod storage;

pub use common::error::{Error, Result};
pub use common::types::*;

/// Версия библиотеки
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
