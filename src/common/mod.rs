//! Общие типы и утилиты для rustdb-query

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use config::*;
pub use constants::*;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use types::*;
