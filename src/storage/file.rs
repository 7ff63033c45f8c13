//! Идентификаторы блоков и записей

use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор блока файла записей
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId {
    /// Имя файла
    pub file_name: String,
    /// Номер блока в файле
    pub number: usize,
}

impl BlockId {
    /// Создает новый идентификатор блока
    pub fn new(file_name: impl Into<String>, number: usize) -> Self {
        Self {
            file_name: file_name.into(),
            number,
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.file_name, self.number)
    }
}

/// Идентификатор записи: номер блока и слот внутри блока
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rid {
    /// Номер блока
    pub block_number: usize,
    /// Номер слота
    pub slot: usize,
}

impl Rid {
    /// Создает новый идентификатор записи
    pub fn new(block_number: usize, slot: usize) -> Self {
        Self { block_number, slot }
    }
}

impl fmt::Display for Rid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.block_number, self.slot)
    }
}

/// Имя файла записей таблицы
pub fn record_file_name(table_name: &str) -> String {
    format!("{}{}", table_name, crate::common::constants::RECORD_FILE_EXTENSION)
}
