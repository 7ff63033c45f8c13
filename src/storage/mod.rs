//! Слой хранения: файлы записей, раскладка, транзакции и временные таблицы

pub mod file;
pub mod layout;
pub mod table_scan;
pub mod temp_table;
pub mod transaction;

#[cfg(test)]
pub mod tests;

pub use file::{BlockId, Rid};
pub use layout::{FieldInfo, Layout, Schema};
pub use table_scan::TableScan;
pub use temp_table::TempTable;
pub use transaction::{MemoryTransaction, StorageEngine, Transaction, TxRef};
