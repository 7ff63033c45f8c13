//! Каталог метаданных: раскладки таблиц, статистика и индексы

pub mod index;
pub mod metadata;
pub mod statistics;

#[cfg(test)]
mod tests;

pub use index::{Index, IndexInfo, IndexKind, IndexStore, MemoryIndex};
pub use metadata::{Catalog, MetadataManager, MetadataRef};
pub use statistics::{StatInfo, StatisticsManager, StatisticsSettings};
