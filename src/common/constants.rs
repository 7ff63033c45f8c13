//! Константы для rustdb-query

/// Размер блока по умолчанию в байтах
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Размер пула буферов по умолчанию (в блоках)
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 8;

/// Размер флага занятости слота записи
pub const SLOT_FLAG_SIZE: usize = 4;

/// Размер целого поля в слоте
pub const INT_FIELD_SIZE: usize = 4;

/// Размер префикса длины строкового поля в слоте
pub const STRING_LENGTH_PREFIX_SIZE: usize = 4;

/// Расширение файлов записей (таблицы и временные таблицы)
pub const RECORD_FILE_EXTENSION: &str = ".tbl";

/// Префикс имен временных таблиц
pub const TEMP_TABLE_PREFIX: &str = "temp";

/// Число корзин статического хеш-индекса (для оценки стоимости)
pub const HASH_INDEX_BUCKETS: usize = 100;

/// Буферы, которые блочный nested loop оставляет под внутренний вход и результат
pub const NESTED_LOOP_RESERVED_BUFFERS: usize = 2;

/// Буферы, которые hash join оставляет под сканирование правого входа
pub const HASH_JOIN_RESERVED_BUFFERS: usize = 1;

/// Префиксы имен выходных полей агрегатных функций
pub const COUNT_PREFIX: &str = "countof";
pub const SUM_PREFIX: &str = "sumof";
pub const AVG_PREFIX: &str = "avgof";
pub const MIN_PREFIX: &str = "minof";
pub const MAX_PREFIX: &str = "maxof";
