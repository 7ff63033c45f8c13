//! Менеджер статистики для rustdb-query
//!
//! Статистика собирается полным проходом по таблице и кэшируется; кэш
//! пересчитывается после заданного числа обращений или после явной инвалидации.

use crate::common::{Result, Value};
use crate::query::scan::Scan;
use crate::storage::file::record_file_name;
use crate::storage::layout::Layout;
use crate::storage::table_scan::TableScan;
use crate::storage::transaction::TxRef;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Статистика таблицы: блоки, записи и число различных значений полей
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatInfo {
    /// Количество блоков таблицы
    pub num_blocks: usize,
    /// Количество записей таблицы
    pub num_records: usize,
    /// Количество различных значений по полям
    pub distinct: HashMap<String, usize>,
}

impl StatInfo {
    /// Создает статистику без сведений о полях
    pub fn new(num_blocks: usize, num_records: usize) -> Self {
        Self {
            num_blocks,
            num_records,
            distinct: HashMap::new(),
        }
    }

    pub fn blocks_accessed(&self) -> usize {
        self.num_blocks
    }

    pub fn records_output(&self) -> usize {
        self.num_records
    }

    /// Число различных значений поля; для неизвестного поля `1 + records / 3`
    pub fn distinct_values(&self, field: &str) -> usize {
        self.distinct
            .get(field)
            .copied()
            .unwrap_or(1 + self.num_records / 3)
    }
}

/// Настройки сбора статистики
#[derive(Debug, Clone)]
pub struct StatisticsSettings {
    /// Через сколько обращений кэш пересчитывается
    pub refresh_interval: usize,
}

impl Default for StatisticsSettings {
    fn default() -> Self {
        Self {
            refresh_interval: 100,
        }
    }
}

#[derive(Debug, Default)]
struct StatCache {
    tables: HashMap<String, StatInfo>,
    calls: usize,
}

/// Менеджер статистики
#[derive(Debug, Default)]
pub struct StatisticsManager {
    cache: Mutex<StatCache>,
    settings: StatisticsSettings,
}

impl StatisticsManager {
    /// Создать новый менеджер статистики
    pub fn new() -> Self {
        Self::default()
    }

    /// Создать менеджер статистики с настройками
    pub fn with_settings(settings: StatisticsSettings) -> Self {
        Self {
            cache: Mutex::new(StatCache::default()),
            settings,
        }
    }

    /// Статистика таблицы (из кэша, если он актуален)
    pub fn stat_info(&self, tx: &TxRef, table_name: &str, layout: &Layout) -> Result<StatInfo> {
        {
            let mut cache = self.cache.lock();
            cache.calls += 1;
            if cache.calls > self.settings.refresh_interval {
                log::debug!("Сброс кэша статистики после {} обращений", cache.calls);
                cache.tables.clear();
                cache.calls = 0;
            }
            if let Some(info) = cache.tables.get(table_name) {
                return Ok(info.clone());
            }
        }
        let info = Self::collect(tx, table_name, layout)?;
        self.cache
            .lock()
            .tables
            .insert(table_name.to_string(), info.clone());
        Ok(info)
    }

    /// Собрать статистику проходом по таблице
    pub fn collect(tx: &TxRef, table_name: &str, layout: &Layout) -> Result<StatInfo> {
        let fields = layout.schema().fields();
        let mut seen: Vec<HashSet<Value>> = vec![HashSet::new(); fields.len()];
        let mut num_records = 0;

        let mut scan = TableScan::new(tx.clone(), table_name, layout.clone())?;
        while scan.next()? {
            num_records += 1;
            for (field, values) in fields.iter().zip(seen.iter_mut()) {
                values.insert(scan.get_val(field)?);
            }
        }
        scan.close();

        let num_blocks = tx.size(&record_file_name(table_name))?;
        let distinct = fields
            .into_iter()
            .zip(seen)
            .map(|(field, values)| (field, values.len()))
            .collect();

        log::debug!(
            "Статистика {}: {} блоков, {} записей",
            table_name,
            num_blocks,
            num_records
        );
        Ok(StatInfo {
            num_blocks,
            num_records,
            distinct,
        })
    }

    /// Удалить статистику таблицы из кэша
    pub fn invalidate(&self, table_name: &str) {
        self.cache.lock().tables.remove(table_name);
    }

    /// Очистить кэш статистики
    pub fn clear_cache(&self) {
        let mut cache = self.cache.lock();
        cache.tables.clear();
        cache.calls = 0;
    }

    /// Получить настройки
    pub fn settings(&self) -> &StatisticsSettings {
        &self.settings
    }
}
