//! Транзакционный интерфейс к страницам и его реализация в памяти
//!
//! Операторы видят хранилище только через трейт [`Transaction`]: размер файлов,
//! чтение и запись записей по слотам, закрепление блоков и счетчик свободных
//! буферов. [`StorageEngine`] хранит файлы записей в памяти, записи кодируются
//! через `bincode-next`.

use crate::common::config::StorageConfig;
use crate::common::constants::TEMP_TABLE_PREFIX;
use crate::common::{Error, Result, Value};
use crate::storage::file::BlockId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Общая ссылка на транзакцию
pub type TxRef = Arc<dyn Transaction>;

/// Транзакция, через которую операторы работают с хранилищем
pub trait Transaction: Send + Sync {
    /// Размер блока в байтах
    fn block_size(&self) -> usize;

    /// Количество незакрепленных буферов в пуле
    fn available_buffers(&self) -> usize;

    /// Количество блоков в файле (0 для несуществующего файла)
    fn size(&self, file_name: &str) -> Result<usize>;

    /// Добавляет пустой блок в конец файла
    fn append(&self, file_name: &str) -> Result<BlockId>;

    /// Количество занятых слотов в файле
    fn record_count(&self, file_name: &str) -> Result<usize>;

    /// Читает запись из слота; `None` для пустого слота
    fn read_record(&self, block: &BlockId, slot: usize) -> Result<Option<Vec<Value>>>;

    /// Записывает запись в слот; `None` освобождает слот
    fn write_record(&self, block: &BlockId, slot: usize, record: Option<&[Value]>)
        -> Result<()>;

    /// Закрепляет блок в пуле буферов
    fn pin(&self, block: &BlockId) -> Result<()>;

    /// Открепляет блок
    fn unpin(&self, block: &BlockId);

    /// Удаляет файл
    fn drop_file(&self, file_name: &str) -> Result<()>;

    /// Следующее уникальное имя временной таблицы
    fn next_temp_name(&self) -> String;
}

type Block = Vec<Option<Vec<u8>>>;

/// Хранилище файлов записей в памяти
#[derive(Debug)]
pub struct StorageEngine {
    block_size: usize,
    buffer_pool_size: usize,
    files: RwLock<HashMap<String, Vec<Block>>>,
    temp_counter: AtomicUsize,
}

impl StorageEngine {
    /// Создает новое хранилище
    pub fn new(block_size: usize, buffer_pool_size: usize) -> Self {
        Self {
            block_size,
            buffer_pool_size,
            files: RwLock::new(HashMap::new()),
            temp_counter: AtomicUsize::new(0),
        }
    }

    /// Создает хранилище по конфигурации
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.block_size, config.buffer_pool_size)
    }

    /// Начинает новую транзакцию
    pub fn begin(self: &Arc<Self>) -> Arc<MemoryTransaction> {
        Arc::new(MemoryTransaction {
            engine: Arc::clone(self),
            pins: Mutex::new(HashMap::new()),
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn buffer_pool_size(&self) -> usize {
        self.buffer_pool_size
    }

    /// Проверяет существование файла
    pub fn file_exists(&self, file_name: &str) -> bool {
        self.files.read().contains_key(file_name)
    }

    /// Имена всех файлов (отсортированы)
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        names
    }
}

fn encode_record(record: &[Value]) -> Result<Vec<u8>> {
    bincode_next::serde::encode_to_vec(record, bincode_next::config::legacy())
        .map_err(|e| Error::serialization(e.to_string()))
}

fn decode_record(bytes: &[u8]) -> Result<Vec<Value>> {
    bincode_next::serde::decode_from_slice::<Vec<Value>, _>(bytes, bincode_next::config::legacy())
        .map(|(record, _)| record)
        .map_err(|e| Error::serialization(e.to_string()))
}

/// Транзакция над [`StorageEngine`] со своим счетчиком закреплений
#[derive(Debug)]
pub struct MemoryTransaction {
    engine: Arc<StorageEngine>,
    pins: Mutex<HashMap<BlockId, usize>>,
}

impl MemoryTransaction {
    /// Хранилище транзакции
    pub fn engine(&self) -> &Arc<StorageEngine> {
        &self.engine
    }

    /// Количество различных закрепленных блоков
    pub fn pinned_blocks(&self) -> usize {
        self.pins.lock().len()
    }
}

impl Transaction for MemoryTransaction {
    fn block_size(&self) -> usize {
        self.engine.block_size
    }

    fn available_buffers(&self) -> usize {
        self.engine
            .buffer_pool_size
            .saturating_sub(self.pins.lock().len())
    }

    fn size(&self, file_name: &str) -> Result<usize> {
        Ok(self
            .engine
            .files
            .read()
            .get(file_name)
            .map_or(0, |blocks| blocks.len()))
    }

    fn append(&self, file_name: &str) -> Result<BlockId> {
        let mut files = self.engine.files.write();
        let blocks = files.entry(file_name.to_string()).or_default();
        blocks.push(Vec::new());
        Ok(BlockId::new(file_name, blocks.len() - 1))
    }

    fn record_count(&self, file_name: &str) -> Result<usize> {
        Ok(self.engine.files.read().get(file_name).map_or(0, |blocks| {
            blocks
                .iter()
                .map(|block| block.iter().filter(|slot| slot.is_some()).count())
                .sum()
        }))
    }

    fn read_record(&self, block: &BlockId, slot: usize) -> Result<Option<Vec<Value>>> {
        let files = self.engine.files.read();
        let data = files
            .get(&block.file_name)
            .and_then(|blocks| blocks.get(block.number))
            .ok_or_else(|| Error::storage(format!("block {} does not exist", block)))?;
        match data.get(slot) {
            Some(Some(bytes)) => Ok(Some(decode_record(bytes)?)),
            _ => Ok(None),
        }
    }

    fn write_record(
        &self,
        block: &BlockId,
        slot: usize,
        record: Option<&[Value]>,
    ) -> Result<()> {
        let encoded = record.map(encode_record).transpose()?;
        let mut files = self.engine.files.write();
        let data = files
            .get_mut(&block.file_name)
            .and_then(|blocks| blocks.get_mut(block.number))
            .ok_or_else(|| Error::storage(format!("block {} does not exist", block)))?;
        if data.len() <= slot {
            data.resize(slot + 1, None);
        }
        data[slot] = encoded;
        Ok(())
    }

    fn pin(&self, block: &BlockId) -> Result<()> {
        let mut pins = self.pins.lock();
        let count = pins.entry(block.clone()).or_insert(0);
        *count += 1;
        if pins.len() > self.engine.buffer_pool_size {
            log::warn!(
                "Закреплено {} блоков при пуле из {} буферов",
                pins.len(),
                self.engine.buffer_pool_size
            );
        }
        Ok(())
    }

    fn unpin(&self, block: &BlockId) {
        let mut pins = self.pins.lock();
        if let Some(count) = pins.get_mut(block) {
            *count -= 1;
            if *count == 0 {
                pins.remove(block);
            }
        }
    }

    fn drop_file(&self, file_name: &str) -> Result<()> {
        if self.engine.files.write().remove(file_name).is_some() {
            log::debug!("Удален файл {}", file_name);
        }
        Ok(())
    }

    fn next_temp_name(&self) -> String {
        let n = self.engine.temp_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}{}", TEMP_TABLE_PREFIX, n)
    }
}
