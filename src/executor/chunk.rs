//! Курсор по непрерывному диапазону блоков временной таблицы

use crate::common::{Error, Result, Value};
use crate::query::scan::Scan;
use crate::storage::file::{record_file_name, BlockId};
use crate::storage::layout::Layout;
use crate::storage::transaction::TxRef;

/// Порция блоков `[first, last]`, закрепленная в пуле и прочитанная в память.
///
/// Блоки остаются закрепленными, пока курсор не закрыт.
pub struct ChunkScan {
    tx: TxRef,
    layout: Layout,
    blocks: Vec<BlockId>,
    records: Vec<Vec<Value>>,
    position: Option<usize>,
}

impl ChunkScan {
    pub fn new(tx: TxRef, table_name: &str, layout: Layout, first: usize, last: usize) -> Result<Self> {
        if last < first {
            return Err(Error::query_execution(format!(
                "empty chunk [{}, {}] of {}",
                first, last, table_name
            )));
        }
        let file_name = record_file_name(table_name);
        let slots = layout.slots_per_block(tx.block_size());
        let mut chunk = Self {
            tx,
            layout,
            blocks: Vec::with_capacity(last - first + 1),
            records: Vec::new(),
            position: None,
        };
        for number in first..=last {
            let block = BlockId::new(file_name.clone(), number);
            chunk.tx.pin(&block)?;
            chunk.blocks.push(block.clone());
            for slot in 0..slots {
                if let Some(record) = chunk.tx.read_record(&block, slot)? {
                    chunk.records.push(record);
                }
            }
        }
        Ok(chunk)
    }

    /// Количество записей в порции
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Количество блоков в порции
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn release(&mut self) {
        for block in self.blocks.drain(..) {
            self.tx.unpin(&block);
        }
    }
}

impl Scan for ChunkScan {
    fn before_first(&mut self) -> Result<()> {
        self.position = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.records.len()));
        Ok(next < self.records.len())
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        let record = self
            .position
            .and_then(|p| self.records.get(p))
            .ok_or_else(|| Error::query_execution("chunk scan is not positioned on a record"))?;
        let index = self
            .layout
            .schema()
            .index_of(field)
            .ok_or_else(|| Error::field_not_found(field))?;
        record
            .get(index)
            .cloned()
            .ok_or_else(|| Error::field_not_found(field))
    }

    fn has_field(&self, field: &str) -> bool {
        self.layout.schema().has_field(field)
    }

    fn close(&mut self) {
        self.release();
        self.position = None;
    }
}

impl Drop for ChunkScan {
    fn drop(&mut self) {
        self.release();
    }
}
