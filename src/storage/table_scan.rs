//! Последовательный курсор по файлу записей

use crate::common::{Error, Result, Value};
use crate::query::scan::{Scan, UpdateScan};
use crate::storage::file::{record_file_name, BlockId, Rid};
use crate::storage::layout::Layout;
use crate::storage::transaction::TxRef;

/// Курсор по записям таблицы, закрепляющий текущий блок
pub struct TableScan {
    tx: TxRef,
    layout: Layout,
    file_name: String,
    slots_per_block: usize,
    current_block: Option<BlockId>,
    current_slot: Option<usize>,
    current_record: Option<Vec<Value>>,
}

impl TableScan {
    /// Открывает курсор по таблице и ставит его перед первой записью
    pub fn new(tx: TxRef, table_name: &str, layout: Layout) -> Result<Self> {
        let slots_per_block = layout.slots_per_block(tx.block_size());
        if slots_per_block == 0 {
            return Err(Error::storage(format!(
                "record of {} bytes does not fit a {}-byte block",
                layout.slot_size(),
                tx.block_size()
            )));
        }
        let mut scan = Self {
            tx,
            layout,
            file_name: record_file_name(table_name),
            slots_per_block,
            current_block: None,
            current_slot: None,
            current_record: None,
        };
        scan.before_first()?;
        Ok(scan)
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn move_to_block(&mut self, number: usize) -> Result<()> {
        let block = BlockId::new(self.file_name.clone(), number);
        if self.current_block.as_ref() != Some(&block) {
            self.release_block();
            self.tx.pin(&block)?;
            self.current_block = Some(block);
        }
        self.current_slot = None;
        self.current_record = None;
        Ok(())
    }

    fn release_block(&mut self) {
        if let Some(block) = self.current_block.take() {
            self.tx.unpin(&block);
        }
    }

    fn positioned(&self) -> Result<(&BlockId, usize)> {
        match (&self.current_block, self.current_slot) {
            (Some(block), Some(slot)) if self.current_record.is_some() => Ok((block, slot)),
            _ => Err(Error::query_execution(format!(
                "scan over {} is not positioned on a record",
                self.file_name
            ))),
        }
    }
}

impl Scan for TableScan {
    fn before_first(&mut self) -> Result<()> {
        if self.tx.size(&self.file_name)? > 0 {
            self.move_to_block(0)?;
        } else {
            self.release_block();
            self.current_slot = None;
            self.current_record = None;
        }
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        loop {
            let block = match &self.current_block {
                Some(block) => block.clone(),
                None => return Ok(false),
            };
            let start = self.current_slot.map_or(0, |slot| slot + 1);
            for slot in start..self.slots_per_block {
                if let Some(record) = self.tx.read_record(&block, slot)? {
                    self.current_slot = Some(slot);
                    self.current_record = Some(record);
                    return Ok(true);
                }
            }
            if block.number + 1 >= self.tx.size(&self.file_name)? {
                self.current_slot = Some(self.slots_per_block);
                self.current_record = None;
                return Ok(false);
            }
            self.move_to_block(block.number + 1)?;
        }
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        let record = self.current_record.as_ref().ok_or_else(|| {
            Error::query_execution(format!(
                "scan over {} is not positioned on a record",
                self.file_name
            ))
        })?;
        let index = self
            .layout
            .schema()
            .index_of(field)
            .ok_or_else(|| Error::field_not_found(field))?;
        record
            .get(index)
            .cloned()
            .ok_or_else(|| Error::storage(format!("record in {} is truncated", self.file_name)))
    }

    fn has_field(&self, field: &str) -> bool {
        self.layout.schema().has_field(field)
    }

    fn close(&mut self) {
        self.release_block();
        self.current_slot = None;
        self.current_record = None;
    }
}

impl UpdateScan for TableScan {
    fn set_val(&mut self, field: &str, value: Value) -> Result<()> {
        self.layout.check_value(field, &value)?;
        let index = self
            .layout
            .schema()
            .index_of(field)
            .ok_or_else(|| Error::field_not_found(field))?;
        let (block, slot) = {
            let (block, slot) = self.positioned()?;
            (block.clone(), slot)
        };
        if let Some(record) = self.current_record.as_mut() {
            record[index] = value;
            self.tx.write_record(&block, slot, Some(record.as_slice()))?;
        }
        Ok(())
    }

    fn insert(&mut self) -> Result<()> {
        if self.current_block.is_none() {
            if self.tx.size(&self.file_name)? == 0 {
                self.tx.append(&self.file_name)?;
            }
            self.move_to_block(0)?;
        }
        loop {
            let block = match &self.current_block {
                Some(block) => block.clone(),
                None => return Err(Error::storage("insert lost its current block")),
            };
            let start = self.current_slot.map_or(0, |slot| slot + 1);
            for slot in start..self.slots_per_block {
                if self.tx.read_record(&block, slot)?.is_none() {
                    let record = self.layout.empty_record();
                    self.tx.write_record(&block, slot, Some(record.as_slice()))?;
                    self.current_slot = Some(slot);
                    self.current_record = Some(record);
                    return Ok(());
                }
            }
            if block.number + 1 >= self.tx.size(&self.file_name)? {
                let appended = self.tx.append(&self.file_name)?;
                self.move_to_block(appended.number)?;
            } else {
                self.move_to_block(block.number + 1)?;
            }
        }
    }

    fn delete(&mut self) -> Result<()> {
        let (block, slot) = {
            let (block, slot) = self.positioned()?;
            (block.clone(), slot)
        };
        self.tx.write_record(&block, slot, None)?;
        self.current_record = None;
        Ok(())
    }

    fn rid(&self) -> Result<Rid> {
        let (block, slot) = self.positioned()?;
        Ok(Rid::new(block.number, slot))
    }

    fn move_to_rid(&mut self, rid: Rid) -> Result<()> {
        self.move_to_block(rid.block_number)?;
        let block = BlockId::new(self.file_name.clone(), rid.block_number);
        self.current_record = self.tx.read_record(&block, rid.slot)?;
        self.current_slot = Some(rid.slot);
        Ok(())
    }
}

impl Drop for TableScan {
    fn drop(&mut self) {
        self.release_block();
    }
}
