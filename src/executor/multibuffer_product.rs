//! Декартово произведение с многобуферным чтением правого входа

use crate::common::{Error, Result, Value};
use crate::executor::buffer_needs::best_factor;
use crate::executor::chunk::ChunkScan;
use crate::executor::materialize::{materialize, MaterializePlan};
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::Scan;
use crate::storage::layout::Schema;
use crate::storage::temp_table::TempTable;
use crate::storage::transaction::TxRef;
use tracing::debug;

/// План произведения: правый вход материализуется и читается порциями
/// по `best_factor(available, size)` блоков, левый пересканируется на каждую порцию
pub struct MultibufferProductPlan {
    tx: TxRef,
    lhs: PlanRef,
    rhs: PlanRef,
    schema: Schema,
    available: usize,
}

impl MultibufferProductPlan {
    /// Число свободных буферов фиксируется в момент создания плана
    pub fn new(tx: TxRef, lhs: PlanRef, rhs: PlanRef) -> Self {
        let mut schema = Schema::new();
        schema.add_all(lhs.schema());
        schema.add_all(rhs.schema());
        let available = tx.available_buffers();
        Self {
            tx,
            lhs,
            rhs,
            schema,
            available,
        }
    }

    /// Число порций правого входа
    pub fn chunk_count(&self) -> usize {
        let size = MaterializePlan::materialized_blocks(&self.tx, self.rhs.as_ref());
        let chunk = best_factor(self.available, size).max(1);
        size.div_ceil(chunk)
    }
}

impl Plan for MultibufferProductPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let rhs = materialize(&self.tx, self.rhs.as_ref())?;
        let lhs = self.lhs.open()?;
        Ok(Box::new(MultibufferProductScan::new(
            self.tx.clone(),
            lhs,
            rhs,
            self.available,
        )?))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        let size = MaterializePlan::materialized_blocks(&self.tx, self.rhs.as_ref());
        size.saturating_add(self.lhs.blocks_accessed().saturating_mul(self.chunk_count()))
    }

    fn records_output(&self) -> usize {
        self.lhs
            .records_output()
            .saturating_mul(self.rhs.records_output())
    }

    fn distinct_values(&self, field: &str) -> usize {
        if self.lhs.schema().has_field(field) {
            self.lhs.distinct_values(field)
        } else {
            self.rhs.distinct_values(field)
        }
    }

    fn describe(&self) -> String {
        "MultibufferProduct".to_string()
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.lhs.clone(), self.rhs.clone()]
    }
}

/// Курсор произведения: внешний цикл по левому входу, внутренний по порции
pub struct MultibufferProductScan {
    tx: TxRef,
    lhs: Box<dyn Scan>,
    chunk: Option<ChunkScan>,
    chunk_size: usize,
    file_size: usize,
    next_block: usize,
    /// Левый вход стоит на записи текущей порции
    lhs_positioned: bool,
    rhs: TempTable,
}

impl MultibufferProductScan {
    /// Размер порции выбирается по `available` свободным буферам
    pub fn new(tx: TxRef, lhs: Box<dyn Scan>, rhs: TempTable, available: usize) -> Result<Self> {
        let file_size = rhs.size()?;
        let chunk_size = best_factor(available, file_size).max(1);
        debug!(
            "Multibuffer product: правый вход {} блоков, порция {} блоков",
            file_size, chunk_size
        );
        Ok(Self {
            tx,
            lhs,
            chunk: None,
            chunk_size,
            file_size,
            next_block: 0,
            lhs_positioned: false,
            rhs,
        })
    }

    fn use_next_chunk(&mut self) -> Result<bool> {
        if let Some(mut chunk) = self.chunk.take() {
            chunk.close();
        }
        if self.next_block >= self.file_size {
            return Ok(false);
        }
        let last = (self.next_block + self.chunk_size - 1).min(self.file_size - 1);
        let chunk = ChunkScan::new(
            self.tx.clone(),
            self.rhs.table_name(),
            self.rhs.layout().clone(),
            self.next_block,
            last,
        )?;
        self.next_block = last + 1;
        self.chunk = Some(chunk);
        self.lhs.before_first()?;
        self.lhs_positioned = false;
        Ok(true)
    }
}

impl Scan for MultibufferProductScan {
    fn before_first(&mut self) -> Result<()> {
        if let Some(mut chunk) = self.chunk.take() {
            chunk.close();
        }
        self.next_block = 0;
        self.lhs_positioned = false;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if self.chunk.is_none() && !self.use_next_chunk()? {
            return Ok(false);
        }
        loop {
            let chunk = self
                .chunk
                .as_mut()
                .ok_or_else(|| Error::query_execution("product lost its chunk"))?;
            if self.lhs_positioned && chunk.next()? {
                return Ok(true);
            }
            if self.lhs.next()? {
                self.lhs_positioned = true;
                chunk.before_first()?;
                continue;
            }
            if !self.use_next_chunk()? {
                return Ok(false);
            }
        }
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        if self.lhs.has_field(field) {
            return self.lhs.get_val(field);
        }
        match &self.chunk {
            Some(chunk) if chunk.has_field(field) => chunk.get_val(field),
            _ => Err(Error::field_not_found(field)),
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.lhs.has_field(field) || self.rhs.layout().schema().has_field(field)
    }

    fn close(&mut self) {
        self.lhs.close();
        if let Some(mut chunk) = self.chunk.take() {
            chunk.close();
        }
    }
}
