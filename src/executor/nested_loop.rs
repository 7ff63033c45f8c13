//! Блочное соединение вложенными циклами
//!
//! Вход с меньшей оценкой числа записей становится внешним и материализуется во
//! временную таблицу при открытии. Внешняя таблица читается порциями по
//! `max(available - 2, 1)` блоков; внутренний вход сканируется один раз на
//! порцию, и каждая его запись проверяется со всеми записями порции.
//!
//! Если порция состоит из одного блока (внешняя таблица не больше блока или
//! буферов хватает только на один блок), используется простая форма: внешняя
//! таблица читается напрямую, а закладка на начало текущего блока
//! восстанавливается для каждой записи внутреннего входа.

use crate::common::constants::NESTED_LOOP_RESERVED_BUFFERS;
use crate::common::{Error, Result, Value};
use crate::executor::chunk::ChunkScan;
use crate::executor::materialize::materialize;
use crate::query::plan::{Plan, PlanRef};
use crate::query::predicate::Predicate;
use crate::query::scan::{Scan, UpdateScan};
use crate::storage::file::Rid;
use crate::storage::layout::Schema;
use crate::storage::table_scan::TableScan;
use crate::storage::temp_table::TempTable;
use crate::storage::transaction::TxRef;
use tracing::debug;

/// Форма соединения, выбранная при открытии
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestedLoopForm {
    /// Порции по нескольку блоков в памяти
    Block,
    /// Один блок, закладка на его начало
    Simple,
}

/// Выбор формы по размеру внешней таблицы и емкости порции
pub fn choose_form(outer_blocks: usize, capacity: usize) -> NestedLoopForm {
    if outer_blocks <= 1 || capacity <= 1 {
        NestedLoopForm::Simple
    } else {
        NestedLoopForm::Block
    }
}

/// Емкость порции в блоках при заданном числе свободных буферов
pub fn chunk_capacity(available_buffers: usize) -> usize {
    available_buffers
        .saturating_sub(NESTED_LOOP_RESERVED_BUFFERS)
        .max(1)
}

/// Стоимость: `outer + ceil(outer / capacity) * inner`
pub fn nested_loop_cost(outer_blocks: usize, inner_blocks: usize, capacity: usize) -> usize {
    let chunks = outer_blocks.div_ceil(capacity.max(1));
    outer_blocks.saturating_add(chunks.saturating_mul(inner_blocks))
}

/// План соединения вложенными циклами
pub struct NestedLoopJoinPlan {
    tx: TxRef,
    outer: PlanRef,
    inner: PlanRef,
    predicate: Predicate,
    schema: Schema,
    capacity: usize,
}

impl NestedLoopJoinPlan {
    /// Емкость порции фиксируется по свободным буферам в момент создания плана
    pub fn new(tx: TxRef, p1: PlanRef, p2: PlanRef, predicate: Predicate) -> Self {
        let mut schema = Schema::new();
        schema.add_all(p1.schema());
        schema.add_all(p2.schema());
        let (outer, inner) = if p1.records_output() < p2.records_output() {
            (p1, p2)
        } else {
            (p2, p1)
        };
        let capacity = chunk_capacity(tx.available_buffers());
        Self {
            tx,
            outer,
            inner,
            predicate,
            schema,
            capacity,
        }
    }

    pub fn outer(&self) -> &PlanRef {
        &self.outer
    }

    pub fn inner(&self) -> &PlanRef {
        &self.inner
    }

    /// Емкость порции в блоках
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Plan for NestedLoopJoinPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let capacity = self.capacity();
        let outer = materialize(&self.tx, self.outer.as_ref())?;
        let outer_blocks = outer.size()?;
        let inner = self.inner.open()?;
        let form = choose_form(outer_blocks, capacity);
        debug!(
            "Nested loop: внешняя таблица {} блоков, порция {} блоков, форма {:?}",
            outer_blocks, capacity, form
        );
        match form {
            NestedLoopForm::Block => Ok(Box::new(BlockNestedLoopScan::new(
                self.tx.clone(),
                inner,
                outer,
                capacity,
                self.predicate.clone(),
            )?)),
            NestedLoopForm::Simple => Ok(Box::new(SimpleNestedLoopScan::new(
                inner,
                outer,
                self.predicate.clone(),
            )?)),
        }
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        nested_loop_cost(
            self.outer.blocks_accessed(),
            self.inner.blocks_accessed(),
            self.capacity(),
        )
    }

    fn records_output(&self) -> usize {
        self.outer
            .records_output()
            .saturating_mul(self.inner.records_output())
    }

    fn distinct_values(&self, field: &str) -> usize {
        if self.outer.schema().has_field(field) {
            self.outer.distinct_values(field)
        } else {
            self.inner.distinct_values(field)
        }
    }

    fn describe(&self) -> String {
        format!("NestedLoopJoin({})", self.predicate)
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.outer.clone(), self.inner.clone()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    BeforeFirst,
    Running,
    Done,
}

/// Блочная форма: порции внешней таблицы в памяти
pub struct BlockNestedLoopScan {
    tx: TxRef,
    inner: Box<dyn Scan>,
    chunk: Option<ChunkScan>,
    predicate: Predicate,
    capacity: usize,
    outer_blocks: usize,
    next_block: usize,
    state: LoopState,
    outer: TempTable,
}

impl BlockNestedLoopScan {
    pub fn new(
        tx: TxRef,
        inner: Box<dyn Scan>,
        outer: TempTable,
        capacity: usize,
        predicate: Predicate,
    ) -> Result<Self> {
        let outer_blocks = outer.size()?;
        Ok(Self {
            tx,
            inner,
            chunk: None,
            predicate,
            capacity: capacity.max(1),
            outer_blocks,
            next_block: 0,
            state: LoopState::BeforeFirst,
            outer,
        })
    }

    /// Загружает следующую порцию и ставит обе стороны на первую пару
    fn use_next_chunk(&mut self) -> Result<bool> {
        loop {
            if let Some(mut chunk) = self.chunk.take() {
                chunk.close();
            }
            if self.next_block >= self.outer_blocks {
                return Ok(false);
            }
            let last = (self.next_block + self.capacity - 1).min(self.outer_blocks - 1);
            let mut chunk = ChunkScan::new(
                self.tx.clone(),
                self.outer.table_name(),
                self.outer.layout().clone(),
                self.next_block,
                last,
            )?;
            debug!("Порция блоков [{}, {}]", self.next_block, last);
            self.next_block = last + 1;

            self.inner.before_first()?;
            if !self.inner.next()? {
                return Ok(false);
            }
            let has_row = chunk.next()?;
            self.chunk = Some(chunk);
            if has_row {
                return Ok(true);
            }
        }
    }

    /// Переходит к следующей паре (внутренняя запись, запись порции)
    fn advance(&mut self) -> Result<bool> {
        match self.state {
            LoopState::Done => return Ok(false),
            LoopState::BeforeFirst => {
                self.state = LoopState::Running;
                if !self.use_next_chunk()? {
                    self.state = LoopState::Done;
                    return Ok(false);
                }
                return Ok(true);
            }
            LoopState::Running => {}
        }

        let chunk = self
            .chunk
            .as_mut()
            .ok_or_else(|| Error::query_execution("nested loop lost its chunk"))?;
        if chunk.next()? {
            return Ok(true);
        }
        if self.inner.next()? {
            chunk.before_first()?;
            if chunk.next()? {
                return Ok(true);
            }
        }
        if self.use_next_chunk()? {
            Ok(true)
        } else {
            self.state = LoopState::Done;
            Ok(false)
        }
    }
}

impl Scan for BlockNestedLoopScan {
    fn before_first(&mut self) -> Result<()> {
        if let Some(mut chunk) = self.chunk.take() {
            chunk.close();
        }
        self.next_block = 0;
        self.state = LoopState::BeforeFirst;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        while self.advance()? {
            if self.predicate.is_satisfied(&*self)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        if self.inner.has_field(field) {
            return self.inner.get_val(field);
        }
        match &self.chunk {
            Some(chunk) if chunk.has_field(field) => chunk.get_val(field),
            _ => Err(Error::field_not_found(field)),
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.inner.has_field(field) || self.outer.layout().schema().has_field(field)
    }

    fn close(&mut self) {
        self.inner.close();
        if let Some(mut chunk) = self.chunk.take() {
            chunk.close();
        }
        self.state = LoopState::Done;
    }
}

/// Простая форма: внешняя таблица читается напрямую поблочно
pub struct SimpleNestedLoopScan {
    inner: Box<dyn Scan>,
    outer_scan: TableScan,
    predicate: Predicate,
    bookmark: Option<Rid>,
    next_block_start: Option<Rid>,
    state: LoopState,
    /// Владеет временной таблицей, по которой идет `outer_scan`
    _outer: TempTable,
}

impl SimpleNestedLoopScan {
    pub fn new(inner: Box<dyn Scan>, outer: TempTable, predicate: Predicate) -> Result<Self> {
        let outer_scan = outer.open()?;
        Ok(Self {
            inner,
            outer_scan,
            predicate,
            bookmark: None,
            next_block_start: None,
            state: LoopState::BeforeFirst,
            _outer: outer,
        })
    }

    /// Запоминает текущую запись внешней таблицы как закладку
    pub fn save_position(&mut self) -> Result<()> {
        self.bookmark = Some(self.outer_scan.rid()?);
        Ok(())
    }

    /// Возвращает внешнюю таблицу к закладке
    pub fn restore_position(&mut self) -> Result<()> {
        let rid = self
            .bookmark
            .ok_or_else(|| Error::query_execution("nested loop has no saved position"))?;
        self.outer_scan.move_to_rid(rid)
    }

    /// Начинает блок внешней таблицы с записи `start`
    fn enter_block(&mut self, start: Rid) -> Result<bool> {
        self.outer_scan.move_to_rid(start)?;
        self.save_position()?;
        self.inner.before_first()?;
        if self.inner.next()? {
            self.state = LoopState::Running;
            Ok(true)
        } else {
            self.state = LoopState::Done;
            Ok(false)
        }
    }

    fn advance(&mut self) -> Result<bool> {
        match self.state {
            LoopState::Done => Ok(false),
            LoopState::BeforeFirst => {
                self.outer_scan.before_first()?;
                if !self.outer_scan.next()? {
                    self.state = LoopState::Done;
                    return Ok(false);
                }
                let start = self.outer_scan.rid()?;
                self.enter_block(start)
            }
            LoopState::Running => {
                let block = self
                    .bookmark
                    .map(|rid| rid.block_number)
                    .ok_or_else(|| Error::query_execution("nested loop lost its bookmark"))?;
                if self.outer_scan.next()? {
                    let rid = self.outer_scan.rid()?;
                    if rid.block_number == block {
                        return Ok(true);
                    }
                    self.next_block_start = Some(rid);
                } else {
                    self.next_block_start = None;
                }

                if self.inner.next()? {
                    self.restore_position()?;
                    return Ok(true);
                }
                match self.next_block_start.take() {
                    Some(start) => self.enter_block(start),
                    None => {
                        self.state = LoopState::Done;
                        Ok(false)
                    }
                }
            }
        }
    }
}

impl Scan for SimpleNestedLoopScan {
    fn before_first(&mut self) -> Result<()> {
        self.bookmark = None;
        self.next_block_start = None;
        self.state = LoopState::BeforeFirst;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        while self.advance()? {
            if self.predicate.is_satisfied(&*self)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        if self.inner.has_field(field) {
            self.inner.get_val(field)
        } else {
            self.outer_scan.get_val(field)
        }
    }

    fn has_field(&self, field: &str) -> bool {
        self.inner.has_field(field) || self.outer_scan.has_field(field)
    }

    fn close(&mut self) {
        self.inner.close();
        self.outer_scan.close();
        self.state = LoopState::Done;
    }
}
