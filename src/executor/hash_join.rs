//! Соединение хешированием по разделам
//!
//! Для каждого раздела `i` левый вход пересканируется, и его записи с
//! `stable_hash(key) % n == i` собираются в хеш-таблицу; затем правый вход
//! сканируется, и каждая его запись раздела `i` с найденным ключом выдается
//! один раз на каждое совпадение слева.

use crate::common::constants::HASH_JOIN_RESERVED_BUFFERS;
use crate::common::{Error, Result, Row, Value};
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::{read_row, Scan};
use crate::storage::layout::Schema;
use crate::storage::transaction::TxRef;
use std::collections::HashMap;
use tracing::debug;

/// Количество разделов при заданном числе свободных буферов
pub fn partition_count(available_buffers: usize) -> usize {
    available_buffers
        .saturating_sub(HASH_JOIN_RESERVED_BUFFERS)
        .max(1)
}

/// Номер раздела значения ключа
pub fn partition_of(value: &Value, partitions: usize) -> usize {
    (value.stable_hash() % partitions.max(1) as u64) as usize
}

/// План соединения хешированием
pub struct HashJoinPlan {
    left: PlanRef,
    right: PlanRef,
    left_field: String,
    right_field: String,
    partitions: usize,
    schema: Schema,
}

impl HashJoinPlan {
    /// Число разделов фиксируется по свободным буферам в момент создания плана
    pub fn new(
        tx: &TxRef,
        left: PlanRef,
        right: PlanRef,
        left_field: &str,
        right_field: &str,
    ) -> Result<Self> {
        if !left.schema().has_field(left_field) {
            return Err(Error::field_not_found(left_field));
        }
        if !right.schema().has_field(right_field) {
            return Err(Error::field_not_found(right_field));
        }
        // Ключи разных типов не попадут ни в один общий бакет
        let left_type = left.schema().field_type(left_field)?;
        let right_type = right.schema().field_type(right_field)?;
        if left_type != right_type {
            return Err(Error::type_mismatch(format!(
                "cannot join {} ({}) with {} ({})",
                left_field, left_type, right_field, right_type
            )));
        }
        let mut schema = Schema::new();
        schema.add_all(left.schema());
        schema.add_all(right.schema());
        Ok(Self {
            left,
            right,
            left_field: left_field.to_string(),
            right_field: right_field.to_string(),
            partitions: partition_count(tx.available_buffers()),
            schema,
        })
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }
}

impl Plan for HashJoinPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let left = self.left.open()?;
        let right = self.right.open()?;
        Ok(Box::new(HashJoinScan::new(
            left,
            right,
            &self.left_field,
            &self.right_field,
            self.left.schema().fields(),
            self.partitions,
        )))
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn blocks_accessed(&self) -> usize {
        self.left
            .blocks_accessed()
            .saturating_add(self.right.blocks_accessed())
            .saturating_mul(3)
    }

    fn records_output(&self) -> usize {
        self.left
            .records_output()
            .saturating_mul(self.right.records_output())
    }

    fn distinct_values(&self, field: &str) -> usize {
        if self.left.schema().has_field(field) {
            self.left.distinct_values(field)
        } else {
            self.right.distinct_values(field)
        }
    }

    fn describe(&self) -> String {
        format!(
            "HashJoin({} = {}, partitions={})",
            self.left_field, self.right_field, self.partitions
        )
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.left.clone(), self.right.clone()]
    }
}

/// Курсор соединения хешированием
pub struct HashJoinScan {
    left: Box<dyn Scan>,
    right: Box<dyn Scan>,
    left_field: String,
    right_field: String,
    left_fields: Vec<String>,
    partitions: usize,
    /// Текущий раздел; `None` до первого вызова `next`
    partition: Option<usize>,
    table: HashMap<Value, Vec<Row>>,
    /// Совпадения слева для текущей правой записи
    matches: Vec<Row>,
    match_index: usize,
}

impl HashJoinScan {
    pub fn new(
        left: Box<dyn Scan>,
        right: Box<dyn Scan>,
        left_field: &str,
        right_field: &str,
        left_fields: Vec<String>,
        partitions: usize,
    ) -> Self {
        Self {
            left,
            right,
            left_field: left_field.to_string(),
            right_field: right_field.to_string(),
            left_fields,
            partitions: partitions.max(1),
            partition: None,
            table: HashMap::new(),
            matches: Vec::new(),
            match_index: 0,
        }
    }

    /// Строит хеш-таблицу раздела по левому входу
    fn load_partition(&mut self, partition: usize) -> Result<()> {
        self.table.clear();
        self.matches.clear();
        self.match_index = 0;
        self.left.before_first()?;
        self.right.before_first()?;
        let mut loaded = 0usize;
        while self.left.next()? {
            let key = self.left.get_val(&self.left_field)?;
            if partition_of(&key, self.partitions) == partition {
                let row = read_row(self.left.as_ref(), &self.left_fields)?;
                self.table.entry(key).or_default().push(row);
                loaded += 1;
            }
        }
        debug!(
            "Hash join: раздел {}/{} загружен, {} записей слева",
            partition + 1,
            self.partitions,
            loaded
        );
        self.partition = Some(partition);
        Ok(())
    }

    fn current_left(&self) -> Result<&Row> {
        self.match_index
            .checked_sub(1)
            .and_then(|i| self.matches.get(i))
            .ok_or_else(|| Error::query_execution("hash join is not positioned on a record"))
    }
}

impl Scan for HashJoinScan {
    fn before_first(&mut self) -> Result<()> {
        self.partition = None;
        self.table.clear();
        self.matches.clear();
        self.match_index = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        let mut partition = match self.partition {
            Some(partition) => partition,
            None => {
                self.load_partition(0)?;
                0
            }
        };
        loop {
            if self.match_index < self.matches.len() {
                self.match_index += 1;
                return Ok(true);
            }
            while self.right.next()? {
                let key = self.right.get_val(&self.right_field)?;
                if partition_of(&key, self.partitions) != partition {
                    continue;
                }
                if let Some(rows) = self.table.get(&key) {
                    self.matches = rows.clone();
                    self.match_index = 1;
                    return Ok(true);
                }
            }
            partition += 1;
            if partition >= self.partitions {
                self.matches.clear();
                self.match_index = 0;
                return Ok(false);
            }
            self.load_partition(partition)?;
        }
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        if self.right.has_field(field) {
            return self.right.get_val(field);
        }
        self.current_left()?.value(field).cloned()
    }

    fn has_field(&self, field: &str) -> bool {
        self.right.has_field(field) || self.left_fields.iter().any(|f| f == field)
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.table.clear();
        self.matches.clear();
    }
}
