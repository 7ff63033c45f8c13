//! Внешняя сортировка
//!
//! Вход разбивается на упорядоченные серии, серии сливаются попарно, пока их
//! не останется не больше двух; последние две сливаются на лету курсором.

use crate::common::{Error, Result, Value};
use crate::executor::comparator::{RecordComparator, SortKey};
use crate::executor::materialize::MaterializePlan;
use crate::executor::runs::{merge_until, split_into_runs, MergeMode};
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::{Scan, UpdateScan};
use crate::storage::file::Rid;
use crate::storage::layout::Schema;
use crate::storage::table_scan::TableScan;
use crate::storage::temp_table::TempTable;
use crate::storage::transaction::TxRef;
use std::cmp::Ordering;

/// План сортировки
pub struct SortPlan {
    tx: TxRef,
    src: PlanRef,
    comparator: RecordComparator,
}

impl SortPlan {
    /// Создает план сортировки; все ключи должны быть в схеме входа
    pub fn new(tx: TxRef, src: PlanRef, keys: Vec<SortKey>) -> Result<Self> {
        for key in &keys {
            if !src.schema().has_field(&key.field) {
                return Err(Error::field_not_found(&key.field));
            }
        }
        Ok(Self {
            tx,
            src,
            comparator: RecordComparator::new(keys),
        })
    }

    /// Сортировка по полям по возрастанию
    pub fn on_fields(tx: TxRef, src: PlanRef, fields: &[String]) -> Result<Self> {
        Self::new(tx, src, fields.iter().map(SortKey::asc).collect())
    }

    pub fn comparator(&self) -> &RecordComparator {
        &self.comparator
    }

    /// Открывает отсортированный курсор с сохранением позиции
    pub fn open_sorted(&self) -> Result<SortScan> {
        let mut src = self.src.open()?;
        let runs = split_into_runs(&self.tx, src.as_mut(), self.src.schema(), &self.comparator)?;
        src.close();
        let runs = merge_until(&self.tx, runs, 2, &self.comparator, MergeMode::KeepAll)?;
        SortScan::new(runs, self.src.schema().clone(), self.comparator.clone())
    }
}

impl Plan for SortPlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        Ok(Box::new(self.open_sorted()?))
    }

    fn schema(&self) -> &Schema {
        self.src.schema()
    }

    /// Без учета однократной стоимости сортировки
    fn blocks_accessed(&self) -> usize {
        MaterializePlan::materialized_blocks(&self.tx, self.src.as_ref())
    }

    fn records_output(&self) -> usize {
        self.src.records_output()
    }

    fn distinct_values(&self, field: &str) -> usize {
        self.src.distinct_values(field)
    }

    fn describe(&self) -> String {
        let keys: Vec<String> = self.comparator.keys().iter().map(|k| k.to_string()).collect();
        format!("Sort({})", keys.join(", "))
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.src.clone()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    None,
    First,
    Second,
}

/// Сохраненная позиция курсора сортировки
#[derive(Debug, Clone, Copy)]
struct SortPosition {
    rid1: Option<Rid>,
    rid2: Option<Rid>,
    has_more1: bool,
    has_more2: bool,
    current: Current,
}

/// Курсор, сливающий не более двух отсортированных серий на лету
pub struct SortScan {
    s1: Option<TableScan>,
    s2: Option<TableScan>,
    has_more1: bool,
    has_more2: bool,
    current: Current,
    saved: Option<SortPosition>,
    schema: Schema,
    comparator: RecordComparator,
    /// Серии живут, пока жив курсор
    runs: Vec<TempTable>,
}

impl SortScan {
    pub fn new(runs: Vec<TempTable>, schema: Schema, comparator: RecordComparator) -> Result<Self> {
        if runs.len() > 2 {
            return Err(Error::query_execution(format!(
                "sort scan merges at most two runs, got {}",
                runs.len()
            )));
        }
        let s1 = runs.first().map(TempTable::open).transpose()?;
        let s2 = runs.get(1).map(TempTable::open).transpose()?;
        let mut scan = Self {
            s1,
            s2,
            has_more1: false,
            has_more2: false,
            current: Current::None,
            saved: None,
            schema,
            comparator,
            runs,
        };
        scan.before_first()?;
        Ok(scan)
    }

    /// Количество серий под курсором
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    fn current_scan(&self) -> Result<&TableScan> {
        let scan = match self.current {
            Current::First => self.s1.as_ref(),
            Current::Second => self.s2.as_ref(),
            Current::None => None,
        };
        scan.ok_or_else(|| Error::query_execution("sort scan is not positioned on a record"))
    }

    /// Запоминает текущую позицию обеих серий
    pub fn save_position(&mut self) -> Result<()> {
        let rid_of = |scan: &Option<TableScan>, has_more: bool| -> Result<Option<Rid>> {
            match scan {
                Some(scan) if has_more => scan.rid().map(Some),
                _ => Ok(None),
            }
        };
        self.saved = Some(SortPosition {
            rid1: rid_of(&self.s1, self.has_more1)?,
            rid2: rid_of(&self.s2, self.has_more2)?,
            has_more1: self.has_more1,
            has_more2: self.has_more2,
            current: self.current,
        });
        Ok(())
    }

    /// Возвращает курсор в позицию, сохраненную [`Self::save_position`]
    pub fn restore_position(&mut self) -> Result<()> {
        let saved = self
            .saved
            .ok_or_else(|| Error::query_execution("sort scan has no saved position"))?;
        if let (Some(scan), Some(rid)) = (self.s1.as_mut(), saved.rid1) {
            scan.move_to_rid(rid)?;
        }
        if let (Some(scan), Some(rid)) = (self.s2.as_mut(), saved.rid2) {
            scan.move_to_rid(rid)?;
        }
        self.has_more1 = saved.has_more1;
        self.has_more2 = saved.has_more2;
        self.current = saved.current;
        Ok(())
    }
}

impl Scan for SortScan {
    fn before_first(&mut self) -> Result<()> {
        self.current = Current::None;
        self.has_more1 = match self.s1.as_mut() {
            Some(scan) => {
                scan.before_first()?;
                scan.next()?
            }
            None => false,
        };
        self.has_more2 = match self.s2.as_mut() {
            Some(scan) => {
                scan.before_first()?;
                scan.next()?
            }
            None => false,
        };
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        match self.current {
            Current::First => {
                if let Some(scan) = self.s1.as_mut() {
                    self.has_more1 = scan.next()?;
                }
            }
            Current::Second => {
                if let Some(scan) = self.s2.as_mut() {
                    self.has_more2 = scan.next()?;
                }
            }
            Current::None => {}
        }

        self.current = match (self.has_more1, self.has_more2) {
            (false, false) => Current::None,
            (true, false) => Current::First,
            (false, true) => Current::Second,
            (true, true) => match (&self.s1, &self.s2) {
                (Some(s1), Some(s2)) => {
                    if self.comparator.compare(s1, s2)? == Ordering::Greater {
                        Current::Second
                    } else {
                        Current::First
                    }
                }
                _ => Current::First,
            },
        };
        Ok(self.current != Current::None)
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        self.current_scan()?.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.schema.has_field(field)
    }

    fn close(&mut self) {
        if let Some(scan) = self.s1.as_mut() {
            scan.close();
        }
        if let Some(scan) = self.s2.as_mut() {
            scan.close();
        }
        self.current = Current::None;
    }
}
