//! Агрегатные функции
//!
//! Функция создается заново для каждого открытия курсора группировки.
//! `process_first` начинает новую группу и сбрасывает все накопленное состояние,
//! `process_next` добавляет запись к текущей группе.

use crate::common::constants::{AVG_PREFIX, COUNT_PREFIX, MAX_PREFIX, MIN_PREFIX, SUM_PREFIX};
use crate::common::{Error, Result, Value};
use crate::query::scan::Scan;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Вид агрегатной функции
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregationKind {
    /// Префикс имени выходного поля
    pub fn prefix(self) -> &'static str {
        match self {
            AggregationKind::Count => COUNT_PREFIX,
            AggregationKind::Sum => SUM_PREFIX,
            AggregationKind::Avg => AVG_PREFIX,
            AggregationKind::Min => MIN_PREFIX,
            AggregationKind::Max => MAX_PREFIX,
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregationKind::Count => "count",
            AggregationKind::Sum => "sum",
            AggregationKind::Avg => "avg",
            AggregationKind::Min => "min",
            AggregationKind::Max => "max",
        };
        f.write_str(name)
    }
}

/// Описание агрегатной функции в запросе
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregationSpec {
    pub kind: AggregationKind,
    pub field: String,
    #[serde(default)]
    pub distinct: bool,
}

impl AggregationSpec {
    pub fn new(kind: AggregationKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            distinct: false,
        }
    }

    pub fn count(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::Count, field)
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::Sum, field)
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::Avg, field)
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::Min, field)
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::new(AggregationKind::Max, field)
    }

    /// Вариант функции по различным значениям
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Имя выходного поля, например `countofsname`
    pub fn output_field_name(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.field)
    }

    /// Создает новый экземпляр функции
    pub fn create(&self) -> Box<dyn AggregationFn> {
        let field = self.field.clone();
        match self.kind {
            AggregationKind::Count => Box::new(CountFn::new(field, self.distinct)),
            AggregationKind::Sum => Box::new(SumFn::new(field, self.distinct)),
            AggregationKind::Avg => Box::new(AvgFn::new(field, self.distinct)),
            AggregationKind::Min => Box::new(MinFn::new(field)),
            AggregationKind::Max => Box::new(MaxFn::new(field)),
        }
    }
}

impl fmt::Display for AggregationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.distinct {
            write!(f, "{}(distinct {})", self.kind, self.field)
        } else {
            write!(f, "{}({})", self.kind, self.field)
        }
    }
}

/// Агрегатная функция над группой записей
pub trait AggregationFn {
    /// Начинает новую группу с текущей записи курсора
    fn process_first(&mut self, scan: &dyn Scan) -> Result<()>;

    /// Добавляет текущую запись курсора к группе
    fn process_next(&mut self, scan: &dyn Scan) -> Result<()>;

    /// Значение функции для текущей группы
    fn value(&self) -> Result<Value>;

    /// Имя выходного поля
    fn output_field_name(&self) -> String;

    /// Имя агрегируемого поля
    fn source_field_name(&self) -> &str;

    /// Всегда ли значение целое
    fn is_always_integer(&self) -> bool;
}

fn not_primed(kind: AggregationKind, field: &str) -> Error {
    Error::aggregation_not_primed(format!("{}({})", kind, field))
}

fn to_int(total: i64, kind: AggregationKind, field: &str) -> Result<Value> {
    i32::try_from(total).map(Value::Int).map_err(|_| {
        Error::query_execution(format!("{}({}) overflows int: {}", kind, field, total))
    })
}

/// Накопитель суммы целых значений с учетом различных значений
#[derive(Debug, Default)]
struct IntAccumulator {
    sum: i64,
    count: i64,
    values: HashSet<i32>,
}

impl IntAccumulator {
    fn reset(&mut self) {
        self.sum = 0;
        self.count = 0;
        self.values.clear();
    }

    fn add(&mut self, value: i32, kind: AggregationKind, field: &str) -> Result<()> {
        self.sum = self.sum.checked_add(i64::from(value)).ok_or_else(|| {
            Error::query_execution(format!("{}({}) overflows", kind, field))
        })?;
        self.count += 1;
        self.values.insert(value);
        Ok(())
    }

    /// Сумма и количество (по различным значениям, если `distinct`)
    fn totals(&self, distinct: bool) -> (i64, i64) {
        if distinct {
            let sum = self.values.iter().map(|v| i64::from(*v)).sum();
            (sum, self.values.len() as i64)
        } else {
            (self.sum, self.count)
        }
    }
}

/// `count(field)`; с `distinct` считает различные значения поля
pub struct CountFn {
    field: String,
    distinct: bool,
    count: Option<i64>,
    seen: HashSet<Value>,
}

impl CountFn {
    pub fn new(field: String, distinct: bool) -> Self {
        Self {
            field,
            distinct,
            count: None,
            seen: HashSet::new(),
        }
    }
}

impl AggregationFn for CountFn {
    fn process_first(&mut self, scan: &dyn Scan) -> Result<()> {
        self.seen.clear();
        self.count = Some(0);
        self.process_next(scan)
    }

    fn process_next(&mut self, scan: &dyn Scan) -> Result<()> {
        let count = self
            .count
            .as_mut()
            .ok_or_else(|| not_primed(AggregationKind::Count, &self.field))?;
        if self.distinct {
            self.seen.insert(scan.get_val(&self.field)?);
            *count = self.seen.len() as i64;
        } else {
            *count += 1;
        }
        Ok(())
    }

    fn value(&self) -> Result<Value> {
        let count = self
            .count
            .ok_or_else(|| not_primed(AggregationKind::Count, &self.field))?;
        to_int(count, AggregationKind::Count, &self.field)
    }

    fn output_field_name(&self) -> String {
        format!("{}{}", COUNT_PREFIX, self.field)
    }

    fn source_field_name(&self) -> &str {
        &self.field
    }

    fn is_always_integer(&self) -> bool {
        true
    }
}

/// `sum(field)` над целым полем
pub struct SumFn {
    field: String,
    distinct: bool,
    acc: Option<IntAccumulator>,
}

impl SumFn {
    pub fn new(field: String, distinct: bool) -> Self {
        Self {
            field,
            distinct,
            acc: None,
        }
    }
}

impl AggregationFn for SumFn {
    fn process_first(&mut self, scan: &dyn Scan) -> Result<()> {
        self.acc.get_or_insert_with(IntAccumulator::default).reset();
        self.process_next(scan)
    }

    fn process_next(&mut self, scan: &dyn Scan) -> Result<()> {
        let value = scan.get_int(&self.field)?;
        let acc = self
            .acc
            .as_mut()
            .ok_or_else(|| not_primed(AggregationKind::Sum, &self.field))?;
        acc.add(value, AggregationKind::Sum, &self.field)
    }

    fn value(&self) -> Result<Value> {
        let acc = self
            .acc
            .as_ref()
            .ok_or_else(|| not_primed(AggregationKind::Sum, &self.field))?;
        let (sum, _) = acc.totals(self.distinct);
        to_int(sum, AggregationKind::Sum, &self.field)
    }

    fn output_field_name(&self) -> String {
        format!("{}{}", SUM_PREFIX, self.field)
    }

    fn source_field_name(&self) -> &str {
        &self.field
    }

    fn is_always_integer(&self) -> bool {
        true
    }
}

/// `avg(field)`: целочисленное деление суммы на количество
pub struct AvgFn {
    field: String,
    distinct: bool,
    acc: Option<IntAccumulator>,
}

impl AvgFn {
    pub fn new(field: String, distinct: bool) -> Self {
        Self {
            field,
            distinct,
            acc: None,
        }
    }
}

impl AggregationFn for AvgFn {
    fn process_first(&mut self, scan: &dyn Scan) -> Result<()> {
        self.acc.get_or_insert_with(IntAccumulator::default).reset();
        self.process_next(scan)
    }

    fn process_next(&mut self, scan: &dyn Scan) -> Result<()> {
        let value = scan.get_int(&self.field)?;
        let acc = self
            .acc
            .as_mut()
            .ok_or_else(|| not_primed(AggregationKind::Avg, &self.field))?;
        acc.add(value, AggregationKind::Avg, &self.field)
    }

    fn value(&self) -> Result<Value> {
        let acc = self
            .acc
            .as_ref()
            .ok_or_else(|| not_primed(AggregationKind::Avg, &self.field))?;
        let (sum, count) = acc.totals(self.distinct);
        if count == 0 {
            return Err(not_primed(AggregationKind::Avg, &self.field));
        }
        to_int(sum / count, AggregationKind::Avg, &self.field)
    }

    fn output_field_name(&self) -> String {
        format!("{}{}", AVG_PREFIX, self.field)
    }

    fn source_field_name(&self) -> &str {
        &self.field
    }

    fn is_always_integer(&self) -> bool {
        true
    }
}

/// Минимум или максимум значения поля
struct Extremum {
    field: String,
    kind: AggregationKind,
    current: Option<Value>,
}

impl Extremum {
    fn offer(&mut self, scan: &dyn Scan) -> Result<()> {
        let value = scan.get_val(&self.field)?;
        let replace = match &self.current {
            None => true,
            Some(current) => {
                let ordering = value.try_cmp(current)?;
                match self.kind {
                    AggregationKind::Min => ordering.is_lt(),
                    _ => ordering.is_gt(),
                }
            }
        };
        if replace {
            self.current = Some(value);
        }
        Ok(())
    }

    fn value(&self) -> Result<Value> {
        self.current
            .clone()
            .ok_or_else(|| not_primed(self.kind, &self.field))
    }
}

/// `min(field)` над полем любого типа
pub struct MinFn(Extremum);

impl MinFn {
    pub fn new(field: String) -> Self {
        Self(Extremum {
            field,
            kind: AggregationKind::Min,
            current: None,
        })
    }
}

/// `max(field)` над полем любого типа
pub struct MaxFn(Extremum);

impl MaxFn {
    pub fn new(field: String) -> Self {
        Self(Extremum {
            field,
            kind: AggregationKind::Max,
            current: None,
        })
    }
}

macro_rules! extremum_fn {
    ($name:ident, $prefix:expr) => {
        impl AggregationFn for $name {
            fn process_first(&mut self, scan: &dyn Scan) -> Result<()> {
                self.0.current = None;
                self.0.offer(scan)
            }

            fn process_next(&mut self, scan: &dyn Scan) -> Result<()> {
                if self.0.current.is_none() {
                    return Err(not_primed(self.0.kind, &self.0.field));
                }
                self.0.offer(scan)
            }

            fn value(&self) -> Result<Value> {
                self.0.value()
            }

            fn output_field_name(&self) -> String {
                format!("{}{}", $prefix, self.0.field)
            }

            fn source_field_name(&self) -> &str {
                &self.0.field
            }

            fn is_always_integer(&self) -> bool {
                false
            }
        }
    };
}

extremum_fn!(MinFn, MIN_PREFIX);
extremum_fn!(MaxFn, MAX_PREFIX);
