//! Разбиение на упорядоченные серии и попарное слияние серий
//!
//! Общая основа внешней сортировки и устранения дубликатов.

use crate::common::{Result, Value};
use crate::executor::comparator::RecordComparator;
use crate::query::scan::{copy_record, Scan};
use crate::storage::layout::Schema;
use crate::storage::temp_table::TempTable;
use crate::storage::transaction::TxRef;
use std::cmp::Ordering;
use tracing::debug;

/// Режим слияния серий
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Сохранять все записи
    KeepAll,
    /// Пропускать записи, ключ которых равен последнему выданному
    Deduplicate,
}

/// Разбивает вход на естественно упорядоченные серии.
///
/// Новая серия начинается, когда ключ очередной записи меньше ключа предыдущей.
/// Пустой вход дает пустой список.
pub fn split_into_runs(
    tx: &TxRef,
    src: &mut dyn Scan,
    schema: &Schema,
    comparator: &RecordComparator,
) -> Result<Vec<TempTable>> {
    let fields = schema.fields();
    let mut runs = Vec::new();

    src.before_first()?;
    if !src.next()? {
        return Ok(runs);
    }

    let mut current = TempTable::new(tx.clone(), schema.clone());
    let mut dest = current.open()?;
    loop {
        copy_record(src, &mut dest, &fields)?;
        if !src.next()? {
            break;
        }
        if comparator.compare(src, &dest)? == Ordering::Less {
            dest.close();
            runs.push(current);
            current = TempTable::new(tx.clone(), schema.clone());
            dest = current.open()?;
        }
    }
    dest.close();
    runs.push(current);

    debug!("Вход разбит на {} серий", runs.len());
    Ok(runs)
}

/// Сливает две упорядоченные серии в новую.
///
/// В режиме [`MergeMode::Deduplicate`] у каждого слияния свой ключ последней
/// выданной записи, поэтому дубликаты на границе двух серий тоже отбрасываются.
pub fn merge_two_runs(
    tx: &TxRef,
    first: &TempTable,
    second: &TempTable,
    comparator: &RecordComparator,
    mode: MergeMode,
) -> Result<TempTable> {
    let schema = first.layout().schema().clone();
    let fields = schema.fields();
    let mut s1 = first.open()?;
    let mut s2 = second.open()?;
    let result = TempTable::new(tx.clone(), schema);
    let mut dest = result.open()?;

    let mut has1 = s1.next()?;
    let mut has2 = s2.next()?;
    let mut last_key: Option<Vec<Value>> = None;

    while has1 || has2 {
        let take_first = if has1 && has2 {
            comparator.compare(&s1, &s2)? != Ordering::Greater
        } else {
            has1
        };
        let src: &dyn Scan = if take_first { &s1 } else { &s2 };

        match mode {
            MergeMode::KeepAll => copy_record(src, &mut dest, &fields)?,
            MergeMode::Deduplicate => {
                let key = comparator.key_of(src)?;
                let duplicate = match &last_key {
                    Some(previous) => comparator.compare_keys(previous, &key)? == Ordering::Equal,
                    None => false,
                };
                if !duplicate {
                    copy_record(src, &mut dest, &fields)?;
                    last_key = Some(key);
                }
            }
        }

        if take_first {
            has1 = s1.next()?;
        } else {
            has2 = s2.next()?;
        }
    }

    s1.close();
    s2.close();
    dest.close();
    Ok(result)
}

/// Удаляет дубликаты ключа из одной упорядоченной серии
pub fn remove_duplicates(
    tx: &TxRef,
    run: &TempTable,
    comparator: &RecordComparator,
) -> Result<TempTable> {
    let schema = run.layout().schema().clone();
    let fields = schema.fields();
    let mut src = run.open()?;
    let result = TempTable::new(tx.clone(), schema);
    let mut dest = result.open()?;

    let mut last_key: Option<Vec<Value>> = None;
    while src.next()? {
        let key = comparator.key_of(&src)?;
        let duplicate = match &last_key {
            Some(previous) => comparator.compare_keys(previous, &key)? == Ordering::Equal,
            None => false,
        };
        if !duplicate {
            copy_record(&src, &mut dest, &fields)?;
            last_key = Some(key);
        }
    }

    src.close();
    dest.close();
    Ok(result)
}

/// Одна итерация попарного слияния; слитые серии удаляются сразу после слияния
pub fn merge_iteration(
    tx: &TxRef,
    runs: Vec<TempTable>,
    comparator: &RecordComparator,
    mode: MergeMode,
) -> Result<Vec<TempTable>> {
    let mut result = Vec::with_capacity(runs.len().div_ceil(2));
    let mut pending = runs.into_iter();
    while let Some(first) = pending.next() {
        match pending.next() {
            Some(second) => {
                result.push(merge_two_runs(tx, &first, &second, comparator, mode)?);
            }
            None => result.push(first),
        }
    }
    Ok(result)
}

/// Сливает серии, пока их не останется не больше `target`
pub fn merge_until(
    tx: &TxRef,
    mut runs: Vec<TempTable>,
    target: usize,
    comparator: &RecordComparator,
    mode: MergeMode,
) -> Result<Vec<TempTable>> {
    let target = target.max(1);
    while runs.len() > target {
        runs = merge_iteration(tx, runs, comparator, mode)?;
        debug!("После слияния осталось {} серий", runs.len());
    }
    Ok(runs)
}
