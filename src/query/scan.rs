//! Интерфейсы курсоров

use crate::common::{Error, Result, Row, Value};
use crate::storage::file::Rid;

/// Курсор, выдающий записи по одной
pub trait Scan {
    /// Устанавливает курсор перед первой записью
    fn before_first(&mut self) -> Result<()>;

    /// Переходит к следующей записи; `false`, если записи закончились
    fn next(&mut self) -> Result<bool>;

    /// Значение поля текущей записи
    fn get_val(&self, field: &str) -> Result<Value>;

    /// Целое значение поля текущей записи
    fn get_int(&self, field: &str) -> Result<i32> {
        self.get_val(field)?.as_int()
    }

    /// Строковое значение поля текущей записи
    fn get_string(&self, field: &str) -> Result<String> {
        match self.get_val(field)? {
            Value::Str(s) => Ok(s),
            other => Err(Error::type_mismatch(format!(
                "field {} holds {}, not a string",
                field, other
            ))),
        }
    }

    /// Проверяет, выдает ли курсор поле
    fn has_field(&self, field: &str) -> bool;

    /// Закрывает курсор и освобождает его ресурсы
    fn close(&mut self);
}

/// Курсор с возможностью изменения записей
pub trait UpdateScan: Scan {
    /// Устанавливает значение поля текущей записи
    fn set_val(&mut self, field: &str, value: Value) -> Result<()>;

    fn set_int(&mut self, field: &str, value: i32) -> Result<()> {
        self.set_val(field, Value::Int(value))
    }

    fn set_string(&mut self, field: &str, value: &str) -> Result<()> {
        self.set_val(field, Value::Str(value.to_string()))
    }

    /// Вставляет новую запись и делает ее текущей
    fn insert(&mut self) -> Result<()>;

    /// Удаляет текущую запись
    fn delete(&mut self) -> Result<()>;

    /// Идентификатор текущей записи
    fn rid(&self) -> Result<Rid>;

    /// Делает текущей запись с заданным идентификатором
    fn move_to_rid(&mut self, rid: Rid) -> Result<()>;
}

/// Читает поля текущей записи курсора в [`Row`]
pub fn read_row(scan: &dyn Scan, fields: &[String]) -> Result<Row> {
    let mut row = Row::new();
    for field in fields {
        row.set_value(field, scan.get_val(field)?);
    }
    Ok(row)
}

/// Копирует поля текущей записи `src` в новую запись `dest`
pub fn copy_record(src: &dyn Scan, dest: &mut dyn UpdateScan, fields: &[String]) -> Result<()> {
    dest.insert()?;
    for field in fields {
        dest.set_val(field, src.get_val(field)?)?;
    }
    Ok(())
}

/// Читает все оставшиеся записи курсора
pub fn collect_rows(scan: &mut dyn Scan, fields: &[String]) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    while scan.next()? {
        rows.push(read_row(scan, fields)?);
    }
    Ok(rows)
}
