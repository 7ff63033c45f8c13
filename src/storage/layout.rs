//! Схема и физическая раскладка записей

use crate::common::constants::{INT_FIELD_SIZE, SLOT_FLAG_SIZE, STRING_LENGTH_PREFIX_SIZE};
use crate::common::{Error, FieldType, Result, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Описание поля схемы
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Тип поля
    pub field_type: FieldType,
    /// Максимальная длина (для строк)
    pub length: usize,
}

/// Упорядоченная схема: имя поля -> описание
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    fields: IndexMap<String, FieldInfo>,
}

impl Schema {
    /// Создает пустую схему
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет поле
    pub fn add_field(&mut self, name: &str, field_type: FieldType, length: usize) {
        self.fields
            .insert(name.to_string(), FieldInfo { field_type, length });
    }

    /// Добавляет целое поле
    pub fn add_int_field(&mut self, name: &str) {
        self.add_field(name, FieldType::Integer, 0);
    }

    /// Добавляет строковое поле с максимальной длиной
    pub fn add_string_field(&mut self, name: &str, length: usize) {
        self.add_field(name, FieldType::Varchar, length);
    }

    /// Копирует описание поля из другой схемы
    pub fn add(&mut self, name: &str, other: &Schema) -> Result<()> {
        let info = other
            .field_info(name)
            .ok_or_else(|| Error::field_not_found(name))?;
        self.add_field(name, info.field_type, info.length);
        Ok(())
    }

    /// Добавляет все поля другой схемы (совпадающие имена перезаписываются)
    pub fn add_all(&mut self, other: &Schema) {
        for (name, info) in &other.fields {
            self.fields.insert(name.clone(), *info);
        }
    }

    /// Имена полей в порядке добавления
    pub fn fields(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn field_info(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    /// Тип поля
    pub fn field_type(&self, name: &str) -> Result<FieldType> {
        self.field_info(name)
            .map(|info| info.field_type)
            .ok_or_else(|| Error::field_not_found(name))
    }

    /// Максимальная длина поля
    pub fn length(&self, name: &str) -> Result<usize> {
        self.field_info(name)
            .map(|info| info.length)
            .ok_or_else(|| Error::field_not_found(name))
    }

    /// Позиция поля в записи
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Раскладка записи: схема, смещения полей и размер слота
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    schema: Schema,
    offsets: IndexMap<String, usize>,
    slot_size: usize,
}

impl Layout {
    /// Вычисляет раскладку для схемы
    pub fn new(schema: Schema) -> Self {
        let mut offsets = IndexMap::new();
        let mut pos = SLOT_FLAG_SIZE;
        for (name, info) in &schema.fields {
            offsets.insert(name.clone(), pos);
            pos += match info.field_type {
                FieldType::Integer => INT_FIELD_SIZE,
                FieldType::Varchar => STRING_LENGTH_PREFIX_SIZE + info.length,
            };
        }
        Self {
            schema,
            offsets,
            slot_size: pos,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Смещение поля внутри слота
    pub fn offset(&self, field: &str) -> Result<usize> {
        self.offsets
            .get(field)
            .copied()
            .ok_or_else(|| Error::field_not_found(field))
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Количество слотов в блоке заданного размера
    pub fn slots_per_block(&self, block_size: usize) -> usize {
        block_size / self.slot_size
    }

    /// Количество блоков, занимаемых заданным числом записей
    pub fn blocks_for_records(&self, records: usize, block_size: usize) -> usize {
        let per_block = self.slots_per_block(block_size).max(1);
        records.div_ceil(per_block)
    }

    /// Запись со значениями по умолчанию для каждого поля
    pub fn empty_record(&self) -> Vec<Value> {
        self.schema
            .fields
            .values()
            .map(|info| match info.field_type {
                FieldType::Integer => Value::Int(0),
                FieldType::Varchar => Value::Str(String::new()),
            })
            .collect()
    }

    /// Проверяет, что значение подходит полю по типу и длине
    pub fn check_value(&self, field: &str, value: &Value) -> Result<()> {
        let info = self
            .schema
            .field_info(field)
            .ok_or_else(|| Error::field_not_found(field))?;
        if value.field_type() != info.field_type {
            return Err(Error::type_mismatch(format!(
                "field {} expects {}, got {}",
                field, info.field_type, value
            )));
        }
        if let Value::Str(s) = value {
            if s.chars().count() > info.length {
                return Err(Error::validation(format!(
                    "value {} exceeds varchar({}) of field {}",
                    value, info.length, field
                )));
            }
        }
        Ok(())
    }
}
