//! Обработка ошибок для rustdb-query

use thiserror::Error;

/// Основной тип ошибки исполнителя запросов
#[derive(Error, Debug)]
pub enum Error {
    /// Ошибка I/O операций
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Ошибка JSON сериализации
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка уровня хранения (страницы, файлы, буферы)
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Поле отсутствует в схеме или в текущей записи
    #[error("Field not found: {field}")]
    FieldNotFound { field: String },

    /// Сравнение или операция над значениями несовместимых типов
    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },

    /// Значение агрегатной функции запрошено до process_first
    #[error("Aggregation {function} has not processed any record")]
    AggregationNotPrimed { function: String },

    /// Ошибка планирования запроса
    #[error("Query planning error: {message}")]
    QueryPlanning { message: String },

    /// Ошибка выполнения запроса
    #[error("Query execution error: {message}")]
    QueryExecution { message: String },

    /// Ошибка валидации
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Ошибка конфигурации
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Тип результата для rustdb-query
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Создает ошибку сериализации
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Создает ошибку уровня хранения
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Создает ошибку отсутствующего поля
    pub fn field_not_found(field: impl Into<String>) -> Self {
        Self::FieldNotFound {
            field: field.into(),
        }
    }

    /// Создает ошибку несовместимых типов
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }

    /// Создает ошибку неинициализированной агрегатной функции
    pub fn aggregation_not_primed(function: impl Into<String>) -> Self {
        Self::AggregationNotPrimed {
            function: function.into(),
        }
    }

    /// Создает ошибку планирования запроса
    pub fn query_planning(message: impl Into<String>) -> Self {
        Self::QueryPlanning {
            message: message.into(),
        }
    }

    /// Создает ошибку выполнения запроса
    pub fn query_execution(message: impl Into<String>) -> Self {
        Self::QueryExecution {
            message: message.into(),
        }
    }

    /// Создает ошибку валидации
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Создает ошибку конфигурации
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
