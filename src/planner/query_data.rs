//! Описание запроса, из которого планировщик строит дерево планов

use crate::common::{Error, Result};
use crate::executor::aggregation::AggregationSpec;
use crate::executor::comparator::SortKey;
use crate::query::predicate::{Predicate, Term};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ключ сортировки результата
pub type OrderKey = SortKey;

/// Разобранный запрос `select ... from ... where ... group by ... order by ...`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryData {
    /// Выходные поля; пустой список означает все поля
    pub fields: Vec<String>,
    /// Таблицы в порядке перечисления
    pub tables: Vec<String>,
    pub predicate: Predicate,
    pub group_fields: Vec<String>,
    pub aggregations: Vec<AggregationSpec>,
    pub distinct: bool,
    pub order_by: Vec<OrderKey>,
}

impl QueryData {
    /// Запрос по таблицам без условий
    pub fn new<S: Into<String>>(tables: impl IntoIterator<Item = S>) -> Self {
        Self {
            tables: tables.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn select<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Добавляет терм в конъюнкцию условия
    pub fn filter(mut self, term: Term) -> Self {
        self.predicate.conjoin_with(Predicate::from_term(term));
        self
    }

    pub fn group_by<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.group_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn aggregate(mut self, spec: AggregationSpec) -> Self {
        self.aggregations.push(spec);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn order_by(mut self, key: OrderKey) -> Self {
        self.order_by.push(key);
        self
    }

    /// Выходные поля с учетом агрегатов
    pub fn output_fields(&self) -> Vec<String> {
        let mut fields = self.fields.clone();
        for spec in &self.aggregations {
            let name = spec.output_field_name();
            if !fields.contains(&name) {
                fields.push(name);
            }
        }
        fields
    }

    /// Проверка структуры запроса без обращения к каталогу
    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(Error::validation("query must name at least one table"));
        }
        for (i, table) in self.tables.iter().enumerate() {
            if self.tables[..i].contains(table) {
                return Err(Error::validation(format!("table {} listed twice", table)));
            }
        }
        let grouped = !self.group_fields.is_empty() || !self.aggregations.is_empty();
        if grouped {
            for field in &self.fields {
                let is_group_field = self.group_fields.contains(field);
                let is_aggregate = self
                    .aggregations
                    .iter()
                    .any(|spec| &spec.output_field_name() == field);
                if !is_group_field && !is_aggregate {
                    return Err(Error::validation(format!(
                        "field {} must be grouped or aggregated",
                        field
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for QueryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut columns: Vec<String> = self.fields.clone();
        columns.extend(
            self.aggregations
                .iter()
                .filter(|spec| !self.fields.contains(&spec.output_field_name()))
                .map(|spec| spec.to_string()),
        );
        let columns = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(", ")
        };
        write!(f, "select ")?;
        if self.distinct {
            write!(f, "distinct ")?;
        }
        write!(f, "{} from {}", columns, self.tables.join(", "))?;
        if !self.predicate.is_empty() {
            write!(f, " where {}", self.predicate)?;
        }
        if !self.group_fields.is_empty() {
            write!(f, " group by {}", self.group_fields.join(", "))?;
        }
        if !self.order_by.is_empty() {
            let keys: Vec<String> = self.order_by.iter().map(|k| k.to_string()).collect();
            write!(f, " order by {}", keys.join(", "))?;
        }
        Ok(())
    }
}
