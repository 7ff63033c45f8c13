//! Предикаты: выражения, термы и их конъюнкции

use crate::common::{Result, Value};
use crate::query::plan::Plan;
use crate::query::scan::Scan;
use crate::storage::layout::Schema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Операнд терма: константа или имя поля
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expression {
    Constant(Value),
    Field(String),
}

impl Expression {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expression::Constant(value.into())
    }

    pub fn field(name: impl Into<String>) -> Self {
        Expression::Field(name.into())
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            Expression::Constant(v) => Some(v),
            Expression::Field(_) => None,
        }
    }

    pub fn as_field_name(&self) -> Option<&str> {
        match self {
            Expression::Field(name) => Some(name),
            Expression::Constant(_) => None,
        }
    }

    /// Значение выражения на текущей записи курсора
    pub fn evaluate(&self, scan: &dyn Scan) -> Result<Value> {
        match self {
            Expression::Constant(v) => Ok(v.clone()),
            Expression::Field(name) => scan.get_val(name),
        }
    }

    /// Применимо ли выражение к схеме
    pub fn applies_to(&self, schema: &Schema) -> bool {
        match self {
            Expression::Constant(_) => true,
            Expression::Field(name) => schema.has_field(name),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(v) => write!(f, "{}", v),
            Expression::Field(name) => write!(f, "{}", name),
        }
    }
}

/// Оператор сравнения
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// Выполняется ли сравнение для результата `lhs.cmp(rhs)`
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }

    /// Оператор для переставленных операндов
    pub fn flipped(self) -> Self {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            other => other,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Сравнение двух выражений
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub lhs: Expression,
    pub op: CompareOp,
    pub rhs: Expression,
}

/// Коэффициент сокращения для сравнения на неравенство диапазоном
const RANGE_REDUCTION_FACTOR: usize = 3;

impl Term {
    pub fn new(lhs: Expression, op: CompareOp, rhs: Expression) -> Self {
        Self { lhs, op, rhs }
    }

    /// `field = constant`
    pub fn field_equals(field: &str, value: impl Into<Value>) -> Self {
        Self::new(Expression::field(field), CompareOp::Eq, Expression::constant(value))
    }

    /// `lhs = rhs` для двух полей
    pub fn fields_equal(lhs: &str, rhs: &str) -> Self {
        Self::new(Expression::field(lhs), CompareOp::Eq, Expression::field(rhs))
    }

    /// Выполняется ли терм на текущей записи
    pub fn is_satisfied(&self, scan: &dyn Scan) -> Result<bool> {
        let lhs = self.lhs.evaluate(scan)?;
        let rhs = self.rhs.evaluate(scan)?;
        Ok(self.op.matches(lhs.try_cmp(&rhs)?))
    }

    /// Во сколько раз терм сокращает выход плана
    pub fn reduction_factor(&self, plan: &dyn Plan) -> usize {
        let factor = match self.op {
            CompareOp::Eq => match (self.lhs.as_field_name(), self.rhs.as_field_name()) {
                (Some(l), Some(r)) => plan.distinct_values(l).max(plan.distinct_values(r)),
                (Some(l), None) => plan.distinct_values(l),
                (None, Some(r)) => plan.distinct_values(r),
                (None, None) => {
                    if self.lhs == self.rhs {
                        1
                    } else {
                        usize::MAX
                    }
                }
            },
            CompareOp::Ne => 1,
            _ => RANGE_REDUCTION_FACTOR,
        };
        factor.max(1)
    }

    /// Константа, которой терм приравнивает поле
    pub fn equates_with_constant(&self, field: &str) -> Option<&Value> {
        if self.op != CompareOp::Eq {
            return None;
        }
        match (&self.lhs, &self.rhs) {
            (Expression::Field(f), Expression::Constant(v))
            | (Expression::Constant(v), Expression::Field(f))
                if f == field =>
            {
                Some(v)
            }
            _ => None,
        }
    }

    /// Поле, которому терм приравнивает поле
    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        if self.op != CompareOp::Eq {
            return None;
        }
        match (&self.lhs, &self.rhs) {
            (Expression::Field(l), Expression::Field(r)) if l == field => Some(r),
            (Expression::Field(l), Expression::Field(r)) if r == field => Some(l),
            _ => None,
        }
    }

    /// Оператор сравнения поля с константой (поле слева)
    pub fn comparator_for(&self, field: &str) -> Option<CompareOp> {
        match (&self.lhs, &self.rhs) {
            (Expression::Field(f), Expression::Constant(_)) if f == field => Some(self.op),
            (Expression::Constant(_), Expression::Field(f)) if f == field => {
                Some(self.op.flipped())
            }
            _ => None,
        }
    }

    /// Применим ли терм к схеме
    pub fn applies_to(&self, schema: &Schema) -> bool {
        self.lhs.applies_to(schema) && self.rhs.applies_to(schema)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

/// Конъюнкция термов; пустой предикат истинен всегда
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl Predicate {
    /// Пустой предикат
    pub fn new() -> Self {
        Self::default()
    }

    /// Предикат из одного терма
    pub fn from_term(term: Term) -> Self {
        Self { terms: vec![term] }
    }

    /// Добавляет термы другого предиката
    pub fn conjoin_with(&mut self, other: Predicate) {
        self.terms.extend(other.terms);
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Выполняются ли все термы на текущей записи
    pub fn is_satisfied(&self, scan: &dyn Scan) -> Result<bool> {
        for term in &self.terms {
            if !term.is_satisfied(scan)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Произведение коэффициентов сокращения термов
    pub fn reduction_factor(&self, plan: &dyn Plan) -> usize {
        self.terms
            .iter()
            .fold(1usize, |acc, term| acc.saturating_mul(term.reduction_factor(plan)))
    }

    /// Термы, применимые к одной схеме
    pub fn select_sub_pred(&self, schema: &Schema) -> Option<Predicate> {
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| t.applies_to(schema))
            .cloned()
            .collect();
        (!terms.is_empty()).then_some(Predicate { terms })
    }

    /// Термы, применимые к объединению схем, но не к каждой по отдельности
    pub fn join_sub_pred(&self, first: &Schema, second: &Schema) -> Option<Predicate> {
        let mut union = Schema::new();
        union.add_all(first);
        union.add_all(second);
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| !t.applies_to(first) && !t.applies_to(second) && t.applies_to(&union))
            .cloned()
            .collect();
        (!terms.is_empty()).then_some(Predicate { terms })
    }

    /// Константа, которой предикат приравнивает поле
    pub fn equates_with_constant(&self, field: &str) -> Option<&Value> {
        self.terms.iter().find_map(|t| t.equates_with_constant(field))
    }

    /// Поле, которому предикат приравнивает поле
    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        self.terms.iter().find_map(|t| t.equates_with_field(field))
    }

    /// Операторы всех сравнений поля с константами
    pub fn field_comparators(&self, field: &str) -> Vec<CompareOp> {
        self.terms
            .iter()
            .filter_map(|t| t.comparator_for(field))
            .collect()
    }

    /// Пара полей равенства `(поле left, поле right)` между двумя схемами.
    ///
    /// Ориентация определяется схемами, а не порядком операндов в терме.
    pub fn equi_join_fields(&self, left: &Schema, right: &Schema) -> Option<(String, String)> {
        self.terms.iter().find_map(|t| {
            if t.op != CompareOp::Eq {
                return None;
            }
            let (a, b) = (t.lhs.as_field_name()?, t.rhs.as_field_name()?);
            if left.has_field(a) && right.has_field(b) {
                Some((a.to_string(), b.to_string()))
            } else if left.has_field(b) && right.has_field(a) {
                Some((b.to_string(), a.to_string()))
            } else {
                None
            }
        })
    }
}

impl From<Term> for Predicate {
    fn from(term: Term) -> Self {
        Predicate::from_term(term)
    }
}

impl FromIterator<Term> for Predicate {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", parts.join(" and "))
    }
}
