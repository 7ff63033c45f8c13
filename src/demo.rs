//! Учебный набор данных: студенты, кафедры и курсы
//!
//! Используется командой `demo` и интеграционными тестами.

use crate::catalog::index::IndexKind;
use crate::catalog::metadata::{Catalog, MetadataRef};
use crate::common::{EngineConfig, Result, Row, Value};
use crate::executor::aggregation::AggregationSpec;
use crate::executor::comparator::SortKey;
use crate::planner::heuristic::HeuristicQueryPlanner;
use crate::planner::query_data::QueryData;
use crate::planner::settings::PlannerSettings;
use crate::query::plan::Plan;
use crate::query::predicate::{CompareOp, Expression, Term};
use crate::query::scan::collect_rows;
use crate::storage::layout::Schema;
use crate::storage::transaction::{StorageEngine, TxRef};
use std::sync::Arc;
use tracing::info;

const STUDENTS: [(i32, &str, i32, i32); 9] = [
    (1, "joe", 10, 2021),
    (2, "amy", 20, 2020),
    (3, "max", 10, 2022),
    (4, "sue", 20, 2022),
    (5, "bob", 30, 2020),
    (6, "kim", 20, 2020),
    (7, "art", 30, 2021),
    (8, "pat", 20, 2019),
    (9, "lee", 10, 2021),
];

const DEPARTMENTS: [(i32, &str); 3] = [(10, "compsci"), (20, "math"), (30, "drama")];

const COURSES: [(i32, &str, i32); 6] = [
    (12, "db systems", 10),
    (22, "compilers", 10),
    (32, "calculus", 20),
    (42, "algebra", 20),
    (52, "acting", 30),
    (62, "elocution", 30),
];

/// Схема `student(sid, sname, majorid, gradyear)`
pub fn student_schema() -> Schema {
    let mut schema = Schema::new();
    schema.add_int_field("sid");
    schema.add_string_field("sname", 10);
    schema.add_int_field("majorid");
    schema.add_int_field("gradyear");
    schema
}

/// Схема `dept(did, dname)`
pub fn dept_schema() -> Schema {
    let mut schema = Schema::new();
    schema.add_int_field("did");
    schema.add_string_field("dname", 10);
    schema
}

/// Схема `course(cid, title, deptid)`
pub fn course_schema() -> Schema {
    let mut schema = Schema::new();
    schema.add_int_field("cid");
    schema.add_string_field("title", 20);
    schema.add_int_field("deptid");
    schema
}

fn student_row(sid: i32, sname: &str, majorid: i32, gradyear: i32) -> Row {
    [
        ("sid", Value::Int(sid)),
        ("sname", Value::from(sname)),
        ("majorid", Value::Int(majorid)),
        ("gradyear", Value::Int(gradyear)),
    ]
    .into_iter()
    .collect()
}

/// Дополнительные студенты с детерминированными значениями
pub fn generated_students(first_sid: i32, count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let sid = first_sid + i as i32;
            let majorid = 10 * (1 + ((i * 7919) % 3) as i32);
            let gradyear = 2019 + ((i * 31) % 4) as i32;
            student_row(sid, &format!("s{}", sid), majorid, gradyear)
        })
        .collect()
}

/// База с учебными данными
pub struct DemoDatabase {
    engine: Arc<StorageEngine>,
    tx: TxRef,
    catalog: Arc<Catalog>,
}

impl DemoDatabase {
    /// Загружает учебные данные
    pub fn load(config: &EngineConfig) -> Result<Self> {
        Self::load_with_extra_students(config, 0)
    }

    /// Загружает учебные данные и `extra` сгенерированных студентов
    pub fn load_with_extra_students(config: &EngineConfig, extra: usize) -> Result<Self> {
        config.validate()?;
        let engine = Arc::new(StorageEngine::from_config(&config.storage));
        let tx: TxRef = engine.begin();
        let catalog = Arc::new(Catalog::new(tx.clone()));

        catalog.create_table("student", student_schema())?;
        catalog.create_table("dept", dept_schema())?;
        catalog.create_table("course", course_schema())?;

        let mut students: Vec<Row> = STUDENTS
            .iter()
            .map(|(sid, sname, majorid, gradyear)| student_row(*sid, sname, *majorid, *gradyear))
            .collect();
        students.extend(generated_students(STUDENTS.len() as i32 + 1, extra));
        catalog.insert_rows("student", &students)?;

        let departments: Vec<Row> = DEPARTMENTS
            .iter()
            .map(|(did, dname)| {
                [("did", Value::Int(*did)), ("dname", Value::from(*dname))]
                    .into_iter()
                    .collect()
            })
            .collect();
        catalog.insert_rows("dept", &departments)?;

        let courses: Vec<Row> = COURSES
            .iter()
            .map(|(cid, title, deptid)| {
                [
                    ("cid", Value::Int(*cid)),
                    ("title", Value::from(*title)),
                    ("deptid", Value::Int(*deptid)),
                ]
                .into_iter()
                .collect()
            })
            .collect();
        catalog.insert_rows("course", &courses)?;

        catalog.create_index("majorid_idx", "student", "majorid", IndexKind::BTree)?;
        catalog.create_index("gradyear_idx", "student", "gradyear", IndexKind::Hash)?;

        info!(
            "Учебные данные загружены: {} студентов, {} кафедр, {} курсов",
            students.len(),
            departments.len(),
            courses.len()
        );
        Ok(Self {
            engine,
            tx,
            catalog,
        })
    }

    pub fn engine(&self) -> &Arc<StorageEngine> {
        &self.engine
    }

    pub fn tx(&self) -> &TxRef {
        &self.tx
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn metadata(&self) -> MetadataRef {
        self.catalog.clone()
    }

    /// Планировщик над учебной базой
    pub fn planner(&self, settings: PlannerSettings) -> HeuristicQueryPlanner {
        HeuristicQueryPlanner::with_settings(self.tx.clone(), self.metadata(), settings)
    }
}

/// Именованный учебный запрос
#[derive(Debug, Clone)]
pub struct DemoQuery {
    pub name: &'static str,
    pub query: QueryData,
}

/// Учебные запросы
pub fn sample_queries() -> Vec<DemoQuery> {
    vec![
        DemoQuery {
            name: "students_with_departments",
            query: QueryData::new(["student", "dept"])
                .select(["sname", "dname"])
                .filter(Term::fields_equal("majorid", "did"))
                .order_by(SortKey::asc("sname")),
        },
        DemoQuery {
            name: "graduates_of_2020",
            query: QueryData::new(["student"])
                .select(["sid", "sname"])
                .filter(Term::field_equals("gradyear", 2020))
                .order_by(SortKey::asc("sid")),
        },
        DemoQuery {
            name: "majors_statistics",
            query: QueryData::new(["student"])
                .select(["majorid", "countofsid", "avgofgradyear", "maxofsname"])
                .group_by(["majorid"])
                .aggregate(AggregationSpec::count("sid"))
                .aggregate(AggregationSpec::avg("gradyear"))
                .aggregate(AggregationSpec::max("sname")),
        },
        DemoQuery {
            name: "graduation_years",
            query: QueryData::new(["student"])
                .select(["gradyear"])
                .distinct()
                .order_by(SortKey::desc("gradyear")),
        },
        DemoQuery {
            name: "courses_of_recent_students",
            query: QueryData::new(["student", "dept", "course"])
                .select(["sname", "dname", "title"])
                .filter(Term::fields_equal("majorid", "did"))
                .filter(Term::fields_equal("deptid", "did"))
                .filter(Term::new(
                    Expression::field("gradyear"),
                    CompareOp::Ge,
                    Expression::constant(2021),
                ))
                .order_by(SortKey::asc("sname"))
                .order_by(SortKey::asc("title")),
        },
    ]
}

/// Открывает план и читает все записи по полям его схемы
pub fn run_plan(plan: &dyn Plan) -> Result<Vec<Row>> {
    let fields = plan.schema().fields();
    let mut scan = plan.open()?;
    let rows = collect_rows(scan.as_mut(), &fields);
    scan.close();
    rows
}
