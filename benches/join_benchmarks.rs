//! Бенчмарки алгоритмов соединения rustdb-query

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rustdb_query::common::EngineConfig;
use rustdb_query::demo::{run_plan, DemoDatabase};
use rustdb_query::planner::{JoinStrategy, PlannerSettings, QueryData};
use rustdb_query::query::predicate::Term;
use std::hint::black_box;

fn demo_database(extra_students: usize) -> DemoDatabase {
    let mut config = EngineConfig::default();
    config.storage.block_size = 256;
    config.storage.buffer_pool_size = 8;
    DemoDatabase::load_with_extra_students(&config, extra_students).unwrap()
}

fn join_query() -> QueryData {
    QueryData::new(["student", "dept"])
        .select(["sname", "dname"])
        .filter(Term::fields_equal("majorid", "did"))
}

fn join_strategy_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("student_dept_join");
    for students in [100usize, 1000] {
        let db = demo_database(students);
        let query = join_query();
        for strategy in [
            JoinStrategy::NestedLoop,
            JoinStrategy::Hash,
            JoinStrategy::Merge,
            JoinStrategy::Index,
        ] {
            let plan = db
                .planner(PlannerSettings::only(&[strategy]))
                .create_plan(&query)
                .unwrap();
            group.bench_with_input(
                BenchmarkId::new(strategy.to_string(), students),
                &plan,
                |b, plan| {
                    b.iter(|| black_box(run_plan(plan.as_ref()).unwrap().len()));
                },
            );
        }
    }
    group.finish();
}

fn planning_benchmark(c: &mut Criterion) {
    let db = demo_database(500);
    let query = join_query();
    c.bench_function("plan_student_dept_join", |b| {
        b.iter(|| {
            let planner = db.planner(PlannerSettings::default());
            black_box(planner.create_plan(black_box(&query)).unwrap());
        });
    });
}

criterion_group!(benches, join_strategy_benchmark, planning_benchmark);
criterion_main!(benches);
