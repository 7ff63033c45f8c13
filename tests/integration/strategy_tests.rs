//! Одинаковые результаты при любых стратегиях соединения

use super::common::{execute, load_demo, small_config};
use rustdb_query::common::Result;
use rustdb_query::demo::sample_queries;
use rustdb_query::planner::{JoinStrategy, PlannerSettings};

fn all_settings() -> Vec<PlannerSettings> {
    let mut settings = vec![PlannerSettings::default(), PlannerSettings::product_only()];
    settings.extend(JoinStrategy::ALL.iter().map(|s| PlannerSettings::only(&[*s])));
    settings
}

#[test]
fn test_strategies_agree_on_generated_data() -> Result<()> {
    let db = load_demo(&small_config(), 50);
    for sample in sample_queries() {
        let expected = execute(&db, PlannerSettings::product_only(), &sample.query)?;
        for settings in all_settings() {
            let actual = execute(&db, settings.clone(), &sample.query)?;
            assert_eq!(actual, expected, "{} with {:?}", sample.name, settings);
        }
    }
    Ok(())
}

#[test]
fn test_strategies_agree_with_one_spare_buffer() -> Result<()> {
    let mut config = small_config();
    config.storage.buffer_pool_size = 3;
    let db = load_demo(&config, 30);
    for sample in sample_queries() {
        let expected = execute(&db, PlannerSettings::product_only(), &sample.query)?;
        for strategy in JoinStrategy::ALL {
            let actual = execute(&db, PlannerSettings::only(&[strategy]), &sample.query)?;
            assert_eq!(actual, expected, "{} with {}", sample.name, strategy);
        }
    }
    Ok(())
}
