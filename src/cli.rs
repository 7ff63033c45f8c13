//! CLI интерфейс для rustdb-query
//!
//! Загружает учебную базу, выполняет учебные запросы и показывает выбранные планы

use crate::common::{EngineConfig, Result, Row, Value};
use crate::demo::{run_plan, sample_queries, DemoDatabase, DemoQuery};
use crate::planner::settings::{JoinPolicy, JoinStrategy, PlannerSettings};
use crate::query::plan::explain;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;

/// rustdb-query - исполнитель запросов и оптимизатор соединений RustDB
#[derive(Parser, Debug)]
#[command(name = "rustdb-query")]
#[command(about = "RustDB query execution and join optimization engine")]
#[command(version)]
pub struct Cli {
    /// Конфигурационный файл (TOML)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Уровень детализации логирования
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Формат вывода
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Формат вывода результатов
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Параметры планировщика из командной строки
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PlannerArgs {
    /// Политика выбора соединения (cost_based, product_only)
    #[arg(long)]
    pub policy: Option<JoinPolicy>,

    /// Разрешенная стратегия соединения; можно указать несколько раз
    #[arg(long = "strategy")]
    pub strategies: Vec<JoinStrategy>,

    /// Дополнительные сгенерированные студенты
    #[arg(long, default_value_t = 0)]
    pub extra_students: usize,

    /// Имя учебного запроса; без него выполняются все
    #[arg(long)]
    pub query: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Загрузить учебную базу и выполнить учебные запросы
    Demo(PlannerArgs),

    /// Показать выбранные планы с оценками стоимости
    Explain(PlannerArgs),

    /// Показать действующую конфигурацию
    Config,
}

impl Cli {
    /// Загружает конфигурацию: умолчания, файл, переменные окружения, аргументы
    pub fn load_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };
        config = config.merge(EngineConfig::from_env()?);
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// Выполняет команду, печатая результат в `out`
    pub fn execute(&self, config: &EngineConfig, out: &mut dyn Write) -> Result<()> {
        match &self.command {
            Some(Commands::Demo(args)) => self.run_demo(config, args, out),
            Some(Commands::Explain(args)) => self.run_explain(config, args, out),
            Some(Commands::Config) => {
                write!(out, "{}", config.to_toml()?)?;
                Ok(())
            }
            None => {
                writeln!(
                    out,
                    "rustdb-query v{}: используйте --help для получения справки",
                    crate::VERSION
                )?;
                Ok(())
            }
        }
    }

    fn run_demo(&self, config: &EngineConfig, args: &PlannerArgs, out: &mut dyn Write) -> Result<()> {
        let db = DemoDatabase::load_with_extra_students(config, args.extra_students)?;
        let planner = db.planner(planner_settings(config, args));
        let mut report = Vec::new();
        for demo in selected_queries(args)? {
            let plan = planner.create_plan(&demo.query)?;
            let rows = run_plan(plan.as_ref())?;
            match self.format {
                OutputFormat::Table => {
                    writeln!(out, "-- {}: {}", demo.name, demo.query)?;
                    write!(out, "{}", format_table(&plan.schema().fields(), &rows))?;
                    writeln!(out)?;
                }
                OutputFormat::Json => report.push(serde_json::json!({
                    "name": demo.name,
                    "query": demo.query.to_string(),
                    "rows": rows.iter().map(row_to_json).collect::<Vec<_>>(),
                })),
            }
        }
        if self.format == OutputFormat::Json {
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        Ok(())
    }

    fn run_explain(
        &self,
        config: &EngineConfig,
        args: &PlannerArgs,
        out: &mut dyn Write,
    ) -> Result<()> {
        let db = DemoDatabase::load_with_extra_students(config, args.extra_students)?;
        let planner = db.planner(planner_settings(config, args));
        let mut report = Vec::new();
        for demo in selected_queries(args)? {
            let plan = planner.create_plan(&demo.query)?;
            let tree = explain(plan.as_ref());
            match self.format {
                OutputFormat::Table => {
                    writeln!(out, "-- {}: {}", demo.name, demo.query)?;
                    writeln!(out, "{}", tree)?;
                }
                OutputFormat::Json => report.push(serde_json::json!({
                    "name": demo.name,
                    "query": demo.query.to_string(),
                    "blocks_accessed": plan.blocks_accessed(),
                    "records_output": plan.records_output(),
                    "plan": tree.lines().collect::<Vec<_>>(),
                })),
            }
        }
        if self.format == OutputFormat::Json {
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
        Ok(())
    }
}

fn planner_settings(config: &EngineConfig, args: &PlannerArgs) -> PlannerSettings {
    let mut settings = config.planner_settings();
    if let Some(policy) = args.policy {
        settings.join_policy = policy;
    }
    if !args.strategies.is_empty() {
        settings.enabled_strategies = args.strategies.clone();
    }
    settings
}

fn selected_queries(args: &PlannerArgs) -> Result<Vec<DemoQuery>> {
    let queries = sample_queries();
    match &args.query {
        None => Ok(queries),
        Some(name) => {
            let selected: Vec<DemoQuery> =
                queries.into_iter().filter(|q| q.name == name.as_str()).collect();
            if selected.is_empty() {
                return Err(crate::common::Error::validation(format!(
                    "unknown demo query '{}'",
                    name
                )));
            }
            Ok(selected)
        }
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(v) => serde_json::Value::from(*v),
        Value::Str(s) => serde_json::Value::from(s.as_str()),
    }
}

fn row_to_json(row: &Row) -> serde_json::Value {
    serde_json::Value::Object(
        row.values
            .iter()
            .map(|(field, value)| (field.clone(), value_to_json(value)))
            .collect(),
    )
}

/// Текстовая таблица с выравниванием столбцов
pub fn format_table(fields: &[String], rows: &[Row]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            fields
                .iter()
                .map(|field| match row.get_value(field) {
                    Some(Value::Str(s)) => s.clone(),
                    Some(value) => value.to_string(),
                    None => String::new(),
                })
                .collect()
        })
        .collect();
    let widths: Vec<usize> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(field.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |values: &[String]| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render(fields));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &cells {
        out.push_str(&render(row));
        out.push('\n');
    }
    out.push_str(&format!("({} rows)\n", rows.len()));
    out
}
