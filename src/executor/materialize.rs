//! Материализация входа во временную таблицу

use crate::common::{Result, Value};
use crate::query::plan::{Plan, PlanRef};
use crate::query::scan::{copy_record, Scan, UpdateScan};
use crate::storage::file::Rid;
use crate::storage::layout::{Layout, Schema};
use crate::storage::table_scan::TableScan;
use crate::storage::temp_table::TempTable;
use crate::storage::transaction::TxRef;

/// Копирует все записи курсора во временную таблицу
pub fn copy_into_temp(tx: &TxRef, src: &mut dyn Scan, schema: &Schema) -> Result<TempTable> {
    let table = TempTable::new(tx.clone(), schema.clone());
    let fields = schema.fields();
    let mut dest = table.open()?;
    while src.next()? {
        copy_record(src, &mut dest, &fields)?;
    }
    dest.close();
    Ok(table)
}

/// Материализует план во временную таблицу
pub fn materialize(tx: &TxRef, plan: &dyn Plan) -> Result<TempTable> {
    let mut src = plan.open()?;
    let table = copy_into_temp(tx, src.as_mut(), plan.schema())?;
    src.close();
    Ok(table)
}

/// Курсор по временной таблице, владеющий ею
pub struct TempTableScan {
    scan: TableScan,
    table: TempTable,
}

impl TempTableScan {
    pub fn new(table: TempTable) -> Result<Self> {
        let scan = table.open()?;
        Ok(Self { scan, table })
    }

    pub fn table(&self) -> &TempTable {
        &self.table
    }
}

impl Scan for TempTableScan {
    fn before_first(&mut self) -> Result<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        self.scan.next()
    }

    fn get_val(&self, field: &str) -> Result<Value> {
        self.scan.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.scan.has_field(field)
    }

    fn close(&mut self) {
        self.scan.close();
    }
}

impl UpdateScan for TempTableScan {
    fn set_val(&mut self, field: &str, value: Value) -> Result<()> {
        self.scan.set_val(field, value)
    }

    fn insert(&mut self) -> Result<()> {
        self.scan.insert()
    }

    fn delete(&mut self) -> Result<()> {
        self.scan.delete()
    }

    fn rid(&self) -> Result<Rid> {
        self.scan.rid()
    }

    fn move_to_rid(&mut self, rid: Rid) -> Result<()> {
        self.scan.move_to_rid(rid)
    }
}

/// План материализации
pub struct MaterializePlan {
    tx: TxRef,
    src: PlanRef,
}

impl MaterializePlan {
    pub fn new(tx: TxRef, src: PlanRef) -> Self {
        Self { tx, src }
    }

    /// Оценка числа блоков материализованного входа
    pub fn materialized_blocks(tx: &TxRef, src: &dyn Plan) -> usize {
        let layout = Layout::new(src.schema().clone());
        layout.blocks_for_records(src.records_output(), tx.block_size())
    }
}

impl Plan for MaterializePlan {
    fn open(&self) -> Result<Box<dyn Scan>> {
        let table = materialize(&self.tx, self.src.as_ref())?;
        Ok(Box::new(TempTableScan::new(table)?))
    }

    fn schema(&self) -> &Schema {
        self.src.schema()
    }

    /// Без учета однократной стоимости записи временной таблицы
    fn blocks_accessed(&self) -> usize {
        Self::materialized_blocks(&self.tx, self.src.as_ref())
    }

    fn records_output(&self) -> usize {
        self.src.records_output()
    }

    fn distinct_values(&self, field: &str) -> usize {
        self.src.distinct_values(field)
    }

    fn describe(&self) -> String {
        "Materialize".to_string()
    }

    fn children(&self) -> Vec<PlanRef> {
        vec![self.src.clone()]
    }
}
