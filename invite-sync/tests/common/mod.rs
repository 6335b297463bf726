//! In-memory `TableService` shared by the sync integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use invite_bitable::{BitableError, TableService};
use invite_core::{FieldNames, Record, RecordId, TableRef};
use serde_json::{Map, Value};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn source_table() -> TableRef {
    TableRef::new("appSource", "tblSource")
}

pub fn target_table() -> TableRef {
    TableRef::new("appTarget", "tblTarget")
}

pub fn source_row(id: &str, code: impl Into<Value>) -> Record {
    Record::new(id).with_field(&FieldNames::default().invite_code, code)
}

pub fn target_row(id: &str, code: &str, count: impl Into<Value>) -> Record {
    let fields = FieldNames::default();
    Record::new(id)
        .with_field(&fields.invite_code, code)
        .with_field(&fields.invite_count, count)
}

#[derive(Default)]
pub struct MemoryTables {
    tables: Mutex<HashMap<TableRef, Vec<Record>>>,
    unreadable: Mutex<HashSet<TableRef>>,
    rejected_writes: Mutex<HashSet<RecordId>>,
    writes: Mutex<Vec<(RecordId, Map<String, Value>)>>,
    reads: Mutex<Vec<TableRef>>,
}

impl MemoryTables {
    pub fn with_table(self, table: TableRef, records: Vec<Record>) -> Self {
        self.tables.lock().expect("tables lock").insert(table, records);
        self
    }

    pub fn unreadable(self, table: TableRef) -> Self {
        self.unreadable.lock().expect("unreadable lock").insert(table);
        self
    }

    pub fn reject_writes_to(self, record_id: &str) -> Self {
        self.rejected_writes
            .lock()
            .expect("rejected lock")
            .insert(RecordId::from(record_id));
        self
    }

    pub fn writes(&self) -> Vec<(RecordId, Map<String, Value>)> {
        self.writes.lock().expect("writes lock").clone()
    }

    pub fn reads(&self) -> Vec<TableRef> {
        self.reads.lock().expect("reads lock").clone()
    }

    pub fn records(&self, table: &TableRef) -> Vec<Record> {
        self.tables
            .lock()
            .expect("tables lock")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl TableService for MemoryTables {
    async fn list_records(&self, table: &TableRef) -> Result<Vec<Record>, BitableError> {
        self.reads.lock().expect("reads lock").push(table.clone());
        if self.unreadable.lock().expect("unreadable lock").contains(table) {
            return Err(BitableError::Api {
                endpoint: format!("memory://{table}"),
                code: 91402,
                msg: "NOTEXIST".to_string(),
            });
        }
        Ok(self.records(table))
    }

    async fn update_record(
        &self,
        table: &TableRef,
        record_id: &RecordId,
        fields: Map<String, Value>,
    ) -> Result<(), BitableError> {
        if self
            .rejected_writes
            .lock()
            .expect("rejected lock")
            .contains(record_id)
        {
            return Err(BitableError::Api {
                endpoint: format!("memory://{table}/{record_id}"),
                code: 1254302,
                msg: "RolePermNotAllow".to_string(),
            });
        }

        self.writes
            .lock()
            .expect("writes lock")
            .push((record_id.clone(), fields.clone()));
        let mut tables = self.tables.lock().expect("tables lock");
        if let Some(record) = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| &r.record_id == record_id))
        {
            record.fields.extend(fields);
        }
        Ok(())
    }
}
