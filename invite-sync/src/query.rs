//! Read-only queries over the search table: phone lookup and leaderboard.
//!
//! Read failures are returned to the caller; there is no placeholder data.

use serde_json::Value;

use invite_bitable::TableService;
use invite_core::{FieldNames, RankingEntry, Record, TableRef};

use crate::error::{read_err, SyncError};

/// Shown in the leaderboard when a row has no usable invitation code.
pub const UNKNOWN_CODE: &str = "未知";

/// Invitation code of the first record whose phone field equals `phone`.
///
/// Returns `None` when no record matches or the matching record has no
/// usable code.
pub fn match_phone(records: &[Record], fields: &FieldNames, phone: &str) -> Option<String> {
    let phone = phone.trim();
    records
        .iter()
        .find(|record| match record.field(&fields.phone) {
            Some(Value::String(s)) => s.trim() == phone,
            Some(Value::Number(n)) => n.to_string() == phone,
            _ => false,
        })
        .and_then(|record| record.invitation_code(&fields.invite_code))
        .map(str::to_string)
}

/// Project records into leaderboard rows, highest count first.
///
/// Rows whose name is missing, empty, blank or the placeholder `未知` are
/// dropped. Ties keep table order.
pub fn build_ranking(records: &[Record], fields: &FieldNames) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = records
        .iter()
        .filter_map(|record| {
            let name = record.field(&fields.name).and_then(display_name)?;
            if name == UNKNOWN_CODE {
                return None;
            }
            Some(RankingEntry {
                name,
                invite_code: record
                    .invitation_code(&fields.invite_code)
                    .unwrap_or(UNKNOWN_CODE)
                    .to_string(),
                invite_count: record.count(&fields.invite_count),
            })
        })
        .collect();
    entries.sort_by(|a, b| b.invite_count.cmp(&a.invite_count));
    entries
}

/// Render a name cell: plain text, a non-zero number, or the joined `text`
/// of a rich-text segment list. `None` when nothing printable remains.
fn display_name(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        Value::Array(segments) => segments
            .iter()
            .filter_map(|segment| match segment {
                Value::String(s) => Some(s.as_str()),
                Value::Object(obj) => obj
                    .get("text")
                    .or_else(|| obj.get("name"))
                    .and_then(Value::as_str),
                _ => None,
            })
            .collect::<String>()
            .trim()
            .to_string(),
        Value::Object(obj) => obj
            .get("text")
            .or_else(|| obj.get("name"))
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    };
    (!rendered.is_empty()).then_some(rendered)
}

pub async fn find_invite_code(
    service: &dyn TableService,
    table: &TableRef,
    fields: &FieldNames,
    phone: &str,
) -> Result<Option<String>, SyncError> {
    let records = service
        .list_records(table)
        .await
        .map_err(|e| read_err("search", table, e))?;
    tracing::debug!("searching {} records for phone", records.len());
    Ok(match_phone(&records, fields, phone))
}

pub async fn ranking(
    service: &dyn TableService,
    table: &TableRef,
    fields: &FieldNames,
) -> Result<Vec<RankingEntry>, SyncError> {
    let records = service
        .list_records(table)
        .await
        .map_err(|e| read_err("ranking", table, e))?;
    Ok(build_ranking(&records, fields))
}
