//! Domain types shared by the bitable client, the sync pipeline and the daemon.
//!
//! Records are owned by the remote table service; nothing here is persisted
//! locally. Field values stay as raw JSON so that text, number and rich-text
//! cells all survive a round trip through the client.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier of a remote record (`record_id` in the bitable API).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A remote table: the app (workspace) token plus the table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub app_token: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(app_token: impl Into<String>, table_id: impl Into<String>) -> Self {
        Self {
            app_token: app_token.into(),
            table_id: table_id.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_token, self.table_id)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row of a remote table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub record_id: RecordId,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(record_id: impl Into<RecordId>) -> Self {
        Self {
            record_id: record_id.into(),
            fields: Map::new(),
        }
    }

    /// Builder used by tests and fixtures.
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The field as a plain string; numbers, arrays and objects yield `None`.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// The field as an invitation code: a string that is non-empty once
    /// surrounding whitespace is trimmed.
    pub fn invitation_code(&self, name: &str) -> Option<&str> {
        self.text(name).map(str::trim).filter(|code| !code.is_empty())
    }

    /// The field as a count, see [`parse_count`].
    pub fn count(&self, name: &str) -> u64 {
        parse_count(self.field(name))
    }
}

/// Lenient integer parsing for count cells.
///
/// Numbers are truncated toward zero. Strings are read up to the first
/// non-digit after optional leading whitespace and sign, so `"12 people"` is
/// 12. Anything negative, missing or unparsable is 0.
pub fn parse_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                v
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f > 0.0 {
                    f.trunc() as u64
                } else {
                    0
                }
            } else {
                0
            }
        }
        Some(Value::String(s)) => parse_count_str(s),
        _ => 0,
    }
}

fn parse_count_str(s: &str) -> u64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    if negative {
        return 0;
    }
    digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u64, |acc, b| {
            acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
        })
}

// ---------------------------------------------------------------------------
// Sync and query results
// ---------------------------------------------------------------------------

/// Invitation code → number of source records carrying it.
///
/// Ordered so that logs and reports list codes deterministically.
pub type InvitationCountMap = BTreeMap<String, u64>;

/// Summary of one reconcile pass over the target table.
///
/// `considered` counts target records whose code appeared in the count map.
/// Each of them lands in exactly one of `updated`, `failed` or `unchanged`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub considered: usize,
    pub updated: usize,
    pub failed: usize,
    pub unchanged: usize,
    /// True iff at least one write succeeded.
    pub success: bool,
}

impl SyncOutcome {
    /// The "no update performed" outcome.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn record_updated(&mut self) {
        self.updated += 1;
        self.success = true;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }
}

/// One row of the inviter leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub name: String,
    pub invite_code: String,
    pub invite_count: u64,
}

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Column names used in the remote tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNames {
    pub phone: String,
    pub invite_code: String,
    pub invite_count: String,
    pub name: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            phone: "通过认证手机号".to_string(),
            invite_code: "邀请人 ID".to_string(),
            invite_count: "邀请人数".to_string(),
            name: "姓名".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn invitation_code_is_trimmed_and_non_empty() {
        let record = Record::new("r1")
            .with_field("code", "  ABC  ")
            .with_field("blank", "   ")
            .with_field("number", 42);
        assert_eq!(record.invitation_code("code"), Some("ABC"));
        assert_eq!(record.invitation_code("blank"), None);
        assert_eq!(record.invitation_code("number"), None);
        assert_eq!(record.invitation_code("missing"), None);
    }

    #[test]
    fn parse_count_handles_numbers_and_strings() {
        assert_eq!(parse_count(Some(&json!(7))), 7);
        assert_eq!(parse_count(Some(&json!(7.9))), 7);
        assert_eq!(parse_count(Some(&json!(-3))), 0);
        assert_eq!(parse_count(Some(&json!("12"))), 12);
        assert_eq!(parse_count(Some(&json!("  12 people"))), 12);
        assert_eq!(parse_count(Some(&json!("+5"))), 5);
        assert_eq!(parse_count(Some(&json!("-5"))), 0);
        assert_eq!(parse_count(Some(&json!("abc"))), 0);
        assert_eq!(parse_count(Some(&json!(null))), 0);
        assert_eq!(parse_count(Some(&json!([{"text": "3"}]))), 0);
        assert_eq!(parse_count(None), 0);
    }

    #[test]
    fn outcome_success_tracks_updates_only() {
        let mut outcome = SyncOutcome::empty();
        outcome.record_failed();
        assert!(!outcome.success);
        outcome.record_updated();
        assert!(outcome.success);
        assert_eq!((outcome.updated, outcome.failed), (1, 1));
    }
}
