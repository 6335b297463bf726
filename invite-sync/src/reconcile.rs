//! Count reconciliation against the target table.
//!
//! ## Protocol
//!
//! 1. [`plan`]: walk the target records in order; keep those whose trimmed
//!    code is in the count map; split them into unchanged and changed.
//! 2. [`apply`]: for each change, take a [`WriteThrottle`] token, then write
//!    the new count. Failures are counted and the loop continues.

use serde_json::{Map, Value};

use invite_bitable::TableService;
use invite_core::{FieldNames, InvitationCountMap, Record, RecordId, SyncOutcome, TableRef};

use crate::throttle::WriteThrottle;

/// A target record whose stored count differs from the aggregated one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountChange {
    pub record_id: RecordId,
    pub code: String,
    pub current: u64,
    pub desired: u64,
}

/// Which target records need a write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub changes: Vec<CountChange>,
    /// Records whose code is counted but whose stored count already matches.
    pub unchanged: usize,
}

impl ReconcilePlan {
    /// Records whose code appears in the count map.
    pub fn considered(&self) -> usize {
        self.changes.len() + self.unchanged
    }
}

/// Decide which target records need their count rewritten.
///
/// Records with a missing/blank/non-string code, or a code absent from
/// `counts`, are left alone. So are records whose stored count (parsed
/// leniently, 0 when unparsable) already equals the aggregated count.
pub fn plan(records: &[Record], counts: &InvitationCountMap, fields: &FieldNames) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    for record in records {
        let Some(code) = record.invitation_code(&fields.invite_code) else {
            continue;
        };
        let Some(&desired) = counts.get(code) else {
            continue;
        };

        let current = record.count(&fields.invite_count);
        if current == desired {
            tracing::debug!("unchanged: {} ({}) = {}", code, record.record_id, current);
            plan.unchanged += 1;
            continue;
        }

        plan.changes.push(CountChange {
            record_id: record.record_id.clone(),
            code: code.to_string(),
            current,
            desired,
        });
    }
    plan
}

/// Issue the writes of `plan`, one throttled update per change.
pub async fn apply(
    service: &dyn TableService,
    table: &TableRef,
    count_field: &str,
    plan: ReconcilePlan,
    throttle: &WriteThrottle,
) -> SyncOutcome {
    let mut outcome = SyncOutcome {
        considered: plan.considered(),
        unchanged: plan.unchanged,
        ..SyncOutcome::empty()
    };

    for change in plan.changes {
        throttle.acquire().await;

        let mut fields = Map::new();
        fields.insert(count_field.to_string(), Value::from(change.desired));

        match service.update_record(table, &change.record_id, fields).await {
            Ok(()) => {
                tracing::info!(
                    "updated {} ({}): {} -> {}",
                    change.code,
                    change.record_id,
                    change.current,
                    change.desired
                );
                outcome.record_updated();
            }
            Err(err) => {
                if err.is_timeout() {
                    tracing::error!(
                        "update of {} ({}) timed out: {}",
                        change.code,
                        change.record_id,
                        err
                    );
                } else {
                    tracing::error!(
                        "update of {} ({}) failed: {}",
                        change.code,
                        change.record_id,
                        err
                    );
                }
                outcome.record_failed();
            }
        }
    }

    outcome
}

/// [`plan`] then [`apply`].
pub async fn reconcile(
    service: &dyn TableService,
    table: &TableRef,
    records: &[Record],
    counts: &InvitationCountMap,
    fields: &FieldNames,
    throttle: &WriteThrottle,
) -> SyncOutcome {
    let plan = plan(records, counts, fields);
    apply(service, table, &fields.invite_count, plan, throttle).await
}
