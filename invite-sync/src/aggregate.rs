//! Invitation code counting over source records.

use invite_core::{InvitationCountMap, Record};

/// Count how many records carry each invitation code in `code_field`.
///
/// Codes are trimmed; records whose code is missing, blank or not a string
/// are skipped.
pub fn count_invitations(records: &[Record], code_field: &str) -> InvitationCountMap {
    let mut counts = InvitationCountMap::new();
    for record in records {
        if let Some(code) = record.invitation_code(code_field) {
            *counts.entry(code.to_string()).or_insert(0) += 1;
        }
    }
    counts
}
