#![allow(dead_code)]

extern crate std;

use soroban_sdk::Vec;

use crate::types::{AuditTrail, MrvRecord, VerificationEvent, VerificationState};
use crate::CloritMrvRegistryClient;

/// INV-1: IDs handed out by a counter are strictly increasing and start at 1.
pub fn assert_strictly_increasing(ids: &[u64]) {
    let mut previous = 0u64;
    for id in ids {
        assert!(
            *id > previous,
            "INV-1 violated: id {} does not follow {}",
            id,
            previous
        );
        previous = *id;
    }
}

/// INV-2: every list in an audit trail is sorted in creation order.
pub fn assert_trail_ordered(trail: &AuditTrail) {
    for list in [
        &trail.mrv_record_ids,
        &trail.audit_record_ids,
        &trail.verification_ids,
    ] {
        let ids: std::vec::Vec<u64> = to_std(list);
        assert_strictly_increasing(&ids);
    }
}

/// INV-3: every ID in a trail resolves to an entry of the same project.
pub fn assert_trail_consistent(client: &CloritMrvRegistryClient, trail: &AuditTrail) {
    for id in trail.mrv_record_ids.iter() {
        let record = client.get_mrv_record(&id);
        assert_eq!(
            record.project_id, trail.project_id,
            "INV-3 violated: mrv record {} belongs to project {}",
            id, record.project_id
        );
    }
    for id in trail.audit_record_ids.iter() {
        let record = client.get_audit_record(&id);
        assert_eq!(
            record.project_id, trail.project_id,
            "INV-3 violated: audit record {} belongs to project {}",
            id, record.project_id
        );
    }
    for id in trail.verification_ids.iter() {
        let event = client.get_verification(&id);
        assert_eq!(
            event.project_id, trail.project_id,
            "INV-3 violated: verification {} belongs to project {}",
            id, event.project_id
        );
    }
}

/// INV-4: an MRV record is never rewritten after creation.
pub fn assert_mrv_record_unchanged(original: &MrvRecord, current: &MrvRecord) {
    assert_eq!(original, current, "INV-4 violated: mrv record {} changed", original.id);
}

/// INV-5: confidence scores stay in 0..=100.
pub fn assert_confidence_in_range(event: &VerificationEvent) {
    assert!(
        event.confidence_score <= crate::MAX_CONFIDENCE_SCORE,
        "INV-5 violated: verification {} has confidence {}",
        event.id,
        event.confidence_score
    );
}

/// INV-6: a new decision can only move a record forward in its lifecycle.
///   Unverified -> Approved | Rejected
///   Approved   -> Approved | Mixed
///   Rejected   -> Rejected | Mixed
///   Mixed      -> Mixed
pub fn assert_valid_state_transition(from: VerificationState, to: VerificationState) {
    let valid = matches!(
        (from, to),
        (VerificationState::Unverified, VerificationState::Approved)
            | (VerificationState::Unverified, VerificationState::Rejected)
            | (VerificationState::Approved, VerificationState::Approved)
            | (VerificationState::Approved, VerificationState::Mixed)
            | (VerificationState::Rejected, VerificationState::Rejected)
            | (VerificationState::Rejected, VerificationState::Mixed)
            | (VerificationState::Mixed, VerificationState::Mixed)
    );
    assert!(
        valid,
        "INV-6 violated: invalid verification transition from {:?} to {:?}",
        from, to
    );
}

pub fn to_std(ids: &Vec<u64>) -> std::vec::Vec<u64> {
    ids.iter().collect()
}
