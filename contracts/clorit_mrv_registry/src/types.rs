//! # Types
//!
//! Ledger entities stored by the registry.
//!
//! ## Append-only ledger
//!
//! [`MrvRecord`], [`AuditRecord`] and [`VerificationEvent`] are written once
//! and never mutated. The verification status of an MRV record is not a
//! field on the record; it is reduced at query time from the events that
//! reference it:
//!
//! ```text
//! Unverified ──► Approved ──► Mixed
//!     └────────► Rejected ──►─┘
//! ```
//!
//! Every new [`VerificationEvent`] may move a record along this graph.
//! `Mixed` is absorbing: once both an approval and a rejection exist, no
//! further event can make the set of decisions unanimous again.

use soroban_sdk::{contracttype, Address, String, Vec};

/// Number of decimals carried by `co2_measured` (1 tonne == 10^18).
pub const CO2_DECIMALS: u32 = 18;

/// Upper bound of a verifier's confidence score.
pub const MAX_CONFIDENCE_SCORE: u32 = 100;

/// Outcome of an independent audit, stored by numeric code.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum AuditResult {
    Satisfactory = 0,
    NeedsImprovement = 1,
    Unsatisfactory = 2,
    NonCompliant = 3,
}

impl AuditResult {
    /// Map a caller-supplied code to a defined outcome.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Satisfactory),
            1 => Some(Self::NeedsImprovement),
            2 => Some(Self::Unsatisfactory),
            3 => Some(Self::NonCompliant),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    /// Binary view of the outcome.
    pub fn is_satisfactory(self) -> bool {
        matches!(self, Self::Satisfactory)
    }
}

/// One monitoring/reporting submission for a project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MrvRecord {
    /// Sequential identifier, starting at 1.
    pub id: u64,
    pub project_id: u64,
    /// Free-form category, e.g. `"monitoring"`.
    pub report_type: String,
    /// Content-addressed reference to the report payload (e.g. an IPFS CID).
    pub data_hash: String,
    pub methodology: String,
    /// Measured CO2, fixed-point with [`CO2_DECIMALS`] decimals.
    pub co2_measured: i128,
    pub satellite_data: String,
    pub sensor_data: String,
    pub creator: Address,
    pub created_at: u64,
}

/// An independent audit of a project.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuditRecord {
    pub id: u64,
    pub project_id: u64,
    /// e.g. `"external"` or `"internal"`.
    pub audit_type: String,
    pub findings: String,
    pub evidence_hash: String,
    pub result: AuditResult,
    pub recommendations: String,
    pub auditor: Address,
    pub created_at: u64,
}

/// A verifier's decision on a single MRV record.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerificationEvent {
    pub id: u64,
    pub mrv_record_id: u64,
    /// Copied from the referenced record so the project index can be kept
    /// without a second lookup.
    pub project_id: u64,
    pub approved: bool,
    pub comments: String,
    pub criteria_hash: String,
    /// 0..=100.
    pub confidence_score: u32,
    pub ai_analysis: String,
    pub verifier: Address,
    pub created_at: u64,
}

/// Lifecycle view of an MRV record's verifications.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VerificationState {
    /// No verification event exists.
    Unverified,
    /// Every event approves.
    Approved,
    /// Every event rejects.
    Rejected,
    /// Both approvals and rejections exist.
    Mixed,
}

impl VerificationState {
    /// Fold one more decision into the state.
    pub fn apply(self, approved: bool) -> Self {
        match (self, approved) {
            (Self::Unverified, true) | (Self::Approved, true) => Self::Approved,
            (Self::Unverified, false) | (Self::Rejected, false) => Self::Rejected,
            _ => Self::Mixed,
        }
    }
}

/// Identifiers associated with one project, each list in creation order.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuditTrail {
    pub project_id: u64,
    pub mrv_record_ids: Vec<u64>,
    pub audit_record_ids: Vec<u64>,
    pub verification_ids: Vec<u64>,
}
