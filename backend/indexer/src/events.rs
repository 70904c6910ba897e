//! Canonical event types emitted by the MRV registry contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/clorit_mrv_registry/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the registry contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A data provider submitted an MRV record (`mrv_new` topic).
    MrvRecordCreated,
    /// An auditor submitted an audit record (`audit_new` topic).
    AuditRecordCreated,
    /// A verifier recorded a decision on an MRV record (`verified` topic).
    MrvVerified,
    /// A role was granted (`role_set` topic).
    RoleSet,
    /// A role was revoked (`role_del` topic).
    RoleDel,
    /// Registry writes were paused (`paused` topic).
    RegistryPaused,
    /// Registry writes were resumed (`unpaused` topic).
    RegistryUnpaused,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "mrv_new" => Self::MrvRecordCreated,
            "audit_new" => Self::AuditRecordCreated,
            "verified" => Self::MrvVerified,
            "role_set" => Self::RoleSet,
            "role_del" => Self::RoleDel,
            "paused" => Self::RegistryPaused,
            "unpaused" => Self::RegistryUnpaused,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MrvRecordCreated => "mrv_record_created",
            Self::AuditRecordCreated => "audit_record_created",
            Self::MrvVerified => "mrv_verified",
            Self::RoleSet => "role_set",
            Self::RoleDel => "role_del",
            Self::RegistryPaused => "registry_paused",
            Self::RegistryUnpaused => "registry_unpaused",
            Self::Unknown => "unknown",
        }
    }

    /// Whether events of this kind carry a project ID as their second topic.
    pub fn is_project_scoped(&self) -> bool {
        matches!(
            self,
            Self::MrvRecordCreated | Self::AuditRecordCreated | Self::MrvVerified
        )
    }
}

/// A fully decoded registry event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEvent {
    /// RPC event ID, unique per contract event; used for idempotent inserts.
    pub event_id: String,
    pub event_type: String,
    pub project_id: Option<String>,
    /// MRV record, audit record, or verification ID the event announces.
    pub record_id: Option<i64>,
    pub actor: Option<String>,
    /// CO2 quantity for MRV records (18-decimal fixed point, as a string).
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub project_id: Option<String>,
    pub record_id: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

/// Off-chain mirror of the contract's project audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTrail {
    pub project_id: String,
    pub mrv_record_ids: Vec<i64>,
    pub audit_record_ids: Vec<i64>,
    pub verification_ids: Vec<i64>,
}
