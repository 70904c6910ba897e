//! Contract events consumed by the off-chain indexer.
//!
//! | Topic                            | Data                  |
//! |----------------------------------|-----------------------|
//! | `("mrv_new", project_id)`        | [`MrvRecordCreated`]  |
//! | `("audit_new", project_id)`      | [`AuditRecordCreated`]|
//! | `("verified", project_id)`       | [`MrvVerified`]       |
//! | `("role_set", address, role)`    | admin `Address`       |
//! | `("role_del", address, role)`    | admin `Address`       |
//! | `("paused",)` / `("unpaused",)`  | admin `Address`       |
//!
//! Every record event carries the project ID as its second topic so that a
//! project's audit trail can be rebuilt from the event stream alone.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

use crate::rbac::Role;
use crate::types::AuditResult;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MrvRecordCreated {
    pub record_id: u64,
    pub project_id: u64,
    pub creator: Address,
    pub co2_measured: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuditRecordCreated {
    pub audit_id: u64,
    pub project_id: u64,
    pub auditor: Address,
    pub result: AuditResult,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MrvVerified {
    pub verification_id: u64,
    pub mrv_record_id: u64,
    pub project_id: u64,
    pub verifier: Address,
    pub approved: bool,
    pub confidence_score: u32,
}

pub fn emit_mrv_record_created(env: &Env, event: MrvRecordCreated) {
    env.events()
        .publish((symbol_short!("mrv_new"), event.project_id), event);
}

pub fn emit_audit_record_created(env: &Env, event: AuditRecordCreated) {
    env.events()
        .publish((symbol_short!("audit_new"), event.project_id), event);
}

pub fn emit_mrv_verified(env: &Env, event: MrvVerified) {
    env.events()
        .publish((symbol_short!("verified"), event.project_id), event);
}

pub fn emit_role_granted(env: &Env, target: &Address, role: Role, by: &Address) {
    env.events()
        .publish((symbol_short!("role_set"), target.clone(), role), by.clone());
}

pub fn emit_role_revoked(env: &Env, target: &Address, role: Role, by: &Address) {
    env.events()
        .publish((symbol_short!("role_del"), target.clone(), role), by.clone());
}

pub fn emit_paused(env: &Env, by: &Address) {
    env.events().publish((symbol_short!("paused"),), by.clone());
}

pub fn emit_unpaused(env: &Env, by: &Address) {
    env.events().publish((symbol_short!("unpaused"),), by.clone());
}
