//! # Storage
//!
//! Typed helpers over the two Soroban storage tiers used by the registry.
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key           | Type   | Description                            |
//! |---------------|--------|----------------------------------------|
//! | `Initialized` | `bool` | Set once by `init`                     |
//! | `Paused`      | `bool` | Emergency switch for write operations  |
//! | `MrvCount`    | `u64`  | Last issued MRV record ID              |
//! | `AuditCount`  | `u64`  | Last issued audit record ID            |
//! | `VerifCount`  | `u64`  | Last issued verification event ID      |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                  | Type                | Description                          |
//! |----------------------|---------------------|--------------------------------------|
//! | `Roles(address)`     | `u32`               | Role bitmap, see [`crate::rbac`]     |
//! | `Mrv(id)`            | `MrvRecord`         | MRV record                           |
//! | `Audit(id)`          | `AuditRecord`       | Audit record                         |
//! | `Verif(id)`          | `VerificationEvent` | Verification event                   |
//!
//! | Key                            | Type       | Description                              |
//! |--------------------------------|------------|------------------------------------------|
//! | `IndexLen(kind, owner)`        | `u32`      | Number of IDs in one index               |
//! | `IndexPage(kind, owner, page)` | `Vec<u64>` | Up to [`INDEX_PAGE_SIZE`] IDs of an index |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! ## ID indexes
//!
//! Four indexes map an owner to IDs: MRV records, audit records and
//! verifications per project ([`IndexKind::ProjMrv`], [`IndexKind::ProjAudit`],
//! [`IndexKind::ProjVerif`]) and verifications per MRV record
//! ([`IndexKind::MrvVerifs`]). Each index is split into pages of
//! [`INDEX_PAGE_SIZE`] IDs, so an append rewrites one page of at most
//! 128 entries (about 1.5 KiB) instead of the whole list, and no single
//! entry approaches the ledger's entry-size limit. Reading a whole index
//! loads `ceil(len / 128)` pages; a transaction's read footprint therefore
//! caps how long a trail one call can return, roughly a few thousand IDs
//! per list.
//!
//! IDs only ever land on the last page in issue order, so each index is
//! sorted in creation order without any extra bookkeeping.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::types::{AuditRecord, MrvRecord, VerificationEvent};

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

/// IDs stored per index page.
pub const INDEX_PAGE_SIZE: u32 = 128;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Initialized,
    Paused,
    MrvCount,
    AuditCount,
    VerifCount,
    Roles(Address),
    Mrv(u64),
    Audit(u64),
    Verif(u64),
    IndexLen(IndexKind, u64),
    IndexPage(IndexKind, u64, u32),
}

/// Which ID index a length or page key belongs to.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexKind {
    ProjMrv,
    ProjAudit,
    ProjVerif,
    MrvVerifs,
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Initialized)
        .unwrap_or(false)
}

pub fn set_initialized(env: &Env) {
    env.storage().instance().set(&DataKey::Initialized, &true);
    bump_instance(env);
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
    bump_instance(env);
}

/// Reads, increments, and stores a counter.
/// Returns the *post-increment* value, so the first ID issued is 1.
fn next_id(env: &Env, key: &DataKey) -> u64 {
    bump_instance(env);
    let current: u64 = env.storage().instance().get(key).unwrap_or(0);
    let next = current + 1;
    env.storage().instance().set(key, &next);
    next
}

pub fn next_mrv_id(env: &Env) -> u64 {
    next_id(env, &DataKey::MrvCount)
}

pub fn next_audit_id(env: &Env) -> u64 {
    next_id(env, &DataKey::AuditCount)
}

pub fn next_verification_id(env: &Env) -> u64 {
    next_id(env, &DataKey::VerifCount)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Fetch a persistent entry, bumping its TTL only when it exists.
fn load<T>(env: &Env, key: &DataKey) -> Option<T>
where
    T: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>,
{
    let value = env.storage().persistent().get(key);
    if value.is_some() {
        bump_persistent(env, key);
    }
    value
}

/// Role bitmap for `address`; `0` when it holds no role.
pub fn load_roles(env: &Env, address: &Address) -> u32 {
    load(env, &DataKey::Roles(address.clone())).unwrap_or(0)
}

/// Store the role bitmap, dropping the entry entirely once it is empty.
pub fn save_roles(env: &Env, address: &Address, roles: u32) {
    let key = DataKey::Roles(address.clone());
    if roles == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &roles);
        bump_persistent(env, &key);
    }
}

pub fn save_mrv_record(env: &Env, record: &MrvRecord) {
    let key = DataKey::Mrv(record.id);
    env.storage().persistent().set(&key, record);
    bump_persistent(env, &key);
    push_index(env, IndexKind::ProjMrv, record.project_id, record.id);
}

pub fn load_mrv_record(env: &Env, id: u64) -> Option<MrvRecord> {
    load(env, &DataKey::Mrv(id))
}

pub fn save_audit_record(env: &Env, record: &AuditRecord) {
    let key = DataKey::Audit(record.id);
    env.storage().persistent().set(&key, record);
    bump_persistent(env, &key);
    push_index(env, IndexKind::ProjAudit, record.project_id, record.id);
}

pub fn load_audit_record(env: &Env, id: u64) -> Option<AuditRecord> {
    load(env, &DataKey::Audit(id))
}

/// Store a verification event and index it under both its MRV record and
/// the record's project.
pub fn save_verification(env: &Env, event: &VerificationEvent) {
    let key = DataKey::Verif(event.id);
    env.storage().persistent().set(&key, event);
    bump_persistent(env, &key);
    push_index(env, IndexKind::MrvVerifs, event.mrv_record_id, event.id);
    push_index(env, IndexKind::ProjVerif, event.project_id, event.id);
}

pub fn load_verification(env: &Env, id: u64) -> Option<VerificationEvent> {
    load(env, &DataKey::Verif(id))
}

// ── Index Helpers ────────────────────────────────────────────────────

fn index_len(env: &Env, kind: IndexKind, owner: u64) -> u32 {
    load(env, &DataKey::IndexLen(kind, owner)).unwrap_or(0)
}

/// Concatenate every page of an index, oldest first.
fn load_index(env: &Env, kind: IndexKind, owner: u64) -> Vec<u64> {
    let mut ids = Vec::new(env);
    for page in 0..index_len(env, kind, owner).div_ceil(INDEX_PAGE_SIZE) {
        let chunk: Option<Vec<u64>> = load(env, &DataKey::IndexPage(kind, owner, page));
        if let Some(chunk) = chunk {
            ids.append(&chunk);
        }
    }
    ids
}

/// Append `id` to the last page of an index, opening a new page when full.
fn push_index(env: &Env, kind: IndexKind, owner: u64, id: u64) {
    let len = index_len(env, kind, owner);
    let page_key = DataKey::IndexPage(kind, owner, len / INDEX_PAGE_SIZE);
    let mut page: Vec<u64> = load(env, &page_key).unwrap_or_else(|| Vec::new(env));
    page.push_back(id);
    env.storage().persistent().set(&page_key, &page);
    bump_persistent(env, &page_key);

    let len_key = DataKey::IndexLen(kind, owner);
    env.storage().persistent().set(&len_key, &(len + 1));
    bump_persistent(env, &len_key);
}

pub fn project_mrv_ids(env: &Env, project_id: u64) -> Vec<u64> {
    load_index(env, IndexKind::ProjMrv, project_id)
}

pub fn project_audit_ids(env: &Env, project_id: u64) -> Vec<u64> {
    load_index(env, IndexKind::ProjAudit, project_id)
}

pub fn project_verification_ids(env: &Env, project_id: u64) -> Vec<u64> {
    load_index(env, IndexKind::ProjVerif, project_id)
}

pub fn record_verification_ids(env: &Env, mrv_record_id: u64) -> Vec<u64> {
    load_index(env, IndexKind::MrvVerifs, mrv_record_id)
}
