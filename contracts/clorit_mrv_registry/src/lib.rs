//! # CLORIT MRV Registry Contract
//!
//! On-chain registry for blue-carbon Monitoring, Reporting and Verification
//! (MRV). It exposes the single Soroban contract `CloritMrvRegistry`:
//!
//! | Phase        | Entry Point(s)                                                 |
//! |--------------|----------------------------------------------------------------|
//! | Bootstrap    | [`CloritMrvRegistry::init`]                                    |
//! | Role admin   | `grant_role`, `revoke_role`, `grant_*_role`, `pause`, `unpause` |
//! | MRV          | [`CloritMrvRegistry::create_mrv_record`]                       |
//! | Audits       | [`CloritMrvRegistry::create_audit_record`]                     |
//! | Verification | [`CloritMrvRegistry::verify_mrv_record`]                       |
//! | Queries      | `get_*`, `has_role`, `roles_of`, `get_project_audit_trail`     |
//!
//! ## Architecture
//!
//! Authorization is delegated to [`rbac`], storage access to `storage`, and
//! event emission to [`events`]. The ledger is append-only: records, audits
//! and verification events are written once and never rewritten. Every entry
//! point returns `Result`; an `Err` reverts the whole invocation, so a failed
//! call never leaves partial state behind.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, String, Vec};

pub mod events;
pub mod rbac;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_events;

pub use rbac::Role;
pub use types::{
    AuditRecord, AuditResult, AuditTrail, MrvRecord, VerificationEvent, VerificationState,
    CO2_DECIMALS, MAX_CONFIDENCE_SCORE,
};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    Unauthorized = 1,
    InvalidInput = 2,
    NotFound = 3,
    AlreadyInitialized = 4,
    NotInitialized = 5,
    Paused = 6,
}

#[contract]
pub struct CloritMrvRegistry;

#[contractimpl]
#[allow(clippy::too_many_arguments)]
impl CloritMrvRegistry {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the registry and grant `Admin` to `admin`.
    ///
    /// Must be called exactly once after deployment; later calls fail with
    /// `Error::AlreadyInitialized`.
    pub fn init(env: Env, admin: Address) -> Result<(), Error> {
        admin.require_auth();
        rbac::init_admin(&env, &admin)
    }

    // ─────────────────────────────────────────────────────────
    // Role management
    // ─────────────────────────────────────────────────────────

    /// Grant `role` to `target`. `caller` must hold `Admin`.
    pub fn grant_role(env: Env, caller: Address, target: Address, role: Role) -> Result<(), Error> {
        rbac::grant_role(&env, &caller, &target, role)
    }

    /// Revoke `role` from `target`. `caller` must hold `Admin`.
    pub fn revoke_role(env: Env, caller: Address, target: Address, role: Role) -> Result<(), Error> {
        rbac::revoke_role(&env, &caller, &target, role)
    }

    pub fn grant_verifier_role(env: Env, caller: Address, target: Address) -> Result<(), Error> {
        rbac::grant_role(&env, &caller, &target, Role::Verifier)
    }

    pub fn grant_auditor_role(env: Env, caller: Address, target: Address) -> Result<(), Error> {
        rbac::grant_role(&env, &caller, &target, Role::Auditor)
    }

    pub fn grant_project_owner_role(env: Env, caller: Address, target: Address) -> Result<(), Error> {
        rbac::grant_role(&env, &caller, &target, Role::ProjectOwner)
    }

    pub fn grant_data_provider_role(env: Env, caller: Address, target: Address) -> Result<(), Error> {
        rbac::grant_role(&env, &caller, &target, Role::DataProvider)
    }

    /// Return `true` if `address` holds `role`.
    pub fn has_role(env: Env, address: Address, role: Role) -> bool {
        rbac::has_role(&env, &address, role)
    }

    /// Return every role held by `address`.
    pub fn roles_of(env: Env, address: Address) -> Vec<Role> {
        rbac::roles_of(&env, &address)
    }

    // ─────────────────────────────────────────────────────────
    // Pause switch
    // ─────────────────────────────────────────────────────────

    /// Block record creation and verification. `caller` must hold `Admin`.
    pub fn pause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        storage::set_paused(&env, true);
        events::emit_paused(&env, &caller);
        Ok(())
    }

    pub fn unpause(env: Env, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        rbac::require_admin(&env, &caller)?;
        storage::set_paused(&env, false);
        events::emit_unpaused(&env, &caller);
        Ok(())
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    // ─────────────────────────────────────────────────────────
    // MRV records
    // ─────────────────────────────────────────────────────────

    /// Append a new MRV record for `project_id` and return its ID.
    ///
    /// - `caller` must hold `DataProvider`.
    /// - `project_id` must be non-zero and `co2_measured` non-negative
    ///   (fixed-point, [`CO2_DECIMALS`] decimals).
    /// - Reference strings are stored as given; their content is never
    ///   fetched or checked.
    pub fn create_mrv_record(
        env: Env,
        caller: Address,
        project_id: u64,
        report_type: String,
        data_hash: String,
        methodology: String,
        co2_measured: i128,
        satellite_data: String,
        sensor_data: String,
    ) -> Result<u64, Error> {
        caller.require_auth();
        rbac::require_role(&env, &caller, Role::DataProvider)?;
        require_not_paused(&env)?;

        if project_id == 0 || co2_measured < 0 {
            return Err(Error::InvalidInput);
        }

        let id = storage::next_mrv_id(&env);
        let record = MrvRecord {
            id,
            project_id,
            report_type,
            data_hash,
            methodology,
            co2_measured,
            satellite_data,
            sensor_data,
            creator: caller.clone(),
            created_at: env.ledger().timestamp(),
        };
        storage::save_mrv_record(&env, &record);

        events::emit_mrv_record_created(
            &env,
            events::MrvRecordCreated {
                record_id: id,
                project_id,
                creator: caller,
                co2_measured,
            },
        );
        Ok(id)
    }

    pub fn get_mrv_record(env: Env, record_id: u64) -> Result<MrvRecord, Error> {
        storage::load_mrv_record(&env, record_id).ok_or(Error::NotFound)
    }

    // ─────────────────────────────────────────────────────────
    // Audit records
    // ─────────────────────────────────────────────────────────

    /// Append a new audit record for `project_id` and return its ID.
    ///
    /// - `caller` must hold `Auditor`.
    /// - `audit_result` is an [`AuditResult`] code; unknown codes fail with
    ///   `Error::InvalidInput`.
    pub fn create_audit_record(
        env: Env,
        caller: Address,
        project_id: u64,
        audit_type: String,
        findings: String,
        evidence_hash: String,
        audit_result: u32,
        recommendations: String,
    ) -> Result<u64, Error> {
        caller.require_auth();
        rbac::require_role(&env, &caller, Role::Auditor)?;
        require_not_paused(&env)?;

        if project_id == 0 {
            return Err(Error::InvalidInput);
        }
        let result = AuditResult::from_code(audit_result).ok_or(Error::InvalidInput)?;

        let id = storage::next_audit_id(&env);
        let record = AuditRecord {
            id,
            project_id,
            audit_type,
            findings,
            evidence_hash,
            result,
            recommendations,
            auditor: caller.clone(),
            created_at: env.ledger().timestamp(),
        };
        storage::save_audit_record(&env, &record);

        events::emit_audit_record_created(
            &env,
            events::AuditRecordCreated {
                audit_id: id,
                project_id,
                auditor: caller,
                result,
            },
        );
        Ok(id)
    }

    pub fn get_audit_record(env: Env, audit_id: u64) -> Result<AuditRecord, Error> {
        storage::load_audit_record(&env, audit_id).ok_or(Error::NotFound)
    }

    // ─────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────

    /// Record a verifier's decision on an existing MRV record.
    ///
    /// - `caller` must hold `Verifier`.
    /// - `mrv_record_id` must exist (`Error::NotFound`).
    /// - `confidence_score` must be at most [`MAX_CONFIDENCE_SCORE`].
    ///
    /// The MRV record is left untouched; a record may be verified any number
    /// of times and its status is reduced from the resulting events.
    pub fn verify_mrv_record(
        env: Env,
        caller: Address,
        mrv_record_id: u64,
        approved: bool,
        comments: String,
        criteria_hash: String,
        confidence_score: u32,
        ai_analysis: String,
    ) -> Result<u64, Error> {
        caller.require_auth();
        rbac::require_role(&env, &caller, Role::Verifier)?;
        require_not_paused(&env)?;

        let record = storage::load_mrv_record(&env, mrv_record_id).ok_or(Error::NotFound)?;
        if confidence_score > MAX_CONFIDENCE_SCORE {
            return Err(Error::InvalidInput);
        }

        let id = storage::next_verification_id(&env);
        let event = VerificationEvent {
            id,
            mrv_record_id,
            project_id: record.project_id,
            approved,
            comments,
            criteria_hash,
            confidence_score,
            ai_analysis,
            verifier: caller.clone(),
            created_at: env.ledger().timestamp(),
        };
        storage::save_verification(&env, &event);

        events::emit_mrv_verified(
            &env,
            events::MrvVerified {
                verification_id: id,
                mrv_record_id,
                project_id: record.project_id,
                verifier: caller,
                approved,
                confidence_score,
            },
        );
        Ok(id)
    }

    pub fn get_verification(env: Env, verification_id: u64) -> Result<VerificationEvent, Error> {
        storage::load_verification(&env, verification_id).ok_or(Error::NotFound)
    }

    /// IDs of every verification event for `mrv_record_id`, oldest first.
    pub fn get_record_verifications(env: Env, mrv_record_id: u64) -> Result<Vec<u64>, Error> {
        require_mrv_record(&env, mrv_record_id)?;
        Ok(storage::record_verification_ids(&env, mrv_record_id))
    }

    /// Lifecycle view over all decisions recorded for `mrv_record_id`.
    pub fn get_verification_state(env: Env, mrv_record_id: u64) -> Result<VerificationState, Error> {
        require_mrv_record(&env, mrv_record_id)?;
        let mut state = VerificationState::Unverified;
        for id in storage::record_verification_ids(&env, mrv_record_id).iter() {
            let event = storage::load_verification(&env, id).ok_or(Error::NotFound)?;
            state = state.apply(event.approved);
        }
        Ok(state)
    }

    /// Latest-wins outcome: the decision of the most recent verification
    /// event, or `None` while the record is unverified.
    pub fn get_verification_outcome(env: Env, mrv_record_id: u64) -> Result<Option<bool>, Error> {
        require_mrv_record(&env, mrv_record_id)?;
        match storage::record_verification_ids(&env, mrv_record_id).last() {
            Some(id) => {
                let event = storage::load_verification(&env, id).ok_or(Error::NotFound)?;
                Ok(Some(event.approved))
            }
            None => Ok(None),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Audit trail
    // ─────────────────────────────────────────────────────────

    /// Every record, audit and verification ID tied to `project_id`, each list
    /// in creation order. Unknown projects yield three empty lists.
    pub fn get_project_audit_trail(env: Env, project_id: u64) -> AuditTrail {
        AuditTrail {
            project_id,
            mrv_record_ids: storage::project_mrv_ids(&env, project_id),
            audit_record_ids: storage::project_audit_ids(&env, project_id),
            verification_ids: storage::project_verification_ids(&env, project_id),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Internal Helpers
// ─────────────────────────────────────────────────────────

fn require_not_paused(env: &Env) -> Result<(), Error> {
    if storage::is_paused(env) {
        return Err(Error::Paused);
    }
    Ok(())
}

fn require_mrv_record(env: &Env, mrv_record_id: u64) -> Result<(), Error> {
    if storage::load_mrv_record(env, mrv_record_id).is_none() {
        return Err(Error::NotFound);
    }
    Ok(())
}
