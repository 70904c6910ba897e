//! # Role-Based Access Control
//!
//! Every address carries a bitmap of [`Role`]s, so one address may act as,
//! say, both `Auditor` and `Verifier`. Only `Admin` holders change bitmaps.
//!
//! | Role           | Gates                                   |
//! |----------------|-----------------------------------------|
//! | `Admin`        | role management, pause / unpause        |
//! | `Verifier`     | `verify_mrv_record`                     |
//! | `Auditor`      | `create_audit_record`                   |
//! | `ProjectOwner` | nothing on-chain yet; read by front-ends |
//! | `DataProvider` | `create_mrv_record`                     |
//!
//! Grants and revocations are idempotent: re-granting a held role (or
//! revoking an unheld one) changes nothing and emits no event.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::events;
use crate::storage;
use crate::Error;

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Role {
    Admin = 0,
    Verifier = 1,
    Auditor = 2,
    ProjectOwner = 3,
    DataProvider = 4,
}

const ALL_ROLES: [Role; 5] = [
    Role::Admin,
    Role::Verifier,
    Role::Auditor,
    Role::ProjectOwner,
    Role::DataProvider,
];

impl Role {
    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Bootstrap the registry with its first `Admin`.
pub fn init_admin(env: &Env, admin: &Address) -> Result<(), Error> {
    if storage::is_initialized(env) {
        return Err(Error::AlreadyInitialized);
    }
    storage::set_initialized(env);
    let roles = storage::load_roles(env, admin);
    storage::save_roles(env, admin, roles | Role::Admin.bit());
    events::emit_role_granted(env, admin, Role::Admin, admin);
    Ok(())
}

pub fn has_role(env: &Env, address: &Address, role: Role) -> bool {
    storage::load_roles(env, address) & role.bit() != 0
}

/// Roles held by `address`, in declaration order.
pub fn roles_of(env: &Env, address: &Address) -> Vec<Role> {
    let bits = storage::load_roles(env, address);
    let mut roles = Vec::new(env);
    for role in ALL_ROLES {
        if bits & role.bit() != 0 {
            roles.push_back(role);
        }
    }
    roles
}

pub fn require_initialized(env: &Env) -> Result<(), Error> {
    if !storage::is_initialized(env) {
        return Err(Error::NotInitialized);
    }
    Ok(())
}

pub fn require_role(env: &Env, address: &Address, role: Role) -> Result<(), Error> {
    require_initialized(env)?;
    if !has_role(env, address, role) {
        return Err(Error::Unauthorized);
    }
    Ok(())
}

pub fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
    require_role(env, caller, Role::Admin)
}

/// Grant `role` to `target`. `caller` must authorize and hold `Admin`.
pub fn grant_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    caller.require_auth();
    require_admin(env, caller)?;

    let roles = storage::load_roles(env, target);
    if roles & role.bit() != 0 {
        return Ok(());
    }
    storage::save_roles(env, target, roles | role.bit());
    events::emit_role_granted(env, target, role, caller);
    Ok(())
}

/// Revoke `role` from `target`. `caller` must authorize and hold `Admin`.
///
/// An admin cannot drop its own `Admin` role, so the registry always keeps
/// at least the admin that is performing revocations.
pub fn revoke_role(env: &Env, caller: &Address, target: &Address, role: Role) -> Result<(), Error> {
    caller.require_auth();
    require_admin(env, caller)?;

    if role == Role::Admin && caller == target {
        return Err(Error::InvalidInput);
    }

    let roles = storage::load_roles(env, target);
    if roles & role.bit() == 0 {
        return Ok(());
    }
    storage::save_roles(env, target, roles & !role.bit());
    events::emit_role_revoked(env, target, role, caller);
    Ok(())
}
