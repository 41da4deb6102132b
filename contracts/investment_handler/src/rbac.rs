//! # Role-Based Access Control
//!
//! Every address holds at most one [`Role`]. The hierarchy is:
//!
//! | Role         | Can grant/revoke | Operates rounds |
//! |--------------|------------------|-----------------|
//! | `SuperAdmin` | `Admin`, `Manager` | yes           |
//! | `Admin`      | `Manager`        | yes             |
//! | `Manager`    | nothing          | yes             |
//!
//! There is exactly one SuperAdmin, set by `init` and moved only by
//! `transfer_super_admin`. "Operates rounds" covers `create_round`,
//! `set_phase`, the reward setters, `deposit_reward` and `withdraw_payment`.

use soroban_sdk::{contracttype, panic_with_error, symbol_short, Address, Env};

use crate::storage::{bump_instance, bump_persistent};
use crate::Error;

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RbacKey {
    /// The single SuperAdmin (Instance).
    SuperAdmin,
    /// Role held by an address (Persistent).
    Role(Address),
}

/// Store the first SuperAdmin. Panics with `AlreadyInitialized` on a second call.
pub fn init_super_admin(env: &Env, super_admin: &Address) {
    if env.storage().instance().has(&RbacKey::SuperAdmin) {
        panic_with_error!(env, Error::AlreadyInitialized);
    }
    env.storage()
        .instance()
        .set(&RbacKey::SuperAdmin, super_admin);
    bump_instance(env);
    store_role(env, super_admin, Role::SuperAdmin);
    emit_role_set(env, super_admin, super_admin, Role::SuperAdmin);
}

pub fn grant_role(env: &Env, caller: &Address, target: &Address, role: Role) {
    caller.require_auth();
    let caller_role = require_admin_or_above(env, caller);

    match role {
        Role::SuperAdmin => panic_with_error!(env, Error::NotAuthorized),
        Role::Admin | Role::Manager => {}
    }
    // The SuperAdmin's role only moves through transfer_super_admin.
    if role_of(env, target.clone()) == Some(Role::SuperAdmin) {
        panic_with_error!(env, Error::NotAuthorized);
    }
    // Only the SuperAdmin grants Admin.
    if role == Role::Admin && caller_role != Role::SuperAdmin {
        panic_with_error!(env, Error::NotAuthorized);
    }

    store_role(env, target, role);
    emit_role_set(env, caller, target, role);
}

pub fn revoke_role(env: &Env, caller: &Address, target: &Address) {
    caller.require_auth();
    let caller_role = require_admin_or_above(env, caller);

    let target_role = match role_of(env, target.clone()) {
        Some(role) => role,
        None => panic_with_error!(env, Error::RoleNotFound),
    };
    if target_role == Role::SuperAdmin {
        panic_with_error!(env, Error::NotAuthorized);
    }
    if target_role == Role::Admin && caller_role != Role::SuperAdmin {
        panic_with_error!(env, Error::NotAuthorized);
    }

    env.storage()
        .persistent()
        .remove(&RbacKey::Role(target.clone()));
    env.events()
        .publish((symbol_short!("role_del"), target.clone()), caller.clone());
}

pub fn transfer_super_admin(env: &Env, current: &Address, new_super_admin: &Address) {
    current.require_auth();
    if super_admin(env).as_ref() != Some(current) {
        panic_with_error!(env, Error::NotAuthorized);
    }

    env.storage()
        .persistent()
        .remove(&RbacKey::Role(current.clone()));
    env.events()
        .publish((symbol_short!("role_del"), current.clone()), current.clone());

    env.storage()
        .instance()
        .set(&RbacKey::SuperAdmin, new_super_admin);
    bump_instance(env);
    store_role(env, new_super_admin, Role::SuperAdmin);
    emit_role_set(env, current, new_super_admin, Role::SuperAdmin);
}

pub fn role_of(env: &Env, address: Address) -> Option<Role> {
    env.storage().persistent().get(&RbacKey::Role(address))
}

pub fn has_role(env: &Env, address: Address, role: Role) -> bool {
    role_of(env, address) == Some(role)
}

/// Panics with `NotAuthorized` unless `address` is Admin or SuperAdmin.
/// Returns the role it holds.
pub fn require_admin_or_above(env: &Env, address: &Address) -> Role {
    match role_of(env, address.clone()) {
        Some(role @ (Role::SuperAdmin | Role::Admin)) => role,
        _ => panic_with_error!(env, Error::NotAuthorized),
    }
}

/// Panics with `NotAuthorized` unless `address` may operate rounds.
pub fn require_operator(env: &Env, address: &Address) {
    if role_of(env, address.clone()).is_none() {
        panic_with_error!(env, Error::NotAuthorized);
    }
}

fn super_admin(env: &Env) -> Option<Address> {
    env.storage().instance().get(&RbacKey::SuperAdmin)
}

fn store_role(env: &Env, address: &Address, role: Role) {
    let key = RbacKey::Role(address.clone());
    env.storage().persistent().set(&key, &role);
    bump_persistent(env, &key);
}

fn emit_role_set(env: &Env, caller: &Address, target: &Address, role: Role) {
    env.events().publish(
        (symbol_short!("role_set"), target.clone(), role),
        caller.clone(),
    );
}
