//! # Identity delegation
//!
//! A canonical identity (the KYC-verified identity of record) may authorize
//! secondary wallets to invest and claim on its behalf.
//!
//! ## Storage
//!
//! | Key                      | Type           | Description                          |
//! |--------------------------|----------------|--------------------------------------|
//! | `CanonicalOf(delegate)`  | `Address`      | Canonical identity of a delegate     |
//! | `Delegates(canonical)`   | `Vec<Address>` | Delegates of a canonical, in order   |
//!
//! ## Shape
//!
//! Links form a forest of stars: a delegate has at most one canonical, a
//! canonical is never itself a delegate, and a delegate never has delegates
//! of its own. Every identity implicitly acts for itself.

use soroban_sdk::{contracttype, panic_with_error, Address, Env, Vec};

use crate::events;
use crate::storage::bump_persistent;
use crate::Error;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LinkKey {
    CanonicalOf(Address),
    Delegates(Address),
}

/// Link `delegate` to `canonical`. Re-adding an existing pair is a no-op.
pub fn add_link(env: &Env, canonical: &Address, delegate: &Address) {
    canonical.require_auth();

    if canonical == delegate {
        panic_with_error!(env, Error::InvalidDelegate);
    }
    match resolve(env, delegate) {
        Some(existing) if &existing == canonical => return,
        Some(_) => panic_with_error!(env, Error::DelegateAlreadyLinked),
        None => {}
    }
    if resolve(env, canonical).is_some() || !delegates_of(env, delegate).is_empty() {
        panic_with_error!(env, Error::InvalidDelegate);
    }

    let link_key = LinkKey::CanonicalOf(delegate.clone());
    env.storage().persistent().set(&link_key, canonical);
    bump_persistent(env, &link_key);

    let mut members = delegates_of(env, canonical);
    members.push_back(delegate.clone());
    save_delegates(env, canonical, &members);

    events::emit_link_added(env, canonical, delegate);
}

/// Remove the link between `canonical` and `delegate`.
pub fn remove_link(env: &Env, canonical: &Address, delegate: &Address) {
    canonical.require_auth();

    if !is_linked(env, canonical, delegate) {
        panic_with_error!(env, Error::LinkNotFound);
    }

    env.storage()
        .persistent()
        .remove(&LinkKey::CanonicalOf(delegate.clone()));

    let mut members = delegates_of(env, canonical);
    if let Some(index) = members.first_index_of(delegate) {
        members.remove(index);
    }
    save_delegates(env, canonical, &members);

    events::emit_link_removed(env, canonical, delegate);
}

/// Canonical identity `delegate` acts for, if any.
pub fn resolve(env: &Env, delegate: &Address) -> Option<Address> {
    let key = LinkKey::CanonicalOf(delegate.clone());
    let canonical: Option<Address> = env.storage().persistent().get(&key);
    if canonical.is_some() {
        bump_persistent(env, &key);
    }
    canonical
}

pub fn is_linked(env: &Env, canonical: &Address, delegate: &Address) -> bool {
    resolve(env, delegate).as_ref() == Some(canonical)
}

pub fn delegates_of(env: &Env, canonical: &Address) -> Vec<Address> {
    env.storage()
        .persistent()
        .get(&LinkKey::Delegates(canonical.clone()))
        .unwrap_or_else(|| Vec::new(env))
}

/// Panics with `NotAuthorizedDelegate` unless `actor` is `identity` or one of
/// its linked delegates.
pub fn require_acting_for(env: &Env, actor: &Address, identity: &Address) {
    if actor != identity && !is_linked(env, identity, actor) {
        panic_with_error!(env, Error::NotAuthorizedDelegate);
    }
}

fn save_delegates(env: &Env, canonical: &Address, members: &Vec<Address>) {
    let key = LinkKey::Delegates(canonical.clone());
    if members.is_empty() {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, members);
        bump_persistent(env, &key);
    }
}
