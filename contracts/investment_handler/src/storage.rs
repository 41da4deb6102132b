//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the ledger:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key             | Type   | Description                               |
//! |-----------------|--------|-------------------------------------------|
//! | `RoundCount`    | `u64`  | Last assigned round ID (0 = none yet)     |
//! | `TotalInvested` | `i128` | Payment units invested across all rounds  |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                          | Type           | Description                     |
//! |------------------------------|----------------|---------------------------------|
//! | `RoundConfig(id)`            | `RoundConfig`  | Immutable round configuration   |
//! | `RoundState(id)`             | `RoundState`   | Mutable round totals and phase  |
//! | `Contribution(id, identity)` | `Contribution` | Per-identity invested/claimed   |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! Delegation links and roles are not stored here; they live under their own
//! key enums in `delegation.rs` and `rbac.rs`.

use soroban_sdk::{contracttype, panic_with_error, Address, Env, IntoVal, Val};

use crate::types::{Contribution, Round, RoundConfig, RoundState};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Last assigned round ID (Instance).
    RoundCount,
    /// Contract-wide invested total (Instance).
    TotalInvested,
    /// Immutable round configuration keyed by ID (Persistent).
    RoundConfig(u64),
    /// Mutable round state keyed by ID (Persistent).
    RoundState(u64),
    /// Contribution keyed by (round ID, identity) (Persistent).
    Contribution(u64, Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Reads, increments and stores the round counter.
/// Returns the ID to use for the new round (post-increment value).
pub fn next_round_id(env: &Env) -> u64 {
    bump_instance(env);
    let next = latest_round_id(env)
        .checked_add(1)
        .unwrap_or_else(|| panic_with_error!(env, Error::ArithmeticOverflow));
    env.storage().instance().set(&DataKey::RoundCount, &next);
    next
}

/// ID of the most recently created round, or 0 when none exists.
pub fn latest_round_id(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::RoundCount)
        .unwrap_or(0)
}

pub fn total_invested(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalInvested)
        .unwrap_or(0)
}

pub fn set_total_invested(env: &Env, total: i128) {
    env.storage().instance().set(&DataKey::TotalInvested, &total);
    bump_instance(env);
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for any persistent storage key.
pub fn bump_persistent<K>(env: &Env, key: &K)
where
    K: IntoVal<Env, Val>,
{
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

/// Save both the immutable config and initial mutable state for a new round.
pub fn save_round(env: &Env, config: &RoundConfig, state: &RoundState) {
    let config_key = DataKey::RoundConfig(config.id);
    env.storage().persistent().set(&config_key, config);
    bump_persistent(env, &config_key);
    save_round_state(env, config.id, state);
}

/// Load the full `Round` by combining config and state.
pub fn load_round(env: &Env, id: u64) -> Round {
    let config = load_round_config(env, id);
    let state = load_round_state(env, id);
    Round {
        id: config.id,
        signer: config.signer,
        payment_token: config.payment_token,
        reward_token: state.reward_token,
        total_allocated_payment_token: config.total_allocated_payment_token,
        total_invested_payment_token: state.total_invested_payment_token,
        reward_token_allocation: state.reward_token_allocation,
        total_reward_deposited: state.total_reward_deposited,
        total_reward_claimed: state.total_reward_claimed,
        total_payment_withdrawn: state.total_payment_withdrawn,
        phase: state.phase,
    }
}

/// Load only the immutable round configuration.
/// Panics with `RoundNotFound` if the round does not exist.
pub fn load_round_config(env: &Env, id: u64) -> RoundConfig {
    let key = DataKey::RoundConfig(id);
    let config: RoundConfig = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| panic_with_error!(env, Error::RoundNotFound));
    bump_persistent(env, &key);
    config
}

/// Load only the mutable round state.
/// Panics with `RoundNotFound` if the round does not exist.
pub fn load_round_state(env: &Env, id: u64) -> RoundState {
    let key = DataKey::RoundState(id);
    let state: RoundState = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or_else(|| panic_with_error!(env, Error::RoundNotFound));
    bump_persistent(env, &key);
    state
}

pub fn save_round_state(env: &Env, id: u64, state: &RoundState) {
    let key = DataKey::RoundState(id);
    env.storage().persistent().set(&key, state);
    bump_persistent(env, &key);
}

/// Load a contribution; identities that never invested read as zero.
pub fn load_contribution(env: &Env, id: u64, identity: &Address) -> Contribution {
    let key = DataKey::Contribution(id, identity.clone());
    match env.storage().persistent().get::<DataKey, Contribution>(&key) {
        Some(contribution) => {
            bump_persistent(env, &key);
            contribution
        }
        None => Contribution::default(),
    }
}

pub fn save_contribution(env: &Env, id: u64, identity: &Address, contribution: &Contribution) {
    let key = DataKey::Contribution(id, identity.clone());
    env.storage().persistent().set(&key, contribution);
    bump_persistent(env, &key);
}
