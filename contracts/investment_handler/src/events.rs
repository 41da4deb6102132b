//! # Events
//!
//! Every state change publishes an event for the off-chain indexer. Topics
//! are `(symbol, key)` where `key` is the round ID, or the canonical identity
//! for delegation events; the data is one of the structs below.
//!
//! | Topic       | Data                  |
//! |-------------|-----------------------|
//! | `created`   | [`RoundCreated`]        |
//! | `phase`     | [`PhaseChanged`]        |
//! | `rwd_tok`   | [`RewardTokenSet`]      |
//! | `rwd_alloc` | [`RewardAllocationSet`] |
//! | `invested`  | [`Invested`]            |
//! | `deposited` | [`RewardDeposited`]     |
//! | `claimed`   | [`Claimed`]             |
//! | `withdrawn` | [`PaymentWithdrawn`]    |
//! | `lnk_add`   | [`LinkAdded`]           |
//! | `lnk_del`   | [`LinkRemoved`]         |

use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env};

use crate::types::Phase;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundCreated {
    pub round_id: u64,
    pub signer: BytesN<20>,
    pub payment_token: Address,
    pub total_allocated: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PhaseChanged {
    pub round_id: u64,
    pub previous: Phase,
    pub phase: Phase,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardTokenSet {
    pub round_id: u64,
    pub token: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardAllocationSet {
    pub round_id: u64,
    pub allocation: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invested {
    pub round_id: u64,
    pub identity: Address,
    /// Wallet that signed the call and paid; the identity or one of its delegates.
    pub caller: Address,
    pub amount: i128,
    pub total_invested: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardDeposited {
    pub round_id: u64,
    pub depositor: Address,
    pub amount: i128,
    pub total_deposited: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Claimed {
    pub round_id: u64,
    pub identity: Address,
    pub recipient: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaymentWithdrawn {
    pub round_id: u64,
    pub recipient: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkAdded {
    pub canonical: Address,
    pub delegate: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkRemoved {
    pub canonical: Address,
    pub delegate: Address,
}

pub fn emit_round_created(
    env: &Env,
    round_id: u64,
    signer: BytesN<20>,
    payment_token: Address,
    total_allocated: i128,
) {
    env.events().publish(
        (symbol_short!("created"), round_id),
        RoundCreated {
            round_id,
            signer,
            payment_token,
            total_allocated,
        },
    );
}

pub fn emit_phase_changed(env: &Env, round_id: u64, previous: Phase, phase: Phase) {
    env.events().publish(
        (symbol_short!("phase"), round_id),
        PhaseChanged {
            round_id,
            previous,
            phase,
        },
    );
}

pub fn emit_reward_token_set(env: &Env, round_id: u64, token: Address) {
    env.events().publish(
        (symbol_short!("rwd_tok"), round_id),
        RewardTokenSet { round_id, token },
    );
}

pub fn emit_reward_allocation_set(env: &Env, round_id: u64, allocation: i128) {
    env.events().publish(
        (symbol_short!("rwd_alloc"), round_id),
        RewardAllocationSet {
            round_id,
            allocation,
        },
    );
}

pub fn emit_invested(
    env: &Env,
    round_id: u64,
    identity: Address,
    caller: Address,
    amount: i128,
    total_invested: i128,
) {
    env.events().publish(
        (symbol_short!("invested"), round_id),
        Invested {
            round_id,
            identity,
            caller,
            amount,
            total_invested,
        },
    );
}

pub fn emit_reward_deposited(
    env: &Env,
    round_id: u64,
    depositor: Address,
    amount: i128,
    total_deposited: i128,
) {
    env.events().publish(
        (symbol_short!("deposited"), round_id),
        RewardDeposited {
            round_id,
            depositor,
            amount,
            total_deposited,
        },
    );
}

pub fn emit_claimed(env: &Env, round_id: u64, identity: Address, recipient: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("claimed"), round_id),
        Claimed {
            round_id,
            identity,
            recipient,
            amount,
        },
    );
}

pub fn emit_payment_withdrawn(env: &Env, round_id: u64, recipient: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("withdrawn"), round_id),
        PaymentWithdrawn {
            round_id,
            recipient,
            amount,
        },
    );
}

pub fn emit_link_added(env: &Env, canonical: &Address, delegate: &Address) {
    env.events().publish(
        (symbol_short!("lnk_add"), canonical.clone()),
        LinkAdded {
            canonical: canonical.clone(),
            delegate: delegate.clone(),
        },
    );
}

pub fn emit_link_removed(env: &Env, canonical: &Address, delegate: &Address) {
    env.events().publish(
        (symbol_short!("lnk_del"), canonical.clone()),
        LinkRemoved {
            canonical: canonical.clone(),
            delegate: delegate.clone(),
        },
    );
}
