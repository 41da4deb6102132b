//! # Types
//!
//! Shared data structures used across all modules of the investment handler.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! A `Round` is internally stored as two separate ledger entries:
//!
//! - [`RoundConfig`]: written once by `create_round`; never mutated.
//! - [`RoundState`]: written on every invest, deposit, claim and operator update.
//!
//! The public API exposes the reconstructed [`Round`] struct for convenience.
//!
//! ### Phase is operator-driven
//!
//! [`Phase`] has no enforced ordering. The operator may move a round from any
//! phase to any other; the only rule is that `invest` is accepted when the
//! round's phase equals the phase carried in the contributor's signature, and
//! never while the round is `Closed`.

use soroban_sdk::{contracttype, Address, BytesN};

/// Contribution phase of a round.
///
/// The discriminant is the byte the off-chain signer packs into the signed
/// message, so the values must never be renumbered.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Phase {
    /// Not accepting contributions.
    Closed = 0,
    /// Large-allocation contributors.
    Whale = 1,
    /// Mid-allocation contributors.
    Shark = 2,
    /// First come, first served.
    Fcfs = 3,
}

impl Phase {
    /// Byte representation used in the signed message.
    pub fn as_u8(self) -> u8 {
        self as u32 as u8
    }
}

/// Immutable round configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundConfig {
    pub id: u64,
    /// EVM-style address of the off-chain signer authorizing contributions.
    pub signer: BytesN<20>,
    pub payment_token: Address,
    /// Hard cap on aggregate contributions.
    pub total_allocated_payment_token: i128,
}

/// Mutable round state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundState {
    pub phase: Phase,
    pub reward_token: Option<Address>,
    /// Total reward units ultimately owed to the round. Caps the claim pool.
    pub reward_token_allocation: i128,
    pub total_invested_payment_token: i128,
    /// Reward units actually received through `deposit_reward`.
    pub total_reward_deposited: i128,
    pub total_reward_claimed: i128,
    pub total_payment_withdrawn: i128,
}

/// Full view of a round, reconstructed from its config and state entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Round {
    /// Unique identifier (auto-incremented, starting at 1).
    pub id: u64,
    /// Signer whose signature authorizes participation.
    pub signer: BytesN<20>,
    /// Token contributors pay in.
    pub payment_token: Address,
    /// Token distributed to contributors, once set.
    pub reward_token: Option<Address>,
    /// Hard cap on aggregate contributions.
    pub total_allocated_payment_token: i128,
    /// Running sum of accepted contributions.
    pub total_invested_payment_token: i128,
    /// Total reward units owed to the round.
    pub reward_token_allocation: i128,
    /// Reward units deposited so far.
    pub total_reward_deposited: i128,
    /// Reward units released to contributors so far.
    pub total_reward_claimed: i128,
    /// Payment units released to the operator so far.
    pub total_payment_withdrawn: i128,
    /// Current contribution phase.
    pub phase: Phase,
}

/// An identity's cumulative position in one round.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Contribution {
    pub amount_invested: i128,
    pub amount_claimed: i128,
}
