//! # Investment Handler Contract
//!
//! Administers staged fundraising rounds. Contributors pledge a payment token
//! against a cap and phase approved off-chain by the round's signer; later an
//! operator deposits a reward token into the round, and contributors claim a
//! running pro-rata share of whatever has been deposited so far.
//!
//! | Phase        | Entry Point(s)                                              |
//! |--------------|-------------------------------------------------------------|
//! | Bootstrap    | [`InvestmentHandler::init`]                                 |
//! | Role admin   | `grant_role`, `revoke_role`, `transfer_super_admin`         |
//! | Rounds       | `create_round`, `set_phase`, `set_reward_token`, `set_reward_allocation` |
//! | Delegation   | `add_link`, `remove_link`                                   |
//! | Investing    | [`InvestmentHandler::invest`]                               |
//! | Rewards      | `deposit_reward`, [`InvestmentHandler::claim`]              |
//! | Treasury     | `withdraw_payment`                                          |
//! | Queries      | `get_round`, `get_contribution`, `compute_claimable`, `verify_signature`, `is_linked`, `resolve`, `delegates_of`, `latest_round_id`, `total_invested_all_rounds`, `role_of`, `has_role` |
//!
//! ## Architecture
//!
//! Authorization lives in [`rbac`] (operators) and [`delegation`]
//! (contributors and their wallets). Signature checks live in [`signature`],
//! the phase gate in [`phase`], claim math in [`allocation`]. Storage access
//! is delegated to [`storage`]; event payloads to [`events`].
//!
//! Every entry point that moves tokens finishes all checks and storage
//! writes before calling the token contract.

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, panic_with_error, token, Address, BytesN, Env, Vec,
};

pub mod allocation;
pub mod delegation;
pub mod events;
pub mod phase;
pub mod rbac;
pub mod signature;
mod storage;
mod types;

#[cfg(test)]
mod test_claims;
#[cfg(test)]
mod test_delegation;

use storage::{
    load_contribution, load_round, load_round_config, load_round_state, next_round_id,
    save_contribution, save_round, save_round_state, set_total_invested, total_invested,
};
pub use rbac::Role;
pub use types::{Contribution, Phase, Round, RoundConfig, RoundState};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    RoundNotFound            = 1,
    /// Round is closed or its phase differs from the signed phase.
    RoundNotOpen             = 2,
    InvalidSignature         = 3,
    /// Caller or recipient is neither the identity nor its linked delegate.
    NotAuthorizedDelegate    = 4,
    /// Per-identity cap from the signed authorization.
    CapExceeded              = 5,
    /// Round-wide payment allocation.
    RoundOversubscribed      = 6,
    ClaimExceedsEntitlement  = 7,
    InvalidAmount            = 8,
    NotAuthorized            = 9,
    AlreadyInitialized       = 10,
    RoleNotFound             = 11,
    RewardTokenNotSet        = 12,
    DelegateAlreadyLinked    = 13,
    LinkNotFound             = 14,
    InvalidDelegate          = 15,
    WithdrawalExceedsBalance = 16,
    ArithmeticOverflow       = 17,
    /// The round already holds deposits in its current reward token.
    RewardTokenLocked        = 18,
}

#[contract]
pub struct InvestmentHandler;

#[contractimpl]
impl InvestmentHandler {
    // ─────────────────────────────────────────────────────────
    // Initialisation
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract and set the first SuperAdmin.
    ///
    /// Must be called exactly once immediately after deployment.
    /// Subsequent calls panic with `Error::AlreadyInitialized`.
    pub fn init(env: Env, super_admin: Address) {
        super_admin.require_auth();
        rbac::init_super_admin(&env, &super_admin);
    }

    // ─────────────────────────────────────────────────────────
    // Role management
    // ─────────────────────────────────────────────────────────

    /// Grant `role` to `target`.
    ///
    /// - `caller` must hold `SuperAdmin` or `Admin`.
    /// - Only `SuperAdmin` can grant `Admin`; nobody can grant `SuperAdmin`.
    pub fn grant_role(env: Env, caller: Address, target: Address, role: Role) {
        rbac::grant_role(&env, &caller, &target, role);
    }

    /// Revoke any role from `target`.
    ///
    /// Cannot be used to remove the SuperAdmin; use `transfer_super_admin`.
    pub fn revoke_role(env: Env, caller: Address, target: Address) {
        rbac::revoke_role(&env, &caller, &target);
    }

    /// Transfer SuperAdmin to `new_super_admin`. The previous SuperAdmin
    /// loses the role immediately.
    pub fn transfer_super_admin(env: Env, current_super_admin: Address, new_super_admin: Address) {
        rbac::transfer_super_admin(&env, &current_super_admin, &new_super_admin);
    }

    pub fn role_of(env: Env, address: Address) -> Option<Role> {
        rbac::role_of(&env, address)
    }

    pub fn has_role(env: Env, address: Address, role: Role) -> bool {
        rbac::has_role(&env, address, role)
    }

    // ─────────────────────────────────────────────────────────
    // Round administration (operator)
    // ─────────────────────────────────────────────────────────

    /// Open a new round in the `Closed` phase and return its ID.
    ///
    /// - `signer` is the 20-byte address whose signatures authorize contributors.
    /// - `total_allocated` caps aggregate contributions and must be positive.
    pub fn create_round(
        env: Env,
        caller: Address,
        signer: BytesN<20>,
        payment_token: Address,
        total_allocated: i128,
    ) -> u64 {
        caller.require_auth();
        rbac::require_operator(&env, &caller);

        if total_allocated <= 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let id = next_round_id(&env);
        let config = RoundConfig {
            id,
            signer: signer.clone(),
            payment_token: payment_token.clone(),
            total_allocated_payment_token: total_allocated,
        };
        let state = RoundState {
            phase: Phase::Closed,
            reward_token: None,
            reward_token_allocation: 0,
            total_invested_payment_token: 0,
            total_reward_deposited: 0,
            total_reward_claimed: 0,
            total_payment_withdrawn: 0,
        };
        save_round(&env, &config, &state);

        events::emit_round_created(&env, id, signer, payment_token, total_allocated);
        id
    }

    /// Set the contribution phase of a round. Transitions are unrestricted.
    pub fn set_phase(env: Env, caller: Address, round_id: u64, phase: Phase) {
        caller.require_auth();
        rbac::require_operator(&env, &caller);
        phase::set_phase(&env, round_id, phase);
    }

    /// Set the token contributors are rewarded in.
    ///
    /// The token may be replaced until the first deposit. After that only the
    /// current token is accepted, so claims are always paid from what this
    /// round received.
    pub fn set_reward_token(env: Env, caller: Address, round_id: u64, token: Address) {
        caller.require_auth();
        rbac::require_operator(&env, &caller);

        let mut state = load_round_state(&env, round_id);
        if state.total_reward_deposited > 0 && state.reward_token.as_ref() != Some(&token) {
            panic_with_error!(&env, Error::RewardTokenLocked);
        }
        state.reward_token = Some(token.clone());
        save_round_state(&env, round_id, &state);

        events::emit_reward_token_set(&env, round_id, token);
    }

    /// Set the total reward units owed to the round.
    ///
    /// Claims are computed from deposits actually received; this figure only
    /// caps how much of those deposits counts toward entitlements.
    pub fn set_reward_allocation(env: Env, caller: Address, round_id: u64, allocation: i128) {
        caller.require_auth();
        rbac::require_operator(&env, &caller);

        if allocation < 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let mut state = load_round_state(&env, round_id);
        state.reward_token_allocation = allocation;
        save_round_state(&env, round_id, &state);

        events::emit_reward_allocation_set(&env, round_id, allocation);
    }

    /// Pull `amount` of the round's reward token from `caller` into the contract.
    pub fn deposit_reward(env: Env, caller: Address, round_id: u64, amount: i128) {
        caller.require_auth();
        rbac::require_operator(&env, &caller);

        if amount <= 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let mut state = load_round_state(&env, round_id);
        let reward_token = match state.reward_token.clone() {
            Some(token) => token,
            None => panic_with_error!(&env, Error::RewardTokenNotSet),
        };
        state.total_reward_deposited = checked_add(&env, state.total_reward_deposited, amount);
        save_round_state(&env, round_id, &state);

        token::Client::new(&env, &reward_token).transfer(
            &caller,
            &env.current_contract_address(),
            &amount,
        );

        events::emit_reward_deposited(&env, round_id, caller, amount, state.total_reward_deposited);
    }

    /// Release raised payment tokens to `recipient`.
    ///
    /// Cumulative withdrawals never exceed the round's invested total.
    pub fn withdraw_payment(
        env: Env,
        caller: Address,
        round_id: u64,
        recipient: Address,
        amount: i128,
    ) {
        caller.require_auth();
        rbac::require_operator(&env, &caller);

        if amount <= 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let config = load_round_config(&env, round_id);
        let mut state = load_round_state(&env, round_id);
        let withdrawn = checked_add(&env, state.total_payment_withdrawn, amount);
        if withdrawn > state.total_invested_payment_token {
            panic_with_error!(&env, Error::WithdrawalExceedsBalance);
        }
        state.total_payment_withdrawn = withdrawn;
        save_round_state(&env, round_id, &state);

        token::Client::new(&env, &config.payment_token).transfer(
            &env.current_contract_address(),
            &recipient,
            &amount,
        );

        events::emit_payment_withdrawn(&env, round_id, recipient, amount);
    }

    // ─────────────────────────────────────────────────────────
    // Delegation
    // ─────────────────────────────────────────────────────────

    /// Authorize `delegate` to invest and claim on behalf of `canonical`.
    /// `canonical` must sign.
    pub fn add_link(env: Env, canonical: Address, delegate: Address) {
        delegation::add_link(&env, &canonical, &delegate);
    }

    /// Revoke `delegate`'s authority for `canonical`. `canonical` must sign.
    pub fn remove_link(env: Env, canonical: Address, delegate: Address) {
        delegation::remove_link(&env, &canonical, &delegate);
    }

    pub fn is_linked(env: Env, canonical: Address, delegate: Address) -> bool {
        delegation::is_linked(&env, &canonical, &delegate)
    }

    pub fn resolve(env: Env, delegate: Address) -> Option<Address> {
        delegation::resolve(&env, &delegate)
    }

    pub fn delegates_of(env: Env, canonical: Address) -> Vec<Address> {
        delegation::delegates_of(&env, &canonical)
    }

    // ─────────────────────────────────────────────────────────
    // Investing
    // ─────────────────────────────────────────────────────────

    /// Contribute `amount` of the round's payment token on behalf of `identity`.
    ///
    /// `caller` is `identity` or one of its delegates and pays for the
    /// contribution. `signature` is the round signer's approval of
    /// `(identity, cap, phase)`. Checks, in order: phase, delegation,
    /// signature, per-identity cap, round allocation.
    pub fn invest(
        env: Env,
        caller: Address,
        round_id: u64,
        cap: i128,
        amount: i128,
        phase: Phase,
        identity: Address,
        signature: BytesN<65>,
    ) {
        caller.require_auth();

        if amount <= 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let config = load_round_config(&env, round_id);
        let mut state = load_round_state(&env, round_id);

        phase::require_open(&env, &state, phase);
        delegation::require_acting_for(&env, &caller, &identity);
        if !signature::verify(&env, &config.signer, &identity, cap, phase, &signature) {
            panic_with_error!(&env, Error::InvalidSignature);
        }

        let mut contribution = load_contribution(&env, round_id, &identity);
        let invested = checked_add(&env, contribution.amount_invested, amount);
        if invested > cap {
            panic_with_error!(&env, Error::CapExceeded);
        }
        let round_total = checked_add(&env, state.total_invested_payment_token, amount);
        if round_total > config.total_allocated_payment_token {
            panic_with_error!(&env, Error::RoundOversubscribed);
        }

        contribution.amount_invested = invested;
        state.total_invested_payment_token = round_total;
        save_contribution(&env, round_id, &identity, &contribution);
        save_round_state(&env, round_id, &state);
        set_total_invested(&env, checked_add(&env, total_invested(&env), amount));

        token::Client::new(&env, &config.payment_token).transfer(
            &caller,
            &env.current_contract_address(),
            &amount,
        );

        events::emit_invested(&env, round_id, identity, caller, amount, round_total);
    }

    // ─────────────────────────────────────────────────────────
    // Claiming
    // ─────────────────────────────────────────────────────────

    /// Release `amount` of reward tokens owed to `identity` to `recipient`.
    ///
    /// `caller` and `recipient` must each be `identity` or one of its
    /// delegates; they need not be the same wallet.
    pub fn claim(
        env: Env,
        caller: Address,
        round_id: u64,
        amount: i128,
        recipient: Address,
        identity: Address,
    ) {
        caller.require_auth();

        if amount <= 0 {
            panic_with_error!(&env, Error::InvalidAmount);
        }

        let mut state = load_round_state(&env, round_id);

        delegation::require_acting_for(&env, &caller, &identity);
        delegation::require_acting_for(&env, &recipient, &identity);

        let reward_token = match state.reward_token.clone() {
            Some(token) => token,
            None => panic_with_error!(&env, Error::RewardTokenNotSet),
        };

        let mut contribution = load_contribution(&env, round_id, &identity);
        if amount > allocation::claimable(&env, &state, &contribution) {
            panic_with_error!(&env, Error::ClaimExceedsEntitlement);
        }

        contribution.amount_claimed += amount;
        state.total_reward_claimed += amount;
        save_contribution(&env, round_id, &identity, &contribution);
        save_round_state(&env, round_id, &state);

        token::Client::new(&env, &reward_token).transfer(
            &env.current_contract_address(),
            &recipient,
            &amount,
        );

        events::emit_claimed(&env, round_id, identity, recipient, amount);
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    /// Reward units `identity` could claim from `round_id` right now.
    pub fn compute_claimable(env: Env, identity: Address, round_id: u64) -> i128 {
        let state = load_round_state(&env, round_id);
        let contribution = load_contribution(&env, round_id, &identity);
        allocation::claimable(&env, &state, &contribution)
    }

    /// Returns whether `signature` approves `(identity, cap, phase)` for `signer`.
    /// Malformed signatures yield `false`.
    pub fn verify_signature(
        env: Env,
        signer: BytesN<20>,
        identity: Address,
        cap: i128,
        phase: Phase,
        signature: BytesN<65>,
    ) -> bool {
        signature::verify(&env, &signer, &identity, cap, phase, &signature)
    }

    /// Retrieve a round by its ID.
    pub fn get_round(env: Env, round_id: u64) -> Round {
        load_round(&env, round_id)
    }

    /// Retrieve `identity`'s position in a round (zeroes if it never invested).
    pub fn get_contribution(env: Env, round_id: u64, identity: Address) -> Contribution {
        load_round_config(&env, round_id);
        load_contribution(&env, round_id, &identity)
    }

    /// ID of the most recently created round (0 if none).
    pub fn latest_round_id(env: Env) -> u64 {
        storage::latest_round_id(&env)
    }

    /// Payment units invested across every round.
    pub fn total_invested_all_rounds(env: Env) -> i128 {
        total_invested(&env)
    }
}

fn checked_add(env: &Env, a: i128, b: i128) -> i128 {
    a.checked_add(b)
        .unwrap_or_else(|| panic_with_error!(env, Error::ArithmeticOverflow))
}
