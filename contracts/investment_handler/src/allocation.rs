//! # Reward allocation
//!
//! Entitlements are recomputed from cumulative totals on every query:
//!
//! ```text
//! pool        = min(total_reward_deposited, reward_token_allocation)
//! entitlement = floor(amount_invested * pool / total_invested)
//! claimable   = min(entitlement - amount_claimed, pool - total_reward_claimed), floored at 0
//! ```
//!
//! The product is taken in 256 bits before dividing, and the share is never
//! carried between deposits, so the truncation error stays below one unit no
//! matter how many deposits the pool was built from. `floor` is monotone in
//! `pool`, which makes entitlements non-decreasing as deposits arrive, and
//! the sum of all entitlements never exceeds `pool`.

use soroban_sdk::{panic_with_error, Env, I256};

use crate::types::{Contribution, RoundState};
use crate::Error;

/// Reward units currently available to the round's contributors.
pub fn reward_pool(state: &RoundState) -> i128 {
    state
        .total_reward_deposited
        .min(state.reward_token_allocation)
        .max(0)
}

/// `floor(a * b / denominator)` with a 256-bit intermediate product.
pub fn mul_div_floor(env: &Env, a: i128, b: i128, denominator: i128) -> i128 {
    if denominator <= 0 || a < 0 || b < 0 {
        panic_with_error!(env, Error::ArithmeticOverflow);
    }
    I256::from_i128(env, a)
        .mul(&I256::from_i128(env, b))
        .div(&I256::from_i128(env, denominator))
        .to_i128()
        .unwrap_or_else(|| panic_with_error!(env, Error::ArithmeticOverflow))
}

/// Pro-rata share of the current pool owed to a contribution, before
/// subtracting what was already claimed.
pub fn entitlement(env: &Env, state: &RoundState, contribution: &Contribution) -> i128 {
    if state.total_invested_payment_token == 0 || contribution.amount_invested == 0 {
        return 0;
    }
    mul_div_floor(
        env,
        contribution.amount_invested,
        reward_pool(state),
        state.total_invested_payment_token,
    )
}

/// Amount a contribution may claim right now.
pub fn claimable(env: &Env, state: &RoundState, contribution: &Contribution) -> i128 {
    let owed = entitlement(env, state, contribution) - contribution.amount_claimed;
    let unclaimed_pool = reward_pool(state) - state.total_reward_claimed;
    owed.min(unclaimed_pool).max(0)
}
