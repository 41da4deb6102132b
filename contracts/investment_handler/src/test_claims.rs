extern crate std;

use soroban_sdk::{testutils::Address as _, Address};

use crate::invariants::{
    assert_all_round_invariants, assert_claimed_monotonic, assert_contributions_sum,
};
use crate::test_fixture::{assert_contract_error, Fixture};
use crate::{Error, Phase};

/// Round with two identities that invested `first` and `second`.
fn funded_round(fx: &Fixture, first: i128, second: i128) -> (u64, Address, Address) {
    let round_id = fx.open_round(first + second, Phase::Fcfs);
    let alice = fx.investor(first);
    let bob = fx.investor(second);
    fx.invest(round_id, &alice, first, first);
    fx.invest(round_id, &bob, second, second);
    (round_id, alice, bob)
}

fn check_round(fx: &Fixture, round_id: u64, identities: &[&Address]) {
    let round = fx.client.get_round(&round_id);
    let contributions: std::vec::Vec<_> = identities
        .iter()
        .map(|identity| fx.client.get_contribution(&round_id, identity))
        .collect();
    assert_all_round_invariants(&round);
    assert_contributions_sum(&round, &contributions);
}

#[test]
fn test_equal_investors_split_partial_then_full_deposit() {
    let fx = Fixture::new();
    let (round_id, alice, bob) = funded_round(&fx, 50_000, 50_000);
    fx.configure_rewards(round_id, 100_000);

    fx.deposit(round_id, 50_000);
    assert_eq!(fx.client.compute_claimable(&alice, &round_id), 25_000);
    assert_eq!(fx.client.compute_claimable(&bob, &round_id), 25_000);

    fx.client.claim(&alice, &round_id, &25_000, &alice, &alice);
    check_round(&fx, round_id, &[&alice, &bob]);

    fx.deposit(round_id, 50_000);
    assert_eq!(fx.client.compute_claimable(&alice, &round_id), 25_000);
    assert_eq!(fx.client.compute_claimable(&bob, &round_id), 50_000);

    fx.client.claim(&alice, &round_id, &25_000, &alice, &alice);
    fx.client.claim(&bob, &round_id, &50_000, &bob, &bob);

    assert_eq!(fx.reward.balance(&alice), 50_000);
    assert_eq!(fx.reward.balance(&bob), 50_000);
    assert_eq!(fx.reward.balance(&fx.client.address), 0);
    assert_eq!(fx.client.compute_claimable(&alice, &round_id), 0);
    assert_eq!(fx.client.compute_claimable(&bob, &round_id), 0);
    check_round(&fx, round_id, &[&alice, &bob]);
}

#[test]
fn test_partial_claims_accumulate() {
    let fx = Fixture::new();
    let (round_id, alice, bob) = funded_round(&fx, 1_000, 3_000);
    fx.configure_rewards(round_id, 8_000);
    fx.deposit(round_id, 8_000);

    let mut before = fx.client.get_contribution(&round_id, &alice);
    for _ in 0..4 {
        fx.client.claim(&alice, &round_id, &500, &alice, &alice);
        let after = fx.client.get_contribution(&round_id, &alice);
        assert_claimed_monotonic(&before, &after);
        before = after;
    }

    assert_eq!(before.amount_claimed, 2_000);
    assert_eq!(fx.client.compute_claimable(&alice, &round_id), 0);
    assert_eq!(fx.client.compute_claimable(&bob, &round_id), 6_000);
    check_round(&fx, round_id, &[&alice, &bob]);
}

#[test]
fn test_claim_beyond_entitlement_fails() {
    let fx = Fixture::new();
    let (round_id, alice, bob) = funded_round(&fx, 1_000, 1_000);
    fx.configure_rewards(round_id, 1_000);
    fx.deposit(round_id, 1_000);

    assert_contract_error(
        fx.client.try_claim(&alice, &round_id, &501, &alice, &alice),
        Error::ClaimExceedsEntitlement,
    );

    fx.client.claim(&alice, &round_id, &500, &alice, &alice);
    assert_contract_error(
        fx.client.try_claim(&alice, &round_id, &1, &alice, &alice),
        Error::ClaimExceedsEntitlement,
    );
    assert_eq!(fx.reward.balance(&alice), 500);

    let outsider = Address::generate(&fx.env);
    assert_eq!(fx.client.compute_claimable(&outsider, &round_id), 0);
    assert_contract_error(
        fx.client
            .try_claim(&outsider, &round_id, &1, &outsider, &outsider),
        Error::ClaimExceedsEntitlement,
    );
    check_round(&fx, round_id, &[&alice, &bob]);
}

#[test]
fn test_claim_rejects_bad_input() {
    let fx = Fixture::new();
    let (round_id, alice, _) = funded_round(&fx, 1_000, 1_000);

    // No reward token yet.
    assert_contract_error(
        fx.client.try_claim(&alice, &round_id, &1, &alice, &alice),
        Error::RewardTokenNotSet,
    );
    assert_contract_error(
        fx.client.try_deposit_reward(&fx.manager, &round_id, &1),
        Error::RewardTokenNotSet,
    );

    fx.configure_rewards(round_id, 1_000);
    fx.deposit(round_id, 1_000);

    for amount in [0i128, -1] {
        assert_contract_error(
            fx.client.try_claim(&alice, &round_id, &amount, &alice, &alice),
            Error::InvalidAmount,
        );
    }
    assert_contract_error(
        fx.client.try_claim(&alice, &99, &1, &alice, &alice),
        Error::RoundNotFound,
    );
    assert_contract_error(
        fx.client.try_set_reward_allocation(&fx.manager, &round_id, &-1),
        Error::InvalidAmount,
    );
}

#[test]
fn test_nothing_claimable_before_deposit() {
    let fx = Fixture::new();
    let (round_id, alice, _) = funded_round(&fx, 1_000, 1_000);
    fx.configure_rewards(round_id, 1_000);

    assert_eq!(fx.client.compute_claimable(&alice, &round_id), 0);
    assert_contract_error(
        fx.client.try_claim(&alice, &round_id, &1, &alice, &alice),
        Error::ClaimExceedsEntitlement,
    );
}

#[test]
fn test_deposits_beyond_allocation_are_not_distributed() {
    let fx = Fixture::new();
    let (round_id, alice, bob) = funded_round(&fx, 1_000, 1_000);
    fx.configure_rewards(round_id, 1_000);
    fx.deposit(round_id, 1_500);

    assert_eq!(fx.client.get_round(&round_id).total_reward_deposited, 1_500);
    assert_eq!(fx.client.compute_claimable(&alice, &round_id), 500);
    assert_eq!(fx.client.compute_claimable(&bob, &round_id), 500);

    // Raising the allocation releases the surplus.
    fx.client
        .set_reward_allocation(&fx.manager, &round_id, &1_500);
    assert_eq!(fx.client.compute_claimable(&alice, &round_id), 750);
    check_round(&fx, round_id, &[&alice, &bob]);
}

#[test]
fn test_lowering_allocation_below_claimed_yields_zero() {
    let fx = Fixture::new();
    let (round_id, alice, bob) = funded_round(&fx, 1_000, 1_000);
    fx.configure_rewards(round_id, 1_000);
    fx.deposit(round_id, 1_000);
    fx.client.claim(&alice, &round_id, &500, &alice, &alice);

    fx.client.set_reward_allocation(&fx.manager, &round_id, &200);

    assert_eq!(fx.client.compute_claimable(&alice, &round_id), 0);
    assert_eq!(fx.client.compute_claimable(&bob, &round_id), 0);
    assert_contract_error(
        fx.client.try_claim(&bob, &round_id, &1, &bob, &bob),
        Error::ClaimExceedsEntitlement,
    );
}

#[test]
fn test_late_investor_cannot_overdraw_pool() {
    let fx = Fixture::new();
    let round_id = fx.open_round(10_000, Phase::Fcfs);
    let alice = fx.investor(1_000);
    let bob = fx.investor(1_000);
    fx.configure_rewards(round_id, 2_000);

    fx.invest(round_id, &alice, 1_000, 1_000);
    fx.deposit(round_id, 1_000);
    fx.client.claim(&alice, &round_id, &1_000, &alice, &alice);

    // Bob dilutes the pool after Alice claimed all of it.
    fx.invest(round_id, &bob, 1_000, 1_000);
    assert_eq!(fx.client.compute_claimable(&alice, &round_id), 0);
    assert_eq!(fx.client.compute_claimable(&bob, &round_id), 0);
    check_round(&fx, round_id, &[&alice, &bob]);

    fx.deposit(round_id, 1_000);
    assert_eq!(fx.client.compute_claimable(&alice, &round_id), 0);
    assert_eq!(fx.client.compute_claimable(&bob, &round_id), 1_000);

    fx.client.claim(&bob, &round_id, &1_000, &bob, &bob);
    assert_eq!(fx.reward.balance(&fx.client.address), 0);
    check_round(&fx, round_id, &[&alice, &bob]);
}

#[test]
fn test_rounds_are_isolated() {
    let fx = Fixture::new();
    let (first, alice, _) = funded_round(&fx, 1_000, 1_000);
    let (second, carol, _) = funded_round(&fx, 1_000, 3_000);
    fx.configure_rewards(first, 1_000);
    fx.configure_rewards(second, 4_000);
    fx.deposit(first, 1_000);

    assert_eq!(fx.client.compute_claimable(&alice, &first), 500);
    assert_eq!(fx.client.compute_claimable(&alice, &second), 0);
    assert_eq!(fx.client.compute_claimable(&carol, &second), 0);

    fx.deposit(second, 4_000);
    assert_eq!(fx.client.compute_claimable(&carol, &second), 1_000);
}

#[test]
fn test_reward_token_can_be_replaced_before_first_deposit() {
    let fx = Fixture::new();
    let (round_id, alice, _) = funded_round(&fx, 1_000, 1_000);
    fx.configure_rewards(round_id, 1_000);

    fx.client
        .set_reward_token(&fx.manager, &round_id, &fx.payment.address);
    assert_eq!(
        fx.client.get_round(&round_id).reward_token,
        Some(fx.payment.address.clone())
    );

    fx.client
        .set_reward_token(&fx.manager, &round_id, &fx.reward.address);
    fx.deposit(round_id, 1_000);
    fx.client.claim(&alice, &round_id, &500, &alice, &alice);
    assert_eq!(fx.reward.balance(&alice), 500);
}

#[test]
fn test_reward_token_is_locked_after_deposit() {
    let fx = Fixture::new();
    let (round_id, alice, _) = funded_round(&fx, 1_000, 1_000);
    fx.configure_rewards(round_id, 1_000);
    fx.deposit(round_id, 400);

    assert_contract_error(
        fx.client
            .try_set_reward_token(&fx.manager, &round_id, &fx.payment.address),
        Error::RewardTokenLocked,
    );
    assert_eq!(
        fx.client.get_round(&round_id).reward_token,
        Some(fx.reward.address.clone())
    );

    // Re-setting the current token is still accepted.
    fx.client
        .set_reward_token(&fx.manager, &round_id, &fx.reward.address);
    fx.deposit(round_id, 600);
    fx.client.claim(&alice, &round_id, &500, &alice, &alice);
    assert_eq!(fx.reward.balance(&alice), 500);
    check_round(&fx, round_id, &[&alice]);
}

#[test]
fn test_round_cannot_switch_to_another_rounds_reward_token() {
    let fx = Fixture::new();

    // Round A is rewarded in the payment token, round B in the reward token.
    let round_a = fx.open_round(1_000, Phase::Fcfs);
    let alice = fx.investor(1_000);
    fx.invest(round_a, &alice, 1_000, 1_000);
    fx.client
        .set_reward_token(&fx.manager, &round_a, &fx.payment.address);
    fx.client
        .set_reward_allocation(&fx.manager, &round_a, &1_000);
    fx.payment_sac.mint(&fx.manager, &1_000);
    fx.client.deposit_reward(&fx.manager, &round_a, &1_000);

    let round_b = fx.open_round(1_000, Phase::Fcfs);
    let bob = fx.investor(1_000);
    fx.invest(round_b, &bob, 1_000, 1_000);
    fx.configure_rewards(round_b, 1_000);
    fx.deposit(round_b, 1_000);

    assert_contract_error(
        fx.client
            .try_set_reward_token(&fx.manager, &round_a, &fx.reward.address),
        Error::RewardTokenLocked,
    );

    fx.client.claim(&alice, &round_a, &1_000, &alice, &alice);
    assert_eq!(fx.reward.balance(&alice), 0);
    assert_eq!(fx.payment.balance(&alice), 1_000);

    fx.client.claim(&bob, &round_b, &1_000, &bob, &bob);
    assert_eq!(fx.reward.balance(&bob), 1_000);
    assert_eq!(fx.reward.balance(&fx.client.address), 0);
}

/// Rebuild the pool from many small deposits and confirm a claimant's
/// entitlement never drifts by more than one unit from the exact share.
#[test]
fn test_many_small_deposits_do_not_drift() {
    const STEPS: i128 = 1_000;
    const ALLOCATION: i128 = 1_000_000_000_000_000_000_000;

    let fx = Fixture::new();
    fx.env.cost_estimate().budget().reset_unlimited();

    let (round_id, alice, bob) = funded_round(&fx, 1_000, 2_000);
    fx.configure_rewards(round_id, ALLOCATION);

    let increment = ALLOCATION / STEPS;
    for step in 1..=STEPS {
        fx.deposit(round_id, increment);

        // Alice holds a third of the round.
        let pool = step * increment;
        let entitled = fx.client.get_contribution(&round_id, &alice).amount_claimed
            + fx.client.compute_claimable(&alice, &round_id);
        let scaled_error = pool - 3 * entitled;
        assert!(
            (0..3).contains(&scaled_error),
            "step {}: entitlement {} drifted from pool {}",
            step,
            entitled,
            pool
        );

        let claimable = fx.client.compute_claimable(&alice, &round_id);
        if claimable > 0 {
            fx.client.claim(&alice, &round_id, &claimable, &alice, &alice);
        }
    }

    let bob_share = fx.client.compute_claimable(&bob, &round_id);
    fx.client.claim(&bob, &round_id, &bob_share, &bob, &bob);

    assert_eq!(fx.reward.balance(&alice), ALLOCATION / 3);
    assert_eq!(fx.reward.balance(&bob), ALLOCATION * 2 / 3);
    assert!(fx.reward.balance(&fx.client.address) <= 1);
    check_round(&fx, round_id, &[&alice, &bob]);
}
