extern crate std;

use soroban_sdk::{
    testutils::{Address as _, AuthorizedFunction, AuthorizedInvocation},
    Address, IntoVal, Symbol,
};

use crate::test_fixture::{assert_contract_error, Fixture};
use crate::{Error, Phase};

fn invest_as(
    fx: &Fixture,
    caller: &Address,
    round_id: u64,
    identity: &Address,
    cap: i128,
    amount: i128,
) {
    let phase = fx.client.get_round(&round_id).phase;
    let signature = fx.signer.sign(&fx.env, identity, cap, phase);
    fx.client
        .invest(caller, &round_id, &cap, &amount, &phase, identity, &signature);
}

#[test]
fn test_add_link_and_queries() {
    let fx = Fixture::new();
    let canonical = Address::generate(&fx.env);
    let first = Address::generate(&fx.env);
    let second = Address::generate(&fx.env);

    assert_eq!(fx.client.resolve(&first), None);
    assert!(fx.client.delegates_of(&canonical).is_empty());

    fx.client.add_link(&canonical, &first);
    fx.client.add_link(&canonical, &second);

    assert!(fx.client.is_linked(&canonical, &first));
    assert!(fx.client.is_linked(&canonical, &second));
    assert!(!fx.client.is_linked(&first, &canonical));
    assert_eq!(fx.client.resolve(&first), Some(canonical.clone()));
    assert_eq!(fx.client.resolve(&canonical), None);
    assert_eq!(
        fx.client.delegates_of(&canonical),
        soroban_sdk::vec![&fx.env, first, second]
    );
}

#[test]
fn test_add_link_requires_canonical_auth() {
    let fx = Fixture::new();
    let canonical = Address::generate(&fx.env);
    let delegate = Address::generate(&fx.env);

    fx.client.add_link(&canonical, &delegate);

    assert_eq!(
        fx.env.auths(),
        std::vec![(
            canonical.clone(),
            AuthorizedInvocation {
                function: AuthorizedFunction::Contract((
                    fx.client.address.clone(),
                    Symbol::new(&fx.env, "add_link"),
                    (canonical.clone(), delegate.clone()).into_val(&fx.env),
                )),
                sub_invocations: std::vec![],
            }
        )]
    );
}

#[test]
fn test_re_adding_same_link_is_a_no_op() {
    let fx = Fixture::new();
    let canonical = Address::generate(&fx.env);
    let delegate = Address::generate(&fx.env);

    fx.client.add_link(&canonical, &delegate);
    fx.client.add_link(&canonical, &delegate);

    assert_eq!(fx.client.delegates_of(&canonical).len(), 1);
}

#[test]
fn test_delegate_cannot_serve_two_identities() {
    let fx = Fixture::new();
    let alice = Address::generate(&fx.env);
    let bob = Address::generate(&fx.env);
    let wallet = Address::generate(&fx.env);

    fx.client.add_link(&alice, &wallet);
    assert_contract_error(
        fx.client.try_add_link(&bob, &wallet),
        Error::DelegateAlreadyLinked,
    );
    assert_eq!(fx.client.resolve(&wallet), Some(alice));
}

#[test]
fn test_links_do_not_chain() {
    let fx = Fixture::new();
    let canonical = Address::generate(&fx.env);
    let delegate = Address::generate(&fx.env);
    let outsider = Address::generate(&fx.env);

    assert_contract_error(
        fx.client.try_add_link(&canonical, &canonical),
        Error::InvalidDelegate,
    );

    fx.client.add_link(&canonical, &delegate);
    // A delegate cannot take delegates of its own...
    assert_contract_error(
        fx.client.try_add_link(&delegate, &outsider),
        Error::InvalidDelegate,
    );
    // ...and a canonical identity cannot become someone's delegate.
    assert_contract_error(
        fx.client.try_add_link(&outsider, &canonical),
        Error::InvalidDelegate,
    );
}

#[test]
fn test_remove_link() {
    let fx = Fixture::new();
    let canonical = Address::generate(&fx.env);
    let first = Address::generate(&fx.env);
    let second = Address::generate(&fx.env);
    fx.client.add_link(&canonical, &first);
    fx.client.add_link(&canonical, &second);

    fx.client.remove_link(&canonical, &first);

    assert!(!fx.client.is_linked(&canonical, &first));
    assert_eq!(fx.client.resolve(&first), None);
    assert_eq!(
        fx.client.delegates_of(&canonical),
        soroban_sdk::vec![&fx.env, second.clone()]
    );
    assert_contract_error(
        fx.client.try_remove_link(&canonical, &first),
        Error::LinkNotFound,
    );

    // Once free, the wallet may be linked elsewhere.
    let other = Address::generate(&fx.env);
    fx.client.add_link(&other, &first);
    assert_eq!(fx.client.resolve(&first), Some(other));
}

#[test]
fn test_remove_link_of_other_identity_fails() {
    let fx = Fixture::new();
    let alice = Address::generate(&fx.env);
    let bob = Address::generate(&fx.env);
    let wallet = Address::generate(&fx.env);
    fx.client.add_link(&alice, &wallet);

    assert_contract_error(fx.client.try_remove_link(&bob, &wallet), Error::LinkNotFound);
    assert!(fx.client.is_linked(&alice, &wallet));
}

#[test]
fn test_delegate_invests_on_behalf_of_identity() {
    let fx = Fixture::new();
    let round_id = fx.open_round(10_000, Phase::Whale);
    let identity = Address::generate(&fx.env);
    let wallet = fx.investor(5_000);

    let phase = Phase::Whale;
    let signature = fx.signer.sign(&fx.env, &identity, 2_000, phase);
    let unlinked = fx.client.try_invest(
        &wallet,
        &round_id,
        &2_000,
        &500,
        &phase,
        &identity,
        &signature,
    );
    assert_contract_error(unlinked, Error::NotAuthorizedDelegate);

    fx.client.add_link(&identity, &wallet);
    invest_as(&fx, &wallet, round_id, &identity, 2_000, 500);

    // Recorded against the identity, paid by the wallet.
    assert_eq!(
        fx.client.get_contribution(&round_id, &identity).amount_invested,
        500
    );
    assert_eq!(
        fx.client.get_contribution(&round_id, &wallet).amount_invested,
        0
    );
    assert_eq!(fx.payment.balance(&wallet), 4_500);
    assert_eq!(fx.payment.balance(&identity), 0);

    fx.client.remove_link(&identity, &wallet);
    let revoked = fx.client.try_invest(
        &wallet,
        &round_id,
        &2_000,
        &500,
        &phase,
        &identity,
        &signature,
    );
    assert_contract_error(revoked, Error::NotAuthorizedDelegate);
}

#[test]
fn test_identity_and_delegates_share_one_cap() {
    let fx = Fixture::new();
    let round_id = fx.open_round(10_000, Phase::Shark);
    let identity = fx.investor(5_000);
    let wallet = fx.investor(5_000);
    fx.client.add_link(&identity, &wallet);

    fx.invest(round_id, &identity, 1_000, 700);
    let signature = fx.signer.sign(&fx.env, &identity, 1_000, Phase::Shark);
    let result = fx.client.try_invest(
        &wallet,
        &round_id,
        &1_000,
        &301,
        &Phase::Shark,
        &identity,
        &signature,
    );
    assert_contract_error(result, Error::CapExceeded);

    invest_as(&fx, &wallet, round_id, &identity, 1_000, 300);
    assert_eq!(
        fx.client.get_contribution(&round_id, &identity).amount_invested,
        1_000
    );
}

#[test]
fn test_delegate_claims_to_another_delegate() {
    let fx = Fixture::new();
    let round_id = fx.open_round(10_000, Phase::Fcfs);
    let identity = fx.investor(5_000);
    let hot_wallet = Address::generate(&fx.env);
    let cold_wallet = Address::generate(&fx.env);
    fx.client.add_link(&identity, &hot_wallet);
    fx.client.add_link(&identity, &cold_wallet);

    fx.invest(round_id, &identity, 5_000, 1_000);
    fx.configure_rewards(round_id, 400);
    fx.deposit(round_id, 400);

    fx.client
        .claim(&hot_wallet, &round_id, &400, &cold_wallet, &identity);

    assert_eq!(fx.reward.balance(&cold_wallet), 400);
    assert_eq!(fx.reward.balance(&hot_wallet), 0);
    assert_eq!(
        fx.client.get_contribution(&round_id, &identity).amount_claimed,
        400
    );
}

#[test]
fn test_claim_to_unlinked_recipient_fails() {
    let fx = Fixture::new();
    let round_id = fx.open_round(10_000, Phase::Fcfs);
    let identity = fx.investor(5_000);
    let stranger = Address::generate(&fx.env);

    fx.invest(round_id, &identity, 5_000, 1_000);
    fx.configure_rewards(round_id, 400);
    fx.deposit(round_id, 400);

    assert_contract_error(
        fx.client
            .try_claim(&identity, &round_id, &100, &stranger, &identity),
        Error::NotAuthorizedDelegate,
    );
    assert_contract_error(
        fx.client
            .try_claim(&stranger, &round_id, &100, &identity, &identity),
        Error::NotAuthorizedDelegate,
    );
    assert_eq!(fx.client.compute_claimable(&identity, &round_id), 400);
}
