mod common;

use common::*;
use multidelegate_ledger::{
    BatchRequest, DelegationEvent, DelegationLedger, LedgerError, MultiDelegate,
};
use multidelegate_store::{AccountStore, AssetError, GovernanceToken};
use multidelegate_types::{Address, Amount, DelegateId, U256};
use std::sync::Arc;

#[test]
fn deposit_mints_and_moves_asset_into_proxies() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let (a, b) = (delegate(1), delegate(2));

    fx.engine
        .delegate_multi(&h, &[], &[a, b], &[amt(300), amt(200)])
        .unwrap();

    assert_eq!(fx.engine.balance_of(&h, &a), amt(300));
    assert_eq!(fx.engine.balance_of(&h, &b), amt(200));
    assert_eq!(fx.engine.total_supply(&a), amt(300));
    assert_eq!(fx.engine.get_balance_for_delegate(&a), amt(300));
    assert_eq!(fx.engine.get_balance_for_delegate(&b), amt(200));
    assert_eq!(fx.token.balance_of(&h), amt(500));
    assert_eq!(fx.engine.holder_total(&h), amt(500));
    fx.engine.verify_conservation().unwrap();
}

#[test]
fn proxy_votes_go_to_its_delegate() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let a = delegate(1);

    fx.engine.delegate_multi(&h, &[], &[a], &[amt(400)]).unwrap();

    assert_eq!(fx.token.get_votes(a.address()), amt(400));
    let proxy = fx.engine.proxy_address(&a);
    assert_eq!(fx.token.delegates(&proxy), *a.address());
    assert_eq!(fx.token.allowance(&proxy, &SYSTEM), Amount::MAX);
}

#[test]
fn moving_between_delegates_keeps_holder_asset_untouched() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let (a, b) = (delegate(1), delegate(2));
    fx.engine.delegate_multi(&h, &[], &[a], &[amt(300)]).unwrap();

    fx.engine.delegate_multi(&h, &[a], &[b], &[amt(100)]).unwrap();

    assert_eq!(fx.engine.balance_of(&h, &a), amt(200));
    assert_eq!(fx.engine.balance_of(&h, &b), amt(100));
    assert_eq!(fx.token.balance_of(&h), amt(700));
    assert_eq!(fx.token.get_votes(a.address()), amt(200));
    assert_eq!(fx.token.get_votes(b.address()), amt(100));
    fx.engine.verify_conservation().unwrap();
}

#[test]
fn withdrawal_returns_asset_to_holder() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let a = delegate(1);
    fx.engine.delegate_multi(&h, &[], &[a], &[amt(300)]).unwrap();

    fx.engine.delegate_multi(&h, &[a], &[], &[amt(300)]).unwrap();

    assert_eq!(fx.engine.balance_of(&h, &a), Amount::ZERO);
    assert_eq!(fx.engine.total_supply(&a), Amount::ZERO);
    assert_eq!(fx.token.balance_of(&h), amt(1000));
    assert_eq!(fx.engine.get_balance_for_delegate(&a), Amount::ZERO);
    fx.engine.verify_conservation().unwrap();
}

#[test]
fn withdrawn_asset_can_fund_a_deposit_in_the_same_batch() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 100);
    let (a, b) = (delegate(1), delegate(2));
    fx.engine.delegate_multi(&h, &[], &[a], &[amt(100)]).unwrap();
    assert_eq!(fx.token.balance_of(&h), Amount::ZERO);

    fx.engine.delegate_multi(&h, &[a], &[b], &[amt(100)]).unwrap();

    assert_eq!(fx.engine.balance_of(&h, &a), Amount::ZERO);
    assert_eq!(fx.engine.balance_of(&h, &b), amt(100));
    assert_eq!(fx.token.balance_of(&h), Amount::ZERO);
}

#[test]
fn self_delegation_is_allowed() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 50);
    let me = DelegateId::new(h);

    fx.engine.delegate_multi(&h, &[], &[me], &[amt(50)]).unwrap();

    assert_eq!(fx.engine.balance_of(&h, &me), amt(50));
    assert_eq!(fx.token.get_votes(&h), amt(50));
}

#[test]
fn withdrawing_more_than_delegated_changes_nothing() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let (a, b) = (delegate(1), delegate(2));
    fx.engine.delegate_multi(&h, &[], &[a], &[amt(100)]).unwrap();
    let transfers = fx.token.transfer_count();

    let err = fx
        .engine
        .delegate_multi(&h, &[a], &[b], &[amt(150)])
        .unwrap_err();

    match err {
        LedgerError::InsufficientDelegatedBalance {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, amt(150));
            assert_eq!(available, amt(100));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.engine.balance_of(&h, &a), amt(100));
    assert_eq!(fx.engine.balance_of(&h, &b), Amount::ZERO);
    assert_eq!(fx.engine.proxy(&b).unwrap(), None);
    assert_eq!(fx.token.transfer_count(), transfers);
    assert_eq!(fx.token.balance_of(&h), amt(900));
}

#[test]
fn repeated_withdrawals_cannot_overdraw() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let a = delegate(1);
    fx.engine.delegate_multi(&h, &[], &[a], &[amt(100)]).unwrap();

    let err = fx
        .engine
        .delegate_multi(&h, &[a, a], &[], &[amt(60), amt(60)])
        .unwrap_err();

    assert!(matches!(err, LedgerError::InsufficientDelegatedBalance { .. }));
    assert_eq!(fx.engine.balance_of(&h, &a), amt(100));
}

#[test]
fn late_deposit_failure_rolls_back_earlier_steps() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 100);
    let (a, b) = (delegate(1), delegate(2));

    let err = fx
        .engine
        .delegate_multi(&h, &[], &[a, b], &[amt(80), amt(80)])
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::AssetTransferFailed {
            reason: AssetError::InsufficientBalance { .. },
            ..
        }
    ));
    assert_eq!(fx.engine.balance_of(&h, &a), Amount::ZERO);
    assert_eq!(fx.engine.proxy(&a).unwrap(), None);
    assert_eq!(fx.store.code_count().unwrap(), 0);
    assert_eq!(fx.token.balance_of(&h), amt(100));
    assert_eq!(fx.token.transfer_count(), 0);
    assert!(fx.events.lock().unwrap().is_empty());
}

#[test]
fn deposit_without_allowance_is_rejected() {
    let fx = setup();
    let h = holder(0);
    fx.token.mint(&h, amt(100));

    let err = fx
        .engine
        .delegate_multi(&h, &[], &[delegate(1)], &[amt(10)])
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::AssetTransferFailed {
            reason: AssetError::InsufficientAllowance { .. },
            ..
        }
    ));
    assert_eq!(fx.store.code_count().unwrap(), 0);
}

#[test]
fn token_failure_during_commit_is_compensated() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let (a, b) = (delegate(1), delegate(2));
    fx.engine.delegate_multi(&h, &[], &[a], &[amt(100)]).unwrap();
    fx.events.lock().unwrap().clear();

    // approve(B), delegate(B), push from A, then the pull into B fails.
    fx.token.fail_on_call(4);
    let err = fx
        .engine
        .delegate_multi(&h, &[a], &[b], &[amt(50)])
        .unwrap_err();

    assert!(matches!(err, LedgerError::AssetTransferFailed { .. }));
    assert_eq!(fx.token.balance_of(&h), amt(900));
    assert_eq!(fx.engine.get_balance_for_delegate(&a), amt(100));
    assert_eq!(fx.engine.get_balance_for_delegate(&b), Amount::ZERO);
    assert_eq!(fx.engine.balance_of(&h, &a), amt(100));
    assert_eq!(fx.engine.balance_of(&h, &b), Amount::ZERO);
    assert_eq!(fx.engine.proxy(&b).unwrap(), None);
    let proxy_b = fx.engine.proxy_address(&b);
    assert_eq!(fx.token.delegates(&proxy_b), Address::ZERO);
    assert_eq!(fx.token.allowance(&proxy_b, &SYSTEM), Amount::ZERO);
    assert_eq!(fx.token.get_votes(a.address()), amt(100));
    assert!(fx.events.lock().unwrap().is_empty());
    fx.engine.verify_conservation().unwrap();
}

#[test]
fn binding_failure_surfaces_as_proxy_binding_error() {
    let fx = setup();
    let h = holder(0);
    fx.token.fail_on_call(1);

    let err = fx
        .engine
        .delegate_multi(&h, &[], &[delegate(1)], &[Amount::ZERO])
        .unwrap_err();

    assert!(matches!(err, LedgerError::ProxyBindingFailed { .. }));
    assert_eq!(fx.store.code_count().unwrap(), 0);
}

#[test]
fn malformed_batches_are_rejected_before_any_effect() {
    let fx = setup();
    let h = holder(0);
    let a = delegate(1);

    assert!(matches!(
        fx.engine.delegate_multi(&h, &[], &[], &[]),
        Err(LedgerError::EmptyBatch)
    ));
    assert!(matches!(
        fx.engine.delegate_multi(&h, &[a], &[a, a], &[amt(1)]),
        Err(LedgerError::AmountsLengthMismatch {
            expected: 2,
            actual: 1
        })
    ));
    assert_eq!(fx.store.code_count().unwrap(), 0);
}

#[test]
fn unequal_source_and_target_lists_pair_by_index() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let (a, b, c) = (delegate(1), delegate(2), delegate(3));
    fx.engine.delegate_multi(&h, &[], &[a], &[amt(100)]).unwrap();

    // amounts[0] leaves A and enters B, amounts[1] only enters C.
    fx.engine
        .delegate_multi(&h, &[a], &[b, c], &[amt(40), amt(25)])
        .unwrap();

    assert_eq!(fx.engine.balance_of(&h, &a), amt(60));
    assert_eq!(fx.engine.balance_of(&h, &b), amt(40));
    assert_eq!(fx.engine.balance_of(&h, &c), amt(25));
    assert_eq!(fx.token.balance_of(&h), amt(875));
}

#[test]
fn collision_at_the_derived_address_aborts_the_batch() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let (a, c) = (delegate(1), delegate(3));
    fx.store.plant_foreign(fx.engine.proxy_address(&c), [7; 32]);

    let err = fx
        .engine
        .delegate_multi(&h, &[], &[a, c], &[amt(10), Amount::ZERO])
        .unwrap_err();

    assert!(matches!(err, LedgerError::ProxyDerivationCollision { .. }));
    assert_eq!(fx.engine.proxy(&a).unwrap(), None);
    assert_eq!(fx.token.balance_of(&h), amt(1000));
    assert_eq!(fx.engine.balance_of(&h, &a), Amount::ZERO);
}

#[test]
fn proxy_addresses_are_stable_and_distinct() {
    let fx = setup();
    let (a, b) = (delegate(1), delegate(2));
    let before = fx.engine.proxy_address(&a);

    let deployed = fx.engine.deploy_proxy(&a).unwrap();
    let again = fx.engine.deploy_proxy(&a).unwrap();

    assert_eq!(deployed.address, before);
    assert_eq!(again, deployed);
    assert_ne!(fx.engine.proxy_address(&b), before);
    assert_eq!(fx.store.code_count().unwrap(), 1);
    assert_eq!(fx.events.lock().unwrap().len(), 1);
}

#[test]
fn events_follow_commit_order() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let (a, b) = (delegate(1), delegate(2));
    fx.engine.delegate_multi(&h, &[], &[a], &[amt(100)]).unwrap();
    fx.events.lock().unwrap().clear();

    fx.engine.delegate_multi(&h, &[a], &[b], &[amt(30)]).unwrap();

    let events = fx.events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            DelegationEvent::ProxyDeployed {
                delegate: b,
                proxy: fx.engine.proxy_address(&b),
            },
            DelegationEvent::Withdrawn {
                holder: h,
                delegate: a,
                amount: amt(30),
            },
            DelegationEvent::Deposited {
                holder: h,
                delegate: b,
                amount: amt(30),
            },
        ]
    );
}

#[test]
fn uri_substitutes_padded_token_id() {
    let fx = setup();
    let d = delegate(1);
    let expected = format!("http://localhost:8080/{}{}", "0".repeat(24), "61".repeat(20));
    assert_eq!(fx.engine.uri(&d), expected);
}

#[test]
fn only_the_owner_may_change_the_uri() {
    let fx = setup();
    let d = delegate(1);

    let err = fx.engine.set_uri(&holder(0), "https://evil/{id}").unwrap_err();
    assert!(matches!(err, LedgerError::NotOwner(_)));

    fx.engine.set_uri(&OWNER, "https://meta.example/{id}.json").unwrap();
    assert!(fx.engine.uri(&d).starts_with("https://meta.example/"));
    assert!(fx.engine.uri(&d).ends_with(".json"));
    assert_eq!(
        fx.events.lock().unwrap().last(),
        Some(&DelegationEvent::UriChanged {
            uri: "https://meta.example/{id}.json".into()
        })
    );
}

#[test]
fn balance_of_batch_is_pairwise() {
    let fx = setup();
    let (h0, h1) = (holder(0), holder(1));
    fund(&fx.token, &h0, 100);
    fund(&fx.token, &h1, 100);
    let (a, b) = (delegate(1), delegate(2));
    fx.engine.delegate_multi(&h0, &[], &[a], &[amt(10)]).unwrap();
    fx.engine.delegate_multi(&h1, &[], &[b], &[amt(20)]).unwrap();

    let got = fx
        .engine
        .balance_of_batch(&[h0, h1, h0], &[a, b, b])
        .unwrap();
    assert_eq!(got, vec![amt(10), amt(20), Amount::ZERO]);

    assert!(matches!(
        fx.engine.balance_of_batch(&[h0], &[a, b]),
        Err(LedgerError::QueryLengthMismatch {
            holders: 1,
            delegates: 2
        })
    ));
}

#[test]
fn donations_to_a_proxy_break_conservation() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 100);
    let a = delegate(1);
    fx.engine.delegate_multi(&h, &[], &[a], &[amt(10)]).unwrap();

    fx.token
        .transfer(&h, &fx.engine.proxy_address(&a), amt(1))
        .unwrap();

    assert!(matches!(
        fx.engine.verify_conservation(),
        Err(LedgerError::ConservationViolated { .. })
    ));
}

#[test]
fn reconcile_accepts_a_prepared_request() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 100);
    let request = BatchRequest::new(vec![], vec![delegate(1)], vec![amt(5)]);

    let outcome = fx.engine.reconcile(&h, &request).unwrap();

    assert_eq!(outcome.holder, h);
    assert_eq!(outcome.deposited, vec![(delegate(1), amt(5))]);
    assert!(outcome.withdrawn.is_empty());
}

#[test]
fn saved_ledger_restores_into_a_new_instance() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 1000);
    let (a, b) = (delegate(1), delegate(2));
    fx.engine
        .delegate_multi(&h, &[], &[a, b], &[amt(10), amt(20)])
        .unwrap();

    let bytes = fx.engine.save_state().unwrap();
    let restored = MultiDelegate::with_ledger(
        config(),
        Arc::clone(&fx.store),
        Arc::clone(&fx.token),
        DelegationLedger::load_state(&bytes).unwrap(),
    )
    .unwrap();

    assert_eq!(restored.balance_of(&h, &a), amt(10));
    assert_eq!(restored.total_supply(&b), amt(20));
    restored.verify_conservation().unwrap();
    // Proxies survive through the shared account store.
    assert!(restored.proxy(&a).unwrap().is_some());
    restored.delegate_multi(&h, &[b], &[a], &[amt(20)]).unwrap();
    assert_eq!(restored.balance_of(&h, &a), amt(30));
}

#[test]
fn restoring_an_unbacked_ledger_is_rejected() {
    let fx = setup();
    let (h1, h2) = (holder(1), holder(2));
    let a = delegate(1);
    fund(&fx.token, &h1, 100);
    fx.engine.delegate_multi(&h1, &[], &[a], &[amt(100)]).unwrap();

    // A ledger from another deployment, backed by a different token.
    let elsewhere = setup();
    fund(&elsewhere.token, &h2, 60);
    elsewhere.engine.delegate_multi(&h2, &[], &[a], &[amt(60)]).unwrap();
    let foreign = DelegationLedger::load_state(&elsewhere.engine.save_state().unwrap()).unwrap();

    let err = MultiDelegate::with_ledger(
        config(),
        Arc::clone(&fx.store),
        Arc::clone(&fx.token),
        foreign,
    )
    .err()
    .expect("unbacked ledger must be rejected");

    match err {
        LedgerError::ConservationViolated {
            delegate,
            supply,
            proxy_balance,
        } => {
            assert_eq!(delegate, a);
            assert_eq!(supply, amt(60));
            assert_eq!(proxy_balance, amt(100));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.token.balance_of(&h1), Amount::ZERO);
    assert_eq!(fx.engine.get_balance_for_delegate(&a), amt(100));
}

#[test]
fn restoring_under_a_different_salt_is_rejected() {
    let fx = setup();
    let h = holder(0);
    fund(&fx.token, &h, 100);
    fx.engine.delegate_multi(&h, &[], &[delegate(1)], &[amt(40)]).unwrap();
    let bytes = fx.engine.save_state().unwrap();

    let moved = multidelegate_ledger::MultiDelegateConfig {
        salt: multidelegate_types::Salt::new([9; 32]),
        ..config()
    };
    let result = MultiDelegate::with_ledger(
        moved,
        Arc::clone(&fx.store),
        Arc::clone(&fx.token),
        DelegationLedger::load_state(&bytes).unwrap(),
    );

    assert!(matches!(result, Err(LedgerError::ConservationViolated { .. })));
}

#[test]
fn amounts_beyond_u128_are_delegated_exactly() {
    let fx = setup();
    let h = holder(0);
    let big = Amount::from_u256(U256::from(1u8) << 200usize);
    fx.token.mint(&h, big);
    fx.token.approve(&h, &SYSTEM, Amount::MAX).unwrap();
    let (a, b) = (delegate(1), delegate(2));
    let part = Amount::new(u128::MAX).checked_add(amt(1)).unwrap();

    fx.engine.delegate_multi(&h, &[], &[a], &[big]).unwrap();
    fx.engine.delegate_multi(&h, &[a], &[b], &[part]).unwrap();

    assert_eq!(fx.engine.balance_of(&h, &b), part);
    assert_eq!(fx.engine.balance_of(&h, &a).checked_add(part), Some(big));
    assert_eq!(fx.engine.holder_total(&h), big);
    assert_eq!(fx.token.get_votes(b.address()), part);
    assert_eq!(fx.token.balance_of(&h), Amount::ZERO);
    fx.engine.verify_conservation().unwrap();
}
