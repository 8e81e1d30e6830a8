//! End-to-end license lifecycle against the in-memory ledger.

use std::sync::Arc;
use std::thread;

use licgate_core::{Address, EntitlementClass, Lamports, LAMPORTS_PER_UNIT};
use licgate_crypto::{Ed25519KeyPair, Signer};
use licgate_ledger::{InMemoryLedger, Ledger, LedgerRead};
use licgate_state::{
    EngineConfig, LicenseAction, LicenseEngine, LicenseError, LicenseState, Publisher,
    RepurchasePolicy,
};
use proptest::prelude::*;

const PRICE: Lamports = Lamports(LAMPORTS_PER_UNIT);

struct Harness {
    engine: LicenseEngine<InMemoryLedger>,
    ledger: InMemoryLedger,
    authority: Ed25519KeyPair,
    class: EntitlementClass,
}

impl Harness {
    fn new(policy: RepurchasePolicy) -> Self {
        let ledger = InMemoryLedger::new();
        let authority = Ed25519KeyPair::generate();
        let class = EntitlementClass::new(Ed25519KeyPair::generate().address());
        ledger.create_class(class, authority.address()).unwrap();
        let engine = LicenseEngine::new(
            ledger.clone(),
            EngineConfig {
                repurchase: policy,
                ..EngineConfig::default()
            },
        );
        Self {
            engine,
            ledger,
            authority,
            class,
        }
    }

    fn initialized(policy: RepurchasePolicy) -> (Self, Address) {
        let h = Self::new(policy);
        let publisher = h
            .engine
            .initialize(&Signer::from_keypair(&h.authority), h.class, PRICE)
            .unwrap();
        (h, publisher)
    }

    fn funded_subscriber(&self, lamports: u64) -> Ed25519KeyPair {
        let kp = Ed25519KeyPair::generate();
        self.ledger.airdrop(&kp.address(), Lamports(lamports)).unwrap();
        kp
    }

    fn buy(&self, publisher: &Address, subscriber: &Ed25519KeyPair) -> Result<u64, LicenseError> {
        let s = Signer::from_keypair(subscriber);
        self.engine
            .purchase_license(publisher, &s, &s)
            .map(|r| r.total_subscribers)
    }

    fn verify(&self, publisher: &Address, subscriber: &Address) -> bool {
        self.engine
            .verify_access(publisher, subscriber, &self.class)
            .unwrap()
    }

    fn total(&self, publisher: &Address) -> u64 {
        self.engine.publisher(publisher).unwrap().total_subscribers
    }
}

// ─── Initialize ─────────────────────────────────────────────────────

#[test]
fn initialize_persists_supplied_values() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let record = h.engine.publisher(&publisher).unwrap();
    assert_eq!(record.authority, h.authority.address());
    assert_eq!(record.entitlement_class, h.class);
    assert_eq!(record.license_price, PRICE);
    assert_eq!(record.total_subscribers, 0);
    assert_eq!(
        publisher,
        h.engine.publisher_address(&h.authority.address()).unwrap()
    );
}

#[test]
fn initialize_hands_mint_authority_to_publisher() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let info = h.ledger.view(|l| l.class_info(&h.class)).unwrap();
    assert_eq!(info.mint_authority, publisher);
}

#[test]
fn reinitialize_fails_and_leaves_record_unchanged() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let before = h.engine.publisher(&publisher).unwrap();
    let err = h
        .engine
        .initialize(&Signer::from_keypair(&h.authority), h.class, Lamports(5))
        .unwrap_err();
    assert!(matches!(err, LicenseError::AlreadyInitialized(a) if a == publisher));
    assert_eq!(h.engine.publisher(&publisher).unwrap(), before);
}

#[test]
fn zero_price_is_rejected() {
    let h = Harness::new(RepurchasePolicy::Reject);
    let err = h
        .engine
        .initialize(&Signer::from_keypair(&h.authority), h.class, Lamports::ZERO)
        .unwrap_err();
    assert!(matches!(err, LicenseError::InvalidPrice));
    assert!(h
        .engine
        .publisher(&h.engine.publisher_address(&h.authority.address()).unwrap())
        .is_err());
}

#[test]
fn unknown_class_is_rejected() {
    let h = Harness::new(RepurchasePolicy::Reject);
    let missing = EntitlementClass::new(Address::new([0xee; 32]));
    let err = h
        .engine
        .initialize(&Signer::from_keypair(&h.authority), missing, PRICE)
        .unwrap_err();
    assert!(matches!(err, LicenseError::EntitlementClassNotFound(c) if c == missing));
}

#[test]
fn foreign_mint_authority_is_rejected() {
    let h = Harness::new(RepurchasePolicy::Reject);
    let other = Ed25519KeyPair::generate();
    let err = h
        .engine
        .initialize(&Signer::from_keypair(&other), h.class, PRICE)
        .unwrap_err();
    assert!(matches!(err, LicenseError::MintAuthorityMismatch { .. }));
    let info = h.ledger.view(|l| l.class_info(&h.class)).unwrap();
    assert_eq!(info.mint_authority, h.authority.address());
}

// ─── Purchase ───────────────────────────────────────────────────────

#[test]
fn purchase_moves_price_mints_one_and_counts() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let s = h.funded_subscriber(3 * LAMPORTS_PER_UNIT);
    let signer = Signer::from_keypair(&s);

    let receipt = h.engine.purchase_license(&publisher, &signer, &signer).unwrap();

    assert_eq!(h.ledger.lamports(&s.address()), Lamports(2 * LAMPORTS_PER_UNIT));
    assert_eq!(h.ledger.lamports(&h.authority.address()), PRICE);
    assert_eq!(h.ledger.entitlement_balance(&s.address(), &h.class).unwrap(), 1);
    assert_eq!(receipt.balance, 1);
    assert_eq!(receipt.total_subscribers, 1);
    assert_eq!(receipt.price_paid, PRICE);
    assert_eq!(h.total(&publisher), 1);
}

#[test]
fn separate_payer_funds_the_purchase() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let subscriber = Ed25519KeyPair::generate();
    let payer = h.funded_subscriber(LAMPORTS_PER_UNIT);

    h.engine
        .purchase_license(
            &publisher,
            &Signer::from_keypair(&subscriber),
            &Signer::from_keypair(&payer),
        )
        .unwrap();

    assert_eq!(h.ledger.lamports(&payer.address()), Lamports::ZERO);
    assert!(h.verify(&publisher, &subscriber.address()));
    assert!(!h.verify(&publisher, &payer.address()));
}

#[test]
fn insufficient_funds_changes_nothing() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let s = h.funded_subscriber(LAMPORTS_PER_UNIT - 1);

    let err = h.buy(&publisher, &s).unwrap_err();

    match err {
        LicenseError::InsufficientFunds { have, need } => {
            assert_eq!(have, Lamports(LAMPORTS_PER_UNIT - 1));
            assert_eq!(need, PRICE);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.ledger.lamports(&s.address()), Lamports(LAMPORTS_PER_UNIT - 1));
    assert_eq!(h.ledger.entitlement_balance(&s.address(), &h.class).unwrap(), 0);
    assert_eq!(h.total(&publisher), 0);
    assert_eq!(h.engine.audit_trail().len(), 1);
}

#[test]
fn purchase_from_unknown_publisher_fails() {
    let (h, _) = Harness::initialized(RepurchasePolicy::Reject);
    let s = h.funded_subscriber(LAMPORTS_PER_UNIT);
    let nowhere = Address::new([0xab; 32]);
    assert!(matches!(
        h.buy(&nowhere, &s),
        Err(LicenseError::PublisherNotFound(a)) if a == nowhere
    ));
}

#[test]
fn repurchase_rejected_by_default() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let s = h.funded_subscriber(2 * LAMPORTS_PER_UNIT);
    h.buy(&publisher, &s).unwrap();

    let err = h.buy(&publisher, &s).unwrap_err();

    assert!(matches!(err, LicenseError::AlreadyLicensed(a) if a == s.address()));
    assert_eq!(h.ledger.lamports(&s.address()), PRICE);
    assert_eq!(h.total(&publisher), 1);
}

#[test]
fn repurchase_accumulates_without_double_counting() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Accumulate);
    let s = h.funded_subscriber(2 * LAMPORTS_PER_UNIT);
    h.buy(&publisher, &s).unwrap();
    assert_eq!(h.buy(&publisher, &s).unwrap(), 1);

    assert_eq!(h.ledger.entitlement_balance(&s.address(), &h.class).unwrap(), 2);
    assert_eq!(h.ledger.lamports(&s.address()), Lamports::ZERO);

    let receipt = h
        .engine
        .revoke_license(
            &publisher,
            &h.class,
            &Signer::from_keypair(&h.authority),
            &s.address(),
        )
        .unwrap();
    assert_eq!(receipt.burned, 2);
    assert_eq!(receipt.total_subscribers, 0);
}

// ─── Verify ─────────────────────────────────────────────────────────

#[test]
fn verify_before_purchase_is_false_and_creates_nothing() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let stranger = Ed25519KeyPair::generate().address();
    assert!(!h.verify(&publisher, &stranger));
    let holding = h.engine.holding_address(&stranger, &h.class).unwrap();
    assert!(h.ledger.view(|l| l.holding(&holding)).is_none());
}

#[test]
fn verify_with_wrong_class_fails() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let other = EntitlementClass::new(Address::new([0x42; 32]));
    let err = h
        .engine
        .verify_access(&publisher, &Address::new([1; 32]), &other)
        .unwrap_err();
    assert!(matches!(
        err,
        LicenseError::EntitlementClassMismatch { expected, actual }
            if expected == h.class && actual == other
    ));
}

#[test]
fn verify_unknown_publisher_fails() {
    let (h, _) = Harness::initialized(RepurchasePolicy::Reject);
    let err = h
        .engine
        .verify_access(&Address::new([7; 32]), &Address::new([1; 32]), &h.class)
        .unwrap_err();
    assert!(matches!(err, LicenseError::PublisherNotFound(_)));
}

// ─── Revoke ─────────────────────────────────────────────────────────

#[test]
fn revoke_by_non_authority_is_unauthorized_and_changes_nothing() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let s = h.funded_subscriber(LAMPORTS_PER_UNIT);
    h.buy(&publisher, &s).unwrap();
    let intruder = Ed25519KeyPair::generate();

    let err = h
        .engine
        .revoke_license(
            &publisher,
            &h.class,
            &Signer::from_keypair(&intruder),
            &s.address(),
        )
        .unwrap_err();

    assert!(matches!(err, LicenseError::Unauthorized(a) if a == intruder.address()));
    assert!(h.verify(&publisher, &s.address()));
    assert_eq!(h.total(&publisher), 1);
}

#[test]
fn revoke_unlicensed_subscriber_fails() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let stranger = Ed25519KeyPair::generate().address();
    let err = h
        .engine
        .revoke_license(
            &publisher,
            &h.class,
            &Signer::from_keypair(&h.authority),
            &stranger,
        )
        .unwrap_err();
    assert!(matches!(err, LicenseError::NotLicensed(a) if a == stranger));
    assert_eq!(h.total(&publisher), 0);
}

#[test]
fn revoke_unknown_publisher_is_not_unauthorized() {
    let (h, _) = Harness::initialized(RepurchasePolicy::Reject);
    let err = h
        .engine
        .revoke_license(
            &Address::new([7; 32]),
            &h.class,
            &Signer::from_keypair(&h.authority),
            &Address::new([1; 32]),
        )
        .unwrap_err();
    assert!(matches!(err, LicenseError::PublisherNotFound(_)));
}

#[test]
fn revoked_subscriber_can_buy_again() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let s = h.funded_subscriber(2 * LAMPORTS_PER_UNIT);
    let authority = Signer::from_keypair(&h.authority);
    h.buy(&publisher, &s).unwrap();
    h.engine
        .revoke_license(&publisher, &h.class, &authority, &s.address())
        .unwrap();

    assert_eq!(h.buy(&publisher, &s).unwrap(), 1);
    assert!(h.verify(&publisher, &s.address()));
}

// ─── Scenario and audit ─────────────────────────────────────────────

#[test]
fn end_to_end_scenario() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let s = h.funded_subscriber(LAMPORTS_PER_UNIT);
    let authority = Signer::from_keypair(&h.authority);

    h.buy(&publisher, &s).unwrap();
    assert!(h.verify(&publisher, &s.address()));
    assert_eq!(h.total(&publisher), 1);

    let receipt = h
        .engine
        .revoke_license(&publisher, &h.class, &authority, &s.address())
        .unwrap();
    assert_eq!(receipt.burned, 1);
    assert!(!h.verify(&publisher, &s.address()));
    assert_eq!(h.total(&publisher), 0);

    let intruder = Signer::from_keypair(&Ed25519KeyPair::generate());
    let err = h
        .engine
        .revoke_license(&publisher, &h.class, &intruder, &s.address())
        .unwrap_err();
    assert!(matches!(err, LicenseError::Unauthorized(_)));
    assert_eq!(h.total(&publisher), 0);
    assert!(!h.verify(&publisher, &s.address()));

    let trail = h.engine.audit_trail();
    let actions: Vec<_> = trail.iter().map(|r| r.transition.action).collect();
    assert_eq!(
        actions,
        vec![LicenseAction::Initialize, LicenseAction::Issue, LicenseAction::Revoke]
    );
    assert_eq!(trail[2].transition.to_state, Some(LicenseState::Unlicensed));
    h.engine.verify_audit_chain().unwrap();
}

#[test]
fn audit_pages_cover_the_trail_in_order() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    for _ in 0..4 {
        h.buy(&publisher, &h.funded_subscriber(LAMPORTS_PER_UNIT)).unwrap();
    }

    let first = h.engine.audit_page(0, 2);
    assert_eq!(first.total, 5);
    assert_eq!(first.records.len(), 2);
    assert!(first.verification.is_ok());

    let rest = h.engine.audit_page(2, 10);
    assert_eq!(
        rest.records.iter().map(|r| r.sequence).collect::<Vec<_>>(),
        vec![2, 3, 4]
    );
    assert_eq!(rest.records[0].prev_digest, Some(first.records[1].digest));
    assert_eq!(rest.head, Some(rest.records[2].digest));
    assert!(rest.verification.is_ok());

    let past_end = h.engine.audit_page(5, 10);
    assert!(past_end.records.is_empty());
    assert_eq!(past_end.total, 5);
}

#[test]
fn concurrent_purchases_lose_no_increment() {
    let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
    let subscribers: Vec<_> = (0..16).map(|_| h.funded_subscriber(LAMPORTS_PER_UNIT)).collect();
    let engine = Arc::new(h.engine);

    let handles: Vec<_> = subscribers
        .into_iter()
        .map(|s| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let signer = Signer::from_keypair(&s);
                engine.purchase_license(&publisher, &signer, &signer).unwrap();
                s.address()
            })
        })
        .collect();
    let holders: Vec<Address> = handles.into_iter().map(|j| j.join().unwrap()).collect();

    assert_eq!(engine.publisher(&publisher).unwrap().total_subscribers, 16);
    for holder in &holders {
        assert!(engine.verify_access(&publisher, holder, &h.class).unwrap());
    }
    assert_eq!(h.ledger.lamports(&h.authority.address()), Lamports(16 * LAMPORTS_PER_UNIT));
    engine.verify_audit_chain().unwrap();
}

#[test]
fn distinct_authorities_get_distinct_publishers() {
    let ledger = InMemoryLedger::new();
    let engine = LicenseEngine::new(ledger.clone(), EngineConfig::default());
    let a = Ed25519KeyPair::generate();
    let b = Ed25519KeyPair::generate();
    let ca = EntitlementClass::new(Address::new([1; 32]));
    let cb = EntitlementClass::new(Address::new([2; 32]));
    ledger.create_class(ca, a.address()).unwrap();
    ledger.create_class(cb, b.address()).unwrap();

    let pa = engine.initialize(&Signer::from_keypair(&a), ca, PRICE).unwrap();
    let pb = engine.initialize(&Signer::from_keypair(&b), cb, PRICE).unwrap();

    assert_ne!(pa, pb);
    assert_eq!(pa, Publisher::address(&engine.config().program_id, &a.address()).unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_positive_price_initializes_once(price in 1u64..=u64::MAX) {
        let h = Harness::new(RepurchasePolicy::Reject);
        let signer = Signer::from_keypair(&h.authority);
        let publisher = h.engine.initialize(&signer, h.class, Lamports(price)).unwrap();
        let record = h.engine.publisher(&publisher).unwrap();
        prop_assert_eq!(record.license_price, Lamports(price));
        prop_assert_eq!(record.total_subscribers, 0);
        let again = h.engine.initialize(&signer, h.class, Lamports(price));
        prop_assert!(matches!(again, Err(LicenseError::AlreadyInitialized(_))));
        prop_assert_eq!(h.engine.publisher(&publisher).unwrap(), record);
    }

    #[test]
    fn counter_tracks_holders(ops in proptest::collection::vec((0usize..4, any::<bool>()), 1..40)) {
        let (h, publisher) = Harness::initialized(RepurchasePolicy::Reject);
        let authority = Signer::from_keypair(&h.authority);
        let subscribers: Vec<_> = (0..4).map(|_| h.funded_subscriber(100 * LAMPORTS_PER_UNIT)).collect();
        let mut held = [false; 4];

        for (i, buy) in ops {
            let s = &subscribers[i];
            if buy {
                let result = h.buy(&publisher, s);
                prop_assert_eq!(result.is_ok(), !held[i]);
                held[i] = true;
            } else {
                let result = h.engine.revoke_license(&publisher, &h.class, &authority, &s.address());
                prop_assert_eq!(result.is_ok(), held[i]);
                held[i] = false;
            }
            let expected = held.iter().filter(|x| **x).count() as u64;
            prop_assert_eq!(h.total(&publisher), expected);
            prop_assert_eq!(h.verify(&publisher, &s.address()), held[i]);
        }
        h.engine.verify_audit_chain().unwrap();
    }
}
