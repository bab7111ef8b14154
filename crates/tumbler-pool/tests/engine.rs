//! engine integration tests with real groth16 fixtures
//!
//! the fixture circuit exposes n public inputs and pins each one with a
//! v * 1 = v constraint, so a proof binds exactly the input vector it was
//! generated for: tampering with any public value breaks verification.

use std::sync::Arc;

use ark_groth16::{Groth16, ProvingKey};
use ark_relations::lc;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystemRef, SynthesisError, Variable,
};

use tumbler_groth16::{fr_from_hash, fr_from_u128, Bn254, Fr, Proof, VerifyingKey};
use tumbler_pool::config::UNIT;
use tumbler_pool::{
    Address, Commitment, DepositBinding, ManualClock, MixerConfig, MixerEngine, MixerError,
    NullifierHash, PoolEvent, PoolId, SeededShuffle, WithdrawRequest,
};

const OWNER: Address = Address([0xAA; 32]);
const START: u64 = 1_700_000_000;

#[derive(Clone)]
struct BindCircuit {
    inputs: Vec<Option<Fr>>,
}

impl ConstraintSynthesizer<Fr> for BindCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        for value in self.inputs {
            let v = cs.new_input_variable(|| value.ok_or(SynthesisError::AssignmentMissing))?;
            cs.enforce_constraint(lc!() + v, lc!() + Variable::One, lc!() + v)?;
        }
        Ok(())
    }
}

fn setup_pk(arity: usize) -> ProvingKey<Bn254> {
    let mut rng = ark_std::test_rng();
    let blank = BindCircuit {
        inputs: vec![None; arity],
    };
    Groth16::<Bn254>::generate_random_parameters_with_reduction(blank, &mut rng).expect("setup")
}

fn to_vk(pk: &ProvingKey<Bn254>) -> VerifyingKey {
    VerifyingKey::new(
        pk.vk.alpha_g1,
        pk.vk.beta_g2,
        pk.vk.gamma_g2,
        pk.vk.delta_g2,
        pk.vk.gamma_abc_g1.clone(),
    )
    .expect("verifying key")
}

fn prove(pk: &ProvingKey<Bn254>, inputs: &[Fr]) -> Proof {
    let mut rng = ark_std::test_rng();
    let circuit = BindCircuit {
        inputs: inputs.iter().copied().map(Some).collect(),
    };
    let proof =
        Groth16::<Bn254>::create_random_proof_with_reduction(circuit, pk, &mut rng).expect("prove");
    Proof::new(proof.a, proof.b, proof.c).expect("proof points")
}

struct Harness {
    engine: MixerEngine,
    withdraw_pk: ProvingKey<Bn254>,
    deposit_pk: ProvingKey<Bn254>,
    clock: Arc<ManualClock>,
}

fn harness_with(config: MixerConfig, with_deposit_vk: bool) -> Harness {
    let withdraw_pk = setup_pk(5);
    let deposit_pk = setup_pk(2);
    let clock = Arc::new(ManualClock::new(START));
    let mut builder = MixerEngine::builder(OWNER, to_vk(&withdraw_pk))
        .config(config)
        .strategy(Box::new(SeededShuffle::from_seed([9u8; 32])))
        .clock(Box::new(clock.clone()));
    if with_deposit_vk {
        builder = builder.deposit_vk(to_vk(&deposit_pk));
    }
    Harness {
        engine: builder.build(),
        withdraw_pk,
        deposit_pk,
        clock,
    }
}

fn harness() -> Harness {
    harness_with(MixerConfig::default(), false)
}

fn secret(byte: u8) -> ([u8; 32], [u8; 32]) {
    ([byte; 32], [byte.wrapping_add(100); 32])
}

fn withdrawal(
    harness: &Harness,
    pool_id: PoolId,
    root: [u8; 32],
    nullifier_hash: NullifierHash,
    recipient: Address,
    amount: u128,
    fee: u128,
) -> WithdrawRequest {
    let inputs = [
        fr_from_hash(&root),
        fr_from_hash(&nullifier_hash.0),
        fr_from_hash(&recipient.0),
        fr_from_u128(amount),
        fr_from_u128(fee),
    ];
    WithdrawRequest {
        pool_id,
        root,
        nullifier_hash,
        recipient,
        amount,
        fee,
        proof: prove(&harness.withdraw_pk, &inputs),
    }
}

#[test]
fn test_create_pool_bounds() {
    let h = harness();
    assert_eq!(
        h.engine.create_pool(100, 50, 20),
        Err(MixerError::InvalidDelayRange { min: 100, max: 50 })
    );
    assert_eq!(
        h.engine.create_pool(3_600, 604_800, 33),
        Err(MixerError::InvalidDepth(33))
    );
    assert_eq!(h.engine.create_pool(3_600, 604_800, 32), Ok(PoolId(0)));
    assert_eq!(h.engine.create_pool(0, 10, 4), Ok(PoolId(1)));
}

#[test]
fn test_deposit_bounds() {
    let h = harness();
    let pool = h.engine.create_pool(3_600, 604_800, 16).unwrap();
    let c = Commitment([1u8; 32]);

    // 0.005 below the 0.01 minimum
    assert_eq!(
        h.engine.deposit(c, pool, 7_200, UNIT / 200, None),
        Err(MixerError::InvalidAmount(UNIT / 200))
    );
    assert_eq!(
        h.engine.deposit(c, pool, 7_200, 2_000 * UNIT, None),
        Err(MixerError::InvalidAmount(2_000 * UNIT))
    );
    assert_eq!(
        h.engine.deposit(c, pool, 60, UNIT, None),
        Err(MixerError::InvalidDelay {
            delay: 60,
            min: 3_600,
            max: 604_800
        })
    );
    assert_eq!(
        h.engine
            .deposit(Commitment([0u8; 32]), pool, 7_200, UNIT, None),
        Err(MixerError::InvalidCommitment)
    );
    assert_eq!(
        h.engine
            .deposit(c, PoolId(99), 7_200, UNIT, None),
        Err(MixerError::PoolNotFound(PoolId(99)))
    );

    h.engine.deposit(c, pool, 7_200, UNIT, None).unwrap();
    assert_eq!(
        h.engine.deposit(c, pool, 7_200, UNIT, None),
        Err(MixerError::DuplicateCommitment)
    );
}

#[test]
fn test_end_to_end_mixing_cycle() {
    let h = harness();
    let pool = h.engine.create_pool(3_600, 604_800, 32).unwrap();

    let (s, seed) = secret(1);
    let commitment = Commitment::derive(&s, UNIT, &seed);
    let nullifier = NullifierHash::derive(&s, &seed);

    let receipt = h.engine.deposit(commitment, pool, 7_200, UNIT, None).unwrap();
    assert_eq!(receipt.leaf_index, 0);
    assert!(receipt.release_at >= START + 7_200);

    let info = h.engine.pool_info(pool).unwrap();
    assert_eq!(info.total_amount, UNIT);
    assert_eq!(info.participant_count, 1);
    assert_eq!(info.root, receipt.new_root);

    let events = h.engine.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        PoolEvent::DepositCreated { commitment: c, amount, .. }
            if *c == commitment && *amount == UNIT
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        PoolEvent::MixingPoolUpdated { new_root, .. } if *new_root == receipt.new_root
    )));

    // the proof binds (root, nullifier, recipient, amount, fee)
    let recipient = Address([0xBB; 32]);
    let fee = UNIT / 100;
    let root = h.engine.current_root(pool).unwrap();
    let req = withdrawal(&h, pool, root, nullifier, recipient, UNIT, fee);

    let receipt = h.engine.withdraw(&req).unwrap();
    assert_eq!(receipt.net, UNIT - fee);
    assert_eq!(h.engine.balance_of(&recipient), UNIT - fee);
    assert_eq!(h.engine.protocol_fees(), fee);
    assert_eq!(h.engine.vault_balance(), 0);
    assert!(h.engine.is_nullifier_used(&nullifier));

    let events = h.engine.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        PoolEvent::WithdrawalExecuted { nullifier_hash, .. } if *nullifier_hash == nullifier
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, PoolEvent::ProofVerified { success: true, .. })));

    // identical resubmission fails on reuse, not on the proof
    assert_eq!(h.engine.withdraw(&req), Err(MixerError::NullifierReused));
    assert_eq!(h.engine.balance_of(&recipient), UNIT - fee);
}

#[test]
fn test_withdraw_validation_order() {
    let h = harness();
    let pool = h.engine.create_pool(0, 604_800, 8).unwrap();
    let (s, seed) = secret(2);
    let commitment = Commitment::derive(&s, UNIT, &seed);
    let nullifier = NullifierHash::derive(&s, &seed);
    h.engine.deposit(commitment, pool, 100, UNIT, None).unwrap();
    let root = h.engine.current_root(pool).unwrap();

    let good = withdrawal(&h, pool, root, nullifier, Address([0xBB; 32]), UNIT, 0);

    let mut bad = good.clone();
    bad.recipient = Address::ZERO;
    assert_eq!(h.engine.withdraw(&bad), Err(MixerError::InvalidRecipient));

    let mut bad = good.clone();
    bad.amount = 0;
    assert_eq!(h.engine.withdraw(&bad), Err(MixerError::InvalidAmount(0)));

    let mut bad = good.clone();
    bad.fee = bad.amount + 1;
    assert_eq!(
        h.engine.withdraw(&bad),
        Err(MixerError::FeeExceedsAmount {
            amount: UNIT,
            fee: UNIT + 1
        })
    );

    let mut bad = good.clone();
    bad.root = [0x99; 32];
    assert_eq!(h.engine.withdraw(&bad), Err(MixerError::UnknownRoot));

    // proof was generated for a different recipient
    let mut bad = good.clone();
    bad.recipient = Address([0xCC; 32]);
    assert_eq!(h.engine.withdraw(&bad), Err(MixerError::InvalidProof));

    // nothing above touched state
    assert!(!h.engine.is_nullifier_used(&nullifier));
    assert_eq!(h.engine.vault_balance(), UNIT);

    h.engine.withdraw(&good).unwrap();
}

#[test]
fn test_stale_root_in_history_accepted() {
    let h = harness();
    let pool = h.engine.create_pool(0, 10_000, 8).unwrap();

    let (s, seed) = secret(3);
    let commitment = Commitment::derive(&s, UNIT, &seed);
    let nullifier = NullifierHash::derive(&s, &seed);
    h.engine.deposit(commitment, pool, 50, UNIT, None).unwrap();
    let stale_root = h.engine.current_root(pool).unwrap();

    // another deposit moves the current root
    h.engine
        .deposit(Commitment([7u8; 32]), pool, 50, UNIT, None)
        .unwrap();
    assert_ne!(h.engine.current_root(pool).unwrap(), stale_root);

    let req = withdrawal(&h, pool, stale_root, nullifier, Address([0xBB; 32]), UNIT, 0);
    assert!(h.engine.withdraw(&req).is_ok());
}

#[test]
fn test_batch_withdraw_is_atomic() {
    let h = harness();
    let pool = h.engine.create_pool(0, 10_000, 8).unwrap();

    let mut nullifiers = Vec::new();
    for i in 0..2u8 {
        let (s, seed) = secret(10 + i);
        let commitment = Commitment::derive(&s, UNIT, &seed);
        nullifiers.push(NullifierHash::derive(&s, &seed));
        h.engine.deposit(commitment, pool, 50, UNIT, None).unwrap();
    }
    let root = h.engine.current_root(pool).unwrap();
    let alice = Address([0x01; 32]);
    let bob = Address([0x02; 32]);

    let good = withdrawal(&h, pool, root, nullifiers[0], alice, UNIT, 0);
    // second tuple replays the first nullifier: integrity failure
    let replay = withdrawal(&h, pool, root, nullifiers[0], bob, UNIT, 0);

    let before_vault = h.engine.vault_balance();
    let before_info = h.engine.pool_info(pool).unwrap();
    h.engine.take_events();

    assert_eq!(
        h.engine.batch_withdraw(&[good.clone(), replay]),
        Err(MixerError::NullifierReused)
    );

    // no partial credit: registry and balances byte-identical
    assert_eq!(h.engine.balance_of(&alice), 0);
    assert_eq!(h.engine.balance_of(&bob), 0);
    assert!(!h.engine.is_nullifier_used(&nullifiers[0]));
    assert!(!h.engine.is_nullifier_used(&nullifiers[1]));
    assert_eq!(h.engine.vault_balance(), before_vault);
    assert_eq!(h.engine.pool_info(pool).unwrap(), before_info);

    // the same first tuple still works in a clean batch
    let good2 = withdrawal(&h, pool, root, nullifiers[1], bob, UNIT, UNIT / 100);
    let receipts = h.engine.batch_withdraw(&[good, good2]).unwrap();
    assert_eq!(receipts.len(), 2);
    assert_eq!(h.engine.balance_of(&alice), UNIT);
    assert_eq!(h.engine.balance_of(&bob), UNIT - UNIT / 100);
    assert!(h.engine.is_nullifier_used(&nullifiers[0]));
    assert!(h.engine.is_nullifier_used(&nullifiers[1]));
}

#[test]
fn test_batch_size_limit() {
    let h = harness_with(
        MixerConfig {
            max_batch_size: 2,
            ..MixerConfig::default()
        },
        false,
    );
    let pool = h.engine.create_pool(0, 100, 4).unwrap();
    let root = h.engine.current_root(pool).unwrap();
    let req = withdrawal(
        &h,
        pool,
        root,
        NullifierHash([1u8; 32]),
        Address([0xBB; 32]),
        UNIT,
        0,
    );
    assert_eq!(
        h.engine
            .batch_withdraw(&[req.clone(), req.clone(), req]),
        Err(MixerError::BatchSizeExceeded { len: 3, max: 2 })
    );
    assert_eq!(h.engine.batch_withdraw(&[]), Ok(Vec::new()));
}

#[test]
fn test_pause_gates_mutating_entry_points() {
    let h = harness();
    let pool = h.engine.create_pool(0, 100, 4).unwrap();

    assert_eq!(h.engine.pause(Address([1u8; 32])), Err(MixerError::Unauthorized));
    h.engine.pause(OWNER).unwrap();
    assert!(h.engine.is_paused());

    assert_eq!(h.engine.create_pool(0, 10, 4), Err(MixerError::Paused));
    assert_eq!(
        h.engine.deposit(Commitment([1u8; 32]), pool, 10, UNIT, None),
        Err(MixerError::Paused)
    );
    let root = h.engine.current_root(pool).unwrap();
    let req = withdrawal(
        &h,
        pool,
        root,
        NullifierHash([2u8; 32]),
        Address([0xBB; 32]),
        UNIT,
        0,
    );
    assert_eq!(h.engine.withdraw(&req), Err(MixerError::Paused));
    assert_eq!(h.engine.process_batch(), Err(MixerError::Paused));

    h.engine.unpause(OWNER).unwrap();
    h.engine
        .deposit(Commitment([1u8; 32]), pool, 10, UNIT, None)
        .unwrap();
}

#[test]
fn test_inactive_pool_rejects_deposits_and_withdrawals() {
    let h = harness();
    let pool = h.engine.create_pool(0, 100, 4).unwrap();
    h.engine
        .deposit(Commitment([1u8; 32]), pool, 10, UNIT, None)
        .unwrap();
    let root = h.engine.current_root(pool).unwrap();

    assert_eq!(
        h.engine.set_pool_active(Address([1u8; 32]), pool, false),
        Err(MixerError::Unauthorized)
    );
    h.engine.set_pool_active(OWNER, pool, false).unwrap();

    assert_eq!(
        h.engine.deposit(Commitment([2u8; 32]), pool, 10, UNIT, None),
        Err(MixerError::PoolInactive(pool))
    );
    let req = withdrawal(
        &h,
        pool,
        root,
        NullifierHash([3u8; 32]),
        Address([0xBB; 32]),
        UNIT,
        0,
    );
    assert_eq!(h.engine.withdraw(&req), Err(MixerError::PoolInactive(pool)));

    h.engine.set_pool_active(OWNER, pool, true).unwrap();
    h.engine
        .deposit(Commitment([2u8; 32]), pool, 10, UNIT, None)
        .unwrap();
}

#[test]
fn test_emergency_withdraw_is_owner_gated() {
    let h = harness();
    let pool = h.engine.create_pool(0, 100, 4).unwrap();
    h.engine
        .deposit(Commitment([1u8; 32]), pool, 10, UNIT, None)
        .unwrap();

    let treasury = Address([0xEE; 32]);
    assert_eq!(
        h.engine.emergency_withdraw(Address([1u8; 32]), treasury),
        Err(MixerError::Unauthorized)
    );
    assert_eq!(h.engine.emergency_withdraw(OWNER, treasury), Ok(UNIT));
    assert_eq!(h.engine.vault_balance(), 0);
    assert_eq!(h.engine.balance_of(&treasury), UNIT);
    assert_eq!(h.engine.emergency_withdraw(OWNER, treasury), Ok(0));
}

#[test]
fn test_ownership_transfer() {
    let h = harness();
    let new_owner = Address([0xCD; 32]);
    assert_eq!(
        h.engine.transfer_ownership(new_owner, new_owner),
        Err(MixerError::Unauthorized)
    );
    h.engine.transfer_ownership(OWNER, new_owner).unwrap();
    assert_eq!(h.engine.pause(OWNER), Err(MixerError::Unauthorized));
    h.engine.pause(new_owner).unwrap();
}

#[test]
fn test_deferred_batch_permutes_and_holds() {
    let h = harness_with(
        MixerConfig {
            batch_hold: 600,
            ..MixerConfig::default()
        },
        false,
    );
    let pool = h.engine.create_pool(0, 10_000, 8).unwrap();

    let mut recipients = Vec::new();
    let mut batch_id = 0;
    for i in 0..3u8 {
        let (s, seed) = secret(30 + i);
        let commitment = Commitment::derive(&s, UNIT, &seed);
        let nullifier = NullifierHash::derive(&s, &seed);
        h.engine.deposit(commitment, pool, 50, UNIT, None).unwrap();
        let root = h.engine.current_root(pool).unwrap();
        let recipient = Address([0xB0 + i; 32]);
        recipients.push(recipient);
        let req = withdrawal(&h, pool, root, nullifier, recipient, UNIT, 0);
        batch_id = h.engine.withdraw_deferred(&req).unwrap();
        assert!(h.engine.is_nullifier_used(&nullifier));
    }

    let info = h.engine.open_batch().unwrap();
    assert_eq!(info.id, batch_id);
    assert_eq!(info.pending, 3);
    assert_eq!(info.escrow, 3 * UNIT);
    // escrowed value already left the vault, nothing paid out yet
    assert_eq!(h.engine.vault_balance(), 0);
    for r in &recipients {
        assert_eq!(h.engine.balance_of(r), 0);
    }

    // the hold has not elapsed
    assert_eq!(
        h.engine.process_batch(),
        Err(MixerError::BatchNotReady {
            ready_at: START + 600
        })
    );

    h.clock.advance(600);
    let payouts = h.engine.process_batch().unwrap();
    assert_eq!(payouts.len(), 3);
    for r in &recipients {
        assert_eq!(h.engine.balance_of(r), UNIT);
    }
    assert_eq!(h.engine.open_batch(), None);
    assert_eq!(h.engine.process_batch(), Err(MixerError::NoOpenBatch));

    // seeded strategy: same seed, same permutation of the same transfers
    let h2 = harness_with(
        MixerConfig {
            batch_hold: 600,
            ..MixerConfig::default()
        },
        false,
    );
    let pool2 = h2.engine.create_pool(0, 10_000, 8).unwrap();
    for i in 0..3u8 {
        let (s, seed) = secret(30 + i);
        let commitment = Commitment::derive(&s, UNIT, &seed);
        let nullifier = NullifierHash::derive(&s, &seed);
        h2.engine.deposit(commitment, pool2, 50, UNIT, None).unwrap();
        let root = h2.engine.current_root(pool2).unwrap();
        let req = withdrawal(&h2, pool2, root, nullifier, Address([0xB0 + i; 32]), UNIT, 0);
        h2.engine.withdraw_deferred(&req).unwrap();
    }
    h2.clock.advance(600);
    let payouts2 = h2.engine.process_batch().unwrap();
    assert_eq!(payouts, payouts2);
}

#[test]
fn test_deposit_binding_drives_audit_flag() {
    let h = harness_with(MixerConfig::default(), true);
    let pool = h.engine.create_pool(0, 10_000, 8).unwrap();

    let (s, seed) = secret(40);
    let commitment = Commitment::derive(&s, UNIT, &seed);
    let nullifier = NullifierHash::derive(&s, &seed);

    let binding = DepositBinding {
        nullifier_hash: nullifier,
        proof: prove(
            &h.deposit_pk,
            &[fr_from_hash(&commitment.0), fr_from_hash(&nullifier.0)],
        ),
    };
    h.engine
        .deposit(commitment, pool, 50, UNIT, Some(&binding))
        .unwrap();
    assert!(!h.engine.deposit_info(&commitment).unwrap().withdrawn);

    let root = h.engine.current_root(pool).unwrap();
    let req = withdrawal(&h, pool, root, nullifier, Address([0xBB; 32]), UNIT, 0);
    h.engine.withdraw(&req).unwrap();

    let info = h.engine.deposit_info(&commitment).unwrap();
    assert!(info.withdrawn);
}

#[test]
fn test_unlinked_deposit_keeps_flag_false() {
    let h = harness();
    let pool = h.engine.create_pool(0, 10_000, 8).unwrap();

    let (s, seed) = secret(41);
    let commitment = Commitment::derive(&s, UNIT, &seed);
    let nullifier = NullifierHash::derive(&s, &seed);
    h.engine.deposit(commitment, pool, 50, UNIT, None).unwrap();

    let root = h.engine.current_root(pool).unwrap();
    let req = withdrawal(&h, pool, root, nullifier, Address([0xBB; 32]), UNIT, 0);
    h.engine.withdraw(&req).unwrap();

    // anonymous path: the registry cannot tie the spend to the record
    assert!(!h.engine.deposit_info(&commitment).unwrap().withdrawn);
    assert!(h.engine.is_nullifier_used(&nullifier));
}

#[test]
fn test_binding_without_key_rejected() {
    let h = harness(); // no deposit vk configured
    let pool = h.engine.create_pool(0, 10_000, 8).unwrap();
    let (s, seed) = secret(42);
    let commitment = Commitment::derive(&s, UNIT, &seed);
    let binding = DepositBinding {
        nullifier_hash: NullifierHash::derive(&s, &seed),
        proof: prove(&h.deposit_pk, &[Fr::from(1u64), Fr::from(2u64)]),
    };
    assert_eq!(
        h.engine.deposit(commitment, pool, 50, UNIT, Some(&binding)),
        Err(MixerError::BindingUnavailable)
    );
}

#[test]
fn test_tampered_binding_rejected_without_state_change() {
    let h = harness_with(MixerConfig::default(), true);
    let pool = h.engine.create_pool(0, 10_000, 8).unwrap();
    let (s, seed) = secret(43);
    let commitment = Commitment::derive(&s, UNIT, &seed);
    let nullifier = NullifierHash::derive(&s, &seed);

    // proof generated for a different commitment
    let binding = DepositBinding {
        nullifier_hash: nullifier,
        proof: prove(
            &h.deposit_pk,
            &[fr_from_hash(&[0xFF; 32]), fr_from_hash(&nullifier.0)],
        ),
    };
    assert_eq!(
        h.engine.deposit(commitment, pool, 50, UNIT, Some(&binding)),
        Err(MixerError::InvalidProof)
    );
    assert_eq!(h.engine.deposit_info(&commitment), None);
    assert_eq!(h.engine.vault_balance(), 0);
    assert!(h
        .engine
        .take_events()
        .iter()
        .any(|e| matches!(e, PoolEvent::ProofVerified { success: false, .. })));
}

#[test]
fn test_release_jitter_stays_in_window() {
    let h = harness();
    let pool = h.engine.create_pool(3_600, 604_800, 8).unwrap();
    let bound = (604_800 - 3_600) / 8;

    for i in 0..8u8 {
        let commitment = Commitment([i + 1; 32]);
        let receipt = h.engine.deposit(commitment, pool, 7_200, UNIT, None).unwrap();
        let info = h.engine.deposit_info(&commitment).unwrap();
        assert_eq!(receipt.release_at, info.release_at);
        assert!(info.release_at >= START + 7_200);
        assert!(info.release_at <= START + 7_200 + bound);
    }
}

#[test]
fn test_membership_paths_track_the_root() {
    let h = harness();
    let pool = h.engine.create_pool(0, 100, 8).unwrap();

    let commitments: Vec<Commitment> = (1..=3u8).map(|i| Commitment([i; 32])).collect();
    for c in &commitments {
        h.engine.deposit(*c, pool, 10, UNIT, None).unwrap();
    }
    let root = h.engine.current_root(pool).unwrap();

    for (i, c) in commitments.iter().enumerate() {
        let path = h.engine.merkle_path(pool, i as u64).unwrap();
        assert!(tumbler_merkle::verify(&c.0, &root, &path.elements, &path.indices));
    }
    assert_eq!(
        h.engine.merkle_path(pool, 3),
        Err(MixerError::UnknownLeaf(3))
    );
}

#[test]
fn test_vault_conservation() {
    let h = harness();
    let pool = h.engine.create_pool(0, 10_000, 8).unwrap();

    let mut nullifiers = Vec::new();
    for i in 0..4u8 {
        let (s, seed) = secret(50 + i);
        let commitment = Commitment::derive(&s, UNIT, &seed);
        nullifiers.push(NullifierHash::derive(&s, &seed));
        h.engine.deposit(commitment, pool, 50, UNIT, None).unwrap();
    }
    assert_eq!(h.engine.vault_balance(), 4 * UNIT);

    let root = h.engine.current_root(pool).unwrap();
    let fee = UNIT / 50;
    let recipient = Address([0xBB; 32]);
    for n in nullifiers.iter().take(2) {
        let req = withdrawal(&h, pool, root, *n, recipient, UNIT, fee);
        h.engine.withdraw(&req).unwrap();
    }

    // vault + payouts + fees == total deposited
    assert_eq!(h.engine.vault_balance(), 2 * UNIT);
    assert_eq!(h.engine.balance_of(&recipient), 2 * (UNIT - fee));
    assert_eq!(h.engine.protocol_fees(), 2 * fee);
    assert_eq!(
        h.engine.vault_balance() + h.engine.balance_of(&recipient) + h.engine.protocol_fees(),
        4 * UNIT
    );
}
