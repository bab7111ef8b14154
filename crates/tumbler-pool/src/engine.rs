//! the mixing engine
//!
//! owns the registry, the per-pool accumulators and the balance sheet.
//! the canonical execution environment is a replicated ledger applying
//! state transitions in a global total order; off-ledger that contract is
//! reproduced with one mutex around the engine state, each public
//! operation one critical section. a rejected call returns before any
//! protocol-state mutation, so callers observe all-or-nothing semantics.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use tumbler_groth16::{fr_from_hash, fr_from_u128, verify, Fr, Proof, VerifyingKey};
use tumbler_merkle::{Hash, MerklePath};

use crate::batch::{BatchInfo, BatchQueue, PendingTransfer};
use crate::clock::{Clock, SystemClock};
use crate::commitment::{Address, Commitment, NullifierHash, PoolId};
use crate::config::MixerConfig;
use crate::error::{MixerError, Result};
use crate::events::{proof_digest, PoolEvent};
use crate::obfuscation::{ObfuscationStrategy, SeededShuffle};
use crate::pool::{DepositInfo, MixingPool, PoolInfo, PoolParams};
use crate::registry::{DepositRecord, MemoryRegistry, Registry};
use crate::MAX_POOL_DEPTH;

/// one withdrawal tuple: the revealed nullifier, the destination, and the
/// proof binding them to a known root
#[derive(Clone, Debug)]
pub struct WithdrawRequest {
    pub pool_id: PoolId,
    pub root: Hash,
    pub nullifier_hash: NullifierHash,
    pub recipient: Address,
    pub amount: u128,
    pub fee: u128,
    pub proof: Proof,
}

/// optional deposit-side binding proof over (commitment, nullifier hash);
/// verified deposits gain the withdrawn-flag audit trail
#[derive(Clone, Debug)]
pub struct DepositBinding {
    pub nullifier_hash: NullifierHash,
    pub proof: Proof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DepositReceipt {
    pub pool_id: PoolId,
    pub leaf_index: u64,
    pub new_root: Hash,
    /// advisory earliest release time (requested delay plus jitter)
    pub release_at: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WithdrawReceipt {
    pub recipient: Address,
    pub amount: u128,
    pub fee: u128,
    pub net: u128,
}

struct EngineInner {
    config: MixerConfig,
    owner: Address,
    paused: bool,
    withdraw_vk: VerifyingKey,
    deposit_vk: Option<VerifyingKey>,
    registry: Box<dyn Registry>,
    pools: BTreeMap<PoolId, MixingPool>,
    next_pool_id: u64,
    vault: u128,
    balances: BTreeMap<Address, u128>,
    protocol_fees: u128,
    batches: BatchQueue,
    strategy: Box<dyn ObfuscationStrategy>,
    clock: Box<dyn Clock>,
    events: Vec<PoolEvent>,
}

pub struct MixerEngine {
    inner: Mutex<EngineInner>,
}

pub struct MixerBuilder {
    config: MixerConfig,
    owner: Address,
    withdraw_vk: VerifyingKey,
    deposit_vk: Option<VerifyingKey>,
    registry: Box<dyn Registry>,
    strategy: Box<dyn ObfuscationStrategy>,
    clock: Box<dyn Clock>,
}

impl MixerBuilder {
    pub fn config(mut self, config: MixerConfig) -> Self {
        self.config = config;
        self
    }

    /// verification key for deposit binding proofs
    pub fn deposit_vk(mut self, vk: VerifyingKey) -> Self {
        self.deposit_vk = Some(vk);
        self
    }

    pub fn registry(mut self, registry: Box<dyn Registry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn strategy(mut self, strategy: Box<dyn ObfuscationStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> MixerEngine {
        MixerEngine {
            inner: Mutex::new(EngineInner {
                config: self.config,
                owner: self.owner,
                paused: false,
                withdraw_vk: self.withdraw_vk,
                deposit_vk: self.deposit_vk,
                registry: self.registry,
                pools: BTreeMap::new(),
                next_pool_id: 0,
                vault: 0,
                balances: BTreeMap::new(),
                protocol_fees: 0,
                batches: BatchQueue::default(),
                strategy: self.strategy,
                clock: self.clock,
                events: Vec::new(),
            }),
        }
    }
}

impl MixerEngine {
    pub fn builder(owner: Address, withdraw_vk: VerifyingKey) -> MixerBuilder {
        MixerBuilder {
            config: MixerConfig::default(),
            owner,
            withdraw_vk,
            deposit_vk: None,
            registry: Box::new(MemoryRegistry::new()),
            strategy: Box::new(SeededShuffle::from_entropy()),
            clock: Box::new(SystemClock),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// create a mixing pool with a fixed delay window and tree depth
    pub fn create_pool(
        &self,
        min_delay: u64,
        max_delay: u64,
        merkle_depth: usize,
    ) -> Result<PoolId> {
        let mut inner = self.lock();
        if inner.paused {
            return Err(MixerError::Paused);
        }
        if min_delay > max_delay {
            return Err(MixerError::InvalidDelayRange {
                min: min_delay,
                max: max_delay,
            });
        }
        if merkle_depth == 0 || merkle_depth > MAX_POOL_DEPTH {
            return Err(MixerError::InvalidDepth(merkle_depth));
        }

        let id = PoolId(inner.next_pool_id);
        let params = PoolParams {
            min_delay,
            max_delay,
            merkle_depth,
        };
        let pool = MixingPool::new(id, params, inner.config.root_history_size)?;
        let root = pool.tree.root();
        inner.next_pool_id += 1;
        inner.pools.insert(id, pool);
        inner.events.push(PoolEvent::MixingPoolUpdated {
            pool_id: id,
            new_root: root,
        });
        tracing::info!(pool = %id, min_delay, max_delay, merkle_depth, "pool created");
        Ok(id)
    }

    /// lock value under a commitment and append it to the pool's
    /// anonymity set
    pub fn deposit(
        &self,
        commitment: Commitment,
        pool_id: PoolId,
        mixing_delay: u64,
        amount: u128,
        binding: Option<&DepositBinding>,
    ) -> Result<DepositReceipt> {
        let mut inner = self.lock();
        inner.deposit(commitment, pool_id, mixing_delay, amount, binding)
    }

    /// release funds against a proof of membership; one atomic unit:
    /// the nullifier is never consumed without the matching transfer
    pub fn withdraw(&self, req: &WithdrawRequest) -> Result<WithdrawReceipt> {
        let mut inner = self.lock();
        let now = inner.clock.now();
        let net = inner.validate_withdrawal(req, &HashSet::new())?;
        if inner.vault < req.amount {
            return Err(MixerError::InsufficientVault {
                have: inner.vault,
                need: req.amount,
            });
        }
        inner.apply_withdrawal(req, net, now)
    }

    /// apply a sequence of withdrawals transactionally: one invalid tuple
    /// aborts the whole batch with no state change
    pub fn batch_withdraw(&self, requests: &[WithdrawRequest]) -> Result<Vec<WithdrawReceipt>> {
        let mut inner = self.lock();
        if requests.len() > inner.config.max_batch_size {
            return Err(MixerError::BatchSizeExceeded {
                len: requests.len(),
                max: inner.config.max_batch_size,
            });
        }
        let now = inner.clock.now();

        // phase one: every check, no mutation of protocol state
        let mut spent_in_batch = HashSet::new();
        let mut nets = Vec::with_capacity(requests.len());
        let mut total: u128 = 0;
        for req in requests {
            let net = inner.validate_withdrawal(req, &spent_in_batch)?;
            spent_in_batch.insert(req.nullifier_hash);
            total = total
                .checked_add(req.amount)
                .ok_or(MixerError::InvalidAmount(req.amount))?;
            nets.push(net);
        }
        if inner.vault < total {
            return Err(MixerError::InsufficientVault {
                have: inner.vault,
                need: total,
            });
        }

        // phase two: apply; pre-validated, so nothing here can reject
        let mut receipts = Vec::with_capacity(requests.len());
        for (req, net) in requests.iter().zip(nets) {
            receipts.push(inner.apply_withdrawal(req, net, now)?);
        }
        Ok(receipts)
    }

    /// verified withdrawal whose payout joins the open transfer batch
    /// instead of leaving immediately; returns the batch id
    pub fn withdraw_deferred(&self, req: &WithdrawRequest) -> Result<u64> {
        let mut inner = self.lock();
        let now = inner.clock.now();
        let net = inner.validate_withdrawal(req, &HashSet::new())?;
        if inner.vault < req.amount {
            return Err(MixerError::InsufficientVault {
                have: inner.vault,
                need: req.amount,
            });
        }

        inner.registry.mark_spent(req.nullifier_hash)?;
        if let Some(commitment) = inner.registry.linked_commitment(&req.nullifier_hash) {
            inner.registry.mark_withdrawn(&commitment);
        }
        inner.vault -= req.amount;
        inner.protocol_fees += req.fee;
        inner.events.push(PoolEvent::ProofVerified {
            proof_id: proof_digest(&req.proof.to_bytes()),
            success: true,
        });
        let batch_id = inner.batches.push(
            now,
            PendingTransfer {
                nullifier_hash: req.nullifier_hash,
                recipient: req.recipient,
                amount: net,
            },
        );
        tracing::info!(
            batch = batch_id,
            nullifier = %hex::encode(req.nullifier_hash.0),
            net,
            "withdrawal queued into transfer batch"
        );
        Ok(batch_id)
    }

    /// pay out the open batch in a strategy-permuted order once its
    /// minimum hold has elapsed
    pub fn process_batch(&self) -> Result<Vec<(Address, u128)>> {
        let mut inner = self.lock();
        if inner.paused {
            return Err(MixerError::Paused);
        }
        let now = inner.clock.now();
        let hold = inner.config.batch_hold;
        let batch = inner.batches.take_ready(now, hold)?;
        let order = inner.strategy.permutation(batch.transfers.len());

        let mut payouts = Vec::with_capacity(order.len());
        for index in order {
            let transfer = batch.transfers[index];
            *inner.balances.entry(transfer.recipient).or_insert(0) += transfer.amount;
            inner.events.push(PoolEvent::WithdrawalExecuted {
                nullifier_hash: transfer.nullifier_hash,
                recipient: transfer.recipient,
                amount: transfer.amount,
                timestamp: now,
            });
            payouts.push((transfer.recipient, transfer.amount));
        }
        tracing::info!(batch = batch.id, count = payouts.len(), "transfer batch processed");
        Ok(payouts)
    }

    // admin surface

    pub fn pause(&self, caller: Address) -> Result<()> {
        let mut inner = self.lock();
        inner.require_owner(caller)?;
        inner.paused = true;
        tracing::warn!("engine paused");
        Ok(())
    }

    pub fn unpause(&self, caller: Address) -> Result<()> {
        let mut inner = self.lock();
        inner.require_owner(caller)?;
        inner.paused = false;
        tracing::info!("engine unpaused");
        Ok(())
    }

    pub fn set_pool_active(&self, caller: Address, pool_id: PoolId, active: bool) -> Result<()> {
        let mut inner = self.lock();
        inner.require_owner(caller)?;
        let pool = inner
            .pools
            .get_mut(&pool_id)
            .ok_or(MixerError::PoolNotFound(pool_id))?;
        pool.is_active = active;
        tracing::info!(pool = %pool_id, active, "pool activity toggled");
        Ok(())
    }

    /// owner-only escape hatch: drains the vault to `recipient`,
    /// bypassing every withdrawal check. a trust concentration, not a
    /// cryptographic guarantee.
    pub fn emergency_withdraw(&self, caller: Address, recipient: Address) -> Result<u128> {
        let mut inner = self.lock();
        inner.require_owner(caller)?;
        if recipient.is_zero() {
            return Err(MixerError::InvalidRecipient);
        }
        let drained = inner.vault;
        inner.vault = 0;
        *inner.balances.entry(recipient).or_insert(0) += drained;
        tracing::warn!(recipient = %recipient, drained, "emergency withdrawal executed");
        Ok(drained)
    }

    pub fn transfer_ownership(&self, caller: Address, new_owner: Address) -> Result<()> {
        let mut inner = self.lock();
        inner.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(MixerError::InvalidRecipient);
        }
        inner.owner = new_owner;
        tracing::info!(owner = %new_owner, "ownership transferred");
        Ok(())
    }

    // queries

    pub fn pool_info(&self, pool_id: PoolId) -> Result<PoolInfo> {
        let inner = self.lock();
        inner
            .pools
            .get(&pool_id)
            .map(MixingPool::info)
            .ok_or(MixerError::PoolNotFound(pool_id))
    }

    pub fn current_root(&self, pool_id: PoolId) -> Result<Hash> {
        let inner = self.lock();
        inner
            .pools
            .get(&pool_id)
            .map(|p| p.tree.root())
            .ok_or(MixerError::PoolNotFound(pool_id))
    }

    /// membership path for a leaf, for off-system proof generation
    pub fn merkle_path(&self, pool_id: PoolId, leaf_index: u64) -> Result<MerklePath> {
        let inner = self.lock();
        inner
            .pools
            .get(&pool_id)
            .ok_or(MixerError::PoolNotFound(pool_id))?
            .path(leaf_index)
    }

    pub fn deposit_info(&self, commitment: &Commitment) -> Option<DepositInfo> {
        let inner = self.lock();
        inner.registry.deposit(commitment).map(|record| DepositInfo {
            amount: record.amount,
            timestamp: record.timestamp,
            mixing_delay: record.mixing_delay,
            release_at: record.release_at(),
            pool_id: record.pool_id,
            withdrawn: record.withdrawn,
        })
    }

    pub fn is_nullifier_used(&self, nullifier: &NullifierHash) -> bool {
        self.lock().registry.is_spent(nullifier)
    }

    pub fn balance_of(&self, address: &Address) -> u128 {
        self.lock().balances.get(address).copied().unwrap_or(0)
    }

    pub fn vault_balance(&self) -> u128 {
        self.lock().vault
    }

    pub fn protocol_fees(&self) -> u128 {
        self.lock().protocol_fees
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn open_batch(&self) -> Option<BatchInfo> {
        self.lock().batches.info()
    }

    /// drain accumulated events
    pub fn take_events(&self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.lock().events)
    }
}

impl EngineInner {
    fn require_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(MixerError::Unauthorized);
        }
        Ok(())
    }

    fn deposit(
        &mut self,
        commitment: Commitment,
        pool_id: PoolId,
        mixing_delay: u64,
        amount: u128,
        binding: Option<&DepositBinding>,
    ) -> Result<DepositReceipt> {
        if self.paused {
            return Err(MixerError::Paused);
        }
        if commitment.is_zero() {
            return Err(MixerError::InvalidCommitment);
        }
        if amount < self.config.min_deposit || amount > self.config.max_deposit {
            return Err(MixerError::InvalidAmount(amount));
        }

        let params = {
            let pool = self
                .pools
                .get(&pool_id)
                .ok_or(MixerError::PoolNotFound(pool_id))?;
            if !pool.is_active {
                return Err(MixerError::PoolInactive(pool_id));
            }
            if pool.tree.is_full() {
                return Err(MixerError::TreeFull(pool_id));
            }
            pool.params
        };
        if mixing_delay < params.min_delay || mixing_delay > params.max_delay {
            return Err(MixerError::InvalidDelay {
                delay: mixing_delay,
                min: params.min_delay,
                max: params.max_delay,
            });
        }
        if self.registry.deposit(&commitment).is_some() {
            return Err(MixerError::DuplicateCommitment);
        }

        // binding verification is pure; rejection leaves no trace beyond
        // the telemetry record
        let mut binding_digest = None;
        if let Some(binding) = binding {
            let vk = self
                .deposit_vk
                .as_ref()
                .ok_or(MixerError::BindingUnavailable)?;
            let digest = proof_digest(&binding.proof.to_bytes());
            let inputs = [
                fr_from_hash(&commitment.0),
                fr_from_hash(&binding.nullifier_hash.0),
            ];
            match verify(vk, &binding.proof, &inputs) {
                Ok(true) => binding_digest = Some(digest),
                Ok(false) => {
                    self.events.push(PoolEvent::ProofVerified {
                        proof_id: digest,
                        success: false,
                    });
                    tracing::warn!(
                        commitment = %hex::encode(commitment.0),
                        "deposit binding proof rejected"
                    );
                    return Err(MixerError::InvalidProof);
                }
                Err(e) => {
                    self.events.push(PoolEvent::ProofVerified {
                        proof_id: digest,
                        success: false,
                    });
                    return Err(e.into());
                }
            }
        }

        let now = self.clock.now();
        let jitter_bound = ((params.max_delay - params.min_delay) / 8).max(1);
        let release_jitter = self.strategy.release_jitter(jitter_bound);
        let record = DepositRecord {
            amount,
            timestamp: now,
            mixing_delay,
            release_jitter,
            pool_id,
            withdrawn: false,
        };

        // all checks passed; mutations from here on cannot reject
        self.registry.record_deposit(commitment, record)?;
        if let Some(binding) = binding {
            self.registry.link_nullifier(binding.nullifier_hash, commitment);
        }
        let (new_root, leaf_index) = {
            let pool = self
                .pools
                .get_mut(&pool_id)
                .ok_or(MixerError::PoolNotFound(pool_id))?;
            let new_root = pool.insert(commitment.0)?;
            pool.total_amount += amount;
            pool.participant_count += 1;
            (new_root, pool.tree.leaf_count() - 1)
        };
        self.vault += amount;

        if let Some(digest) = binding_digest {
            self.events.push(PoolEvent::ProofVerified {
                proof_id: digest,
                success: true,
            });
        }
        self.events.push(PoolEvent::DepositCreated {
            commitment,
            amount,
            pool_id,
            timestamp: now,
        });
        self.events.push(PoolEvent::MixingPoolUpdated {
            pool_id,
            new_root,
        });
        tracing::info!(
            pool = %pool_id,
            commitment = %hex::encode(commitment.0),
            amount,
            leaf_index,
            "deposit recorded"
        );

        Ok(DepositReceipt {
            pool_id,
            leaf_index,
            new_root,
            release_at: record.release_at(),
        })
    }

    /// every withdrawal check, in rejection order, with no protocol-state
    /// mutation. `spent_in_batch` carries nullifiers consumed earlier in
    /// the same batch so intra-batch replays fail too.
    fn validate_withdrawal(
        &mut self,
        req: &WithdrawRequest,
        spent_in_batch: &HashSet<NullifierHash>,
    ) -> Result<u128> {
        if self.paused {
            return Err(MixerError::Paused);
        }
        if req.recipient.is_zero() {
            return Err(MixerError::InvalidRecipient);
        }
        if req.amount == 0 {
            return Err(MixerError::InvalidAmount(0));
        }
        if req.fee > req.amount {
            return Err(MixerError::FeeExceedsAmount {
                amount: req.amount,
                fee: req.fee,
            });
        }
        {
            let pool = self
                .pools
                .get(&req.pool_id)
                .ok_or(MixerError::PoolNotFound(req.pool_id))?;
            if !pool.is_active {
                return Err(MixerError::PoolInactive(req.pool_id));
            }
            if !pool.is_known_root(&req.root) {
                return Err(MixerError::UnknownRoot);
            }
        }
        // reuse is checked before the pairing so a replay fails the same
        // way whether or not its proof still verifies
        if spent_in_batch.contains(&req.nullifier_hash)
            || self.registry.is_spent(&req.nullifier_hash)
        {
            return Err(MixerError::NullifierReused);
        }

        let inputs = withdrawal_inputs(req);
        match verify(&self.withdraw_vk, &req.proof, &inputs) {
            Ok(true) => Ok(req.amount - req.fee),
            Ok(false) => {
                self.events.push(PoolEvent::ProofVerified {
                    proof_id: proof_digest(&req.proof.to_bytes()),
                    success: false,
                });
                tracing::warn!(
                    nullifier = %hex::encode(req.nullifier_hash.0),
                    "withdrawal proof rejected"
                );
                Err(MixerError::InvalidProof)
            }
            Err(e) => {
                self.events.push(PoolEvent::ProofVerified {
                    proof_id: proof_digest(&req.proof.to_bytes()),
                    success: false,
                });
                Err(e.into())
            }
        }
    }

    /// commit a validated withdrawal: consume the nullifier, move value,
    /// accrue the fee. callers have already checked the vault.
    fn apply_withdrawal(
        &mut self,
        req: &WithdrawRequest,
        net: u128,
        now: u64,
    ) -> Result<WithdrawReceipt> {
        self.registry.mark_spent(req.nullifier_hash)?;
        if let Some(commitment) = self.registry.linked_commitment(&req.nullifier_hash) {
            self.registry.mark_withdrawn(&commitment);
        }
        self.vault -= req.amount;
        *self.balances.entry(req.recipient).or_insert(0) += net;
        self.protocol_fees += req.fee;

        self.events.push(PoolEvent::ProofVerified {
            proof_id: proof_digest(&req.proof.to_bytes()),
            success: true,
        });
        self.events.push(PoolEvent::WithdrawalExecuted {
            nullifier_hash: req.nullifier_hash,
            recipient: req.recipient,
            amount: net,
            timestamp: now,
        });
        tracing::info!(
            nullifier = %hex::encode(req.nullifier_hash.0),
            recipient = %req.recipient,
            net,
            fee = req.fee,
            "withdrawal executed"
        );

        Ok(WithdrawReceipt {
            recipient: req.recipient,
            amount: req.amount,
            fee: req.fee,
            net,
        })
    }
}

/// public inputs binding a proof to one specific withdrawal, in circuit
/// order: root, nullifier hash, recipient, amount, fee
pub fn withdrawal_inputs(req: &WithdrawRequest) -> [Fr; 5] {
    [
        fr_from_hash(&req.root),
        fr_from_hash(&req.nullifier_hash.0),
        fr_from_hash(&req.recipient.0),
        fr_from_u128(req.amount),
        fr_from_u128(req.fee),
    ]
}
