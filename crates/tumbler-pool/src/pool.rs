//! mixing pools
//!
//! a pool fixes its delay window and accumulator depth at creation and
//! then only accumulates: deposits append leaves and grow the totals,
//! withdrawals never shrink them. a short ring buffer of recent roots
//! keeps proofs valid across deposits that land between proof generation
//! and submission.

use serde::{Deserialize, Serialize};

use tumbler_merkle::{Hash, MerkleError, MerklePath, MerkleTree};

use crate::commitment::PoolId;
use crate::error::{MixerError, Result};

/// parameters fixed at pool creation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    pub min_delay: u64,
    pub max_delay: u64,
    pub merkle_depth: usize,
}

/// ring buffer of recently seen roots
#[derive(Clone, Debug)]
pub(crate) struct RootHistory {
    size: usize,
    roots: Vec<Hash>,
    head: usize,
}

impl RootHistory {
    fn new(size: usize, initial: Hash) -> Self {
        let size = size.max(1);
        let mut roots = Vec::with_capacity(size);
        roots.push(initial);
        Self {
            size,
            roots,
            head: 0,
        }
    }

    fn push(&mut self, root: Hash) {
        if self.roots.len() < self.size {
            self.roots.push(root);
            self.head = self.roots.len() - 1;
        } else {
            self.head = (self.head + 1) % self.size;
            self.roots[self.head] = root;
        }
    }

    fn contains(&self, root: &Hash) -> bool {
        self.roots.iter().any(|r| r == root)
    }
}

pub(crate) struct MixingPool {
    pub id: PoolId,
    pub params: PoolParams,
    pub tree: MerkleTree,
    pub total_amount: u128,
    pub participant_count: u64,
    pub is_active: bool,
    recent_roots: RootHistory,
}

impl MixingPool {
    pub fn new(id: PoolId, params: PoolParams, history_size: usize) -> Result<Self> {
        let tree = MerkleTree::new(params.merkle_depth)
            .map_err(|_| MixerError::InvalidDepth(params.merkle_depth))?;
        let recent_roots = RootHistory::new(history_size, tree.root());
        Ok(Self {
            id,
            params,
            tree,
            total_amount: 0,
            participant_count: 0,
            is_active: true,
            recent_roots,
        })
    }

    /// append a commitment leaf; records the fresh root in the history
    pub fn insert(&mut self, leaf: Hash) -> Result<Hash> {
        let root = self
            .tree
            .insert(leaf)
            .map_err(|e| self.lift_merkle_error(e))?;
        self.recent_roots.push(root);
        Ok(root)
    }

    fn lift_merkle_error(&self, e: MerkleError) -> MixerError {
        match e {
            MerkleError::TreeFull(_) => MixerError::TreeFull(self.id),
            MerkleError::InvalidDepth(d) => MixerError::InvalidDepth(d),
            MerkleError::UnknownLeaf(i) => MixerError::UnknownLeaf(i),
        }
    }

    /// the current root, or any root still in the ring buffer
    pub fn is_known_root(&self, root: &Hash) -> bool {
        *root == self.tree.root() || self.recent_roots.contains(root)
    }

    pub fn path(&self, leaf_index: u64) -> Result<MerklePath> {
        self.tree
            .path(leaf_index)
            .map_err(|e| self.lift_merkle_error(e))
    }

    pub fn info(&self) -> PoolInfo {
        PoolInfo {
            pool_id: self.id,
            is_active: self.is_active,
            total_amount: self.total_amount,
            participant_count: self.participant_count,
            min_delay: self.params.min_delay,
            max_delay: self.params.max_delay,
            merkle_depth: self.params.merkle_depth,
            root: self.tree.root(),
            leaf_count: self.tree.leaf_count(),
        }
    }
}

/// snapshot returned by pool queries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PoolInfo {
    pub pool_id: PoolId,
    pub is_active: bool,
    pub total_amount: u128,
    pub participant_count: u64,
    pub min_delay: u64,
    pub max_delay: u64,
    pub merkle_depth: usize,
    pub root: Hash,
    pub leaf_count: u64,
}

/// snapshot returned by deposit queries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DepositInfo {
    pub amount: u128,
    pub timestamp: u64,
    pub mixing_delay: u64,
    pub release_at: u64,
    pub pool_id: PoolId,
    pub withdrawn: bool,
}
