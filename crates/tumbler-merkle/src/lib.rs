//! append-only merkle accumulator
//!
//! fixed-depth binary hash tree over deposit commitments. inserting a leaf
//! anonymizes it into the shared set; a path against a known root proves
//! membership without revealing which leaf.
//!
//! insertion is incremental: only the rightmost filled subtree hash per
//! level is kept, so an insert rehashes one path instead of the whole tree.
//! leaves are retained as well so the accumulator can hand out membership
//! paths to clients.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// domain separator for interior node hashing
///
/// keeps the node hash family disjoint from the commitment/nullifier
/// hash family so a leaf can never collide with an interior node
pub const NODE_DOMAIN: &[u8] = b"tumbler.merkle.node.v1";

/// deepest supported tree (2^32 leaves)
pub const MAX_DEPTH: usize = 32;

pub type Hash = [u8; 32];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerkleError {
    #[error("tree depth {0} outside supported range 1..={MAX_DEPTH}")]
    InvalidDepth(usize),

    #[error("tree is full: capacity {0} leaves")]
    TreeFull(u64),

    #[error("leaf index {0} has not been inserted")]
    UnknownLeaf(u64),
}

/// hash two child nodes into their parent
pub fn hash_node(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(left);
    hasher.update(right);
    *hasher.finalize().as_bytes()
}

/// zero-subtree hashes for each level
///
/// zeros[0] is the empty leaf, zeros[i] = hash(zeros[i-1], zeros[i-1]),
/// zeros[depth] is the root of an empty tree
pub fn zero_hashes(depth: usize) -> Vec<Hash> {
    let mut zeros = Vec::with_capacity(depth + 1);
    zeros.push([0u8; 32]);
    for level in 1..=depth {
        let below = zeros[level - 1];
        zeros.push(hash_node(&below, &below));
    }
    zeros
}

/// membership path from a leaf to the root
///
/// `indices[i]` is the position bit at level i: 0 when the running node is
/// the left child, 1 when it is the right child
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    pub elements: Vec<Hash>,
    pub indices: Vec<u8>,
}

/// recompute a candidate root by folding `leaf` with each sibling and
/// compare it to `root`
///
/// pure and re-entrant: many withdrawals may verify against the same
/// historical root concurrently. returns false on any length mismatch,
/// non-binary index, or final hash mismatch.
pub fn verify(leaf: &Hash, root: &Hash, path_elements: &[Hash], path_indices: &[u8]) -> bool {
    if path_elements.len() != path_indices.len() {
        return false;
    }
    let mut current = *leaf;
    for (sibling, &bit) in path_elements.iter().zip(path_indices) {
        current = match bit {
            0 => hash_node(&current, sibling),
            1 => hash_node(sibling, &current),
            _ => return false,
        };
    }
    current == *root
}

/// fixed-depth append-only accumulator
///
/// the root changes only by appending a new leaf; no deletion, no
/// reordering
#[derive(Clone, Debug)]
pub struct MerkleTree {
    depth: usize,
    next_index: u64,
    root: Hash,
    filled_subtrees: Vec<Hash>,
    zeros: Vec<Hash>,
    leaves: Vec<Hash>,
}

impl MerkleTree {
    pub fn new(depth: usize) -> Result<Self, MerkleError> {
        if depth == 0 || depth > MAX_DEPTH {
            return Err(MerkleError::InvalidDepth(depth));
        }
        let zeros = zero_hashes(depth);
        Ok(Self {
            depth,
            next_index: 0,
            root: zeros[depth],
            filled_subtrees: zeros[..depth].to_vec(),
            zeros,
            leaves: Vec::new(),
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    pub fn leaf_count(&self) -> u64 {
        self.next_index
    }

    pub fn is_full(&self) -> bool {
        self.next_index >= self.capacity()
    }

    /// current root (root of the empty tree before any insert)
    pub fn root(&self) -> Hash {
        self.root
    }

    /// append a leaf at the next free index and rehash the affected path
    ///
    /// returns the new root
    pub fn insert(&mut self, leaf: Hash) -> Result<Hash, MerkleError> {
        if self.is_full() {
            return Err(MerkleError::TreeFull(self.capacity()));
        }

        let mut current = leaf;
        let mut index = self.next_index;
        for level in 0..self.depth {
            if index & 1 == 0 {
                // left child: remember it for the future right sibling,
                // pair with the empty subtree for now
                self.filled_subtrees[level] = current;
                current = hash_node(&current, &self.zeros[level]);
            } else {
                // right child: left sibling was filled earlier
                current = hash_node(&self.filled_subtrees[level], &current);
            }
            index >>= 1;
        }

        self.root = current;
        self.leaves.push(leaf);
        self.next_index += 1;
        Ok(self.root)
    }

    /// membership path for a previously inserted leaf, valid against the
    /// current root
    pub fn path(&self, index: u64) -> Result<MerklePath, MerkleError> {
        if index >= self.next_index {
            return Err(MerkleError::UnknownLeaf(index));
        }

        let mut elements = Vec::with_capacity(self.depth);
        let mut indices = Vec::with_capacity(self.depth);
        let mut level: Vec<Hash> = self.leaves.clone();
        let mut position = index as usize;

        for depth in 0..self.depth {
            let sibling = level
                .get(position ^ 1)
                .copied()
                .unwrap_or(self.zeros[depth]);
            elements.push(sibling);
            indices.push((position & 1) as u8);

            let parents = level.len().div_ceil(2);
            let mut next = Vec::with_capacity(parents);
            for pair in 0..parents {
                let left = level[2 * pair];
                let right = level
                    .get(2 * pair + 1)
                    .copied()
                    .unwrap_or(self.zeros[depth]);
                next.push(hash_node(&left, &right));
            }
            level = next;
            position >>= 1;
        }

        Ok(MerklePath { elements, indices })
    }
}
