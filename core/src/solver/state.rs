//! Search states and the node arena
//!
//! A search state is the multiset of primitives constructed so far. States
//! are stored as deltas: each node records only its parent and the one
//! primitive its step appended, and the full primitive sequence is
//! rehydrated on demand. Nodes live in an arena for the whole search (the
//! solution path is reconstructed through parent links) and are freed en
//! masse when the search ends.

use crate::geometry::{CanonKey, Primitive};
use rustc_hash::FxHashSet;

/// Index of a node in the arena.
pub type NodeId = u32;

/// The construction operation applied by a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Line through two points
    LineThrough,
    /// Circle centered at the first operand, through the second
    CircleCentered,
    /// Intersection of two lines/circles
    Intersect,
}

/// One construction step: the operation plus the positions of its two
/// operands in the state's primitive sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    pub op: OpKind,
    pub lhs: usize,
    pub rhs: usize,
}

/// A search node. `g` equals the number of primitives appended since the
/// root, and `state_hash` is the commutative digest of the state's
/// canonical-key multiset.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub parent: Option<NodeId>,
    pub produced: Primitive,
    pub key: CanonKey,
    pub step: StepRecord,
    pub g: u32,
    pub state_hash: u64,
}

/// Fully rehydrated view of one state.
#[derive(Debug)]
pub struct StateView {
    /// Primitive sequence: the knowns in input order, then one appended
    /// primitive per step.
    pub prims: Vec<Primitive>,
    /// Canonical identities of `prims`.
    pub keys: FxHashSet<CanonKey>,
}

/// Arena of search nodes rooted at the knowns.
pub struct NodeArena {
    knowns: Vec<Primitive>,
    known_keys: Vec<CanonKey>,
    nodes: Vec<SearchNode>,
    root_hash: u64,
}

impl NodeArena {
    pub fn new(knowns: &[Primitive]) -> Self {
        let known_keys: Vec<CanonKey> = knowns.iter().map(|p| p.canonical_key()).collect();
        let root_hash = known_keys
            .iter()
            .fold(0u64, |acc, k| combine_state_hash(acc, k));
        Self {
            knowns: knowns.to_vec(),
            known_keys,
            nodes: Vec::new(),
            root_hash,
        }
    }

    pub fn knowns(&self) -> &[Primitive] {
        &self.knowns
    }

    pub fn known_keys(&self) -> &[CanonKey] {
        &self.known_keys
    }

    pub fn root_hash(&self) -> u64 {
        self.root_hash
    }

    pub fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id as usize]
    }

    pub fn push(&mut self, node: SearchNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// State hash of a node, or of the root when `id` is `None`.
    pub fn state_hash(&self, id: Option<NodeId>) -> u64 {
        match id {
            Some(id) => self.node(id).state_hash,
            None => self.root_hash,
        }
    }

    /// Depth of a node, or zero for the root.
    pub fn depth(&self, id: Option<NodeId>) -> u32 {
        match id {
            Some(id) => self.node(id).g,
            None => 0,
        }
    }

    /// Rebuild the full primitive sequence and identity set of a state by
    /// walking the delta chain back to the root.
    pub fn rehydrate(&self, id: Option<NodeId>) -> StateView {
        let mut appended = Vec::new();
        let mut cursor = id;
        while let Some(nid) = cursor {
            let node = self.node(nid);
            appended.push(node.produced);
            cursor = node.parent;
        }
        appended.reverse();

        let mut prims = Vec::with_capacity(self.knowns.len() + appended.len());
        prims.extend_from_slice(&self.knowns);
        prims.extend_from_slice(&appended);

        let mut keys =
            FxHashSet::with_capacity_and_hasher(prims.len(), Default::default());
        keys.extend(self.known_keys.iter().copied());
        let mut cursor = id;
        while let Some(nid) = cursor {
            let node = self.node(nid);
            keys.insert(node.key);
            cursor = node.parent;
        }

        StateView { prims, keys }
    }

    /// Steps from the root to `id`, in construction order.
    pub fn path(&self, id: NodeId) -> Vec<&SearchNode> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(nid) = cursor {
            let node = self.node(nid);
            chain.push(node);
            cursor = node.parent;
        }
        chain.reverse();
        chain
    }
}

/// Fold one more canonical identity into a commutative state hash.
///
/// Wrapping addition of per-key digests makes the hash independent of
/// construction order, which is exactly the multiset semantics state
/// deduplication needs.
pub fn combine_state_hash(state_hash: u64, key: &CanonKey) -> u64 {
    state_hash.wrapping_add(key.digest())
}
