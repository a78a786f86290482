use std::collections::HashMap;

use crate::code::{BitCode, MAX_CODE_BIT_LEN};
use crate::error::{HuffError, Result};

mod heap;
use heap::NodeHeap;


/// Per-byte occurrence counts. Bytes that never occur are absent.
pub type Frequencies = HashMap<u8, u64>;

/// Counts how often each byte occurs in `data`.
pub fn count_frequencies(data: &[u8]) -> Frequencies {
    let mut freq = Frequencies::new();
    for &b in data {
        *freq.entry(b).or_insert(0) += 1;
    }

    freq
}

/// Index of a node inside the tree's arena.
pub type NodeId = usize;

/// A node of the Huffman tree.
///
/// Internal nodes carry the summed weight of their subtree and a zero byte;
/// leaves carry the byte they stand for and, once assignment has run, its
/// code. Links are arena indices, so parent back-references cost nothing to
/// own.
#[derive(Debug, Clone)]
pub struct HuffmanNode {
    pub weight: u64,
    pub byte: u8,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    code: Option<BitCode>,
}

impl HuffmanNode {
    fn leaf(byte: u8, weight: u64) -> Self {
        HuffmanNode {
            weight,
            byte,
            parent: None,
            left: None,
            right: None,
            code: None,
        }
    }

    fn internal(weight: u64, left: NodeId, right: NodeId) -> Self {
        HuffmanNode {
            weight,
            byte: 0,
            parent: None,
            left: Some(left),
            right: Some(right),
            code: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// The code assigned to this leaf, if assignment has run.
    pub fn code(&self) -> Option<BitCode> {
        self.code
    }
}

/// A Huffman tree built from a byte-frequency histogram.
#[derive(Debug, Clone, Default)]
pub struct HuffmanTree {
    freq: Frequencies,
    arena: Vec<HuffmanNode>,
    root: Option<NodeId>,
    leaves: Vec<NodeId>,
}

impl HuffmanTree {
    /// Builds the tree and assigns a code to every leaf.
    ///
    /// An empty histogram produces a tree with no root and no leaves. Fails
    /// with [`HuffError::CodeTooLong`] if any leaf would end up deeper than
    /// [`MAX_CODE_BIT_LEN`].
    pub fn new(freq: Frequencies) -> Result<Self> {
        let mut tree = HuffmanTree {
            freq,
            arena: Vec::new(),
            root: None,
            leaves: Vec::new(),
        };
        tree.construct()?;

        Ok(tree)
    }

    pub fn freq(&self) -> &Frequencies {
        &self.freq
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Leaf ids in builder insertion order (ascending byte value).
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    pub fn node(&self, id: NodeId) -> &HuffmanNode {
        &self.arena[id]
    }

    /// Σ frequency × code length over all leaves, the quantity Huffman's
    /// algorithm minimizes. Meaningful only after construction.
    pub fn weighted_path_length(&self) -> u64 {
        self.leaves
            .iter()
            .map(|&id| {
                let node = &self.arena[id];
                node.weight * node.code.map_or(0, |c| c.bit_len()) as u64
            })
            .sum()
    }

    fn construct(&mut self) -> Result<()> {
        if self.freq.is_empty() {
            return Ok(());
        }

        // The builder walks bytes in ascending order so equal-weight inputs
        // always produce the same tree.
        let mut entries: Vec<(u8, u64)> = self.freq.iter().map(|(&b, &w)| (b, w)).collect();
        entries.sort_unstable();

        if entries.len() == 1 {
            return self.construct_single(entries[0].0, entries[0].1);
        }

        let mut pq = NodeHeap::with_capacity(entries.len());
        for (byte, weight) in entries {
            let id = self.push_node(HuffmanNode::leaf(byte, weight));
            self.leaves.push(id);
            pq.push(weight, id);
        }

        while pq.len() > 1 {
            let Some((weight_a, mut a)) = pq.pop() else { break };
            let Some((weight_b, mut b)) = pq.pop() else { break };

            // Equal weights: the smaller byte becomes the left child. The
            // byte field is compared whether or not the nodes are leaves
            // (internal nodes hold byte 0), matching the layout existing
            // containers were produced with.
            if weight_a == weight_b && self.arena[a].byte > self.arena[b].byte {
                std::mem::swap(&mut a, &mut b);
            }

            let merged = self.push_node(HuffmanNode::internal(weight_a + weight_b, a, b));
            self.arena[a].parent = Some(merged);
            self.arena[b].parent = Some(merged);
            pq.push(weight_a + weight_b, merged);
        }

        self.root = pq.peek().map(|(_, id)| id);

        for i in 0..self.leaves.len() {
            self.assign_code(self.leaves[i])?;
        }

        Ok(())
    }

    /// One distinct byte: a root with only a left child, whose code is "0".
    fn construct_single(&mut self, byte: u8, weight: u64) -> Result<()> {
        let root = self.push_node(HuffmanNode {
            weight: 0,
            byte: 0,
            parent: None,
            left: None,
            right: None,
            code: None,
        });
        let leaf = self.push_node(HuffmanNode::leaf(byte, weight));
        self.arena[root].left = Some(leaf);
        self.arena[leaf].parent = Some(root);

        let mut code = BitCode::new();
        code.append_zero();
        self.arena[leaf].code = Some(code);

        self.root = Some(root);
        self.leaves.push(leaf);

        Ok(())
    }

    /// Walks from the leaf to the root collecting child-slot bits, then
    /// mirrors them into the root-to-leaf code.
    fn assign_code(&mut self, leaf: NodeId) -> Result<()> {
        let mut bits = BitCode::new();
        let mut depth = 0usize;
        let mut cur = Some(leaf);

        while let Some(id) = cur {
            if self.is_left(id) {
                bits.append_zero();
                depth += 1;
            } else if self.is_right(id) {
                bits.append_one();
                depth += 1;
            }
            cur = self.arena[id].parent;
        }

        if depth > MAX_CODE_BIT_LEN {
            return Err(HuffError::CodeTooLong {
                byte: self.arena[leaf].byte,
                max: MAX_CODE_BIT_LEN,
            });
        }

        self.arena[leaf].code = Some(bits.reverse_new());

        Ok(())
    }

    fn is_left(&self, id: NodeId) -> bool {
        match self.arena[id].parent {
            Some(p) => self.arena[p].left == Some(id),
            None => false,
        }
    }

    fn is_right(&self, id: NodeId) -> bool {
        match self.arena[id].parent {
            Some(p) => self.arena[p].right == Some(id),
            None => false,
        }
    }

    fn push_node(&mut self, node: HuffmanNode) -> NodeId {
        self.arena.push(node);
        self.arena.len() - 1
    }
}
