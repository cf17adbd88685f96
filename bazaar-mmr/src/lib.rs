//! Append-only Merkle Mountain Range over 32-byte leaves
//!
//! The patch log is committed by an MMR: every leaf append also appends the
//! interior nodes it completes, so the store is a flat, strictly growing
//! vector of nodes in mmr-index order and historical nodes never change.
//! The accumulator (the list of peak values in descending height order) is
//! the minimal commitment of the whole log, and both inclusion and
//! consistency proofs fold node values towards one of those peaks.
//!
//! Interior node values bind their position: a parent at mmr index `i` is
//! `SHA-256(uint64_be(i + 1) || left || right)`.

use bazaar_crypto::hash::{Hash, Hasher};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("mmr index {index} out of range for size {size}")]
    IndexOutOfRange { index: u64, size: u64 },

    #[error("size {0} does not describe a complete mmr")]
    IncompleteMmr(u64),

    #[error("expected a single peak but found {0}")]
    NotASinglePeak(usize),

    #[error("accumulator has {peaks} peaks but {provided} proofs were provided")]
    PeakCountMismatch { peaks: usize, provided: usize },
}

/// Flat store of MMR nodes in mmr-index order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mmr {
    nodes: Vec<Hash<32>>,
}

impl Mmr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the store (leaves and interior nodes)
    pub fn size(&self) -> u64 {
        self.nodes.len() as u64
    }

    pub fn node(&self, i: u64) -> Option<Hash<32>> {
        self.nodes.get(i as usize).copied()
    }

    fn append(&mut self, v: Hash<32>) -> u64 {
        self.nodes.push(v);
        self.nodes.len() as u64
    }

    /// Adds the leaf hash value to the MMR
    ///
    /// Interior nodes are appended as necessary to keep the mmr complete.
    /// Returns the mmr index where the next leaf would be placed.
    pub fn push_leaf(&mut self, leaf: Hash<32>) -> u64 {
        let mut g = 0;
        let mut i = self.append(leaf);

        while index_height(i) > g {
            let left = self.nodes[(i - (2 << g)) as usize];
            let right = self.nodes[(i - 1) as usize];

            i = self.append(hash_pospair64(i + 1, &left, &right));
            g += 1;
        }

        i
    }

    /// The peak values of the current (always complete) state, in
    /// descending height order
    pub fn accumulator(&self) -> Vec<Hash<32>> {
        if self.nodes.is_empty() {
            return Vec::new();
        }

        peaks(self.size() - 1)
            .into_iter()
            .map(|i| self.nodes[i as usize])
            .collect()
    }

    /// The accumulator of an earlier complete state of this store
    pub fn accumulator_at(&self, size: u64) -> Result<Vec<Hash<32>>, Error> {
        self.check_complete(size)?;

        if size == 0 {
            return Ok(Vec::new());
        }

        Ok(peaks(size - 1)
            .into_iter()
            .map(|i| self.nodes[i as usize])
            .collect())
    }

    /// The sibling values proving the node at `i` against the accumulator
    /// of the complete state described by `size`
    pub fn inclusion_proof(&self, i: u64, size: u64) -> Result<Vec<Hash<32>>, Error> {
        self.check_complete(size)?;

        if i >= size {
            return Err(Error::IndexOutOfRange {
                index: i,
                size,
            });
        }

        Ok(inclusion_proof_path(i, size - 1)
            .into_iter()
            .map(|i| self.nodes[i as usize])
            .collect())
    }

    /// One inclusion path per peak of the `from_size` state, proving it is
    /// a prefix of the `to_size` state
    pub fn consistency_proof(
        &self,
        from_size: u64,
        to_size: u64,
    ) -> Result<Vec<Vec<Hash<32>>>, Error> {
        self.check_complete(from_size)?;
        self.check_complete(to_size)?;

        if from_size == 0 || from_size > to_size {
            return Err(Error::IndexOutOfRange {
                index: from_size,
                size: to_size,
            });
        }

        Ok(peaks(from_size - 1)
            .into_iter()
            .map(|peak| {
                inclusion_proof_path(peak, to_size - 1)
                    .into_iter()
                    .map(|i| self.nodes[i as usize])
                    .collect()
            })
            .collect())
    }

    /// The single peak committing the whole store
    ///
    /// Only defined when the leaf count is a power of two; any other shape
    /// carries more than one peak and has no single root.
    pub fn root(&self) -> Result<Hash<32>, Error> {
        if self.nodes.is_empty() {
            return Err(Error::NotASinglePeak(0));
        }

        let peaks = peaks(self.size() - 1);
        if peaks.len() != 1 {
            return Err(Error::NotASinglePeak(peaks.len()));
        }

        Ok(self.nodes[peaks[0] as usize])
    }

    fn check_complete(&self, size: u64) -> Result<(), Error> {
        if size > self.size() {
            return Err(Error::IndexOutOfRange {
                index: size,
                size: self.size(),
            });
        }

        if !is_complete(size) {
            return Err(Error::IncompleteMmr(size));
        }

        Ok(())
    }
}

/// Compute the positioned hash of two child nodes
///
/// `pos` is the 1-based position of the parent node.
pub fn hash_pospair64(pos: u64, left: &Hash<32>, right: &Hash<32>) -> Hash<32> {
    let mut hasher = Hasher::<256>::new();
    hasher.input(&pos.to_be_bytes());
    hasher.input(left.as_ref());
    hasher.input(right.as_ref());
    hasher.finalize()
}

/// Returns the 0 based height of the mmr entry indexed by `i`
pub fn index_height(i: u64) -> u64 {
    // work on the position to take advantage of the bit patterns afforded
    let mut pos = i + 1;
    while !all_ones(pos) {
        pos -= most_sig_bit(pos) - 1;
    }

    bit_length(pos) - 1
}

/// A size describes a complete mmr when no parent nodes are pending
pub fn is_complete(size: u64) -> bool {
    index_height(size) == 0
}

/// Returns the peak indices for the complete mmr whose last node is `c`,
/// highest to lowest
pub fn peaks(c: u64) -> Vec<u64> {
    let mut peak = 0;
    let mut out = Vec::new();
    let mut s = c + 1;

    while s != 0 {
        // find the highest peak size in the current mmr
        let highest_size = (1 << log2_floor(s + 1)) - 1;
        peak += highest_size;
        out.push(peak - 1);
        s -= highest_size;
    }

    out
}

/// Returns the count of leaves committed by the complete mmr whose last
/// node is `c`
///
/// The bits of the count also form a mask with one bit set per peak, the
/// bit position being the height of that peak.
pub fn leaf_count(c: u64) -> u64 {
    let mut s = c + 1;

    let mut peak_size = (1u64 << bit_length(s)) - 1;
    let mut peak_map = 0;
    while peak_size > 0 {
        peak_map <<= 1;
        if s >= peak_size {
            s -= peak_size;
            peak_map |= 1;
        }
        peak_size >>= 1;
    }

    peak_map
}

/// Returns the mmr index of leaf `e`, counting leaves without regard for
/// the interior nodes
pub fn mmr_index(e: u64) -> u64 {
    let mut sum = 0;
    let mut e = e;

    while e > 0 {
        let h = bit_length(e);
        sum += (1 << h) - 1;
        e -= 1 << (h - 1);
    }

    sum
}

/// Returns the first complete mmr index which contains `i`
pub fn complete_mmr(i: u64) -> u64 {
    let mut i = i;
    let mut h0 = index_height(i);
    let mut h1 = index_height(i + 1);

    while h0 < h1 {
        i += 1;
        h0 = h1;
        h1 = index_height(i + 1);
    }

    i
}

/// Return the mmr index for the parent of `i`
pub fn parent(i: u64) -> u64 {
    let g = index_height(i);

    if index_height(i + 1) > g {
        i + 1
    } else {
        i + (2 << g)
    }
}

/// Return the accumulator position proven by a height-`g` inclusion path in
/// the mmr committing `leaves` leaves
pub fn accumulator_index(leaves: u64, g: u64) -> u64 {
    ((leaves & !((1 << g) - 1)).count_ones() - 1) as u64
}

/// Returns the list of node indices proving inclusion of `i` in the
/// complete mmr whose last node is `c`
pub fn inclusion_proof_path(i: u64, c: u64) -> Vec<u64> {
    let mut path = Vec::new();
    let mut i = i;
    let mut g = index_height(i);

    loop {
        let sibling_offset = 2 << g;

        let sibling = if index_height(i + 1) > g {
            // i is a right sibling, so its witness is offset behind and the
            // parent is stored immediately after
            let sibling = i - sibling_offset + 1;
            i += 1;
            sibling
        } else {
            // i is a left sibling, so its witness is offset ahead and the
            // parent is one position past the right sibling
            let sibling = i + sibling_offset - 1;
            i += sibling_offset;
            sibling
        };

        if sibling > c {
            return path;
        }

        path.push(sibling);
        g += 1;
    }
}

/// Apply `proof` to the value at mmr index `i` to produce the implied
/// accumulator peak
pub fn included_root(i: u64, nodehash: &Hash<32>, proof: &[Hash<32>]) -> Hash<32> {
    let mut root = *nodehash;
    let mut i = i;
    let mut g = index_height(i);

    for sibling in proof {
        if index_height(i + 1) > g {
            // i is a right child, the parent is at i+1
            i += 1;
            root = hash_pospair64(i + 1, sibling, &root);
        } else {
            // i is a left child, the parent is at i + 2^(g+1)
            i += 2 << g;
            root = hash_pospair64(i + 1, &root, sibling);
        }

        g += 1;
    }

    root
}

/// Folds `proof` into the value at `i` until `root` is produced
///
/// Returns whether the root was produced and the count of path elements
/// consumed to do so.
pub fn verify_inclusion_path(
    i: u64,
    nodehash: &Hash<32>,
    proof: &[Hash<32>],
    root: &Hash<32>,
) -> (bool, usize) {
    if proof.is_empty() && nodehash == root {
        return (true, 0);
    }

    let mut i = i;
    let mut g = index_height(i);
    let mut element = *nodehash;

    for (consumed, sibling) in proof.iter().enumerate() {
        if index_height(i + 1) > g {
            i += 1;
            element = hash_pospair64(i + 1, sibling, &element);
        } else {
            i += 2 << g;
            element = hash_pospair64(i + 1, &element, sibling);
        }

        if &element == root {
            return (true, consumed + 1);
        }

        g += 1;
    }

    (false, proof.len())
}

/// Apply the inclusion paths for each origin accumulator peak
///
/// The returned list is a descending height ordered list of elements of the
/// accumulator for the consistent future state. It may be exactly the future
/// accumulator or a prefix of it.
pub fn consistent_roots(
    from_c: u64,
    accumulator_from: &[Hash<32>],
    proofs: &[Vec<Hash<32>>],
) -> Result<Vec<Hash<32>>, Error> {
    let from_peaks = peaks(from_c);

    if from_peaks.len() != accumulator_from.len() {
        return Err(Error::PeakCountMismatch {
            peaks: from_peaks.len(),
            provided: accumulator_from.len(),
        });
    }
    if from_peaks.len() != proofs.len() {
        return Err(Error::PeakCountMismatch {
            peaks: from_peaks.len(),
            provided: proofs.len(),
        });
    }

    let mut roots: Vec<Hash<32>> = Vec::new();
    for (index, peak) in from_peaks.into_iter().enumerate() {
        let root = included_root(peak, &accumulator_from[index], &proofs[index]);
        if roots.last() == Some(&root) {
            continue;
        }
        roots.push(root);
    }

    Ok(roots)
}

/// Verifies that the proofs carry each peak of the older accumulator into
/// the newer one
///
/// Because both lists are in descending height order a single linear scan
/// suffices.
pub fn verify_consistent_roots(
    from_c: u64,
    accumulator_from: &[Hash<32>],
    accumulator_to: &[Hash<32>],
    proofs: &[Vec<Hash<32>>],
) -> Result<bool, Error> {
    let proven = consistent_roots(from_c, accumulator_from, proofs)?;

    let mut ito = 0;
    for root in proven {
        if accumulator_to.get(ito) == Some(&root) {
            continue;
        }

        // no match on the current peak, it must match the next one down
        ito += 1;

        if ito >= accumulator_to.len() {
            return Ok(false);
        }
        if accumulator_to[ito] != root {
            return Ok(false);
        }
    }

    Ok(true)
}

fn bit_length(v: u64) -> u64 {
    (64 - v.leading_zeros()) as u64
}

fn all_ones(pos: u64) -> bool {
    pos & pos.wrapping_add(1) == 0
}

fn most_sig_bit(pos: u64) -> u64 {
    1 << (bit_length(pos) - 1)
}

fn log2_floor(v: u64) -> u64 {
    bit_length(v) - 1
}
