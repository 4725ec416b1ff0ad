//! Dense word-compatibility matrix with packed and expanded storage.

use crate::words::{compatible, Word};
use rayon::prelude::*;
use std::fmt;

// ============================================================================
// Bit indexing helpers
// ============================================================================

/// Index of the `u64` block holding bit `i`.
#[inline(always)]
const fn block_of(i: usize) -> usize {
    i / 64
}

/// Mask selecting bit `i` within its block.
#[inline(always)]
const fn bit_of(i: usize) -> u64 {
    1u64 << (i % 64)
}

/// Mask selecting bit positions `start % 64` and above within a block.
#[inline(always)]
const fn tail_mask(start: usize) -> u64 {
    !0u64 << (start % 64)
}

// ============================================================================
// Representation selection
// ============================================================================

/// Storage layout of a [`CompatibilityMatrix`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixRepr {
    /// One bit per cell: rows are `u64` bitsets, `n * n / 8` bytes total.
    /// Intersections and counts run 64 cells at a time.
    Packed,
    /// One byte per cell: `n * n` bytes. Direct indexing, and row scans
    /// that the compiler turns into wide vector compares.
    Expanded,
}

impl fmt::Display for MatrixRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixRepr::Packed => write!(f, "packed"),
            MatrixRepr::Expanded => write!(f, "expanded"),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors from matrix construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatrixError {
    /// The vocabulary needs more matrix cells than `usize` can address.
    TooLarge {
        /// Number of words.
        n: usize,
    },
    /// The allocator refused the backing buffer.
    Allocation {
        /// Requested size in bytes.
        bytes: usize,
    },
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixError::TooLarge { n } => {
                write!(f, "{n} words need more matrix cells than usize can address")
            }
            MatrixError::Allocation { bytes } => {
                write!(f, "failed to allocate {bytes} bytes for the compatibility matrix")
            }
        }
    }
}

impl std::error::Error for MatrixError {}

/// Allocates a zero-filled `u64` buffer, surfacing allocator refusal.
fn zeroed_u64(len: usize) -> Result<Vec<u64>, MatrixError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| MatrixError::Allocation {
        bytes: len.saturating_mul(8),
    })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Allocates a zero-filled byte buffer, surfacing allocator refusal.
fn zeroed_u8(len: usize) -> Result<Vec<u8>, MatrixError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| MatrixError::Allocation { bytes: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

// ============================================================================
// CompatibilityMatrix
// ============================================================================

#[derive(Clone, Debug)]
enum Storage {
    /// Row-major bitsets, `row_blocks` `u64`s per row. Bits at positions
    /// `n` and above stay zero, so block-wide counts never see them.
    Packed { row_blocks: usize, bits: Vec<u64> },
    /// Row-major bytes, one per cell, each `0` or `1`.
    Expanded(Vec<u8>),
}

/// Symmetric word-compatibility relation over a vocabulary.
///
/// Cell `(i, j)` is set iff `i != j` and words `i` and `j` share no letter.
/// The matrix is immutable once built; [`CompatibilityMatrix::permuted`]
/// derives a reindexed copy rather than mutating in place.
#[derive(Clone, Debug)]
pub struct CompatibilityMatrix {
    n: usize,
    storage: Storage,
}

impl CompatibilityMatrix {
    /// Builds the full `n x n` relation, in parallel over disjoint row
    /// ranges. Every cell `(i, j)` is computed by the owner of row `i`, so
    /// no cell is written twice; symmetry falls out of the predicate.
    ///
    /// # Errors
    /// Returns [`MatrixError::TooLarge`] if the cell count overflows
    /// `usize`, and [`MatrixError::Allocation`] if the allocator refuses
    /// the backing buffer. A partial matrix is never returned.
    pub fn build(words: &[Word], repr: MatrixRepr) -> Result<Self, MatrixError> {
        let n = words.len();
        let storage = match repr {
            MatrixRepr::Packed => {
                let row_blocks = n.div_ceil(64);
                let total = n
                    .checked_mul(row_blocks)
                    .ok_or(MatrixError::TooLarge { n })?;
                let mut bits = zeroed_u64(total)?;
                if n > 0 {
                    bits.par_chunks_mut(row_blocks).enumerate().for_each(|(i, row)| {
                        let me = &words[i];
                        for (j, other) in words.iter().enumerate() {
                            if i != j && compatible(me, other) {
                                row[block_of(j)] |= bit_of(j);
                            }
                        }
                    });
                }
                Storage::Packed { row_blocks, bits }
            }
            MatrixRepr::Expanded => {
                let total = n.checked_mul(n).ok_or(MatrixError::TooLarge { n })?;
                let mut cells = zeroed_u8(total)?;
                if n > 0 {
                    cells.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
                        let me = &words[i];
                        for (j, other) in words.iter().enumerate() {
                            row[j] = u8::from(i != j && compatible(me, other));
                        }
                    });
                }
                Storage::Expanded(cells)
            }
        };
        Ok(Self { n, storage })
    }

    /// Number of words (matrix order).
    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Storage layout in use.
    #[inline]
    pub fn repr(&self) -> MatrixRepr {
        match self.storage {
            Storage::Packed { .. } => MatrixRepr::Packed,
            Storage::Expanded(_) => MatrixRepr::Expanded,
        }
    }

    /// Returns whether words `i` and `j` are compatible.
    #[inline(always)]
    pub fn contains(&self, i: usize, j: usize) -> bool {
        debug_assert!(i < self.n && j < self.n);
        match &self.storage {
            Storage::Packed { row_blocks, bits } => {
                bits[i * row_blocks + block_of(j)] & bit_of(j) != 0
            }
            Storage::Expanded(cells) => cells[i * self.n + j] != 0,
        }
    }

    /// Number of words compatible with word `i`.
    #[inline]
    pub fn degree(&self, i: usize) -> usize {
        debug_assert!(i < self.n);
        match &self.storage {
            Storage::Packed { row_blocks, bits } => bits[i * row_blocks..(i + 1) * row_blocks]
                .iter()
                .map(|b| b.count_ones() as usize)
                .sum(),
            Storage::Expanded(cells) => cells[i * self.n..(i + 1) * self.n]
                .iter()
                .map(|&c| c as usize)
                .sum(),
        }
    }

    /// Total number of compatible pairs.
    pub fn edge_count(&self) -> usize {
        let twice: usize = (0..self.n).map(|i| self.degree(i)).sum();
        twice / 2
    }

    /// Size of the backing buffer in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match &self.storage {
            Storage::Packed { bits, .. } => bits.len() * std::mem::size_of::<u64>(),
            Storage::Expanded(cells) => cells.len(),
        }
    }

    /// Returns a zeroed scratch set in this matrix's layout.
    pub fn scratch(&self) -> NeighborSet {
        match &self.storage {
            Storage::Packed { row_blocks, .. } => {
                NeighborSet(SetStorage::Packed(vec![0u64; *row_blocks]))
            }
            Storage::Expanded(_) => NeighborSet(SetStorage::Expanded(vec![0u8; self.n])),
        }
    }

    /// Copies row `i` into `set`.
    ///
    /// # Panics
    /// Panics if `set` came from a matrix with a different layout or order.
    #[inline]
    pub fn load_row(&self, i: usize, set: &mut NeighborSet) {
        debug_assert!(i < self.n);
        match (&self.storage, &mut set.0) {
            (Storage::Packed { row_blocks, bits }, SetStorage::Packed(dst)) => {
                dst.copy_from_slice(&bits[i * row_blocks..(i + 1) * row_blocks]);
            }
            (Storage::Expanded(cells), SetStorage::Expanded(dst)) => {
                dst.copy_from_slice(&cells[i * self.n..(i + 1) * self.n]);
            }
            _ => unreachable!("neighbor set layout does not match the matrix"),
        }
    }

    /// Counts members of `active ∩ row(j)` with index strictly above `j`,
    /// without materializing the intersection.
    ///
    /// This is the pruning bound of the search: most candidates fail it, so
    /// the intersection is only written out for the few that survive.
    ///
    /// # Panics
    /// Panics if `active` came from a matrix with a different layout or order.
    #[inline]
    pub fn intersect_count_above(&self, active: &NeighborSet, j: usize) -> usize {
        debug_assert!(j < self.n);
        let start = j + 1;
        match (&self.storage, &active.0) {
            (Storage::Packed { row_blocks, bits }, SetStorage::Packed(act)) => {
                let row = &bits[j * row_blocks..(j + 1) * row_blocks];
                let first = block_of(start);
                if first >= act.len() {
                    return 0;
                }
                let mut count =
                    ((act[first] & row[first]) & tail_mask(start)).count_ones() as usize;
                for k in (first + 1)..act.len() {
                    count += (act[k] & row[k]).count_ones() as usize;
                }
                count
            }
            (Storage::Expanded(cells), SetStorage::Expanded(act)) => {
                let row = &cells[j * self.n..(j + 1) * self.n];
                act[start..]
                    .iter()
                    .zip(&row[start..])
                    .filter(|&(&a, &r)| a & r != 0)
                    .count()
            }
            _ => unreachable!("neighbor set layout does not match the matrix"),
        }
    }

    /// Writes `active ∩ row(j)` into `out`.
    ///
    /// # Panics
    /// Panics if either set came from a matrix with a different layout or order.
    #[inline]
    pub fn intersect_into(&self, active: &NeighborSet, j: usize, out: &mut NeighborSet) {
        debug_assert!(j < self.n);
        match (&self.storage, &active.0, &mut out.0) {
            (Storage::Packed { row_blocks, bits }, SetStorage::Packed(act), SetStorage::Packed(dst)) => {
                let row = &bits[j * row_blocks..(j + 1) * row_blocks];
                for ((d, &a), &r) in dst.iter_mut().zip(act).zip(row) {
                    *d = a & r;
                }
            }
            (Storage::Expanded(cells), SetStorage::Expanded(act), SetStorage::Expanded(dst)) => {
                let row = &cells[j * self.n..(j + 1) * self.n];
                for ((d, &a), &r) in dst.iter_mut().zip(act).zip(row) {
                    *d = a & r;
                }
            }
            _ => unreachable!("neighbor set layout does not match the matrix"),
        }
    }

    /// Returns a new matrix reindexed so that `new[p][q] == old[perm[p]][perm[q]]`.
    ///
    /// # Errors
    /// Returns an allocation error if the reindexed buffer is refused.
    ///
    /// # Panics
    /// Panics in debug builds if `perm` is not a permutation of `0..n`.
    pub fn permuted(&self, perm: &[usize]) -> Result<Self, MatrixError> {
        debug_assert_eq!(perm.len(), self.n);
        debug_assert!(is_permutation(perm), "perm must be a permutation of 0..n");
        if self.n == 0 {
            return Ok(self.clone());
        }
        let n = self.n;
        let storage = match &self.storage {
            Storage::Packed { row_blocks, bits } => {
                let row_blocks = *row_blocks;
                let mut out = zeroed_u64(bits.len())?;
                out.par_chunks_mut(row_blocks).enumerate().for_each(|(p, row)| {
                    let src = &bits[perm[p] * row_blocks..(perm[p] + 1) * row_blocks];
                    for (q, &orig) in perm.iter().enumerate() {
                        if src[block_of(orig)] & bit_of(orig) != 0 {
                            row[block_of(q)] |= bit_of(q);
                        }
                    }
                });
                Storage::Packed { row_blocks, bits: out }
            }
            Storage::Expanded(cells) => {
                let mut out = zeroed_u8(cells.len())?;
                out.par_chunks_mut(n).enumerate().for_each(|(p, row)| {
                    let src = &cells[perm[p] * n..(perm[p] + 1) * n];
                    for (q, &orig) in perm.iter().enumerate() {
                        row[q] = src[orig];
                    }
                });
                Storage::Expanded(out)
            }
        };
        Ok(Self { n, storage })
    }
}

/// Returns whether `perm` visits every index below its length exactly once.
fn is_permutation(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    for &p in perm {
        if p >= perm.len() || seen[p] {
            return false;
        }
        seen[p] = true;
    }
    true
}

// ============================================================================
// NeighborSet
// ============================================================================

#[derive(Clone, Debug)]
enum SetStorage {
    Packed(Vec<u64>),
    Expanded(Vec<u8>),
}

/// Owned scratch buffer holding one neighbor set in its matrix's layout.
///
/// The search keeps one per recursion level and overwrites them in place.
/// [`CompatibilityMatrix::scratch`] is the only constructor, which keeps
/// set layout and matrix layout in lockstep.
#[derive(Clone, Debug)]
pub struct NeighborSet(SetStorage);

impl NeighborSet {
    /// Returns whether `i` is a member.
    #[inline(always)]
    pub fn contains(&self, i: usize) -> bool {
        match &self.0 {
            SetStorage::Packed(blocks) => blocks[block_of(i)] & bit_of(i) != 0,
            SetStorage::Expanded(bytes) => bytes[i] != 0,
        }
    }

    /// Number of members.
    #[inline]
    pub fn count(&self) -> usize {
        match &self.0 {
            SetStorage::Packed(blocks) => {
                blocks.iter().map(|b| b.count_ones() as usize).sum()
            }
            SetStorage::Expanded(bytes) => bytes.iter().map(|&c| c as usize).sum(),
        }
    }

    /// Number of members with index strictly above `i`.
    #[inline]
    pub fn count_above(&self, i: usize) -> usize {
        let start = i + 1;
        match &self.0 {
            SetStorage::Packed(blocks) => {
                let first = block_of(start);
                if first >= blocks.len() {
                    return 0;
                }
                let mut count = (blocks[first] & tail_mask(start)).count_ones() as usize;
                for &b in &blocks[first + 1..] {
                    count += b.count_ones() as usize;
                }
                count
            }
            SetStorage::Expanded(bytes) => {
                if start >= bytes.len() {
                    return 0;
                }
                bytes[start..].iter().map(|&c| c as usize).sum()
            }
        }
    }

    /// Iterates members with index strictly above `i`, in ascending order.
    pub fn members_above(&self, i: usize) -> Members<'_> {
        let start = i + 1;
        let inner = match &self.0 {
            SetStorage::Packed(blocks) => {
                let block = block_of(start);
                let current = if block < blocks.len() {
                    blocks[block] & tail_mask(start)
                } else {
                    0
                };
                MembersInner::Packed {
                    blocks,
                    block,
                    current,
                }
            }
            SetStorage::Expanded(bytes) => MembersInner::Expanded { bytes, next: start },
        };
        Members { inner }
    }
}

enum MembersInner<'a> {
    Packed {
        blocks: &'a [u64],
        block: usize,
        current: u64,
    },
    Expanded {
        bytes: &'a [u8],
        next: usize,
    },
}

/// Ascending iterator over the members of a [`NeighborSet`].
pub struct Members<'a> {
    inner: MembersInner<'a>,
}

impl Iterator for Members<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        match &mut self.inner {
            MembersInner::Packed {
                blocks,
                block,
                current,
            } => loop {
                if *current != 0 {
                    let offset = current.trailing_zeros() as usize;
                    *current &= *current - 1; // Clear lowest set bit
                    return Some(*block * 64 + offset);
                }
                *block += 1;
                if *block >= blocks.len() {
                    return None;
                }
                *current = blocks[*block];
            },
            MembersInner::Expanded { bytes, next } => {
                while *next < bytes.len() {
                    let i = *next;
                    *next += 1;
                    if bytes[i] != 0 {
                        return Some(i);
                    }
                }
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
