//! Parallel enumeration of letter-disjoint word groups.
//!
//! The search walks combinations of word indices in strictly increasing
//! order, so every group is visited exactly once and no deduplication is
//! needed. The outer loop over the first word is split across rayon
//! workers; each worker keeps a private result buffer and the buffers are
//! concatenated once at the end.

use crate::groups::WordGroup;
use crate::matrix::{CompatibilityMatrix, MatrixError, MatrixRepr, NeighborSet};
use crate::order::reorder_by_degree;
use crate::words::Word;
use rayon::prelude::*;
use std::fmt;

// ============================================================================
// Configuration
// ============================================================================

/// Tunable parameters for [`solve`].
#[derive(Clone, Debug)]
pub struct SolverConfig {
    /// Number of words per group. Must be at least 2.
    pub group_size: usize,
    /// Matrix storage layout.
    pub repr: MatrixRepr,
    /// Reorder words by ascending degree before searching.
    pub reorder: bool,
    /// Worker threads; `0` uses the global rayon pool.
    pub threads: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            group_size: 5,
            repr: MatrixRepr::Packed,
            reorder: true,
            threads: 0,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors reported before or while searching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchError {
    /// Group size below the smallest meaningful clique.
    InvalidGroupSize {
        /// The rejected size.
        group_size: usize,
    },
    /// Word list length differs from the matrix order.
    WordListMismatch {
        /// Matrix order.
        matrix: usize,
        /// Word list length.
        words: usize,
    },
    /// Matrix construction failed.
    Matrix(MatrixError),
    /// The dedicated thread pool could not be built.
    ThreadPool(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::InvalidGroupSize { group_size } => {
                write!(f, "group size must be at least 2, got {group_size}")
            }
            SearchError::WordListMismatch { matrix, words } => write!(
                f,
                "matrix is over {matrix} words but the word list has {words}"
            ),
            SearchError::Matrix(e) => write!(f, "{e}"),
            SearchError::ThreadPool(msg) => write!(f, "failed to build thread pool: {msg}"),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<MatrixError> for SearchError {
    fn from(e: MatrixError) -> Self {
        SearchError::Matrix(e)
    }
}

// ============================================================================
// Per-worker search state
// ============================================================================

/// Private state for one worker: the chosen prefix, one scratch set per
/// recursion level, and every group found so far.
struct Searcher<'a> {
    matrix: &'a CompatibilityMatrix,
    words: &'a [Word],
    k: usize,
    prefix: Vec<usize>,
    levels: Vec<NeighborSet>,
    found: Vec<WordGroup>,
}

impl<'a> Searcher<'a> {
    fn new(matrix: &'a CompatibilityMatrix, words: &'a [Word], k: usize) -> Self {
        debug_assert!(k >= 2);
        Self {
            matrix,
            words,
            k,
            prefix: Vec::with_capacity(k),
            levels: (0..k - 1).map(|_| matrix.scratch()).collect(),
            found: Vec::new(),
        }
    }

    /// Enumerates every group whose lowest-index word is `i`.
    fn search_from(&mut self, i: usize) {
        debug_assert!(self.prefix.is_empty());
        let (head, deeper) = self.levels.split_at_mut(1);
        let active = &mut head[0];
        self.matrix.load_row(i, active);
        if active.count_above(i) < self.k - 1 {
            return;
        }
        self.prefix.push(i);
        descend(
            self.matrix,
            self.words,
            &mut self.prefix,
            active,
            deeper,
            i,
            self.k - 1,
            &mut self.found,
        );
        self.prefix.pop();
    }

    fn into_found(self) -> Vec<WordGroup> {
        self.found
    }
}

/// Extends `prefix` (whose last member is `last`) with every combination of
/// `need` further words drawn from `active`, all above `last`.
///
/// `active` holds the words compatible with the entire prefix; `deeper`
/// holds one scratch set per remaining level, so recursion reuses buffers
/// instead of allocating.
#[allow(clippy::too_many_arguments)]
fn descend(
    matrix: &CompatibilityMatrix,
    words: &[Word],
    prefix: &mut Vec<usize>,
    active: &NeighborSet,
    deeper: &mut [NeighborSet],
    last: usize,
    need: usize,
    found: &mut Vec<WordGroup>,
) {
    debug_assert!(need >= 1);
    debug_assert_eq!(deeper.len(), need - 1);

    if need == 1 {
        // Every remaining active word above `last` completes a group.
        for v in active.members_above(last) {
            prefix.push(v);
            found.push(WordGroup::new(
                prefix.iter().map(|&w| words[w].clone()).collect(),
            ));
            prefix.pop();
        }
        return;
    }

    for j in active.members_above(last) {
        // Count the survivors above j before touching any buffer; most
        // candidates die here and never pay for the intersection.
        if matrix.intersect_count_above(active, j) < need - 1 {
            continue;
        }
        let (next, rest) = deeper.split_at_mut(1);
        matrix.intersect_into(active, j, &mut next[0]);
        prefix.push(j);
        descend(matrix, words, prefix, &next[0], rest, j, need - 1, found);
        prefix.pop();
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Finds every group of `k` pairwise-compatible words in the matrix.
///
/// The outer loop over the first word is partitioned across the current
/// rayon pool. Each worker fills a private buffer, and the buffers are
/// concatenated in one final reduction; the order of the returned groups
/// is therefore scheduling-dependent, but their set never is.
///
/// # Errors
/// Returns [`SearchError::InvalidGroupSize`] if `k < 2` and
/// [`SearchError::WordListMismatch`] if `words` does not line up with the
/// matrix. Both are rejected before any worker starts.
pub fn find_cliques(
    matrix: &CompatibilityMatrix,
    words: &[Word],
    k: usize,
) -> Result<Vec<WordGroup>, SearchError> {
    if k < 2 {
        return Err(SearchError::InvalidGroupSize { group_size: k });
    }
    if words.len() != matrix.n() {
        return Err(SearchError::WordListMismatch {
            matrix: matrix.n(),
            words: words.len(),
        });
    }

    let groups = (0..matrix.n())
        .into_par_iter()
        .fold(
            || Searcher::new(matrix, words, k),
            |mut searcher, i| {
                searcher.search_from(i);
                searcher
            },
        )
        .map(Searcher::into_found)
        .reduce(Vec::new, |mut all, mut part| {
            all.append(&mut part);
            all
        });
    Ok(groups)
}

/// Everything a finished run produces.
#[derive(Clone, Debug)]
pub struct Solution {
    /// Every group found.
    pub groups: Vec<WordGroup>,
    /// The word list the search ran over (reordered when requested).
    pub words: Vec<Word>,
    /// The matrix the search ran over.
    pub matrix: CompatibilityMatrix,
    /// Original index per position, when reordering was applied.
    pub permutation: Option<Vec<usize>>,
}

/// Builds the matrix, optionally reorders it, and runs the search.
///
/// With `config.threads > 0` the entire pipeline runs on a dedicated pool
/// of that many workers; otherwise it uses the global pool.
///
/// # Errors
/// Returns [`SearchError::InvalidGroupSize`] for `config.group_size < 2`,
/// a wrapped [`MatrixError`] if the matrix cannot be allocated, and
/// [`SearchError::ThreadPool`] if the dedicated pool cannot be built.
pub fn solve(words: Vec<Word>, config: &SolverConfig) -> Result<Solution, SearchError> {
    if config.group_size < 2 {
        return Err(SearchError::InvalidGroupSize {
            group_size: config.group_size,
        });
    }

    let run = |words: Vec<Word>| -> Result<Solution, SearchError> {
        let matrix = CompatibilityMatrix::build(&words, config.repr)?;
        let (matrix, words, permutation) = if config.reorder {
            let reordered = reorder_by_degree(&matrix, &words)?;
            (reordered.matrix, reordered.words, Some(reordered.permutation))
        } else {
            (matrix, words, None)
        };
        let groups = find_cliques(&matrix, &words, config.group_size)?;
        Ok(Solution {
            groups,
            words,
            matrix,
            permutation,
        })
    };

    if config.threads == 0 {
        run(words)
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| SearchError::ThreadPool(e.to_string()))?;
        pool.install(|| run(words))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::verify_groups;
    use crate::words::{compatible, parse_vocabulary, VocabOptions};
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn vocab(texts: &[&str]) -> Vec<Word> {
        texts
            .iter()
            .map(|t| Word::parse(t, t.len()).unwrap())
            .collect()
    }

    fn random_vocab(rng: &mut XorShiftRng, count: usize, word_len: usize) -> Vec<Word> {
        let mut alphabet: Vec<u8> = (b'a'..=b'z').collect();
        (0..count)
            .map(|_| {
                alphabet.shuffle(rng);
                let text: String = alphabet[..word_len].iter().map(|&b| b as char).collect();
                Word::parse(&text, word_len).unwrap()
            })
            .collect()
    }

    /// Canonicalizes a result into sorted member lists for set comparison.
    fn canonical(groups: &[WordGroup]) -> Vec<Vec<String>> {
        let mut out: Vec<Vec<String>> = groups
            .iter()
            .map(|g| {
                let mut members: Vec<String> =
                    g.members().iter().map(|w| w.text().to_string()).collect();
                members.sort();
                members
            })
            .collect();
        out.sort();
        out
    }

    /// Checks every k-subset of the vocabulary directly.
    fn brute_force(words: &[Word], k: usize) -> Vec<Vec<String>> {
        let n = words.len();
        assert!(n < 26, "brute force sweeps 2^n subsets");
        let mut out = Vec::new();
        for subset in 0u32..(1u32 << n) {
            if subset.count_ones() as usize != k {
                continue;
            }
            let members: Vec<usize> = (0..n).filter(|&i| subset >> i & 1 != 0).collect();
            let disjoint = members.iter().enumerate().all(|(a, &i)| {
                members[a + 1..]
                    .iter()
                    .all(|&j| compatible(&words[i], &words[j]))
            });
            if disjoint {
                let mut texts: Vec<String> =
                    members.iter().map(|&i| words[i].text().to_string()).collect();
                texts.sort();
                out.push(texts);
            }
        }
        out.sort();
        out
    }

    // -------------------------------------------------------------------------
    // Known-answer tests
    // -------------------------------------------------------------------------

    #[test]
    fn finds_the_disjoint_alphabet_cover() {
        let words = parse_vocabulary(
            "abcde\nfghij\nklmno\npqrst\nuvwxy\nzzzzz\n",
            &VocabOptions::default(),
        );
        assert_eq!(words.len(), 5, "zzzzz repeats letters and must be dropped");

        let solution = solve(words, &SolverConfig::default()).unwrap();
        assert_eq!(solution.groups.len(), 1);
        let group = &solution.groups[0];
        assert_eq!(group.len(), 5);
        assert_eq!(group.letters().len(), 25);
        assert_eq!(group.letters().complement().to_string(), "z");
    }

    #[test]
    fn a_letter_shared_by_all_words_finds_nothing() {
        let words = vocab(&["abcde", "afghi", "ajklm", "anopq"]);
        let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Packed).unwrap();
        assert_eq!(matrix.edge_count(), 0);
        let groups = find_cliques(&matrix, &words, 2).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn pair_search_matches_edge_count() {
        let mut rng = XorShiftRng::seed_from_u64(0x7A12);
        let words = random_vocab(&mut rng, 30, 5);
        let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Packed).unwrap();
        let groups = find_cliques(&matrix, &words, 2).unwrap();
        assert_eq!(groups.len(), matrix.edge_count());
        assert_eq!(canonical(&groups), brute_force(&words, 2));
    }

    // -------------------------------------------------------------------------
    // Brute-force cross-checks
    // -------------------------------------------------------------------------

    #[test]
    fn matches_brute_force_enumeration() {
        let mut rng = XorShiftRng::seed_from_u64(0xDEADBEEF);
        for case in 0..12 {
            let words = random_vocab(&mut rng, 14, 3);
            for k in 2..=4 {
                let expected = brute_force(&words, k);
                for repr in [MatrixRepr::Packed, MatrixRepr::Expanded] {
                    let matrix = CompatibilityMatrix::build(&words, repr).unwrap();
                    let groups = find_cliques(&matrix, &words, k).unwrap();
                    assert_eq!(
                        canonical(&groups),
                        expected,
                        "case {case}, k={k}, {repr} matrix"
                    );
                }
            }
        }
    }

    #[test]
    fn deep_groups_match_brute_force() {
        // Two-letter words allow groups far deeper than the usual k=5.
        let mut rng = XorShiftRng::seed_from_u64(0xFEED);
        let words = random_vocab(&mut rng, 16, 2);
        for k in [5usize, 6, 7] {
            let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Packed).unwrap();
            let groups = find_cliques(&matrix, &words, k).unwrap();
            assert_eq!(canonical(&groups), brute_force(&words, k), "k={k}");
        }
    }

    // -------------------------------------------------------------------------
    // Invariance tests
    // -------------------------------------------------------------------------

    #[test]
    fn reordering_does_not_change_the_result_set() {
        let mut rng = XorShiftRng::seed_from_u64(0x0DD5);
        let words = random_vocab(&mut rng, 40, 4);
        let base = SolverConfig {
            group_size: 3,
            ..SolverConfig::default()
        };
        let with = solve(words.clone(), &base).unwrap();
        let without = solve(
            words,
            &SolverConfig {
                reorder: false,
                ..base
            },
        )
        .unwrap();
        assert_eq!(canonical(&with.groups), canonical(&without.groups));
        assert!(with.permutation.is_some());
        assert!(without.permutation.is_none());
    }

    #[test]
    fn representation_does_not_change_the_result_set() {
        let mut rng = XorShiftRng::seed_from_u64(0x2E92);
        let words = random_vocab(&mut rng, 40, 4);
        let base = SolverConfig {
            group_size: 3,
            ..SolverConfig::default()
        };
        let packed = solve(words.clone(), &base).unwrap();
        let expanded = solve(
            words,
            &SolverConfig {
                repr: MatrixRepr::Expanded,
                ..base
            },
        )
        .unwrap();
        assert_eq!(canonical(&packed.groups), canonical(&expanded.groups));
    }

    #[test]
    fn thread_count_does_not_change_the_result_set() {
        let mut rng = XorShiftRng::seed_from_u64(0x7124D);
        let words = random_vocab(&mut rng, 50, 4);
        let base = SolverConfig {
            group_size: 3,
            threads: 1,
            ..SolverConfig::default()
        };
        let single = solve(words.clone(), &base).unwrap();
        let multi = solve(words, &SolverConfig { threads: 4, ..base }).unwrap();
        assert_eq!(canonical(&single.groups), canonical(&multi.groups));
    }

    // -------------------------------------------------------------------------
    // Result validity tests
    // -------------------------------------------------------------------------

    #[test]
    fn emitted_groups_are_valid_and_distinct() {
        let mut rng = XorShiftRng::seed_from_u64(0x6001);
        let words = random_vocab(&mut rng, 60, 5);
        // Random five-letter vocabularies rarely reach k=5; k=3 keeps the
        // assertion meaningful.
        let solution = solve(
            words,
            &SolverConfig {
                group_size: 3,
                ..SolverConfig::default()
            },
        )
        .unwrap();
        verify_groups(&solution.groups, 3).unwrap();
    }

    #[test]
    fn solution_permutation_tracks_original_indices() {
        let original = vocab(&["abcde", "fghij", "klmno", "pqrst", "uvwxy"]);
        let solution = solve(original.clone(), &SolverConfig::default()).unwrap();
        let perm = solution.permutation.as_ref().unwrap();
        assert_eq!(perm.len(), original.len());
        for (p, &orig) in perm.iter().enumerate() {
            assert_eq!(solution.words[p], original[orig], "position {p}");
        }
    }

    // -------------------------------------------------------------------------
    // Validation and edge-case tests
    // -------------------------------------------------------------------------

    #[test]
    fn rejects_group_size_below_two() {
        let words = vocab(&["fjord", "waltz"]);
        let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Packed).unwrap();
        for k in [0usize, 1] {
            let err = find_cliques(&matrix, &words, k).unwrap_err();
            assert_eq!(err, SearchError::InvalidGroupSize { group_size: k });
            let err = solve(
                words.clone(),
                &SolverConfig {
                    group_size: k,
                    ..SolverConfig::default()
                },
            )
            .unwrap_err();
            assert_eq!(err, SearchError::InvalidGroupSize { group_size: k });
        }
    }

    #[test]
    fn rejects_mismatched_word_list() {
        let words = vocab(&["fjord", "waltz", "nymph"]);
        let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Packed).unwrap();
        let err = find_cliques(&matrix, &words[..2], 2).unwrap_err();
        assert_eq!(
            err,
            SearchError::WordListMismatch {
                matrix: 3,
                words: 2
            }
        );
    }

    #[test]
    fn empty_vocabulary_is_a_clean_success() {
        let solution = solve(Vec::new(), &SolverConfig::default()).unwrap();
        assert!(solution.groups.is_empty());
        assert!(solution.words.is_empty());
        assert_eq!(solution.matrix.n(), 0);
    }

    #[test]
    fn group_size_larger_than_vocabulary_finds_nothing() {
        let words = vocab(&["fjord", "waltz"]);
        let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Packed).unwrap();
        let groups = find_cliques(&matrix, &words, 3).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn error_display_is_specific() {
        let err = SearchError::InvalidGroupSize { group_size: 1 };
        assert!(err.to_string().contains("at least 2"));
        let err = SearchError::WordListMismatch {
            matrix: 10,
            words: 7,
        };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains('7'));
        let err = SearchError::Matrix(MatrixError::Allocation { bytes: 64 });
        assert!(err.to_string().contains("64 bytes"));
    }
}
