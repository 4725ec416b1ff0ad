//! Ascending-degree vertex reordering.

use crate::matrix::{CompatibilityMatrix, MatrixError};
use crate::words::Word;

/// A matrix and word list permuted into ascending-degree order.
#[derive(Clone, Debug)]
pub struct Reordered {
    /// The reindexed matrix.
    pub matrix: CompatibilityMatrix,
    /// The word list, permuted in lockstep with the matrix.
    pub words: Vec<Word>,
    /// `permutation[p]` is the original index of the word now at position `p`.
    pub permutation: Vec<usize>,
}

/// Returns the word indices sorted by ascending degree, ties broken by
/// original index. Deterministic for a given matrix.
pub fn degree_permutation(matrix: &CompatibilityMatrix) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..matrix.n()).collect();
    perm.sort_by_key(|&i| (matrix.degree(i), i));
    perm
}

/// Permutes the matrix and its word list into ascending-degree order.
///
/// Low-degree words go first, so the search roots its outer loop where
/// candidate sets are smallest and the intersection bound bites early. On
/// natural vocabularies this cuts the search time by roughly an order of
/// magnitude; the result set never depends on it.
///
/// # Errors
/// Returns an error if the reindexed matrix cannot be allocated.
pub fn reorder_by_degree(
    matrix: &CompatibilityMatrix,
    words: &[Word],
) -> Result<Reordered, MatrixError> {
    debug_assert_eq!(matrix.n(), words.len());
    let permutation = degree_permutation(matrix);
    let matrix = matrix.permuted(&permutation)?;
    let words = permutation.iter().map(|&i| words[i].clone()).collect();
    Ok(Reordered {
        matrix,
        words,
        permutation,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MatrixRepr;
    use crate::words::{parse_vocabulary, VocabOptions};
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

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

    #[test]
    fn degrees_ascend_after_reordering() {
        let mut rng = XorShiftRng::seed_from_u64(0xDE6);
        let words = random_vocab(&mut rng, 80, 5);
        for repr in [MatrixRepr::Packed, MatrixRepr::Expanded] {
            let matrix = CompatibilityMatrix::build(&words, repr).unwrap();
            let reordered = reorder_by_degree(&matrix, &words).unwrap();
            for p in 1..reordered.matrix.n() {
                assert!(
                    reordered.matrix.degree(p - 1) <= reordered.matrix.degree(p),
                    "degree dropped at position {p}"
                );
            }
        }
    }

    #[test]
    fn words_follow_the_matrix() {
        let mut rng = XorShiftRng::seed_from_u64(0xF00D);
        let words = random_vocab(&mut rng, 50, 5);
        let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Packed).unwrap();
        let reordered = reorder_by_degree(&matrix, &words).unwrap();

        assert_eq!(reordered.words.len(), words.len());
        for (p, &orig) in reordered.permutation.iter().enumerate() {
            assert_eq!(reordered.words[p], words[orig], "word at position {p}");
            assert_eq!(
                reordered.matrix.degree(p),
                matrix.degree(orig),
                "degree at position {p}"
            );
        }
    }

    #[test]
    fn adjacency_is_preserved_under_relabeling() {
        let mut rng = XorShiftRng::seed_from_u64(0xADA4);
        let words = random_vocab(&mut rng, 40, 5);
        let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Expanded).unwrap();
        let reordered = reorder_by_degree(&matrix, &words).unwrap();
        let perm = &reordered.permutation;
        for p in 0..matrix.n() {
            for q in 0..matrix.n() {
                assert_eq!(
                    reordered.matrix.contains(p, q),
                    matrix.contains(perm[p], perm[q]),
                    "cell ({p},{q})"
                );
            }
        }
    }

    #[test]
    fn ties_break_by_original_index() {
        // Anagram-free vocabulary where every word has the same degree by
        // symmetry: four words on two disjoint letter pools.
        let words = parse_vocabulary("abcde\nfghij\nklmno\npqrst\n", &VocabOptions::default());
        let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Packed).unwrap();
        let perm = degree_permutation(&matrix);
        assert_eq!(perm, vec![0, 1, 2, 3]);
    }

    #[test]
    fn reordering_an_ordered_matrix_is_identity() {
        let mut rng = XorShiftRng::seed_from_u64(0x1D);
        let words = random_vocab(&mut rng, 30, 5);
        let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Packed).unwrap();
        let once = reorder_by_degree(&matrix, &words).unwrap();
        let again = degree_permutation(&once.matrix);
        let identity: Vec<usize> = (0..once.matrix.n()).collect();
        assert_eq!(again, identity);
    }

    #[test]
    fn empty_vocabulary_reorders_to_empty() {
        let matrix = CompatibilityMatrix::build(&[], MatrixRepr::Packed).unwrap();
        let reordered = reorder_by_degree(&matrix, &[]).unwrap();
        assert!(reordered.words.is_empty());
        assert!(reordered.permutation.is_empty());
        assert_eq!(reordered.matrix.n(), 0);
    }
}
