//! # wordclique
//!
//! Finds every group of fixed-length words whose letters are pairwise
//! disjoint: the k-cliques of the word-compatibility graph.
//!
//! This crate provides:
//! - Letter-set words and vocabulary preparation (length/letter filters,
//!   anagram reduction).
//! - A dense symmetric compatibility matrix in a **packed** (1 bit/cell) or
//!   **expanded** (1 byte/cell) layout, built in parallel.
//! - Ascending-degree reordering, which starts the search where candidate
//!   sets are smallest.
//! - A pruned, parallel, exhaustive clique enumeration with per-worker
//!   result buffers merged once at the end.
//!
//! ## Quick Start
//!
//! ```
//! use wordclique::prelude::*;
//!
//! let text = "fjord\ngucks\nnymph\nvibex\nwaltz\ntreck\n";
//! let words = parse_vocabulary(text, &VocabOptions::default());
//! let solution = solve(words, &SolverConfig::default()).unwrap();
//!
//! assert_eq!(solution.groups.len(), 1);
//! assert_eq!(solution.groups[0].letters().len(), 25);
//! ```
//!
//! ## Working with the Matrix Directly
//!
//! ```
//! use wordclique::prelude::*;
//!
//! let words = parse_vocabulary("birch\ngawky\nchair\n", &VocabOptions::default());
//! let matrix = CompatibilityMatrix::build(&words, MatrixRepr::Packed).unwrap();
//!
//! // "birch" and "gawky" share no letter; "birch" and "chair" do.
//! assert!(matrix.contains(0, 1));
//! assert!(!matrix.contains(0, 2));
//! assert_eq!(matrix.degree(0), 1);
//!
//! let groups = find_cliques(&matrix, &words, 2).unwrap();
//! assert_eq!(groups.len(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`words`]: Letter sets, word parsing, vocabulary loading.
//! - [`matrix`]: The compatibility matrix and its two storage layouts.
//! - [`order`]: Ascending-degree reordering.
//! - [`search`]: The parallel group enumeration.
//! - [`groups`]: Materialized groups, canonical ordering, export, verification.
//!
//! ## Performance Notes
//!
//! - Packed rows intersect and count 64 candidates per instruction; the
//!   expanded layout trades 8x the memory for direct indexing.
//! - Candidates are counted against the pruning bound before any
//!   intersection is materialized, so dead branches cost one scan.
//! - Ascending-degree ordering typically cuts the search by an order of
//!   magnitude on natural vocabularies.
//! - For maximum performance, compile with: `RUSTFLAGS="-C target-cpu=native" cargo build --release`

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::inline_always)] // Intentional for hot-path code
#![allow(clippy::needless_range_loop)] // Often clearer for matrix indexing
#![allow(clippy::multiple_crate_versions)] // Cargo.lock management is external

pub mod groups;
pub mod matrix;
pub mod order;
pub mod search;
pub mod words;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::groups::{canonical_order, verify_groups, write_tsv, WordGroup};
    pub use crate::matrix::{CompatibilityMatrix, MatrixError, MatrixRepr, NeighborSet};
    pub use crate::order::{degree_permutation, reorder_by_degree, Reordered};
    pub use crate::search::{find_cliques, solve, SearchError, Solution, SolverConfig};
    pub use crate::words::{
        compatible, default_group_size, load_vocabulary, parse_vocabulary, LetterSet,
        VocabOptions, Word,
    };
}
