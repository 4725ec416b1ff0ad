//! Word groups: the materialized output of a search.

use crate::words::{compatible, LetterSet, Word};
use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};

// ============================================================================
// WordGroup
// ============================================================================

/// A group of words whose letters are pairwise disjoint.
///
/// The joint letter set is derived once at construction; for a valid group
/// of `k` words of length `l` it always holds `k * l` letters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordGroup {
    members: Vec<Word>,
    letters: LetterSet,
}

impl WordGroup {
    /// Creates a group and derives its joint letter set.
    pub fn new(members: Vec<Word>) -> Self {
        let letters = members
            .iter()
            .fold(LetterSet::EMPTY, |acc, w| acc.union(w.letters()));
        Self { members, letters }
    }

    /// Member words in their current order.
    #[inline]
    pub fn members(&self) -> &[Word] {
        &self.members
    }

    /// Union of every member's letters.
    #[inline]
    pub fn letters(&self) -> LetterSet {
        self.letters
    }

    /// Number of member words.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the group has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sorts the members lexicographically in place.
    pub fn sort_members(&mut self) {
        self.members.sort_by(|a, b| a.text().cmp(b.text()));
    }

    /// Returns whether every pair of members is letter-disjoint.
    pub fn is_letter_disjoint(&self) -> bool {
        self.members
            .iter()
            .enumerate()
            .all(|(i, a)| self.members[i + 1..].iter().all(|b| compatible(a, b)))
    }
}

impl fmt::Display for WordGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{word}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Canonical ordering and export
// ============================================================================

/// Sorts members within each group, then the groups themselves.
///
/// The search emits groups in whatever order its workers finish, so two
/// runs only compare (or diff) cleanly after this pass.
pub fn canonical_order(groups: &mut [WordGroup]) {
    for group in groups.iter_mut() {
        group.sort_members();
    }
    groups.sort_by(|a, b| {
        let ta = a.members.iter().map(Word::text);
        let tb = b.members.iter().map(Word::text);
        ta.cmp(tb)
    });
}

/// Writes one line per group, members separated by tabs.
///
/// # Errors
/// Returns an error if the writer fails.
pub fn write_tsv<W: Write>(groups: &[WordGroup], mut out: W) -> io::Result<()> {
    for group in groups {
        for (i, word) in group.members.iter().enumerate() {
            if i > 0 {
                write!(out, "\t")?;
            }
            write!(out, "{word}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

// ============================================================================
// Verification
// ============================================================================

/// Re-checks every group against the rules the search enforces: exact
/// size, distinct members, pairwise-disjoint letters with the full joint
/// letter count, and no two groups with the same member set.
///
/// # Errors
/// Returns a description of the first violation found.
pub fn verify_groups(groups: &[WordGroup], group_size: usize) -> Result<(), String> {
    let mut seen: HashSet<Vec<&str>> = HashSet::with_capacity(groups.len());
    for (gi, group) in groups.iter().enumerate() {
        if group.len() != group_size {
            return Err(format!(
                "group {gi} has {} words, expected {group_size}",
                group.len()
            ));
        }
        for (a, wa) in group.members.iter().enumerate() {
            for wb in &group.members[a + 1..] {
                if wa.text() == wb.text() {
                    return Err(format!("group {gi} repeats the word {:?}", wa.text()));
                }
                if !compatible(wa, wb) {
                    return Err(format!(
                        "group {gi} contains {:?} and {:?}, which share a letter",
                        wa.text(),
                        wb.text()
                    ));
                }
            }
        }
        let word_len = group.members.first().map_or(0, |w| w.text().len());
        let expected = group_size * word_len;
        if group.letters.len() != expected {
            return Err(format!(
                "group {gi} covers {} letters, expected {expected}",
                group.letters.len()
            ));
        }
        let mut key: Vec<&str> = group.members.iter().map(Word::text).collect();
        key.sort_unstable();
        if !seen.insert(key) {
            return Err(format!("group {gi} duplicates an earlier group"));
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
