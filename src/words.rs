//! Words, letter sets, and vocabulary preparation.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

// ============================================================================
// Alphabet constants
// ============================================================================

/// Number of letters in the alphabet; letter sets are bitmasks over this range.
pub const ALPHABET_LEN: usize = 26;

/// Returns the largest group size worth searching for at this word length:
/// `word_len * k` distinct letters must fit in the alphabet, so `k` tops out
/// at `26 / word_len` (5 for five-letter words).
///
/// # Panics
/// Panics if `word_len` is zero.
#[inline]
pub const fn default_group_size(word_len: usize) -> usize {
    ALPHABET_LEN / word_len
}

// ============================================================================
// LetterSet
// ============================================================================

/// A set of letters packed into the low 26 bits of a `u32`.
///
/// Bit `i` is set iff letter `'a' + i` is present. Disjointness of two sets
/// is a single AND, which is what makes the pairwise compatibility test and
/// the adjacency matrix build cheap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LetterSet(u32);

impl LetterSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// The full alphabet.
    pub const FULL: Self = Self((1 << ALPHABET_LEN) - 1);

    /// Returns the raw bitmask.
    #[inline(always)]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns the number of letters in the set.
    #[inline(always)]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns whether the set contains no letters.
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns whether `letter` (an ASCII lowercase letter) is in the set.
    #[inline(always)]
    pub const fn contains(self, letter: char) -> bool {
        letter.is_ascii_lowercase() && (self.0 >> (letter as u32 - 'a' as u32)) & 1 != 0
    }

    /// Returns whether the two sets share no letter.
    #[inline(always)]
    pub const fn is_disjoint(self, other: Self) -> bool {
        self.0 & other.0 == 0
    }

    /// Returns the union of the two sets.
    #[inline(always)]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns the letters of the alphabet NOT in the set.
    #[inline(always)]
    pub const fn complement(self) -> Self {
        Self(Self::FULL.0 & !self.0)
    }

    /// Iterates the contained letters in alphabetical order.
    #[inline]
    pub fn letters(self) -> Letters {
        Letters(self.0)
    }
}

impl fmt::Display for LetterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for letter in self.letters() {
            write!(f, "{letter}")?;
        }
        Ok(())
    }
}

/// Ascending iterator over the letters of a [`LetterSet`].
#[derive(Clone, Debug)]
pub struct Letters(u32);

impl Iterator for Letters {
    type Item = char;

    #[inline]
    fn next(&mut self) -> Option<char> {
        if self.0 == 0 {
            return None;
        }
        let i = self.0.trailing_zeros();
        self.0 &= self.0 - 1; // Clear lowest set bit
        Some((b'a' + i as u8) as char)
    }
}

// ============================================================================
// Word
// ============================================================================

/// A single word with its letter set precomputed at parse time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Word {
    text: Box<str>,
    letters: LetterSet,
}

impl Word {
    /// Parses `text` into a word of exactly `word_len` letters.
    ///
    /// Returns `None` when the trimmed text has the wrong length, contains
    /// anything other than ASCII letters, or repeats a letter. A repeated
    /// letter disqualifies a word outright: it could never be part of a
    /// fully letter-disjoint group of maximal coverage. Case is folded; the
    /// stored text is lowercase.
    pub fn parse(text: &str, word_len: usize) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.len() != word_len {
            return None;
        }
        let mut mask = 0u32;
        let mut lower = String::with_capacity(word_len);
        for b in trimmed.bytes() {
            if !b.is_ascii_alphabetic() {
                return None;
            }
            let b = b.to_ascii_lowercase();
            let bit = 1u32 << (b - b'a');
            if mask & bit != 0 {
                return None; // repeated letter
            }
            mask |= bit;
            lower.push(b as char);
        }
        Some(Self {
            text: lower.into_boxed_str(),
            letters: LetterSet(mask),
        })
    }

    /// The lowercase text.
    #[inline(always)]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The set of letters in the word.
    #[inline(always)]
    pub fn letters(&self) -> LetterSet {
        self.letters
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Returns whether two words share no letter.
#[inline(always)]
pub fn compatible(a: &Word, b: &Word) -> bool {
    a.letters.is_disjoint(b.letters)
}

// ============================================================================
// Vocabulary preparation
// ============================================================================

/// Options controlling vocabulary preparation.
#[derive(Clone, Debug)]
pub struct VocabOptions {
    /// Required word length; words of any other length are dropped.
    pub word_len: usize,
    /// Collapse each set of mutual anagrams to its first occurrence.
    ///
    /// Anagrams have identical letter sets and therefore identical
    /// compatibility rows; keeping one representative shrinks the matrix
    /// without changing which letter combinations are reachable.
    pub dedup_anagrams: bool,
}

impl Default for VocabOptions {
    fn default() -> Self {
        Self {
            word_len: 5,
            dedup_anagrams: true,
        }
    }
}

/// Parses a newline-separated word list, preserving source order.
///
/// Lines that fail [`Word::parse`] are dropped silently; they are policy
/// exclusions, not errors. Exact duplicates are always dropped. With
/// `dedup_anagrams` set, a word whose letter set was already seen is
/// dropped too, so the first spelling in the list represents its whole
/// anagram class.
pub fn parse_vocabulary(text: &str, opts: &VocabOptions) -> Vec<Word> {
    let mut words = Vec::new();
    let mut seen_sets: HashSet<LetterSet> = HashSet::new();
    let mut seen_texts: HashSet<Box<str>> = HashSet::new();

    for line in text.lines() {
        let Some(word) = Word::parse(line, opts.word_len) else {
            continue;
        };
        if opts.dedup_anagrams {
            if !seen_sets.insert(word.letters) {
                continue;
            }
        } else if !seen_texts.insert(word.text.clone()) {
            continue;
        }
        words.push(word);
    }
    words
}

/// Reads a newline-separated word list from a file and prepares it.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn load_vocabulary(path: impl AsRef<Path>, opts: &VocabOptions) -> io::Result<Vec<Word>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_vocabulary(&text, opts))
}

// ============================================================================
// Tests
// ============================================================================
