//! Keyword membership bitmap
//!
//! Bit-packed `batch × V` membership table for a contiguous range of
//! keywords. Rows are padded to whole `u32` words so the same buffer can be
//! uploaded to the GPU unchanged.

use super::GraphSnapshot;
use std::ops::Range;

/// Bits per bitmap word
pub const BITS_PER_WORD: usize = 32;

/// Membership bitmap for keywords `keywords.start..keywords.end`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordBitmap {
    keywords: Range<usize>,
    num_vertices: usize,
    words_per_row: usize,
    words: Vec<u32>,
}

impl KeywordBitmap {
    /// Empty bitmap (no memberships) for a keyword range
    #[must_use]
    pub fn new(keywords: Range<usize>, num_vertices: usize) -> Self {
        let words_per_row = num_vertices.div_ceil(BITS_PER_WORD);
        let rows = keywords.len();
        Self {
            keywords,
            num_vertices,
            words_per_row,
            words: vec![0; rows * words_per_row],
        }
    }

    /// Build rows for `keywords` from a snapshot's keyword holders
    #[must_use]
    pub fn from_snapshot(snapshot: &GraphSnapshot, keywords: Range<usize>) -> Self {
        let mut bitmap = Self::new(keywords.clone(), snapshot.num_vertices());
        for (row, keyword) in keywords.enumerate() {
            for &vertex in snapshot.sources(keyword) {
                bitmap.insert(row, vertex as usize);
            }
        }
        bitmap
    }

    /// Mark `vertex` as holding the keyword of `row`
    ///
    /// Out-of-range positions are ignored.
    pub fn insert(&mut self, row: usize, vertex: usize) {
        if row >= self.num_rows() || vertex >= self.num_vertices {
            return;
        }
        let word = row * self.words_per_row + vertex / BITS_PER_WORD;
        self.words[word] |= 1 << (vertex % BITS_PER_WORD);
    }

    /// Whether `vertex` holds the keyword of `row`
    #[must_use]
    pub fn contains(&self, row: usize, vertex: usize) -> bool {
        if row >= self.num_rows() || vertex >= self.num_vertices {
            return false;
        }
        let word = row * self.words_per_row + vertex / BITS_PER_WORD;
        (self.words[word] >> (vertex % BITS_PER_WORD)) & 1 == 1
    }

    /// Source vertices of `row`, ascending
    pub fn sources(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_vertices).filter(move |&v| self.contains(row, v))
    }

    /// Keyword range covered by this bitmap
    #[must_use]
    pub fn keywords(&self) -> Range<usize> {
        self.keywords.clone()
    }

    /// Number of keyword rows
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.keywords.len()
    }

    /// Vertex columns per row
    #[must_use]
    pub const fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Padded `u32` words per row
    #[must_use]
    pub const fn words_per_row(&self) -> usize {
        self.words_per_row
    }

    /// Raw words, row-major (GPU upload layout)
    #[must_use]
    pub fn words(&self) -> &[u32] {
        &self.words
    }
}
