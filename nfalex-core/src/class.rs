// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

use std::fmt::{Debug, Display, Formatter};
use crate::{BitVecId, PageId, PageMapId};

// ---------------------------------------------------------------------------------------------
// Character-class tests
//
// A class is tested in two ways, depending on the codepoint:
// - 0..=127:  bit `c` of the inline `ascii` words, without indirection
// - 128..:    the page `c >> 8` is looked up in the class's page map (sorted by page), then
//             bit `c & 0xff` is tested in the page's 256-bit table
//
// Page tables are shared between classes, and so are page maps.

/// 256-bit membership table of one page of 256 codepoints.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BitVec256(pub [u64; 4]);

impl BitVec256 {
    pub const EMPTY: BitVec256 = BitVec256([0; 4]);
    pub const FULL: BitVec256 = BitVec256([u64::MAX; 4]);

    #[inline]
    pub fn contains(&self, bit: u8) -> bool {
        (self.0[(bit >> 6) as usize] >> (bit & 63)) & 1 != 0
    }

    #[inline]
    pub fn set(&mut self, bit: u8) {
        self.0[(bit >> 6) as usize] |= 1 << (bit & 63);
    }

    /// Sets all the bits from `first` to `last`, inclusive.
    pub fn set_range(&mut self, first: u8, last: u8) {
        for bit in first..=last {
            self.set(bit);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; 4]
    }

    pub fn count(&self) -> u32 {
        self.0.iter().map(|w| w.count_ones()).sum()
    }
}

impl Debug for BitVec256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BitVec256([0x{:016x}, 0x{:016x}, 0x{:016x}, 0x{:016x}])", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl Display for BitVec256 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}_{:016x}_{:016x}_{:016x}", self.0[3], self.0[2], self.0[1], self.0[0])
    }
}

/// Compiled test of a character class: inline ASCII words and an optional page map for the
/// codepoints >= 128.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClassTest {
    pub ascii: [u64; 2],
    pub pages: Option<PageMapId>,
}

impl ClassTest {
    #[inline]
    pub fn matches_ascii(&self, byte: u8) -> bool {
        byte < 128 && (self.ascii[(byte >> 6) as usize] >> (byte & 63)) & 1 != 0
    }

    #[inline]
    pub fn matches(&self, c: char, tables: &ClassTables) -> bool {
        let code = c as u32;
        if code < 128 {
            self.matches_ascii(code as u8)
        } else if let Some(map) = self.pages {
            tables.contains(map, code)
        } else {
            false
        }
    }

    pub fn is_ascii_only(&self) -> bool {
        self.pages.is_none()
    }
}

/// Tables shared by all the class tests of a lexer.
///
/// The page map `m` is the slice `page_entries[page_maps[m].0..page_maps[m].1]`, sorted by page.
#[derive(Clone, Copy, Debug)]
pub struct ClassTables<'a> {
    pub bit_vectors: &'a [BitVec256],
    pub page_maps: &'a [(u32, u32)],
    pub page_entries: &'a [(PageId, BitVecId)],
}

impl<'a> ClassTables<'a> {
    pub fn page_map(&self, map: PageMapId) -> &'a [(PageId, BitVecId)] {
        let (first, end) = self.page_maps[map as usize];
        &self.page_entries[first as usize..end as usize]
    }

    /// Tests a codepoint >= 128 against the page map `map`.
    #[inline]
    pub fn contains(&self, map: PageMapId, code: u32) -> bool {
        let page = (code >> 8) as PageId;
        let entries = self.page_map(map);
        match entries.binary_search_by_key(&page, |&(p, _)| p) {
            Ok(i) => self.bit_vectors[entries[i].1 as usize].contains((code & 0xff) as u8),
            Err(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------------------------
