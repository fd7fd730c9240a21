// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

pub(crate) mod tests;

use std::collections::BTreeMap;
use nfalex_core::class::{BitVec256, ClassTables, ClassTest};
use nfalex_core::{BitVecId, ClassId, PageId, PageMapId};
use crate::segments::{Seg, Segments};

// ---------------------------------------------------------------------------------------------

/// Compiles character classes into [ClassTest] objects.
///
/// The 256-bit page tables, the page maps, and the class tests are interned: identical
/// tables get the same ID, assigned in the order they're first compiled. Two lexical states
/// using the same class share all of its tables.
#[derive(Clone, Debug, Default)]
pub struct ClassCompiler {
    bit_vector_ids: BTreeMap<BitVec256, BitVecId>,
    bit_vectors: Vec<BitVec256>,
    page_map_ids: BTreeMap<Vec<(PageId, BitVecId)>, PageMapId>,
    page_maps: Vec<(u32, u32)>,
    page_entries: Vec<(PageId, BitVecId)>,
    class_ids: BTreeMap<ClassTest, ClassId>,
    classes: Vec<ClassTest>,
}

impl ClassCompiler {
    pub fn new() -> Self {
        ClassCompiler::default()
    }

    pub fn intern_bit_vector(&mut self, bit_vector: BitVec256) -> BitVecId {
        if let Some(&id) = self.bit_vector_ids.get(&bit_vector) {
            id
        } else {
            let id = self.bit_vectors.len() as BitVecId;
            self.bit_vector_ids.insert(bit_vector, id);
            self.bit_vectors.push(bit_vector);
            id
        }
    }

    fn intern_page_map(&mut self, entries: Vec<(PageId, BitVecId)>) -> PageMapId {
        if let Some(&id) = self.page_map_ids.get(&entries) {
            id
        } else {
            let id = self.page_maps.len() as PageMapId;
            let first = self.page_entries.len() as u32;
            self.page_entries.extend(entries.iter().copied());
            self.page_maps.push((first, self.page_entries.len() as u32));
            self.page_map_ids.insert(entries, id);
            id
        }
    }

    /// Compiles normalized segments: the codepoints < 128 go to the ASCII words, the others to the
    /// pages they belong to. Page 0 only holds the bits >= 128.
    pub fn compile(&mut self, segments: &Segments) -> ClassTest {
        let mut ascii = [0_u64; 2];
        let mut pages = BTreeMap::<PageId, BitVec256>::new();
        for &Seg(first, last) in segments.iter() {
            if first < 128 {
                for code in first..=last.min(127) {
                    ascii[(code >> 6) as usize] |= 1 << (code & 63);
                }
            }
            if last >= 128 {
                let low = first.max(128);
                let (low_page, high_page) = (low >> 8, last >> 8);
                for page in low_page..=high_page {
                    let first_bit = if page == low_page { (low & 0xff) as u8 } else { 0 };
                    let last_bit = if page == high_page { (last & 0xff) as u8 } else { 255 };
                    pages.entry(page as PageId).or_default().set_range(first_bit, last_bit);
                }
            }
        }
        let pages = if pages.is_empty() {
            None
        } else {
            let entries = pages.into_iter()
                .map(|(page, bit_vector)| (page, self.intern_bit_vector(bit_vector)))
                .collect::<Vec<_>>();
            Some(self.intern_page_map(entries))
        };
        ClassTest { ascii, pages }
    }

    /// Compiles the segments and interns the resulting test.
    pub fn intern_class(&mut self, segments: &Segments) -> ClassId {
        let test = self.compile(segments);
        if let Some(&id) = self.class_ids.get(&test) {
            id
        } else {
            let id = self.classes.len() as ClassId;
            self.class_ids.insert(test, id);
            self.classes.push(test);
            id
        }
    }

    pub fn get_class(&self, id: ClassId) -> &ClassTest {
        &self.classes[id as usize]
    }

    pub fn nbr_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn nbr_bit_vectors(&self) -> usize {
        self.bit_vectors.len()
    }

    pub fn tables(&self) -> ClassTables<'_> {
        ClassTables { bit_vectors: &self.bit_vectors, page_maps: &self.page_maps, page_entries: &self.page_entries }
    }

    pub fn into_tables(self) -> CharClassTables {
        CharClassTables {
            classes: self.classes,
            bit_vectors: self.bit_vectors,
            page_maps: self.page_maps,
            page_entries: self.page_entries,
        }
    }
}

/// Owned class tables produced by a [ClassCompiler].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CharClassTables {
    pub classes: Vec<ClassTest>,
    pub bit_vectors: Vec<BitVec256>,
    pub page_maps: Vec<(u32, u32)>,
    pub page_entries: Vec<(PageId, BitVecId)>,
}

impl CharClassTables {
    pub fn class_tables(&self) -> ClassTables<'_> {
        ClassTables { bit_vectors: &self.bit_vectors, page_maps: &self.page_maps, page_entries: &self.page_entries }
    }

    /// Tests `c` against the class `id`.
    pub fn matches(&self, id: ClassId, c: char) -> bool {
        self.classes[id as usize].matches(c, &self.class_tables())
    }
}
