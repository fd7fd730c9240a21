// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

#![cfg(test)]

use proptest::prelude::*;
use crate::segments;
use super::*;

#[test]
fn compile_ascii() {
    let mut compiler = ClassCompiler::new();
    let test = compiler.compile(&segments!['a'-'z', '_']);
    assert_eq!(test.pages, None);
    let tables = compiler.tables();
    for (idx, (c, expected)) in [('a', true), ('z', true), ('_', true), ('A', false), ('\u{80}', false), ('é', false)].into_iter().enumerate() {
        assert_eq!(test.matches(c, &tables), expected, "test {idx} failed");
    }
    assert_eq!(compiler.nbr_bit_vectors(), 0);
}

#[test]
fn compile_pages() {
    let mut compiler = ClassCompiler::new();
    // page 0 only holds the bits >= 128
    let latin1 = compiler.compile(&segments![0x70-0xff]);
    assert_eq!(latin1.ascii, [0, 0xffff_0000_0000_0000]);
    let map = compiler.tables().page_map(latin1.pages.expect("page map"));
    assert_eq!(map.len(), 1);
    assert_eq!(map[0].0, 0);
    let page0 = compiler.tables().bit_vectors[map[0].1 as usize];
    assert_eq!(page0, BitVec256([0, 0, u64::MAX, u64::MAX]));

    // segment across two pages
    let across = compiler.compile(&segments![0x1f0-0x210]);
    let map = compiler.tables().page_map(across.pages.expect("page map")).to_vec();
    assert_eq!(map.iter().map(|&(page, _)| page).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(compiler.tables().bit_vectors[map[0].1 as usize].count(), 16);
    assert_eq!(compiler.tables().bit_vectors[map[1].1 as usize].count(), 17);
    let tables = compiler.tables();
    for (idx, (c, expected)) in [('\u{1ef}', false), ('\u{1f0}', true), ('\u{200}', true), ('\u{210}', true), ('\u{211}', false)].into_iter().enumerate() {
        assert_eq!(across.matches(c, &tables), expected, "test {idx} failed");
    }
}

#[test]
fn intern_shared_tables() {
    let mut compiler = ClassCompiler::new();
    let a = compiler.intern_class(&segments![0x100-0x1ff]);
    let b = compiler.intern_class(&segments!['a', 0x100-0x2ff]);
    let c = compiler.intern_class(&segments![0x100-0x1ff]);
    assert_eq!((a, b, c), (0, 1, 0));
    assert_eq!(compiler.nbr_classes(), 2);
    // the full page is shared by the two classes
    assert_eq!(compiler.nbr_bit_vectors(), 1);
    let tables = compiler.into_tables();
    assert_eq!(tables.bit_vectors, vec![BitVec256::FULL]);
    assert_eq!(tables.page_maps, vec![(0, 1), (1, 3)]);
    assert_eq!(tables.page_entries, vec![(1, 0), (1, 0), (2, 0)]);
    assert!(tables.matches(b, 'a'));
    assert!(tables.matches(b, '\u{2ff}'));
    assert!(!tables.matches(a, '\u{2ff}'));
}

#[test]
fn intern_order() {
    let classes = [segments![0x400-0x4ff], segments!['0'-'9'], segments![0x3b1-0x3c9], segments![0x400-0x4ff]];
    let mut c1 = ClassCompiler::new();
    let ids1 = classes.iter().map(|s| c1.intern_class(s)).collect::<Vec<_>>();
    let mut c2 = ClassCompiler::new();
    let ids2 = classes.iter().map(|s| c2.intern_class(s)).collect::<Vec<_>>();
    assert_eq!(ids1, vec![0, 1, 2, 0]);
    assert_eq!(ids1, ids2);
    assert_eq!(c1.into_tables(), c2.into_tables());
}

fn arb_ranges() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((0_u32..0x800, 0_u32..0x300), 0..6)
        .prop_map(|v| v.into_iter().map(|(first, len)| (first, first + len)).collect())
}

proptest! {
    #[test]
    fn compiled_class_matches_ranges(ranges in arb_ranges(), codes in prop::collection::vec(0_u32..0xc00, 1..40)) {
        let segments = ranges.iter().map(|&(a, b)| Seg(a, b)).collect::<Segments>().normalized();
        let mut compiler = ClassCompiler::new();
        let id = compiler.intern_class(&segments);
        let tables = compiler.into_tables();
        let in_ranges = |code: u32| ranges.iter().any(|&(a, b)| a <= code && code <= b);
        for code in codes {
            let c = char::from_u32(code).unwrap();
            prop_assert_eq!(tables.matches(id, c), in_ranges(code), "code 0x{:x}", code);
        }
        for &(a, b) in &ranges {
            for code in [a, b] {
                let c = char::from_u32(code).unwrap();
                prop_assert!(tables.matches(id, c), "bound 0x{:x}", code);
            }
        }
    }
}
