// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};
use std::ops::{Deref, DerefMut, RangeInclusive};
use nfalex_core::char_reader::{escape_char, UTF8_GAP_MAX, UTF8_GAP_MIN, UTF8_MAX};

// ---------------------------------------------------------------------------------------------
// Segments

/// Set of codepoint ranges. The ranges may be adjacent or overlapping until the set is
/// [normalized](Segments::normalize).
#[derive(Clone, PartialEq, Default, PartialOrd, Eq, Ord, Hash)]
pub struct Segments(pub BTreeSet<Seg>);

impl Segments {
    #[inline]
    pub fn empty() -> Self {
        Segments(BTreeSet::new())
    }

    pub fn new(Seg(a, b): Seg) -> Self {
        if a <= b {
            Segments(BTreeSet::from([Seg(a, b)]))
        } else {
            Self::empty()
        }
    }

    pub fn insert(&mut self, seg: Seg) {
        if seg.0 <= seg.1 {
            self.0.insert(seg);
        }
    }

    pub fn from_char(char: char) -> Self {
        Segments(BTreeSet::from([Seg(char as u32, char as u32)]))
    }

    /// Checks if the codepoint is in the segments, which must be normalized.
    pub fn contains(&self, code: u32) -> bool {
        self.0.range(..=Seg(code, u32::MAX)).next_back().map(|seg| seg.1 >= code).unwrap_or(false)
    }

    // (a, b) inter (c, d) => (common, internal a-b, external a-b)
    // only processes a <= c || (a == c && b <= d)
    pub fn segment_intersect(Seg(a, b): Seg, Seg(c, d): Seg) -> SegmentsCmp {
        if a < c || (a == c && b <= d) {
            if a < c {
                if b < c {
                    SegmentsCmp { common: Segments::empty(), internal: Segments::new(Seg(a, b)), external: Segments::new(Seg(c, d)) }
                } else if b <= d {
                    SegmentsCmp { common: Segments::new(Seg(c, b)), internal: Segments::new(Seg(a, c - 1)), external: Segments::new(Seg(b + 1, d)) }
                } else {
                    SegmentsCmp { common: Segments::new(Seg(c, d)), internal: Segments::from([Seg(a, c - 1), Seg(d + 1, b)]), external: Segments::empty() }
                }
            } else {
                SegmentsCmp { common: Segments::new(Seg(a, b)), internal: Segments::empty(), external: Segments::new(Seg(b + 1, d)) }
            }
        } else {
            Self::segment_intersect(Seg(c, d), Seg(a, b)).inverse()
        }
    }

    pub fn intersect(&self, other: &Self) -> SegmentsCmp {
        let mut ab_iter = self.iter();
        let mut cd_iter = other.iter();
        let mut ab = ab_iter.next().cloned();
        let mut cd = cd_iter.next().cloned();
        let mut result = SegmentsCmp::empty();
        while let (Some(new_ab), Some(new_cd)) = (ab, cd) {
            let mut cmp = Self::segment_intersect(new_ab, new_cd);
            if cmp.common.is_empty() {
                if new_ab.1 < new_cd.0 {
                    result.internal.insert(new_ab);
                    ab = ab_iter.next().cloned();
                } else {
                    result.external.insert(new_cd);
                    cd = cd_iter.next().cloned();
                }
            } else {
                if new_ab.1 > new_cd.1 { // processes the trailing segment
                    ab = cmp.internal.pop_last();
                } else {
                    ab = ab_iter.next().cloned();
                }
                if new_cd.1 > new_ab.1 {
                    cd = cmp.external.pop_last();
                } else {
                    cd = cd_iter.next().cloned();
                }
                result.extend(&cmp);
            }
        }
        if let Some(ab) = ab {
            result.internal.insert(ab);
            result.internal.extend(ab_iter);
        } else if let Some(cd) = cd {
            result.external.insert(cd);
            result.external.extend(cd_iter);
        }
        result
    }

    /// Partitions the segments in function of `other`'s segments, splitting the current segments
    /// according to `other` and adding segments from `other`. Can be used iteratively on a collection
    /// of Segments to obtain a partition of their segments.
    ///
    /// Returns `true` if the segments were modified.
    ///
    /// Example:
    /// ```
    /// use nfalex_lib::segments::{Segments, Seg};
    ///
    /// let mut a = Segments::from([Seg(0, 10), Seg(20, 30)]);
    /// let b = Segments::from([Seg(5, 6), Seg(15, 25)]);
    /// assert!(a.add_partition(&b));
    /// assert_eq!(a, Segments::from([Seg(0, 4), Seg(5, 6), Seg(7, 10), Seg(15, 19), Seg(20, 25), Seg(26, 30)]));
    /// ```
    pub fn add_partition(&mut self, other: &Self) -> bool {
        let cmp = self.intersect(other);
        if !(cmp.common.is_empty() && cmp.external.is_empty()) {
            self.clear();
            self.extend(cmp.internal.0);
            self.extend(cmp.common.0);
            self.extend(cmp.external.0);
            true
        } else {
            false
        }
    }

    pub fn normalize(&mut self) {
        let mut segments = std::mem::take(&mut self.0).into_iter();
        if let Some(mut last) = segments.next() {
            let mut new = BTreeSet::<Seg>::new();
            for Seg(a, b) in segments {
                if a > last.1.saturating_add(1) {
                    new.insert(last);
                    last = Seg(a, b);
                } else {
                    last.1 = last.1.max(b);
                }
            }
            new.insert(last);
            self.0 = new;
        }
    }

    pub fn normalized(&self) -> Self {
        let mut n = self.clone();
        n.normalize();
        n
    }

    pub fn chars(&self) -> SegmentsCharIter {
        SegmentsCharIter { segments: self.0.clone(), range: None }
    }

    /// Inserts Seg(start, stop) in the current segment, except the UTF-8 gap between
    /// UTF8_GAP_MIN (0xd800) and UTF8_GAP_MAX (0xdfff). If a part or the entirety of
    /// that gap is within [start-stop], then it's extruded first.
    pub fn insert_utf8(&mut self, start: u32, stop: u32) {
        if start <= stop {
            if stop < UTF8_GAP_MIN || start > UTF8_GAP_MAX {
                self.0.insert(Seg(start, stop));
            } else {
                if start < UTF8_GAP_MIN {
                    self.0.insert(Seg(start, UTF8_GAP_MIN - 1));
                }
                if stop > UTF8_GAP_MAX {
                    self.0.insert(Seg(UTF8_GAP_MAX + 1, stop));
                }
            }
        }
    }

    /// Negates the selection, except the UTF-8 gap between UTF8_GAP_MIN (0xd800) and
    /// UTF8_GAP_MAX (0xdfff), which is always excluded. The segments must be normalized.
    pub fn not(&self) -> Self {
        let mut inv = Segments::empty();
        let mut start = 0;
        for seg in &self.0 {
            if seg.0 > start {
                inv.insert_utf8(start, seg.0 - 1);
            }
            start = seg.1 + 1;
        }
        if start <= UTF8_MAX {
            inv.insert_utf8(start, UTF8_MAX);
        }
        inv
    }

    /// Adds the simple lowercase and uppercase variants of all the characters, then normalizes the segments.
    pub fn add_case_variants(&mut self) {
        let mut variants = Vec::<char>::new();
        for c in self.chars() {
            let mut lower = c.to_lowercase();
            if let (Some(l), None) = (lower.next(), lower.next()) {
                if l != c { variants.push(l); }
            }
            let mut upper = c.to_uppercase();
            if let (Some(u), None) = (upper.next(), upper.next()) {
                if u != c { variants.push(u); }
            }
        }
        for c in variants {
            self.insert(Seg(c as u32, c as u32));
        }
        self.normalize();
    }
}

impl<const N: usize> From<[Seg; N]> for Segments {
    /// Converts a `[Seg; N]` into a `Segments`.
    ///
    /// ```
    /// use nfalex_lib::segments::{Seg, Segments};
    /// let set1 = Segments::from([Seg('a' as u32, 'z' as u32), Seg('0' as u32, '9' as u32)]);
    /// ```
    fn from(arr: [Seg; N]) -> Self {
        Segments(BTreeSet::from(arr))
    }
}

impl FromIterator<Seg> for Segments {
    fn from_iter<T: IntoIterator<Item=Seg>>(iter: T) -> Self {
        let mut segments = Segments::empty();
        for seg in iter {
            segments.insert(seg);
        }
        segments
    }
}

impl Deref for Segments {
    type Target = BTreeSet<Seg>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Segments {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Debug for Segments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Segments({})", self.0.iter().map(|seg| format!("Seg(0x{:x}, 0x{:x})", seg.0, seg.1)).collect::<Vec<_>>().join(", "))
    }
}

impl Display for Segments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter()
            .map(|seg| seg.to_string())
            .collect::<Vec<_>>()
            .join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentsCmp {
    pub common: Segments,      // common to self and other
    pub internal: Segments,    // only in self, external to other
    pub external: Segments     // external to self, only in other
}

impl SegmentsCmp {
    pub fn empty() -> Self {
        SegmentsCmp { common: Segments::empty(), internal: Segments::empty(), external: Segments::empty() }
    }

    pub fn inverse(self) -> Self {
        SegmentsCmp { common: self.common, internal: self.external, external: self.internal }
    }

    pub fn extend(&mut self, other: &Self) {
        self.common.extend(other.common.iter());
        self.internal.extend(other.internal.iter());
        self.external.extend(other.external.iter());
    }

    pub fn normalize(&mut self) {
        self.common.normalize();
        self.internal.normalize();
        self.external.normalize();
    }
}

impl Display for SegmentsCmp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<common: {}, internal: {}, external: {}>", self.common, self.internal, self.external)
    }
}

/// Iterator over the characters of [Segments]. Codepoints that aren't valid characters are skipped.
pub struct SegmentsCharIter {
    segments: BTreeSet<Seg>,
    range: Option<RangeInclusive<u32>>
}

impl Iterator for SegmentsCharIter {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(code) = self.range.as_mut().and_then(|r| r.next()) {
                if let Some(c) = char::from_u32(code) {
                    return Some(c);
                }
                continue;
            }
            let Seg(a, b) = self.segments.pop_first()?;
            self.range = Some(a..=b);
        }
    }
}

// ---------------------------------------------------------------------------------------------
// Seg

#[derive(Clone, Copy, PartialOrd, PartialEq, Eq, Ord, Hash, Debug)]
pub struct Seg(pub u32, pub u32);

impl Display for Seg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let show = |code: u32| char::from_u32(code).map(escape_char).unwrap_or_else(|| format!("\\u{{{code:x}}}"));
        if self.0 == self.1 {
            write!(f, "'{}'", show(self.0))
        } else {
            write!(f, "'{}'-'{}'", show(self.0), show(self.1))
        }
    }
}

// ---------------------------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::{seg, segments};
    use super::*;

    fn new_cmp(c: Seg, i: Seg, e: Seg) -> SegmentsCmp {
        SegmentsCmp { common: Segments::new(c), internal: Segments::new(i), external: Segments::new(e) }
    }

    fn build_segments() -> Vec<(Seg, Seg, SegmentsCmp)> {
        vec![
            (Seg(1, 2), Seg(3, 4), new_cmp(Seg(9, 0), Seg(1, 2), Seg(3, 4))),
            (Seg(1, 2), Seg(2, 3), new_cmp(Seg(2, 2), Seg(1, 1), Seg(3, 3))),
            (Seg(1, 3), Seg(2, 4), new_cmp(Seg(2, 3), Seg(1, 1), Seg(4, 4))),
            (Seg(1, 3), Seg(2, 3), new_cmp(Seg(2, 3), Seg(1, 1), Seg(9, 0))),
            (Seg(1, 4), Seg(2, 3), SegmentsCmp { common: Segments::new(Seg(2, 3)), internal: Segments::from([Seg(1, 1), Seg(4, 4)]), external: Segments::empty() }),
            (Seg(1, 2), Seg(1, 3), new_cmp(Seg(1, 2), Seg(9, 0), Seg(3, 3))),
            (Seg(1, 2), Seg(1, 2), new_cmp(Seg(1, 2), Seg(9, 0), Seg(9, 0))),
            (Seg(1, 3), Seg(1, 2), new_cmp(Seg(1, 2), Seg(3, 3), Seg(9, 0))),
            (Seg(2, 3), Seg(1, 4), SegmentsCmp { common: Segments::new(Seg(2, 3)), internal: Segments::empty(), external: Segments::from([Seg(1, 1), Seg(4, 4)]) }),
            (Seg(2, 3), Seg(1, 3), new_cmp(Seg(2, 3), Seg(9, 0), Seg(1, 1))),
            (Seg(2, 4), Seg(1, 3), new_cmp(Seg(2, 3), Seg(4, 4), Seg(1, 1))),
            (Seg(2, 3), Seg(1, 2), new_cmp(Seg(2, 2), Seg(3, 3), Seg(1, 1))),
            (Seg(3, 4), Seg(1, 2), new_cmp(Seg(9, 0), Seg(3, 4), Seg(1, 2))),
        ]
    }

    #[test]
    fn segs_segment_intersect() {
        let tests = build_segments();
        for (idx, (ab, cd, expected_cmp)) in tests.into_iter().enumerate() {
            let cmp = Segments::segment_intersect(ab, cd);
            assert_eq!(cmp, expected_cmp, "test {idx} failed");
        }
    }

    #[test]
    fn segs_intersect() {
        for scale in [10, 4] {
            let iv = build_segments();
            let mut ab = Segments::empty();
            let mut cd = Segments::empty();
            let mut expected_cmp = SegmentsCmp::empty();
            for (idx, (Seg(a, b), Seg(c, d), cmp)) in iv.into_iter().enumerate() {
                let offset = scale * idx as u32;
                ab.insert(Seg(a + offset, b + offset));
                cd.insert(Seg(c + offset, d + offset));
                expected_cmp.common.extend(cmp.common.iter().map(|Seg(a, b)| Seg(*a + offset, *b + offset)));
                expected_cmp.internal.extend(cmp.internal.iter().map(|Seg(a, b)| Seg(*a + offset, *b + offset)));
                expected_cmp.external.extend(cmp.external.iter().map(|Seg(a, b)| Seg(*a + offset, *b + offset)));
            }
            let msg = format!("test failed for scale {scale}");
            let cmp = ab.intersect(&cd);
            assert_eq!(cmp, expected_cmp, "{}", msg);
            let cmp = cd.intersect(&ab);
            assert_eq!(cmp, expected_cmp.clone().inverse(), "{}", msg);
            ab.normalize();
            cd.normalize();
            expected_cmp.normalize();
            let cmp = ab.intersect(&cd);
            assert_eq!(cmp, expected_cmp, "{}", msg);
        }
    }

    #[test]
    fn segs_partition() {
        let tests: Vec<(Segments, Segments, Segments)> = vec![
            (segments![1-4], segments![3-6], segments![1-2, 3-4, 5-6]),
            (segments![1-4], segments![5-6], segments![1-4, 5-6]),
            (segments![1-6], segments![3-4], segments![1-2, 3-4, 5-6]),
            (segments![1-4, 5-10], segments![], segments![1-4, 5-10]),
            (segments![], segments![1-4, 5-10], segments![1-4, 5-10]),
            (segments![1-4, 5-10], segments![3-5], segments![1-2, 3-4, 5-5, 6-10]),
        ];
        for (idx, (mut ab, cd, expected)) in tests.into_iter().enumerate() {
            ab.add_partition(&cd);
            assert_eq!(ab, expected, "test {idx} failed");
        }
    }

    #[test]
    fn segs_normalize() {
        let tests: Vec<(Segments, Segments)> = vec![
            (segments![1-4, 5-6], segments![1-6]),
            (segments![1-10, 3-4], segments![1-10]),
            (segments![1-4, 3-8, 10], segments![1-8, 10]),
            (segments![], segments![]),
            (segments![0-MAX, 5], segments![0-MAX]),
        ];
        for (idx, (segments, expected)) in tests.into_iter().enumerate() {
            assert_eq!(segments.normalized(), expected, "test {idx} failed");
        }
    }

    #[test]
    fn segs_contains() {
        let s = segments!['a'-'c', 'x', 0x100-0x1ff];
        let tests = vec![('a', true), ('b', true), ('c', true), ('d', false), ('x', true), ('w', false), ('\u{100}', true), ('\u{1ff}', true), ('\u{200}', false), ('\0', false)];
        for (idx, (c, expected)) in tests.into_iter().enumerate() {
            assert_eq!(s.contains(c as u32), expected, "test {idx} failed");
        }
        assert!(!Segments::empty().contains(0));
    }

    #[test]
    fn segs_chars() {
        let tests = vec![
            (segments!['a'-'a'], "a"),
            (segments!['a'-'d'], "abcd"),
            (segments!['a'-'c', 'x'-'z'], "abcxyz"),
            (segments![0xd7ff-0xe000], "\u{d7ff}\u{e000}"),
        ];
        for (idx, (segments, expected)) in tests.into_iter().enumerate() {
            let result = segments.chars().collect::<String>();
            assert_eq!(result, expected, "test {idx} failed");
        }
    }

    #[test]
    fn segs_insert_utf8() {
        let tests = vec![
            (0, UTF8_MAX,                    segments![MIN-LOW_MAX, HIGH_MIN-MAX]),
            (32, UTF8_GAP_MIN + 2,           segments![32-LOW_MAX]),
            (96, UTF8_GAP_MAX + 1,           segments![96-LOW_MAX, HIGH_MIN]),
            (UTF8_GAP_MIN, UTF8_GAP_MAX,     segments![]),
        ];
        for (test_id, (a, b, expected)) in tests.into_iter().enumerate() {
            let mut result = Segments::empty();
            result.insert_utf8(a, b);
            assert_eq!(result, expected, "test {test_id} failed");
        }
    }

    #[test]
    fn segs_not() {
        let tests = vec![
            (segments![MIN-LOW_MAX, HIGH_MIN-MAX],                        segments![]),
            (segments![],                           segments![MIN-LOW_MAX, HIGH_MIN-MAX]),
            (segments![0],                          segments![1-LOW_MAX, HIGH_MIN-MAX]),
            (segments![0-MAX],                      segments![]),
            (segments![3-LOW_MAX],                  segments![0-2, HIGH_MIN-MAX]),
            (segments![0-6, LOW_MAX-HIGH_MIN, MAX], segments![7-0xd7fe, 0xe001-0x10fffe]),
            (segments![0-9, HIGH_MIN-MAX],          segments![10-LOW_MAX]),
        ];
        for (test_id, (segments, expected)) in tests.into_iter().enumerate() {
            let result = segments.not();
            assert_eq!(result.normalized(), expected.normalized(), "test {test_id} failed");
        }
    }

    #[test]
    fn segs_case_variants() {
        let tests = vec![
            (segments!['a'-'c'], segments!['A'-'C', 'a'-'c']),
            (segments!['K'], segments!['K', 'k']),
            (segments!['0'-'9'], segments!['0'-'9']),
            (segments!['é'], segments!['É', 'é']),
        ];
        for (idx, (mut segments, expected)) in tests.into_iter().enumerate() {
            segments.add_case_variants();
            assert_eq!(segments, expected.normalized(), "test {idx} failed");
        }
    }

    #[test]
    fn segs_display() {
        assert_eq!(segments!['a'].to_string(), "'a'");
        assert_eq!(segments!['a'-'z', '_'].to_string(), "'_', 'a'-'z'");
        assert_eq!(seg!('0'-'9').to_string(), "'0'-'9'");
    }
}
