// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

// Rust lacks the BTreeMap and BTreeSet equivalents of vec!

/// Generates the code to initialize a [BTreeMap](std::collections::BTreeMap).
///
/// The macro can be followed by parentheses or square brackets.
///
/// # Example
/// ```
/// # #[macro_use] fn main() {
/// # use std::collections::BTreeMap;
/// # use nfalex_lib::btreemap;
/// let days = btreemap![0 => "Monday", 1 => "Tuesday", 2 => "Wednesday"];
/// // => BTreeMap::from([(0, "Monday"), (1, "Tuesday"), (2, "Wednesday"), ])
/// assert_eq!(days, BTreeMap::from([(0, "Monday"), (1, "Tuesday"), (2, "Wednesday")]));
/// # }
/// ```
#[macro_export(local_inner_macros)]
macro_rules! btreemap {
    () => { std::collections::BTreeMap::new() };
    ($($key:expr => $value:expr,)+) => { btreemap!($($key => $value),+) };
    ($($key:expr => $value:expr),*) => {
        std::collections::BTreeMap::from([ $(($key, $value),)* ])
    };
}

/// Generates the code to initialize a [BTreeSet](std::collections::BTreeSet).
///
/// The macro can be followed by parentheses or square brackets.
///
/// # Example
/// ```
/// # #[macro_use] fn main() {
/// # use std::collections::BTreeSet;
/// # use nfalex_lib::btreeset;
/// let days = btreeset!["Monday", "Tuesday", "Wednesday"];
/// // => BTreeSet::from(["Monday", "Tuesday", "Wednesday", ])
/// assert_eq!(days, BTreeSet::from(["Monday", "Tuesday", "Wednesday"]));
/// # }
/// ```
#[macro_export(local_inner_macros)]
macro_rules! btreeset {
    () => { std::collections::BTreeSet::new() };
    ($($key:expr,)+) => { btreeset!($($key),+) };
    ($($key:expr),*) => { std::collections::BTreeSet::from([ $($key,)* ]) };
}

/// Generates a Seg (tuple of u32 values) from one or two values (characters or integers).
///
/// # Example
/// ```
/// # use nfalex_lib::{seg, segments::{Seg, Segments}};
/// let mut x = Segments::empty();
/// x.insert(seg!('a'));
/// x.insert(seg!('0'-'9'));
/// assert_eq!(x, Segments::from([Seg('a' as u32, 'a' as u32), Seg('0' as u32, '9' as u32)]));
/// ```
#[macro_export]
macro_rules! seg {
    ($($a1:literal)?$($a2:ident)? - $($b1:literal)?$($b2:ident)?) => {
        $crate::segments::Seg($crate::utf8!($($a1)?$($a2)?), $crate::utf8!($($b1)?$($b2)?))
    };
    ($($a1:literal)?$($a2:ident)?) => {
        $crate::segments::Seg($crate::utf8!($($a1)?$($a2)?), $crate::utf8!($($a1)?$($a2)?))
    };
}

/// Generates a Segments initialization from Seg values. The macro only accepts literals, either characters or integers,
/// along with a few identifiers:
///
/// - `MIN`      = 0
/// - `LOW_MAX`  = 0xd7ff
/// - `GAP_MIN`  = 0xd800 (GAP_MIN - GAP_MAX are forbidden UTF-8 codepoint values)
/// - `GAP_MAX`  = 0xdfff
/// - `HIGH_MIN` = 0xe000
/// - `MAX`      = 0x10ffff
///
/// Integer values are UTF-8 codepoint values, not the 1-4 byte representation.
///
/// # Example
/// ```
/// # use nfalex_lib::{segments, segments::{Segments, Seg}};
/// assert_eq!(segments!('a', '0'-'9'), Segments::from([Seg('a' as u32, 'a' as u32), Seg('0' as u32, '9' as u32)]));
/// assert_eq!(segments!(~ '1'-'8'), segments![MIN-'0', '9'-LOW_MAX, HIGH_MIN-MAX]);
/// ```
#[macro_export]
macro_rules! segments {
    () => { $crate::segments::Segments::empty() };
    ($($($a1:literal)?$($a2:ident)? $(- $($b1:literal)?$($b2:ident)?)?),+) => {
        $crate::segments::Segments::from([$($crate::seg!($($a1)?$($a2)? $(- $($b1)?$($b2)?)?)),+])
    };
    (~ $($($a1:literal)?$($a2:ident)? $(- $($b1:literal)?$($b2:ident)?)?),+) => {
        $crate::segments![$($($a1)?$($a2)? $(- $($b1)?$($b2)?)?),+].not()
    };
    ($($($a1:literal)?$($a2:ident)? $(- $($b1:literal)?$($b2:ident)?)?,)+) => {
        $crate::segments![$($($a1)?$($a2)? $(- $($b1)?$($b2)?)?),+]
    };
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use crate::segments::{Seg, Segments};

    #[test]
    fn btreemap() {
        let h = btreemap!(
            'a' => btreemap!(
                '1' => 'a',
                '2' => 'A'
            ),
            'b' => btreemap!['1' => 'b', '2' => 'B',],
            'c' => btreemap!()
        );
        assert_eq!(h, BTreeMap::from([('a', BTreeMap::from([('1', 'a'), ('2', 'A')])), ('b', BTreeMap::from([('1', 'b'), ('2', 'B')])), ('c', BTreeMap::new())]))
    }

    #[test]
    fn btreeset() {
        let h1 = btreeset![1, 3, 5, 7];
        let h2 = btreeset!();
        assert_eq!(h1, BTreeSet::from([1, 3, 5, 7]));
        assert_eq!(h2, BTreeSet::<i32>::from([]));
    }

    #[test]
    fn segments() {
        assert_eq!(seg!('a'-'z'), Seg(97, 122));
        assert_eq!(seg!(HIGH_MIN), Seg(0xe000, 0xe000));
        assert_eq!(segments!['a', 0x100-0x1ff], Segments::from([Seg(97, 97), Seg(0x100, 0x1ff)]));
        assert_eq!(segments![~ MIN-LOW_MAX], segments![HIGH_MIN-MAX]);
        assert_eq!(segments![], Segments::empty());
    }
}
