// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

pub mod char_reader;
pub mod class;
pub mod log;
pub mod lexer;

// package name & version
pub const CORE_PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const CORE_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Token category produced by an accepting rule
pub type Kind = u16;
/// Declaration order of a rule in its lexical state; the lowest ordinal wins a tie
pub type Ordinal = u32;
/// ID of an NFA state
pub type StateId = u32;
/// ID of a row in the `StatesForState` table (a canonical set of NFA states)
pub type RowId = u32;
/// Index of a rule in the rule table. Rules of a lexical state are contiguous and sorted by ordinal.
pub type RuleId = u32;
/// ID of a lexical state
pub type LexStateId = u16;
/// ID of an interned character-class test
pub type ClassId = u32;
/// ID of an interned 256-bit page table
pub type BitVecId = u32;
/// ID of an interned page map (list of page tables used by one class)
pub type PageMapId = u32;
/// High byte of a codepoint (`codepoint >> 8`)
pub type PageId = u16;

/// Kind reserved for the end of input.
pub const EOF_KIND: Kind = 0;

pub trait CollectJoin {
    fn join(&mut self, separator: &str) -> String
        where Self: Iterator,
              <Self as Iterator>::Item: ToString
    {
        self.map(|x| x.to_string()).collect::<Vec<_>>().join(separator)
    }

    fn to_vec(self) -> Vec<<Self as Iterator>::Item>
        where Self: Iterator + Sized
    {
        self.collect::<Vec<_>>()
    }
}

impl<I: Iterator> CollectJoin for I {}
