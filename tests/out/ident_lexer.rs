#![allow(unused)]

pub(crate) mod ident_lexer {
    // -------------------------------------------------------------------------
    // [ident_lexer]

    use nfalex_core::char_reader::CharStream;
    use nfalex_core::class::{BitVec256, ClassTables, ClassTest};
    use nfalex_core::lexer::{LexStateEntry, Lexer, RuleCategory, Terminal, Transition};
    use nfalex_core::{BitVecId, PageId, RuleId, StateId};

    // lexical state 0 'DEFAULT': rows 0..3
    // - row 0: {1, 5}, kind None
    // - row 1: {1, 4}, kind 10
    // - row 2: {5, 8}, kind 1

    static TERMINALS: [Terminal; 2] = [
        Terminal { kind: 10, category: RuleCategory::Token, next_state: None }, // 0: ID
        Terminal { kind: 1, category: RuleCategory::Skip, next_state: None }, // 1: SPACE
    ];
    static LEX_STATES: [LexStateEntry; 1] = [
        LexStateEntry { start_row: Some(0), eof_rule: None }, // 0: DEFAULT
    ];
    static ROWS: [(u32, u32); 3] = [
        (0, 2), // row 0
        (2, 4), // row 1
        (4, 6), // row 2
    ];
    static ROW_MEMBERS: [StateId; 6] = [
        1, 5, // row 0
        1, 4, // row 1
        5, 8, // row 2
    ];
    static ROW_RULES: [Option<RuleId>; 3] = [
        None, Some(0), Some(1),
    ];
    static TRANSITIONS: [Option<Transition>; 9] = [
        None, // state 0
        Some(Transition { class: 0, next_row: 1 }), // state 1
        None, // state 2
        None, // state 3
        None, // state 4
        Some(Transition { class: 1, next_row: 2 }), // state 5
        None, // state 6
        None, // state 7
        None, // state 8
    ];
    static CLASSES: [ClassTest; 2] = [
        ClassTest { ascii: [0x0000000000000000, 0x07fffffe00000000], pages: Some(0) }, // 0: 'a'-'z', 'Ā'-'ǿ'
        ClassTest { ascii: [0x0000000100000200, 0x0000000000000000], pages: None }, // 1: '\t', ' '
    ];
    static BIT_VECTORS: [BitVec256; 1] = [
        BitVec256([0xffffffffffffffff, 0xffffffffffffffff, 0xffffffffffffffff, 0xffffffffffffffff]),
    ];
    static PAGE_MAPS: [(u32, u32); 1] = [
        (0, 1),
    ];
    static PAGE_ENTRIES: [(PageId, BitVecId); 1] = [
        (1, 0),
    ];

    pub fn build_lexer<S: CharStream>() -> Lexer<'static, S> {
        Lexer::new(
            &TERMINALS,
            &LEX_STATES,
            &ROWS,
            &ROW_MEMBERS,
            &ROW_RULES,
            &TRANSITIONS,
            &CLASSES,
            ClassTables { bit_vectors: &BIT_VECTORS, page_maps: &PAGE_MAPS, page_entries: &PAGE_ENTRIES },
        )
    }
    // [ident_lexer]
    // -------------------------------------------------------------------------
}
