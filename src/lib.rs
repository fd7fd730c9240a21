// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

mod macros;
mod test_tools;
pub mod segments;
pub mod build;
pub mod regex;
pub mod options;
pub mod nfa;
pub mod closure;
pub mod charclass;
pub mod canon;
pub mod lexergen;

pub use nfalex_core;
pub use nfalex_core::utf8;

// Lexer generation from NFAs, see:
// - https://swtch.com/~rsc/regexp/regexp1.html (Thompson construction, subset simulation)
// - https://javacc.github.io/javacc/documentation/grammar.html (lexical states, rule categories)

// package name & version
pub const NFALEX_PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const NFALEX_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------------------------
// General helper functions

/// Concatenates the `parts` of generated source code, indented by `indent` spaces. The parts are
/// separated by an empty line, and empty lines aren't indented.
pub(crate) fn indent_source(parts: Vec<Vec<String>>, indent: usize) -> String {
    let s = " ".repeat(indent);
    let mut source = String::new();
    let mut first = true;
    for part in parts {
        if !first {
            source.push('\n');
        }
        first = false;
        for line in part {
            if !line.is_empty() {
                source.push_str(&s);
            }
            source.push_str(&line);
            source.push('\n');
        }
    }
    source
}
