// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.


use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use nfalex_core::char_reader::{escape_char, escape_string};
use nfalex_core::lexer::{Pos, RuleCategory};
use nfalex_core::log::{BufLog, LogReader, Logger};
use nfalex_core::{Kind, Ordinal};
use crate::build::{BuildErrorSource, HasBuildErrorSource};

// ---------------------------------------------------------------------------------------------
// Regular expressions

/// Regular expression of a token rule.
#[derive(Clone, Debug, PartialEq)]
pub enum RegularExpression {
    /// `[...]` or `~[...]`: set of inclusive character ranges
    CharacterList { negated: bool, ranges: Vec<(char, char)> },
    /// `"..."`: exact sequence of characters
    StringLiteral(String),
    /// `a | b | ...`
    Choice(Vec<RegexNode>),
    /// `a b ...`
    Sequence(Vec<RegexNode>),
    /// `(a)+`
    OneOrMore(Box<RegexNode>),
    /// `(a)*`
    ZeroOrMore(Box<RegexNode>),
    /// `(a)?`
    ZeroOrOne(Box<RegexNode>),
    /// `(a){min}`, `(a){min,max}`, or `(a){min,}` when `max` is `None`
    RepetitionRange { inner: Box<RegexNode>, min: u32, max: Option<u32> },
    /// `<EOF>`, only allowed as the whole pattern of a rule
    EndOfFile,
    /// `<NAME>`: reference to a labeled expression
    NamedReference(String),
}

/// Node of a regular expression tree, with its optional label and its position in the source.
///
/// A labeled node can be referenced by [NamedReference](RegularExpression::NamedReference) in any
/// rule of the lexicon. A private node (`<#NAME: ...>` in JavaCC) only exists to be referenced.
#[derive(Clone, Debug, PartialEq)]
pub struct RegexNode {
    pub re: RegularExpression,
    pub label: Option<String>,
    pub private: bool,
    pub pos: Option<Pos>,
}

impl RegexNode {
    pub fn new(re: RegularExpression) -> Self {
        RegexNode { re, label: None, private: false, pos: None }
    }

    pub fn chars(ranges: &[(char, char)]) -> Self {
        Self::new(RegularExpression::CharacterList { negated: false, ranges: ranges.to_vec() })
    }

    pub fn not_chars(ranges: &[(char, char)]) -> Self {
        Self::new(RegularExpression::CharacterList { negated: true, ranges: ranges.to_vec() })
    }

    pub fn string<T: Into<String>>(text: T) -> Self {
        Self::new(RegularExpression::StringLiteral(text.into()))
    }

    pub fn choice(alternatives: Vec<RegexNode>) -> Self {
        Self::new(RegularExpression::Choice(alternatives))
    }

    pub fn seq(items: Vec<RegexNode>) -> Self {
        Self::new(RegularExpression::Sequence(items))
    }

    pub fn plus(inner: RegexNode) -> Self {
        Self::new(RegularExpression::OneOrMore(Box::new(inner)))
    }

    pub fn star(inner: RegexNode) -> Self {
        Self::new(RegularExpression::ZeroOrMore(Box::new(inner)))
    }

    pub fn opt(inner: RegexNode) -> Self {
        Self::new(RegularExpression::ZeroOrOne(Box::new(inner)))
    }

    pub fn repeat(inner: RegexNode, min: u32, max: Option<u32>) -> Self {
        Self::new(RegularExpression::RepetitionRange { inner: Box::new(inner), min, max })
    }

    pub fn eof() -> Self {
        Self::new(RegularExpression::EndOfFile)
    }

    pub fn reference<T: Into<String>>(name: T) -> Self {
        Self::new(RegularExpression::NamedReference(name.into()))
    }

    /// Labels the node, so that it can be referenced by name.
    pub fn with_label<T: Into<String>>(mut self, label: T) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Makes the node private: a rule with a private pattern never produces a token.
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn at(mut self, line: u64, col: u64) -> Self {
        self.pos = Some(Pos(line, col));
        self
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.re, RegularExpression::EndOfFile)
    }

    /// Direct children of the node.
    pub fn children(&self) -> Vec<&RegexNode> {
        match &self.re {
            RegularExpression::Choice(v) | RegularExpression::Sequence(v) => v.iter().collect(),
            RegularExpression::OneOrMore(inner)
            | RegularExpression::ZeroOrMore(inner)
            | RegularExpression::ZeroOrOne(inner)
            | RegularExpression::RepetitionRange { inner, .. } => vec![inner.as_ref()],
            _ => Vec::new(),
        }
    }

    /// Iterates over the node and all its descendants, depth first, parents before children.
    pub fn iter_depth(&self) -> RegexIter<'_> {
        RegexIter { stack: vec![self] }
    }

    fn fmt_inner(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.re {
            RegularExpression::CharacterList { negated, ranges } => {
                if *negated { write!(f, "~")?; }
                write!(f, "[")?;
                for (i, (a, b)) in ranges.iter().enumerate() {
                    if i > 0 { write!(f, ",")?; }
                    if a == b {
                        write!(f, "\"{}\"", escape_char(*a))?;
                    } else {
                        write!(f, "\"{}\"-\"{}\"", escape_char(*a), escape_char(*b))?;
                    }
                }
                write!(f, "]")
            }
            RegularExpression::StringLiteral(s) => write!(f, "\"{}\"", escape_string(s)),
            RegularExpression::Choice(v) => {
                write!(f, "(")?;
                for (i, node) in v.iter().enumerate() {
                    if i > 0 { write!(f, " | ")?; }
                    write!(f, "{node}")?;
                }
                write!(f, ")")
            }
            RegularExpression::Sequence(v) => {
                write!(f, "(")?;
                for (i, node) in v.iter().enumerate() {
                    if i > 0 { write!(f, " ")?; }
                    write!(f, "{node}")?;
                }
                write!(f, ")")
            }
            RegularExpression::OneOrMore(inner) => write!(f, "({inner})+"),
            RegularExpression::ZeroOrMore(inner) => write!(f, "({inner})*"),
            RegularExpression::ZeroOrOne(inner) => write!(f, "({inner})?"),
            RegularExpression::RepetitionRange { inner, min, max } => match max {
                Some(max) if max == min => write!(f, "({inner}){{{min}}}"),
                Some(max) => write!(f, "({inner}){{{min},{max}}}"),
                None => write!(f, "({inner}){{{min},}}"),
            },
            RegularExpression::EndOfFile => write!(f, "<EOF>"),
            RegularExpression::NamedReference(name) => write!(f, "<{name}>"),
        }
    }
}

impl From<RegularExpression> for RegexNode {
    fn from(re: RegularExpression) -> Self {
        RegexNode::new(re)
    }
}

impl Display for RegexNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => {
                write!(f, "<{}{label}: ", if self.private { "#" } else { "" })?;
                self.fmt_inner(f)?;
                write!(f, ">")
            }
            None => self.fmt_inner(f),
        }
    }
}

pub struct RegexIter<'a> {
    stack: Vec<&'a RegexNode>,
}

impl<'a> Iterator for RegexIter<'a> {
    type Item = &'a RegexNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().into_iter().rev());
        Some(node)
    }
}

// ---------------------------------------------------------------------------------------------
// Rules and lexicon

/// Rule of a lexical state: a regular expression and what to do when it's matched.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenRule {
    /// declaration order; the lowest ordinal wins between rules matching the same length
    pub ordinal: Ordinal,
    pub kind: Kind,
    pub regex: RegexNode,
    pub ignore_case: bool,
    pub category: RuleCategory,
    /// name of the lexical state entered after a match
    pub next_state: Option<String>,
}

impl TokenRule {
    pub fn new(ordinal: Ordinal, kind: Kind, regex: RegexNode) -> Self {
        TokenRule { ordinal, kind, regex, ignore_case: false, category: RuleCategory::Token, next_state: None }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    pub fn next_state<T: Into<String>>(mut self, name: T) -> Self {
        self.next_state = Some(name.into());
        self
    }

    /// Name used in messages and in the generated tables: the label if there is one, or the pattern.
    pub fn name(&self) -> String {
        match &self.regex.label {
            Some(label) => label.clone(),
            None => self.regex.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LexicalState {
    pub name: String,
    pub rules: Vec<TokenRule>,
    pub pos: Option<Pos>,
}

impl LexicalState {
    pub fn new<T: Into<String>>(name: T, rules: Vec<TokenRule>) -> Self {
        LexicalState { name: name.into(), rules, pos: None }
    }
}

/// Input of the lexer generator: the lexical states and their rules.
///
/// The lexicon carries a log, so that a front-end can report its own diagnostics; the lexicon
/// isn't built if that log has errors.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    pub states: Vec<LexicalState>,
    pub(crate) log: BufLog,
}

impl Lexicon {
    pub fn new(states: Vec<LexicalState>) -> Self {
        Lexicon { states, log: BufLog::new() }
    }

    pub fn with_log(states: Vec<LexicalState>, log: BufLog) -> Self {
        Lexicon { states, log }
    }

    pub fn add_state(&mut self, state: LexicalState) {
        self.states.push(state);
    }

    pub fn get_state(&self, name: &str) -> Option<&LexicalState> {
        self.states.iter().find(|s| s.name == name)
    }

    pub fn nbr_rules(&self) -> usize {
        self.states.iter().map(|s| s.rules.len()).sum()
    }

    /// Collects the labeled nodes of the whole lexicon, which can be referenced from any lexical state.
    /// A label defined twice is an error; the first definition is kept.
    pub(crate) fn collect_labels(&self, log: &mut BufLog) -> BTreeMap<&str, &RegexNode> {
        let mut labels = BTreeMap::<&str, &RegexNode>::new();
        for state in &self.states {
            for rule in &state.rules {
                for node in rule.regex.iter_depth() {
                    if let Some(label) = &node.label {
                        if labels.contains_key(label.as_str()) {
                            log.add_error_at(node.pos, format!("label '{label}' is already defined"));
                        } else {
                            labels.insert(label.as_str(), node);
                        }
                    }
                }
            }
        }
        labels
    }
}

impl LogReader for Lexicon {
    type Item = BufLog;

    fn get_log(&self) -> &Self::Item {
        &self.log
    }

    fn give_log(self) -> Self::Item {
        self.log
    }
}

impl HasBuildErrorSource for Lexicon {
    const SOURCE: BuildErrorSource = BuildErrorSource::Lexicon;
}
