// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.


use std::fmt::{Display, Formatter};
use std::ops::AddAssign;
use crate::char_reader::{escape_char, escape_string, CharReaderError, CharStream};
use crate::class::{ClassTables, ClassTest};
use crate::{ClassId, Kind, LexStateId, RowId, RuleId, StateId};

// ---------------------------------------------------------------------------------------------
// Types used in lexer

pub type ChannelId = u16;

/// Channel of the tokens produced by [RuleCategory::Special] rules.
pub const SPECIAL_CHANNEL: ChannelId = 1;

/// What the lexer does with the text matched by a rule.
///
/// * `Token`   => returns a token on the default channel
/// * `Skip`    => doesn't return a token, drops the current text
/// * `More`    => doesn't return a token, keeps the current text as prefix of the next token
/// * `Special` => returns a token on the [special channel](SPECIAL_CHANNEL)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum RuleCategory {
    #[default]
    Token,
    Skip,
    More,
    Special,
}

impl Display for RuleCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleCategory::Token => write!(f, "token"),
            RuleCategory::Skip => write!(f, "skip"),
            RuleCategory::More => write!(f, "more"),
            RuleCategory::Special => write!(f, "special"),
        }
    }
}

/// Terminal instructions of a rule, applied when the rule is selected by the longest match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Terminal {
    pub kind: Kind,
    pub category: RuleCategory,
    /// lexical state entered after the match
    pub next_state: Option<LexStateId>,
}

impl Display for Terminal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} {}", self.category, self.kind)?;
        if let Some(s) = self.next_state { write!(f, ",state {s}")?; }
        write!(f, ">")
    }
}

/// Entry of a lexical state: its start row in [StatesForState](Lexer::rows), or `None` when the
/// state can't match any character, and its end-of-input rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct LexStateEntry {
    pub start_row: Option<RowId>,
    pub eof_rule: Option<RuleId>,
}

/// Character transition of an NFA state: when the class matches, all the states of `next_row`
/// become active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub class: ClassId,
    pub next_row: RowId,
}

// ---------------------------------------------------------------------------------------------
// Locations

pub type CaretCol = u64;
pub type CaretLine = u64;

/// `Pos(line, col)`
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug)]
pub struct Pos(pub CaretLine, pub CaretCol);

impl Pos {
    pub fn line(&self) -> CaretLine {
        self.0
    }

    pub fn col(&self) -> CaretCol {
        self.1
    }
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

/// `PosSpan` defines a text selection where `first` and `last` are the [position](Pos) of the first and last character.
/// When `first` > `last`, no text is selected.
#[derive(Clone, PartialEq, Debug)]
pub struct PosSpan {
    pub first: Pos,
    pub last: Pos,
}

impl PosSpan {
    #[inline(always)]
    pub fn new(first: Pos, last: Pos) -> Self {
        PosSpan { first, last }
    }

    #[inline(always)]
    pub fn empty() -> Self {
        PosSpan { first: Pos(1, 1), last: Pos(0, 0) }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    pub fn first(&self) -> Option<Pos> {
        if self.is_empty() { None } else { Some(self.first) }
    }

    pub fn last(&self) -> Option<Pos> {
        if self.is_empty() { None } else { Some(self.last) }
    }
}

impl AddAssign<&PosSpan> for PosSpan {
    fn add_assign(&mut self, rhs: &Self) {
        match (self.is_empty(), rhs.is_empty()) {
            (true, false) => (self.first, self.last) = (rhs.first, rhs.last),
            (false, false) => self.last = rhs.last,
            _ => {}
        }
    }
}

impl Default for PosSpan {
    fn default() -> Self {
        PosSpan::empty()
    }
}

impl Display for PosSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.is_empty() {
            let (first, last) = (&self.first, &self.last);
            if first == last {
                write!(f, "{}:{}", first.0, first.1)
            } else if first.0 == last.0 {
                write!(f, "{}:{}-{}", first.0, first.1, last.1)
            } else {
                write!(f, "{}:{}-{}:{}", first.0, first.1, last.0, last.1)
            }
        } else {
            write!(f, "<empty>")
        }
    }
}

// ---------------------------------------------------------------------------------------------
// Table-based lexer interpreter

#[derive(Clone, PartialEq, Debug)]
pub struct LexerErrorInfo {
    pub pos: u64,
    pub line: CaretLine,
    pub col: CaretCol,
    pub curr_char: Option<char>,
    pub lex_state: LexStateId,
    pub text: String,
}

#[derive(Clone, PartialEq, Debug)]
pub enum LexerError {
    None,
    NoStreamAttached,
    EndOfStream { info: LexerErrorInfo },
    UnrecognizedChar { info: LexerErrorInfo },
    NoSuchLexState { info: LexerErrorInfo },
    Stream { pos: u64, error: CharReaderError },
}

impl Display for LexerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LexerError::None => write!(f, "no error"),
            LexerError::NoStreamAttached => write!(f, "no stream attached"),
            LexerError::EndOfStream { info: LexerErrorInfo { pos, line, col, text, .. } } =>
                write!(f, "unexpected end of stream after '{}', line {line}, col {col} (stream pos = {pos})", escape_string(text)),
            LexerError::UnrecognizedChar { info: LexerErrorInfo { pos, line, col, curr_char, .. } } =>
                write!(f, "unrecognized character '{}', line {line}, col {col} (stream pos = {pos})",
                       curr_char.map(escape_char).unwrap_or_default()),
            LexerError::NoSuchLexState { info: LexerErrorInfo { pos, line, col, lex_state, .. } } =>
                write!(f, "lexical state {lex_state} doesn't exist, line {line}, col {col} (stream pos = {pos})"),
            LexerError::Stream { pos, error } =>
                write!(f, "stream error: {error} (stream pos = {pos})"),
        }
    }
}

impl std::error::Error for LexerError {}

impl LexerError {
    pub fn get_pos(&self) -> Option<u64> {
        match &self {
            LexerError::EndOfStream { info: LexerErrorInfo { pos, .. } }
            | LexerError::UnrecognizedChar { info: LexerErrorInfo { pos, .. } }
            | LexerError::NoSuchLexState { info: LexerErrorInfo { pos, .. } }
            | LexerError::Stream { pos, .. } => Some(*pos),
            _ => None
        }
    }

    pub fn get_line_col(&self) -> Option<(CaretLine, CaretCol)> {
        match &self {
            LexerError::EndOfStream { info: LexerErrorInfo { line, col, .. } }
            | LexerError::UnrecognizedChar { info: LexerErrorInfo { line, col, .. } }
            | LexerError::NoSuchLexState { info: LexerErrorInfo { line, col, .. } } => Some((*line, *col)),
            _ => None
        }
    }
}

pub type LexerToken = (Kind, ChannelId, String, PosSpan);

/// Outcome of the longest-match scan of one token
struct Scan {
    /// selected rule and its length in characters
    accept: Option<(RuleId, usize)>,
    /// number of characters read
    read: usize,
    first_char: Option<char>,
    /// position before each character read
    track: Vec<Pos>,
    /// stream error that stopped the scan
    error: Option<CharReaderError>,
}

/// Lexical analyzer (lexer) based on NFA tables, which scans a [CharStream] and produces tokens.
///
/// The lexer keeps the list of active NFA states. For each character, every active state whose
/// class matches adds the states of its next row, and the rule of the next position is the
/// lowest rule of those rows. It reads until no state is active, then backs up the stream to the
/// last accepting position.
///
/// The tokens can be extracted one by one with [`get_token()`](Lexer::get_token) or from an
/// iterator created by [`tokens()`](Lexer::tokens).
pub struct Lexer<'a, S> {
    // operating variables
    pub(crate) input: Option<S>,
    pub(crate) error: LexerError,
    pub(crate) is_eos: bool,
    pub(crate) pos: u64,
    pub(crate) line: CaretLine,
    pub(crate) col: CaretCol,
    pub(crate) tab_width: u8,
    pub(crate) lex_state: LexStateId,
    active: Vec<StateId>,
    next: Vec<StateId>,
    marks: Vec<u32>,
    generation: u32,
    // tables
    pub terminals: &'a [Terminal],
    pub lex_states: &'a [LexStateEntry],
    pub rows: &'a [(u32, u32)],
    pub row_members: &'a [StateId],
    pub row_rules: &'a [Option<RuleId>],
    pub transitions: &'a [Option<Transition>],
    pub classes: &'a [ClassTest],
    pub class_tables: ClassTables<'a>,
}

impl<'a, S: CharStream> Lexer<'a, S> {
    pub fn new(
        terminals: &'a [Terminal],
        lex_states: &'a [LexStateEntry],
        rows: &'a [(u32, u32)],
        row_members: &'a [StateId],
        row_rules: &'a [Option<RuleId>],
        transitions: &'a [Option<Transition>],
        classes: &'a [ClassTest],
        class_tables: ClassTables<'a>,
    ) -> Self {
        Lexer {
            input: None,
            error: LexerError::None,
            is_eos: false,
            pos: 0,
            line: 1,
            col: 1,
            tab_width: 4,
            lex_state: 0,
            active: Vec::new(),
            next: Vec::new(),
            marks: vec![0; transitions.len()],
            generation: 0,
            terminals,
            lex_states,
            rows,
            row_members,
            row_rules,
            transitions,
            classes,
            class_tables,
        }
    }

    pub fn attach_stream(&mut self, input: S) {
        self.input = Some(input);
        self.error = LexerError::None;
        self.is_eos = false;
        self.pos = 0;
        self.line = 1;
        self.col = 1;
        self.lex_state = 0;
    }

    pub fn detach_stream(&mut self) -> Option<S> {
        self.input.take()
    }

    pub fn set_tab_width(&mut self, width: u8) {
        self.tab_width = width.max(1);
    }

    pub fn get_tab_width(&self) -> u8 {
        self.tab_width
    }

    pub fn get_lex_state(&self) -> LexStateId {
        self.lex_state
    }

    pub fn set_lex_state(&mut self, lex_state: LexStateId) {
        self.lex_state = lex_state;
    }

    pub fn stream(&self) -> Option<&S> {
        self.input.as_ref()
    }

    pub fn tokens(&mut self) -> LexInterpretIter<'_, 'a, S> {
        LexInterpretIter { lexer: self, error_info: None, mode: LexInterpretIterMode::Normal }
    }

    /// Returns the next token, `Ok(None)` at the end of the stream, or an error.
    ///
    /// `Skip` and `More` matches are consumed internally. At the end of the stream, the end-of-input
    /// rule of the current lexical state, if any, produces one last token.
    pub fn get_token(&mut self) -> Result<Option<LexerToken>, LexerError> {
        self.error = LexerError::None;
        let Some(mut input) = self.input.take() else {
            self.error = LexerError::NoStreamAttached;
            return Err(self.error.clone());
        };
        let result = self.get_token_from(&mut input);
        self.input = Some(input);
        if let Err(e) = &result {
            self.error = e.clone();
        }
        result
    }

    fn get_token_from(&mut self, input: &mut S) -> Result<Option<LexerToken>, LexerError> {
        const VERBOSE: bool = false;
        if self.is_eos {
            return Ok(None);
        }
        let mut more_text = String::new();   // text of previous `More` matches
        let mut first_pos = Pos(self.line, self.col);
        loop {
            input.begin_token();
            let Some(entry) = self.lex_states.get(self.lex_state as usize).copied() else {
                return Err(LexerError::NoSuchLexState { info: self.error_info(None, more_text) });
            };
            let mut scan = self.scan(input, entry.start_row);
            if VERBOSE { println!("- lex state {}: read {}, accept {:?}", self.lex_state, scan.read, scan.accept); }
            if scan.accept.is_none() {
                // a match before the failure is still issued; the next read raises the error again
                if let Some(error) = scan.error.take() {
                    return Err(LexerError::Stream { pos: self.pos, error });
                }
            }
            match scan.accept {
                Some((rule, len)) => {
                    let extra = scan.read - len;
                    if extra > 0 {
                        input.backup(extra).map_err(|error| LexerError::Stream { pos: self.pos, error })?;
                        let Pos(line, col) = scan.track[len];
                        self.line = line;
                        self.col = col;
                        self.pos -= extra as u64;
                    }
                    let last_pos = scan.track[len - 1];
                    let terminal = self.terminals[rule as usize];
                    if let Some(next_state) = terminal.next_state {
                        self.lex_state = next_state;
                    }
                    let text = input.get_image();
                    if VERBOSE { println!("  => {terminal} '{}'", escape_string(&text)); }
                    match terminal.category {
                        RuleCategory::Token =>
                            return Ok(Some((terminal.kind, 0, more_text + &text, PosSpan::new(first_pos, last_pos)))),
                        RuleCategory::Special =>
                            return Ok(Some((terminal.kind, SPECIAL_CHANNEL, more_text + &text, PosSpan::new(first_pos, last_pos)))),
                        RuleCategory::Skip => {
                            more_text.clear();
                            first_pos = Pos(self.line, self.col);
                        }
                        RuleCategory::More => more_text.push_str(&text),
                    }
                }
                None if scan.read == 0 => {
                    // end of stream before any character of the token
                    self.is_eos = true;
                    if !more_text.is_empty() {
                        return Err(LexerError::EndOfStream { info: self.error_info(None, more_text) });
                    }
                    return match entry.eof_rule.map(|r| self.terminals[r as usize]) {
                        Some(Terminal { kind, category: RuleCategory::Token, .. }) => Ok(Some((kind, 0, String::new(), PosSpan::empty()))),
                        Some(Terminal { kind, category: RuleCategory::Special, .. }) => Ok(Some((kind, SPECIAL_CHANNEL, String::new(), PosSpan::empty()))),
                        _ => Ok(None),
                    };
                }
                None => {
                    // no rule matches: the first character is dropped and the scan can resume after it
                    let extra = scan.read - 1;
                    if extra > 0 {
                        input.backup(extra).map_err(|error| LexerError::Stream { pos: self.pos, error })?;
                        let Pos(line, col) = scan.track[1];
                        self.line = line;
                        self.col = col;
                        self.pos -= extra as u64;
                    }
                    let Pos(line, col) = scan.track[0];
                    let info = LexerErrorInfo {
                        pos: self.pos - 1,
                        line,
                        col,
                        curr_char: scan.first_char,
                        lex_state: self.lex_state,
                        text: more_text + &input.get_image(),
                    };
                    return Err(LexerError::UnrecognizedChar { info });
                }
            }
        }
    }

    /// Reads characters as long as some NFA state is active, and records the last accepting position.
    fn scan(&mut self, input: &mut S, start_row: Option<RowId>) -> Scan {
        let mut scan = Scan { accept: None, read: 0, first_char: None, track: Vec::new(), error: None };
        self.active.clear();
        if let Some(row) = start_row {
            let (first, end) = self.rows[row as usize];
            self.active.extend_from_slice(&self.row_members[first as usize..end as usize]);
        }
        loop {
            let c = match input.read_char() {
                Ok(Some(c)) => c,
                Ok(None) => break,
                Err(error) => {
                    scan.error = Some(error);
                    break;
                }
            };
            if scan.read == 0 {
                scan.first_char = Some(c);
            }
            scan.read += 1;
            scan.track.push(Pos(self.line, self.col));
            self.update_pos(c);
            let rule = self.step(c);
            if let Some(rule) = rule {
                scan.accept = Some((rule, scan.read));
            }
            if self.active.is_empty() {
                break;
            }
        }
        scan
    }

    /// Moves the active states on `c` and returns the rule accepting at the new position, if any.
    fn step(&mut self, c: char) -> Option<RuleId> {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.marks.fill(0);
            self.generation = 1;
        }
        self.next.clear();
        let mut rule: Option<RuleId> = None;
        for &state in &self.active {
            if let Some(Transition { class, next_row }) = self.transitions[state as usize] {
                if self.classes[class as usize].matches(c, &self.class_tables) {
                    let (first, end) = self.rows[next_row as usize];
                    for &member in &self.row_members[first as usize..end as usize] {
                        if self.marks[member as usize] != self.generation {
                            self.marks[member as usize] = self.generation;
                            self.next.push(member);
                        }
                    }
                    if let Some(r) = self.row_rules[next_row as usize] {
                        rule = Some(rule.map_or(r, |best| best.min(r)));
                    }
                }
            }
        }
        std::mem::swap(&mut self.active, &mut self.next);
        rule
    }

    fn error_info(&self, curr_char: Option<char>, text: String) -> LexerErrorInfo {
        LexerErrorInfo { pos: self.pos, line: self.line, col: self.col, curr_char, lex_state: self.lex_state, text }
    }

    pub fn update_pos(&mut self, c: char) {
        match c {
            '\t' => {
                //            ↓       ↓    (if self.tab_width = 8)
                //    1234567890123456789
                // 1) ..↑                  col = 3
                //    ..→→→→→→↑            col = 3 - 2%8 + 8 = 3 - 2 + 8 = 9
                self.col = self.col - (self.col - 1) % self.tab_width as CaretCol + self.tab_width as CaretCol;
            }
            '\n' => {
                self.line += 1;
                self.col = 1;
            }
            '\r' => {}
            _ => self.col += 1,
        }
        self.pos += 1;
    }

    pub fn get_error(&self) -> &LexerError {
        &self.error
    }

    pub fn has_error(&self) -> bool {
        self.error != LexerError::None
    }

    pub fn is_eos(&self) -> bool {
        self.is_eos
    }
}

#[derive(Debug)]
enum LexInterpretIterMode { Normal, Error }

/// Iterator over the tokens of a [Lexer].
///
/// When a character isn't recognized, the iterator issues a token with the kind `Kind::MAX` whose
/// text is the error message, then resumes after that character.
pub struct LexInterpretIter<'a, 'b, S> {
    lexer: &'a mut Lexer<'b, S>,
    error_info: Option<LexerErrorInfo>,
    mode: LexInterpretIterMode
}

impl<'a, 'b, S: CharStream> Iterator for LexInterpretIter<'a, 'b, S> {
    type Item = LexerToken;

    fn next(&mut self) -> Option<Self::Item> {
        match self.mode {
            LexInterpretIterMode::Normal => {
                match self.lexer.get_token() {
                    Ok(token) => token,
                    Err(LexerError::UnrecognizedChar { info }) => {
                        self.error_info = Some(info);
                        self.mode = LexInterpretIterMode::Error;
                        self.next()
                    }
                    Err(_) => None,
                }
            }
            LexInterpretIterMode::Error => {
                self.mode = LexInterpretIterMode::Normal;
                let info = self.error_info.take()?;
                let msg = self.lexer.get_error().to_string();
                let pos = Pos(info.line, info.col);
                Some((Kind::MAX, 0, msg, PosSpan::new(pos, pos)))
            }
        }
    }
}

// ---------------------------------------------------------------------------------------------

pub trait TokenSpliterator: Iterator<Item=LexerToken> {
    /// Keeps the tokens of the default channel 0 as `(kind, text, pos_span)`, and gives the other
    /// tokens to the closure `f`.
    ///
    /// ## Example
    /// ```ignore
    /// let tokens = lexer.tokens().split_channel0(|(kind, ch, text, pos_span)|
    ///     println!("special token: channel {ch}, pos {pos_span}, kind {kind}, \"{text}\"")
    /// );
    /// ```
    fn split_channel0<F>(self, f: F) -> TokenSplit<Self, F>
    where Self: Sized,
          F: FnMut(LexerToken)
    {
        TokenSplit { iter: self, ch: 0, f }
    }

    /// Keeps the tokens of the default channel 0 as `(kind, text, pos_span)` and discards the others.
    fn keep_channel0(self) -> impl Iterator<Item=(Kind, String, PosSpan)>
    where Self: Sized
    {
        self.filter_map(|(kind, ch, text, pos_span)| if ch == 0 { Some((kind, text, pos_span)) } else { None })
    }
}

pub struct TokenSplit<I, F> {
    iter: I,
    ch: ChannelId,
    f: F
}

impl<I, F> Iterator for TokenSplit<I, F>
    where I: Iterator<Item=LexerToken>,
          F: FnMut(LexerToken)
{
    type Item = (Kind, String, PosSpan);

    fn next(&mut self) -> Option<Self::Item> {
        for (kind, ch, text, pos_span) in self.iter.by_ref() {
            if ch == self.ch {
                return Some((kind, text, pos_span));
            }
            (self.f)((kind, ch, text, pos_span));
        }
        None
    }
}

impl<I: Iterator<Item=LexerToken>> TokenSpliterator for I {}
