// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

pub(crate) mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use nfalex_core::char_reader::escape_char;
use nfalex_core::lexer::{Pos, RuleCategory};
use nfalex_core::log::{BufLog, LogReader, Logger};
use nfalex_core::{CollectJoin, Kind, LexStateId, Ordinal, RuleId, StateId, EOF_KIND};
use crate::build::{BuildErrorSource, BuildFrom, HasBuildErrorSource};
use crate::options::LexerGenOptions;
use crate::regex::{LexicalState, Lexicon, RegexNode, RegularExpression};
use crate::segments::Segments;

// ---------------------------------------------------------------------------------------------
// NFA graph

/// Rule accepted in a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Accept {
    pub rule: RuleId,
    pub ordinal: Ordinal,
    pub kind: Kind,
}

/// State of the Thompson NFA.
///
/// A state has at most one consuming transition. The states with a transition or an accepting
/// rule are the "important" states; only those are kept in the canonical state sets.
#[derive(Clone, Debug, PartialEq)]
pub struct NfaState {
    pub lex_state: LexStateId,
    /// consuming transition: character class (normalized) and next state
    pub transition: Option<(Segments, StateId)>,
    pub epsilon: Vec<StateId>,
    pub accept: Option<Accept>,
}

impl NfaState {
    fn new(lex_state: LexStateId) -> Self {
        NfaState { lex_state, transition: None, epsilon: Vec::new(), accept: None }
    }

    #[inline]
    pub fn is_important(&self) -> bool {
        self.transition.is_some() || self.accept.is_some()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RuleInfo {
    pub lex_state: LexStateId,
    pub ordinal: Ordinal,
    pub kind: Kind,
    pub category: RuleCategory,
    pub next_state: Option<LexStateId>,
    pub name: String,
    pub pos: Option<Pos>,
    /// entry and accepting states of the rule's fragment (`None` for `<EOF>` and private rules)
    pub fragment: Option<(StateId, StateId)>,
    pub is_eof: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LexStateInfo {
    pub name: String,
    pub start: StateId,
    pub eof_rule: Option<RuleId>,
    /// rules of the state: `first_rule..end_rule`
    pub first_rule: RuleId,
    pub end_rule: RuleId,
}

/// Thompson NFA of all the lexical states of a lexicon.
///
/// The states of each lexical state are contiguous, starting with the start state, whose epsilon
/// transitions lead to the entries of the state's rules, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct NfaGraph {
    pub(crate) states: Vec<NfaState>,
    pub(crate) lex_states: Vec<LexStateInfo>,
    pub(crate) rules: Vec<RuleInfo>,
    pub(crate) log: BufLog,
}

impl NfaGraph {
    /// Builds the NFA of all the lexical states. The log of the lexicon is transferred to the graph.
    pub fn build(mut lexicon: Lexicon, options: &LexerGenOptions) -> Self {
        let mut log = std::mem::take(&mut lexicon.log);
        if lexicon.states.is_empty() {
            log.add_error("the lexicon has no lexical state");
            return NfaGraph { log, ..NfaGraph::default() };
        }
        if lexicon.states.len() > LexStateId::MAX as usize {
            log.add_error(format!("too many lexical states ({})", lexicon.states.len()));
            return NfaGraph { log, ..NfaGraph::default() };
        }
        let mut builder = NfaBuilder::new(&lexicon, options);
        for state in &lexicon.states {
            builder.build_lex_state(state);
        }
        let mut graph = builder.finish();
        log.extend(std::mem::take(&mut graph.log));
        graph.log = log;
        log::debug!("NFA built: {} states, {} rules, {} lexical states", graph.states.len(), graph.rules.len(), graph.lex_states.len());
        graph.log.add_note(format!("NFA: {} states, {} rules, {} lexical state(s)", graph.states.len(), graph.rules.len(), graph.lex_states.len()));
        graph
    }

    pub fn get_states(&self) -> &[NfaState] {
        &self.states
    }

    pub fn get_state(&self, id: StateId) -> &NfaState {
        &self.states[id as usize]
    }

    pub fn nbr_states(&self) -> usize {
        self.states.len()
    }

    pub fn get_lex_states(&self) -> &[LexStateInfo] {
        &self.lex_states
    }

    pub fn get_rules(&self) -> &[RuleInfo] {
        &self.rules
    }

    pub fn get_rule(&self, id: RuleId) -> &RuleInfo {
        &self.rules[id as usize]
    }

    pub fn lex_state_id(&self, name: &str) -> Option<LexStateId> {
        self.lex_states.iter().position(|s| s.name == name).map(|id| id as LexStateId)
    }
}

impl Display for NfaGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (lex_id, lex) in self.lex_states.iter().enumerate() {
            writeln!(f, "lexical state {lex_id} '{}': start {}, rules {}..{}{}",
                     lex.name, lex.start, lex.first_rule, lex.end_rule,
                     lex.eof_rule.map(|r| format!(", <EOF> rule {r}")).unwrap_or_default())?;
        }
        for (id, state) in self.states.iter().enumerate() {
            let mut items = Vec::<String>::new();
            if let Some((segments, next)) = &state.transition {
                items.push(format!("{segments} -> {next}"));
            }
            if !state.epsilon.is_empty() {
                items.push(format!("ε -> {}", state.epsilon.iter().join(", ")));
            }
            if let Some(accept) = &state.accept {
                items.push(format!("accept rule {} (ordinal {}, kind {})", accept.rule, accept.ordinal, accept.kind));
            }
            writeln!(f, "- {id}: {}", items.join(", "))?;
        }
        Ok(())
    }
}

impl LogReader for NfaGraph {
    type Item = BufLog;

    fn get_log(&self) -> &Self::Item {
        &self.log
    }

    fn give_log(self) -> Self::Item {
        self.log
    }
}

impl HasBuildErrorSource for NfaGraph {
    const SOURCE: BuildErrorSource = BuildErrorSource::NfaBuilder;
}

impl BuildFrom<Lexicon> for NfaGraph {
    fn build_from(lexicon: Lexicon) -> Self {
        NfaGraph::build(lexicon, &LexerGenOptions::default())
    }
}

// ---------------------------------------------------------------------------------------------
// Thompson construction

#[derive(Clone, Copy, Debug, PartialEq)]
struct Fragment {
    entry: StateId,
    exit: StateId,
}

/// Builds the NFA of a lexicon, one lexical state at a time.
///
/// References to labeled expressions are inlined: each occurrence gets its own copy of the
/// referenced fragment.
pub struct NfaBuilder<'a> {
    labels: BTreeMap<&'a str, &'a RegexNode>,
    lex_state_ids: BTreeMap<&'a str, LexStateId>,
    max_repetition: u32,
    states: Vec<NfaState>,
    lex_states: Vec<LexStateInfo>,
    rules: Vec<RuleInfo>,
    log: BufLog,
    /// messages already reported for a node, since an inlined expression is lowered several times
    reported: BTreeSet<(usize, String)>,
    // current rule
    curr_lex: LexStateId,
    ignore_case: bool,
    /// labels being lowered, to detect recursive references
    expanding: Vec<&'a str>,
}

impl<'a> NfaBuilder<'a> {
    pub fn new(lexicon: &'a Lexicon, options: &LexerGenOptions) -> Self {
        let mut log = BufLog::new();
        let labels = lexicon.collect_labels(&mut log);
        let mut lex_state_ids = BTreeMap::<&str, LexStateId>::new();
        for (id, state) in lexicon.states.iter().enumerate() {
            if lex_state_ids.contains_key(state.name.as_str()) {
                log.add_error_at(state.pos, format!("lexical state '{}' is already defined", state.name));
            } else {
                lex_state_ids.insert(state.name.as_str(), id as LexStateId);
            }
        }
        NfaBuilder {
            labels,
            lex_state_ids,
            max_repetition: options.max_repetition,
            states: Vec::new(),
            lex_states: Vec::new(),
            rules: Vec::new(),
            log,
            reported: BTreeSet::new(),
            curr_lex: 0,
            ignore_case: false,
            expanding: Vec::new(),
        }
    }

    /// Builds the NFA of the next lexical state: a start state with an epsilon transition to the
    /// fragment of each rule, whose exit accepts the rule.
    pub fn build_lex_state(&mut self, lex_state: &'a LexicalState) -> LexStateId {
        let lex_id = self.lex_states.len() as LexStateId;
        self.curr_lex = lex_id;
        let start = self.new_state();
        let first_rule = self.rules.len() as RuleId;
        let mut eof_rule = None;
        let mut prev_ordinal: Option<Ordinal> = None;
        for rule in &lex_state.rules {
            let pos = rule.regex.pos.or(lex_state.pos);
            let name = rule.name();
            if let Some(prev) = prev_ordinal {
                if rule.ordinal <= prev {
                    self.error_at(pos, format!("rule {name}: ordinal {} must be greater than the previous ordinal {prev}", rule.ordinal));
                }
            }
            prev_ordinal = Some(rule.ordinal);
            let rule_id = self.rules.len() as RuleId;
            let next_state = match &rule.next_state {
                Some(next) => match self.lex_state_ids.get(next.as_str()) {
                    Some(&id) => Some(id),
                    None => {
                        self.error_at(pos, format!("rule {name}: unknown lexical state '{next}'"));
                        None
                    }
                },
                None => None,
            };
            let mut info = RuleInfo {
                lex_state: lex_id,
                ordinal: rule.ordinal,
                kind: rule.kind,
                category: rule.category,
                next_state,
                name,
                pos,
                fragment: None,
                is_eof: rule.regex.is_eof(),
            };
            self.ignore_case = rule.ignore_case;
            if info.is_eof {
                if eof_rule.is_some() {
                    self.error_at(pos, format!("lexical state '{}' has several <EOF> rules", lex_state.name));
                } else {
                    eof_rule = Some(rule_id);
                }
            } else if rule.regex.private {
                // private expressions are only checked here; they're inlined where they're referenced
                let nbr_states = self.states.len();
                self.lower(&rule.regex);
                self.states.truncate(nbr_states);
            } else {
                if rule.kind == EOF_KIND && matches!(rule.category, RuleCategory::Token | RuleCategory::Special) {
                    self.error_at(pos, format!("rule {}: kind {EOF_KIND} is reserved for <EOF>", info.name));
                }
                let fragment = self.lower(&rule.regex);
                self.add_epsilon(start, fragment.entry);
                self.states[fragment.exit as usize].accept = Some(Accept { rule: rule_id, ordinal: rule.ordinal, kind: rule.kind });
                info.fragment = Some((fragment.entry, fragment.exit));
            }
            self.rules.push(info);
        }
        self.lex_states.push(LexStateInfo {
            name: lex_state.name.clone(),
            start,
            eof_rule,
            first_rule,
            end_rule: self.rules.len() as RuleId,
        });
        lex_id
    }

    pub fn finish(self) -> NfaGraph {
        NfaGraph { states: self.states, lex_states: self.lex_states, rules: self.rules, log: self.log }
    }

    fn new_state(&mut self) -> StateId {
        self.states.push(NfaState::new(self.curr_lex));
        (self.states.len() - 1) as StateId
    }

    fn add_epsilon(&mut self, from: StateId, to: StateId) {
        self.states[from as usize].epsilon.push(to);
    }

    fn empty_fragment(&mut self) -> Fragment {
        let state = self.new_state();
        Fragment { entry: state, exit: state }
    }

    fn error_at(&mut self, pos: Option<Pos>, msg: String) {
        self.log.add_error_at(pos, msg);
    }

    /// Reports an error in `node`, once for all the copies of the node.
    fn node_error(&mut self, node: &RegexNode, msg: String) {
        if self.reported.insert((node as *const RegexNode as usize, msg.clone())) {
            self.log.add_error_at(node.pos, msg);
        }
    }

    fn node_warning(&mut self, node: &RegexNode, msg: String) {
        if self.reported.insert((node as *const RegexNode as usize, msg.clone())) {
            self.log.add_warning_at(node.pos, msg);
        }
    }

    fn lower(&mut self, node: &'a RegexNode) -> Fragment {
        let label = node.label.as_deref();
        if let Some(label) = label {
            self.expanding.push(label);
        }
        let fragment = self.lower_re(node);
        if label.is_some() {
            self.expanding.pop();
        }
        fragment
    }

    fn lower_re(&mut self, node: &'a RegexNode) -> Fragment {
        match &node.re {
            RegularExpression::CharacterList { negated, ranges } => {
                let segments = self.class_segments(*negated, ranges, node);
                let entry = self.new_state();
                let exit = self.new_state();
                if segments.is_empty() {
                    self.node_warning(node, format!("character class {node} is empty and never matches"));
                } else {
                    self.states[entry as usize].transition = Some((segments, exit));
                }
                Fragment { entry, exit }
            }
            RegularExpression::StringLiteral(text) => {
                let entry = self.new_state();
                let mut curr = entry;
                for c in text.chars() {
                    let next = self.new_state();
                    let segments = self.char_segments(c);
                    self.states[curr as usize].transition = Some((segments, next));
                    curr = next;
                }
                Fragment { entry, exit: curr }
            }
            RegularExpression::Choice(alternatives) => {
                let entry = self.new_state();
                let exit = self.new_state();
                for alt in alternatives {
                    let f = self.lower(alt);
                    self.add_epsilon(entry, f.entry);
                    self.add_epsilon(f.exit, exit);
                }
                Fragment { entry, exit }
            }
            RegularExpression::Sequence(items) => {
                let Some((first, others)) = items.split_first() else {
                    return self.empty_fragment();
                };
                let first = self.lower(first);
                let mut exit = first.exit;
                for item in others {
                    let f = self.lower(item);
                    self.add_epsilon(exit, f.entry);
                    exit = f.exit;
                }
                Fragment { entry: first.entry, exit }
            }
            RegularExpression::OneOrMore(inner) => {
                let f = self.lower(inner);
                let entry = self.new_state();
                let exit = self.new_state();
                self.add_epsilon(entry, f.entry);
                self.add_epsilon(f.exit, f.entry);
                self.add_epsilon(f.exit, exit);
                Fragment { entry, exit }
            }
            RegularExpression::ZeroOrMore(inner) => {
                let f = self.lower(inner);
                let entry = self.new_state();
                let exit = self.new_state();
                self.add_epsilon(entry, f.entry);
                self.add_epsilon(entry, exit);
                self.add_epsilon(f.exit, f.entry);
                self.add_epsilon(f.exit, exit);
                Fragment { entry, exit }
            }
            RegularExpression::ZeroOrOne(inner) => {
                let f = self.lower(inner);
                let entry = self.new_state();
                let exit = self.new_state();
                self.add_epsilon(entry, f.entry);
                self.add_epsilon(entry, exit);
                self.add_epsilon(f.exit, exit);
                Fragment { entry, exit }
            }
            RegularExpression::RepetitionRange { inner, min, max } => self.lower_repetition(node, inner, *min, *max),
            RegularExpression::EndOfFile => {
                self.node_error(node, "<EOF> must be the whole pattern of a rule".to_string());
                self.empty_fragment()
            }
            RegularExpression::NamedReference(name) => {
                if self.expanding.contains(&name.as_str()) {
                    self.node_error(node, format!("recursive reference to <{name}>"));
                    return self.empty_fragment();
                }
                match self.labels.get(name.as_str()).copied() {
                    Some(target) => self.lower(target),
                    None => {
                        self.node_error(node, format!("undefined reference to <{name}>"));
                        self.empty_fragment()
                    }
                }
            }
        }
    }

    /// `{min,max}`: `min` mandatory copies followed by `max - min` optional copies, or by a
    /// `ZeroOrMore` copy when there's no upper bound.
    fn lower_repetition(&mut self, node: &'a RegexNode, inner: &'a RegexNode, min: u32, max: Option<u32>) -> Fragment {
        if let Some(max) = max {
            if max < min {
                self.node_error(node, format!("invalid repetition range {{{min},{max}}}"));
                return self.empty_fragment();
            }
        }
        let bound = max.unwrap_or(min);
        if bound > self.max_repetition {
            self.node_error(node, format!("repetition bound {bound} exceeds the maximum {}", self.max_repetition));
            return self.empty_fragment();
        }
        let entry = self.new_state();
        let mut curr = entry;
        for _ in 0..min {
            let f = self.lower(inner);
            self.add_epsilon(curr, f.entry);
            curr = f.exit;
        }
        let exit = self.new_state();
        match max {
            Some(max) => {
                for _ in min..max {
                    let f = self.lower(inner);
                    self.add_epsilon(curr, exit);
                    self.add_epsilon(curr, f.entry);
                    curr = f.exit;
                }
                self.add_epsilon(curr, exit);
            }
            None => {
                let f = self.lower(inner);
                self.add_epsilon(curr, f.entry);
                self.add_epsilon(curr, exit);
                self.add_epsilon(f.exit, f.entry);
                self.add_epsilon(f.exit, exit);
            }
        }
        Fragment { entry, exit }
    }

    fn char_segments(&self, c: char) -> Segments {
        let mut segments = Segments::from_char(c);
        if self.ignore_case {
            segments.add_case_variants();
        }
        segments
    }

    fn class_segments(&mut self, negated: bool, ranges: &[(char, char)], node: &RegexNode) -> Segments {
        let mut segments = Segments::empty();
        for &(first, last) in ranges {
            if first > last {
                self.node_error(node, format!("invalid range '{}'-'{}'", escape_char(first), escape_char(last)));
                continue;
            }
            segments.insert_utf8(first as u32, last as u32);
        }
        segments.normalize();
        if self.ignore_case {
            segments.add_case_variants();
        }
        if negated {
            segments = segments.not();
        }
        segments
    }
}
