// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.


use std::collections::{BTreeSet, VecDeque};
use std::ops::Range;
use nfalex_core::log::{BufLog, Logger};
use nfalex_core::{Kind, LexStateId, RowId, RuleId, StateId};
use crate::closure::{ClosureEngine, StateSet, StateSetInterner};
use crate::nfa::Accept;

// ---------------------------------------------------------------------------------------------

/// Rows of a lexical state in [CanonTables]: `first_row..first_row + nbr_rows`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LexStateRows {
    pub first_row: RowId,
    pub nbr_rows: u32,
}

/// Canonical state sets of the lexical states, used by the lexer at runtime.
///
/// The first row of a lexical state is its start set. The other rows are the closures of the
/// transition targets of the members of its rows, numbered in the order they're first found
/// when scanning the rows in order, and their members in ascending order.
///
/// A lexical state whose start set has no member with a transition can't match any character;
/// it has no rows at all (`None`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanonTables {
    pub rows: Vec<StateSet>,
    /// rule accepted by each row
    pub row_accepts: Vec<Option<Accept>>,
    /// for each NFA state with a transition: row of the closure of its target
    pub next_rows: Vec<Option<RowId>>,
    pub lex_states: Vec<Option<LexStateRows>>,
}

impl CanonTables {
    pub fn lex_rows(&self, lex: LexStateId) -> Option<Range<usize>> {
        let rows = (*self.lex_states.get(lex as usize)?)?;
        Some(rows.first_row as usize..(rows.first_row + rows.nbr_rows) as usize)
    }

    /// `StatesForState` table of the lexical state: the members of each of its rows, or `None`
    /// if the state can't match any character.
    pub fn states_for_state(&self, lex: LexStateId) -> Option<Vec<Vec<StateId>>> {
        let range = self.lex_rows(lex)?;
        Some(self.rows[range].iter().map(|set| set.iter().collect()).collect())
    }

    /// `KindForState` table of the lexical state: the kind accepted in each of its rows, or `None`
    /// if the state can't match any character.
    pub fn kind_for_state(&self, lex: LexStateId) -> Option<Vec<Option<Kind>>> {
        let range = self.lex_rows(lex)?;
        Some(self.row_accepts[range].iter().map(|accept| accept.map(|a| a.kind)).collect())
    }

    pub fn row_rule(&self, row: RowId) -> Option<RuleId> {
        self.row_accepts[row as usize].map(|a| a.rule)
    }
}

/// Builds the canonical rows of all the lexical states.
///
/// Returns an error if an internal invariant is violated.
pub fn canonicalize(engine: &mut ClosureEngine) -> Result<CanonTables, String> {
    let graph = engine.graph();
    let mut tables = CanonTables { next_rows: vec![None; graph.nbr_states()], ..CanonTables::default() };
    for (lex_id, lex) in graph.get_lex_states().iter().enumerate() {
        let start = engine.start_set(lex_id as LexStateId);
        if !start.iter().any(|s| graph.get_state(s).transition.is_some()) {
            log::debug!("lexical state '{}' can't match any character", lex.name);
            tables.lex_states.push(None);
            continue;
        }
        let first_row = tables.rows.len() as RowId;
        let mut interner = StateSetInterner::new();
        interner.intern(start);
        let mut row = 0;
        while row < interner.len() {
            let set = interner.get(row as RowId).clone();
            for state in set.iter() {
                if let Some((_, target)) = &graph.get_state(state).transition {
                    let next_row = &mut tables.next_rows[state as usize];
                    if next_row.is_none() {
                        let (id, _) = interner.intern(engine.closure(*target).clone());
                        *next_row = Some(first_row + id);
                    }
                }
            }
            row += 1;
        }
        let nbr_rows = interner.len() as u32;
        for set in interner.into_sets() {
            tables.row_accepts.push(engine.accept_of(&set)?);
            tables.rows.push(set);
        }
        log::debug!("lexical state '{}': {nbr_rows} rows", lex.name);
        tables.lex_states.push(Some(LexStateRows { first_row, nbr_rows }));
    }
    Ok(tables)
}

/// Warns about the rules matching the empty string: the lexer never produces an empty token.
pub fn check_empty_matches(engine: &ClosureEngine, log: &mut BufLog) {
    for rule in engine.graph().get_rules() {
        if let Some((entry, exit)) = rule.fragment {
            if engine.epsilon_closure(entry).contains(&exit) {
                log.add_warning_at(rule.pos, format!("rule {} matches the empty string, which never produces a token", rule.name));
            }
        }
    }
}

/// Explores the sets of active states reachable from each start set and warns about the rules
/// that are never selected, because another rule with a lower ordinal always matches the same
/// text. The exploration of a lexical state stops after `max_state_sets` distinct sets, with a
/// warning; it's skipped when `max_state_sets` is 0.
///
/// Returns an error if an internal invariant is violated.
pub fn find_unmatched_rules(engine: &mut ClosureEngine, max_state_sets: usize, log: &mut BufLog) -> Result<(), String> {
    if max_state_sets == 0 {
        return Ok(());
    }
    let graph = engine.graph();
    for (lex_id, lex) in graph.get_lex_states().iter().enumerate() {
        let mut winners = BTreeSet::<RuleId>::new();
        let mut seen = StateSetInterner::new();
        let mut queue = VecDeque::<StateSet>::new();
        let start = engine.start_set(lex_id as LexStateId);
        seen.intern(start.clone());
        queue.push_back(start);
        let mut complete = true;
        'explore: while let Some(set) = queue.pop_front() {
            let partition = engine.partition(&set);
            for seg in partition.iter() {
                let Some(c) = char::from_u32(seg.0) else { continue };
                let next = engine.step(&set, c);
                if next.is_empty() {
                    continue;
                }
                if let Some(accept) = engine.accept_of(&next)? {
                    winners.insert(accept.rule);
                }
                if seen.intern(next.clone()).1 {
                    if seen.len() > max_state_sets {
                        complete = false;
                        break 'explore;
                    }
                    queue.push_back(next);
                }
            }
        }
        log::debug!("lexical state '{}': {} state sets explored", lex.name, seen.len());
        if !complete {
            log.add_warning(format!("lexical state '{}': the search for unmatched rules stopped after {max_state_sets} state sets", lex.name));
            continue;
        }
        for rule_id in lex.first_rule..lex.end_rule {
            let rule = graph.get_rule(rule_id);
            if rule.fragment.is_some() && !winners.contains(&rule_id) {
                log.add_warning_at(rule.pos, format!("rule {} can never be matched", rule.name));
            }
        }
    }
    Ok(())
}
