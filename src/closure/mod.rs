// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.


use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use nfalex_core::{CollectJoin, LexStateId, RowId, StateId};
use crate::nfa::{Accept, NfaGraph};
use crate::segments::Segments;

// ---------------------------------------------------------------------------------------------
// State sets

/// Set of NFA states, in canonical form: sorted by ID, without duplicates. Two sets with the same
/// members are equal, whatever the order in which they were built.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateSet(BTreeSet<StateId>);

impl StateSet {
    pub fn new() -> Self {
        StateSet(BTreeSet::new())
    }

    pub fn insert(&mut self, state: StateId) -> bool {
        self.0.insert(state)
    }

    pub fn contains(&self, state: StateId) -> bool {
        self.0.contains(&state)
    }

    pub fn extend(&mut self, other: &StateSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = StateId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<StateId> for StateSet {
    fn from_iter<T: IntoIterator<Item = StateId>>(iter: T) -> Self {
        StateSet(BTreeSet::from_iter(iter))
    }
}

impl<const N: usize> From<[StateId; N]> for StateSet {
    fn from(states: [StateId; N]) -> Self {
        StateSet(BTreeSet::from(states))
    }
}

impl Display for StateSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}

/// Assigns a dense ID to each distinct [StateSet], in the order they're first seen.
#[derive(Clone, Debug, Default)]
pub struct StateSetInterner {
    ids: BTreeMap<StateSet, RowId>,
    sets: Vec<StateSet>,
}

impl StateSetInterner {
    pub fn new() -> Self {
        StateSetInterner { ids: BTreeMap::new(), sets: Vec::new() }
    }

    /// Returns the ID of the set, and `true` if the set wasn't known yet.
    pub fn intern(&mut self, set: StateSet) -> (RowId, bool) {
        if let Some(&id) = self.ids.get(&set) {
            (id, false)
        } else {
            let id = self.sets.len() as RowId;
            self.ids.insert(set.clone(), id);
            self.sets.push(set);
            (id, true)
        }
    }

    pub fn get_id(&self, set: &StateSet) -> Option<RowId> {
        self.ids.get(set).copied()
    }

    pub fn get(&self, id: RowId) -> &StateSet {
        &self.sets[id as usize]
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateSet> {
        self.sets.iter()
    }

    pub fn into_sets(self) -> Vec<StateSet> {
        self.sets
    }
}

// ---------------------------------------------------------------------------------------------
// Closures and subset step

/// Epsilon closures and subset simulation of an [NfaGraph].
///
/// The closures only keep the important states (with a transition or an accepting rule), which are
/// the only states the subset simulation needs. They're computed on demand and memoized.
pub struct ClosureEngine<'a> {
    graph: &'a NfaGraph,
    closures: Vec<Option<StateSet>>,
}

/// Creates the closure engine of `graph` and computes the closures of the start states and of the
/// transition targets, which are all the closures used by the lexer tables.
pub fn compute_closures(graph: &NfaGraph) -> ClosureEngine<'_> {
    let mut engine = ClosureEngine::new(graph);
    for lex in graph.get_lex_states() {
        engine.closure(lex.start);
    }
    for state in graph.get_states() {
        if let Some((_, target)) = &state.transition {
            engine.closure(*target);
        }
    }
    engine
}

impl<'a> ClosureEngine<'a> {
    pub fn new(graph: &'a NfaGraph) -> Self {
        ClosureEngine { graph, closures: vec![None; graph.nbr_states()] }
    }

    pub fn graph(&self) -> &'a NfaGraph {
        self.graph
    }

    /// All the states reachable from `state` through epsilon transitions, including `state`.
    pub fn epsilon_closure(&self, state: StateId) -> BTreeSet<StateId> {
        epsilon_closure(self.graph, state)
    }

    /// Important states of the epsilon closure of `state`.
    pub fn closure(&mut self, state: StateId) -> &StateSet {
        let graph = self.graph;
        self.closures[state as usize].get_or_insert_with(|| {
            epsilon_closure(graph, state).into_iter()
                .filter(|&s| graph.get_state(s).is_important())
                .collect()
        })
    }

    /// Active states before the first character of a token in the lexical state `lex`.
    pub fn start_set(&mut self, lex: LexStateId) -> StateSet {
        let start = self.graph.get_lex_states()[lex as usize].start;
        self.closure(start).clone()
    }

    /// Active states after reading `c`: the union of the closures of the transition targets of
    /// the members whose class contains `c`.
    pub fn step(&mut self, active: &StateSet, c: char) -> StateSet {
        let graph = self.graph;
        let mut next = StateSet::new();
        for state in active.iter() {
            if let Some((segments, target)) = &graph.get_state(state).transition {
                if segments.contains(c as u32) {
                    next.extend(self.closure(*target));
                }
            }
        }
        next
    }

    /// Rule accepted by a set of active states: the accepting member with the lowest ordinal.
    ///
    /// Returns an error if two members accept different rules with the same ordinal, which
    /// can't happen in a valid graph.
    pub fn accept_of(&self, set: &StateSet) -> Result<Option<Accept>, String> {
        let mut best: Option<Accept> = None;
        for state in set.iter() {
            if let Some(accept) = self.graph.get_state(state).accept {
                best = match best {
                    None => Some(accept),
                    Some(b) if accept.ordinal < b.ordinal => Some(accept),
                    Some(b) if accept.ordinal == b.ordinal && (accept.rule != b.rule || accept.kind != b.kind) => {
                        return Err(format!("rules {} and {} accepted in {set} have the same ordinal {}", b.rule, accept.rule, accept.ordinal));
                    }
                    keep => keep,
                }
            }
        }
        Ok(best)
    }

    /// Partition of the classes of all the transitions of `set`. Each segment of the partition
    /// leads to the same [step](ClosureEngine::step) result for all its characters.
    pub fn partition(&self, set: &StateSet) -> Segments {
        let mut partition = Segments::empty();
        for state in set.iter() {
            if let Some((segments, _)) = &self.graph.get_state(state).transition {
                partition.add_partition(segments);
            }
        }
        partition
    }

    /// Longest prefix of `input` matched in the lexical state `lex`, with its rule and its length
    /// in characters. Empty matches aren't tokens.
    pub fn longest_match(&mut self, lex: LexStateId, input: &str) -> Result<Option<(Accept, usize)>, String> {
        let mut active = self.start_set(lex);
        let mut best = None;
        for (i, c) in input.chars().enumerate() {
            active = self.step(&active, c);
            if active.is_empty() {
                break;
            }
            if let Some(accept) = self.accept_of(&active)? {
                best = Some((accept, i + 1));
            }
        }
        Ok(best)
    }
}

fn epsilon_closure(graph: &NfaGraph, state: StateId) -> BTreeSet<StateId> {
    let mut closure = BTreeSet::new();
    let mut stack = vec![state];
    while let Some(s) = stack.pop() {
        if closure.insert(s) {
            stack.extend(graph.get_state(s).epsilon.iter().copied());
        }
    }
    closure
}
