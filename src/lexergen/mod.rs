// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.


use std::fs::File;
use std::io::{BufWriter, Write};
use iter_index::IndexerIterator;
use nfalex_core::char_reader::CharStream;
use nfalex_core::class::{BitVec256, ClassTables, ClassTest};
use nfalex_core::lexer::{LexStateEntry, Lexer, Terminal, Transition};
use nfalex_core::log::{BufLog, LogReader, LogStatus, Logger};
use nfalex_core::{BitVecId, CollectJoin, Kind, LexStateId, PageId, RowId, RuleId, StateId};
use crate::build::{BuildError, BuildErrorSource, BuildFrom, HasBuildErrorSource, TryBuildFrom};
use crate::canon::{canonicalize, check_empty_matches, find_unmatched_rules, CanonTables};
use crate::charclass::{CharClassTables, ClassCompiler};
use crate::closure::compute_closures;
use crate::indent_source;
use crate::nfa::NfaGraph;
use crate::options::LexerGenOptions;
use crate::regex::Lexicon;

// ---------------------------------------------------------------------------------------------

/// Tables used to create a Lexer. This type is used as a return object from the lexer generator,
/// when the Lexer must be created dynamically; for example, in tests or in situations where the lexicon isn't
/// known in advance. In those situations, the LexerTables object must live as long as the lexer.
///
/// The Lexer itself only uses references to tables because, in most situations, the tables are
/// static in generated source files.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LexerTables {
    terminals: Vec<Terminal>,
    lex_states: Vec<LexStateEntry>,
    rows: Vec<(u32, u32)>,
    row_members: Vec<StateId>,
    row_rules: Vec<Option<RuleId>>,
    transitions: Vec<Option<Transition>>,
    classes: Vec<ClassTest>,
    bit_vectors: Vec<BitVec256>,
    page_maps: Vec<(u32, u32)>,
    page_entries: Vec<(PageId, BitVecId)>,
}

impl LexerTables {
    pub fn make_lexer<S: CharStream>(&self) -> Lexer<'_, S> {
        Lexer::new(
            &self.terminals,
            &self.lex_states,
            &self.rows,
            &self.row_members,
            &self.row_rules,
            &self.transitions,
            &self.classes,
            ClassTables { bit_vectors: &self.bit_vectors, page_maps: &self.page_maps, page_entries: &self.page_entries },
        )
    }
}

impl BuildFrom<LexerGen> for LexerTables {
    fn build_from(lexer_gen: LexerGen) -> LexerTables {
        let CharClassTables { classes, bit_vectors, page_maps, page_entries } = lexer_gen.class_tables;
        LexerTables {
            terminals: lexer_gen.terminals,
            lex_states: lexer_gen.lex_states,
            rows: lexer_gen.rows,
            row_members: lexer_gen.row_members,
            row_rules: lexer_gen.row_rules,
            transitions: lexer_gen.transitions,
            classes,
            bit_vectors,
            page_maps,
            page_entries,
        }
    }
}

// not generated automatically since LexerTables isn't LogReader
impl TryBuildFrom<LexerGen> for LexerTables {
    type Error = BuildError;

    fn try_build_from(source: LexerGen) -> Result<Self, Self::Error> {
        if source.get_log().has_no_errors() {
            Ok(LexerTables::build_from(source))
        } else {
            Err(source.into_build_error())
        }
    }
}

// ---------------------------------------------------------------------------------------------

/// Lexer generator: compiles the NFA of a lexicon into the tables of the runtime [Lexer].
///
/// The NFA states are kept as they are. The generator adds:
/// * the canonical rows of states reached by each transition (`StatesForState`) and the rule they
///   accept (`KindForState`),
/// * one [Transition] per NFA state that consumes a character, whose class is compiled and interned
///   by a [ClassCompiler],
/// * the terminal instructions of every rule.
///
/// The tables aren't built if the NFA has errors; the log holds the reasons.
#[derive(Debug)]
pub struct LexerGen {
    pub options: LexerGenOptions,
    // rules and lexical states:
    pub terminals: Vec<Terminal>,
    pub rule_names: Vec<String>,
    pub lex_state_names: Vec<String>,
    pub lex_states: Vec<LexStateEntry>,
    // rows:
    pub canon: CanonTables,
    pub rows: Vec<(u32, u32)>,
    pub row_members: Vec<StateId>,
    pub row_rules: Vec<Option<RuleId>>,
    // transitions:
    pub transitions: Vec<Option<Transition>>,
    pub class_tables: CharClassTables,
    /// first segments compiled into each class, for the comments of the generated code
    pub class_names: Vec<String>,
    // internal
    log: BufLog,
    internal_error: bool,
}

impl LexerGen {
    fn new(options: LexerGenOptions) -> Self {
        LexerGen {
            options,
            terminals: Vec::new(),
            rule_names: Vec::new(),
            lex_state_names: Vec::new(),
            lex_states: Vec::new(),
            canon: CanonTables::default(),
            rows: Vec::new(),
            row_members: Vec::new(),
            row_rules: Vec::new(),
            transitions: Vec::new(),
            class_tables: CharClassTables::default(),
            class_names: Vec::new(),
            log: BufLog::new(),
            internal_error: false,
        }
    }

    /// Builds the tables from the NFA. The log of the graph is transferred to the generator; if it
    /// contains errors, no table is built.
    pub fn build_from_graph(mut graph: NfaGraph, options: &LexerGenOptions) -> Self {
        let mut lexergen = LexerGen::new(options.clone());
        lexergen.log = std::mem::take(&mut graph.log);
        if lexergen.log.has_no_errors() {
            lexergen.make_from_graph(&graph);
        } else {
            log::debug!("NFA has {} error(s), tables not built", lexergen.log.num_errors());
        }
        lexergen
    }

    /// Compiles a lexicon with the given options.
    pub fn compile(lexicon: Lexicon, options: &LexerGenOptions) -> Result<LexerGen, BuildError> {
        if !lexicon.get_log().has_no_errors() {
            return Err(BuildError::new(lexicon.give_log(), BuildErrorSource::Lexicon));
        }
        let graph = NfaGraph::build(lexicon, options);
        if !graph.get_log().has_no_errors() {
            return Err(BuildError::new(graph.give_log(), BuildErrorSource::NfaBuilder));
        }
        let lexergen = LexerGen::build_from_graph(graph, options);
        if lexergen.get_log().has_no_errors() {
            Ok(lexergen)
        } else {
            Err(lexergen.into_build_error())
        }
    }

    fn into_build_error(self) -> BuildError {
        if self.internal_error {
            BuildError::internal(self.log, BuildErrorSource::LexerGen)
        } else {
            BuildError::new(self.log, BuildErrorSource::LexerGen)
        }
    }

    fn add_internal_error(&mut self, msg: String) {
        self.internal_error = true;
        self.log.add_error(format!("internal error: {msg}"));
    }

    fn make_from_graph(&mut self, graph: &NfaGraph) {
        let mut engine = compute_closures(graph);
        let canon = match canonicalize(&mut engine) {
            Ok(canon) => canon,
            Err(msg) => {
                self.add_internal_error(msg);
                return;
            }
        };
        check_empty_matches(&engine, &mut self.log);
        if self.options.warn_unreachable {
            if let Err(msg) = find_unmatched_rules(&mut engine, self.options.max_state_sets, &mut self.log) {
                self.add_internal_error(msg);
                return;
            }
        }
        self.create_rule_tables(graph, &canon);
        self.create_row_tables(&canon);
        self.create_transitions(graph, &canon);
        self.canon = canon;
        self.log.add_note(format!("tables: {} rows, {} classes, {} bit vector table(s)",
                                  self.rows.len(), self.class_tables.classes.len(), self.class_tables.bit_vectors.len()));
    }

    fn create_rule_tables(&mut self, graph: &NfaGraph, canon: &CanonTables) {
        for rule in graph.get_rules() {
            self.terminals.push(Terminal { kind: rule.kind, category: rule.category, next_state: rule.next_state });
            self.rule_names.push(rule.name.clone());
        }
        for (lex_id, lex) in graph.get_lex_states().iter().enumerate() {
            let start_row = canon.lex_states.get(lex_id).copied().flatten().map(|rows| rows.first_row);
            self.lex_states.push(LexStateEntry { start_row, eof_rule: lex.eof_rule });
            self.lex_state_names.push(lex.name.clone());
        }
    }

    fn create_row_tables(&mut self, canon: &CanonTables) {
        for (row_id, row) in canon.rows.iter().index::<RowId>() {
            let first = self.row_members.len() as u32;
            self.row_members.extend(row.iter());
            self.rows.push((first, self.row_members.len() as u32));
            self.row_rules.push(canon.row_rule(row_id));
        }
        log::debug!("{} rows, {} row members", self.rows.len(), self.row_members.len());
    }

    /// Compiles the class of each NFA state with a transition, in ascending state order, so the
    /// class IDs only depend on the NFA.
    fn create_transitions(&mut self, graph: &NfaGraph, canon: &CanonTables) {
        let mut compiler = ClassCompiler::new();
        for (state_id, state) in graph.get_states().iter().index::<StateId>() {
            let transition = match (&state.transition, canon.next_rows[state_id as usize]) {
                (Some((segments, _)), Some(next_row)) => {
                    let class = compiler.intern_class(segments);
                    if class as usize == self.class_names.len() {
                        self.class_names.push(segments.to_string());
                    }
                    Some(Transition { class, next_row })
                }
                _ => None,
            };
            self.transitions.push(transition);
        }
        log::debug!("{} classes, {} bit vector tables", compiler.nbr_classes(), compiler.nbr_bit_vectors());
        self.class_tables = compiler.into_tables();
    }

    pub fn has_tables(&self) -> bool {
        !self.transitions.is_empty()
    }

    pub fn lex_state_id(&self, name: &str) -> Option<LexStateId> {
        self.lex_state_names.iter().position(|n| n == name).map(|id| id as LexStateId)
    }

    /// `StatesForState` table of a lexical state, or `None` if it can't match any character.
    pub fn states_for_state(&self, lex: LexStateId) -> Option<Vec<Vec<StateId>>> {
        self.canon.states_for_state(lex)
    }

    /// `KindForState` table of a lexical state, or `None` if it can't match any character.
    pub fn kind_for_state(&self, lex: LexStateId) -> Option<Vec<Option<Kind>>> {
        self.canon.kind_for_state(lex)
    }

    /// Interned 256-bit page tables, shared by all the lexical states.
    pub fn bit_vector_tables(&self) -> &[BitVec256] {
        &self.class_tables.bit_vectors
    }

    pub fn write_source_code(&self, file: Option<File>, indent: usize) -> Result<(), std::io::Error> {
        let mut out: BufWriter<Box<dyn Write>> = match file {
            Some(file) => BufWriter::new(Box::new(file)),
            None => BufWriter::new(Box::new(std::io::stdout().lock()))
        };
        let source = self.gen_source_code(indent);
        out.write_all(source.as_bytes())?;
        out.flush()
    }

    pub fn gen_source_code(&self, indent: usize) -> String {
        let mut parts = vec![];
        if !self.options.headers.is_empty() {
            parts.push(self.options.headers.clone());
        }
        parts.push(self.lexer_source_code());
        indent_source(parts, indent)
    }

    pub fn try_gen_source_code(self, indent: usize) -> Result<String, BuildError> {
        if self.log.has_no_errors() {
            Ok(self.gen_source_code(indent))
        } else {
            Err(self.into_build_error())
        }
    }

    fn lexer_source_code(&self) -> Vec<String> {
        let mut source = Vec::<String>::new();
        source.push("use nfalex_core::char_reader::CharStream;".to_string());
        source.push("use nfalex_core::class::{BitVec256, ClassTables, ClassTest};".to_string());
        source.push("use nfalex_core::lexer::{LexStateEntry, Lexer, RuleCategory, Terminal, Transition};".to_string());
        source.push("use nfalex_core::{BitVecId, PageId, RuleId, StateId};".to_string());
        source.push(String::new());

        // rows of each lexical state
        for (lex_id, name) in self.lex_state_names.iter().index::<LexStateId>() {
            match self.canon.lex_rows(lex_id) {
                Some(range) => {
                    source.push(format!("// lexical state {lex_id} '{name}': rows {}..{}", range.start, range.end));
                    for row in range {
                        source.push(format!("// - row {row}: {}, kind {}", self.canon.rows[row],
                                            self.canon.row_accepts[row].map(|a| a.kind.to_string()).unwrap_or("None".to_string())));
                    }
                }
                None => source.push(format!("// lexical state {lex_id} '{name}': no rows (None)")),
            }
        }
        source.push(String::new());

        source.push(format!("static TERMINALS: [Terminal; {}] = [", self.terminals.len()));
        for (rule_id, t) in self.terminals.iter().index::<RuleId>() {
            source.push(format!("    Terminal {{ kind: {}, category: RuleCategory::{:?}, next_state: {:?} }}, // {rule_id}: {}",
                                t.kind, t.category, t.next_state, self.rule_names[rule_id as usize]));
        }
        source.push("];".to_string());
        source.push(format!("static LEX_STATES: [LexStateEntry; {}] = [", self.lex_states.len()));
        for (lex_id, entry) in self.lex_states.iter().index::<LexStateId>() {
            source.push(format!("    LexStateEntry {{ start_row: {:?}, eof_rule: {:?} }}, // {lex_id}: {}",
                                entry.start_row, entry.eof_rule, self.lex_state_names[lex_id as usize]));
        }
        source.push("];".to_string());
        source.push(format!("static ROWS: [(u32, u32); {}] = [", self.rows.len()));
        for (row_id, (first, end)) in self.rows.iter().index::<RowId>() {
            source.push(format!("    ({first}, {end}), // row {row_id}"));
        }
        source.push("];".to_string());
        source.push(format!("static ROW_MEMBERS: [StateId; {}] = [", self.row_members.len()));
        for (row_id, &(first, end)) in self.rows.iter().index::<RowId>() {
            let members = &self.row_members[first as usize..end as usize];
            if !members.is_empty() {
                source.push(format!("    {}, // row {row_id}", members.iter().join(", ")));
            }
        }
        source.push("];".to_string());
        source.push(format!("static ROW_RULES: [Option<RuleId>; {}] = [", self.row_rules.len()));
        for rules in self.row_rules.chunks(16) {
            source.push(format!("    {},", rules.iter().map(|r| format!("{r:?}")).join(", ")));
        }
        source.push("];".to_string());
        source.push(format!("static TRANSITIONS: [Option<Transition>; {}] = [", self.transitions.len()));
        for (state_id, t) in self.transitions.iter().index::<StateId>() {
            match t {
                Some(Transition { class, next_row }) =>
                    source.push(format!("    Some(Transition {{ class: {class}, next_row: {next_row} }}), // state {state_id}")),
                None => source.push(format!("    None, // state {state_id}")),
            }
        }
        source.push("];".to_string());
        source.push(format!("static CLASSES: [ClassTest; {}] = [", self.class_tables.classes.len()));
        for (class_id, class) in self.class_tables.classes.iter().enumerate() {
            source.push(format!("    ClassTest {{ ascii: [0x{:016x}, 0x{:016x}], pages: {:?} }}, // {class_id}: {}",
                                class.ascii[0], class.ascii[1], class.pages, self.class_names[class_id]));
        }
        source.push("];".to_string());
        source.push(format!("static BIT_VECTORS: [BitVec256; {}] = [", self.class_tables.bit_vectors.len()));
        for bit_vector in &self.class_tables.bit_vectors {
            source.push(format!("    {bit_vector:?},"));
        }
        source.push("];".to_string());
        source.push(format!("static PAGE_MAPS: [(u32, u32); {}] = [", self.class_tables.page_maps.len()));
        for (first, end) in &self.class_tables.page_maps {
            source.push(format!("    ({first}, {end}),"));
        }
        source.push("];".to_string());
        source.push(format!("static PAGE_ENTRIES: [(PageId, BitVecId); {}] = [", self.class_tables.page_entries.len()));
        for (page, bit_vector) in &self.class_tables.page_entries {
            source.push(format!("    ({page}, {bit_vector}),"));
        }
        source.push("];".to_string());
        source.push(String::new());
        source.push("pub fn build_lexer<S: CharStream>() -> Lexer<'static, S> {".to_string());
        source.push("    Lexer::new(".to_string());
        source.push("        &TERMINALS,".to_string());
        source.push("        &LEX_STATES,".to_string());
        source.push("        &ROWS,".to_string());
        source.push("        &ROW_MEMBERS,".to_string());
        source.push("        &ROW_RULES,".to_string());
        source.push("        &TRANSITIONS,".to_string());
        source.push("        &CLASSES,".to_string());
        source.push("        ClassTables { bit_vectors: &BIT_VECTORS, page_maps: &PAGE_MAPS, page_entries: &PAGE_ENTRIES },".to_string());
        source.push("    )".to_string());
        source.push("}".to_string());
        source
    }
}

impl LogReader for LexerGen {
    type Item = BufLog;

    fn get_log(&self) -> &Self::Item {
        &self.log
    }

    fn give_log(self) -> Self::Item {
        self.log
    }
}

impl HasBuildErrorSource for LexerGen {
    const SOURCE: BuildErrorSource = BuildErrorSource::LexerGen;

    fn has_internal_error(&self) -> bool {
        self.internal_error
    }
}

impl BuildFrom<NfaGraph> for LexerGen {
    fn build_from(graph: NfaGraph) -> Self {
        LexerGen::build_from_graph(graph, &LexerGenOptions::default())
    }
}
