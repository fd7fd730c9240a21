// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

#![cfg(test)]

use nfalex_core::log::{BufLog, LogReader, LogStatus, Logger};
use crate::build::{BuildErrorKind, BuildErrorSource, BuildInto, TryBuildInto};
use crate::regex::{LexicalState, Lexicon, RegexNode, TokenRule};
use crate::segments;
use super::*;

fn lexicon(rules: Vec<TokenRule>) -> Lexicon {
    Lexicon::new(vec![LexicalState::new("DEFAULT", rules)])
}

fn errors(graph: &NfaGraph) -> Vec<String> {
    graph.get_log().get_errors().cloned().collect()
}

#[test]
fn nfa_literal() {
    let graph = NfaGraph::build(lexicon(vec![TokenRule::new(0, 10, RegexNode::string("ab"))]), &LexerGenOptions::default());
    assert_eq!(graph.to_string(), "\
        lexical state 0 'DEFAULT': start 0, rules 0..1\n\
        - 0: ε -> 1\n\
        - 1: 'a' -> 2\n\
        - 2: 'b' -> 3\n\
        - 3: accept rule 0 (ordinal 0, kind 10)\n");
    assert!(graph.get_log().has_no_errors());
    assert_eq!(graph.get_rule(0).fragment, Some((1, 3)));
    assert_eq!(graph.get_log().get_notes().next().map(|s| s.as_str()), Some("NFA: 4 states, 1 rules, 1 lexical state(s)"));
}

#[test]
fn nfa_operators() {
    let tests: Vec<(RegexNode, &str)> = vec![
        (RegexNode::plus(RegexNode::chars(&[('a', 'z')])), "\
            - 0: ε -> 3\n\
            - 1: 'a'-'z' -> 2\n\
            - 2: ε -> 1, 4\n\
            - 3: ε -> 1\n\
            - 4: accept rule 0 (ordinal 0, kind 1)\n"),
        (RegexNode::star(RegexNode::string("a")), "\
            - 0: ε -> 3\n\
            - 1: 'a' -> 2\n\
            - 2: ε -> 1, 4\n\
            - 3: ε -> 1, 4\n\
            - 4: accept rule 0 (ordinal 0, kind 1)\n"),
        (RegexNode::opt(RegexNode::string("a")), "\
            - 0: ε -> 3\n\
            - 1: 'a' -> 2\n\
            - 2: ε -> 4\n\
            - 3: ε -> 1, 4\n\
            - 4: accept rule 0 (ordinal 0, kind 1)\n"),
        (RegexNode::choice(vec![RegexNode::string("a"), RegexNode::string("b")]), "\
            - 0: ε -> 1\n\
            - 1: ε -> 3, 5\n\
            - 2: accept rule 0 (ordinal 0, kind 1)\n\
            - 3: 'a' -> 4\n\
            - 4: ε -> 2\n\
            - 5: 'b' -> 6\n\
            - 6: ε -> 2\n"),
        (RegexNode::seq(vec![RegexNode::string("a"), RegexNode::chars(&[('0', '9')])]), "\
            - 0: ε -> 1\n\
            - 1: 'a' -> 2\n\
            - 2: ε -> 3\n\
            - 3: '0'-'9' -> 4\n\
            - 4: accept rule 0 (ordinal 0, kind 1)\n"),
        (RegexNode::string("if"), "\
            - 0: ε -> 1\n\
            - 1: 'i' -> 2\n\
            - 2: 'f' -> 3\n\
            - 3: accept rule 0 (ordinal 0, kind 1)\n"),
        (RegexNode::repeat(RegexNode::string("a"), 2, Some(3)), "\
            - 0: ε -> 1\n\
            - 1: ε -> 2\n\
            - 2: 'a' -> 3\n\
            - 3: ε -> 4\n\
            - 4: 'a' -> 5\n\
            - 5: ε -> 6, 7\n\
            - 6: accept rule 0 (ordinal 0, kind 1)\n\
            - 7: 'a' -> 8\n\
            - 8: ε -> 6\n"),
        (RegexNode::repeat(RegexNode::string("a"), 1, None), "\
            - 0: ε -> 1\n\
            - 1: ε -> 2\n\
            - 2: 'a' -> 3\n\
            - 3: ε -> 5, 4\n\
            - 4: accept rule 0 (ordinal 0, kind 1)\n\
            - 5: 'a' -> 6\n\
            - 6: ε -> 5, 4\n"),
        (RegexNode::string(""), "\
            - 0: ε -> 1\n\
            - 1: accept rule 0 (ordinal 0, kind 1)\n"),
    ];
    for (idx, (regex, expected)) in tests.into_iter().enumerate() {
        let graph = NfaGraph::build(lexicon(vec![TokenRule::new(0, 1, regex)]), &LexerGenOptions::default());
        let result = graph.to_string();
        let states = result.lines().skip(1).map(|l| format!("{l}\n")).collect::<String>();
        assert_eq!(states, expected, "test {idx} failed");
        assert!(graph.get_log().has_no_errors(), "test {idx} failed");
    }
}

#[test]
fn nfa_ignore_case() {
    let graph = NfaGraph::build(lexicon(vec![
        TokenRule::new(0, 1, RegexNode::string("if")).ignore_case(),
        TokenRule::new(1, 2, RegexNode::not_chars(&[('a', 'b')])).ignore_case(),
    ]), &LexerGenOptions::default());
    assert_eq!(graph.get_state(1).transition, Some((segments!['I', 'i'], 2)));
    assert_eq!(graph.get_state(2).transition, Some((segments!['F', 'f'], 3)));
    assert_eq!(graph.get_state(4).transition, Some((segments![~ 'A'-'B', 'a'-'b'], 5)));
}

#[test]
fn nfa_references() {
    let lexicon = Lexicon::new(vec![
        LexicalState::new("DEFAULT", vec![
            TokenRule::new(0, 1, RegexNode::chars(&[('0', '9')]).with_label("DIGIT").private()),
            TokenRule::new(1, 2, RegexNode::seq(vec![RegexNode::reference("DIGIT"), RegexNode::reference("DIGIT")])),
        ]),
        LexicalState::new("OTHER", vec![
            TokenRule::new(2, 3, RegexNode::reference("DIGIT")),
        ]),
    ]);
    let graph = NfaGraph::build(lexicon, &LexerGenOptions::default());
    assert!(graph.get_log().has_no_errors());
    assert_eq!(graph.to_string(), "\
        lexical state 0 'DEFAULT': start 0, rules 0..2\n\
        lexical state 1 'OTHER': start 5, rules 2..3\n\
        - 0: ε -> 1\n\
        - 1: '0'-'9' -> 2\n\
        - 2: ε -> 3\n\
        - 3: '0'-'9' -> 4\n\
        - 4: accept rule 1 (ordinal 1, kind 2)\n\
        - 5: ε -> 6\n\
        - 6: '0'-'9' -> 7\n\
        - 7: accept rule 2 (ordinal 2, kind 3)\n");
    assert_eq!(graph.get_rule(0).fragment, None);
    assert_eq!(graph.get_state(6).lex_state, 1);
    assert_eq!(graph.lex_state_id("OTHER"), Some(1));
}

#[test]
fn nfa_eof_and_next_state() {
    let lexicon = Lexicon::new(vec![
        LexicalState::new("DEFAULT", vec![
            TokenRule::new(0, 0, RegexNode::eof()),
            TokenRule::new(1, 5, RegexNode::string("\"")).category(RuleCategory::More).next_state("STRING"),
        ]),
        LexicalState::new("STRING", vec![
            TokenRule::new(2, 5, RegexNode::string("\"")).next_state("DEFAULT"),
        ]),
    ]);
    let graph = NfaGraph::build(lexicon, &LexerGenOptions::default());
    assert!(graph.get_log().has_no_errors());
    assert_eq!(graph.get_lex_states()[0].eof_rule, Some(0));
    assert_eq!(graph.get_lex_states()[1].eof_rule, None);
    assert!(graph.get_rule(0).is_eof);
    assert_eq!(graph.get_rule(1).next_state, Some(1));
    assert_eq!(graph.get_rule(2).next_state, Some(0));
    assert_eq!(graph.get_rule(1).category, RuleCategory::More);
}

#[test]
fn nfa_errors() {
    let tests: Vec<(Vec<TokenRule>, Vec<&str>)> = vec![
        (vec![TokenRule::new(0, 1, RegexNode::seq(vec![RegexNode::string("a"), RegexNode::reference("FOO").at(2, 5)]))],
         vec!["2:5: undefined reference to <FOO>"]),
        (vec![TokenRule::new(0, 1, RegexNode::seq(vec![RegexNode::string("x"), RegexNode::reference("A").at(1, 9)]).with_label("A"))],
         vec!["1:9: recursive reference to <A>"]),
        (vec![TokenRule::new(0, 1, RegexNode::chars(&[('z', 'a')]).at(1, 1))],
         vec!["1:1: invalid range 'z'-'a'"]),
        (vec![TokenRule::new(0, 1, RegexNode::repeat(RegexNode::string("a"), 3, Some(2)).at(4, 2))],
         vec!["4:2: invalid repetition range {3,2}"]),
        (vec![TokenRule::new(0, 1, RegexNode::repeat(RegexNode::string("a"), 2000, None).at(1, 3))],
         vec!["1:3: repetition bound 2000 exceeds the maximum 1000"]),
        (vec![TokenRule::new(0, 1, RegexNode::seq(vec![RegexNode::string("a"), RegexNode::eof().at(1, 4)]))],
         vec!["1:4: <EOF> must be the whole pattern of a rule"]),
        (vec![TokenRule::new(0, 0, RegexNode::eof().at(1, 1)), TokenRule::new(1, 0, RegexNode::eof().at(2, 1))],
         vec!["2:1: lexical state 'DEFAULT' has several <EOF> rules"]),
        (vec![TokenRule::new(5, 1, RegexNode::string("a")), TokenRule::new(5, 2, RegexNode::string("b").at(2, 1))],
         vec!["2:1: rule \"b\": ordinal 5 must be greater than the previous ordinal 5"]),
        (vec![TokenRule::new(0, 1, RegexNode::string("a")).next_state("NOWHERE")],
         vec!["rule \"a\": unknown lexical state 'NOWHERE'"]),
        (vec![TokenRule::new(0, 0, RegexNode::string("a"))],
         vec!["rule \"a\": kind 0 is reserved for <EOF>"]),
        (vec![TokenRule::new(0, 0, RegexNode::string(" ")).category(RuleCategory::Skip)],
         vec![]),
        (vec![TokenRule::new(0, 1, RegexNode::reference("NONE").with_label("P").private())],
         vec!["undefined reference to <NONE>"]),
        // an inlined expression reports its errors once
        (vec![
            TokenRule::new(0, 1, RegexNode::reference("NONE").at(1, 2).with_label("P").private()),
            TokenRule::new(1, 2, RegexNode::seq(vec![RegexNode::reference("P"), RegexNode::reference("P")])),
        ],
         vec!["1:2: undefined reference to <NONE>"]),
        // the same fault in two rules is reported twice, even without position
        (vec![
            TokenRule::new(0, 1, RegexNode::seq(vec![RegexNode::string("a"), RegexNode::reference("X")])),
            TokenRule::new(1, 2, RegexNode::seq(vec![RegexNode::string("b"), RegexNode::reference("X")])),
        ],
         vec!["undefined reference to <X>", "undefined reference to <X>"]),
        (vec![
            TokenRule::new(0, 1, RegexNode::repeat(RegexNode::chars(&[('9', '0')]), 3, None)),
            TokenRule::new(1, 2, RegexNode::chars(&[('9', '0')])),
        ],
         vec!["invalid range '9'-'0'", "invalid range '9'-'0'"]),
    ];
    for (idx, (rules, expected)) in tests.into_iter().enumerate() {
        let graph = NfaGraph::build(lexicon(rules), &LexerGenOptions::default());
        assert_eq!(errors(&graph), expected, "test {idx} failed");
    }
}

#[test]
fn nfa_private_rule_has_no_states() {
    let graph = NfaGraph::build(lexicon(vec![
        TokenRule::new(0, 1, RegexNode::string("abc").with_label("P").private()),
    ]), &LexerGenOptions::default());
    assert_eq!(graph.nbr_states(), 1);
    assert!(graph.get_state(0).epsilon.is_empty());
}

#[test]
fn nfa_empty_class_warning() {
    let graph = NfaGraph::build(lexicon(vec![
        TokenRule::new(0, 1, RegexNode::not_chars(&[('\0', '\u{10ffff}')])),
    ]), &LexerGenOptions::default());
    assert!(graph.get_log().has_no_errors());
    assert_eq!(graph.get_log().get_warnings().cloned().collect::<Vec<_>>(),
               vec!["character class ~[\"MIN\"-\"MAX\"] is empty and never matches".to_string()]);
    assert_eq!(graph.get_state(1).transition, None);
}

#[test]
fn nfa_lexicon_errors() {
    let graph = NfaGraph::build(Lexicon::new(vec![]), &LexerGenOptions::default());
    assert_eq!(errors(&graph), vec!["the lexicon has no lexical state"]);

    let mut state = LexicalState::new("A", vec![TokenRule::new(0, 1, RegexNode::string("a"))]);
    state.pos = Some(Pos(7, 1));
    let graph = NfaGraph::build(Lexicon::new(vec![state.clone(), state]), &LexerGenOptions::default());
    assert_eq!(errors(&graph), vec!["7:1: lexical state 'A' is already defined"]);

    let options = LexerGenOptions { max_repetition: 2, ..LexerGenOptions::default() };
    let graph = NfaGraph::build(lexicon(vec![TokenRule::new(0, 1, RegexNode::repeat(RegexNode::string("a"), 0, Some(3)))]), &options);
    assert_eq!(errors(&graph), vec!["repetition bound 3 exceeds the maximum 2"]);
}

#[test]
fn nfa_build_from() {
    let graph: NfaGraph = lexicon(vec![TokenRule::new(0, 1, RegexNode::string("a"))]).build_into();
    assert_eq!(graph.nbr_states(), 3);

    let result: Result<NfaGraph, _> = lexicon(vec![TokenRule::new(0, 1, RegexNode::reference("X"))]).try_build_into();
    let error = result.err().expect("should fail");
    assert_eq!(error.get_source(), BuildErrorSource::NfaBuilder);
    assert_eq!(error.get_kind(), BuildErrorKind::Config);

    let mut log = BufLog::new();
    log.add_error("syntax error");
    let result: Result<NfaGraph, _> = Lexicon::with_log(vec![], log).try_build_into();
    let error = result.err().expect("should fail");
    assert_eq!(error.get_source(), BuildErrorSource::Lexicon);
    assert_eq!(error.get_log().get_errors().cloned().collect::<Vec<_>>(), vec!["syntax error".to_string()]);
}
