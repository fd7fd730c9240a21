// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

/// Options of the lexer generator.
///
/// See [LexerGenOptionsBuilder] for the accompanying builder.
#[derive(Clone, PartialEq, Debug)]
pub struct LexerGenOptions {
    /// Maximum bound accepted in a repetition range `{min,max}`; each repetition copies the
    /// repeated fragment in the NFA.
    pub max_repetition: u32,
    /// Maximum number of state sets explored when looking for rules that can never be matched.
    /// The exploration is skipped when it's 0.
    pub max_state_sets: usize,
    /// Emits a warning for each rule that can never be matched.
    pub warn_unreachable: bool,
    /// Extra headers before the generated code
    pub headers: Vec<String>,
}

impl LexerGenOptions {
    pub const DEFAULT_MAX_REPETITION: u32 = 1000;
    pub const DEFAULT_MAX_STATE_SETS: usize = 10_000;
}

impl Default for LexerGenOptions {
    fn default() -> Self {
        LexerGenOptions {
            max_repetition: Self::DEFAULT_MAX_REPETITION,
            max_state_sets: Self::DEFAULT_MAX_STATE_SETS,
            warn_unreachable: true,
            headers: vec![],
        }
    }
}

/// Builder of the [LexerGenOptions] object.
///
/// Initially, the option settings correspond to [LexerGenOptions]'s defaults. The builder offers a
/// convenient way to chain methods in order to set custom options.
///
/// The [build](LexerGenOptionsBuilder::build) method creates the resulting object and resets the
/// builder, while [options](LexerGenOptionsBuilder::options) moves the builder.
#[derive(Clone, Default)]
pub struct LexerGenOptionsBuilder {
    options: LexerGenOptions,
}

impl LexerGenOptionsBuilder {
    pub fn new() -> Self {
        LexerGenOptionsBuilder { options: LexerGenOptions::default() }
    }

    /// Sets the maximum bound of a repetition range (default is [LexerGenOptions::DEFAULT_MAX_REPETITION])
    pub fn max_repetition(&mut self, max_repetition: u32) -> &mut Self {
        self.options.max_repetition = max_repetition;
        self
    }

    /// Sets the maximum number of state sets explored by the reachability analysis
    /// (default is [LexerGenOptions::DEFAULT_MAX_STATE_SETS])
    pub fn max_state_sets(&mut self, max_state_sets: usize) -> &mut Self {
        self.options.max_state_sets = max_state_sets;
        self
    }

    /// Sets the boolean option that reports the rules that can never be matched.
    ///
    /// Default: `true`
    pub fn warn_unreachable(&mut self, warn_unreachable: bool) -> &mut Self {
        self.options.warn_unreachable = warn_unreachable;
        self
    }

    /// **Adds** optional headers, which will be placed in front of the generated code (even before the
    /// `use` clauses). This can be used to place inner attributes like `#![allow(unused)]`.
    pub fn headers<I: IntoIterator<Item=T>, T: Into<String>>(&mut self, headers: I) -> &mut Self {
        self.options.headers.extend(headers.into_iter().map(|s| s.into()));
        self
    }

    /// Creates a [LexerGenOptions] object with the current options.
    ///
    /// **The builder resets the options to their default values** after creating and returning that object.
    pub fn build(&mut self) -> LexerGenOptions {
        std::mem::take(&mut self.options)
    }

    /// Creates a [LexerGenOptions] object with the current options, moving the builder.
    pub fn options(self) -> LexerGenOptions {
        self.options
    }
}
