pub(crate) mod ident_lexer;

pub(crate) use ident_lexer::ident_lexer::build_lexer;
