//! Lazy tokenizer for Go source text.

pub mod tokenizer;
pub mod winnow;

pub use tokenizer::{lex, Keyword, Lexer, LexerError, Token, TokenKind};
