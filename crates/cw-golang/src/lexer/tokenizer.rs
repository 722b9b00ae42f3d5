use cw_core::span::Span;
use std::fmt;
use thiserror::Error;
use winnow::error::ErrMode;
use winnow::token::{literal, take_while};
use winnow::{ModalResult, Parser};

use super::winnow::{
    blank, block_comment, is_ident_continue, is_ident_start, line_comment, parse_interpreted_string,
    parse_number, parse_raw_string, parse_rune, MULTI_PUNCT, SINGLE_PUNCT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Break,
    Case,
    Chan,
    Const,
    Continue,
    Default,
    Defer,
    Else,
    Fallthrough,
    For,
    Func,
    Go,
    Goto,
    If,
    Import,
    Interface,
    Map,
    Package,
    Range,
    Return,
    Select,
    Struct,
    Switch,
    Type,
    Var,
}

impl Keyword {
    pub fn from_ident(s: &str) -> Option<Self> {
        Some(match s {
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "chan" => Keyword::Chan,
            "const" => Keyword::Const,
            "continue" => Keyword::Continue,
            "default" => Keyword::Default,
            "defer" => Keyword::Defer,
            "else" => Keyword::Else,
            "fallthrough" => Keyword::Fallthrough,
            "for" => Keyword::For,
            "func" => Keyword::Func,
            "go" => Keyword::Go,
            "goto" => Keyword::Goto,
            "if" => Keyword::If,
            "import" => Keyword::Import,
            "interface" => Keyword::Interface,
            "map" => Keyword::Map,
            "package" => Keyword::Package,
            "range" => Keyword::Range,
            "return" => Keyword::Return,
            "select" => Keyword::Select,
            "struct" => Keyword::Struct,
            "switch" => Keyword::Switch,
            "type" => Keyword::Type,
            "var" => Keyword::Var,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Keyword(Keyword),
    Number,
    Rune,
    String,
    Symbol,
    /// Explicit `;` or one inserted at a line break.
    Semi { implicit: bool },
    LineComment,
    BlockComment,
}

impl TokenKind {
    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub span: Span,
    /// 1-based line on which the token starts.
    pub line: u32,
}

impl<'a> Token<'a> {
    pub fn is_symbol(&self, sym: &str) -> bool {
        self.kind == TokenKind::Symbol && self.lexeme == sym
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    pub fn is_semi(&self) -> bool {
        matches!(self.kind, TokenKind::Semi { .. })
    }

    /// Line on which the token ends; differs from `line` for raw strings and block comments.
    pub fn end_line(&self) -> u32 {
        self.line + self.lexeme.matches('\n').count() as u32
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Semi { implicit: true } => f.write_str("newline"),
            _ => write!(f, "`{}`", self.lexeme),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct LexerError {
    pub offset: usize,
    pub message: String,
}

impl LexerError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Pull-based tokenizer. Yields tokens one at a time and stops for good after the first error.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    last: Option<(TokenKind, &'a str)>,
    pending: Option<Token<'a>>,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            last: None,
            pending: None,
            done: false,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Whether a line break after the previous significant token terminates a statement.
    fn wants_semicolon(&self) -> bool {
        match self.last {
            Some((TokenKind::Ident | TokenKind::Number | TokenKind::Rune | TokenKind::String, _)) => {
                true
            }
            Some((TokenKind::Keyword(kw), _)) => matches!(
                kw,
                Keyword::Break | Keyword::Continue | Keyword::Fallthrough | Keyword::Return
            ),
            Some((TokenKind::Symbol, lexeme)) => matches!(lexeme, "++" | "--" | ")" | "]" | "}"),
            _ => false,
        }
    }

    fn implicit_semi(&mut self, at: usize) -> Token<'a> {
        let token = Token {
            kind: TokenKind::Semi { implicit: true },
            lexeme: "",
            span: Span::new(at, at),
            line: self.line,
        };
        self.last = Some((token.kind, token.lexeme));
        token
    }

    fn emit(&mut self, kind: TokenKind, start: usize, end: usize) -> Token<'a> {
        let lexeme = &self.source[start..end];
        let token = Token {
            kind,
            lexeme,
            span: Span::new(start, end),
            line: self.line,
        };
        self.line += lexeme.matches('\n').count() as u32;
        self.pos = end;
        if !kind.is_comment() {
            self.last = Some((kind, lexeme));
        }
        token
    }

    fn lex_next(&mut self) -> Result<Option<Token<'a>>, LexerError> {
        if let Some(token) = self.pending.take() {
            return Ok(Some(token));
        }
        loop {
            let mut input = &self.source[self.pos..];
            let _ = blank(&mut input);
            self.pos = self.source.len() - input.len();

            let Some(ch) = input.chars().next() else {
                if self.wants_semicolon() {
                    return Ok(Some(self.implicit_semi(self.pos)));
                }
                return Ok(None);
            };

            if ch == '\n' {
                let at = self.pos;
                if self.wants_semicolon() {
                    let token = self.implicit_semi(at);
                    self.pos += 1;
                    self.line += 1;
                    return Ok(Some(token));
                }
                self.pos += 1;
                self.line += 1;
                continue;
            }

            let start = self.pos;
            if input.starts_with("//") {
                let text = line_comment
                    .parse_next(&mut input)
                    .map_err(|_| LexerError::new(start, "malformed comment"))?;
                return Ok(Some(self.emit(TokenKind::LineComment, start, start + text.len())));
            }
            if input.starts_with("/*") {
                let text = block_comment
                    .parse_next(&mut input)
                    .map_err(|_| LexerError::new(start, "unterminated block comment"))?;
                let end = start + text.len();
                // a multi-line block comment acts like a newline
                if text.contains('\n') && self.wants_semicolon() {
                    let semi = self.implicit_semi(start);
                    let comment = self.emit(TokenKind::BlockComment, start, end);
                    self.pending = Some(comment);
                    return Ok(Some(semi));
                }
                return Ok(Some(self.emit(TokenKind::BlockComment, start, end)));
            }

            let kind = token_kind(&mut input).map_err(|err| match err {
                ErrMode::Cut(_) => LexerError::new(start, unterminated(ch)),
                _ => LexerError::new(start, format!("unexpected character `{ch}`")),
            })?;
            let end = self.source.len() - input.len();
            return Ok(Some(self.emit(kind, start, end)));
        }
    }
}

fn unterminated(ch: char) -> &'static str {
    match ch {
        '"' | '`' => "unterminated string literal",
        '\'' => "unterminated rune literal",
        _ => "malformed literal",
    }
}

fn token_kind(input: &mut &str) -> ModalResult<TokenKind> {
    let Some(ch) = input.chars().next() else {
        return Err(super::winnow::backtrack_err());
    };
    if is_ident_start(ch) {
        let ident = take_while(1.., is_ident_continue).parse_next(input)?;
        return Ok(match Keyword::from_ident(ident) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Ident,
        });
    }
    match ch {
        '"' => return parse_interpreted_string(input).map(|_| TokenKind::String),
        '`' => return parse_raw_string(input).map(|_| TokenKind::String),
        '\'' => return parse_rune(input).map(|_| TokenKind::Rune),
        _ => {}
    }
    if parse_number(input).is_ok() {
        return Ok(TokenKind::Number);
    }
    for punct in MULTI_PUNCT {
        if input.starts_with(punct) {
            literal(*punct).parse_next(input)?;
            return Ok(TokenKind::Symbol);
        }
    }
    if SINGLE_PUNCT.contains(ch) {
        *input = &input[ch.len_utf8()..];
        if ch == ';' {
            return Ok(TokenKind::Semi { implicit: false });
        }
        return Ok(TokenKind::Symbol);
    }
    Err(super::winnow::backtrack_err())
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lex_next() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Tokenizes the whole input eagerly.
pub fn lex(source: &str) -> Result<Vec<Token<'_>>, LexerError> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        lex(src)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.lexeme))
            .collect()
    }

    #[test]
    fn inserts_semicolons_after_line_ending_tokens() {
        let toks = kinds("type A int\nfunc f() {\n}\n");
        let semis: Vec<_> = toks
            .iter()
            .filter(|(k, _)| matches!(k, TokenKind::Semi { implicit: true }))
            .collect();
        assert_eq!(semis.len(), 2);
        assert_eq!(toks[2], (TokenKind::Ident, "int"));
        assert_eq!(toks[3].0, TokenKind::Semi { implicit: true });
    }

    #[test]
    fn no_semicolon_after_open_brace_or_operator() {
        let toks = kinds("x := a +\n b");
        assert!(!toks
            .iter()
            .take(4)
            .any(|(k, _)| matches!(k, TokenKind::Semi { .. })));
    }

    #[test]
    fn multi_char_punctuation_is_maximal() {
        let toks = kinds("a &^= b <- c ... d");
        let syms: Vec<_> = toks
            .iter()
            .filter(|(k, _)| *k == TokenKind::Symbol)
            .map(|(_, l)| *l)
            .collect();
        assert_eq!(syms, vec!["&^=", "<-", "..."]);
    }

    #[test]
    fn literals_and_comments() {
        let toks = kinds("s := `raw\nstring` // tail\nr := '\\''\n/* block */ n := 1.5e-3");
        assert!(toks.contains(&(TokenKind::String, "`raw\nstring`")));
        assert!(toks.contains(&(TokenKind::LineComment, "// tail")));
        assert!(toks.contains(&(TokenKind::Rune, "'\\''")));
        assert!(toks.contains(&(TokenKind::BlockComment, "/* block */")));
        assert!(toks.contains(&(TokenKind::Number, "1.5e-3")));
    }

    #[test]
    fn tracks_lines_across_raw_strings() {
        let toks = lex("a `x\ny`\nb").unwrap();
        let b = toks.iter().find(|t| t.lexeme == "b").unwrap();
        assert_eq!(b.line, 3);
    }

    #[test]
    fn unterminated_string_reports_start_offset() {
        let err = lex("x := \"abc\n").unwrap_err();
        assert_eq!(err.offset, 5);
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn lexer_fuses_after_error() {
        let mut lexer = Lexer::new("a $ b");
        assert!(lexer.next().unwrap().is_ok());
        let err = lexer.next().unwrap().unwrap_err();
        assert_eq!(err.offset, 2);
        assert!(lexer.next().is_none());
    }
}
