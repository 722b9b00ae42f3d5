//! Declaration scanner.
//!
//! Walks a token stream and hands out one [`DeclHeader`] per top-level `type`
//! spec or `func` declaration, in source order. Function bodies are skipped by
//! balancing delimiters and never parsed. Nothing is read ahead of the header
//! that is being produced, so a scan can be stopped at any point.

use crate::lexer::{Keyword, Lexer, LexerError, Token, TokenKind};
use cw_core::diagnostics::{Diagnostic, ErrorKind};
use cw_core::span::Span;
use itertools::Itertools;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct ScanError {
    pub offset: usize,
    pub message: String,
}

impl ScanError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn unexpected(token: &Token<'_>, expected: &str) -> Self {
        Self::new(
            token.span.offset(),
            format!("expected {expected}, found {token}"),
        )
    }
}

impl From<LexerError> for ScanError {
    fn from(err: LexerError) -> Self {
        Self::new(err.offset, err.message)
    }
}

impl From<ScanError> for Diagnostic {
    fn from(err: ScanError) -> Self {
        Diagnostic::new(ErrorKind::Scan, err.message, err.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    Type,
    Func,
    Interface,
}

/// A run of comments that ends on the line right above a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocComment<'a> {
    pub span: Span,
    pub comments: Vec<&'a str>,
}

impl DocComment<'_> {
    /// Comment text with the comment markers removed.
    pub fn text(&self) -> String {
        self.comments
            .iter()
            .map(|comment| match comment.strip_prefix("//") {
                Some(rest) => rest.strip_prefix(' ').unwrap_or(rest).to_string(),
                None => comment
                    .trim_start_matches("/*")
                    .trim_end_matches("*/")
                    .trim()
                    .to_string(),
            })
            .join("\n")
    }
}

/// Signature-level view of one declaration.
///
/// `tokens` holds the significant tokens after the `type`/`func` keyword up to
/// the end of the signature; line-break semicolons inside nested delimiters are
/// kept since they separate struct fields and interface methods.
#[derive(Debug, Clone)]
pub struct DeclHeader<'a> {
    pub kind: HeaderKind,
    pub alias: bool,
    pub span: Span,
    pub text: &'a str,
    pub tokens: Vec<Token<'a>>,
    pub body: Option<Span>,
    pub doc: Option<DocComment<'a>>,
}

impl<'a> DeclHeader<'a> {
    pub fn name(&self) -> Option<&'a str> {
        let mut iter = self.tokens.iter();
        if self.kind == HeaderKind::Func && self.tokens.first().is_some_and(|t| t.is_symbol("(")) {
            let mut depth = 0usize;
            for token in iter.by_ref() {
                if token.is_symbol("(") {
                    depth += 1;
                } else if token.is_symbol(")") {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
            }
        }
        iter.next().filter(|t| t.is_ident()).map(|t| t.lexeme)
    }

    pub fn has_receiver(&self) -> bool {
        self.kind == HeaderKind::Func && self.tokens.first().is_some_and(|t| t.is_symbol("("))
    }

    /// Header plus body, when there is one.
    pub fn extent(&self) -> Span {
        match self.body {
            Some(body) => self.span.to(body),
            None => self.span,
        }
    }
}

#[derive(Debug, Clone)]
struct CommentGroup<'a> {
    comments: Vec<Token<'a>>,
    end_line: u32,
}

#[derive(Debug, Clone)]
struct TypeGroup<'a> {
    doc: Option<DocComment<'a>>,
    open: Span,
}

type Significant<'a> = (Token<'a>, Option<DocComment<'a>>);

/// Lazy, restartable declaration scanner.
///
/// Cloning a scanner forks it: both copies continue independently from the
/// same position.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    pushed: Option<Significant<'a>>,
    comments: Option<CommentGroup<'a>>,
    last_line: u32,
    group: Option<TypeGroup<'a>>,
    package: Option<&'a str>,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            pushed: None,
            comments: None,
            last_line: 0,
            group: None,
            package: None,
            finished: false,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Rewind to the start of the unit.
    pub fn restart(&mut self) {
        *self = Scanner::new(self.source);
    }

    /// Package clause name, once the scan has passed it.
    pub fn declared_package(&self) -> Option<&'a str> {
        self.package
    }

    fn next_token(&mut self) -> Result<Option<Significant<'a>>, ScanError> {
        if let Some(pushed) = self.pushed.take() {
            return Ok(Some(pushed));
        }
        while let Some(token) = self.lexer.next() {
            let token = token?;
            if token.kind.is_comment() {
                self.note_comment(token);
                continue;
            }
            if token.is_semi() {
                return Ok(Some((token, None)));
            }
            let doc = self.take_doc(&token);
            self.last_line = token.end_line();
            return Ok(Some((token, doc)));
        }
        Ok(None)
    }

    fn note_comment(&mut self, comment: Token<'a>) {
        // a comment sharing a line with code before it is a trailing remark
        if comment.line == self.last_line {
            self.comments = None;
            return;
        }
        match &mut self.comments {
            Some(group) if comment.line <= group.end_line + 1 => {
                group.end_line = comment.end_line();
                group.comments.push(comment);
            }
            _ => {
                self.comments = Some(CommentGroup {
                    end_line: comment.end_line(),
                    comments: vec![comment],
                })
            }
        }
    }

    fn take_doc(&mut self, token: &Token<'a>) -> Option<DocComment<'a>> {
        let group = self.comments.take()?;
        if group.end_line + 1 != token.line {
            return None;
        }
        let first = group.comments.first()?;
        let last = group.comments.last()?;
        Some(DocComment {
            span: first.span.to(last.span),
            comments: group.comments.iter().map(|c| c.lexeme).collect(),
        })
    }

    fn expect_next(
        &mut self,
        accept: impl Fn(&Token<'a>) -> bool,
        expected: &str,
    ) -> Result<Significant<'a>, ScanError> {
        match self.next_token()? {
            Some((token, doc)) if accept(&token) => Ok((token, doc)),
            Some((token, _)) => Err(ScanError::unexpected(&token, expected)),
            None => Err(ScanError::new(
                self.source.len(),
                format!("expected {expected}, found end of input"),
            )),
        }
    }

    fn scan_next(&mut self) -> Result<Option<DeclHeader<'a>>, ScanError> {
        loop {
            if let Some(open) = self.group.as_ref().map(|group| group.open) {
                let Some((token, doc)) = self.next_token()? else {
                    return Err(ScanError::new(open.offset(), "unclosed `(` in type group"));
                };
                if token.is_semi() {
                    continue;
                }
                if token.is_symbol(")") {
                    self.group = None;
                    continue;
                }
                if !token.is_ident() {
                    return Err(ScanError::unexpected(&token, "type name"));
                }
                let group_doc = self.group.as_mut().and_then(|group| group.doc.take());
                return self.type_spec(token, token.span, doc.or(group_doc)).map(Some);
            }

            let Some((token, doc)) = self.next_token()? else {
                return Ok(None);
            };
            match token.kind {
                TokenKind::Semi { .. } => continue,
                TokenKind::Keyword(Keyword::Package) => {
                    let (name, _) = self.expect_next(|t| t.is_ident(), "package name")?;
                    self.package = Some(name.lexeme);
                }
                TokenKind::Keyword(Keyword::Import | Keyword::Var | Keyword::Const) => {
                    self.skip_declaration()?;
                }
                TokenKind::Keyword(Keyword::Type) => {
                    let (next, _) = self.expect_next(
                        |t| t.is_ident() || t.is_symbol("("),
                        "type name or `(`",
                    )?;
                    if next.is_symbol("(") {
                        self.group = Some(TypeGroup {
                            doc,
                            open: next.span,
                        });
                        continue;
                    }
                    return self.type_spec(next, token.span, doc).map(Some);
                }
                TokenKind::Keyword(Keyword::Func) => return self.func_header(token, doc).map(Some),
                _ => {
                    return Err(ScanError::new(
                        token.span.offset(),
                        format!("unexpected {token} at top level"),
                    ))
                }
            }
        }
    }

    fn skip_declaration(&mut self) -> Result<(), ScanError> {
        let mut stack = Vec::new();
        while let Some((token, _)) = self.next_token()? {
            if token.is_semi() && stack.is_empty() {
                return Ok(());
            }
            track_delimiter(&mut stack, &token)?;
        }
        ensure_closed(&stack)
    }

    fn type_spec(
        &mut self,
        name: Token<'a>,
        start: Span,
        doc: Option<DocComment<'a>>,
    ) -> Result<DeclHeader<'a>, ScanError> {
        let mut tokens = vec![name];
        let mut stack = Vec::new();
        while let Some((token, _)) = self.next_token()? {
            if stack.is_empty() {
                if token.is_semi() {
                    break;
                }
                if token.is_symbol(")") && self.group.is_some() {
                    self.pushed = Some((token, None));
                    break;
                }
            }
            track_delimiter(&mut stack, &token)?;
            tokens.push(token);
        }
        ensure_closed(&stack)?;

        let Some(second) = tokens.get(1) else {
            return Err(ScanError::new(
                name.span.hi,
                format!("missing type for `{}`", name.lexeme),
            ));
        };
        let alias = second.is_symbol("=");
        let kind = if second.is_keyword(Keyword::Interface) {
            HeaderKind::Interface
        } else {
            HeaderKind::Type
        };
        let span = match tokens.last() {
            Some(last) => start.to(last.span),
            None => start,
        };
        trace!(name = name.lexeme, ?kind, alias, "scanned type header");
        Ok(DeclHeader {
            kind,
            alias,
            span,
            text: span.slice(self.source),
            tokens,
            body: None,
            doc,
        })
    }

    fn func_header(
        &mut self,
        func: Token<'a>,
        doc: Option<DocComment<'a>>,
    ) -> Result<DeclHeader<'a>, ScanError> {
        let mut tokens: Vec<Token<'a>> = Vec::new();
        let mut stack = Vec::new();
        let mut body = None;
        while let Some((token, _)) = self.next_token()? {
            if stack.is_empty() {
                if token.is_semi() {
                    break;
                }
                let opens_type_literal = tokens.last().is_some_and(|last| {
                    last.is_keyword(Keyword::Struct) || last.is_keyword(Keyword::Interface)
                });
                if token.is_symbol("{") && !opens_type_literal {
                    body = Some(self.skip_block(token)?);
                    break;
                }
            }
            track_delimiter(&mut stack, &token)?;
            tokens.push(token);
        }
        ensure_closed(&stack)?;

        let Some(last) = tokens.last() else {
            return Err(ScanError::new(
                func.span.hi,
                "expected function name after `func`",
            ));
        };
        let span = func.span.to(last.span);
        trace!(header = span.slice(self.source), "scanned func header");
        Ok(DeclHeader {
            kind: HeaderKind::Func,
            alias: false,
            span,
            text: span.slice(self.source),
            tokens,
            body,
            doc,
        })
    }

    fn skip_block(&mut self, open: Token<'a>) -> Result<Span, ScanError> {
        let mut stack = vec![open];
        while let Some((token, _)) = self.next_token()? {
            track_delimiter(&mut stack, &token)?;
            if stack.is_empty() {
                return Ok(open.span.to(token.span));
            }
        }
        ensure_closed(&stack)?;
        Ok(open.span)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<DeclHeader<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.scan_next() {
            Ok(Some(header)) => Some(Ok(header)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

fn closer_for(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

fn track_delimiter<'a>(stack: &mut Vec<Token<'a>>, token: &Token<'a>) -> Result<(), ScanError> {
    if token.kind != TokenKind::Symbol {
        return Ok(());
    }
    match token.lexeme {
        "(" | "[" | "{" => stack.push(*token),
        ")" | "]" | "}" => match stack.pop() {
            Some(open) if closer_for(open.lexeme) == token.lexeme => {}
            Some(open) => {
                return Err(ScanError::new(
                    token.span.offset(),
                    format!(
                        "mismatched `{}`: expected `{}` to close `{}` at byte {}",
                        token.lexeme,
                        closer_for(open.lexeme),
                        open.lexeme,
                        open.span.offset()
                    ),
                ))
            }
            None => {
                return Err(ScanError::new(
                    token.span.offset(),
                    format!("unexpected `{}`", token.lexeme),
                ))
            }
        },
        _ => {}
    }
    Ok(())
}

fn ensure_closed(stack: &[Token<'_>]) -> Result<(), ScanError> {
    match stack.last() {
        Some(open) => Err(ScanError::new(
            open.span.offset(),
            format!("unclosed `{}`", open.lexeme),
        )),
        None => Ok(()),
    }
}

/// Name from the `package` clause, without scanning past it.
pub fn package_name(source: &str) -> Option<&str> {
    let mut significant = Lexer::new(source)
        .map_while(Result::ok)
        .filter(|t| !t.kind.is_comment() && !t.is_semi());
    let first = significant.next()?;
    if !first.is_keyword(Keyword::Package) {
        return None;
    }
    significant.next().filter(|t| t.is_ident()).map(|t| t.lexeme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(src: &str) -> Vec<DeclHeader<'_>> {
        Scanner::new(src).collect::<Result<_, _>>().unwrap()
    }

    #[test]
    fn yields_headers_in_source_order() {
        let src = "package p\n\nimport \"fmt\"\n\ntype A struct {\n\tx int\n}\n\nfunc (a *A) M() int {\n\treturn a.x\n}\n\ntype B = A\n\nfunc F() {}\n";
        let got: Vec<_> = headers(src)
            .iter()
            .map(|h| (h.kind, h.alias, h.name()))
            .collect();
        assert_eq!(
            got,
            vec![
                (HeaderKind::Type, false, Some("A")),
                (HeaderKind::Func, false, Some("M")),
                (HeaderKind::Type, true, Some("B")),
                (HeaderKind::Func, false, Some("F")),
            ]
        );
    }

    #[test]
    fn header_text_stops_before_body() {
        let src = "func (s *S) Do(x int) (int, error) {\n\tif x > 0 { return x, nil }\n\treturn 0, nil\n}";
        let header = headers(src).remove(0);
        assert_eq!(header.text, "func (s *S) Do(x int) (int, error)");
        let body = header.body.unwrap();
        assert!(body.slice(src).starts_with('{'));
        assert!(body.slice(src).ends_with('}'));
        assert_eq!(header.extent().slice(src), src);
    }

    #[test]
    fn struct_literal_result_is_not_a_body() {
        let src = "func f() struct{ a int } { return struct{ a int }{} }";
        let header = headers(src).remove(0);
        assert_eq!(header.text, "func f() struct{ a int }");
        assert!(header.body.is_some());
    }

    #[test]
    fn bodiless_function_is_a_header() {
        let header = headers("func now() int64\n").remove(0);
        assert_eq!(header.text, "func now() int64");
        assert_eq!(header.body, None);
    }

    #[test]
    fn type_groups_split_into_specs() {
        let src = "// Group doc\ntype (\n\tA int\n\t// B doc\n\tB = string\n\tI interface{ M() }\n)\n";
        let hs = headers(src);
        assert_eq!(hs.len(), 3);
        assert_eq!(hs[0].text, "A int");
        assert_eq!(hs[0].doc.as_ref().unwrap().text(), "Group doc");
        assert!(hs[1].alias);
        assert_eq!(hs[1].doc.as_ref().unwrap().text(), "B doc");
        assert_eq!(hs[2].kind, HeaderKind::Interface);
        assert_eq!(hs[2].doc, None);
    }

    #[test]
    fn doc_comment_rules() {
        let src = "// detached\n\n// first\n// second\ntype A int // trailing\ntype B int\n/* block */\nfunc F()\n";
        let hs = headers(src);
        assert_eq!(hs[0].doc.as_ref().unwrap().text(), "first\nsecond");
        assert_eq!(hs[1].doc, None);
        assert_eq!(hs[2].doc.as_ref().unwrap().text(), "block");
    }

    #[test]
    fn skips_var_const_and_import_blocks() {
        let src = "package p\nimport (\n\t\"a\"\n\t\"b\"\n)\nvar x = func() {\n\ttype Inner int\n}\nconst (\n\tK = 1\n)\ntype T int\n";
        let hs = headers(src);
        assert_eq!(hs.len(), 1);
        assert_eq!(hs[0].name(), Some("T"));
    }

    #[test]
    fn unbalanced_delimiters_report_offsets() {
        let err = Scanner::new("func f() {\n\tif x {\n}\n")
            .find_map(Result::err)
            .unwrap();
        assert_eq!(err.offset, 9);
        assert!(err.message.contains("unclosed"));

        let err = Scanner::new("type S struct { a [2)int }")
            .find_map(Result::err)
            .unwrap();
        assert_eq!(err.offset, 20);
        assert!(err.message.contains("mismatched"));
    }

    #[test]
    fn scan_stops_after_first_error() {
        let mut scanner = Scanner::new("type A int\n)\ntype B int\n");
        assert!(scanner.next().unwrap().is_ok());
        assert!(scanner.next().unwrap().is_err());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn restart_and_fork() {
        let mut scanner = Scanner::new("package p\ntype A int\ntype B int\n");
        let first = scanner.next().unwrap().unwrap();
        assert_eq!(scanner.declared_package(), Some("p"));
        let fork = scanner.clone();
        let rest: Vec<_> = fork.map(|h| h.unwrap().name()).collect();
        assert_eq!(rest, vec![Some("B")]);
        scanner.restart();
        assert_eq!(scanner.declared_package(), None);
        assert_eq!(scanner.next().unwrap().unwrap().text, first.text);
    }

    #[test]
    fn finds_package_clause() {
        assert_eq!(package_name("// c\npackage shapes\n"), Some("shapes"));
        assert_eq!(package_name("type A int"), None);
    }
}
