//! Recursive-descent parsing of Go type expressions and signatures over the
//! token slice of one declaration header.

use crate::lexer::{Keyword, Token, TokenKind};
use crate::scanner::ScanError;
use cw_core::model::{ChanDir, Field, InterfaceMethod, MethodSig, Param, Signature, TypePath, TypeRef};
use cw_core::span::Span;
use tracing::debug;

/// Why a header could not be turned into a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SyntaxError {
    Malformed(ScanError),
    /// Type parameters or instantiations; skipped rather than modeled.
    Generic { offset: usize },
}

impl From<ScanError> for SyntaxError {
    fn from(err: ScanError) -> Self {
        SyntaxError::Malformed(err)
    }
}

pub(crate) type SyntaxResult<T> = Result<T, SyntaxError>;

pub(crate) struct TokenCursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    end: usize,
}

impl<'t, 'a> TokenCursor<'t, 'a> {
    /// `end` is the byte offset reported when input runs out.
    pub fn new(tokens: &'t [Token<'a>], end: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
        }
    }

    pub fn peek(&self) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&'t Token<'a>> {
        self.tokens.get(self.pos + n)
    }

    pub fn advance(&mut self) -> Option<&'t Token<'a>> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Span of the tokens consumed since `start`.
    pub fn span_since(&self, start: usize) -> Span {
        match (self.tokens.get(start), self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))) {
            (Some(first), Some(last)) if start < self.pos => first.span.to(last.span),
            _ => Span::new(self.end, self.end),
        }
    }

    pub fn matches_symbol(&self, symbol: &str) -> bool {
        self.peek().is_some_and(|t| t.is_symbol(symbol))
    }

    pub fn matches_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    pub fn match_symbol(&mut self, symbol: &str) -> bool {
        if self.matches_symbol(symbol) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect_symbol(&mut self, symbol: &str) -> Result<&'t Token<'a>, ScanError> {
        if self.matches_symbol(symbol) {
            return self.advance().ok_or_else(|| self.error_here(symbol));
        }
        Err(self.error_here(&format!("`{symbol}`")))
    }

    pub fn expect_ident(&mut self) -> Result<&'t Token<'a>, ScanError> {
        match self.peek() {
            Some(token) if token.is_ident() => {
                self.pos += 1;
                Ok(token)
            }
            _ => Err(self.error_here("identifier")),
        }
    }

    pub fn skip_semis(&mut self) {
        while self.peek().is_some_and(Token::is_semi) {
            self.pos += 1;
        }
    }

    pub fn expect_end(&mut self) -> Result<(), ScanError> {
        self.skip_semis();
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(ScanError::new(
                token.span.offset(),
                format!("unexpected {token} after declaration"),
            )),
        }
    }

    pub fn error_here(&self, expected: &str) -> ScanError {
        match self.peek() {
            Some(token) => ScanError::unexpected(token, expected),
            None => ScanError::new(self.end, format!("expected {expected}, found end of declaration")),
        }
    }

    /// `[` glued to the previous token, as in `List[int]`.
    fn at_instantiation(&self) -> bool {
        match (self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)), self.peek()) {
            (Some(prev), Some(next)) => next.is_symbol("[") && prev.span.hi == next.span.lo,
            _ => false,
        }
    }

    /// `[T any]`, `[K comparable, V any]`: a type parameter list after a declared name.
    pub fn at_type_params(&self) -> bool {
        if !self.matches_symbol("[") {
            return false;
        }
        let param = self.peek_nth(1).is_some_and(Token::is_ident);
        let constraint = self.peek_nth(2).is_some_and(|t| match t.kind {
            TokenKind::Ident | TokenKind::Keyword(_) => true,
            TokenKind::Symbol => matches!(t.lexeme, "," | "~" | "["),
            _ => false,
        });
        param && constraint
    }
}

pub(crate) fn can_start_type(token: &Token<'_>) -> bool {
    match token.kind {
        TokenKind::Ident => true,
        TokenKind::Keyword(kw) => matches!(
            kw,
            Keyword::Struct | Keyword::Interface | Keyword::Map | Keyword::Chan | Keyword::Func
        ),
        TokenKind::Symbol => matches!(token.lexeme, "*" | "[" | "(" | "<-"),
        _ => false,
    }
}

pub(crate) fn parse_type(c: &mut TokenCursor<'_, '_>) -> SyntaxResult<TypeRef> {
    let Some(token) = c.peek() else {
        return Err(c.error_here("type").into());
    };
    match token.kind {
        TokenKind::Ident => {
            c.advance();
            let path = if c.matches_symbol(".") && c.peek_nth(1).is_some_and(Token::is_ident) {
                c.advance();
                let name = c.expect_ident()?;
                TypePath::qualified(token.lexeme, name.lexeme)
            } else {
                TypePath::local(token.lexeme)
            };
            if c.at_instantiation() {
                return Err(SyntaxError::Generic {
                    offset: token.span.offset(),
                });
            }
            Ok(TypeRef::Named(path))
        }
        TokenKind::Keyword(Keyword::Struct) => {
            c.advance();
            Ok(TypeRef::Struct(parse_struct_body(c)?))
        }
        TokenKind::Keyword(Keyword::Interface) => {
            c.advance();
            let body = parse_interface_body(c)?;
            if !body.embeds.is_empty() {
                debug!(embeds = body.embeds.len(), "dropping embeds of interface literal");
            }
            Ok(TypeRef::Interface(
                body.methods
                    .into_iter()
                    .map(|m| MethodSig {
                        name: m.name,
                        signature: m.signature,
                    })
                    .collect(),
            ))
        }
        TokenKind::Keyword(Keyword::Map) => {
            c.advance();
            c.expect_symbol("[")?;
            let key = parse_type(c)?;
            c.expect_symbol("]")?;
            let value = parse_type(c)?;
            Ok(TypeRef::Map {
                key: Box::new(key),
                value: Box::new(value),
            })
        }
        TokenKind::Keyword(Keyword::Chan) => {
            c.advance();
            let dir = if c.match_symbol("<-") {
                ChanDir::Send
            } else {
                ChanDir::Both
            };
            let elem = parse_type(c)?;
            Ok(TypeRef::Chan {
                dir,
                elem: Box::new(elem),
            })
        }
        TokenKind::Keyword(Keyword::Func) => {
            c.advance();
            Ok(TypeRef::Func(Box::new(parse_signature(c)?)))
        }
        TokenKind::Symbol => match token.lexeme {
            "*" => {
                c.advance();
                Ok(TypeRef::pointer(parse_type(c)?))
            }
            "(" => {
                c.advance();
                let inner = parse_type(c)?;
                c.expect_symbol(")")?;
                Ok(inner)
            }
            "..." => {
                c.advance();
                Ok(TypeRef::Variadic(Box::new(parse_type(c)?)))
            }
            "<-" => {
                c.advance();
                if !c.matches_keyword(Keyword::Chan) {
                    return Err(c.error_here("`chan`").into());
                }
                c.advance();
                let elem = parse_type(c)?;
                Ok(TypeRef::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(elem),
                })
            }
            "[" => {
                c.advance();
                if c.match_symbol("]") {
                    return Ok(TypeRef::slice(parse_type(c)?));
                }
                let len = array_len(c)?;
                let elem = parse_type(c)?;
                Ok(TypeRef::Array {
                    len,
                    elem: Box::new(elem),
                })
            }
            _ => Err(c.error_here("type").into()),
        },
        _ => Err(c.error_here("type").into()),
    }
}

/// Length expression of an array type, kept as written. Consumes the closing `]`.
fn array_len(c: &mut TokenCursor<'_, '_>) -> Result<String, ScanError> {
    let mut depth = 0usize;
    let mut len = String::new();
    loop {
        let Some(token) = c.advance() else {
            return Err(c.error_here("`]`"));
        };
        match token.lexeme {
            "[" | "(" => depth += 1,
            ")" => depth = depth.saturating_sub(1),
            "]" if depth == 0 => break,
            "]" => depth -= 1,
            _ => {}
        }
        len.push_str(token.lexeme);
    }
    if len.is_empty() {
        return Err(c.error_here("array length"));
    }
    Ok(len)
}

struct ParamEntry {
    name: Option<String>,
    ty: TypeRef,
    offset: usize,
}

/// A parenthesized parameter or result list.
pub(crate) fn parse_parameters(c: &mut TokenCursor<'_, '_>) -> SyntaxResult<Vec<Param>> {
    c.expect_symbol("(")?;
    let mut entries = Vec::new();
    loop {
        c.skip_semis();
        if c.match_symbol(")") {
            break;
        }
        let start = c.peek().map(|t| t.span.offset()).unwrap_or_default();
        let ty = parse_type(c)?;
        let ends_entry = c.matches_symbol(",") || c.matches_symbol(")") || c.peek().is_some_and(Token::is_semi);
        let entry = if ends_entry {
            ParamEntry {
                name: None,
                ty,
                offset: start,
            }
        } else {
            let name = match ty {
                TypeRef::Named(path) if path.is_local() => path.name,
                _ => return Err(ScanError::new(start, "expected parameter name").into()),
            };
            ParamEntry {
                name: Some(name),
                ty: parse_type(c)?,
                offset: start,
            }
        };
        entries.push(entry);
        if !c.match_symbol(",") {
            c.skip_semis();
            c.expect_symbol(")")?;
            break;
        }
    }

    if entries.iter().all(|entry| entry.name.is_none()) {
        return Ok(entries.into_iter().map(|e| Param::anonymous(e.ty)).collect());
    }
    // `a, b int`: bare names borrow the type of the next named entry
    let mut params = Vec::with_capacity(entries.len());
    let mut pending: Vec<(String, usize)> = Vec::new();
    for entry in entries {
        match entry.name {
            Some(name) => {
                for (pending_name, _) in pending.drain(..) {
                    params.push(Param::named(pending_name, entry.ty.clone()));
                }
                params.push(Param::named(name, entry.ty));
            }
            None => match entry.ty {
                TypeRef::Named(path) if path.is_local() => pending.push((path.name, entry.offset)),
                _ => {
                    return Err(
                        ScanError::new(entry.offset, "mixed named and unnamed parameters").into(),
                    )
                }
            },
        }
    }
    if let Some((_, offset)) = pending.first() {
        return Err(ScanError::new(*offset, "mixed named and unnamed parameters").into());
    }
    Ok(params)
}

/// Parameters followed by an optional result type or list.
pub(crate) fn parse_signature(c: &mut TokenCursor<'_, '_>) -> SyntaxResult<Signature> {
    let params = parse_parameters(c)?;
    let results = if c.matches_symbol("(") {
        parse_parameters(c)?
    } else if c.peek().is_some_and(can_start_type) {
        vec![Param::anonymous(parse_type(c)?)]
    } else {
        Vec::new()
    };
    Ok(Signature::new(params, results))
}

/// `{ ... }` of a struct type, with the `struct` keyword already consumed.
pub(crate) fn parse_struct_body(c: &mut TokenCursor<'_, '_>) -> SyntaxResult<Vec<Field>> {
    c.expect_symbol("{")?;
    let mut fields = Vec::new();
    loop {
        c.skip_semis();
        if c.match_symbol("}") {
            return Ok(fields);
        }
        parse_field_decl(c, &mut fields)?;
        if !c.peek().is_some_and(Token::is_semi) && !c.matches_symbol("}") {
            return Err(c.error_here("`;` or `}` after field").into());
        }
    }
}

fn parse_field_decl(c: &mut TokenCursor<'_, '_>, fields: &mut Vec<Field>) -> SyntaxResult<()> {
    let Some(first) = c.peek() else {
        return Err(c.error_here("field").into());
    };
    let embedded = if first.is_symbol("*") {
        true
    } else if first.is_ident() {
        match c.peek_nth(1) {
            None => true,
            Some(next) => {
                next.is_semi()
                    || next.is_symbol(".")
                    || next.is_symbol("}")
                    || next.kind == TokenKind::String
                    || (next.is_symbol("[") && first.span.hi == next.span.lo)
            }
        }
    } else {
        return Err(c.error_here("field name or embedded type").into());
    };

    let mut group = Vec::new();
    if embedded {
        group.push(Field::embedded(parse_type(c)?));
    } else {
        let mut names = vec![c.expect_ident()?.lexeme];
        while c.match_symbol(",") {
            names.push(c.expect_ident()?.lexeme);
        }
        let ty = parse_type(c)?;
        group.extend(names.into_iter().map(|name| Field::new(name, ty.clone())));
    }

    let tag = match c.peek() {
        Some(token) if token.kind == TokenKind::String => {
            c.advance();
            Some(token.lexeme.to_string())
        }
        _ => None,
    };
    for mut field in group {
        field.tag = tag.clone();
        fields.push(field);
    }
    Ok(())
}

pub(crate) struct InterfaceBody {
    pub methods: Vec<InterfaceMethod>,
    pub embeds: Vec<TypeRef>,
}

/// `{ ... }` of an interface type, with the `interface` keyword already consumed.
pub(crate) fn parse_interface_body(c: &mut TokenCursor<'_, '_>) -> SyntaxResult<InterfaceBody> {
    let open = c.expect_symbol("{")?;
    let mut body = InterfaceBody {
        methods: Vec::new(),
        embeds: Vec::new(),
    };
    loop {
        c.skip_semis();
        if c.match_symbol("}") {
            return Ok(body);
        }
        let Some(first) = c.peek() else {
            return Err(c.error_here("`}`").into());
        };
        // type-set elements only appear in constraint interfaces
        if first.is_symbol("~") {
            return Err(SyntaxError::Generic {
                offset: open.span.offset(),
            });
        }
        if first.is_ident() && c.peek_nth(1).is_some_and(|t| t.is_symbol("(")) {
            c.advance();
            let signature = parse_signature(c)?;
            body.methods.push(InterfaceMethod {
                name: first.lexeme.to_string(),
                signature,
                span: first.span,
            });
        } else {
            let embed = parse_type(c)?;
            if c.matches_symbol("|") {
                return Err(SyntaxError::Generic {
                    offset: open.span.offset(),
                });
            }
            body.embeds.push(embed);
        }
        if !c.peek().is_some_and(Token::is_semi) && !c.matches_symbol("}") {
            return Err(c.error_here("`;` or `}` after interface element").into());
        }
    }
}
