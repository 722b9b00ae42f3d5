use winnow::combinator::cut_err;
use winnow::error::{ContextError, ErrMode};
use winnow::token::{literal, take_till, take_until, take_while};
use winnow::{ModalResult, Parser};

pub(crate) const MULTI_PUNCT: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^",
];
pub(crate) const SINGLE_PUNCT: &str = "+-*/%&|^<>=!()[]{},;.:~";

/// Spaces, tabs and carriage returns. Newlines are significant to the lexer.
pub(crate) fn blank(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c == ' ' || c == '\t' || c == '\r')
        .map(|_| ())
        .parse_next(input)
}

pub(crate) fn line_comment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let start = *input;
    literal("//").parse_next(input)?;
    take_till(0.., |c: char| c == '\n').parse_next(input)?;
    Ok(&start[..start.len() - input.len()])
}

pub(crate) fn block_comment<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let start = *input;
    literal("/*").parse_next(input)?;
    cut_err(take_until(0.., "*/")).parse_next(input)?;
    literal("*/").parse_next(input)?;
    Ok(&start[..start.len() - input.len()])
}

/// `"..."` with backslash escapes; a raw newline before the closing quote is an error.
pub(crate) fn parse_interpreted_string(input: &mut &str) -> ModalResult<()> {
    parse_quoted(input, b'"')
}

/// `'x'` with backslash escapes.
pub(crate) fn parse_rune(input: &mut &str) -> ModalResult<()> {
    parse_quoted(input, b'\'')
}

fn parse_quoted(input: &mut &str, quote: u8) -> ModalResult<()> {
    let slice = *input;
    let bytes = slice.as_bytes();
    if bytes.first() != Some(&quote) {
        return Err(backtrack_err());
    }
    let mut idx = 1;
    let mut escape = false;
    while idx < bytes.len() {
        let b = bytes[idx];
        idx += 1;
        if b == b'\n' {
            break;
        }
        if b == b'\\' && !escape {
            escape = true;
            continue;
        }
        if b == quote && !escape {
            *input = &slice[idx..];
            return Ok(());
        }
        escape = false;
    }
    Err(ErrMode::Cut(ContextError::new()))
}

/// `` `...` `` raw string; may span lines.
pub(crate) fn parse_raw_string(input: &mut &str) -> ModalResult<()> {
    literal("`").parse_next(input)?;
    cut_err(take_till(0.., |c: char| c == '`')).parse_next(input)?;
    cut_err(literal("`")).parse_next(input)?;
    Ok(())
}

/// Integer, float and imaginary literals, loosely: the scanner never evaluates them.
pub(crate) fn parse_number(input: &mut &str) -> ModalResult<()> {
    let slice = *input;
    let bytes = slice.as_bytes();
    let starts_number = match bytes {
        [first, ..] if first.is_ascii_digit() => true,
        [b'.', second, ..] if second.is_ascii_digit() => true,
        _ => false,
    };
    if !starts_number {
        return Err(backtrack_err());
    }
    let hex = slice.starts_with("0x") || slice.starts_with("0X");
    let mut idx = 0;
    while idx < bytes.len() {
        let b = bytes[idx];
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
            idx += 1;
            let exponent = (!hex && (b == b'e' || b == b'E')) || (hex && (b == b'p' || b == b'P'));
            if exponent && idx < bytes.len() && (bytes[idx] == b'+' || bytes[idx] == b'-') {
                idx += 1;
            }
        } else {
            break;
        }
    }
    *input = &slice[idx..];
    Ok(())
}

pub(crate) fn is_ident_start(ch: char) -> bool {
    ch == '_' || ch.is_alphabetic()
}

pub(crate) fn is_ident_continue(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

pub(crate) fn backtrack_err() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}
