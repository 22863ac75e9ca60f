//! Tokenizer for query expressions.

use crate::error::{ContainerError, ContainerResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Dot,
    DotDot,
    Star,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Literal(String),
    Number(f64),
    Name(String),
}

pub(crate) fn tokenize(input: &str) -> ContainerResult<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (token, width) = match c {
            '/' if next == Some('/') => (Token::DoubleSlash, 2),
            '/' => (Token::Slash, 1),
            '[' => (Token::LBracket, 1),
            ']' => (Token::RBracket, 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '@' => (Token::At, 1),
            ',' => (Token::Comma, 1),
            '*' => (Token::Star, 1),
            '=' => (Token::Eq, 1),
            '!' if next == Some('=') => (Token::Ne, 2),
            '<' if next == Some('=') => (Token::Le, 2),
            '<' => (Token::Lt, 1),
            '>' if next == Some('=') => (Token::Ge, 2),
            '>' => (Token::Gt, 1),
            '.' if next == Some('.') => (Token::DotDot, 2),
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => number(&chars, i)?,
            '.' => (Token::Dot, 1),
            '"' | '\'' => literal(&chars, i)?,
            c if c.is_ascii_digit() => number(&chars, i)?,
            c if c.is_alphabetic() || c == '_' => name(&chars, i)?,
            other => {
                return Err(ContainerError::query(format!(
                    "unexpected character {other:?} at offset {i}"
                )))
            }
        };

        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

fn literal(chars: &[char], start: usize) -> ContainerResult<(Token, usize)> {
    let quote = chars[start];
    let body: String = chars[start + 1..]
        .iter()
        .take_while(|&&c| c != quote)
        .collect();
    let end = start + 1 + body.chars().count();
    if end >= chars.len() {
        return Err(ContainerError::query(format!(
            "unterminated string literal at offset {start}"
        )));
    }
    Ok((Token::Literal(body), end + 1 - start))
}

fn number(chars: &[char], start: usize) -> ContainerResult<(Token, usize)> {
    let mut end = start;
    let mut seen_dot = false;
    while let Some(&c) = chars.get(end) {
        if c.is_ascii_digit() {
            end += 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            end += 1;
        } else {
            break;
        }
    }
    let text: String = chars[start..end].iter().collect();
    let value = text
        .parse::<f64>()
        .map_err(|_| ContainerError::query(format!("invalid number {text:?}")))?;
    Ok((Token::Number(value), end - start))
}

fn name(chars: &[char], start: usize) -> ContainerResult<(Token, usize)> {
    let mut end = start;
    while let Some(&c) = chars.get(end) {
        if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':') {
            end += 1;
        } else {
            break;
        }
    }
    let text: String = chars[start..end].iter().collect();
    if text.contains("::") {
        return Err(ContainerError::query(format!(
            "axis syntax is not supported: {text}"
        )));
    }
    Ok((Token::Name(text), end - start))
}
