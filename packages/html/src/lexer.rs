//! HTML tokenizer using logos
//!
//! Only what document content needs: tags with attributes, text, entities.
//! Comments, doctypes and processing instructions are skipped.

use logos::{Lexer, Logos};

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    #[token("<!--", skip_comment)]
    Comment,

    #[regex(r"<![a-zA-Z][^>]*>", logos::skip)]
    #[regex(r"<\?[^>]*>", logos::skip)]
    Declaration,

    /// `<tag ...>` or `<tag ... />`, full source of the tag
    #[regex(r#"<[a-zA-Z][a-zA-Z0-9-]*([^>"']|"[^"]*"|'[^']*')*>"#, |lex| lex.slice())]
    OpenTag(&'src str),

    /// `</tag>`, the tag name only
    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>", |lex| {
        let s = lex.slice();
        s[2..s.len() - 1].trim_end()
    })]
    CloseTag(&'src str),

    #[regex(r"&([a-zA-Z][a-zA-Z0-9]*|#[0-9]+|#[xX][0-9a-fA-F]+);", |lex| lex.slice())]
    Entity(&'src str),

    #[regex(r"[^<&]+", |lex| lex.slice())]
    Text(&'src str),
}

fn skip_comment<'src>(lex: &mut Lexer<'src, Token<'src>>) -> logos::Skip {
    let rest = lex.remainder();
    let len = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
    lex.bump(len);
    logos::Skip
}

/// A start tag split into name, attributes and self-closing flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub self_closing: bool,
}

/// Split the source of an `OpenTag` token
pub fn parse_start_tag(source: &str) -> StartTag {
    let inner = source.trim_start_matches('<').trim_end_matches('>');
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let name_len = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_len].to_ascii_lowercase();

    let mut attrs = Vec::new();
    let mut rest = inner[name_len..].trim_start();
    while !rest.is_empty() {
        let key_len = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        if key_len == 0 {
            rest = rest[1..].trim_start();
            continue;
        }
        let key = rest[..key_len].to_ascii_lowercase();
        rest = rest[key_len..].trim_start();

        let mut value = String::new();
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (raw, remaining) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(quote).unwrap_or(body.len());
                    (&body[..end], body.get(end + 1..).unwrap_or(""))
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            value = decode_entities(raw);
            rest = remaining.trim_start();
        }
        attrs.push((key, value));
    }

    StartTag {
        name,
        attrs,
        self_closing,
    }
}

/// Decode a single `&...;` reference; unknown names are kept verbatim
pub fn decode_entity(entity: &str) -> String {
    let body = &entity[1..entity.len() - 1];
    let decoded = match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => body.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };
    decoded.map(String::from).unwrap_or_else(|| entity.to_string())
}

/// Decode every reference in a string (attribute values)
pub fn decode_entities(source: &str) -> String {
    Token::lexer(source)
        .spanned()
        .map(|(token, span)| match token {
            Ok(Token::Entity(entity)) => decode_entity(entity),
            _ => source[span].to_string(),
        })
        .collect()
}
