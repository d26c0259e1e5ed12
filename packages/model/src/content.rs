//! Content expressions
//!
//! A node type's `content` string describes which children it accepts:
//!
//! ```text
//! "block+"                  one or more nodes from the `block` group
//! "inline*"                 any number of inline nodes
//! "heading paragraph*"      a heading followed by paragraphs
//! "(paragraph | heading)?"  optional choice
//! ```
//!
//! Expressions are resolved against the full set of node types once, when the
//! schema is built. Group names expand to the node types that declare them.

use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ContentExpr {
    /// Matches one child whose type name is in the set
    Names(Vec<String>),
    Seq(Vec<ContentExpr>),
    Choice(Vec<ContentExpr>),
    Star(Box<ContentExpr>),
    Plus(Box<ContentExpr>),
    Opt(Box<ContentExpr>),
}

/// Node type info the resolver needs to expand names and groups
pub(crate) struct TypeInfo<'a> {
    pub name: &'a str,
    pub groups: Vec<&'a str>,
}

impl ContentExpr {
    pub(crate) fn empty() -> Self {
        ContentExpr::Seq(Vec::new())
    }

    pub(crate) fn parse(owner: &str, source: &str, types: &[TypeInfo<'_>]) -> ModelResult<Self> {
        let tokens = tokenize(owner, source)?;
        let mut stream = TokenStream {
            owner,
            source,
            tokens,
            pos: 0,
            types,
        };
        let expr = stream.parse_choice()?;
        if stream.pos < stream.tokens.len() {
            return Err(stream.error(format!("unexpected token '{}'", stream.tokens[stream.pos])));
        }
        Ok(expr)
    }

    /// True when the expression accepts no children at all
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            ContentExpr::Seq(items) => items.iter().all(ContentExpr::is_empty),
            _ => false,
        }
    }

    /// Every node type name the expression can mention, in order
    pub(crate) fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ContentExpr::Names(set) => out.extend(set.iter().map(String::as_str)),
            ContentExpr::Seq(items) | ContentExpr::Choice(items) => {
                items.iter().for_each(|item| item.collect_names(out))
            }
            ContentExpr::Star(inner) | ContentExpr::Plus(inner) | ContentExpr::Opt(inner) => {
                inner.collect_names(out)
            }
        }
    }

    /// Whether the sequence of child type names satisfies the expression
    pub(crate) fn matches(&self, names: &[&str]) -> bool {
        self.match_at(names, 0, &mut |end| end == names.len())
    }

    fn match_at(&self, names: &[&str], at: usize, k: &mut dyn FnMut(usize) -> bool) -> bool {
        match self {
            ContentExpr::Names(set) => {
                at < names.len() && set.iter().any(|n| n == names[at]) && k(at + 1)
            }
            ContentExpr::Seq(items) => match_seq(items, names, at, k),
            ContentExpr::Choice(alts) => {
                for alt in alts {
                    if alt.match_at(names, at, k) {
                        return true;
                    }
                }
                false
            }
            ContentExpr::Star(inner) => match_star(inner, names, at, k),
            ContentExpr::Plus(inner) => {
                inner.match_at(names, at, &mut |next| match_star(inner, names, next, k))
            }
            ContentExpr::Opt(inner) => inner.match_at(names, at, k) || k(at),
        }
    }
}

fn match_seq(
    items: &[ContentExpr],
    names: &[&str],
    at: usize,
    k: &mut dyn FnMut(usize) -> bool,
) -> bool {
    match items.split_first() {
        None => k(at),
        Some((first, rest)) => first.match_at(names, at, &mut |next| match_seq(rest, names, next, k)),
    }
}

fn match_star(
    inner: &ContentExpr,
    names: &[&str],
    at: usize,
    k: &mut dyn FnMut(usize) -> bool,
) -> bool {
    // Greedy: consume as much as possible, then fall back. Zero-width
    // iterations are rejected so the recursion always makes progress.
    inner.match_at(names, at, &mut |next| next > at && match_star(inner, names, next, k)) || k(at)
}

fn tokenize(owner: &str, source: &str) -> ModelResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' | ')' | '|' | '*' | '+' | '?' => tokens.push(c.to_string()),
            c if c.is_alphanumeric() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        end = i + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(source[start..end].to_string());
            }
            other => {
                return Err(ModelError::invalid_schema(
                    owner,
                    format!("unexpected character '{}' in content expression \"{}\"", other, source),
                ))
            }
        }
    }

    Ok(tokens)
}

struct TokenStream<'a> {
    owner: &'a str,
    source: &'a str,
    tokens: Vec<String>,
    pos: usize,
    types: &'a [TypeInfo<'a>],
}

impl<'a> TokenStream<'a> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ModelError {
        ModelError::invalid_schema(
            self.owner,
            format!("{} in content expression \"{}\"", message.into(), self.source),
        )
    }

    fn parse_choice(&mut self) -> ModelResult<ContentExpr> {
        let mut alts = vec![self.parse_seq()?];
        while self.eat("|") {
            alts.push(self.parse_seq()?);
        }
        Ok(if alts.len() == 1 {
            alts.remove(0)
        } else {
            ContentExpr::Choice(alts)
        })
    }

    fn parse_seq(&mut self) -> ModelResult<ContentExpr> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            if token == ")" || token == "|" {
                break;
            }
            items.push(self.parse_postfix()?);
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            ContentExpr::Seq(items)
        })
    }

    fn parse_postfix(&mut self) -> ModelResult<ContentExpr> {
        let mut expr = self.parse_atom()?;
        loop {
            expr = if self.eat("*") {
                ContentExpr::Star(Box::new(expr))
            } else if self.eat("+") {
                ContentExpr::Plus(Box::new(expr))
            } else if self.eat("?") {
                ContentExpr::Opt(Box::new(expr))
            } else {
                return Ok(expr);
            };
        }
    }

    fn parse_atom(&mut self) -> ModelResult<ContentExpr> {
        if self.eat("(") {
            let expr = self.parse_choice()?;
            if !self.eat(")") {
                return Err(self.error("missing closing parenthesis"));
            }
            return Ok(expr);
        }

        let Some(token) = self.peek().map(str::to_string) else {
            return Err(self.error("unexpected end of expression"));
        };
        if matches!(token.as_str(), "*" | "+" | "?" | ")" | "|") {
            return Err(self.error(format!("unexpected token '{}'", token)));
        }
        self.pos += 1;

        let names = self.resolve(&token);
        if names.is_empty() {
            return Err(self.error(format!("no node type or group '{}'", token)));
        }
        Ok(ContentExpr::Names(names))
    }

    fn resolve(&self, name: &str) -> Vec<String> {
        if let Some(info) = self.types.iter().find(|t| t.name == name) {
            return vec![info.name.to_string()];
        }
        self.types
            .iter()
            .filter(|t| t.groups.contains(&name))
            .map(|t| t.name.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> Vec<TypeInfo<'static>> {
        vec![
            TypeInfo { name: "paragraph", groups: vec!["block"] },
            TypeInfo { name: "heading", groups: vec!["block"] },
            TypeInfo { name: "text", groups: vec!["inline"] },
            TypeInfo { name: "hard_break", groups: vec!["inline"] },
        ]
    }

    #[test]
    fn test_group_plus() {
        let expr = ContentExpr::parse("doc", "block+", &types()).unwrap();
        assert!(expr.matches(&["paragraph", "heading"]));
        assert!(!expr.matches(&[]));
        assert!(!expr.matches(&["text"]));
    }

    #[test]
    fn test_sequence_and_choice() {
        let expr = ContentExpr::parse("x", "heading (paragraph | heading)*", &types()).unwrap();
        assert!(expr.matches(&["heading"]));
        assert!(expr.matches(&["heading", "paragraph", "heading"]));
        assert!(!expr.matches(&["paragraph"]));
    }

    #[test]
    fn test_optional() {
        let expr = ContentExpr::parse("x", "paragraph? heading", &types()).unwrap();
        assert!(expr.matches(&["heading"]));
        assert!(expr.matches(&["paragraph", "heading"]));
        assert!(!expr.matches(&["paragraph"]));
    }

    #[test]
    fn test_empty_expression() {
        let expr = ContentExpr::parse("x", "", &types()).unwrap();
        assert!(expr.is_empty());
        assert!(expr.matches(&[]));
    }

    #[test]
    fn test_unknown_name_rejected() {
        let err = ContentExpr::parse("doc", "section+", &types()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidSchema { .. }));
    }

    #[test]
    fn test_unbalanced_parens_rejected() {
        assert!(ContentExpr::parse("doc", "(paragraph | heading", &types()).is_err());
        assert!(ContentExpr::parse("doc", "*", &types()).is_err());
    }
}
