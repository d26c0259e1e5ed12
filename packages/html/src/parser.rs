//! # HTML → document
//!
//! Parsing runs in two passes. The token stream is first assembled into a
//! small element tree (implicitly closing unclosed elements), which is then
//! walked against the schema's parse rules:
//!
//! - elements matching a node rule open that node;
//! - elements matching a mark rule add the mark to the text inside them;
//! - other elements are transparent, except block-level ones which end the
//!   current paragraph and content-free ones like `<script>` which are
//!   dropped entirely.
//!
//! Inline content that lands directly in a block container is wrapped in the
//! schema's default textblock. Whitespace is collapsed the way a browser
//! renders it.

use folio_model::{Attrs, DomAttrs, DomParser, Fragment, Mark, ModelResult, Node, NodeType, Schema};
use logos::Logos;
use tracing::trace;

use crate::error::{HtmlError, HtmlResult};
use crate::lexer::{decode_entity, parse_start_tag, Token};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

const IGNORED_ELEMENTS: &[&str] = &["head", "script", "style", "template", "title", "noscript"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "body", "dd", "div", "dl", "dt", "fieldset", "figcaption", "figure",
    "footer", "form", "header", "hr", "html", "li", "main", "nav", "ol", "pre", "section", "table", "tbody",
    "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Element tree produced by the first pass
#[derive(Debug, Clone, PartialEq)]
enum DomNode {
    Element {
        tag: String,
        attrs: DomAttrs,
        children: Vec<DomNode>,
    },
    Text(String),
}

/// Parses HTML fragments into documents of any schema whose specs carry
/// parse rules
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl HtmlParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_document(&self, markup: &str, schema: &Schema) -> HtmlResult<Node> {
        let tree = build_tree(markup);
        let mut builder = DocBuilder::new(schema);
        for node in &tree {
            builder.walk(node)?;
        }
        builder.finish()
    }
}

impl DomParser for HtmlParser {
    fn parse(&self, markup: &str, schema: &Schema) -> ModelResult<Node> {
        Ok(self.parse_document(markup, schema)?)
    }
}

fn build_tree(markup: &str) -> Vec<DomNode> {
    // (tag, attrs, children) for every element still open
    let mut stack: Vec<(String, DomAttrs, Vec<DomNode>)> = vec![(String::new(), DomAttrs::new(), Vec::new())];

    fn push_text(children: &mut Vec<DomNode>, text: &str) {
        if let Some(DomNode::Text(last)) = children.last_mut() {
            last.push_str(text);
        } else {
            children.push(DomNode::Text(text.to_string()));
        }
    }

    fn close_top(stack: &mut Vec<(String, DomAttrs, Vec<DomNode>)>) {
        if stack.len() > 1 {
            if let Some((tag, attrs, children)) = stack.pop() {
                if let Some(parent) = stack.last_mut() {
                    parent.2.push(DomNode::Element { tag, attrs, children });
                }
            }
        }
    }

    for (token, span) in Token::lexer(markup).spanned() {
        let Some(top) = stack.last_mut() else {
            break;
        };
        match token {
            Ok(Token::Text(text)) => push_text(&mut top.2, text),
            Ok(Token::Entity(entity)) => push_text(&mut top.2, &decode_entity(entity)),
            Ok(Token::OpenTag(source)) => {
                let tag = parse_start_tag(source);
                // A new paragraph implicitly closes an open one
                if tag.name == "p" && top.0 == "p" {
                    close_top(&mut stack);
                }
                let attrs: DomAttrs = tag.attrs.into_iter().collect();
                if tag.self_closing || VOID_ELEMENTS.contains(&tag.name.as_str()) {
                    if let Some(top) = stack.last_mut() {
                        top.2.push(DomNode::Element {
                            tag: tag.name,
                            attrs,
                            children: Vec::new(),
                        });
                    }
                } else {
                    stack.push((tag.name, attrs, Vec::new()));
                }
            }
            Ok(Token::CloseTag(name)) => {
                let name = name.to_ascii_lowercase();
                // Stray closing tags are ignored
                if let Some(depth) = stack.iter().rposition(|(tag, _, _)| *tag == name) {
                    if depth > 0 {
                        while stack.len() > depth {
                            close_top(&mut stack);
                        }
                    }
                }
            }
            Ok(Token::Comment) | Ok(Token::Declaration) => {}
            Err(_) => push_text(&mut top.2, &markup[span]),
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|(_, _, children)| children).unwrap_or_default()
}

struct OpenNode {
    ty: NodeType,
    attrs: Attrs,
    content: Vec<Node>,
    /// Opened to hold stray inline content rather than by an element
    implicit: bool,
}

struct DocBuilder<'a> {
    schema: &'a Schema,
    open: Vec<OpenNode>,
    marks: Vec<Mark>,
}

impl<'a> DocBuilder<'a> {
    fn new(schema: &'a Schema) -> Self {
        let top = schema.top_node_type().clone();
        Self {
            schema,
            open: vec![OpenNode {
                ty: top,
                attrs: Attrs::new(),
                content: Vec::new(),
                implicit: false,
            }],
            marks: Vec::new(),
        }
    }

    fn walk(&mut self, node: &DomNode) -> HtmlResult<()> {
        match node {
            DomNode::Text(text) => self.add_text(text),
            DomNode::Element { tag, attrs, children } => self.add_element(tag, attrs, children),
        }
    }

    fn add_element(&mut self, tag: &str, dom_attrs: &DomAttrs, children: &[DomNode]) -> HtmlResult<()> {
        if IGNORED_ELEMENTS.contains(&tag) {
            return Ok(());
        }

        if let Some((ty, attrs)) = self.match_node(tag, dom_attrs) {
            return if ty.is_leaf() {
                self.insert_leaf(&ty, &attrs)
            } else {
                let index = self.open_node(ty, attrs)?;
                for child in children {
                    self.walk(child)?;
                }
                // Also closes implicit paragraphs opened inside the node
                while self.open.len() > index {
                    self.close_node()?;
                }
                Ok(())
            };
        }

        if let Some(mark) = self.match_mark(tag, dom_attrs)? {
            let saved = self.marks.clone();
            self.marks = mark.add_to_set(&self.marks);
            let result = children.iter().try_for_each(|child| self.walk(child));
            self.marks = saved;
            return result;
        }

        trace!(tag, "no parse rule, descending into children");
        let is_block = BLOCK_ELEMENTS.contains(&tag);
        if is_block {
            self.close_implicit()?;
        }
        for child in children {
            self.walk(child)?;
        }
        if is_block {
            self.close_implicit()?;
        }
        Ok(())
    }

    fn match_node(&self, tag: &str, dom_attrs: &DomAttrs) -> Option<(NodeType, Attrs)> {
        self.schema.node_types().iter().find_map(|ty| {
            ty.spec()
                .parse_dom
                .iter()
                .find_map(|rule| rule.match_element(tag, dom_attrs))
                .map(|attrs| (ty.clone(), attrs))
        })
    }

    fn match_mark(&self, tag: &str, dom_attrs: &DomAttrs) -> HtmlResult<Option<Mark>> {
        for mark_type in self.schema.mark_types() {
            if let Some(attrs) = mark_type
                .spec()
                .parse_dom
                .iter()
                .find_map(|rule| rule.match_element(tag, dom_attrs))
            {
                let attrs = if attrs.is_empty() { None } else { Some(attrs) };
                return Ok(Some(mark_type.create(attrs.as_ref())?));
            }
        }
        Ok(None)
    }

    fn top(&self) -> HtmlResult<&OpenNode> {
        self.open.last().ok_or_else(|| HtmlError::markup(0, "no open node"))
    }

    fn top_mut(&mut self) -> HtmlResult<&mut OpenNode> {
        self.open.last_mut().ok_or_else(|| HtmlError::markup(0, "no open node"))
    }

    /// Make sure the innermost open node takes inline content
    fn ensure_textblock(&mut self) -> HtmlResult<()> {
        if self.top()?.ty.inline_content() {
            return Ok(());
        }
        let ty = self
            .schema
            .default_textblock_type()
            .cloned()
            .ok_or_else(|| HtmlError::markup(0, "schema has no textblock for inline content"))?;
        self.open.push(OpenNode {
            ty,
            attrs: Attrs::new(),
            content: Vec::new(),
            implicit: true,
        });
        Ok(())
    }

    fn close_implicit(&mut self) -> HtmlResult<()> {
        while self.open.len() > 1 && self.top()?.implicit {
            self.close_node()?;
        }
        Ok(())
    }

    fn add_text(&mut self, raw: &str) -> HtmlResult<()> {
        let mut text = collapse_whitespace(raw);
        if text.trim().is_empty() && !self.top()?.ty.inline_content() {
            return Ok(());
        }
        self.ensure_textblock()?;

        let top = self.top()?;
        let at_line_start = match top.content.last() {
            None => true,
            Some(last) => last.text().map(|t| t.ends_with(' ')).unwrap_or(!last.is_text()),
        };
        if at_line_start {
            text = text.trim_start().to_string();
        }
        if text.is_empty() {
            return Ok(());
        }

        let marks: Vec<Mark> = self
            .marks
            .iter()
            .filter(|m| top.ty.allows_mark_type(m.mark_type()))
            .cloned()
            .collect();
        let node = self.schema.text(text, marks)?;
        self.top_mut()?.content.push(node);
        Ok(())
    }

    fn insert_leaf(&mut self, ty: &NodeType, attrs: &Attrs) -> HtmlResult<()> {
        if ty.is_inline() {
            self.ensure_textblock()?;
        } else {
            self.close_to_block_container()?;
        }
        let top = self.top()?;
        let marks: Vec<Mark> = if ty.is_inline() {
            self.marks
                .iter()
                .filter(|m| top.ty.allows_mark_type(m.mark_type()))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        let node = ty.create(Some(attrs), Fragment::empty(), marks)?;
        self.top_mut()?.content.push(node);
        Ok(())
    }

    /// Open a node, returning its index in the open stack
    fn open_node(&mut self, ty: NodeType, attrs: Attrs) -> HtmlResult<usize> {
        if ty.is_inline() {
            self.ensure_textblock()?;
        } else {
            self.close_to_block_container()?;
        }
        self.open.push(OpenNode {
            ty,
            attrs,
            content: Vec::new(),
            implicit: false,
        });
        Ok(self.open.len() - 1)
    }

    /// Close open textblocks so a block node can be placed
    fn close_to_block_container(&mut self) -> HtmlResult<()> {
        while self.open.len() > 1 && self.top()?.ty.inline_content() {
            self.close_node()?;
        }
        Ok(())
    }

    fn close_node(&mut self) -> HtmlResult<()> {
        if self.open.len() <= 1 {
            return Ok(());
        }
        let Some(mut open) = self.open.pop() else {
            return Ok(());
        };
        trim_trailing_space(&mut open.content)?;

        match finish_node(self.schema, &open)? {
            Some(node) => self.top_mut()?.content.push(node),
            // Content the node cannot hold is spliced into the parent
            None => self.top_mut()?.content.extend(open.content),
        }
        Ok(())
    }

    fn finish(mut self) -> HtmlResult<Node> {
        while self.open.len() > 1 {
            self.close_node()?;
        }
        let top = self
            .open
            .pop()
            .ok_or_else(|| HtmlError::markup(0, "no open node"))?;
        finish_node(self.schema, &top)?
            .ok_or_else(|| HtmlError::markup(0, format!("content does not fit {}", top.ty.name())))
    }
}

/// Build a node from an open node, filling an empty container with an empty
/// textblock when that makes it valid. `None` when the content cannot fit.
fn finish_node(schema: &Schema, open: &OpenNode) -> HtmlResult<Option<Node>> {
    let content = Fragment::from_vec(open.content.clone());
    if open.ty.valid_content(&content) {
        return Ok(Some(open.ty.create(Some(&open.attrs), content, Vec::new())?));
    }
    if content.size() == 0 {
        if let Some(textblock) = schema.default_textblock_type() {
            let filler = textblock.create(None, Fragment::empty(), Vec::new())?;
            let filled = Fragment::from_node(filler);
            if open.ty.valid_content(&filled) {
                return Ok(Some(open.ty.create(Some(&open.attrs), filled, Vec::new())?));
            }
        }
    }
    Ok(None)
}

fn trim_trailing_space(content: &mut Vec<Node>) -> HtmlResult<()> {
    let Some(last) = content.last() else {
        return Ok(());
    };
    let Some(text) = last.text() else {
        return Ok(());
    };
    let trimmed = text.trim_end_matches(' ');
    if trimmed.len() == text.len() {
        return Ok(());
    }
    if trimmed.is_empty() {
        content.pop();
    } else {
        let replaced = last.with_text(trimmed.to_string());
        if let Some(slot) = content.last_mut() {
            *slot = replaced;
        }
    }
    Ok(())
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}') {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tree_closes_unclosed_elements() {
        let tree = build_tree("<p>one<p>two</div>");
        assert_eq!(tree.len(), 2);
        match &tree[1] {
            DomNode::Element { tag, children, .. } => {
                assert_eq!(tag, "p");
                assert_eq!(children, &vec![DomNode::Text("two".into())]);
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_build_tree_void_and_entities() {
        let tree = build_tree("a<br>b &lt; c");
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[2], DomNode::Text("b < c".into()));
    }

    #[test]
    fn test_stray_less_than_is_text() {
        let tree = build_tree("1 < 2");
        assert_eq!(tree, vec![DomNode::Text("1 < 2".into())]);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \n\t b"), "a b");
        assert_eq!(collapse_whitespace("  "), " ");
    }
}
