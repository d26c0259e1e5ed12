//! DOM-facing parts of the schema
//!
//! Node and mark specs describe how they are recognized in markup
//! ([`ParseRule`]) and how they are written back out ([`DomOutput`]). Actual
//! markup parsing is an injected collaborator implementing [`DomParser`], so
//! the model never depends on a particular HTML implementation.

use std::collections::BTreeMap;

use crate::error::ModelResult;
use crate::node::Node;
use crate::schema::{Attrs, Schema};

/// Attributes of a markup element, as read from the source
pub type DomAttrs = BTreeMap<String, String>;

/// Derives node/mark attributes from element attributes. Returning `None`
/// means the rule does not match this element.
pub type GetAttrs = fn(&DomAttrs) -> Option<Attrs>;

/// Renders node/mark attributes as an output element
pub type ToDom = fn(&Attrs) -> DomOutput;

/// Recognizes one markup element as a node or mark
#[derive(Debug, Clone)]
pub struct ParseRule {
    /// Lowercase tag name
    pub tag: String,

    /// Fixed attributes assigned on match
    pub attrs: Attrs,

    pub get_attrs: Option<GetAttrs>,
}

impl ParseRule {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            attrs: Attrs::new(),
            get_attrs: None,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    pub fn with_get_attrs(mut self, get_attrs: GetAttrs) -> Self {
        self.get_attrs = Some(get_attrs);
        self
    }

    /// Attributes produced for an element with this tag, if the rule applies
    pub fn match_element(&self, tag: &str, dom_attrs: &DomAttrs) -> Option<Attrs> {
        if !self.tag.eq_ignore_ascii_case(tag) {
            return None;
        }
        let mut attrs = self.attrs.clone();
        if let Some(get_attrs) = self.get_attrs {
            attrs.extend(get_attrs(dom_attrs)?);
        }
        Some(attrs)
    }
}

/// Output element description for serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomOutput {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
}

impl DomOutput {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }
}

/// Markup parsing collaborator
pub trait DomParser {
    /// Parse a markup fragment into a document conforming to `schema`
    fn parse(&self, markup: &str, schema: &Schema) -> ModelResult<Node>;
}
