//! # Schema
//!
//! A [`Schema`] is the immutable set of node and mark types a document may
//! use. It is compiled once from [`NodeSpec`]/[`MarkSpec`] definitions, which
//! resolves content expressions and mark sets and rejects malformed specs.
//!
//! Types are reference-counted handles; cloning a [`NodeType`] or
//! [`MarkType`] is cheap and equality is by name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::content::{ContentExpr, TypeInfo};
use crate::dom::{ParseRule, ToDom};
use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;

/// Attribute values of a node or mark
pub type Attrs = BTreeMap<String, Value>;

/// Declaration of one attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrSpec {
    /// Value used when none is given. Attributes without a default are required.
    pub default: Option<Value>,
}

impl AttrSpec {
    pub fn required() -> Self {
        Self { default: None }
    }

    pub fn with_default(value: impl Into<Value>) -> Self {
        Self {
            default: Some(value.into()),
        }
    }
}

/// Definition of a node type
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    /// Content expression; `None` makes the node a leaf
    pub content: Option<String>,

    /// Allowed marks: `"_"` for all, `""` for none, or space-separated names.
    /// Defaults to all marks for nodes with inline content, none otherwise.
    pub marks: Option<String>,

    /// Space-separated group names
    pub group: Option<String>,

    pub inline: bool,
    pub atom: bool,

    /// Keeps its type when content is pasted or replaced over it
    pub defining: bool,

    /// Text used for this leaf node when extracting plain text
    pub leaf_text: Option<String>,

    pub attrs: BTreeMap<String, AttrSpec>,
    pub parse_dom: Vec<ParseRule>,
    pub to_dom: Option<ToDom>,
}

/// Definition of a mark type
#[derive(Debug, Clone)]
pub struct MarkSpec {
    pub attrs: BTreeMap<String, AttrSpec>,

    /// Whether the mark extends to text typed at its end
    pub inclusive: bool,

    pub parse_dom: Vec<ParseRule>,
    pub to_dom: Option<ToDom>,
}

impl Default for MarkSpec {
    fn default() -> Self {
        Self {
            attrs: BTreeMap::new(),
            inclusive: true,
            parse_dom: Vec::new(),
            to_dom: None,
        }
    }
}

/// Input to [`Schema::new`]. Order matters: mark order defines mark rank,
/// node order defines default-type lookups.
#[derive(Debug, Clone, Default)]
pub struct SchemaSpec {
    pub nodes: Vec<(String, NodeSpec)>,
    pub marks: Vec<(String, MarkSpec)>,

    /// Root node type, `"doc"` when unset
    pub top_node: Option<String>,
}

struct NodeTypeData {
    name: String,
    spec: NodeSpec,
    groups: Vec<String>,
    content: ContentExpr,
    inline_content: bool,
    /// `None` allows every mark
    mark_set: Option<Vec<String>>,
    default_attrs: Option<Attrs>,
}

/// Handle to a compiled node type
#[derive(Clone)]
pub struct NodeType(Arc<NodeTypeData>);

impl NodeType {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.0.spec
    }

    pub fn groups(&self) -> &[String] {
        &self.0.groups
    }

    pub fn is_in_group(&self, group: &str) -> bool {
        self.0.groups.iter().any(|g| g == group)
    }

    pub fn is_text(&self) -> bool {
        self.0.name == "text"
    }

    pub fn is_inline(&self) -> bool {
        self.0.spec.inline || self.is_text()
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }

    pub fn inline_content(&self) -> bool {
        self.0.inline_content
    }

    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.0.inline_content
    }

    pub fn is_leaf(&self) -> bool {
        self.0.content.is_empty()
    }

    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.0.spec.atom
    }

    pub fn has_required_attrs(&self) -> bool {
        self.0.spec.attrs.values().any(|a| a.default.is_none())
    }

    pub fn allows_mark_type(&self, mark_type: &MarkType) -> bool {
        match &self.0.mark_set {
            None => true,
            Some(set) => set.iter().any(|name| name == mark_type.name()),
        }
    }

    pub fn allows_marks(&self, marks: &[Mark]) -> bool {
        marks.iter().all(|m| self.allows_mark_type(m.mark_type()))
    }

    /// Whether content of `other` can be joined into a node of this type
    pub fn compatible_content(&self, other: &NodeType) -> bool {
        self == other || self.0.content == other.0.content
    }

    pub fn valid_content(&self, content: &Fragment) -> bool {
        let names: Vec<&str> = content.iter().map(|child| child.ty().name()).collect();
        self.0.content.matches(&names)
            && content.iter().all(|child| self.allows_marks(child.marks()))
    }

    pub fn check_content(&self, content: &Fragment) -> ModelResult<()> {
        if self.valid_content(content) {
            Ok(())
        } else {
            Err(ModelError::InvalidContent(self.name().to_string()))
        }
    }

    /// Fill in defaults and validate a set of attributes for this type
    pub fn compute_attrs(&self, given: Option<&Attrs>) -> ModelResult<Attrs> {
        if given.is_none() {
            if let Some(defaults) = &self.0.default_attrs {
                return Ok(defaults.clone());
            }
        }
        compute_attrs(self.name(), &self.0.spec.attrs, given)
    }

    /// Create a node, validating its content
    pub fn create_checked(
        &self,
        attrs: Option<&Attrs>,
        content: Fragment,
        marks: Vec<Mark>,
    ) -> ModelResult<Node> {
        self.check_content(&content)?;
        self.create(attrs, content, marks)
    }

    /// Create a node without validating its content
    pub fn create(
        &self,
        attrs: Option<&Attrs>,
        content: Fragment,
        marks: Vec<Mark>,
    ) -> ModelResult<Node> {
        if self.is_text() {
            return Err(ModelError::invalid_schema(
                "text",
                "text nodes are created with Schema::text",
            ));
        }
        let attrs = self.compute_attrs(attrs)?;
        Ok(Node::new(self.clone(), attrs, content, Mark::normalize_set(marks)))
    }
}

impl PartialEq for NodeType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for NodeType {}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({})", self.0.name)
    }
}

struct MarkTypeData {
    name: String,
    rank: usize,
    spec: MarkSpec,
    default_attrs: Option<Attrs>,
}

/// Handle to a compiled mark type
#[derive(Clone)]
pub struct MarkType(Arc<MarkTypeData>);

impl MarkType {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Position in the schema's mark order; mark sets are sorted by rank
    pub fn rank(&self) -> usize {
        self.0.rank
    }

    pub fn spec(&self) -> &MarkSpec {
        &self.0.spec
    }

    pub fn inclusive(&self) -> bool {
        self.0.spec.inclusive
    }

    pub fn create(&self, attrs: Option<&Attrs>) -> ModelResult<Mark> {
        let attrs = match (attrs, &self.0.default_attrs) {
            (None, Some(defaults)) => defaults.clone(),
            _ => compute_attrs(self.name(), &self.0.spec.attrs, attrs)?,
        };
        Ok(Mark::new(self.clone(), attrs))
    }

    /// The mark of this type in `set`, if any
    pub fn is_in_set<'a>(&self, set: &'a [Mark]) -> Option<&'a Mark> {
        set.iter().find(|m| m.mark_type() == self)
    }

    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|m| m.mark_type() != self).cloned().collect()
    }
}

impl PartialEq for MarkType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for MarkType {}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkType({})", self.0.name)
    }
}

fn compute_attrs(
    owner: &str,
    declared: &BTreeMap<String, AttrSpec>,
    given: Option<&Attrs>,
) -> ModelResult<Attrs> {
    if let Some(given) = given {
        if let Some(unknown) = given.keys().find(|k| !declared.contains_key(*k)) {
            return Err(ModelError::invalid_attrs(
                owner,
                format!("unsupported attribute '{}'", unknown),
            ));
        }
    }

    let mut attrs = Attrs::new();
    for (name, spec) in declared {
        let value = match given.and_then(|g| g.get(name)) {
            Some(value) => value.clone(),
            None => spec.default.clone().ok_or_else(|| {
                ModelError::invalid_attrs(owner, format!("no value supplied for attribute '{}'", name))
            })?,
        };
        attrs.insert(name.clone(), value);
    }
    Ok(attrs)
}

fn default_attrs(declared: &BTreeMap<String, AttrSpec>) -> Option<Attrs> {
    declared
        .iter()
        .map(|(name, spec)| spec.default.clone().map(|value| (name.clone(), value)))
        .collect()
}

struct SchemaData {
    nodes: Vec<NodeType>,
    marks: Vec<MarkType>,
    top_node: NodeType,
}

/// Compiled, immutable document schema
#[derive(Clone)]
pub struct Schema(Arc<SchemaData>);

impl Schema {
    pub fn new(spec: SchemaSpec) -> ModelResult<Self> {
        let SchemaSpec {
            nodes: node_specs,
            marks: mark_specs,
            top_node,
        } = spec;
        let top_name = top_node.unwrap_or_else(|| "doc".to_string());

        check_unique(node_specs.iter().map(|(name, _)| name.as_str()))?;
        check_unique(mark_specs.iter().map(|(name, _)| name.as_str()))?;

        let marks: Vec<MarkType> = mark_specs
            .into_iter()
            .enumerate()
            .map(|(rank, (name, spec))| {
                MarkType(Arc::new(MarkTypeData {
                    default_attrs: default_attrs(&spec.attrs),
                    name,
                    rank,
                    spec,
                }))
            })
            .collect();

        let infos: Vec<TypeInfo<'_>> = node_specs
            .iter()
            .map(|(name, spec)| TypeInfo {
                name: name.as_str(),
                groups: split_words(spec.group.as_deref()),
            })
            .collect();

        let mut exprs = Vec::with_capacity(node_specs.len());
        for (name, spec) in &node_specs {
            let expr = match &spec.content {
                Some(source) => ContentExpr::parse(name, source, &infos)?,
                None => ContentExpr::empty(),
            };
            exprs.push(expr);
        }

        let is_inline = |name: &str| {
            node_specs
                .iter()
                .any(|(n, s)| n == name && (s.inline || n == "text"))
        };

        let mut nodes = Vec::with_capacity(node_specs.len());
        for ((name, spec), content) in node_specs.iter().zip(exprs) {
            let referenced = content.referenced_names();
            let inline_content = !referenced.is_empty() && referenced.iter().all(|n| is_inline(*n));
            if !referenced.is_empty()
                && !inline_content
                && referenced.iter().any(|n| is_inline(*n))
            {
                return Err(ModelError::invalid_schema(
                    name.as_str(),
                    "mixing inline and block content",
                ));
            }
            if name == "text" && !content.is_empty() {
                return Err(ModelError::invalid_schema("text", "the text node cannot have content"));
            }

            let mark_set = resolve_mark_set(name, spec.marks.as_deref(), inline_content, &marks)?;

            nodes.push(NodeType(Arc::new(NodeTypeData {
                name: name.clone(),
                groups: split_words(spec.group.as_deref())
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                default_attrs: default_attrs(&spec.attrs),
                spec: spec.clone(),
                content,
                inline_content,
                mark_set,
            })));
        }

        let top_node = nodes
            .iter()
            .find(|t| t.name() == top_name)
            .cloned()
            .ok_or_else(|| ModelError::invalid_schema(&top_name, "schema is missing its top node type"))?;
        if !nodes.iter().any(NodeType::is_text) {
            return Err(ModelError::invalid_schema("text", "every schema needs a 'text' type"));
        }
        if top_node.is_leaf() || top_node.is_inline() {
            return Err(ModelError::invalid_schema(&top_name, "the top node must be a block with content"));
        }

        Ok(Schema(Arc::new(SchemaData {
            nodes,
            marks,
            top_node,
        })))
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.0.nodes.iter().find(|t| t.name() == name)
    }

    pub fn mark_type(&self, name: &str) -> Option<&MarkType> {
        self.0.marks.iter().find(|t| t.name() == name)
    }

    pub fn node_types(&self) -> &[NodeType] {
        &self.0.nodes
    }

    pub fn mark_types(&self) -> &[MarkType] {
        &self.0.marks
    }

    pub fn top_node_type(&self) -> &NodeType {
        &self.0.top_node
    }

    /// First textblock type that needs no attributes, used when inline
    /// content has to be wrapped
    pub fn default_textblock_type(&self) -> Option<&NodeType> {
        self.0
            .nodes
            .iter()
            .find(|t| t.is_textblock() && !t.has_required_attrs())
    }

    pub fn text(&self, text: impl Into<String>, marks: Vec<Mark>) -> ModelResult<Node> {
        let text = text.into();
        if text.is_empty() {
            return Err(ModelError::InvalidContent("text (empty text nodes are not allowed)".into()));
        }
        let ty = self
            .node_type("text")
            .cloned()
            .ok_or_else(|| ModelError::UnknownNodeType("text".into()))?;
        Ok(Node::new_text(ty, text, Mark::normalize_set(marks)))
    }

    /// Create a node of the named type with content validation
    pub fn node(
        &self,
        name: &str,
        attrs: Option<&Attrs>,
        content: Vec<Node>,
        marks: Vec<Mark>,
    ) -> ModelResult<Node> {
        let ty = self
            .node_type(name)
            .ok_or_else(|| ModelError::UnknownNodeType(name.to_string()))?;
        ty.create_checked(attrs, Fragment::from_vec(content), marks)
    }

    pub fn mark(&self, name: &str, attrs: Option<&Attrs>) -> ModelResult<Mark> {
        self.mark_type(name)
            .ok_or_else(|| ModelError::UnknownMarkType(name.to_string()))?
            .create(attrs)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("nodes", &self.0.nodes)
            .field("marks", &self.0.marks)
            .finish()
    }
}

fn split_words(source: Option<&str>) -> Vec<&str> {
    source.map(|s| s.split_whitespace().collect()).unwrap_or_default()
}

fn check_unique<'a>(names: impl Iterator<Item = &'a str>) -> ModelResult<()> {
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        if seen.contains(&name) {
            return Err(ModelError::invalid_schema(name, "duplicate type name"));
        }
        seen.push(name);
    }
    Ok(())
}

fn resolve_mark_set(
    owner: &str,
    source: Option<&str>,
    inline_content: bool,
    marks: &[MarkType],
) -> ModelResult<Option<Vec<String>>> {
    match source {
        None if inline_content => Ok(None),
        None => Ok(Some(Vec::new())),
        Some("_") => Ok(None),
        Some(source) => {
            let mut set = Vec::new();
            for name in source.split_whitespace() {
                if !marks.iter().any(|m| m.name() == name) {
                    return Err(ModelError::invalid_schema(
                        owner,
                        format!("unknown mark type '{}' in mark set", name),
                    ));
                }
                set.push(name.to_string());
            }
            Ok(Some(set))
        }
    }
}
