//! # Document builder
//!
//! Turns external content (JSON or HTML) into a document for the assembled
//! schema. Invalid input never fails: it is logged and replaced by the
//! canonical empty document.

use folio_model::{DomParser, ModelError, ModelResult, Node, Schema};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{EditorError, EditorResult};

/// `{"type":"doc","content":[{"type":"paragraph"}]}`
pub fn empty_document_json() -> Value {
    json!({"type": "doc", "content": [{"type": "paragraph"}]})
}

pub struct DocumentBuilder {
    schema: Schema,
    empty: Node,
}

impl DocumentBuilder {
    /// Fails when the schema cannot represent the empty document
    pub fn new(schema: Schema) -> EditorResult<Self> {
        let empty = parse_checked(&schema, &empty_document_json()).map_err(|err| {
            EditorError::InvalidSchemaFragment {
                name: schema.top_node_type().name().to_string(),
                message: format!("cannot build the empty document: {}", err),
            }
        })?;
        Ok(Self { schema, empty })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The canonical empty document: one empty paragraph
    pub fn empty(&self) -> Node {
        self.empty.clone()
    }

    /// Parse and validate JSON content against the schema, reporting why it
    /// does not fit instead of falling back
    pub fn try_build(&self, content: &Value) -> ModelResult<Node> {
        parse_checked(&self.schema, content)
    }

    /// Build from JSON content. Absent or non-object content gives the empty
    /// document, and so does content that does not fit the schema.
    pub fn build(&self, content: Option<&Value>) -> Node {
        let Some(content) = content.filter(|c| c.is_object()) else {
            debug!("no structured content, using the empty document");
            return self.empty();
        };

        match self.try_build(content) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(error = %err, content = %content, "invalid content, using the empty document");
                self.empty()
            }
        }
    }

    /// Build from markup through `parser`, falling back like [`Self::build`]
    pub fn build_html(&self, parser: &dyn DomParser, markup: &str) -> Node {
        let parsed = parser.parse(markup, &self.schema).and_then(|doc| {
            doc.check()?;
            Ok(doc)
        });
        match parsed {
            Ok(doc) if doc.ty() == self.schema.top_node_type() => doc,
            Ok(doc) => {
                warn!(node = doc.type_name(), "markup did not produce a document, using the empty document");
                self.empty()
            }
            Err(err) => {
                warn!(error = %err, "invalid markup, using the empty document");
                self.empty()
            }
        }
    }
}

fn parse_checked(schema: &Schema, content: &Value) -> ModelResult<Node> {
    let doc = schema.node_from_json(content)?;
    doc.check()?;
    if doc.ty() != schema.top_node_type() {
        return Err(ModelError::invalid_json(format!(
            "expected a '{}' node at the top, found '{}'",
            schema.top_node_type().name(),
            doc.type_name()
        )));
    }
    Ok(doc)
}
