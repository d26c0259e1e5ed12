//! JSON form of documents
//!
//! ```json
//! {"type": "doc", "content": [
//!   {"type": "paragraph", "content": [
//!     {"type": "text", "text": "hi", "marks": [{"type": "bold"}]}
//!   ]}
//! ]}
//! ```
//!
//! `attrs` is written only for types that declare attributes, `content` and
//! `marks` only when non-empty, so canonical input serializes back unchanged.

use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;
use crate::schema::{Attrs, Schema};

impl Schema {
    /// Deserialize a node (and its descendants) from JSON.
    ///
    /// Types, attributes and marks are resolved against the schema. Content
    /// expressions are not checked here; call [`Node::check`] for that.
    pub fn node_from_json(&self, json: &Value) -> ModelResult<Node> {
        let obj = json
            .as_object()
            .ok_or_else(|| ModelError::invalid_json("node must be an object"))?;
        let type_name = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ModelError::invalid_json("node is missing a string 'type'"))?;

        let marks = match obj.get("marks") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| self.mark_from_json(item))
                .collect::<ModelResult<Vec<_>>>()?,
            Some(_) => return Err(ModelError::invalid_json("'marks' must be an array")),
        };
        if !Mark::same_set(&marks, &Mark::normalize_set(marks.clone())) {
            return Err(ModelError::invalid_json(format!(
                "'marks' of a {} node must be distinct and in schema order, found {:?}",
                type_name, marks
            )));
        }

        if type_name == "text" {
            let text = obj
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| ModelError::invalid_json("text node is missing 'text'"))?;
            return self.text(text, marks);
        }

        let ty = self
            .node_type(type_name)
            .ok_or_else(|| ModelError::UnknownNodeType(type_name.to_string()))?;
        let attrs = attrs_from_json(type_name, obj.get("attrs"))?;

        let content = match obj.get("content") {
            None | Some(Value::Null) => Fragment::empty(),
            Some(Value::Array(items)) => Fragment::from_vec(
                items
                    .iter()
                    .map(|item| self.node_from_json(item))
                    .collect::<ModelResult<Vec<_>>>()?,
            ),
            Some(_) => return Err(ModelError::invalid_json("'content' must be an array")),
        };

        ty.create(attrs.as_ref(), content, marks)
    }

    pub fn mark_from_json(&self, json: &Value) -> ModelResult<Mark> {
        let obj = json
            .as_object()
            .ok_or_else(|| ModelError::invalid_json("mark must be an object"))?;
        let type_name = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| ModelError::invalid_json("mark is missing a string 'type'"))?;
        let mark_type = self
            .mark_type(type_name)
            .ok_or_else(|| ModelError::UnknownMarkType(type_name.to_string()))?;
        let attrs = attrs_from_json(type_name, obj.get("attrs"))?;
        mark_type.create(attrs.as_ref())
    }
}

fn attrs_from_json(owner: &str, json: Option<&Value>) -> ModelResult<Option<Attrs>> {
    match json {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(
            map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        )),
        Some(_) => Err(ModelError::invalid_attrs(owner, "'attrs' must be an object")),
    }
}

impl Node {
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::from(self.type_name()));

        if !self.attrs().is_empty() {
            obj.insert("attrs".into(), attrs_to_json(self.attrs()));
        }
        if self.content().size() > 0 {
            obj.insert(
                "content".into(),
                Value::Array(self.content().iter().map(Node::to_json).collect()),
            );
        }
        if !self.marks().is_empty() {
            obj.insert(
                "marks".into(),
                Value::Array(self.marks().iter().map(Mark::to_json).collect()),
            );
        }
        if let Some(text) = self.text() {
            obj.insert("text".into(), Value::from(text));
        }

        Value::Object(obj)
    }
}

impl Mark {
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::from(self.type_name()));
        if !self.attrs().is_empty() {
            obj.insert("attrs".into(), attrs_to_json(self.attrs()));
        }
        Value::Object(obj)
    }
}

fn attrs_to_json(attrs: &Attrs) -> Value {
    Value::Object(attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::test_schema::schema;
    use crate::ModelError;

    #[test]
    fn test_round_trip_canonical_json() {
        let s = schema();
        let input = json!({
            "type": "doc",
            "content": [
                {"type": "heading", "attrs": {"level": 2}, "content": [{"type": "text", "text": "Title"}]},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "plain "},
                    {"type": "text", "text": "bold", "marks": [{"type": "bold"}]}
                ]},
                {"type": "paragraph"}
            ]
        });

        let doc = s.node_from_json(&input).unwrap();
        doc.check().unwrap();
        assert_eq!(doc.to_json(), input);
    }

    #[test]
    fn test_default_attrs_filled_in() {
        let s = schema();
        let doc = s
            .node_from_json(&json!({"type": "doc", "content": [{"type": "heading"}]}))
            .unwrap();
        assert_eq!(doc.child(0).attr("level"), Some(&json!(1)));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let s = schema();
        let err = s
            .node_from_json(&json!({"type": "doc", "content": [{"type": "table"}]}))
            .unwrap_err();
        assert_eq!(err, ModelError::UnknownNodeType("table".into()));
    }

    #[test]
    fn test_structural_violation_caught_by_check() {
        let s = schema();
        // A doc cannot hold text directly
        let doc = s
            .node_from_json(&json!({"type": "doc", "content": [{"type": "text", "text": "x"}]}))
            .unwrap();
        assert!(doc.check().is_err());
    }

    #[test]
    fn test_empty_text_rejected() {
        let s = schema();
        assert!(s.node_from_json(&json!({"type": "text", "text": ""})).is_err());
    }

    #[test]
    fn test_mark_list_must_be_a_set() {
        let s = schema();
        let text = |marks: Value| json!({"type": "text", "text": "x", "marks": marks});

        let doc = s
            .node_from_json(&text(json!([{"type": "link", "attrs": {"href": "a"}}, {"type": "bold"}])))
            .unwrap();
        assert_eq!(doc.marks().len(), 2);

        for marks in [
            json!([{"type": "bold"}, {"type": "bold"}]),
            json!([{"type": "italic"}, {"type": "bold"}]),
            json!([{"type": "link", "attrs": {"href": "a"}}, {"type": "link", "attrs": {"href": "b"}}]),
        ] {
            let err = s.node_from_json(&text(marks.clone())).unwrap_err();
            assert!(matches!(err, ModelError::InvalidJson(_)), "{marks}");
        }
    }
}
