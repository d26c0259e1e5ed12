//! # Document → HTML
//!
//! Nodes and marks render through the `to_dom` functions of their specs.
//! Marks shared by adjacent inline nodes are kept open across them, so
//! `<strong>a<em>b</em></strong>` comes out instead of one wrapper per run.

use folio_model::{DomOutput, Fragment, Mark, Node};

use crate::error::{HtmlError, HtmlResult};

/// Serialize a whole document. The top node itself has no markup; only its
/// content is written.
pub fn to_html(doc: &Node) -> HtmlResult<String> {
    let mut out = String::new();
    write_fragment(doc.content(), &mut out)?;
    Ok(out)
}

/// Serialize a single node, including its own element
pub fn node_to_html(node: &Node) -> HtmlResult<String> {
    let mut out = String::new();
    write_node(node, &mut out)?;
    Ok(out)
}

fn write_fragment(fragment: &Fragment, out: &mut String) -> HtmlResult<()> {
    let mut open_marks: Vec<Mark> = Vec::new();

    for child in fragment.iter() {
        if child.is_inline() {
            let marks = child.marks();
            let keep = open_marks
                .iter()
                .zip(marks)
                .take_while(|(open, wanted)| open == wanted)
                .count();
            while open_marks.len() > keep {
                if let Some(mark) = open_marks.pop() {
                    close_tag(&mark_output(&mark)?, out);
                }
            }
            for mark in &marks[keep..] {
                open_tag(&mark_output(mark)?, out);
                open_marks.push(mark.clone());
            }
        }
        write_node(child, out)?;
    }

    while let Some(mark) = open_marks.pop() {
        close_tag(&mark_output(&mark)?, out);
    }
    Ok(())
}

fn write_node(node: &Node, out: &mut String) -> HtmlResult<()> {
    if let Some(text) = node.text() {
        escape_text(text, out);
        return Ok(());
    }

    let to_dom = node
        .ty()
        .spec()
        .to_dom
        .ok_or_else(|| HtmlError::NoSerializer(node.type_name().to_string()))?;
    let output = to_dom(node.attrs());
    open_tag(&output, out);
    if !node.is_leaf() {
        write_fragment(node.content(), out)?;
        close_tag(&output, out);
    }
    Ok(())
}

fn mark_output(mark: &Mark) -> HtmlResult<DomOutput> {
    let to_dom = mark
        .mark_type()
        .spec()
        .to_dom
        .ok_or_else(|| HtmlError::NoSerializer(mark.type_name().to_string()))?;
    Ok(to_dom(mark.attrs()))
}

fn open_tag(output: &DomOutput, out: &mut String) {
    out.push('<');
    out.push_str(&output.tag);
    for (name, value) in &output.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
    out.push('>');
}

fn close_tag(output: &DomOutput, out: &mut String) {
    out.push_str("</");
    out.push_str(&output.tag);
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_text() {
        let mut out = String::new();
        escape_text("a < b & c", &mut out);
        assert_eq!(out, "a &lt; b &amp; c");
    }

    #[test]
    fn test_tags_with_attrs() {
        let mut out = String::new();
        let output = DomOutput::tag("a").with_attr("href", "x\"y");
        open_tag(&output, &mut out);
        close_tag(&output, &mut out);
        assert_eq!(out, "<a href=\"x&quot;y\"></a>");
    }
}
