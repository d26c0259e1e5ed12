//! Built-in capabilities, in registration order

mod marks;
mod nodes;

pub use marks::{Bold, Italic, Link};
pub use nodes::{Blockquote, Doc, HardBreak, Heading, Paragraph, Text};

use crate::capability::Capability;

/// The standard capability set: link, bold, italic marks; text, doc,
/// hard_break, paragraph, blockquote, heading nodes
pub fn default_capabilities() -> Vec<Box<dyn Capability>> {
    vec![
        Box::new(Link),
        Box::new(Bold),
        Box::new(Italic),
        Box::new(Text),
        Box::new(Doc),
        Box::new(HardBreak),
        Box::new(Paragraph),
        Box::new(Blockquote),
        Box::new(Heading),
    ]
}
