//! # Folio HTML
//!
//! HTML collaborator for Folio documents: [`HtmlParser`] implements the
//! model's `DomParser` trait using each spec's parse rules, and [`to_html`]
//! renders documents through each spec's `to_dom`.
//!
//! ```rust,ignore
//! use folio_html::{to_html, HtmlParser};
//! use folio_model::DomParser;
//!
//! let doc = HtmlParser::new().parse("<p>a <strong>b</strong></p>", &schema)?;
//! assert_eq!(to_html(&doc)?, "<p>a <strong>b</strong></p>");
//! ```

mod error;
mod lexer;
mod parser;
mod serializer;

pub use error::{HtmlError, HtmlResult};
pub use lexer::{decode_entities, Token};
pub use parser::HtmlParser;
pub use serializer::{node_to_html, to_html};
