mod document;
mod escape;
mod parser;
pub mod selector;

pub use document::{collapse_whitespace, Document, ElementData, NodeId};
pub use escape::css_escape;
pub use parser::parse_html;
pub use selector::SelectorList;
