//! feedsave HTML Parser
//!
//! HTML5 parsing built on html5ever. Whole documents become a
//! [`Document`](feedsave_dom::Document); fragments are built detached and then
//! inserted, so an observed document sees one mutation record per top-level
//! node, the same as a page script inserting rendered markup.

mod parser;

pub use feedsave_dom::Document;
pub use parser::HtmlParser;

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Document {
    HtmlParser::new().parse(html)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("fragment target is not usable: {0}")]
    Target(#[from] feedsave_dom::DomError),

    #[error("document has no <body> to insert into")]
    NoBody,
}
