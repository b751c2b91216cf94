//! Selectors
//!
//! Compound selectors and comma-separated selector lists: `tag`, `*`,
//! `.class`, `#id`, `[attr]` and `[attr="value"]`. Combinators are not
//! supported; callers walk ancestors or descendants themselves.

use crate::{DomTree, NodeId};

/// Selector parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected character {found:?} at offset {offset} in {selector:?}")]
    Unexpected {
        selector: String,
        found: char,
        offset: usize,
    },

    #[error("unterminated attribute selector in {0:?}")]
    Unterminated(String),

    #[error("combinators are not supported: {0:?}")]
    Combinator(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Exists(String),
    Equals(String, String),
}

/// One compound selector, e.g. `div[role="menu"]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl CompoundSelector {
    /// Check an element against this compound
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(tag) = tree.tag_name(node) else {
            return false;
        };
        if let Some(expected) = &self.tag {
            if !tag.eq_ignore_ascii_case(expected) {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if tree.get_attribute(node, "id") != Some(expected.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| tree.has_class(node, c)) {
            return false;
        }
        self.attrs.iter().all(|test| match test {
            AttrTest::Exists(name) => tree.get_attribute(node, name).is_some(),
            AttrTest::Equals(name, value) => tree.get_attribute(node, name) == Some(value.as_str()),
        })
    }
}

/// Comma-separated list of compound selectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    source: String,
    compounds: Vec<CompoundSelector>,
}

impl SelectorList {
    /// Parse a selector list such as `article, section`
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut compounds = Vec::new();
        let mut parser = Parser {
            source,
            chars: source.char_indices().peekable(),
        };

        loop {
            parser.skip_whitespace();
            let compound = parser.compound()?;
            parser.skip_whitespace();
            compounds.push(compound);

            match parser.chars.next() {
                None => break,
                Some((_, ',')) => continue,
                Some((_, '>' | '+' | '~')) => return Err(SelectorError::Combinator(source.to_string())),
                Some((offset, found)) => {
                    // Whitespace followed by another compound is a descendant combinator
                    if parser.had_whitespace_before(offset) {
                        return Err(SelectorError::Combinator(source.to_string()));
                    }
                    return Err(SelectorError::Unexpected {
                        selector: source.to_string(),
                        found,
                        offset,
                    });
                }
            }
        }

        Ok(Self {
            source: source.to_string(),
            compounds,
        })
    }

    /// Selector text as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Element matches any compound in the list
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.compounds.iter().any(|c| c.matches(tree, node))
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn had_whitespace_before(&self, offset: usize) -> bool {
        self.source[..offset].chars().next_back().is_some_and(char::is_whitespace)
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some((_, c)) = self
            .chars
            .next_if(|(_, c)| c.is_alphanumeric() || *c == '-' || *c == '_')
        {
            out.push(c);
        }
        out
    }

    fn unexpected(&mut self) -> SelectorError {
        match self.chars.peek() {
            Some(&(offset, found)) => SelectorError::Unexpected {
                selector: self.source.to_string(),
                found,
                offset,
            },
            None => SelectorError::Empty,
        }
    }

    fn compound(&mut self) -> Result<CompoundSelector, SelectorError> {
        let mut compound = CompoundSelector::default();
        let mut seen_any = false;

        if self.chars.next_if(|(_, c)| *c == '*').is_some() {
            seen_any = true;
        } else {
            let tag = self.ident();
            if !tag.is_empty() {
                compound.tag = Some(tag.to_ascii_lowercase());
                seen_any = true;
            }
        }

        loop {
            match self.chars.peek().map(|&(_, c)| c) {
                Some('.') => {
                    self.chars.next();
                    let class = self.ident();
                    if class.is_empty() {
                        return Err(self.unexpected());
                    }
                    compound.classes.push(class);
                }
                Some('#') => {
                    self.chars.next();
                    let id = self.ident();
                    if id.is_empty() {
                        return Err(self.unexpected());
                    }
                    compound.id = Some(id);
                }
                Some('[') => {
                    self.chars.next();
                    compound.attrs.push(self.attribute()?);
                }
                _ => break,
            }
            seen_any = true;
        }

        if seen_any { Ok(compound) } else { Err(self.unexpected()) }
    }

    fn attribute(&mut self) -> Result<AttrTest, SelectorError> {
        self.skip_whitespace();
        let name = self.ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.unexpected());
        }
        self.skip_whitespace();

        match self.chars.next() {
            Some((_, ']')) => Ok(AttrTest::Exists(name)),
            Some((_, '=')) => {
                self.skip_whitespace();
                let value = match self.chars.peek().map(|&(_, c)| c) {
                    Some(quote @ ('"' | '\'')) => {
                        self.chars.next();
                        let mut value = String::new();
                        loop {
                            match self.chars.next() {
                                Some((_, c)) if c == quote => break,
                                Some((_, c)) => value.push(c),
                                None => return Err(SelectorError::Unterminated(self.source.to_string())),
                            }
                        }
                        value
                    }
                    _ => self.ident(),
                };
                self.skip_whitespace();
                match self.chars.next() {
                    Some((_, ']')) => Ok(AttrTest::Equals(name, value)),
                    Some((offset, found)) => Err(SelectorError::Unexpected {
                        selector: self.source.to_string(),
                        found,
                        offset,
                    }),
                    None => Err(SelectorError::Unterminated(self.source.to_string())),
                }
            }
            Some((offset, found)) => Err(SelectorError::Unexpected {
                selector: self.source.to_string(),
                found,
                offset,
            }),
            None => Err(SelectorError::Unterminated(self.source.to_string())),
        }
    }
}
