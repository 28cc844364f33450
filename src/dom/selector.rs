//! CSS selector parsing and matching against a [`Document`].
//!
//! Supports type, universal, id, class and attribute selectors (all six
//! attribute operators plus the `i` flag), the four combinators, and the
//! structural pseudo-classes used by synthesized selectors (`:nth-of-type`,
//! `:nth-child` and friends) together with `:not()`, `:checked`,
//! `:disabled` and `:enabled`. CSS escapes are decoded in identifiers and
//! strings so selectors produced by [`css_escape`](super::css_escape)
//! resolve back to their element.

use crate::error::DomError;

use super::document::{Document, ElementData, NodeId};

/// A parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(Vec<ComplexSelector>);

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
    pseudos: Vec<Pseudo>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttrSelector {
    name: String,
    condition: Option<(AttrOp, String)>,
    case_insensitive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    DashMatch,
    Prefix,
    Suffix,
    Substring,
}

#[derive(Debug, Clone, PartialEq)]
enum Pseudo {
    NthChild(Nth),
    NthLastChild(Nth),
    NthOfType(Nth),
    NthLastOfType(Nth),
    OnlyChild,
    OnlyOfType,
    Checked,
    Disabled,
    Enabled,
    Not(Box<SelectorList>),
}

/// `An+B` expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Nth {
    a: i64,
    b: i64,
}

impl Nth {
    const FIRST: Nth = Nth { a: 0, b: 1 };

    fn parse(raw: &str) -> Option<Self> {
        let expr: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        match expr.as_str() {
            "odd" => return Some(Nth { a: 2, b: 1 }),
            "even" => return Some(Nth { a: 2, b: 0 }),
            _ => {}
        }

        match expr.find('n') {
            Some(pos) => {
                let a = match &expr[..pos] {
                    "" | "+" => 1,
                    "-" => -1,
                    other => other.parse().ok()?,
                };
                let rest = &expr[pos + 1..];
                let b = if rest.is_empty() { 0 } else { rest.parse().ok()? };
                Some(Nth { a, b })
            }
            None => Some(Nth {
                a: 0,
                b: expr.parse().ok()?,
            }),
        }
    }

    fn matches(&self, position: i64) -> bool {
        if self.a == 0 {
            return position == self.b;
        }
        // out-of-range coefficients match nothing
        let Some(diff) = position.checked_sub(self.b) else {
            return false;
        };
        diff.checked_rem(self.a) == Some(0) && diff.checked_div(self.a).is_some_and(|n| n >= 0)
    }
}

impl SelectorList {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        Parser::new(source).parse_list()
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.0.iter().any(|selector| selector.matches(doc, node))
    }
}

impl ComplexSelector {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.matches_at(doc, node, self.compounds.len() - 1)
    }

    fn matches_at(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(doc, node) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Child => doc
                .parent_element(node)
                .is_some_and(|parent| self.matches_at(doc, parent, index - 1)),
            Combinator::Descendant => doc
                .ancestors(node)
                .any(|ancestor| self.matches_at(doc, ancestor, index - 1)),
            Combinator::NextSibling => doc
                .previous_element_sibling(node)
                .is_some_and(|sibling| self.matches_at(doc, sibling, index - 1)),
            Combinator::SubsequentSibling => {
                std::iter::successors(doc.previous_element_sibling(node), |s| {
                    doc.previous_element_sibling(*s)
                })
                .any(|sibling| self.matches_at(doc, sibling, index - 1))
            }
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && self.ids.is_empty()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudos.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(element) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if element.tag() != tag {
                return false;
            }
        }
        self.ids.iter().all(|id| element.attr("id") == Some(id.as_str()))
            && self.classes.iter().all(|class| element.has_class(class))
            && self.attrs.iter().all(|attr| attr.matches(element))
            && self.pseudos.iter().all(|pseudo| pseudo.matches(doc, node))
    }
}

impl AttrSelector {
    fn matches(&self, element: &ElementData) -> bool {
        let Some(actual) = element.attr(&self.name) else {
            return false;
        };
        let Some((op, expected)) = &self.condition else {
            return true;
        };

        let (actual, expected) = if self.case_insensitive {
            (actual.to_lowercase(), expected.to_lowercase())
        } else {
            (actual.to_string(), expected.clone())
        };

        match op {
            AttrOp::Equals => actual == expected,
            AttrOp::Includes => {
                !expected.is_empty()
                    && !expected.contains(char::is_whitespace)
                    && actual.split_ascii_whitespace().any(|word| word == expected)
            }
            AttrOp::DashMatch => {
                actual == expected || actual.starts_with(&format!("{}-", expected))
            }
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
            AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
        }
    }
}

impl Pseudo {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        match self {
            Pseudo::NthChild(nth) => nth.matches(sibling_position(doc, node, false, false)),
            Pseudo::NthLastChild(nth) => nth.matches(sibling_position(doc, node, false, true)),
            Pseudo::NthOfType(nth) => nth.matches(sibling_position(doc, node, true, false)),
            Pseudo::NthLastOfType(nth) => nth.matches(sibling_position(doc, node, true, true)),
            Pseudo::OnlyChild => {
                sibling_position(doc, node, false, false) == 1
                    && sibling_position(doc, node, false, true) == 1
            }
            Pseudo::OnlyOfType => {
                sibling_position(doc, node, true, false) == 1
                    && sibling_position(doc, node, true, true) == 1
            }
            Pseudo::Checked => match doc.tag_name(node) {
                Some("input") => doc.checked(node),
                Some("option") => doc.option_selected(node),
                _ => false,
            },
            Pseudo::Disabled => is_form_control(doc, node) && doc.has_attr(node, "disabled"),
            Pseudo::Enabled => is_form_control(doc, node) && !doc.has_attr(node, "disabled"),
            Pseudo::Not(list) => !list.matches(doc, node),
        }
    }
}

fn is_form_control(doc: &Document, node: NodeId) -> bool {
    matches!(
        doc.tag_name(node),
        Some("input" | "button" | "select" | "textarea" | "option" | "optgroup" | "fieldset")
    )
}

/// 1-based position of `node` among its element siblings
fn sibling_position(doc: &Document, node: NodeId, of_type: bool, from_end: bool) -> i64 {
    let Some(parent) = doc.parent(node) else {
        return 1;
    };
    let tag = doc.tag_name(node);
    let siblings: Vec<NodeId> = doc
        .element_children(parent)
        .filter(|sibling| !of_type || doc.tag_name(*sibling) == tag)
        .collect();
    let index = siblings.iter().position(|s| *s == node).unwrap_or(0);
    if from_end {
        (siblings.len() - index) as i64
    } else {
        index as i64 + 1
    }
}

/// Deepest `:not(...)` nesting accepted
const MAX_NESTING: usize = 16;

/// Compounds allowed in one complex selector; matching recurses once per compound
const MAX_COMPOUNDS: usize = 32;

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self) -> DomError {
        DomError::InvalidSelector(self.source.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<SelectorList, DomError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => continue,
                None => break,
                Some(_) => return Err(self.error()),
            }
        }
        Ok(SelectorList(selectors))
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, DomError> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(',') | None => break,
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(_) => return Err(self.error()),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
            if compounds.len() > MAX_COMPOUNDS {
                return Err(self.error());
            }
        }

        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, DomError> {
        let mut compound = Compound::default();
        let mut universal = false;

        if self.peek() == Some('*') {
            self.bump();
            universal = true;
        } else if self.starts_ident() {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.ids.push(self.parse_ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.parse_attr()?);
                }
                Some(':') => {
                    self.bump();
                    compound.pseudos.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        if compound.is_empty() && !universal {
            return Err(self.error());
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrSelector, DomError> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let op = match self.bump() {
            Some(']') => {
                return Ok(AttrSelector {
                    name,
                    condition: None,
                    case_insensitive: false,
                })
            }
            Some('=') => AttrOp::Equals,
            Some(c) if self.peek() == Some('=') => {
                self.bump();
                match c {
                    '~' => AttrOp::Includes,
                    '|' => AttrOp::DashMatch,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    '*' => AttrOp::Substring,
                    _ => return Err(self.error()),
                }
            }
            _ => return Err(self.error()),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some('"') | Some('\'') => self.parse_string()?,
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();

        let mut case_insensitive = false;
        match self.peek() {
            Some('i') | Some('I') => {
                self.bump();
                case_insensitive = true;
                self.skip_whitespace();
            }
            Some('s') | Some('S') => {
                self.bump();
                self.skip_whitespace();
            }
            _ => {}
        }

        if self.bump() != Some(']') {
            return Err(self.error());
        }
        Ok(AttrSelector {
            name,
            condition: Some((op, value)),
            case_insensitive,
        })
    }

    fn parse_pseudo(&mut self) -> Result<Pseudo, DomError> {
        // pseudo-elements never match an element
        if self.peek() == Some(':') {
            return Err(self.error());
        }
        let name = self.parse_ident()?.to_ascii_lowercase();

        if self.peek() == Some('(') {
            self.bump();
            let argument = self.take_parenthesized()?;
            let nth = || Nth::parse(&argument).ok_or_else(|| self.error());
            return match name.as_str() {
                "nth-child" => Ok(Pseudo::NthChild(nth()?)),
                "nth-last-child" => Ok(Pseudo::NthLastChild(nth()?)),
                "nth-of-type" => Ok(Pseudo::NthOfType(nth()?)),
                "nth-last-of-type" => Ok(Pseudo::NthLastOfType(nth()?)),
                "not" if self.depth < MAX_NESTING => Parser {
                    depth: self.depth + 1,
                    ..Parser::new(&argument)
                }
                .parse_list()
                .map(|list| Pseudo::Not(Box::new(list)))
                .map_err(|_| self.error()),
                _ => Err(self.error()),
            };
        }

        match name.as_str() {
            "first-child" => Ok(Pseudo::NthChild(Nth::FIRST)),
            "last-child" => Ok(Pseudo::NthLastChild(Nth::FIRST)),
            "first-of-type" => Ok(Pseudo::NthOfType(Nth::FIRST)),
            "last-of-type" => Ok(Pseudo::NthLastOfType(Nth::FIRST)),
            "only-child" => Ok(Pseudo::OnlyChild),
            "only-of-type" => Ok(Pseudo::OnlyOfType),
            "checked" => Ok(Pseudo::Checked),
            "disabled" => Ok(Pseudo::Disabled),
            "enabled" => Ok(Pseudo::Enabled),
            _ => Err(self.error()),
        }
    }

    /// Consume up to the matching `)`; the opening paren is already consumed
    fn take_parenthesized(&mut self) -> Result<String, DomError> {
        let mut depth = 1;
        let mut out = String::new();
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    out.push(c);
                    if let Some(escaped) = self.bump() {
                        out.push(escaped);
                    }
                    continue;
                }
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                }
                _ => {}
            }
            out.push(c);
        }
        Err(self.error())
    }

    fn starts_ident(&self) -> bool {
        let valid_escape = |next: Option<char>| next.is_some_and(|c| c != '\n');
        match self.peek() {
            Some('-') => match self.peek_at(1) {
                Some(c) if is_name_start(c) || c == '-' => true,
                Some('\\') => valid_escape(self.peek_at(2)),
                _ => false,
            },
            Some('\\') => valid_escape(self.peek_at(1)),
            Some(c) => is_name_start(c),
            None => false,
        }
    }

    fn parse_ident(&mut self) -> Result<String, DomError> {
        if !self.starts_ident() {
            return Err(self.error());
        }
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if is_name_char(c) {
                out.push(c);
                self.bump();
            } else if c == '\\' && self.peek_at(1).is_some_and(|n| n != '\n') {
                self.bump();
                out.push(self.consume_escape());
            } else {
                break;
            }
        }
        Ok(out)
    }

    fn parse_string(&mut self) -> Result<String, DomError> {
        let quote = self.bump().ok_or_else(|| self.error())?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error()),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.peek() {
                    None => {}
                    Some('\n') => {
                        self.bump();
                    }
                    Some(_) => out.push(self.consume_escape()),
                },
                Some(c) => out.push(c),
            }
        }
    }

    /// Decode an escape; the backslash is already consumed
    fn consume_escape(&mut self) -> char {
        let mut hex = String::new();
        while hex.len() < 6 {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.bump();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            return self.bump().unwrap_or('\u{FFFD}');
        }
        if self.peek().is_some_and(|c| c == ' ' || c == '\t' || c == '\n') {
            self.bump();
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .filter(|c| *c != '\0')
            .unwrap_or('\u{FFFD}')
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}
