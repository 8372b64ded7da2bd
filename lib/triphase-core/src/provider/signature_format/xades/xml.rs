//! Minimal XML tree over `quick-xml` events plus exclusive canonicalization
//! (`http://www.w3.org/2001/10/xml-exc-c14n#`, comments omitted).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use quick_xml::Reader;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, Event};

use super::super::error::FormatError;

/// In-scope namespace bindings, prefix (`""` for the default namespace) to URI
pub(super) type Scope = BTreeMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Element {
    /// Qualified name as written
    pub name: String,
    /// Namespace declarations made on this element
    pub namespaces: Vec<(String, String)>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

fn invalid(error: impl Display) -> FormatError {
    FormatError::InvalidStructure(format!("malformed XML: {error}"))
}

fn split_name(name: &str) -> (&str, &str) {
    name.split_once(':').unwrap_or(("", name))
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            namespaces: vec![],
            attributes: vec![],
            children: vec![],
        }
    }

    pub fn with_namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.namespaces.push((prefix.to_owned(), uri.to_owned()));
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn local_name(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn namespace_uri<'a>(&self, scope: &'a Scope) -> &'a str {
        let (prefix, _) = split_name(&self.name);
        scope.get(prefix).map(String::as_str).unwrap_or("")
    }

    /// Namespaces in scope at this element, given those in scope at its parent
    pub fn scope(&self, parent: &Scope) -> Scope {
        let mut scope = parent.clone();
        for (prefix, uri) in &self.namespaces {
            scope.insert(prefix.clone(), uri.clone());
        }
        scope
    }

    pub fn is(&self, scope: &Scope, namespace: &str, local_name: &str) -> bool {
        self.local_name() == local_name && self.namespace_uri(scope) == namespace
    }

    /// Unqualified attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First child element with the given expanded name; `scope` is the scope of `self`
    pub fn child(&self, scope: &Scope, namespace: &str, local_name: &str) -> Option<(&Element, Scope)> {
        self.child_elements().find_map(|child| {
            let child_scope = child.scope(scope);
            child
                .is(&child_scope, namespace, local_name)
                .then_some((child, child_scope))
        })
    }

    /// Depth-first search including `self`; `scope` is the scope of `self`
    pub fn descendants<'a>(&'a self, scope: &Scope) -> Vec<(&'a Element, Scope)> {
        let mut found = vec![(self, scope.clone())];
        for child in self.child_elements() {
            found.extend(child.descendants(&child.scope(scope)));
        }
        found
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, FormatError> {
        let name = start.name();
        let mut element = Element::new(std::str::from_utf8(name.as_ref()).map_err(invalid)?);

        for attribute in start.attributes() {
            let attribute = attribute.map_err(invalid)?;
            let key = std::str::from_utf8(attribute.key.as_ref()).map_err(invalid)?;
            let value = attribute.unescape_value().map_err(invalid)?.into_owned();

            match key.split_once(':') {
                Some(("xmlns", prefix)) => element.namespaces.push((prefix.to_owned(), value)),
                None if key == "xmlns" => element.namespaces.push((String::new(), value)),
                _ => element.attributes.push((key.to_owned(), value)),
            }
        }
        Ok(element)
    }

    /// Prefixes whose binding exclusive canonicalization must render on this element
    fn visibly_utilized(&self) -> BTreeSet<&str> {
        let mut prefixes = BTreeSet::from([split_name(&self.name).0]);
        prefixes.extend(
            self.attributes
                .iter()
                .filter_map(|(key, _)| key.split_once(':'))
                .map(|(prefix, _)| prefix)
                .filter(|prefix| *prefix != "xml"),
        );
        prefixes
    }
}

/// Parses a document and returns its root element
pub(super) fn parse(xml: &[u8]) -> Result<Element, FormatError> {
    let mut reader = Reader::from_reader(xml);
    let mut open: Vec<Element> = vec![];
    let mut root = None;

    let mut close = |open: &mut Vec<Element>, element: Element| match open.last_mut() {
        Some(parent) => {
            parent.children.push(Node::Element(element));
            Ok(())
        }
        None if root.is_none() => {
            root = Some(element);
            Ok(())
        }
        None => Err(invalid("more than one root element")),
    };

    loop {
        match reader.read_event().map_err(invalid)? {
            Event::Start(start) => open.push(Element::from_start(&start)?),
            Event::Empty(start) => close(&mut open, Element::from_start(&start)?)?,
            Event::End(_) => {
                let element = open.pop().ok_or_else(|| invalid("unexpected closing tag"))?;
                close(&mut open, element)?;
            }
            Event::Text(text) => {
                if let Some(parent) = open.last_mut() {
                    let text = text.unescape().map_err(invalid)?;
                    parent.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = open.last_mut() {
                    let text = String::from_utf8(data.into_inner().into_owned()).map_err(invalid)?;
                    parent.children.push(Node::Text(text));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(invalid("unclosed element"));
    }
    root.ok_or_else(|| invalid("no root element"))
}

/// Exclusive canonical form of the subtree rooted at `element`.
///
/// `scope` holds the namespaces in scope at `element`, its own declarations included.
pub(super) fn canonicalize(element: &Element, scope: &Scope) -> Vec<u8> {
    let mut output = String::new();
    write_canonical(element, scope, &Scope::new(), &mut output);
    output.into_bytes()
}

fn write_canonical(element: &Element, scope: &Scope, rendered: &Scope, output: &mut String) {
    let mut rendered = rendered.clone();
    let mut declarations = vec![];
    for prefix in element.visibly_utilized() {
        let uri = scope.get(prefix).map(String::as_str).unwrap_or("");
        if rendered.get(prefix).map(String::as_str).unwrap_or("") != uri {
            declarations.push((prefix.to_owned(), uri.to_owned()));
            rendered.insert(prefix.to_owned(), uri.to_owned());
        }
    }

    let mut attributes: Vec<(&str, &str, &str, &str)> = element
        .attributes
        .iter()
        .map(|(key, value)| {
            let (prefix, local_name) = split_name(key);
            let namespace = match prefix {
                "" => "",
                prefix => scope.get(prefix).map(String::as_str).unwrap_or(""),
            };
            (namespace, local_name, key.as_str(), value.as_str())
        })
        .collect();
    attributes.sort();

    output.push('<');
    output.push_str(&element.name);
    for (prefix, uri) in &declarations {
        match prefix.as_str() {
            "" => output.push_str(" xmlns=\""),
            prefix => {
                output.push_str(" xmlns:");
                output.push_str(prefix);
                output.push_str("=\"");
            }
        }
        output.push_str(&escape_attribute(uri));
        output.push('"');
    }
    for (_, _, key, value) in attributes {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        output.push_str(&escape_attribute(value));
        output.push('"');
    }
    output.push('>');

    for node in &element.children {
        match node {
            Node::Text(text) => output.push_str(&escape_text(text)),
            Node::Element(child) => {
                write_canonical(child, &child.scope(scope), &rendered, output)
            }
        }
    }

    output.push_str("</");
    output.push_str(&element.name);
    output.push('>');
}

fn escape_text(text: &str) -> String {
    partial_escape(text).replace('\r', "&#xD;")
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '"' => escaped.push_str("&quot;"),
            '\t' => escaped.push_str("&#x9;"),
            '\n' => escaped.push_str("&#xA;"),
            '\r' => escaped.push_str("&#xD;"),
            other => escaped.push(other),
        }
    }
    escaped
}
