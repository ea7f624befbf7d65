// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! A lightweight XML tree with Canonical XML 1.0 (inclusive) serialization.
//!
//! The signer digests the document exactly as a downstream verifier will
//! re-canonicalize it after parsing, so the canonical byte stream produced
//! here is the signing contract: no XML declaration, UTF-8, the apex element
//! renders all in-scope namespace declarations, namespace nodes sorted
//! default-first then by prefix, attributes sorted by (namespace URI, local
//! name), C14N escaping for text and attribute values.

/// ISO/IEC 19770-2:2015 SWID schema namespace (default namespace of the tag).
pub const SWID_NS: &str = "http://standards.iso.org/iso/19770/-2/2015/schema.xsd";

/// TCG RIM attribute extensions, prefix `rim`.
pub const RIM_NS: &str = "https://trustedcomputinggroup.org/wp-content/uploads/TCG_RIM_Model";

/// NIST IR 8060 SWID extensions, prefix `n8060`.
pub const N8060_NS: &str =
    "http://csrc.nist.gov/ns/swid/2015-extensions/swid-2015-extensions-1.0.xsd";

/// Namespace of the `SHA256:hash` file digest attribute.
pub const SHA256_NS: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

/// XML digital signature namespace (default namespace of `Signature`).
pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Built-in namespace of the reserved `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// One element: qualified name, namespace declarations, attributes in
/// insertion order, ordered children.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub ns_decls: Vec<(Option<String>, String)>,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Declare a namespace on this element; `None` declares the default
    /// namespace.
    pub fn declare_ns(&mut self, prefix: Option<&str>, uri: &str) {
        self.ns_decls
            .push((prefix.map(str::to_string), uri.to_string()));
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs.push((name.to_string(), value.to_string()));
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn push_child(&mut self, e: Element) {
        self.children.push(Node::Element(e));
    }

    pub fn push_text(&mut self, t: &str) {
        self.children.push(Node::Text(t.to_string()));
    }

    /// Depth-first search for the first descendant element with the given
    /// name, including self.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        for c in &self.children {
            if let Node::Element(e) = c {
                if let Some(hit) = e.find(name) {
                    return Some(hit);
                }
            }
        }
        None
    }

    /// Concatenated character data of the direct text children.
    pub fn text(&self) -> String {
        let mut s = String::new();
        for c in &self.children {
            if let Node::Text(t) = c {
                s.push_str(t);
            }
        }
        s
    }
}

fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((p, l)) => (Some(p), l),
        None => (None, name),
    }
}

// Prefixes a SWID tag can carry on attributes.  The default namespace does
// not apply to attributes, so an unprefixed attribute has no namespace.
fn attr_ns_uri(prefix: Option<&str>) -> &'static str {
    match prefix {
        Some("rim") => RIM_NS,
        Some("n8060") => N8060_NS,
        Some("SHA256") => SHA256_NS,
        Some("xml") => XML_NS,
        _ => "",
    }
}

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
}

// In-scope declarations merged onto the apex: inherited first, overridden by
// the element's own declarations on the same prefix.
fn merge_ns(
    inherited: &[(Option<String>, String)],
    own: &[(Option<String>, String)],
) -> Vec<(Option<String>, String)> {
    let mut merged: Vec<(Option<String>, String)> = inherited.to_vec();

    for (prefix, uri) in own {
        match merged.iter_mut().find(|(p, _)| p == prefix) {
            Some(entry) => entry.1 = uri.clone(),
            None => merged.push((prefix.clone(), uri.clone())),
        }
    }

    merged
}

fn write_ns_decls(decls: &[(Option<String>, String)], out: &mut String) {
    let mut sorted: Vec<&(Option<String>, String)> = decls.iter().collect();
    sorted.sort_by_key(|(p, _)| p.clone().unwrap_or_default());

    for (prefix, uri) in sorted {
        match prefix {
            None => out.push_str(" xmlns=\""),
            Some(p) => {
                out.push_str(" xmlns:");
                out.push_str(p);
                out.push_str("=\"");
            }
        }
        escape_attr(uri, out);
        out.push('"');
    }
}

fn write_attrs(attrs: &[(String, String)], out: &mut String) {
    let mut sorted: Vec<&(String, String)> = attrs.iter().collect();
    sorted.sort_by_key(|(name, _)| {
        let (prefix, local) = split_qname(name);
        (attr_ns_uri(prefix), local.to_string())
    });

    for (name, value) in sorted {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }
}

fn write_element(e: &Element, apex_ns: Option<&[(Option<String>, String)]>, out: &mut String) {
    out.push('<');
    out.push_str(&e.name);

    match apex_ns {
        Some(ns) => write_ns_decls(ns, out),
        None => write_ns_decls(&e.ns_decls, out),
    }
    write_attrs(&e.attrs, out);

    out.push('>');

    for c in &e.children {
        match c {
            Node::Element(child) => write_element(child, None, out),
            Node::Text(t) => escape_text(t, out),
        }
    }

    out.push_str("</");
    out.push_str(&e.name);
    out.push('>');
}

/// Serialize the subtree rooted at `e` in Canonical XML 1.0 form.
/// `inherited` holds the namespace declarations in scope at `e`'s parent;
/// they are rendered on the apex element together with `e`'s own.
pub fn canonicalize(e: &Element, inherited: &[(Option<String>, String)]) -> Vec<u8> {
    let merged = merge_ns(inherited, &e.ns_decls);

    let mut out = String::new();
    write_element(e, Some(&merged), &mut out);

    out.into_bytes()
}

/// Render the document for output: an XML declaration followed by the tree
/// in its canonical form.  Whitespace is not invented here; the indenter has
/// already materialized it as text nodes before the document was signed.
pub fn serialize(root: &Element) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

    let merged = merge_ns(&[], &root.ns_decls);
    write_element(root, Some(&merged), &mut out);
    out.push('\n');

    out
}

/// Materialize 2-space indentation as text nodes.  Elements that already
/// carry character data are left untouched, so signature value elements
/// keep their canonical single-line layout.
pub fn indent(root: &mut Element) {
    indent_at(root, 0);
}

fn indent_at(e: &mut Element, depth: usize) {
    if e.children.is_empty() {
        return;
    }
    if e.children.iter().any(|c| matches!(c, Node::Text(_))) {
        return;
    }

    let pad_child = format!("\n{}", "  ".repeat(depth + 1));
    let pad_close = format!("\n{}", "  ".repeat(depth));

    let old = std::mem::take(&mut e.children);
    for node in old {
        e.children.push(Node::Text(pad_child.clone()));
        match node {
            Node::Element(mut child) => {
                indent_at(&mut child, depth + 1);
                e.children.push(Node::Element(child));
            }
            text => e.children.push(text),
        }
    }
    e.children.push(Node::Text(pad_close));
}
