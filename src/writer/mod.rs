//! XML generation for element trees
//!
//! The generator mirrors the parser: a depth-first walk over the same
//! metadata-driven model. Namespace aliasing is computed once over the
//! whole visible subtree and declared on the root start tag, so nested
//! elements never repeat prefix declarations; only a bare-named element
//! whose namespace differs from the in-force default re-declares the
//! default scope (`xmlns=""` for unqualified names). Elements and attributes
//! marked invisible in their metadata contribute to the object model but
//! never appear in output, and a per-metadata custom generator hook can
//! replace the default emission entirely.
//!
//! Serializing a valid tree does not fail except on I/O; a malformed graph
//! is a programming error, not a runtime condition to report to users.

use std::collections::HashMap;
use std::io::Write as IoWrite;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Error, Result};
use crate::model::element::Element;
use crate::model::qname::QName;

/// The implicitly-declared `xml:` namespace.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Output options for the generator.
#[derive(Debug, Clone)]
pub struct WriteConfig {
    /// Indent nested elements with two spaces.
    pub pretty: bool,
    /// Emit the `<?xml version="1.0" encoding="utf-8"?>` declaration.
    pub xml_declaration: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        WriteConfig {
            pretty: false,
            xml_declaration: true,
        }
    }
}

/// Serialize an element tree to a string with default options.
pub fn write_str(element: &Element) -> Result<String> {
    write_str_with_config(element, &WriteConfig::default())
}

/// Serialize an element tree to a string.
pub fn write_str_with_config(element: &Element, config: &WriteConfig) -> Result<String> {
    let mut buffer = Vec::new();
    write_to(element, &mut buffer, config)?;
    String::from_utf8(buffer)
        .map_err(|e| Error::xml_write(format!("generated XML is not valid UTF-8: {}", e)))
}

/// Serialize an element tree to a file.
pub fn write_file(
    element: &Element,
    path: impl AsRef<std::path::Path>,
    config: &WriteConfig,
) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_to(element, &mut file, config)
}

/// Serialize an element tree to a writer.
pub fn write_to<W: IoWrite>(element: &Element, writer: &mut W, config: &WriteConfig) -> Result<()> {
    let mut xml_writer = if config.pretty {
        Writer::new_with_indent(writer, b' ', 2)
    } else {
        Writer::new(writer)
    };

    if config.xml_declaration {
        xml_writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| Error::xml_write(format!("failed to write XML declaration: {}", e)))?;
    }

    let plan = NamespacePlan::for_root(element);
    write_element(&mut xml_writer, element, &plan, None, true)
}

/// Namespace aliasing for one document, computed once at the root.
///
/// The root element's namespace becomes the default (unprefixed)
/// namespace. Every other element namespace, and every qualified
/// attribute namespace (qualified attributes always need a prefix, even
/// in the default namespace), is assigned its preferred alias or a
/// generated `ns{n}` on collision.
struct NamespacePlan {
    default_uri: Option<String>,
    prefixes: HashMap<String, String>,
}

impl NamespacePlan {
    fn for_root(root: &Element) -> NamespacePlan {
        let default_uri = root.id().ns().map(|ns| ns.uri().to_string());

        // (uri, preferred alias) in first-visit order.
        let mut seen: Vec<(String, Option<String>)> = Vec::new();
        collect_namespaces(root, default_uri.as_deref(), &mut seen);

        let mut prefixes = HashMap::new();
        let mut generated = 0usize;
        for (uri, preferred) in seen {
            if uri == XML_NAMESPACE {
                prefixes.insert(uri, "xml".to_string());
                continue;
            }
            let mut alias = preferred.unwrap_or_default();
            while alias.is_empty()
                || alias == "xml"
                || alias == "xmlns"
                || prefixes.values().any(|p| *p == alias)
            {
                generated += 1;
                alias = format!("ns{}", generated);
            }
            prefixes.insert(uri, alias);
        }

        NamespacePlan {
            default_uri,
            prefixes,
        }
    }

    /// The serialized tag name for an element's qualified name.
    fn element_name(&self, id: &QName) -> String {
        match id.ns() {
            None => id.local_name().to_string(),
            Some(ns) if Some(ns.uri()) == self.default_uri.as_deref() => {
                id.local_name().to_string()
            }
            Some(ns) => self.prefixed(ns.uri(), id.local_name()),
        }
    }

    /// The serialized name for an attribute's qualified name. Unqualified
    /// attributes never take a prefix; qualified ones always do.
    fn attribute_name(&self, id: &QName) -> String {
        match id.ns() {
            None => id.local_name().to_string(),
            Some(ns) => self.prefixed(ns.uri(), id.local_name()),
        }
    }

    fn prefixed(&self, uri: &str, local: &str) -> String {
        match self.prefixes.get(uri) {
            Some(prefix) => format!("{}:{}", prefix, local),
            // Unreachable for trees walked by collect_namespaces; keep a
            // readable name rather than panicking mid-serialization.
            None => local.to_string(),
        }
    }

    /// The xmlns declarations to place on the root start tag.
    fn declarations(&self) -> Vec<(String, String)> {
        let mut decls = Vec::new();
        if let Some(uri) = &self.default_uri {
            decls.push(("xmlns".to_string(), uri.clone()));
        }
        let mut aliased: Vec<(&String, &String)> = self
            .prefixes
            .iter()
            .filter(|(uri, _)| uri.as_str() != XML_NAMESPACE)
            .collect();
        aliased.sort_by(|a, b| a.1.cmp(b.1));
        for (uri, prefix) in aliased {
            decls.push((format!("xmlns:{}", prefix), uri.clone()));
        }
        decls
    }
}

/// Record every namespace needing a prefix in the visible subtree.
fn collect_namespaces(
    element: &Element,
    default_uri: Option<&str>,
    seen: &mut Vec<(String, Option<String>)>,
) {
    let metadata = element.metadata();
    if !metadata.is_visible() {
        return;
    }

    if let Some(ns) = element.id().ns()
        && Some(ns.uri()) != default_uri
    {
        record_namespace(seen, ns.uri(), ns.alias());
    }

    for attr in element.attributes() {
        let declared = metadata.find_attribute(attr.key().id());
        if declared.is_some_and(|a| !a.is_visible()) {
            continue;
        }
        if let Some(ns) = attr.key().id().ns() {
            record_namespace(seen, ns.uri(), ns.alias());
        }
    }

    for child in element.children() {
        collect_namespaces(child, default_uri, seen);
    }
}

fn record_namespace(seen: &mut Vec<(String, Option<String>)>, uri: &str, alias: Option<&str>) {
    if let Some(entry) = seen.iter_mut().find(|(u, _)| u == uri) {
        // First preference wins, but fill in an alias if none was seen yet.
        if entry.1.is_none() {
            entry.1 = alias.map(|a| a.to_string());
        }
        return;
    }
    seen.push((uri.to_string(), alias.map(|a| a.to_string())));
}

fn write_element<W: IoWrite>(
    writer: &mut Writer<W>,
    element: &Element,
    plan: &NamespacePlan,
    current_default: Option<&str>,
    is_root: bool,
) -> Result<()> {
    let metadata = element.metadata();
    if !metadata.is_visible() {
        return Ok(());
    }

    if let Some(generator) = metadata.generator()
        && let Some(fragment) = generator.generate(element)?
    {
        writer
            .get_mut()
            .write_all(fragment.as_bytes())
            .map_err(|e| Error::xml_write(format!("failed to write custom fragment: {}", e)))?;
        return Ok(());
    }

    let name = plan.element_name(element.id());
    let mut start = BytesStart::new(name.as_str());

    // An element serialized without a prefix takes its meaning from the
    // in-force default namespace; when the element's own namespace differs
    // the scope must be re-declared (xmlns="" for unqualified names).
    let element_ns = element.id().ns().map(|ns| ns.uri());
    let bare = element_ns.is_none() || element_ns == plan.default_uri.as_deref();
    let child_default = if bare { element_ns } else { current_default };

    if is_root {
        for (decl_name, uri) in plan.declarations() {
            start.push_attribute((decl_name.as_str(), uri.as_str()));
        }
    } else if bare && element_ns != current_default {
        start.push_attribute(("xmlns", element_ns.unwrap_or("")));
    }

    for attr in element.attributes() {
        let declared = metadata.find_attribute(attr.key().id());
        if declared.is_some_and(|a| !a.is_visible()) {
            continue;
        }
        let attr_name = plan.attribute_name(attr.key().id());
        start.push_attribute((attr_name.as_str(), attr.value().to_text().as_str()));
    }

    let text = element.text_value().map(|v| v.to_text());
    let has_text = text.as_deref().is_some_and(|t| !t.is_empty());
    let visible_children = element
        .children()
        .iter()
        .any(|c| c.metadata().is_visible());

    if !has_text && !visible_children {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| Error::xml_write(format!("failed to write element '{}': {}", name, e)))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| Error::xml_write(format!("failed to write element '{}': {}", name, e)))?;

    for child in element.children() {
        write_element(writer, child, plan, child_default, false)?;
    }

    if let Some(text) = text
        && !text.is_empty()
    {
        writer
            .write_event(Event::Text(BytesText::new(&text)))
            .map_err(|e| Error::xml_write(format!("failed to write text of '{}': {}", name, e)))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(|e| Error::xml_write(format!("failed to close element '{}': {}", name, e)))?;

    Ok(())
}
