//! Streaming XML parsing driven by bound metadata
//!
//! The parser walks a namespace-aware event stream keeping one frame per
//! open element. For each start tag it resolves the child's declared key
//! through the parent's metadata, creates the correctly-typed child, and
//! recurses; on the end tag it converts accumulated text to the declared
//! value type and attaches the fully-built child to its parent. Attaching
//! only complete children guarantees set-cardinality deduplication always
//! compares finished elements.
//!
//! Parsing is two-phase: this module performs purely structural
//! accumulation, then hands the finished tree to
//! [`Element::resolve`](crate::Element::resolve) for narrowing, resolution,
//! and validation. Structural problems are fatal and immediate; semantic
//! problems aggregate into one `[E3001]` report.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::events::attributes::Attribute as RawAttribute;
use quick_xml::name::{QName as RawQName, ResolveResult};

use crate::error::{Error, Result};
use crate::model::element::Element;
use crate::model::key::{AttributeKey, ElementKey};
use crate::model::metadata::{AttributeMetadata, ElementMetadata};
use crate::model::qname::{Namespace, QName};
use crate::model::registry::MetadataRegistry;
use crate::model::value::Value;

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// Parse a document from a string, resolving and validating the result.
///
/// The root element must match `root_key`. Returns the fully typed,
/// narrowed, validated element tree, or an error: structural problems are
/// reported immediately, semantic problems as one aggregated `[E3001]`
/// report.
pub fn parse_str(
    xml: &str,
    registry: &MetadataRegistry,
    root_key: &ElementKey,
) -> Result<Element> {
    parse_reader(xml.as_bytes(), registry, root_key)
}

/// Parse a document from a file, resolving and validating the result.
pub fn parse_file(
    path: impl AsRef<Path>,
    registry: &MetadataRegistry,
    root_key: &ElementKey,
) -> Result<Element> {
    let file = File::open(path)?;
    parse_reader(BufReader::new(file), registry, root_key)
}

/// Parse a document from a buffered reader, resolving and validating the
/// result.
pub fn parse_reader<R: BufRead>(
    reader: R,
    registry: &MetadataRegistry,
    root_key: &ElementKey,
) -> Result<Element> {
    let mut root = parse_reader_unresolved(reader, registry, root_key)?;
    root.resolve(registry)?;
    Ok(root)
}

/// Parse a document from a string, skipping the resolve/validate phase.
///
/// For callers composing their own resolution, such as parsing against an
/// overlay registry that is still being assembled.
pub fn parse_str_unresolved(
    xml: &str,
    registry: &MetadataRegistry,
    root_key: &ElementKey,
) -> Result<Element> {
    parse_reader_unresolved(xml.as_bytes(), registry, root_key)
}

/// Structural phase only, from a buffered reader.
pub fn parse_reader_unresolved<R: BufRead>(
    reader: R,
    registry: &MetadataRegistry,
    root_key: &ElementKey,
) -> Result<Element> {
    let mut reader = NsReader::from_reader(reader);

    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut stack: Vec<Frame> = Vec::new();

    let root = loop {
        buf.clear();
        let (resolve, event) = reader.read_resolved_event_into(&mut buf)?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                // Take ownership of the namespace before touching the
                // reader again; the resolve result borrows it mutably.
                let ns_uri = owned_namespace(resolve)?;
                let local = utf8(e.local_name().as_ref())?;

                let mut element =
                    open_element(registry, root_key, stack.last(), ns_uri.as_deref(), &local)?;

                for attr in e.attributes() {
                    let attr = attr?;
                    if is_xmlns(&attr.key) {
                        continue;
                    }
                    process_attribute(&reader, registry, &mut element, &attr)?;
                }

                if is_empty {
                    if stack.is_empty() {
                        break element;
                    }
                    close_element(&mut stack, Frame {
                        element,
                        text: String::new(),
                    })?;
                } else {
                    stack.push(Frame {
                        element,
                        text: String::new(),
                    });
                }
            }
            Event::End(_) => {
                let mut frame = stack
                    .pop()
                    .ok_or_else(|| Error::InvalidXml("unbalanced end tag".to_string()))?;
                if stack.is_empty() {
                    finish_text(&mut frame)?;
                    break frame.element;
                }
                close_element(&mut stack, frame)?;
            }
            Event::Text(e) => {
                if let Some(frame) = stack.last_mut() {
                    let text = e.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
                    frame.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(utf8(e.as_ref())?.as_ref());
                }
            }
            Event::GeneralRef(e) => {
                if let Some(frame) = stack.last_mut() {
                    let name = e.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
                    frame.text.push_str(&resolve_entity(&name)?);
                }
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => {
                return Err(Error::InvalidXml(
                    "unexpected end of document before the root element closed".to_string(),
                ));
            }
        }
    };

    drain_trailing(&mut reader, &mut buf)?;
    Ok(root)
}

/// Consume the events after the root element closed. Only whitespace,
/// comments, and processing instructions may follow the root.
fn drain_trailing<R: BufRead>(reader: &mut NsReader<R>, buf: &mut Vec<u8>) -> Result<()> {
    loop {
        buf.clear();
        let (_, event) = reader.read_resolved_event_into(buf)?;
        match event {
            Event::Eof => return Ok(()),
            Event::Comment(_) | Event::PI(_) => {}
            Event::Text(e) => {
                let text = e.decode().map_err(|e| Error::InvalidXml(e.to_string()))?;
                if !text.trim().is_empty() {
                    return Err(Error::InvalidXml(
                        "trailing content after the document root".to_string(),
                    ));
                }
            }
            _ => {
                return Err(Error::InvalidXml(
                    "trailing content after the document root".to_string(),
                ));
            }
        }
    }
}

/// One open element being accumulated.
struct Frame {
    element: Element,
    text: String,
}

/// Resolve the metadata for an opening tag and create its element.
///
/// The root must match the requested root key. Children resolve through
/// the parent's declared element keys; undeclared names fall back to a
/// generic element only when the parent permits arbitrary XML.
fn open_element(
    registry: &MetadataRegistry,
    root_key: &ElementKey,
    parent: Option<&Frame>,
    ns_uri: Option<&str>,
    local: &str,
) -> Result<Element> {
    match parent {
        None => {
            if !root_key.id().matches(ns_uri, local) {
                return Err(Error::invalid_element(
                    local,
                    &format!("document root does not match expected root '{}'", root_key.id()),
                ));
            }
            Element::create(registry, root_key)
        }
        Some(frame) => {
            let parent_meta = frame.element.metadata();
            let declared = parent_meta
                .elements()
                .iter()
                .find(|k| k.id().matches(ns_uri, local));
            match declared {
                Some(child_key) => Element::create(registry, child_key),
                None if parent_meta.arbitrary_xml() => {
                    Ok(Element::undeclared(parsed_qname(ns_uri, local)))
                }
                None => Err(Error::invalid_element(
                    local,
                    &format!(
                        "undeclared child of '{}' and arbitrary extensions are not permitted",
                        frame.element.id()
                    ),
                )),
            }
        }
    }
}

/// Convert and store one attribute on the open element.
///
/// Declared attributes convert to their declared value type; a conversion
/// failure is a fatal `[E3002]`. A second value for the same qualified
/// name is a fatal `[E2002]`. Attributes undeclared on the element's
/// current key are looked up in its adaptation variants next: narrowing
/// runs only after the subtree is complete, so a variant's attributes must
/// already be accepted here. Remaining undeclared attributes are stored as
/// strings when the element permits arbitrary XML and rejected otherwise.
fn process_attribute<R>(
    reader: &NsReader<R>,
    registry: &MetadataRegistry,
    element: &mut Element,
    attr: &RawAttribute<'_>,
) -> Result<()> {
    let (attr_resolve, _) = reader.resolver().resolve_attribute(attr.key);
    let ns_uri = owned_namespace(attr_resolve)?;
    let local = utf8(attr.key.local_name().as_ref())?;
    let text = attr
        .decode_and_unescape_value(reader.decoder())
        .map_err(|e| Error::XmlAttr(format!("attribute '{}': {}", local, e)))?;

    let metadata = element.metadata().clone();
    let declared = metadata
        .attributes()
        .iter()
        .find(|a| a.key().id().matches(ns_uri.as_deref(), &local))
        .cloned()
        .or_else(|| variant_attribute(registry, &metadata, ns_uri.as_deref(), &local));

    let (key, value) = match declared {
        Some(attr_meta) => {
            let key = attr_meta.key().clone();
            let value_type = key.value_type();
            let value = Value::from_text(value_type, &text).map_err(|_| {
                Error::value_with_context(
                    &format!("attribute '{}'", key.id()),
                    &text,
                    value_type.name(),
                )
            })?;
            (key, value)
        }
        None if metadata.arbitrary_xml() => {
            let key = AttributeKey::of(parsed_qname(ns_uri.as_deref(), &local));
            let value = Value::String(text.into_owned());
            (key, value)
        }
        None => {
            return Err(Error::XmlAttr(format!(
                "undeclared attribute '{}' on element '<{}>'",
                local,
                element.id()
            )));
        }
    };

    if element.has_attribute(&key) {
        return Err(Error::duplicate_attribute(&element.id().to_string(), &local));
    }
    element.set_attribute_value(&key, value);
    Ok(())
}

/// Find an attribute declaration among the element's adaptation variants.
///
/// Variants are consulted in registration order; the first declaration of
/// the qualified name wins. A variant that was never registered is skipped
/// here, since narrowing reports it with the element's full context.
fn variant_attribute(
    registry: &MetadataRegistry,
    metadata: &ElementMetadata,
    ns_uri: Option<&str>,
    local: &str,
) -> Option<AttributeMetadata> {
    for (_, variant) in metadata.adaptations() {
        let Ok(variant_meta) = registry.bind(variant) else {
            continue;
        };
        if let Some(attr_meta) = variant_meta
            .attributes()
            .iter()
            .find(|a| a.key().id().matches(ns_uri, local))
        {
            return Some(attr_meta.clone());
        }
    }
    None
}

/// Finish a fully-read element and attach it to its parent.
fn close_element(stack: &mut [Frame], mut frame: Frame) -> Result<()> {
    finish_text(&mut frame)?;
    let parent = stack
        .last_mut()
        .ok_or_else(|| Error::InvalidXml("unbalanced end tag".to_string()))?;
    parent.element.add_element(frame.element);
    Ok(())
}

/// Convert accumulated text to the element's declared value type.
fn finish_text(frame: &mut Frame) -> Result<()> {
    let text = frame.text.trim();
    if text.is_empty() {
        return Ok(());
    }
    let key = frame.element.key().clone();
    match key.value_type() {
        Some(value_type) => {
            let value = Value::from_text(value_type, text).map_err(|_| {
                Error::value_with_context(
                    &format!("text content of '{}'", key.id()),
                    text,
                    value_type.name(),
                )
            })?;
            frame.element.set_text_value(value);
            Ok(())
        }
        None => Err(Error::invalid_element(
            &key.id().to_string(),
            "unexpected text content on an element that declares none",
        )),
    }
}

fn owned_namespace(resolve: ResolveResult<'_>) -> Result<Option<String>> {
    match resolve {
        ResolveResult::Bound(ns) => Ok(Some(utf8(ns.as_ref())?)),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(Error::InvalidXml(format!(
            "unbound namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn parsed_qname(ns_uri: Option<&str>, local: &str) -> QName {
    match ns_uri {
        Some(uri) => QName::qualified(Namespace::new(uri.to_string()), local.to_string()),
        None => QName::unqualified(local.to_string()),
    }
}

fn is_xmlns(key: &RawQName<'_>) -> bool {
    key.as_ref() == b"xmlns"
        || key
            .prefix()
            .is_some_and(|p| p.as_ref() == b"xmlns")
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|e| Error::InvalidXml(e.to_string()))
}

/// Resolve a general entity reference to its replacement text.
fn resolve_entity(name: &str) -> Result<String> {
    match name {
        "lt" => Ok("<".to_string()),
        "gt" => Ok(">".to_string()),
        "amp" => Ok("&".to_string()),
        "apos" => Ok("'".to_string()),
        "quot" => Ok("\"".to_string()),
        _ => {
            if let Some(digits) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                let code = u32::from_str_radix(digits, 16)
                    .map_err(|_| Error::InvalidXml(format!("invalid character reference '&{};'", name)))?;
                return char::from_u32(code)
                    .map(|c| c.to_string())
                    .ok_or_else(|| Error::InvalidXml(format!("invalid character reference '&{};'", name)));
            }
            if let Some(digits) = name.strip_prefix('#') {
                let code = digits
                    .parse::<u32>()
                    .map_err(|_| Error::InvalidXml(format!("invalid character reference '&{};'", name)))?;
                return char::from_u32(code)
                    .map(|c| c.to_string())
                    .ok_or_else(|| Error::InvalidXml(format!("invalid character reference '&{};'", name)));
            }
            Err(Error::InvalidXml(format!(
                "unknown entity reference '&{};'",
                name
            )))
        }
    }
}
