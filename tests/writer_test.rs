//! Generation tests: namespace placement, visibility, custom hooks

mod common;

use feedwire::parser;
use feedwire::schema::atom;
use feedwire::writer::{self, WriteConfig};
use feedwire::{
    AttributeKey, Element, ElementKey, MetadataRegistry, Namespace, QName, ValueType,
};

const NO_DECL: WriteConfig = WriteConfig {
    pretty: false,
    xml_declaration: false,
};

#[test]
fn test_namespaces_declared_on_root_only() {
    let registry = common::registry();
    let element = parser::parse_str(common::SAMPLE_FEED, &registry, &atom::FEED).unwrap();
    let xml = writer::write_str_with_config(&element, &NO_DECL).unwrap();

    assert!(xml.starts_with("<feed xmlns=\"http://www.w3.org/2005/Atom\""));
    assert_eq!(
        xml.matches("xmlns:gd=\"http://schemas.google.com/g/2005\"").count(),
        1
    );
    // Children of the default namespace are unprefixed.
    assert!(xml.contains("<entry>"));
    assert!(xml.contains("<gd:when"));
}

#[test]
fn test_hidden_element_parses_but_never_serializes() {
    let mut registry = MetadataRegistry::new();
    let root = ElementKey::of(QName::unqualified("doc"), "doc");
    let internal = ElementKey::of_typed(QName::unqualified("internal"), ValueType::String, "internal");
    let visible = ElementKey::of_typed(QName::unqualified("note"), ValueType::String, "note");
    registry
        .build(&root)
        .add_element(internal.clone())
        .add_element(visible.clone());
    registry.build(&internal).set_visible(false);
    registry.build(&visible);
    let registry = registry.lock();

    let xml = "<doc><internal>secret</internal><note>hello</note></doc>";
    let element = parser::parse_str(xml, &registry, &root).unwrap();
    // The model keeps the element even though output omits it.
    assert!(element.has_element(&internal));

    let emitted = writer::write_str_with_config(&element, &NO_DECL).unwrap();
    assert_eq!(emitted, "<doc><note>hello</note></doc>");
}

#[test]
fn test_hidden_attribute_parses_but_never_serializes() {
    let mut registry = MetadataRegistry::new();
    let root = ElementKey::of(QName::unqualified("doc"), "doc");
    let etag = AttributeKey::of(QName::unqualified("etag"));
    registry
        .build(&root)
        .add_hidden_attribute(etag.clone())
        .add_attribute(AttributeKey::of(QName::unqualified("kind")));
    let registry = registry.lock();

    let element = parser::parse_str(r#"<doc etag="abc" kind="k"/>"#, &registry, &root).unwrap();
    assert!(element.has_attribute(&etag));

    let emitted = writer::write_str_with_config(&element, &NO_DECL).unwrap();
    assert_eq!(emitted, r#"<doc kind="k"/>"#);
}

#[test]
fn test_qualified_attributes_get_prefixes() {
    let ns = Namespace::with_alias("x", "http://example.com/x");
    let mut registry = MetadataRegistry::new();
    let root = ElementKey::of(QName::unqualified("doc"), "doc");
    let marked = AttributeKey::of(QName::qualified(ns, "marked"));
    registry.build(&root).add_attribute(marked.clone());
    let registry = registry.lock();

    let mut element = Element::create(&registry, &root).unwrap();
    element.set_attribute_value(&marked, "yes");

    let emitted = writer::write_str_with_config(&element, &NO_DECL).unwrap();
    assert!(emitted.contains("xmlns:x=\"http://example.com/x\""));
    assert!(emitted.contains("x:marked=\"yes\""));
}

#[test]
fn test_alias_collision_generates_fresh_prefix() {
    let ns_a = Namespace::with_alias("v", "http://example.com/a");
    let ns_b = Namespace::with_alias("v", "http://example.com/b");
    let mut registry = MetadataRegistry::new();
    let root = ElementKey::of(QName::unqualified("doc"), "doc");
    let a = AttributeKey::of(QName::qualified(ns_a, "a"));
    let b = AttributeKey::of(QName::qualified(ns_b, "b"));
    registry
        .build(&root)
        .add_attribute(a.clone())
        .add_attribute(b.clone());
    let registry = registry.lock();

    let mut element = Element::create(&registry, &root).unwrap();
    element.set_attribute_value(&a, "1");
    element.set_attribute_value(&b, "2");

    let emitted = writer::write_str_with_config(&element, &NO_DECL).unwrap();
    assert!(emitted.contains("xmlns:v=\"http://example.com/a\""));
    assert!(emitted.contains("xmlns:ns1=\"http://example.com/b\""));
    assert!(emitted.contains("v:a=\"1\""));
    assert!(emitted.contains("ns1:b=\"2\""));
}

#[test]
fn test_custom_generator_replaces_default_emission() {
    let mut registry = MetadataRegistry::new();
    let root = ElementKey::of(QName::unqualified("doc"), "doc");
    let blob = ElementKey::of(QName::unqualified("blob"), "blob");
    registry.build(&root).add_element(blob.clone());
    registry
        .build(&blob)
        .set_generator(|_element: &Element| -> feedwire::Result<Option<String>> {
            Ok(Some("<blob v=\"generated\"/>".to_string()))
        });
    let registry = registry.lock();

    let mut element = Element::create(&registry, &root).unwrap();
    element.add_element(Element::create(&registry, &blob).unwrap());

    let emitted = writer::write_str_with_config(&element, &NO_DECL).unwrap();
    assert_eq!(emitted, "<doc><blob v=\"generated\"/></doc>");
}

#[test]
fn test_text_escaped_on_output() {
    let registry = common::registry();
    let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
      <id>urn:e</id>
      <title>Fish &amp; Chips</title>
      <updated>2008-09-15T09:00:00Z</updated>
    </entry>"#;
    let element = parser::parse_str(xml, &registry, &atom::ENTRY).unwrap();
    let emitted = writer::write_str_with_config(&element, &NO_DECL).unwrap();
    assert!(emitted.contains("Fish &amp; Chips"));
    assert!(!emitted.contains("Fish & Chips"));
}

#[test]
fn test_pretty_output_indents_children() {
    let registry = common::registry();
    let element = parser::parse_str(common::SAMPLE_ENTRY, &registry, &atom::ENTRY).unwrap();
    let xml = writer::write_str_with_config(
        &element,
        &WriteConfig {
            pretty: true,
            xml_declaration: false,
        },
    )
    .unwrap();
    assert!(xml.contains("\n  <id>"));
}

#[test]
fn test_out_of_line_content_emits_empty_element() {
    let registry = common::registry();
    let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom">
      <id>urn:e</id>
      <title>t</title>
      <updated>2008-09-15T09:00:00Z</updated>
      <content src="http://example.com/body" type="text/html"/>
    </entry>"#;
    let element = parser::parse_str(xml, &registry, &atom::ENTRY).unwrap();
    let emitted = writer::write_str_with_config(&element, &NO_DECL).unwrap();
    assert!(emitted.contains(r#"<content src="http://example.com/body" type="text/html"/>"#));
}
