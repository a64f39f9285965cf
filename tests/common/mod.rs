//! Shared fixtures for integration tests
//!
//! Provides the locked Atom+GData registry and sample documents used
//! across the parse, validation, and round-trip suites.

#![allow(dead_code)]

use std::sync::Arc;

use feedwire::MetadataRegistry;
use feedwire::schema;

/// A locked registry with the Atom and GData vocabularies.
pub fn registry() -> Arc<MetadataRegistry> {
    schema::registry()
}

/// A small but complete feed touching every declared Atom element.
pub const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:gd="http://schemas.google.com/g/2005">
  <id>urn:example:feed</id>
  <title>Example Feed</title>
  <updated>2008-09-15T09:00:00Z</updated>
  <author>
    <name>Jo Example</name>
    <email>jo@example.com</email>
  </author>
  <link rel="self" type="application/atom+xml" href="http://example.com/feed"/>
  <category scheme="http://example.com/scheme" term="news"/>
  <entry>
    <id>urn:example:entry1</id>
    <title>First Post</title>
    <updated>2008-09-15T09:00:00Z</updated>
    <link rel="alternate" href="http://example.com/1"/>
    <content>Hello, world.</content>
    <gd:when startTime="2008-09-16T10:00:00Z" endTime="2008-09-16T11:00:00Z"/>
  </entry>
  <entry>
    <id>urn:example:entry2</id>
    <title>Second Post</title>
    <updated>2008-09-16T09:00:00Z</updated>
    <content src="http://example.com/2/body" type="text/html"/>
  </entry>
</feed>"#;

/// A standalone entry document.
pub const SAMPLE_ENTRY: &str = r#"<entry xmlns="http://www.w3.org/2005/Atom">
  <id>urn:example:entry1</id>
  <title>First Post</title>
  <updated>2008-09-15T09:00:00Z</updated>
  <link rel="self" type="application/atom+xml" href="http://example.com/entry/1"/>
</entry>"#;
